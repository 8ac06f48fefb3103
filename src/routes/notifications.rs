use axum::extract::State;
use axum::Json;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::app::AppState;
use crate::authz::AuthUser;
use crate::errors::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::common::MessageResponse;
use crate::models::notification::{
    DbNotificationSettings, LineConnectRequest, LineConnectResponse, NotificationSettings, NotificationUpdateResponse,
    NotificationUpdate,
};
use crate::utils::utc_now;
use crate::validation::non_blank;

async fn load_settings(state: &AppState, user_id: &str) -> AppResult<NotificationSettings> {
    let row = sqlx::query_as::<_, DbNotificationSettings>(
        "SELECT user_id, categories, frequency, price_change_threshold, line_connected, line_user_id, web_push_enabled, updated_at FROM notification_settings WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Ok(NotificationSettings::defaults(
            user_id,
            state.config.default_price_change_threshold,
        )),
    }
}

async fn save_settings(pool: &SqlitePool, settings: &mut NotificationSettings) -> AppResult<()> {
    let now = utc_now();
    sqlx::query(
        "INSERT INTO notification_settings (user_id, categories, frequency, price_change_threshold, line_connected, line_user_id, web_push_enabled, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET categories = excluded.categories, frequency = excluded.frequency, \
         price_change_threshold = excluded.price_change_threshold, line_connected = excluded.line_connected, \
         line_user_id = excluded.line_user_id, web_push_enabled = excluded.web_push_enabled, updated_at = excluded.updated_at",
    )
    .bind(&settings.user_id)
    .bind(sqlx::types::Json(&settings.categories))
    .bind(settings.frequency.as_str())
    .bind(i64::from(settings.price_change_threshold))
    .bind(settings.line_connected)
    .bind(&settings.line_user_id)
    .bind(settings.web_push_enabled)
    .bind(now)
    .execute(pool)
    .await?;

    settings.updated_at = Some(now);
    Ok(())
}

#[utoipa::path(
    get,
    path = "/notifications/settings",
    tag = "Notifications",
    responses(
        (status = 200, description = "Stored settings or defaults", body = NotificationSettings),
        (status = 401, description = "Missing or invalid user token", body = ErrorResponse)
    )
)]
pub async fn get_settings(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<NotificationSettings>> {
    let settings = load_settings(&state, &auth.user_id).await?;
    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/notifications/settings",
    tag = "Notifications",
    request_body(content = Object, description = "Any of frequency, priceChangeThreshold, categories, webPushEnabled"),
    responses(
        (status = 200, description = "Settings saved", body = NotificationUpdateResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<NotificationUpdateResponse>> {
    let update = NotificationUpdate::from_json(&body)?;

    let mut settings = load_settings(&state, &auth.user_id).await?;
    settings.apply(update);
    save_settings(&state.pool, &mut settings).await?;

    tracing::debug!(user_id = %auth.user_id, frequency = settings.frequency.as_str(), "notification settings saved");
    Ok(Json(NotificationUpdateResponse {
        message: "notification settings updated".into(),
        settings,
    }))
}

#[utoipa::path(
    post,
    path = "/notifications/line/connect",
    tag = "Notifications",
    request_body = LineConnectRequest,
    responses(
        (status = 200, description = "LINE account recorded", body = LineConnectResponse),
        (status = 400, description = "lineUserId missing", body = ErrorResponse)
    )
)]
pub async fn connect_line(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<LineConnectRequest>,
) -> AppResult<Json<LineConnectResponse>> {
    let line_user_id = non_blank(payload.line_user_id).ok_or_else(|| AppError::bad_request("lineUserId is required"))?;

    let mut settings = load_settings(&state, &auth.user_id).await?;
    settings.line_connected = true;
    settings.line_user_id = Some(line_user_id.clone());
    save_settings(&state.pool, &mut settings).await?;

    tracing::info!(user_id = %auth.user_id, "LINE account connected");
    Ok(Json(LineConnectResponse {
        message: "LINE account connected".into(),
        line_user_id,
    }))
}

#[utoipa::path(
    post,
    path = "/notifications/line/disconnect",
    tag = "Notifications",
    responses((status = 200, description = "LINE account detached", body = MessageResponse))
)]
pub async fn disconnect_line(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<MessageResponse>> {
    let mut settings = load_settings(&state, &auth.user_id).await?;
    settings.line_connected = false;
    settings.line_user_id = None;
    save_settings(&state.pool, &mut settings).await?;

    tracing::info!(user_id = %auth.user_id, "LINE account disconnected");
    Ok(Json(MessageResponse::new("LINE account disconnected")))
}
