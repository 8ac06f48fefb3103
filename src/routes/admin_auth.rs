use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::account::{LoginRequest, LoginResponse};

#[utoipa::path(
    post,
    path = "/admin/auth/login",
    tag = "Admin Auth",
    security(()),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Admin token issued", body = LoginResponse),
        (status = 400, description = "Username or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (Some(username), Some(password)) = (
        payload.username.filter(|u| !u.trim().is_empty()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request("username and password are required"));
    };

    let response = state.accounts.login(&state.tokens, username.trim(), &password).await?;
    Ok(Json(response))
}
