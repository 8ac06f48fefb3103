use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::products::fetch_product;
use crate::app::AppState;
use crate::authz::AuthUser;
use crate::db::is_unique_violation;
use crate::errors::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::common::MessageResponse;
use crate::models::favorite::{FavoriteAdded, FavoriteListResponse, FavoriteRequest};
use crate::models::product::Product;
use crate::utils::utc_now;
use crate::validation::non_blank;

#[utoipa::path(
    get,
    path = "/favorites",
    tag = "Favorites",
    responses(
        (status = 200, description = "Favorited products, most recent first", body = FavoriteListResponse),
        (status = 401, description = "Missing or invalid user token", body = ErrorResponse)
    )
)]
pub async fn list_favorites(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<FavoriteListResponse>> {
    // the join drops favorites whose product no longer exists
    let favorites = sqlx::query_as::<_, Product>(
        "SELECT p.product_id, p.name, p.category, p.current_price, p.previous_price, p.shop, p.description, p.image_url, p.created_at, p.updated_at \
         FROM favorites f JOIN products p ON p.product_id = f.product_id \
         WHERE f.user_id = ? ORDER BY f.created_at DESC",
    )
    .bind(&auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(FavoriteListResponse { favorites }))
}

#[utoipa::path(
    post,
    path = "/favorites",
    tag = "Favorites",
    request_body = FavoriteRequest,
    responses(
        (status = 201, description = "Product added to favorites", body = FavoriteAdded),
        (status = 400, description = "productId missing", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 409, description = "Already a favorite", body = ErrorResponse)
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<FavoriteRequest>,
) -> AppResult<(StatusCode, Json<FavoriteAdded>)> {
    let product_id = non_blank(payload.product_id).ok_or_else(|| AppError::bad_request("productId is required"))?;
    if fetch_product(&state.pool, &product_id).await?.is_none() {
        return Err(AppError::not_found("product not found"));
    }

    sqlx::query("INSERT INTO favorites (user_id, product_id, created_at) VALUES (?, ?, ?)")
        .bind(&auth.user_id)
        .bind(&product_id)
        .bind(utc_now())
        .execute(&state.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::conflict("product is already in favorites")
            } else {
                AppError::Database(err)
            }
        })?;

    tracing::debug!(user_id = %auth.user_id, product_id = %product_id, "favorite added");
    Ok((
        StatusCode::CREATED,
        Json(FavoriteAdded {
            message: "added to favorites".into(),
            product_id,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/favorites/{productId}",
    tag = "Favorites",
    params(("productId" = String, Path, description = "Product id")),
    responses((status = 200, description = "Removed (or was not a favorite)", body = MessageResponse))
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    sqlx::query("DELETE FROM favorites WHERE user_id = ? AND product_id = ?")
        .bind(&auth.user_id)
        .bind(&product_id)
        .execute(&state.pool)
        .await?;

    Ok(Json(MessageResponse::new("removed from favorites")))
}
