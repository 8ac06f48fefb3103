use std::collections::HashMap;

use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::models::category::{Category, CategoryListResponse, CATEGORIES};

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    security(()),
    responses((status = 200, description = "Fixed categories with product counts", body = CategoryListResponse))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<CategoryListResponse>> {
    let counts: HashMap<String, i64> =
        sqlx::query_as::<_, (String, i64)>("SELECT category, COUNT(*) FROM products GROUP BY category")
            .fetch_all(&state.pool)
            .await?
            .into_iter()
            .collect();

    let categories = CATEGORIES
        .iter()
        .map(|(id, name, display_order)| Category {
            id: id.to_string(),
            name: name.to_string(),
            display_order: *display_order,
            product_count: counts.get(*name).copied().unwrap_or(0),
        })
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}
