use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::product::{
    AiSummary, PriceHistoryQuery, PriceHistoryResponse, PricePoint, Product, ProductDetail, ProductListQuery,
    ProductListResponse,
};
use crate::utils::utc_now;
use crate::validation::{limit_offset, non_blank, price_history_days, sort_order, DEFAULT_PRICE_HISTORY_DAYS};

const PRODUCT_COLUMNS: &str =
    "product_id, name, category, current_price, previous_price, shop, description, image_url, created_at, updated_at";

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, keyword: Option<&str>, category: Option<&str>) {
    query.push(" WHERE 1 = 1");
    if let Some(keyword) = keyword {
        let pattern = format!("%{}%", keyword.to_lowercase());
        query
            .push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(description, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = category {
        query.push(" AND category = ").push_bind(category.to_string());
    }
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    security(()),
    params(
        ("keyword" = Option<String>, Query, description = "Matches name or description"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("sort" = Option<SortOrder>, Query, description = "Ordering, default updated_desc"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("offset" = Option<u32>, Query, description = "Rows to skip")
    ),
    responses(
        (status = 200, description = "Matching products", body = ProductListResponse),
        (status = 400, description = "Invalid paging or sort", body = ErrorResponse)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<ProductListResponse>> {
    let (limit, offset) = limit_offset(query.limit.as_deref(), query.offset.as_deref(), &state.config)?;
    let sort = sort_order(query.sort.as_deref())?;
    let keyword = non_blank(query.keyword);
    let category = non_blank(query.category);

    let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_filters(&mut count, keyword.as_deref(), category.as_deref());
    let total: i64 = count.build_query_scalar().fetch_one(&state.pool).await?;

    let mut select: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
    push_filters(&mut select, keyword.as_deref(), category.as_deref());
    select
        .push(" ORDER BY ")
        .push(sort.order_by())
        .push(" LIMIT ")
        .push_bind(i64::from(limit))
        .push(" OFFSET ")
        .push_bind(i64::from(offset));
    let products = select.build_query_as::<Product>().fetch_all(&state.pool).await?;

    Ok(Json(ProductListResponse {
        products,
        total: u64::try_from(total).unwrap_or_default(),
        limit,
        offset,
    }))
}

#[utoipa::path(
    get,
    path = "/products/{productId}",
    tag = "Products",
    security(()),
    params(("productId" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with recent price history", body = ProductDetail),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<ProductDetail>> {
    let product = fetch_product(&state.pool, &product_id)
        .await?
        .ok_or_else(|| AppError::not_found("product not found"))?;
    let price_history = fetch_history(&state.pool, &product_id, DEFAULT_PRICE_HISTORY_DAYS).await?;
    let ai_summary = AiSummary::placeholder(product.current_price, &price_history);

    Ok(Json(ProductDetail {
        product,
        price_history,
        ai_summary,
    }))
}

#[utoipa::path(
    get,
    path = "/products/{productId}/price-history",
    tag = "Products",
    security(()),
    params(
        ("productId" = String, Path, description = "Product id"),
        ("days" = Option<u32>, Query, description = "One of 7, 30, 60, 90, 180")
    ),
    responses(
        (status = 200, description = "Daily prices, oldest first", body = PriceHistoryResponse),
        (status = 400, description = "Unsupported window", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn price_history(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<PriceHistoryQuery>,
) -> AppResult<Json<PriceHistoryResponse>> {
    let days = price_history_days(query.days.as_deref())?;
    if fetch_product(&state.pool, &product_id).await?.is_none() {
        return Err(AppError::not_found("product not found"));
    }

    let history = fetch_history(&state.pool, &product_id, days).await?;
    Ok(Json(PriceHistoryResponse { product_id, history }))
}

pub(crate) async fn fetch_product(pool: &SqlitePool, product_id: &str) -> AppResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ?"))
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

async fn fetch_history(pool: &SqlitePool, product_id: &str, days: u32) -> AppResult<Vec<PricePoint>> {
    let since: NaiveDate = (utc_now() - Duration::days(i64::from(days))).date_naive();
    let history = sqlx::query_as::<_, PricePoint>(
        "SELECT date, price, shop FROM price_history WHERE product_id = ? AND date >= ? ORDER BY date ASC",
    )
    .bind(product_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(history)
}
