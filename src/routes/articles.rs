use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::SystemAdminUser;
use crate::errors::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::article::{
    Article, ArticleCreateRequest, ArticleFilter, ArticleListQuery, ArticleStatus, ArticleUpdateRequest,
    BulkDeleteRequest, BulkStatusRequest,
};
use crate::models::common::{BulkOutcome, BulkResponse, MessageResponse, Page};
use crate::validation::{article_id, date_bound, non_blank, page_request, tag_list};

#[utoipa::path(
    get,
    path = "/admin/articles/list",
    tag = "Admin Articles",
    params(
        ("search" = Option<String>, Query, description = "Matches title or content"),
        ("status" = Option<ArticleStatus>, Query, description = "draft or published"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("tags" = Option<String>, Query, description = "Comma separated, any tag matches"),
        ("dateFrom" = Option<String>, Query, description = "Published on or after"),
        ("dateTo" = Option<String>, Query, description = "Published on or before"),
        ("page" = Option<u32>, Query, description = "Page number, from 1"),
        ("limit" = Option<u32>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Articles, newest publication first", body = ArticlePage),
        (status = 403, description = "Caller is not a system admin", body = ErrorResponse)
    )
)]
pub async fn list_articles(
    State(state): State<AppState>,
    SystemAdminUser(identity): SystemAdminUser,
    Query(query): Query<ArticleListQuery>,
) -> AppResult<Json<Page<Article>>> {
    let page = page_request(query.page.as_deref(), query.limit.as_deref(), &state.config)?;
    let status = match non_blank(query.status) {
        Some(status) => Some(status.parse::<ArticleStatus>()?),
        None => None,
    };

    let filter = ArticleFilter {
        search: non_blank(query.search),
        status,
        category: non_blank(query.category),
        tags: tag_list(query.tags.as_deref()),
        date_from: date_bound("dateFrom", query.date_from.as_deref(), false)?,
        date_to: date_bound("dateTo", query.date_to.as_deref(), true)?,
    };

    let articles = state.articles.list(&identity, filter, page).await?;
    Ok(Json(articles))
}

#[utoipa::path(
    get,
    path = "/admin/articles/list/{articleId}",
    tag = "Admin Articles",
    params(("articleId" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article detail", body = Article),
        (status = 404, description = "Article not found", body = ErrorResponse)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    SystemAdminUser(identity): SystemAdminUser,
    Path(raw_id): Path<String>,
) -> AppResult<Json<Article>> {
    let article = state.articles.get(&identity, article_id(&raw_id)?).await?;
    Ok(Json(article))
}

#[utoipa::path(
    post,
    path = "/admin/articles/add",
    tag = "Admin Articles",
    request_body = ArticleCreateRequest,
    responses(
        (status = 201, description = "Article created", body = Article),
        (status = 400, description = "Invalid input or image data", body = ErrorResponse),
        (status = 403, description = "Caller is not a system admin", body = ErrorResponse)
    )
)]
pub async fn create_article(
    State(state): State<AppState>,
    SystemAdminUser(identity): SystemAdminUser,
    JsonBody(payload): JsonBody<ArticleCreateRequest>,
) -> AppResult<(StatusCode, Json<Article>)> {
    let article = state.articles.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

#[utoipa::path(
    put,
    path = "/admin/articles/update/{articleId}",
    tag = "Admin Articles",
    params(("articleId" = i64, Path, description = "Article id")),
    request_body = ArticleUpdateRequest,
    responses(
        (status = 200, description = "Article updated", body = Article),
        (status = 404, description = "Article not found", body = ErrorResponse)
    )
)]
pub async fn update_article(
    State(state): State<AppState>,
    SystemAdminUser(identity): SystemAdminUser,
    Path(raw_id): Path<String>,
    JsonBody(payload): JsonBody<ArticleUpdateRequest>,
) -> AppResult<Json<Article>> {
    let article = state.articles.update(&identity, article_id(&raw_id)?, payload).await?;
    Ok(Json(article))
}

#[utoipa::path(
    delete,
    path = "/admin/articles/delete/{articleId}",
    tag = "Admin Articles",
    params(("articleId" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted", body = MessageResponse),
        (status = 404, description = "Article not found", body = ErrorResponse)
    )
)]
pub async fn delete_article(
    State(state): State<AppState>,
    SystemAdminUser(identity): SystemAdminUser,
    Path(raw_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.articles.delete(&identity, article_id(&raw_id)?).await?;
    Ok(Json(MessageResponse::new("article deleted")))
}

#[utoipa::path(
    put,
    path = "/admin/articles/bulk-status",
    tag = "Admin Articles",
    request_body = BulkStatusRequest,
    responses(
        (status = 200, description = "Per-id outcome counts", body = BulkResponse),
        (status = 400, description = "No ids or no status", body = ErrorResponse)
    )
)]
pub async fn bulk_update_status(
    State(state): State<AppState>,
    SystemAdminUser(identity): SystemAdminUser,
    JsonBody(payload): JsonBody<BulkStatusRequest>,
) -> AppResult<Json<BulkResponse>> {
    let status = non_blank(payload.status)
        .ok_or_else(|| AppError::bad_request("status is required"))?
        .parse::<ArticleStatus>()?;

    let outcome = state
        .articles
        .bulk_update_status(&identity, &payload.article_ids, status)
        .await?;
    Ok(Json(bulk_response(outcome, "updated")))
}

#[utoipa::path(
    delete,
    path = "/admin/articles/bulk-delete",
    tag = "Admin Articles",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Per-id outcome counts", body = BulkResponse),
        (status = 400, description = "No ids", body = ErrorResponse)
    )
)]
pub async fn bulk_delete(
    State(state): State<AppState>,
    SystemAdminUser(identity): SystemAdminUser,
    JsonBody(payload): JsonBody<BulkDeleteRequest>,
) -> AppResult<Json<BulkResponse>> {
    let outcome = state.articles.bulk_delete(&identity, &payload.article_ids).await?;
    Ok(Json(bulk_response(outcome, "deleted")))
}

fn bulk_response(outcome: BulkOutcome, verb: &str) -> BulkResponse {
    BulkResponse {
        message: format!("{} articles {verb}", outcome.success_count),
        success_count: outcome.success_count,
        failed_count: outcome.failed_count,
    }
}
