use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{AdminUser, Role};
use crate::errors::{AppError, AppResult, FieldError};
use crate::extract::JsonBody;
use crate::models::account::{Account, AccountCreateRequest, AccountFilter, AccountListQuery, AccountUpdateRequest};
use crate::models::common::{MessageResponse, Page};
use crate::validation::{non_blank, page_request};

#[utoipa::path(
    get,
    path = "/admin/accounts/list",
    tag = "Admin Accounts",
    params(
        ("search" = Option<String>, Query, description = "Matches username, name or email"),
        ("role" = Option<Role>, Query, description = "Role filter"),
        ("companyId" = Option<String>, Query, description = "Company filter (system_admin only)"),
        ("page" = Option<u32>, Query, description = "Page number, from 1"),
        ("limit" = Option<u32>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Accounts visible to the caller", body = AccountPage),
        (status = 403, description = "Missing or invalid admin token", body = ErrorResponse)
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Query(query): Query<AccountListQuery>,
) -> AppResult<Json<Page<Account>>> {
    let page = page_request(query.page.as_deref(), query.limit.as_deref(), &state.config)?;
    let role = match non_blank(query.role) {
        Some(role) => Some(role.parse::<Role>().map_err(|_| {
            AppError::validation(vec![FieldError::new(
                "role",
                "allowed values: system_admin, company_admin, store_user",
            )])
        })?),
        None => None,
    };

    let filter = AccountFilter {
        search: non_blank(query.search),
        role,
        company_id: non_blank(query.company_id),
        owner_id: None,
    };

    let accounts = state.accounts.list(&identity, filter, page).await?;
    Ok(Json(accounts))
}

#[utoipa::path(
    get,
    path = "/admin/accounts/list/{accountId}",
    tag = "Admin Accounts",
    params(("accountId" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account detail", body = Account),
        (status = 403, description = "Outside the caller's tenant", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
pub async fn get_account(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(account_id): Path<String>,
) -> AppResult<Json<Account>> {
    let account = state.accounts.get(&identity, &account_id).await?;
    Ok(Json(account))
}

#[utoipa::path(
    post,
    path = "/admin/accounts/add",
    tag = "Admin Accounts",
    request_body = AccountCreateRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Role or tenant not permitted", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse)
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    JsonBody(payload): JsonBody<AccountCreateRequest>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let account = state.accounts.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    put,
    path = "/admin/accounts/update/{accountId}",
    tag = "Admin Accounts",
    params(("accountId" = String, Path, description = "Account id")),
    request_body = AccountUpdateRequest,
    responses(
        (status = 200, description = "Account updated", body = Account),
        (status = 403, description = "Role or tenant not permitted", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
pub async fn update_account(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(account_id): Path<String>,
    JsonBody(payload): JsonBody<AccountUpdateRequest>,
) -> AppResult<Json<Account>> {
    let account = state.accounts.update(&identity, &account_id, payload).await?;
    Ok(Json(account))
}

#[utoipa::path(
    delete,
    path = "/admin/accounts/delete/{accountId}",
    tag = "Admin Accounts",
    params(("accountId" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 403, description = "Self delete or outside the caller's tenant", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
pub async fn delete_account(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(account_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.accounts.delete(&identity, &account_id).await?;
    Ok(Json(MessageResponse::new("account deleted")))
}
