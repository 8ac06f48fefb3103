use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::authz::{Role, TenantFilter};
use crate::errors::AppError;

/// Account as returned by the API. Deliberately has no password hash.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub store_id: Option<String>,
    pub store_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAccount {
    pub account_id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub store_id: Option<String>,
    pub store_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbAccount> for Account {
    type Error = AppError;

    fn try_from(value: DbAccount) -> Result<Self, Self::Error> {
        let role = value
            .role
            .parse::<Role>()
            .map_err(|_| AppError::internal(format!("account {} has unknown role {}", value.account_id, value.role)))?;

        Ok(Account {
            account_id: value.account_id,
            username: value.username,
            name: value.name,
            email: value.email,
            role,
            company_id: value.company_id,
            company_name: value.company_name,
            store_id: value.store_id,
            store_name: value.store_name,
            created_at: value.created_at,
            updated_at: value.updated_at,
            last_login_at: value.last_login_at,
        })
    }
}

/// Criteria for listing accounts. `owner_id` is only ever set by the
/// tenant filter, never from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub company_id: Option<String>,
    pub owner_id: Option<String>,
}

impl AccountFilter {
    /// Tenant criteria win over anything the caller supplied.
    pub fn with_tenant(mut self, tenant: TenantFilter) -> Self {
        if tenant.company_id.is_some() {
            self.company_id = tenant.company_id;
        }
        if tenant.owner_id.is_some() {
            self.owner_id = tenant.owner_id;
        }
        self
    }

    pub fn matches(&self, account: &DbAccount) -> bool {
        if let Some(search) = self.search.as_deref().map(str::to_lowercase) {
            let hit = [&account.username, &account.name, &account.email]
                .iter()
                .any(|field| field.to_lowercase().contains(&search));
            if !hit {
                return false;
            }
        }
        if let Some(role) = self.role {
            if account.role != role.as_str() {
                return false;
            }
        }
        if let Some(company_id) = &self.company_id {
            if account.company_id.as_ref() != Some(company_id) {
                return false;
            }
        }
        if let Some(owner_id) = &self.owner_id {
            if &account.account_id != owner_id {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountListQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub company_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreateRequest {
    #[schema(example = "tanaka")]
    pub username: String,
    #[schema(example = "Hanako Tanaka")]
    pub name: String,
    #[schema(example = "tanaka@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
    pub role: Role,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub store_id: Option<String>,
    pub store_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub store_id: Option<String>,
    pub store_name: Option<String>,
}

/// Field-level changes handed to the store; `None` leaves a column alone.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub store_id: Option<String>,
    pub store_name: Option<String>,
    /// Nulls every tenant column; set when an account becomes a system admin.
    pub clear_tenant: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "tanaka")]
    pub username: Option<String>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub admin: Account,
}
