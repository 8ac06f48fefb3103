//! Authorization module - identities, token extraction and tenant policy
//!
//! This module implements the admin access-control model:
//! - Role gate for admin-only operations
//! - Tenant-scoped resource checks (company / store)
//! - Tenant filters for list operations
//! - Self-delete and privilege-escalation guards

mod identity;
mod policy;

pub use identity::{
    extract_bearer_token, resolve_admin_identity, resolve_user_identity, AdminIdentity, AdminUser, AuthUser,
    SystemAdminUser,
};
pub use policy::{
    can_access_account, check_account_write, check_permission, derive_list_filter, ensure_not_self, require_role,
    TenantFilter,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Admin roles, from widest to narrowest scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    CompanyAdmin,
    StoreUser,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SystemAdmin, Role::CompanyAdmin, Role::StoreUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SystemAdmin => "system_admin",
            Role::CompanyAdmin => "company_admin",
            Role::StoreUser => "store_user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AuthError::InvalidIdentity(format!("unknown role `{value}`")))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("required role: {}", join_roles(.required))]
    Forbidden { required: Vec<Role> },
    #[error("you do not have permission to access this account")]
    TenantMismatch,
    #[error("you cannot delete your own account")]
    SelfDelete,
    #[error("{0}")]
    Escalation(String),
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

fn join_roles(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}
