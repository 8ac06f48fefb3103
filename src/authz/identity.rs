use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::{require_role, AuthError, Role};
use crate::app::AppState;
use crate::errors::AppError;
use crate::jwt::{Claims, TokenCodec};

/// Authenticated admin caller. Each variant carries exactly the tenant
/// attributes its role requires, so an identity with a missing company or
/// store id cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminIdentity {
    SystemAdmin {
        admin_id: String,
    },
    CompanyAdmin {
        admin_id: String,
        company_id: String,
    },
    StoreUser {
        admin_id: String,
        company_id: String,
        store_id: String,
    },
}

impl AdminIdentity {
    /// Builds an identity from loose parts, enforcing the tenant invariants:
    /// system admins carry no tenant, company admins a company, store users
    /// a company and a store.
    pub fn new(
        admin_id: impl Into<String>,
        role: Role,
        company_id: Option<String>,
        store_id: Option<String>,
    ) -> Result<Self, AuthError> {
        let admin_id = admin_id.into();
        if admin_id.is_empty() {
            return Err(AuthError::InvalidIdentity("admin id is empty".into()));
        }

        let company_id = company_id.filter(|id| !id.is_empty());
        let store_id = store_id.filter(|id| !id.is_empty());

        match role {
            Role::SystemAdmin => {
                if company_id.is_some() || store_id.is_some() {
                    return Err(AuthError::InvalidIdentity(
                        "system_admin must not carry a tenant scope".into(),
                    ));
                }
                Ok(Self::SystemAdmin { admin_id })
            }
            Role::CompanyAdmin => {
                let company_id = company_id
                    .ok_or_else(|| AuthError::InvalidIdentity("company_admin requires a company id".into()))?;
                Ok(Self::CompanyAdmin { admin_id, company_id })
            }
            Role::StoreUser => {
                let company_id = company_id
                    .ok_or_else(|| AuthError::InvalidIdentity("store_user requires a company id".into()))?;
                let store_id =
                    store_id.ok_or_else(|| AuthError::InvalidIdentity("store_user requires a store id".into()))?;
                Ok(Self::StoreUser {
                    admin_id,
                    company_id,
                    store_id,
                })
            }
        }
    }

    pub fn system_admin(admin_id: impl Into<String>) -> Self {
        Self::SystemAdmin {
            admin_id: admin_id.into(),
        }
    }

    pub fn company_admin(admin_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self::CompanyAdmin {
            admin_id: admin_id.into(),
            company_id: company_id.into(),
        }
    }

    pub fn store_user(
        admin_id: impl Into<String>,
        company_id: impl Into<String>,
        store_id: impl Into<String>,
    ) -> Self {
        Self::StoreUser {
            admin_id: admin_id.into(),
            company_id: company_id.into(),
            store_id: store_id.into(),
        }
    }

    pub fn admin_id(&self) -> &str {
        match self {
            Self::SystemAdmin { admin_id }
            | Self::CompanyAdmin { admin_id, .. }
            | Self::StoreUser { admin_id, .. } => admin_id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::SystemAdmin { .. } => Role::SystemAdmin,
            Self::CompanyAdmin { .. } => Role::CompanyAdmin,
            Self::StoreUser { .. } => Role::StoreUser,
        }
    }

    pub fn company_id(&self) -> Option<&str> {
        match self {
            Self::SystemAdmin { .. } => None,
            Self::CompanyAdmin { company_id, .. } | Self::StoreUser { company_id, .. } => Some(company_id),
        }
    }

    pub fn store_id(&self) -> Option<&str> {
        match self {
            Self::StoreUser { store_id, .. } => Some(store_id),
            _ => None,
        }
    }
}

impl TryFrom<Claims> for AdminIdentity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        if !claims.is_admin() {
            return Err(AuthError::Unauthenticated);
        }

        let admin_id = claims.admin_id.ok_or(AuthError::Unauthenticated)?;
        let role: Role = claims.role.as_deref().ok_or(AuthError::Unauthenticated)?.parse()?;

        Self::new(admin_id, role, claims.company_id, claims.store_id)
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header. Any other
/// shape means "no credential supplied", not an error.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();

    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    Some(token)
}

pub fn resolve_user_identity(headers: &HeaderMap, codec: &TokenCodec) -> Result<String, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::Unauthenticated)?;
    let claims = codec.verify(token).map_err(|_| AuthError::Unauthenticated)?;

    claims
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or(AuthError::Unauthenticated)
}

pub fn resolve_admin_identity(headers: &HeaderMap, codec: &TokenCodec) -> Result<AdminIdentity, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::Unauthenticated)?;
    let claims = codec.verify(token).map_err(|_| AuthError::Unauthenticated)?;

    AdminIdentity::try_from(claims).map_err(|err| {
        if let AuthError::InvalidIdentity(reason) = &err {
            tracing::warn!(%reason, "admin token carries an inconsistent identity");
        }
        AuthError::Unauthenticated
    })
}

/// End-user caller resolved from a user token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = resolve_user_identity(&parts.headers, &state.tokens)?;
        Ok(AuthUser { user_id })
    }
}

/// Admin caller resolved from an admin token. Missing or invalid admin
/// credentials are answered with 403 on admin routes.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminIdentity);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_admin_identity(&parts.headers, &state.tokens)
            .map(AdminUser)
            .map_err(|_| AppError::forbidden("admin authentication required"))
    }
}

/// Admin caller that must hold `system_admin`. Listed ahead of the input
/// extractors so other roles get 403 before any input is read.
#[derive(Debug, Clone)]
pub struct SystemAdminUser(pub AdminIdentity);

#[async_trait]
impl FromRequestParts<AppState> for SystemAdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AdminUser(identity) = AdminUser::from_request_parts(parts, state).await?;
        require_role(&identity, &[Role::SystemAdmin])?;
        Ok(SystemAdminUser(identity))
    }
}
