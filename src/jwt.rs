use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::authz::AdminIdentity;
use crate::config::AppConfig;
use crate::errors::AppError;

/// Discriminator carried by admin tokens only.
pub const ADMIN_TOKEN_TYPE: &str = "admin";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed")]
    Malformed,
    #[error("token signature invalid")]
    SignatureInvalid,
}

/// Claim set shared by user and admin tokens. User tokens carry `user_id`;
/// admin tokens carry `admin_id`, `role`, tenant ids and `type = "admin"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.token_type.as_deref() == Some(ADMIN_TOKEN_TYPE)
    }
}

#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>, exp_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            exp_hours,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.jwt_exp_hours)
    }

    pub fn issue_user_token(&self, user_id: &str) -> Result<String, AppError> {
        self.issue_user_token_for(user_id, self.exp_hours)
    }

    pub fn issue_user_token_for(&self, user_id: &str, ttl_hours: i64) -> Result<String, AppError> {
        let mut claims = self.base_claims(ttl_hours);
        claims.user_id = Some(user_id.to_string());
        self.sign(&claims)
    }

    pub fn issue_admin_token(&self, identity: &AdminIdentity) -> Result<String, AppError> {
        self.issue_admin_token_for(identity, self.exp_hours)
    }

    pub fn issue_admin_token_for(&self, identity: &AdminIdentity, ttl_hours: i64) -> Result<String, AppError> {
        let mut claims = self.base_claims(ttl_hours);
        claims.admin_id = Some(identity.admin_id().to_string());
        claims.role = Some(identity.role().as_str().to_string());
        claims.company_id = identity.company_id().map(str::to_string);
        claims.store_id = identity.store_id().map(str::to_string);
        claims.token_type = Some(ADMIN_TOKEN_TYPE.to_string());
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::internal(format!("failed to sign token: {err}")))
    }

    /// Fails closed; the specific failure is logged here and callers only see
    /// that verification did not succeed.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                let kind = match err.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                    _ => TokenError::Malformed,
                };
                tracing::warn!(reason = %kind, "token verification failed");
                kind
            })
    }

    fn base_claims(&self, ttl_hours: i64) -> Claims {
        let now = Utc::now();
        let exp = now + Duration::hours(ttl_hours);

        Claims {
            user_id: None,
            admin_id: None,
            role: None,
            company_id: None,
            store_id: None,
            token_type: None,
            exp: exp.timestamp().max(0) as usize,
            iat: now.timestamp() as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret".to_vec(), 1)
    }

    #[test]
    fn test_user_token_round_trip() {
        let codec = codec();
        let token = codec.issue_user_token("user-1").unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.user_id.as_deref(), Some("user-1"));
        assert!(!claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_admin_token_carries_discriminator_and_scope() {
        let codec = codec();
        let identity = AdminIdentity::store_user("admin_9", "100", "s-1");
        let token = codec.issue_admin_token(&identity).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert!(claims.is_admin());
        assert_eq!(claims.admin_id.as_deref(), Some("admin_9"));
        assert_eq!(claims.role.as_deref(), Some("store_user"));
        assert_eq!(claims.company_id.as_deref(), Some("100"));
        assert_eq!(claims.store_id.as_deref(), Some("s-1"));
        assert!(claims.user_id.is_none());
    }

    #[test]
    fn test_system_admin_token_has_no_tenant_claims() {
        let codec = codec();
        let token = codec.issue_admin_token(&AdminIdentity::system_admin("root")).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert!(claims.company_id.is_none());
        assert!(claims.store_id.is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = codec();
        let token = codec.issue_user_token_for("user-1", -2).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let token = TokenCodec::new(b"other-secret".to_vec(), 1)
            .issue_user_token("user-1")
            .unwrap();
        assert_eq!(codec().verify(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(codec().verify("not-a-jwt"), Err(TokenError::Malformed));
    }
}
