#![allow(dead_code)]

use std::path::Path;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use bargain_api::authz::Role;
use bargain_api::config::AppConfig;
use bargain_api::create_app;
use bargain_api::db::accounts::SqliteAccountStore;
use bargain_api::jwt::TokenCodec;
use bargain_api::models::account::DbAccount;
use bargain_api::store::AccountStore;
use bargain_api::utils::hash_password;

pub const SECRET: &str = "test-secret";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub codec: TokenCodec,
    pub config: AppConfig,
    // keeps the database and image directory alive
    _dir: TempDir,
}

pub async fn setup() -> Result<TestApp> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let config = AppConfig::with_secret(SECRET).with_image_dir(dir.path().join("images"));
    let app = create_app(pool.clone(), config.clone()).await?;

    Ok(TestApp {
        app,
        pool,
        codec: TokenCodec::from_config(&config),
        config,
        _dir: dir,
    })
}

impl TestApp {
    pub async fn seed_admin(
        &self,
        account_id: &str,
        username: &str,
        role: Role,
        company_id: Option<&str>,
        store_id: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now();
        let account = DbAccount {
            account_id: account_id.into(),
            username: username.into(),
            name: format!("{username} name"),
            email: format!("{username}@example.com"),
            password_hash: hash_password(PASSWORD)?,
            role: role.as_str().into(),
            company_id: company_id.map(str::to_string),
            company_name: None,
            store_id: store_id.map(str::to_string),
            store_name: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        SqliteAccountStore::new(self.pool.clone()).insert(&account).await?;
        Ok(())
    }

    /// Logs in through the API and returns the admin token.
    pub async fn login(&self, username: &str) -> Result<String> {
        let body = serde_json::json!({ "username": username, "password": PASSWORD });
        let (status, v) = self.send("POST", "/admin/auth/login", None, Some(body)).await?;
        if status != StatusCode::OK {
            panic!("login failed: {} - {}", status, v);
        }
        let token = v
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing token"))?;
        Ok(token.to_string())
    }

    pub fn user_token(&self, user_id: &str) -> Result<String> {
        Ok(self.codec.issue_user_token(user_id)?)
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let v = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };
        Ok((status, v))
    }

    pub async fn send_raw(&self, method: &str, uri: &str, token: Option<&str>, body: &str) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let resp = self.app.clone().oneshot(builder.body(Body::from(body.to_string()))?).await?;
        let status = resp.status();
        let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        Ok((status, serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)))
    }
}

pub fn error_code(v: &Value) -> &str {
    v.get("error").and_then(Value::as_str).unwrap_or_default()
}
