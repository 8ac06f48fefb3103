use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AppError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_JWT_EXP_HOURS: i64 = 24;
const DEFAULT_PAGE_LIMIT: u32 = 20;
const MAX_PAGE_LIMIT: u32 = 100;
const DEFAULT_PRICE_CHANGE_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Process-wide settings, built once at startup and handed to every component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database_url: Option<String>,
    pub port: u16,
    pub jwt_secret: Vec<u8>,
    pub jwt_exp_hours: i64,
    pub image_dir: PathBuf,
    pub image_base_url: String,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub default_price_change_threshold: u32,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        if secret.is_empty() {
            return Err(AppError::configuration("JWT_SECRET must not be empty"));
        }

        let environment = match std::env::var("APP_ENV").unwrap_or_default().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let port = parse_var("APP_PORT", DEFAULT_PORT)?;
        let image_base_url = std::env::var("IMAGE_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/images"));

        let config = Self {
            environment,
            database_url: std::env::var("DATABASE_URL").ok(),
            port,
            jwt_secret: secret.into_bytes(),
            jwt_exp_hours: parse_var("JWT_EXP_HOURS", DEFAULT_JWT_EXP_HOURS)?,
            image_dir: std::env::var("IMAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./uploads")),
            image_base_url,
            default_page_limit: parse_var("DEFAULT_PAGE_LIMIT", DEFAULT_PAGE_LIMIT)?,
            max_page_limit: parse_var("MAX_PAGE_LIMIT", MAX_PAGE_LIMIT)?,
            default_price_change_threshold: parse_var(
                "DEFAULT_PRICE_CHANGE_THRESHOLD",
                DEFAULT_PRICE_CHANGE_THRESHOLD,
            )?,
            tls_cert: std::env::var("TLS_CERT").ok().map(PathBuf::from),
            tls_key: std::env::var("TLS_KEY").ok().map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Settings for tests and tooling: fixed secret, everything else default.
    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            environment: Environment::Development,
            database_url: None,
            port: DEFAULT_PORT,
            jwt_secret: secret.into(),
            jwt_exp_hours: DEFAULT_JWT_EXP_HOURS,
            image_dir: PathBuf::from("./uploads"),
            image_base_url: format!("http://localhost:{DEFAULT_PORT}/images"),
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: MAX_PAGE_LIMIT,
            default_price_change_threshold: DEFAULT_PRICE_CHANGE_THRESHOLD,
            tls_cert: None,
            tls_key: None,
        }
    }

    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.jwt_exp_hours <= 0 {
            return Err(AppError::configuration("JWT_EXP_HOURS must be positive"));
        }
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(AppError::configuration(
                "DEFAULT_PAGE_LIMIT must be between 1 and MAX_PAGE_LIMIT",
            ));
        }
        if self.tls_cert.is_some() != self.tls_key.is_some() {
            return Err(AppError::configuration("TLS_CERT and TLS_KEY must be set together"));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| AppError::configuration(format!("{name} must be a valid number"))),
        Err(_) => Ok(default),
    }
}
