use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::accounts::SqliteAccountStore;
use crate::db::articles::SqliteArticleStore;
use crate::errors::AppError;
use crate::images::{ImageStore, LocalImageStore};
use crate::jwt::TokenCodec;
use crate::routes::{
    accounts, admin_auth, articles, categories, contact, favorites, health, notifications, products,
};
use crate::services::{AccountService, ArticleService};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub tokens: Arc<TokenCodec>,
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
    pub articles: ArticleService,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(
            config.image_dir.clone(),
            config.image_base_url.clone(),
        ));
        let accounts = AccountService::new(Arc::new(SqliteAccountStore::new(pool.clone())));
        let articles = ArticleService::new(Arc::new(SqliteArticleStore::new(pool.clone())), images);

        Self {
            tokens: Arc::new(TokenCodec::from_config(&config)),
            config: Arc::new(config),
            pool,
            accounts,
            articles,
        }
    }
}

pub async fn create_app(pool: SqlitePool, config: AppConfig) -> Result<Router, AppError> {
    tokio::fs::create_dir_all(&config.image_dir)
        .await
        .map_err(|err| AppError::configuration(format!("cannot create image dir: {err}")))?;
    let image_dir = config.image_dir.clone();
    let state = AppState::new(pool, config);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let account_routes = Router::new()
        .route("/list", get(accounts::list_accounts))
        .route("/list/:account_id", get(accounts::get_account))
        .route("/add", post(accounts::create_account))
        .route("/update/:account_id", put(accounts::update_account))
        .route("/delete/:account_id", delete(accounts::delete_account));

    let article_routes = Router::new()
        .route("/list", get(articles::list_articles))
        .route("/list/:article_id", get(articles::get_article))
        .route("/add", post(articles::create_article))
        .route("/update/:article_id", put(articles::update_article))
        .route("/delete/:article_id", delete(articles::delete_article))
        .route("/bulk-status", put(articles::bulk_update_status))
        .route("/bulk-delete", delete(articles::bulk_delete));

    let product_routes = Router::new()
        .route("/", get(products::list_products))
        .route("/:product_id", get(products::get_product))
        .route("/:product_id/price-history", get(products::price_history));

    let favorite_routes = Router::new()
        .route("/", get(favorites::list_favorites).post(favorites::add_favorite))
        .route("/:product_id", delete(favorites::remove_favorite));

    let notification_routes = Router::new()
        .route(
            "/settings",
            get(notifications::get_settings).put(notifications::update_settings),
        )
        .route("/line/connect", post(notifications::connect_line))
        .route("/line/disconnect", post(notifications::disconnect_line));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .route("/admin/auth/login", post(admin_auth::login))
        .nest("/admin/accounts", account_routes)
        .nest("/admin/articles", article_routes)
        .nest("/products", product_routes)
        .route("/categories", get(categories::list_categories))
        .nest("/favorites", favorite_routes)
        .nest("/notifications", notification_routes)
        .route("/contact", post(contact::submit))
        .nest_service("/images", ServeDir::new(image_dir))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
