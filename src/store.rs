//! Storage seams for the admin resources. Services depend on these traits
//! only; the SQLite adapters live in `db`, tests use in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::account::{AccountChanges, AccountFilter, DbAccount};
use crate::models::article::{Article, ArticleChanges, ArticleStatus};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Unique key already taken (username, article id).
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, account_id: &str) -> StoreResult<Option<DbAccount>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<DbAccount>>;

    /// Returns accounts matching `filter`, newest first. Adapters may honor
    /// the filter only partially; callers re-check access per item.
    async fn list(&self, filter: &AccountFilter) -> StoreResult<Vec<DbAccount>>;

    async fn insert(&self, account: &DbAccount) -> StoreResult<()>;

    async fn update(&self, account_id: &str, changes: &AccountChanges) -> StoreResult<Option<DbAccount>>;

    async fn delete(&self, account_id: &str) -> StoreResult<bool>;

    async fn record_login(&self, account_id: &str, at: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn get(&self, article_id: i64) -> StoreResult<Option<Article>>;

    /// Index lookup by status or category (status wins when both are set),
    /// full scan otherwise. Ordered by `published_at` descending.
    async fn query(&self, status: Option<ArticleStatus>, category: Option<&str>) -> StoreResult<Vec<Article>>;

    /// Highest id in use, 0 for an empty table.
    async fn max_id(&self) -> StoreResult<i64>;

    /// Fails with `Conflict` when the id is already taken.
    async fn insert(&self, article: &Article) -> StoreResult<()>;

    async fn update(
        &self,
        article_id: i64,
        changes: &ArticleChanges,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Article>>;

    async fn delete(&self, article_id: i64) -> StoreResult<bool>;
}
