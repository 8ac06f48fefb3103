//! In-memory stores for service tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::authz::Role;
use crate::images::{ImageError, ImageStore};
use crate::models::account::{AccountChanges, AccountFilter, DbAccount};
use crate::models::article::{Article, ArticleChanges, ArticleStatus};
use crate::store::{AccountStore, ArticleStore, StoreError, StoreResult};
use crate::utils::hash_password;

/// Hash of `password123`, computed once; argon2 is slow in debug builds.
fn shared_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("password123").unwrap()).clone()
}

#[derive(Default)]
pub struct MemoryAccountStore {
    rows: Mutex<Vec<DbAccount>>,
    ignore_filters: AtomicBool,
}

impl MemoryAccountStore {
    pub fn seed(&self, id: &str, username: &str, role: Role, company_id: Option<&str>, store_id: Option<&str>) {
        let now = Utc::now();
        self.rows.lock().unwrap().push(DbAccount {
            account_id: id.into(),
            username: username.into(),
            name: format!("{username} name"),
            email: format!("{username}@example.com"),
            password_hash: shared_hash(),
            role: role.as_str().into(),
            company_id: company_id.map(str::to_string),
            company_name: None,
            store_id: store_id.map(str::to_string),
            store_name: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        });
    }

    /// Makes `list` return every row, like an adapter without filter support.
    pub fn ignore_filters(&self) {
        self.ignore_filters.store(true, Ordering::SeqCst);
    }

    pub fn get_row(&self, id: &str) -> Option<DbAccount> {
        self.rows.lock().unwrap().iter().find(|a| a.account_id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, account_id: &str) -> StoreResult<Option<DbAccount>> {
        Ok(self.get_row(account_id))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<DbAccount>> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.username == username).cloned())
    }

    async fn list(&self, filter: &AccountFilter) -> StoreResult<Vec<DbAccount>> {
        let ignore = self.ignore_filters.load(Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| ignore || filter.matches(a))
            .cloned()
            .collect())
    }

    async fn insert(&self, account: &DbAccount) -> StoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(format!("username {} is already taken", account.username)));
        }
        rows.push(account.clone());
        Ok(())
    }

    async fn update(&self, account_id: &str, changes: &AccountChanges) -> StoreResult<Option<DbAccount>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|a| a.account_id == account_id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            row.name = name.clone();
        }
        if let Some(email) = &changes.email {
            row.email = email.clone();
        }
        if let Some(hash) = &changes.password_hash {
            row.password_hash = hash.clone();
        }
        if let Some(role) = changes.role {
            row.role = role.as_str().into();
        }
        if changes.company_id.is_some() {
            row.company_id = changes.company_id.clone();
        }
        if changes.company_name.is_some() {
            row.company_name = changes.company_name.clone();
        }
        if changes.store_id.is_some() {
            row.store_id = changes.store_id.clone();
        }
        if changes.store_name.is_some() {
            row.store_name = changes.store_name.clone();
        }
        if changes.clear_tenant {
            row.company_id = None;
            row.company_name = None;
            row.store_id = None;
            row.store_name = None;
        }
        if let Some(at) = changes.updated_at {
            row.updated_at = at;
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, account_id: &str) -> StoreResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| a.account_id != account_id);
        Ok(rows.len() < before)
    }

    async fn record_login(&self, account_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|a| a.account_id == account_id) {
            row.last_login_at = Some(at);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryArticleStore {
    rows: Mutex<BTreeMap<i64, Article>>,
    failing_deletes: Mutex<HashSet<i64>>,
    failing_updates: Mutex<HashSet<i64>>,
    /// Ids removed by a concurrent delete between the read and the write.
    vanishing_updates: Mutex<HashSet<i64>>,
    /// Ids that `insert` reports as taken once, simulating a concurrent writer.
    stolen_ids: Mutex<HashSet<i64>>,
}

impl MemoryArticleStore {
    pub fn put(&self, article: Article) {
        self.rows.lock().unwrap().insert(article.article_id, article);
    }

    pub fn fail_delete_of(&self, article_id: i64) {
        self.failing_deletes.lock().unwrap().insert(article_id);
    }

    pub fn fail_update_of(&self, article_id: i64) {
        self.failing_updates.lock().unwrap().insert(article_id);
    }

    pub fn vanish_on_update(&self, article_id: i64) {
        self.vanishing_updates.lock().unwrap().insert(article_id);
    }

    pub fn steal_id(&self, article_id: i64) {
        self.stolen_ids.lock().unwrap().insert(article_id);
    }

    pub fn ids(&self) -> Vec<i64> {
        self.rows.lock().unwrap().keys().copied().collect()
    }

    pub fn row(&self, article_id: i64) -> Option<Article> {
        self.rows.lock().unwrap().get(&article_id).cloned()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn get(&self, article_id: i64) -> StoreResult<Option<Article>> {
        Ok(self.row(article_id))
    }

    async fn query(&self, status: Option<ArticleStatus>, category: Option<&str>) -> StoreResult<Vec<Article>> {
        let mut rows: Vec<Article> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|a| match (status, category) {
                (Some(status), _) => a.status == status,
                (None, Some(category)) => a.category == category,
                (None, None) => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(rows)
    }

    async fn max_id(&self) -> StoreResult<i64> {
        Ok(self.rows.lock().unwrap().keys().next_back().copied().unwrap_or(0))
    }

    async fn insert(&self, article: &Article) -> StoreResult<()> {
        if self.stolen_ids.lock().unwrap().remove(&article.article_id) {
            let mut taken = article.clone();
            taken.title = "taken concurrently".into();
            self.put(taken);
            return Err(StoreError::Conflict(format!("article id {} is already taken", article.article_id)));
        }

        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&article.article_id) {
            return Err(StoreError::Conflict(format!("article id {} is already taken", article.article_id)));
        }
        rows.insert(article.article_id, article.clone());
        Ok(())
    }

    async fn update(
        &self,
        article_id: i64,
        changes: &ArticleChanges,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Article>> {
        if self.failing_updates.lock().unwrap().contains(&article_id) {
            return Err(StoreError::Corrupt(format!("article {article_id} could not be updated")));
        }

        let mut rows = self.rows.lock().unwrap();
        if self.vanishing_updates.lock().unwrap().remove(&article_id) {
            rows.remove(&article_id);
        }
        let Some(row) = rows.get_mut(&article_id) else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            row.title = title.clone();
        }
        if let Some(content) = &changes.content {
            row.content = content.clone();
        }
        if let Some(category) = &changes.category {
            row.category = category.clone();
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        if let Some(tags) = &changes.tags {
            row.tags = tags.clone();
        }
        if let Some(images) = &changes.images {
            row.images = images.clone();
        }
        if changes.image_url.is_some() {
            row.image_url = changes.image_url.clone();
        }
        if changes.published_at.is_some() {
            row.published_at = changes.published_at;
        }
        row.updated_by = updated_by.into();
        row.updated_at = updated_at;
        Ok(Some(row.clone()))
    }

    async fn delete(&self, article_id: i64) -> StoreResult<bool> {
        if self.failing_deletes.lock().unwrap().contains(&article_id) {
            return Err(StoreError::Corrupt(format!("article {article_id} could not be deleted")));
        }
        Ok(self.rows.lock().unwrap().remove(&article_id).is_some())
    }
}

/// Keeps uploaded bytes keyed by URL.
#[derive(Default)]
pub struct MemoryImageStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().unwrap().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, bytes: Vec<u8>, key: &str, _content_type: &str) -> Result<String, ImageError> {
        let url = format!("memory://{key}");
        self.objects.lock().unwrap().insert(url.clone(), bytes);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<bool, ImageError> {
        Ok(self.objects.lock().unwrap().remove(url).is_some())
    }
}
