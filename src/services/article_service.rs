use std::sync::Arc;

use crate::authz::{require_role, AdminIdentity, Role};
use crate::errors::{AppError, AppResult, FieldError};
use crate::images::{discard, upload_base64, ImageStore};
use crate::models::article::{
    Article, ArticleChanges, ArticleCreateRequest, ArticleFilter, ArticleStatus, ArticleUpdateRequest,
};
use crate::models::common::{BulkOutcome, Page, PageRequest};
use crate::store::{ArticleStore, StoreError};
use crate::utils::utc_now;

const ARTICLE_ROLES: [Role; 1] = [Role::SystemAdmin];
const IMAGE_FOLDER: &str = "articles";
const MAX_ID_ATTEMPTS: usize = 5;

/// Article management. Only system administrators get past the role gate.
#[derive(Clone)]
pub struct ArticleService {
    store: Arc<dyn ArticleStore>,
    images: Arc<dyn ImageStore>,
}

impl ArticleService {
    pub fn new(store: Arc<dyn ArticleStore>, images: Arc<dyn ImageStore>) -> Self {
        Self { store, images }
    }

    pub async fn list(&self, identity: &AdminIdentity, filter: ArticleFilter, page: PageRequest) -> AppResult<Page<Article>> {
        require_role(identity, &ARTICLE_ROLES)?;

        let mut articles: Vec<Article> = self
            .store
            .query(filter.status, filter.category.as_deref())
            .await?
            .into_iter()
            .filter(|article| filter.matches(article))
            .collect();
        articles.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.article_id.cmp(&a.article_id))
        });

        Ok(page.paginate(articles))
    }

    pub async fn get(&self, identity: &AdminIdentity, article_id: i64) -> AppResult<Article> {
        require_role(identity, &ARTICLE_ROLES)?;
        self.fetch(article_id).await
    }

    pub async fn create(&self, identity: &AdminIdentity, request: ArticleCreateRequest) -> AppResult<Article> {
        require_role(identity, &ARTICLE_ROLES)?;

        let mut errors = Vec::new();
        for (field, value) in [
            ("title", &request.title),
            ("content", &request.content),
            ("category", &request.category),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, "required"));
            }
        }
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let image_url = match request.image.as_deref() {
            Some(data) => Some(upload_base64(self.images.as_ref(), data, IMAGE_FOLDER).await?),
            None => None,
        };

        let now = utc_now();
        let published_at = match (request.status, request.published_at) {
            (_, Some(at)) => Some(at),
            (ArticleStatus::Published, None) => Some(now),
            (ArticleStatus::Draft, None) => None,
        };

        let mut article = Article {
            article_id: 0,
            title: request.title,
            content: request.content,
            category: request.category,
            status: request.status,
            tags: request.tags,
            images: request.images,
            image_url,
            published_at,
            created_by: identity.admin_id().to_string(),
            updated_by: identity.admin_id().to_string(),
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.insert_with_next_id(&mut article).await {
            if let Some(url) = &article.image_url {
                discard(self.images.as_ref(), url).await;
            }
            return Err(err);
        }

        tracing::info!(
            article_id = article.article_id,
            status = %article.status,
            created_by = %identity.admin_id(),
            "article created"
        );
        Ok(article)
    }

    pub async fn update(
        &self,
        identity: &AdminIdentity,
        article_id: i64,
        request: ArticleUpdateRequest,
    ) -> AppResult<Article> {
        require_role(identity, &ARTICLE_ROLES)?;
        let existing = self.fetch(article_id).await?;

        let mut errors = Vec::new();
        for (field, value) in [
            ("title", &request.title),
            ("content", &request.content),
            ("category", &request.category),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                errors.push(FieldError::new(field, "must not be empty"));
            }
        }
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let image_url = match request.image.as_deref() {
            Some(data) => Some(upload_base64(self.images.as_ref(), data, IMAGE_FOLDER).await?),
            None => None,
        };

        // first publication stamps the date unless one was given
        let published_at = match (request.status, request.published_at) {
            (_, Some(at)) => Some(at),
            (Some(ArticleStatus::Published), None) if existing.published_at.is_none() => Some(utc_now()),
            _ => None,
        };

        let changes = ArticleChanges {
            title: request.title,
            content: request.content,
            category: request.category,
            status: request.status,
            tags: request.tags,
            images: request.images,
            image_url: image_url.clone(),
            published_at,
        };

        let updated = match self.store.update(article_id, &changes, identity.admin_id(), utc_now()).await {
            Ok(Some(updated)) => updated,
            outcome => {
                if let Some(url) = &image_url {
                    discard(self.images.as_ref(), url).await;
                }
                return Err(match outcome {
                    Err(err) => err.into(),
                    _ => AppError::not_found("article not found"),
                });
            }
        };

        if let (Some(_), Some(old)) = (&image_url, &existing.image_url) {
            discard(self.images.as_ref(), old).await;
        }

        tracing::info!(article_id, updated_by = %identity.admin_id(), "article updated");
        Ok(updated)
    }

    pub async fn delete(&self, identity: &AdminIdentity, article_id: i64) -> AppResult<()> {
        require_role(identity, &ARTICLE_ROLES)?;
        let existing = self.fetch(article_id).await?;
        self.remove(existing).await?;

        tracing::info!(article_id, deleted_by = %identity.admin_id(), "article deleted");
        Ok(())
    }

    /// Applies `status` to each id in turn. A missing id or a failed write
    /// counts as a failure; earlier successes stay applied.
    pub async fn bulk_update_status(
        &self,
        identity: &AdminIdentity,
        article_ids: &[i64],
        status: ArticleStatus,
    ) -> AppResult<BulkOutcome> {
        require_role(identity, &ARTICLE_ROLES)?;
        ensure_ids(article_ids)?;

        let mut outcome = BulkOutcome::default();
        for &article_id in article_ids {
            let changes = match self.store.get(article_id).await {
                Ok(Some(existing)) => {
                    let mut changes = ArticleChanges::status(status);
                    if status == ArticleStatus::Published && existing.published_at.is_none() {
                        changes.published_at = Some(utc_now());
                    }
                    changes
                }
                Ok(None) => {
                    outcome.failed_count += 1;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(article_id, error = %err, "bulk status lookup failed");
                    outcome.failed_count += 1;
                    continue;
                }
            };

            match self.store.update(article_id, &changes, identity.admin_id(), utc_now()).await {
                Ok(Some(_)) => outcome.success_count += 1,
                Ok(None) => outcome.failed_count += 1,
                Err(err) => {
                    tracing::warn!(article_id, error = %err, "bulk status update failed");
                    outcome.failed_count += 1;
                }
            }
        }

        tracing::info!(
            status = %status,
            succeeded = outcome.success_count,
            failed = outcome.failed_count,
            "bulk article status update"
        );
        Ok(outcome)
    }

    /// Deletes each id in turn; failures are counted, nothing is rolled back.
    pub async fn bulk_delete(&self, identity: &AdminIdentity, article_ids: &[i64]) -> AppResult<BulkOutcome> {
        require_role(identity, &ARTICLE_ROLES)?;
        ensure_ids(article_ids)?;

        let mut outcome = BulkOutcome::default();
        for &article_id in article_ids {
            let result = match self.store.get(article_id).await {
                Ok(Some(existing)) => self.remove(existing).await,
                Ok(None) => Err(AppError::not_found("article not found")),
                Err(err) => Err(err.into()),
            };

            match result {
                Ok(()) => outcome.success_count += 1,
                Err(err) => {
                    tracing::warn!(article_id, error = %err, "bulk delete failed");
                    outcome.failed_count += 1;
                }
            }
        }

        tracing::info!(
            succeeded = outcome.success_count,
            failed = outcome.failed_count,
            deleted_by = %identity.admin_id(),
            "bulk article delete"
        );
        Ok(outcome)
    }

    async fn fetch(&self, article_id: i64) -> AppResult<Article> {
        self.store
            .get(article_id)
            .await?
            .ok_or_else(|| AppError::not_found("article not found"))
    }

    async fn remove(&self, article: Article) -> AppResult<()> {
        if !self.store.delete(article.article_id).await? {
            return Err(AppError::not_found("article not found"));
        }
        if let Some(url) = &article.image_url {
            discard(self.images.as_ref(), url).await;
        }
        Ok(())
    }

    /// Takes `max + 1` and retries when a concurrent insert got there first.
    async fn insert_with_next_id(&self, article: &mut Article) -> AppResult<()> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            article.article_id = self.store.max_id().await? + 1;
            match self.store.insert(article).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict(_)) => {
                    tracing::debug!(article_id = article.article_id, attempt, "article id taken, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(AppError::conflict("could not allocate an article id"))
    }
}

fn ensure_ids(article_ids: &[i64]) -> AppResult<()> {
    if article_ids.is_empty() {
        return Err(AppError::bad_request("articleIds must not be empty"));
    }
    Ok(())
}
