use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::{AppError, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            _ => Err(AppError::validation(vec![FieldError::new(
                "status",
                "allowed values: draft, published",
            )])),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub article_id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: ArticleStatus,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbArticle {
    pub article_id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: String,
    pub tags: Json<Vec<String>>,
    pub images: Json<Vec<String>>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbArticle> for Article {
    type Error = AppError;

    fn try_from(value: DbArticle) -> Result<Self, Self::Error> {
        let status = value
            .status
            .parse::<ArticleStatus>()
            .map_err(|_| AppError::internal(format!("article {} has unknown status {}", value.article_id, value.status)))?;

        Ok(Article {
            article_id: value.article_id,
            title: value.title,
            content: value.content,
            category: value.category,
            status,
            tags: value.tags.0,
            images: value.images.0,
            image_url: value.image_url,
            published_at: value.published_at,
            created_by: value.created_by,
            updated_by: value.updated_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    pub search: Option<String>,
    pub status: Option<ArticleStatus>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl ArticleFilter {
    /// Predicates the index lookup by status/category cannot express.
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(search) = self.search.as_deref().map(str::to_lowercase) {
            if !article.title.to_lowercase().contains(&search) && !article.content.to_lowercase().contains(&search) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if article.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &article.category != category {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| article.tags.contains(tag)) {
            return false;
        }
        if let Some(from) = self.date_from {
            if article.published_at.map_or(true, |published| published < from) {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if article.published_at.map_or(true, |published| published > to) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCreateRequest {
    #[schema(example = "Five ways to save on groceries")]
    pub title: String,
    pub content: String,
    #[schema(example = "saving")]
    pub category: String,
    pub status: ArticleStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Base64 image (data URL prefix allowed), stored as `imageUrl`.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<ArticleStatus>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub published_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<ArticleStatus>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ArticleChanges {
    pub fn status(status: ArticleStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    #[serde(default)]
    pub article_ids: Vec<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub article_ids: Vec<i64>,
}
