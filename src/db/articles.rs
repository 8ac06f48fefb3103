use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::is_unique_violation;
use crate::models::article::{Article, ArticleChanges, ArticleStatus, DbArticle};
use crate::store::{ArticleStore, StoreError, StoreResult};

const ARTICLE_COLUMNS: &str = "article_id, title, content, category, status, tags, images, image_url, published_at, created_by, updated_by, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteArticleStore {
	pool: SqlitePool,
}

impl SqliteArticleStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

fn decode(row: DbArticle) -> StoreResult<Article> {
	Article::try_from(row).map_err(|err| StoreError::Corrupt(err.to_string()))
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
	async fn get(&self, article_id: i64) -> StoreResult<Option<Article>> {
		let row = sqlx::query_as::<_, DbArticle>(&format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE article_id = ?"))
			.bind(article_id)
			.fetch_optional(&self.pool)
			.await?;
		row.map(decode).transpose()
	}

	async fn query(&self, status: Option<ArticleStatus>, category: Option<&str>) -> StoreResult<Vec<Article>> {
		let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {ARTICLE_COLUMNS} FROM articles"));

		// mirrors the two secondary indexes: status first, then category
		if let Some(status) = status {
			query.push(" WHERE status = ").push_bind(status.as_str());
		} else if let Some(category) = category {
			query.push(" WHERE category = ").push_bind(category.to_string());
		}
		query.push(" ORDER BY published_at DESC, article_id DESC");

		let rows = query.build_query_as::<DbArticle>().fetch_all(&self.pool).await?;
		rows.into_iter().map(decode).collect()
	}

	async fn max_id(&self) -> StoreResult<i64> {
		let max: Option<i64> = sqlx::query_scalar("SELECT MAX(article_id) FROM articles")
			.fetch_one(&self.pool)
			.await?;
		Ok(max.unwrap_or(0))
	}

	async fn insert(&self, article: &Article) -> StoreResult<()> {
		sqlx::query(&format!(
			"INSERT INTO articles ({ARTICLE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
		))
		.bind(article.article_id)
		.bind(&article.title)
		.bind(&article.content)
		.bind(&article.category)
		.bind(article.status.as_str())
		.bind(Json(&article.tags))
		.bind(Json(&article.images))
		.bind(&article.image_url)
		.bind(article.published_at)
		.bind(&article.created_by)
		.bind(&article.updated_by)
		.bind(article.created_at)
		.bind(article.updated_at)
		.execute(&self.pool)
		.await
		.map_err(|err| {
			if is_unique_violation(&err) {
				StoreError::Conflict(format!("article id {} is already taken", article.article_id))
			} else {
				StoreError::Database(err)
			}
		})?;

		Ok(())
	}

	async fn update(
		&self,
		article_id: i64,
		changes: &ArticleChanges,
		updated_by: &str,
		updated_at: DateTime<Utc>,
	) -> StoreResult<Option<Article>> {
		let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE articles SET ");
		let mut set = query.separated(", ");

		set.push("updated_by = ").push_bind_unseparated(updated_by.to_string());
		set.push("updated_at = ").push_bind_unseparated(updated_at);

		if let Some(title) = &changes.title {
			set.push("title = ").push_bind_unseparated(title.clone());
		}
		if let Some(content) = &changes.content {
			set.push("content = ").push_bind_unseparated(content.clone());
		}
		if let Some(category) = &changes.category {
			set.push("category = ").push_bind_unseparated(category.clone());
		}
		if let Some(status) = changes.status {
			set.push("status = ").push_bind_unseparated(status.as_str());
		}
		if let Some(tags) = &changes.tags {
			set.push("tags = ").push_bind_unseparated(Json(tags.clone()));
		}
		if let Some(images) = &changes.images {
			set.push("images = ").push_bind_unseparated(Json(images.clone()));
		}
		if let Some(image_url) = &changes.image_url {
			set.push("image_url = ").push_bind_unseparated(image_url.clone());
		}
		if let Some(published_at) = changes.published_at {
			set.push("published_at = ").push_bind_unseparated(published_at);
		}

		query.push(" WHERE article_id = ").push_bind(article_id);
		let result = query.build().execute(&self.pool).await?;
		if result.rows_affected() == 0 {
			return Ok(None);
		}

		self.get(article_id).await
	}

	async fn delete(&self, article_id: i64) -> StoreResult<bool> {
		let result = sqlx::query("DELETE FROM articles WHERE article_id = ?")
			.bind(article_id)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}
}
