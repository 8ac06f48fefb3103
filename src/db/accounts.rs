use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::is_unique_violation;
use crate::models::account::{AccountChanges, AccountFilter, DbAccount};
use crate::store::{AccountStore, StoreError, StoreResult};

const ACCOUNT_COLUMNS: &str = "account_id, username, name, email, password_hash, role, company_id, company_name, store_id, store_name, created_at, updated_at, last_login_at";

#[derive(Clone)]
pub struct SqliteAccountStore {
	pool: SqlitePool,
}

impl SqliteAccountStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
	async fn get(&self, account_id: &str) -> StoreResult<Option<DbAccount>> {
		let account = sqlx::query_as::<_, DbAccount>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?"))
			.bind(account_id)
			.fetch_optional(&self.pool)
			.await?;
		Ok(account)
	}

	async fn find_by_username(&self, username: &str) -> StoreResult<Option<DbAccount>> {
		let account = sqlx::query_as::<_, DbAccount>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?"))
			.bind(username)
			.fetch_optional(&self.pool)
			.await?;
		Ok(account)
	}

	async fn list(&self, filter: &AccountFilter) -> StoreResult<Vec<DbAccount>> {
		let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE 1 = 1"));

		if let Some(company_id) = &filter.company_id {
			query.push(" AND company_id = ").push_bind(company_id.clone());
		}
		if let Some(owner_id) = &filter.owner_id {
			query.push(" AND account_id = ").push_bind(owner_id.clone());
		}
		if let Some(role) = filter.role {
			query.push(" AND role = ").push_bind(role.as_str());
		}
		query.push(" ORDER BY created_at DESC");

		let rows = query.build_query_as::<DbAccount>().fetch_all(&self.pool).await?;

		// free-text search stays in Rust to share the case folding with the fakes
		Ok(rows.into_iter().filter(|account| filter.matches(account)).collect())
	}

	async fn insert(&self, account: &DbAccount) -> StoreResult<()> {
		sqlx::query(&format!(
			"INSERT INTO accounts ({ACCOUNT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
		))
		.bind(&account.account_id)
		.bind(&account.username)
		.bind(&account.name)
		.bind(&account.email)
		.bind(&account.password_hash)
		.bind(&account.role)
		.bind(&account.company_id)
		.bind(&account.company_name)
		.bind(&account.store_id)
		.bind(&account.store_name)
		.bind(account.created_at)
		.bind(account.updated_at)
		.bind(account.last_login_at)
		.execute(&self.pool)
		.await
		.map_err(|err| {
			if is_unique_violation(&err) {
				StoreError::Conflict(format!("username {} is already taken", account.username))
			} else {
				StoreError::Database(err)
			}
		})?;

		Ok(())
	}

	async fn update(&self, account_id: &str, changes: &AccountChanges) -> StoreResult<Option<DbAccount>> {
		let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE accounts SET ");
		let mut set = query.separated(", ");
		let mut touched = false;

		macro_rules! assign {
			($column:literal, $value:expr) => {
				if let Some(value) = $value {
					set.push(concat!($column, " = ")).push_bind_unseparated(value);
					touched = true;
				}
			};
		}

		assign!("name", changes.name.clone());
		assign!("email", changes.email.clone());
		assign!("password_hash", changes.password_hash.clone());
		assign!("role", changes.role.map(|role| role.as_str().to_string()));
		assign!("company_id", changes.company_id.clone());
		assign!("company_name", changes.company_name.clone());
		assign!("store_id", changes.store_id.clone());
		assign!("store_name", changes.store_name.clone());
		assign!("updated_at", changes.updated_at);

		if changes.clear_tenant {
			for column in ["company_id", "company_name", "store_id", "store_name"] {
				set.push(column).push_unseparated(" = NULL");
			}
			touched = true;
		}

		if touched {
			query.push(" WHERE account_id = ").push_bind(account_id.to_string());
			let result = query.build().execute(&self.pool).await?;
			if result.rows_affected() == 0 {
				return Ok(None);
			}
		}

		self.get(account_id).await
	}

	async fn delete(&self, account_id: &str) -> StoreResult<bool> {
		let result = sqlx::query("DELETE FROM accounts WHERE account_id = ?")
			.bind(account_id)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	async fn record_login(&self, account_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
		sqlx::query("UPDATE accounts SET last_login_at = ? WHERE account_id = ?")
			.bind(at)
			.bind(account_id)
			.execute(&self.pool)
			.await?;
		Ok(())
	}
}
