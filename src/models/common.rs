use serde::Serialize;
use utoipa::ToSchema;

use crate::models::account::Account;
use crate::models::article::Article;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Slices an already filtered and ordered result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let start = (self.page as usize - 1).saturating_mul(self.limit as usize);
        let items = items.into_iter().skip(start).take(self.limit as usize).collect();

        Page {
            items,
            pagination: Pagination::new(self.page, self.limit, total as u64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub limit: u32,
}

impl Pagination {
    pub fn new(current_page: u32, limit: u32, total_items: u64) -> Self {
        let limit_u64 = u64::from(limit.max(1));
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(limit_u64)
        };

        Self {
            current_page,
            total_pages,
            total_items,
            limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(AccountPage = Page<Account>, ArticlePage = Page<Article>)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of a best-effort batch: every id is attempted, nothing is rolled back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub success_count: u32,
    pub failed_count: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse {
    pub message: String,
    pub success_count: u32,
    pub failed_count: u32,
}
