use serde::Serialize;
use utoipa::ToSchema;

/// Fixed category catalogue: (id, name, display order).
pub const CATEGORIES: [(&str, &str, u32); 8] = [
    ("cat-1", "Beverages", 1),
    ("cat-2", "Snacks", 2),
    ("cat-3", "Fresh food", 3),
    ("cat-4", "Chilled and frozen", 4),
    ("cat-5", "Seasonings", 5),
    ("cat-6", "Bread and cereal", 6),
    ("cat-7", "Household goods", 7),
    ("cat-8", "Other", 8),
];

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub display_order: u32,
    pub product_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}
