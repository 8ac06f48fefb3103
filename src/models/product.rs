use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::{AppError, FieldError};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(example = "item-1")]
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub current_price: i64,
    pub previous_price: Option<i64>,
    pub shop: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: i64,
    pub shop: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    #[default]
    UpdatedDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 5] = [
        SortOrder::PriceAsc,
        SortOrder::PriceDesc,
        SortOrder::NameAsc,
        SortOrder::NameDesc,
        SortOrder::UpdatedDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::NameAsc => "name_asc",
            SortOrder::NameDesc => "name_desc",
            SortOrder::UpdatedDesc => "updated_desc",
        }
    }

    /// ORDER BY clause; product_id breaks ties so paging is stable.
    pub fn order_by(&self) -> &'static str {
        match self {
            SortOrder::PriceAsc => "current_price ASC, product_id ASC",
            SortOrder::PriceDesc => "current_price DESC, product_id ASC",
            SortOrder::NameAsc => "name ASC, product_id ASC",
            SortOrder::NameDesc => "name DESC, product_id ASC",
            SortOrder::UpdatedDesc => "updated_at DESC, product_id ASC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.as_str() == value)
            .ok_or_else(|| {
                let allowed: Vec<&str> = SortOrder::ALL.iter().map(SortOrder::as_str).collect();
                AppError::validation(vec![FieldError::new(
                    "sort",
                    format!("allowed values: {}", allowed.join(", ")),
                )])
            })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    pub lowest_price: String,
    pub trend: String,
    pub recommendation: String,
}

impl AiSummary {
    /// Fixed copy; only the lowest price is derived from data.
    pub fn placeholder(current_price: i64, history: &[PricePoint]) -> Self {
        let lowest = history
            .iter()
            .map(|point| point.price)
            .chain(std::iter::once(current_price))
            .min()
            .unwrap_or(current_price);

        Self {
            lowest_price: format!("Lowest price over the last 30 days: {lowest} yen"),
            trend: "Prices tend to drop next Tuesday (based on past weekday patterns)".into(),
            recommendation: "Buying this weekend is a good deal".into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub price_history: Vec<PricePoint>,
    pub ai_summary: AiSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceHistoryQuery {
    pub days: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryResponse {
    pub product_id: String,
    pub history: Vec<PricePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parses_wire_names() {
        assert_eq!("price_asc".parse::<SortOrder>().unwrap(), SortOrder::PriceAsc);
        assert_eq!("updated_desc".parse::<SortOrder>().unwrap(), SortOrder::UpdatedDesc);
        assert_eq!(SortOrder::default(), SortOrder::UpdatedDesc);
    }

    #[test]
    fn test_unknown_sort_lists_allowed_values() {
        match "cheapest".parse::<SortOrder>() {
            Err(AppError::Validation(details)) => {
                assert_eq!(details[0].field, "sort");
                assert!(details[0].message.contains("price_desc"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_summary_lowest_price_includes_current_price() {
        let history = vec![
            PricePoint {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                price: 210,
                shop: None,
            },
            PricePoint {
                date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                price: 190,
                shop: None,
            },
        ];

        assert!(AiSummary::placeholder(200, &history).lowest_price.contains("190 yen"));
        assert!(AiSummary::placeholder(150, &history).lowest_price.contains("150 yen"));
        assert!(AiSummary::placeholder(150, &[]).lowest_price.contains("150 yen"));
    }
}
