use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::product::Product;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    #[schema(example = "item-1")]
    pub product_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteListResponse {
    pub favorites: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteAdded {
    pub message: String,
    pub product_id: String,
}
