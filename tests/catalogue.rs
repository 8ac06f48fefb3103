mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::error_code;

fn prices(v: &Value) -> Vec<i64> {
    v["products"]
        .as_array()
        .map(|items| items.iter().filter_map(|p| p["currentPrice"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn product_listing_pages_and_sorts() -> Result<()> {
    let t = common::setup().await?;

    let (status, v) = t.send("GET", "/products", None, None).await?;
    assert_eq!(status, StatusCode::OK, "{}", v);
    assert_eq!(v["total"], 10);
    assert_eq!(v["limit"], t.config.default_page_limit);
    assert_eq!(v["offset"], 0);
    // default order is most recently updated first
    assert_eq!(v["products"][0]["productId"], "item-1");

    let (_, v) = t.send("GET", "/products?sort=price_asc&limit=3", None, None).await?;
    let sorted = prices(&v);
    assert_eq!(sorted.len(), 3);
    assert!(sorted.windows(2).all(|w| w[0] <= w[1]), "not ascending: {sorted:?}");
    assert_eq!(v["total"], 10);

    let (_, v) = t.send("GET", "/products?sort=price_desc&offset=8", None, None).await?;
    let tail = prices(&v);
    assert_eq!(tail.len(), 2);
    assert!(tail[0] >= tail[1]);

    let (_, v) = t.send("GET", "/products?category=Snacks", None, None).await?;
    assert_eq!(v["total"], 2);

    let (_, v) = t.send("GET", "/products?keyword=milk", None, None).await?;
    // matches the name "Milk" and the description of the chocolate bar
    assert_eq!(v["total"], 2);

    Ok(())
}

#[tokio::test]
async fn product_listing_rejects_bad_parameters() -> Result<()> {
    let t = common::setup().await?;

    for uri in ["/products?limit=0", "/products?limit=101", "/products?offset=-1", "/products?limit=ten"] {
        let (status, v) = t.send("GET", uri, None, None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(error_code(&v), "VALIDATION_ERROR");
    }

    let (status, v) = t.send("GET", "/products?sort=cheapest", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["details"][0]["field"], "sort");

    Ok(())
}

#[tokio::test]
async fn product_detail_includes_history_and_summary() -> Result<()> {
    let t = common::setup().await?;

    let (status, v) = t.send("GET", "/products/item-2", None, None).await?;
    assert_eq!(status, StatusCode::OK, "{}", v);
    assert_eq!(v["productId"], "item-2");
    assert_eq!(v["name"], "Eggs");

    let history = v["priceHistory"].as_array().cloned().unwrap_or_default();
    assert!(!history.is_empty() && history.len() <= 31, "got {} points", history.len());
    assert!(v["aiSummary"]["lowestPrice"].is_string());
    assert!(v["aiSummary"]["recommendation"].is_string());

    let (status, _) = t.send("GET", "/products/item-404", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn price_history_window_is_validated() -> Result<()> {
    let t = common::setup().await?;

    let (status, v) = t.send("GET", "/products/item-1/price-history?days=7", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let week = v["history"].as_array().map(Vec::len).unwrap_or_default();
    assert!((7..=8).contains(&week), "got {week} points");

    let (_, v) = t.send("GET", "/products/item-1/price-history?days=180", None, None).await?;
    let half_year = v["history"].as_array().map(Vec::len).unwrap_or_default();
    assert!(half_year > week);

    let (status, v) = t.send("GET", "/products/item-1/price-history?days=14", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["details"][0]["field"], "days");

    let (status, _) = t.send("GET", "/products/item-404/price-history", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn categories_are_fixed_and_counted() -> Result<()> {
    let t = common::setup().await?;

    let (status, v) = t.send("GET", "/categories", None, None).await?;
    assert_eq!(status, StatusCode::OK);

    let categories = v["categories"].as_array().cloned().unwrap_or_default();
    assert_eq!(categories.len(), 8);
    assert_eq!(categories[0]["id"], "cat-1");
    assert_eq!(categories[0]["name"], "Beverages");
    assert_eq!(categories[0]["productCount"], 2);
    assert_eq!(categories[7]["name"], "Other");
    assert_eq!(categories[7]["productCount"], 0);

    Ok(())
}

#[tokio::test]
async fn contact_form_is_validated() -> Result<()> {
    let t = common::setup().await?;

    let (status, v) = t
        .send("POST", "/contact", None, Some(json!({ "name": "Hanako", "email": "nope" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&v), "VALIDATION_ERROR");
    let fields: Vec<&str> = v["details"]
        .as_array()
        .map(|d| d.iter().filter_map(|e| e["field"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(fields, vec!["category", "message", "email"]);

    let body = json!({
        "name": "Hanako",
        "email": "hanako@example.com",
        "category": "technical",
        "message": "The chart does not load."
    });
    let (status, v) = t.send("POST", "/contact", None, Some(body)).await?;
    assert_eq!(status, StatusCode::OK, "{}", v);
    assert!(v["contactId"].as_str().is_some_and(|id| !id.is_empty()));

    Ok(())
}
