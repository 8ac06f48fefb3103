mod common;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use bargain_api::authz::Role;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use common::{error_code, TestApp};

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

async fn seeded() -> Result<(TestApp, String)> {
    let t = common::setup().await?;
    t.seed_admin("admin_1", "root", Role::SystemAdmin, None, None).await?;
    t.seed_admin("admin_2", "acme-admin", Role::CompanyAdmin, Some("100"), None).await?;
    let token = t.login("root").await?;
    Ok((t, token))
}

async fn create(t: &TestApp, token: &str, body: Value) -> Result<Value> {
    let (status, v) = t.send("POST", "/admin/articles/add", Some(token), Some(body)).await?;
    if status != StatusCode::CREATED {
        panic!("article create failed: {} - {}", status, v);
    }
    Ok(v)
}

fn article(title: &str, status: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "content": "Compared across three shops this week.",
        "category": "saving",
        "status": status,
        "tags": tags
    })
}

fn ids(v: &Value) -> Vec<i64> {
    v["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|a| a["articleId"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn only_system_admins_manage_articles() -> Result<()> {
    let (t, _) = seeded().await?;
    let acme = t.login("acme-admin").await?;

    let (status, v) = t
        .send("POST", "/admin/articles/add", Some(&acme), Some(article("Nope", "draft", &[])))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(v["message"], "required role: system_admin");

    let (status, _) = t.send("GET", "/admin/articles/list", Some(&acme), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.send("GET", "/admin/articles/list", None, None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles").fetch_one(&t.pool).await?;
    assert_eq!(count, 0);

    Ok(())
}

#[tokio::test]
async fn role_gate_runs_before_input_validation() -> Result<()> {
    let (t, root) = seeded().await?;
    t.seed_admin("admin_3", "acme-store", Role::StoreUser, Some("100"), Some("s-1")).await?;
    let existing = create(&t, &root, article("Kept", "draft", &["rice"])).await?;
    let id = existing["articleId"].as_i64().unwrap_or_default();

    let update_uri = format!("/admin/articles/update/{id}");
    let cases: Vec<(&str, String, Option<&str>)> = vec![
        ("GET", "/admin/articles/list?page=0".into(), None),
        ("GET", "/admin/articles/list?limit=ten".into(), None),
        ("GET", "/admin/articles/list?status=bogus".into(), None),
        ("GET", "/admin/articles/list?dateFrom=yesterday".into(), None),
        ("GET", "/admin/articles/list/abc".into(), None),
        ("GET", format!("/admin/articles/list/{id}"), None),
        ("POST", "/admin/articles/add".into(), Some("{not json")),
        ("POST", "/admin/articles/add".into(), Some(r#"{"title":""}"#)),
        ("PUT", "/admin/articles/update/abc".into(), Some("{}")),
        ("PUT", update_uri.clone(), Some("{not json")),
        ("PUT", update_uri, Some(r#"{"title":"Hijacked"}"#)),
        ("DELETE", "/admin/articles/delete/abc".into(), None),
        ("DELETE", format!("/admin/articles/delete/{id}"), None),
        ("PUT", "/admin/articles/bulk-status".into(), Some(r#"{"articleIds":[1],"status":"bogus"}"#)),
        ("PUT", "/admin/articles/bulk-status".into(), Some(r#"{"articleIds":[]}"#)),
        ("PUT", "/admin/articles/bulk-status".into(), Some("{not json")),
        ("DELETE", "/admin/articles/bulk-delete".into(), Some(r#"{"articleIds":[]}"#)),
        ("DELETE", "/admin/articles/bulk-delete".into(), Some("{not json")),
    ];

    for username in ["acme-admin", "acme-store"] {
        let token = t.login(username).await?;
        for (method, uri, body) in &cases {
            let (status, v) = match body {
                Some(raw) => t.send_raw(method, uri, Some(&token), raw).await?,
                None => t.send(method, uri, Some(&token), None).await?,
            };
            assert_eq!(status, StatusCode::FORBIDDEN, "{username} {method} {uri}: {v}");
            assert_eq!(error_code(&v), "FORBIDDEN", "{username} {method} {uri}");
        }
    }

    let (status, v) = t.send("GET", &format!("/admin/articles/list/{id}"), Some(&root), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["title"], "Kept");

    Ok(())
}

#[tokio::test]
async fn article_lifecycle_with_image() -> Result<()> {
    let (t, root) = seeded().await?;

    let mut body = article("Weekly deals", "published", &["eggs"]);
    body["image"] = json!(PIXEL);
    let created = create(&t, &root, body).await?;
    assert_eq!(created["articleId"], 1);
    assert_eq!(created["createdBy"], "admin_1");
    assert!(created["publishedAt"].is_string());

    let image_url = created["imageUrl"].as_str().unwrap_or_default().to_string();
    let image_path = image_url
        .strip_prefix(&t.config.image_base_url)
        .unwrap_or_default()
        .to_string();
    assert!(image_path.starts_with("/articles/"), "unexpected url {image_url}");

    // uploaded files are served under /images
    let req = Request::builder()
        .uri(format!("/images{image_path}"))
        .body(Body::empty())?;
    let resp = t.app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    assert_eq!(&bytes[..4], b"\x89PNG");

    let (status, v) = t
        .send(
            "PUT",
            "/admin/articles/update/1",
            Some(&root),
            Some(json!({ "title": "Weekly deals (updated)", "tags": ["eggs", "milk"] })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", v);
    assert_eq!(v["title"], "Weekly deals (updated)");
    assert_eq!(v["tags"], json!(["eggs", "milk"]));
    assert_eq!(v["imageUrl"], image_url.as_str());

    let (status, v) = t.send("GET", "/admin/articles/list/1", Some(&root), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["title"], "Weekly deals (updated)");

    let (status, _) = t.send("DELETE", "/admin/articles/delete/1", Some(&root), None).await?;
    assert_eq!(status, StatusCode::OK);
    let stored = t.config.image_dir.join(image_path.trim_start_matches('/'));
    assert!(!stored.exists(), "image should be removed with the article");

    let (status, _) = t.send("GET", "/admin/articles/list/1", Some(&root), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn bad_ids_and_payloads_are_rejected() -> Result<()> {
    let (t, root) = seeded().await?;

    let (status, v) = t.send("GET", "/admin/articles/list/abc", Some(&root), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], "invalid article id");

    let mut body = article("Broken image", "draft", &[]);
    body["image"] = json!("***");
    let (status, v) = t.send("POST", "/admin/articles/add", Some(&root), Some(body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], "invalid image data");

    let (status, v) = t
        .send("POST", "/admin/articles/add", Some(&root), Some(article("Bad status", "archived", &[])))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&v), "VALIDATION_ERROR");
    assert_eq!(v["details"][0]["field"], "status");

    Ok(())
}

#[tokio::test]
async fn list_filters_by_status_tags_and_search() -> Result<()> {
    let (t, root) = seeded().await?;

    create(&t, &root, article("Rice prices fall", "published", &["rice"])).await?;
    create(&t, &root, article("Fish market guide", "published", &["fish"])).await?;
    create(&t, &root, article("Rice storage tips", "draft", &["rice"])).await?;

    let (status, v) = t
        .send("GET", "/admin/articles/list?status=published&tags=rice,bread", Some(&root), None)
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", v);
    assert_eq!(ids(&v), vec![1]);

    let (_, v) = t.send("GET", "/admin/articles/list?search=RICE", Some(&root), None).await?;
    let mut found = ids(&v);
    found.sort();
    assert_eq!(found, vec![1, 3]);

    let (_, v) = t.send("GET", "/admin/articles/list?limit=2&page=2", Some(&root), None).await?;
    assert_eq!(v["pagination"]["totalItems"], 3);
    assert_eq!(v["pagination"]["totalPages"], 2);
    assert_eq!(ids(&v).len(), 1);

    let (status, v) = t
        .send("GET", "/admin/articles/list?dateFrom=yesterday", Some(&root), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["details"][0]["field"], "dateFrom");

    Ok(())
}

#[tokio::test]
async fn bulk_operations_report_counts() -> Result<()> {
    let (t, root) = seeded().await?;
    for title in ["One", "Two", "Three"] {
        create(&t, &root, article(title, "draft", &[])).await?;
    }

    let (status, v) = t
        .send(
            "PUT",
            "/admin/articles/bulk-status",
            Some(&root),
            Some(json!({ "articleIds": [1, 2, 99], "status": "published" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", v);
    assert_eq!(v["message"], "2 articles updated");
    assert_eq!(v["successCount"], 2);
    assert_eq!(v["failedCount"], 1);

    let (_, v) = t.send("GET", "/admin/articles/list?status=published", Some(&root), None).await?;
    assert_eq!(v["pagination"]["totalItems"], 2);

    let (status, _) = t
        .send("PUT", "/admin/articles/bulk-status", Some(&root), Some(json!({ "articleIds": [1] })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send("DELETE", "/admin/articles/bulk-delete", Some(&root), Some(json!({ "articleIds": [] })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, v) = t
        .send(
            "DELETE",
            "/admin/articles/bulk-delete",
            Some(&root),
            Some(json!({ "articleIds": [1, 3, 42] })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["message"], "2 articles deleted");
    assert_eq!(v["failedCount"], 1);

    let remaining: Vec<i64> = sqlx::query_scalar("SELECT article_id FROM articles ORDER BY article_id")
        .fetch_all(&t.pool)
        .await?;
    assert_eq!(remaining, vec![2]);

    // ids keep growing from the highest one left
    let created = create(&t, &root, article("Four", "draft", &[])).await?;
    assert_eq!(created["articleId"], 3);

    Ok(())
}
