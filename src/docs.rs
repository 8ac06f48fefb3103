use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::admin_auth::login,
		routes::accounts::list_accounts,
		routes::accounts::get_account,
		routes::accounts::create_account,
		routes::accounts::update_account,
		routes::accounts::delete_account,
		routes::articles::list_articles,
		routes::articles::get_article,
		routes::articles::create_article,
		routes::articles::update_article,
		routes::articles::delete_article,
		routes::articles::bulk_update_status,
		routes::articles::bulk_delete,
		routes::products::list_products,
		routes::products::get_product,
		routes::products::price_history,
		routes::categories::list_categories,
		routes::favorites::list_favorites,
		routes::favorites::add_favorite,
		routes::favorites::remove_favorite,
		routes::notifications::get_settings,
		routes::notifications::update_settings,
		routes::notifications::connect_line,
		routes::notifications::disconnect_line,
		routes::contact::submit
	),
	components(
		schemas(
			crate::errors::ErrorResponse,
			crate::errors::FieldError,
			crate::authz::Role,
			routes::health::HealthResponse,
			models::common::Pagination,
			models::common::AccountPage,
			models::common::ArticlePage,
			models::common::MessageResponse,
			models::common::BulkResponse,
			models::account::Account,
			models::account::AccountCreateRequest,
			models::account::AccountUpdateRequest,
			models::account::LoginRequest,
			models::account::LoginResponse,
			models::article::Article,
			models::article::ArticleStatus,
			models::article::ArticleCreateRequest,
			models::article::ArticleUpdateRequest,
			models::article::BulkStatusRequest,
			models::article::BulkDeleteRequest,
			models::product::Product,
			models::product::PricePoint,
			models::product::SortOrder,
			models::product::ProductListResponse,
			models::product::ProductDetail,
			models::product::AiSummary,
			models::product::PriceHistoryResponse,
			models::category::Category,
			models::category::CategoryListResponse,
			models::favorite::FavoriteRequest,
			models::favorite::FavoriteListResponse,
			models::favorite::FavoriteAdded,
			models::notification::Frequency,
			models::notification::NotificationSettings,
			models::notification::NotificationUpdateResponse,
			models::notification::LineConnectRequest,
			models::notification::LineConnectResponse,
			models::contact::ContactRequest,
			models::contact::ContactResponse
		)
	),
	tags(
		(name = "Health", description = "Liveness and database check"),
		(name = "Admin Auth", description = "Administrator login"),
		(name = "Admin Accounts", description = "Tenant-scoped account management"),
		(name = "Admin Articles", description = "Article management (system admins)"),
		(name = "Products", description = "Product catalogue and price history"),
		(name = "Categories", description = "Fixed product categories"),
		(name = "Favorites", description = "End-user favorites"),
		(name = "Notifications", description = "End-user notification settings"),
		(name = "Contact", description = "Contact form")
	)
)]
pub struct ApiDoc;

/// OpenAPI document with the bearer scheme and a server entry for `port`.
pub fn build_openapi(port: u16, tls: bool) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc)?;
	ensure_global_security(&mut doc)?;
	ensure_servers(&mut doc, port, tls);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn root_object(doc: &mut Value) -> anyhow::Result<&mut Map<String, Value>> {
	doc.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI root must be an object"))
}

fn ensure_security_components(doc: &mut Value) -> anyhow::Result<()> {
	let components = root_object(doc)?
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("components must be an object"))?;

	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("securitySchemes must be an object"))?;

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT"
		}),
	);
	Ok(())
}

// public operations opt out with `security(())`
fn ensure_global_security(doc: &mut Value) -> anyhow::Result<()> {
	root_object(doc)?
		.entry("security")
		.or_insert_with(|| json!([{ "bearerAuth": [] }]));
	Ok(())
}

fn ensure_servers(doc: &mut Value, port: u16, tls: bool) {
	let scheme = if tls { "https" } else { "http" };
	let server_url = format!("{scheme}://localhost:{port}");

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
