use std::net::SocketAddr;

use axum_server::tls_rustls::RustlsConfig;
use bargain_api::config::AppConfig;
use bargain_api::{create_app, db, docs};

const DEFAULT_DATABASE_URL: &str = "sqlite://bargain.db";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let config = AppConfig::from_env()?;
    let database_url = config
        .database_url
        .clone()
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let pool = db::init(&database_url).await?;

    let port = config.port;
    let tls = match (&config.tls_cert, &config.tls_key) {
        (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
        _ => None,
    };
    let production = config.is_production();

    let mut app = create_app(pool, config).await?;
    if !production {
        let openapi = docs::build_openapi(port, tls.is_some())?;
        app = app.merge(docs::swagger_routes(openapi)?);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    match tls {
        Some((cert, key)) => {
            let rustls = RustlsConfig::from_pem_file(&cert, &key).await?;
            tracing::info!(%addr, cert = %cert.display(), "listening with TLS");
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "listening");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
