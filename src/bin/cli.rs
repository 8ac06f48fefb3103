use sqlx::Row;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bargain_api::authz::{AdminIdentity, Role};
use bargain_api::config::AppConfig;
use bargain_api::db::accounts::SqliteAccountStore;
use bargain_api::jwt::TokenCodec;
use bargain_api::models::account::DbAccount;
use bargain_api::store::AccountStore;
use bargain_api::utils::hash_password;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "bargain-api maintenance tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Insert an admin account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        company_id: Option<String>,
        #[arg(long)]
        store_id: Option<String>,
    },
    /// Print a signed end-user token
    IssueUserToken {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        hours: Option<i64>,
    },
    /// Print a signed admin token
    IssueAdminToken {
        #[arg(long)]
        admin_id: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        company_id: Option<String>,
        #[arg(long)]
        store_id: Option<String>,
        #[arg(long)]
        hours: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // the binary may run from another directory; fall back to the crate-local `.env`
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::CreateAdmin {
            username,
            password,
            name,
            email,
            role,
            company_id,
            store_id,
        } => {
            let role: Role = role.parse()?;
            // rejects tenant combinations the role does not allow
            AdminIdentity::new("pending", role, company_id.clone(), store_id.clone())?;

            let pool = get_pool().await?;
            get_migrator().await?.run(&pool).await?;

            let now = Utc::now();
            let account = DbAccount {
                account_id: Uuid::new_v4().to_string(),
                username,
                name,
                email,
                password_hash: hash_password(&password)?,
                role: role.as_str().to_string(),
                company_id,
                company_name: None,
                store_id,
                store_name: None,
                created_at: now,
                updated_at: now,
                last_login_at: None,
            };
            SqliteAccountStore::new(pool).insert(&account).await?;
            println!("Created {} account {} ({})", account.role, account.username, account.account_id);
        }
        Commands::IssueUserToken { user_id, hours } => {
            let codec = get_codec()?;
            let hours = hours.unwrap_or(codec.exp_hours);
            println!("{}", codec.issue_user_token_for(&user_id, hours)?);
        }
        Commands::IssueAdminToken {
            admin_id,
            role,
            company_id,
            store_id,
            hours,
        } => {
            let identity = AdminIdentity::new(admin_id, role.parse()?, company_id, store_id)?;
            let codec = get_codec()?;
            let hours = hours.unwrap_or(codec.exp_hours);
            println!("{}", codec.issue_admin_token_for(&identity, hours)?);
        }
    }

    Ok(())
}

fn get_codec() -> anyhow::Result<TokenCodec> {
    let config = AppConfig::from_env()?;
    Ok(TokenCodec::from_config(&config))
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let sanitized = sanitize_name(name);
    let filename = format!("{}_{}.sql", timestamp, sanitized);
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let options = database_url
        .parse::<sqlx::sqlite::SqliteConnectOptions>()
        .context("invalid DATABASE_URL")?
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // nothing is applied until the bookkeeping table exists
    let tracked: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
            .fetch_optional(pool)
            .await?;
    let applied_versions: HashSet<i64> = if tracked.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let status = if applied_versions.contains(&version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // ./migrations when run from the repo root, the crate-local folder otherwise
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
