//! # Clinic Server
//!
//! Main binary for the clinic directory. Serves the REST API and carries the
//! operator commands that go with it:
//! - `serve`: migrate, prepare storage, listen (default)
//! - `migrate`: run database migrations and exit
//! - `create-user`: provision a user for a company
//! - `issue-token`: mint a bearer token for a user

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clinic_api::{build_router, AppState};
use clinic_common::{config::AppConfig, ids};
use clinic_db::{repository::{companies, users}, storage, Database};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "clinic", version, about = "Company and doctor directory service")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CLINIC_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run migrations, prepare storage, and serve the API
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Create a user belonging to an existing company
    CreateUser {
        #[arg(long)]
        company_id: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Print a bearer token for an existing user of the given company
    IssueToken {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        company_id: Uuid,
        /// Token lifetime; defaults to `auth.access_token_ttl_secs`
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = clinic_common::config::load().context("Failed to load configuration")?;

    init_tracing(cli.json_logs);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            let db = Database::connect(&config.database).await?;
            db.migrate().await
        }
        Command::CreateUser {
            company_id,
            name,
            email,
        } => {
            let db = Database::connect(&config.database).await?;
            if companies::find_by_id(&db.pool, company_id).await?.is_none() {
                anyhow::bail!("Company {company_id} does not exist");
            }
            let user =
                users::create_user(&db.pool, ids::generate_id(), company_id, &name, &email)
                    .await?;
            tracing::info!(user_id = %user.id, company_id = %company_id, "User created");
            println!("{}", user.id);
            Ok(())
        }
        Command::IssueToken {
            user_id,
            company_id,
            ttl_secs,
        } => {
            let db = Database::connect(&config.database).await?;
            match users::find_by_id(&db.pool, user_id).await? {
                Some(user) if user.company_id == company_id => {}
                Some(user) => anyhow::bail!(
                    "User {user_id} belongs to company {}, not {company_id}",
                    user.company_id
                ),
                None => anyhow::bail!("User {user_id} does not exist"),
            }

            let ttl = ttl_secs.unwrap_or(config.auth.access_token_ttl_secs);
            let token = clinic_api::auth::generate_access_token(
                user_id,
                company_id,
                &config.auth.jwt_secret,
                ttl,
            )?;
            println!("{token}");
            Ok(())
        }
    }
}

/// Initialize tracing (structured logging).
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clinic=debug,tower_http=debug".into());

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting clinic directory v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::connect(&config.database).await?;
    db.migrate().await?;

    // === Object Storage (S3 or local files) ===
    let lite_base = format!(
        "http://{}:{}/files",
        advertised_host(&config.server.host),
        config.server.port
    );
    let storage = storage::from_config(&config.storage, &lite_base).await?;
    storage.ensure_bucket().await?;
    tracing::info!(bucket = %config.storage.bucket, "Object storage ready");

    let api_addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let router = build_router(AppState::new(db, storage, config));

    tracing::info!("REST API listening on http://{api_addr}");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// A wildcard bind address is not a usable link host.
fn advertised_host(host: &str) -> &str {
    match host {
        "0.0.0.0" | "::" => "localhost",
        other => other,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
