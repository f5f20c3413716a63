mod config;
mod db;
mod handlers;
mod lifecycle;
mod models;
mod run;
mod slack;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use config::Config;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub struct AppState {
    pub config: Config,
    pub slack_client: slack::SlackClient,
    pub db_pool: Option<SqlitePool>,
    pub run_lock: Mutex<()>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chanreaper=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    let slack_client = slack::SlackClient::new(
        config.api_url.clone(),
        config.user_token.clone(),
        config.bot_token.clone(),
    );

    let db_pool = match config.database_url {
        Some(ref database_url) => {
            tracing::info!("Connecting to database: {}", database_url);
            let pool = db::create_pool(database_url).await
                .context("Failed to create database pool")?;

            tracing::info!("Running database migrations");
            db::run_migrations(&pool).await
                .context("Failed to run migrations")?;
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, report and warning tables are skipped");
            None
        }
    };

    let mode = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    match mode.as_str() {
        "run" => {
            let summary = run::run_once(&config, &slack_client, db_pool.as_ref()).await?;
            tracing::info!(
                "Run finished: {} channel(s), {} warned, {} archived, {} failed to archive",
                summary.channels,
                summary.warned,
                summary.archived.len(),
                summary.archive_failed.len()
            );
            Ok(())
        }
        "serve" => serve(config, slack_client, db_pool).await,
        other => anyhow::bail!("Unknown mode: `{}`. Use `run` or `serve`.", other),
    }
}

async fn serve(config: Config, slack_client: slack::SlackClient, db_pool: Option<SqlitePool>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);

    // Create shared application state
    let state = Arc::new(AppState {
        config,
        slack_client,
        db_pool,
        run_lock: Mutex::new(()),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/runs", post(handlers::trigger_run))
        .route("/warnings", get(handlers::list_warnings))
        .route("/report", get(handlers::list_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
