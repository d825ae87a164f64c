use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use bank_backend::{
    database::{self, open_account, PostgresStorage, Storage},
    make_app,
    models::Account,
    routes::cors_layer,
    AppState, Config,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Bank backend REST server
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Create the demo account before serving
    #[arg(long)]
    seed: bool,
}

async fn seed_accounts(store: &dyn Storage) -> anyhow::Result<()> {
    let draft = Account::new("Code", "Sensei", "password")
        .map_err(|e| anyhow::anyhow!("failed to hash seed password: {e}"))?;
    let account = open_account(store, draft).await?;
    info!(number = account.number, "Seeded demo account");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::init().context("invalid configuration")?;

    info!("Connecting to PostgreSQL...");
    let pool = database::connect_sqlx(&config.db_url, config.db_timeout)
        .await
        .context("could not connect to the database")?;
    info!("Connected to PostgreSQL!");

    let store = PostgresStorage::new(pool);
    store.init().await.context("failed to run migrations")?;

    if cli.seed {
        info!("Seeding database");
        seed_accounts(&store).await?;
    }

    let cors = cors_layer(
        config
            .cors_origin
            .parse::<HeaderValue>()
            .context("CORS_ORIGIN is not a valid origin")?,
    );

    let state = Arc::new(AppState::new(Arc::new(store), &config.jwt_secret));
    let app = make_app(state).layer(cors);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("JSON API server started. Listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
