use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skillswap_database::{create_pool, run_migrations, MarketplaceStore, MemoryStore, PgStore};
use skillswap_marketplace::{
    config::{AppConfig, StorageBackend},
    create_app, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skillswap_marketplace=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let store: Arc<dyn MarketplaceStore> = match config.storage {
        StorageBackend::Postgres => {
            let db_pool = create_pool(&config.database).await?;
            run_migrations(&db_pool).await?;
            Arc::new(PgStore::new(db_pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let address = format!("{}:{}", config.server.host, config.server.port);
    let app = create_app(AppState::new(store, config));

    // Start the server
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("SkillSwap marketplace listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
