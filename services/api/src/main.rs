use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clinic_api::{
    AppState,
    cache::RedisClinicListCache,
    repositories::PgStore,
    routes,
    session::SessionVerifier,
    settings::AppConfig,
};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig, init_pool},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting clinic API service");

    let config = AppConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    // Clinic listing cache
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;
    match redis_pool.health_check().await {
        Ok(true) => info!("Redis connection successful"),
        Ok(false) => warn!("Redis did not answer PING; clinic listings will not be cached"),
        Err(e) => warn!("Redis unreachable, clinic listings will not be cached: {}", e),
    }
    let cache = RedisClinicListCache::new(redis_pool, config.cache.clinic_list_ttl_seconds);

    let sessions = SessionVerifier::from_config(&config.session)?;

    let app_state = AppState::new(Arc::new(PgStore::new(pool)), Arc::new(cache), sessions);

    info!("Clinic API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Clinic API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
