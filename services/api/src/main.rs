use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{
    AppState,
    moderation::Moderation,
    repositories::{PgPublicationStore, PgRequestStore, PgUserDirectory},
    routes::create_router,
};
use common::{
    auth::TokenVerifier,
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    settings::ServerSettings,
};
use media::{MediaConfig, S3MediaUploader, StagingArea};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let settings = ServerSettings::load("API", "0.0.0.0:3001")?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let verifier = TokenVerifier::from_env(env!("CARGO_MANIFEST_DIR"))
        .context("Failed to load JWT public key")?;

    let redis = RedisPool::new(&RedisConfig::from_env()?).await?;
    if redis.health_check().await? {
        info!("Redis connection successful");
    } else {
        anyhow::bail!("Failed to connect to Redis");
    }

    let media_config = MediaConfig::from_env()?;
    info!("Media bucket: {}", media_config.bucket_name);
    let uploader = S3MediaUploader::from_config(media_config).await;
    let staging = StagingArea::new(settings.upload_dir.clone());

    let requests = Arc::new(PgRequestStore::new(pool.clone()));
    let app_state = AppState {
        users: Arc::new(PgUserDirectory::new(pool.clone())),
        publications: Arc::new(PgPublicationStore::new(pool)),
        moderation: Moderation::new(requests, Arc::new(uploader), staging.clone()),
        staging,
        verifier,
        denylist: Arc::new(redis),
        max_upload_bytes: settings.max_upload_bytes,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("API service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
