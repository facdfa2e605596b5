use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{
    AppState,
    jwt::{JwtConfig, JwtService},
    repositories::PgUserRepository,
    routes::create_router,
};
use common::{
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

    info!("Starting authentication service");

    let settings = ServerSettings::load("AUTH", "0.0.0.0:3000")?;

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

    // Initialize JWT service
    let jwt_config =
        JwtConfig::from_env(env!("CARGO_MANIFEST_DIR")).context("Failed to load JWT keys")?;
    let jwt_service = JwtService::new(&jwt_config)?;

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;
    if redis_pool.health_check().await? {
        info!("Redis connection successful");
    } else {
        anyhow::bail!("Failed to connect to Redis");
    }

    let media_config = MediaConfig::from_env()?;
    let placeholder_avatar = media_config.placeholder_avatar();
    let uploader = S3MediaUploader::from_config(media_config).await;

    let app_state = AppState {
        user_repository: Arc::new(PgUserRepository::new(pool)),
        jwt_service,
        denylist: Arc::new(redis_pool),
        uploader: Arc::new(uploader),
        staging: StagingArea::new(settings.upload_dir.clone()),
        placeholder_avatar,
        secure_cookies: settings.secure_cookies,
        max_upload_bytes: settings.max_upload_bytes,
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Authentication service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
