//! Common library for the event board services
//!
//! This crate provides shared functionality used across the auth and api
//! services, including database connectivity and migrations, error
//! handling, the Redis-backed token denylist, caller identity and service
//! settings.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     println!("Database health check: {}", health_check(&pool).await?);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod database;
pub mod error;
pub mod settings;
