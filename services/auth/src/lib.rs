//! Event board authentication service
//!
//! Registers accounts, issues session tokens and manages user profiles.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod profile;
pub mod repositories;
pub mod routes;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
