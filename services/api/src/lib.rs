//! Event board API service
//!
//! Accepts event submissions from users, lets administrators promote or
//! discard them, and serves the resulting publications.

pub mod error;
pub mod middleware;
pub mod models;
pub mod moderation;
pub mod multipart;
pub mod repositories;
pub mod routes;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use routes::create_router;
pub use state::AppState;
