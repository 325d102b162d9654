//! Axum HTTP API server.
//!
//! This crate provides:
//! - The video-info, download, and health endpoints
//! - Per-IP rate limiting and security headers
//! - Prometheus metrics
//! - Static serving of the bundled frontend with an SPA fallback

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
