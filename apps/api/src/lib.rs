//! # kiosco-api: REST Server for Kiosco POS
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP request                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TraceLayer (tower-http)      one span per request                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  routes::{sales, products}    extract JSON / path / query              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kiosco_db::Database          coordinator, ledger, repositories        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError ──► status + { code, message, details }                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router with request tracing.
pub fn router(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
