//! # nailed-server: HTTP API for Nailed Inventory
//!
//! ## Module Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         nailed-server                                   │
//! │                                                                         │
//! │  main.rs ──► tracing, ServerConfig::load, Database::new, axum::serve    │
//! │                                                                         │
//! │  config.rs   defaults → TOML (NAILED_CONFIG) → NAILED_* env             │
//! │  state.rs    AppState { db, config, sessions }                          │
//! │  auth.rs     JWT sessions, CurrentUser / AdminUser extractors           │
//! │  error.rs    ApiError { code, message } → HTTP status                   │
//! │  routes/     one module per resource                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;
pub use state::AppState;

/// Default log directives when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,nailed_server=debug,nailed_db=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=nailed_db=trace` - Trace the database layer only
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
