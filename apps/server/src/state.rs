//! Shared application state handed to every handler.

use std::sync::Arc;

use nailed_db::Database;

use crate::auth::SessionManager;
use crate::config::ServerConfig;

/// Cloned per request; everything inside is cheap to clone or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let sessions = SessionManager::new(config.jwt_secret.clone(), config.session_lifetime_secs);
        AppState {
            db,
            config: Arc::new(config),
            sessions: Arc::new(sessions),
        }
    }
}
