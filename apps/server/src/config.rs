//! # Server Configuration
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values
//! 2. TOML file named by `NAILED_CONFIG` (optional)
//! 3. `NAILED_*` environment variables
//!
//! ```toml
//! # nailed.toml
//! http_port = 8080
//! database_path = "/var/lib/nailed/nailed.db"
//! jwt_secret = "change-me"
//! import_timeout_secs = 60
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Secret used when none is configured. A warning is logged at startup.
const DEV_JWT_SECRET: &str = "nailed-dev-secret-change-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub bind_addr: String,

    pub http_port: u16,

    /// SQLite database file.
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// HS256 key for session tokens.
    pub jwt_secret: String,

    /// Session token lifetime (default: 24 h).
    pub session_lifetime_secs: i64,

    /// Password reset token lifetime (default: 1 h).
    pub reset_token_lifetime_secs: i64,

    /// Upper bound on one bulk import transaction.
    pub import_timeout_secs: u64,

    /// Public URL used to build password reset links.
    pub app_url: String,

    /// Adds `Secure` to the session cookie. Enable behind HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0".to_string(),
            http_port: 3000,
            database_path: PathBuf::from("nailed.db"),
            max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_lifetime_secs: 86_400,
            reset_token_lifetime_secs: 3_600,
            import_timeout_secs: 30,
            app_url: "http://localhost:3000".to_string(),
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("NAILED_CONFIG").ok().map(PathBuf::from);
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        if config.jwt_secret == DEV_JWT_SECRET {
            warn!("NAILED_JWT_SECRET not set, using the development secret");
        }
        Ok(config)
    }

    /// Reads a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading server config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `NAILED_*` overrides. `lookup` returns the raw value of a key.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("NAILED_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(port) = lookup("NAILED_HTTP_PORT") {
            self.http_port = parse("NAILED_HTTP_PORT", &port)?;
        }
        if let Some(path) = lookup("NAILED_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }
        if let Some(max) = lookup("NAILED_DB_MAX_CONNECTIONS") {
            self.max_connections = parse("NAILED_DB_MAX_CONNECTIONS", &max)?;
        }
        if let Some(secret) = lookup("NAILED_JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(secs) = lookup("NAILED_SESSION_LIFETIME_SECS") {
            self.session_lifetime_secs = parse("NAILED_SESSION_LIFETIME_SECS", &secs)?;
        }
        if let Some(secs) = lookup("NAILED_RESET_TOKEN_LIFETIME_SECS") {
            self.reset_token_lifetime_secs = parse("NAILED_RESET_TOKEN_LIFETIME_SECS", &secs)?;
        }
        if let Some(secs) = lookup("NAILED_IMPORT_TIMEOUT_SECS") {
            self.import_timeout_secs = parse("NAILED_IMPORT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(url) = lookup("NAILED_APP_URL") {
            self.app_url = url;
        }
        if let Some(secure) = lookup("NAILED_SECURE_COOKIES") {
            self.secure_cookies = parse("NAILED_SECURE_COOKIES", &secure)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < 16 {
            return Err(ConfigError::Invalid(
                "jwt_secret must be at least 16 characters".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.session_lifetime_secs <= 0 || self.reset_token_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid("token lifetimes must be positive".into()));
        }
        if self.import_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "import_timeout_secs must be greater than 0".into(),
            ));
        }
        if !self.app_url.starts_with("http://") && !self.app_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "app_url must start with http:// or https://, got: {}",
                self.app_url
            )));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.http_port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("NAILED_BIND_ADDR".to_string()))
    }

    pub fn import_timeout(&self) -> Duration {
        Duration::from_secs(self.import_timeout_secs)
    }

    /// Link sent to a user who asked for a password reset.
    pub fn reset_url(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.app_url.trim_end_matches('/'),
            token
        )
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
