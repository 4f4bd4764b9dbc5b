//! Configuration management
//!
//! This module handles loading and parsing configuration for the ShelfCheck
//! service. Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. Missing the
//! whole file is fine too: the service starts with the in-memory store and
//! mock email dispatch, so a fresh checkout is usable without any setup.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Email (SMTP) configuration
    #[serde(default)]
    pub email: EmailConfig,
    /// Expiry policy configuration
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
///
/// When `url` is absent the service runs on the in-memory store: nothing is
/// persisted across restarts, but every endpoint keeps working.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path/URL (e.g. `data/shelfcheck.db`)
    #[serde(default)]
    pub url: Option<String>,
}

impl DatabaseConfig {
    /// Whether a real database is configured
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

/// Email (SMTP) configuration
///
/// When `smtp_host` is absent the dispatcher takes the mock path: the
/// would-be send is logged and reported back as a test-mode success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password (overridable via SHELFCHECK_SMTP_PASSWORD)
    #[serde(default)]
    pub smtp_password: String,
    /// From address for report emails
    #[serde(default = "default_smtp_from")]
    pub smtp_from: String,
    /// Display name for the From header
    #[serde(default = "default_smtp_from_name")]
    pub smtp_from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: default_smtp_from(),
            smtp_from_name: default_smtp_from_name(),
        }
    }
}

impl EmailConfig {
    /// Whether a real SMTP provider is configured
    pub fn is_configured(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "no-reply@shelfcheck.local".to_string()
}

fn default_smtp_from_name() -> String {
    "ShelfCheck".to_string()
}

/// Expiry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Days ahead within which a record counts as expiring soon
    #[serde(default = "default_expiring_soon_days")]
    pub expiring_soon_days: i64,
    /// What finalize does when the session holds zero records
    #[serde(default)]
    pub finalize_empty: FinalizeEmpty,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            expiring_soon_days: default_expiring_soon_days(),
            finalize_empty: FinalizeEmpty::default(),
        }
    }
}

fn default_expiring_soon_days() -> i64 {
    7
}

/// Behavior of a finalize intent on a session with no records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FinalizeEmpty {
    /// Terminate immediately, no report (default)
    #[default]
    Skip,
    /// Hold in the finalizing state so the client can confirm
    Confirm,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A missing or empty file yields the default configuration.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file {}: {}", path.display(), e))?;

        Ok(config)
    }

    /// Load configuration from a YAML file with environment overrides applied
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SHELFCHECK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SHELFCHECK_SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("SHELFCHECK_DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(host) = std::env::var("SHELFCHECK_SMTP_HOST") {
            self.email.smtp_host = Some(host);
        }
        if let Ok(password) = std::env::var("SHELFCHECK_SMTP_PASSWORD") {
            self.email.smtp_password = password;
        }
        if let Ok(days) = std::env::var("SHELFCHECK_EXPIRING_SOON_DAYS") {
            if let Ok(days) = days.parse() {
                self.policy.expiring_soon_days = days;
            }
        }
    }
}
