use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a login session in hours (default: 14 days)
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Minimum password length accepted at signup
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    /// Mark the session cookie `Secure` (enable behind HTTPS)
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            min_password_length: default_min_password_length(),
            secure_cookies: false,
        }
    }
}

fn default_session_ttl_hours() -> i64 {
    24 * 14
}

fn default_min_password_length() -> usize {
    8
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests per window for authenticated API routes
    #[serde(default = "default_api_requests")]
    pub api_requests_per_window: u32,
    /// Requests per window for signup/login
    #[serde(default = "default_auth_requests")]
    pub auth_requests_per_window: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Seconds between sweeps of stale limiter entries
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Key clients on X-Forwarded-For / X-Real-IP instead of the socket
    /// address. Only enable behind a reverse proxy that sets those headers.
    #[serde(default)]
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_requests_per_window: default_api_requests(),
            auth_requests_per_window: default_auth_requests(),
            window_seconds: default_window_seconds(),
            cleanup_interval: default_cleanup_interval(),
            trust_proxy: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_requests() -> u32 {
    300
}

fn default_auth_requests() -> u32 {
    20
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Environment variables win over the file: FITTRACK_HOST, FITTRACK_PORT,
    /// FITTRACK_DATA_DIR and FITTRACK_LOG_LEVEL.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("FITTRACK_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("FITTRACK_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid FITTRACK_PORT: {}", port))?;
        }
        if let Ok(dir) = std::env::var("FITTRACK_DATA_DIR") {
            self.server.data_dir = PathBuf::from(dir);
        }
        if let Ok(level) = std::env::var("FITTRACK_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.auth.session_ttl_hours <= 0 {
            anyhow::bail!("auth.session_ttl_hours must be positive");
        }
        if self.auth.min_password_length == 0 {
            anyhow::bail!("auth.min_password_length must be at least 1");
        }
        if self.rate_limit.enabled && self.rate_limit.window_seconds == 0 {
            anyhow::bail!("rate_limit.window_seconds must be positive when rate limiting is enabled");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
