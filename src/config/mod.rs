//! Configuration module for the voice relay server
//!
//! Configuration comes from .env files, environment variables and an optional
//! YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Applying YAML overrides on top of the environment
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voice_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::relay::SessionDefaults;
use crate::core::tts::RetryPolicy;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains everything needed to run the relay:
/// - Server settings (host, port, TLS)
/// - Google Cloud credentials
/// - Defaults for missing handshake parameters
/// - Synthesis cache and retry settings
/// - Security settings (CORS, rate limiting, connection limits)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Seconds between server pings on relay WebSockets
    /// Default: 30
    pub ws_ping_interval_secs: u64,

    /// Google Cloud service account, either a path to the key file or the
    /// JSON content inline
    pub google_credentials: Option<String>,
    /// Static OAuth2 access token, used when no service account is set
    pub google_access_token: Option<String>,
    /// Project billed for Translation and Gemini voices. Defaults to the
    /// service account's project.
    pub google_project_id: Option<String>,

    /// Values used when a connection omits a parameter
    pub session_defaults: SessionDefaults,

    // Synthesis
    /// Maximum cached synthesis results
    /// Default: 1000
    pub tts_cache_capacity: u64,
    /// Attempts per synthesis call, first call included
    /// Default: 4
    pub tts_retry_max_attempts: u32,
    /// Delay before the first retry, doubled on each further retry
    /// Default: 1000
    pub tts_retry_initial_delay_ms: u64,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,

    // Connection limits
    /// Maximum concurrent WebSocket connections
    /// Default: None (unlimited)
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    /// Default: 100
    pub max_connections_per_ip: u32,
}

/// Zeroize secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut creds) = self.google_credentials {
            creds.zeroize();
        }
        if let Some(ref mut token) = self.google_access_token {
            token.zeroize();
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tls: None,
            ws_ping_interval_secs: 30,
            google_credentials: None,
            google_access_token: None,
            google_project_id: None,
            session_defaults: SessionDefaults::default(),
            tts_cache_capacity: 1000,
            tts_retry_max_attempts: 4,
            tts_retry_initial_delay_ms: 1000,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
            max_websocket_connections: None,
            max_connections_per_ip: 100,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// The .env file is loaded in main.rs at startup, so its values are
    /// already visible as environment variables here.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = env::load_from_env()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(env::load_from_env()?, yaml_config);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Whether any Google credential is configured
    pub fn has_google_credentials(&self) -> bool {
        self.google_credentials.is_some() || self.google_access_token.is_some()
    }

    /// Interval between keepalive pings on relay WebSockets
    pub fn ws_ping_interval(&self) -> Duration {
        Duration::from_secs(self.ws_ping_interval_secs)
    }

    /// Retry policy for rate-limited synthesis calls
    pub fn tts_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.tts_retry_max_attempts,
            Duration::from_millis(self.tts_retry_initial_delay_ms),
        )
    }
}
