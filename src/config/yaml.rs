use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///   ws_ping_interval_secs: 30
///   tls:
///     enabled: true
///     cert_path: "/etc/relay/cert.pem"
///     key_path: "/etc/relay/key.pem"
///
/// google:
///   credentials: "/etc/relay/service-account.json"
///   project_id: "my-project"
///
/// session:
///   default_room_id: "default"
///   default_source_language: "en-US"
///   default_target_language: "es-ES"
///   default_voice_model: "Standard"
///   default_voice_gender: "NEUTRAL"
///
/// synthesis:
///   cache_capacity: 1000
///   retry_max_attempts: 4
///   retry_initial_delay_ms: 1000
///
/// security:
///   cors_allowed_origins: "https://relay.example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
///   max_websocket_connections: 1000
///   max_connections_per_ip: 100
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub google: Option<GoogleYaml>,
    pub session: Option<SessionYaml>,
    pub synthesis: Option<SynthesisYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
    pub ws_ping_interval_secs: Option<u64>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Google Cloud credentials from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GoogleYaml {
    /// Path to a service account JSON file, or the JSON content inline
    pub credentials: Option<String>,
    pub access_token: Option<String>,
    pub project_id: Option<String>,
}

/// Handshake defaults from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub default_room_id: Option<String>,
    pub default_source_language: Option<String>,
    pub default_target_language: Option<String>,
    pub default_voice_model: Option<String>,
    pub default_voice_gender: Option<String>,
}

/// Synthesis cache and retry settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisYaml {
    pub cache_capacity: Option<u64>,
    pub retry_max_attempts: Option<u32>,
    pub retry_initial_delay_ms: Option<u64>,
}

/// Security settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
    pub max_websocket_connections: Option<usize>,
    pub max_connections_per_ip: Option<u32>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))?;

        Ok(config)
    }
}
