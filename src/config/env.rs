//! Environment variable loading.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ServerConfig, TlsConfig};

/// Read a variable, treating empty values as unset
fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse a variable, keeping `default` when unset
fn parse_env<T>(name: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| format!("Invalid {name} value '{raw}': {e}").into()),
        None => Ok(default),
    }
}

pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();

    if let Some(host) = env_var("HOST") {
        config.host = host;
    }
    config.port = parse_env("PORT", config.port)?;

    config.tls = match (env_var("TLS_CERT_PATH"), env_var("TLS_KEY_PATH")) {
        (Some(cert), Some(key)) => Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        }),
        (None, None) => None,
        _ => return Err("TLS_CERT_PATH and TLS_KEY_PATH must be set together".into()),
    };

    config.google_credentials = env_var("GOOGLE_APPLICATION_CREDENTIALS");
    config.google_access_token = env_var("GOOGLE_ACCESS_TOKEN");
    config.google_project_id = env_var("GOOGLE_PROJECT_ID");

    let defaults = &mut config.session_defaults;
    if let Some(room_id) = env_var("DEFAULT_ROOM_ID") {
        defaults.room_id = room_id;
    }
    if let Some(language) = env_var("DEFAULT_SOURCE_LANGUAGE") {
        defaults.source_language = language;
    }
    if let Some(language) = env_var("DEFAULT_TARGET_LANGUAGE") {
        defaults.target_language = language;
    }
    if let Some(model) = env_var("DEFAULT_VOICE_MODEL") {
        defaults.voice_model = model;
    }
    if let Some(gender) = env_var("DEFAULT_VOICE_GENDER") {
        defaults.voice_gender = gender;
    }

    config.ws_ping_interval_secs =
        parse_env("WS_PING_INTERVAL_SECS", config.ws_ping_interval_secs)?;

    config.tts_cache_capacity = parse_env("TTS_CACHE_CAPACITY", config.tts_cache_capacity)?;
    config.tts_retry_max_attempts =
        parse_env("TTS_RETRY_MAX_ATTEMPTS", config.tts_retry_max_attempts)?;
    config.tts_retry_initial_delay_ms =
        parse_env("TTS_RETRY_INITIAL_DELAY_MS", config.tts_retry_initial_delay_ms)?;

    config.cors_allowed_origins = env_var("CORS_ALLOWED_ORIGINS");
    config.rate_limit_requests_per_second = parse_env(
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        config.rate_limit_requests_per_second,
    )?;
    config.rate_limit_burst_size = parse_env("RATE_LIMIT_BURST_SIZE", config.rate_limit_burst_size)?;
    config.max_websocket_connections = match env_var("MAX_WEBSOCKET_CONNECTIONS") {
        Some(raw) => Some(
            raw.parse()
                .map_err(|e| format!("Invalid MAX_WEBSOCKET_CONNECTIONS value '{raw}': {e}"))?,
        ),
        None => None,
    };
    config.max_connections_per_ip =
        parse_env("MAX_CONNECTIONS_PER_IP", config.max_connections_per_ip)?;

    Ok(config)
}
