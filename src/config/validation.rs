//! Configuration validation logic.

use super::ServerConfig;

pub(super) fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.port == 0 {
        return Err("PORT must be greater than 0".into());
    }

    if let Some(tls) = &config.tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file not found: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
        }
    }

    if config.ws_ping_interval_secs == 0 {
        return Err("WS_PING_INTERVAL_SECS must be greater than 0".into());
    }

    if config.tts_cache_capacity == 0 {
        return Err("TTS_CACHE_CAPACITY must be greater than 0".into());
    }
    if config.tts_retry_max_attempts == 0 {
        return Err("TTS_RETRY_MAX_ATTEMPTS must be greater than 0".into());
    }

    if config.rate_limit_requests_per_second == 0 || config.rate_limit_burst_size == 0 {
        return Err("Rate limit values must be greater than 0".into());
    }
    if config.max_connections_per_ip == 0 {
        return Err("MAX_CONNECTIONS_PER_IP must be greater than 0".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsConfig;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert!(validate(&config).is_err());

        let mut config = ServerConfig::default();
        config.tts_retry_max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = ServerConfig::default();
        config.ws_ping_interval_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_tls_files_must_exist() {
        let cert = NamedTempFile::new().unwrap();
        let key = NamedTempFile::new().unwrap();

        let mut config = ServerConfig::default();
        config.tls = Some(TlsConfig {
            cert_path: cert.path().to_path_buf(),
            key_path: key.path().to_path_buf(),
        });
        assert!(validate(&config).is_ok());

        config.tls = Some(TlsConfig {
            cert_path: cert.path().to_path_buf(),
            key_path: PathBuf::from("/nonexistent/key.pem"),
        });
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("TLS key file not found"));
    }
}
