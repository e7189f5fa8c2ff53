//! Applying YAML overrides on top of environment configuration.

use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};

/// Overwrite `config` with every value the YAML file sets
pub(super) fn merge_config(mut config: ServerConfig, yaml: YamlConfig) -> ServerConfig {
    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(interval) = server.ws_ping_interval_secs {
            config.ws_ping_interval_secs = interval;
        }
        if let Some(tls) = server.tls {
            match tls.enabled {
                Some(false) => config.tls = None,
                _ => {
                    if let (Some(cert), Some(key)) = (tls.cert_path, tls.key_path) {
                        config.tls = Some(TlsConfig {
                            cert_path: PathBuf::from(cert),
                            key_path: PathBuf::from(key),
                        });
                    }
                }
            }
        }
    }

    if let Some(google) = yaml.google {
        if google.credentials.is_some() {
            config.google_credentials = google.credentials;
        }
        if google.access_token.is_some() {
            config.google_access_token = google.access_token;
        }
        if google.project_id.is_some() {
            config.google_project_id = google.project_id;
        }
    }

    if let Some(session) = yaml.session {
        let defaults = &mut config.session_defaults;
        if let Some(room_id) = session.default_room_id {
            defaults.room_id = room_id;
        }
        if let Some(language) = session.default_source_language {
            defaults.source_language = language;
        }
        if let Some(language) = session.default_target_language {
            defaults.target_language = language;
        }
        if let Some(model) = session.default_voice_model {
            defaults.voice_model = model;
        }
        if let Some(gender) = session.default_voice_gender {
            defaults.voice_gender = gender;
        }
    }

    if let Some(synthesis) = yaml.synthesis {
        if let Some(capacity) = synthesis.cache_capacity {
            config.tts_cache_capacity = capacity;
        }
        if let Some(attempts) = synthesis.retry_max_attempts {
            config.tts_retry_max_attempts = attempts;
        }
        if let Some(delay) = synthesis.retry_initial_delay_ms {
            config.tts_retry_initial_delay_ms = delay;
        }
    }

    if let Some(security) = yaml.security {
        if security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = security.cors_allowed_origins;
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
        if security.max_websocket_connections.is_some() {
            config.max_websocket_connections = security.max_websocket_connections;
        }
        if let Some(per_ip) = security.max_connections_per_ip {
            config.max_connections_per_ip = per_ip;
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml::{SecurityYaml, ServerYaml, TlsYaml};

    #[test]
    fn test_empty_yaml_keeps_env() {
        let mut base = ServerConfig::default();
        base.port = 4000;

        let merged = merge_config(base, YamlConfig::default());
        assert_eq!(merged.port, 4000);
    }

    #[test]
    fn test_tls_disabled_in_yaml() {
        let mut base = ServerConfig::default();
        base.tls = Some(TlsConfig {
            cert_path: PathBuf::from("/env/cert.pem"),
            key_path: PathBuf::from("/env/key.pem"),
        });

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                tls: Some(TlsYaml {
                    enabled: Some(false),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert!(merge_config(base, yaml).tls.is_none());
    }

    #[test]
    fn test_security_overrides() {
        let yaml = YamlConfig {
            security: Some(SecurityYaml {
                max_websocket_connections: Some(10),
                rate_limit_burst_size: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = merge_config(ServerConfig::default(), yaml);
        assert_eq!(merged.max_websocket_connections, Some(10));
        assert_eq!(merged.rate_limit_burst_size, 5);
        assert_eq!(merged.rate_limit_requests_per_second, 60);
    }
}
