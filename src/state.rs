//! Shared application state.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::batch::BatchTranslator;
use crate::core::providers::google::{
    AuthError, CredentialSource, GOOGLE_CLOUD_PLATFORM_SCOPE, GoogleAuthClient, TokenProvider,
};
use crate::core::relay::{RelayCoordinator, RelayServices, RoomRegistry};
use crate::core::rooms::RoomDirectory;
use crate::core::stt::{
    BatchRecognizer, GoogleBatchRecognizer, GoogleSTTConfig, GoogleStreamingRecognizer,
    StreamingRecognizer,
};
use crate::core::translate::{GoogleTranslateConfig, GoogleTranslator, Translator};
use crate::core::tts::{GoogleSynthesizer, GoogleTTSConfig, SpeechSynthesizer, SynthesisService};

/// Why a WebSocket connection slot could not be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    GlobalLimitReached,
    PerIpLimitReached,
}

/// The capability providers behind the relay
#[derive(Clone)]
pub struct Providers {
    pub recognizer: Arc<dyn StreamingRecognizer>,
    pub batch_recognizer: Arc<dyn BatchRecognizer>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Providers {
    /// Google Cloud providers sharing one credential
    pub fn google(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let source = match (&config.google_credentials, &config.google_access_token) {
            (Some(credentials), _) => CredentialSource::from_service_account(credentials)?,
            (None, Some(token)) => CredentialSource::from_access_token(token),
            (None, None) => {
                return Err(AuthError::InvalidCredentials(
                    "set GOOGLE_APPLICATION_CREDENTIALS or GOOGLE_ACCESS_TOKEN".to_string(),
                )
                .into());
            }
        };

        let project_id = config
            .google_project_id
            .clone()
            .or_else(|| source.project_id().map(str::to_string));
        let auth: Arc<dyn TokenProvider> =
            Arc::new(GoogleAuthClient::new(source, &[GOOGLE_CLOUD_PLATFORM_SCOPE])?);

        let translator = GoogleTranslator::new(
            GoogleTranslateConfig {
                project_id: project_id.clone(),
                ..Default::default()
            },
            auth.clone(),
        )?;
        let synthesizer = GoogleSynthesizer::new(
            GoogleTTSConfig {
                project_id,
                ..Default::default()
            },
            auth.clone(),
        )?;

        Ok(Self {
            recognizer: Arc::new(GoogleStreamingRecognizer::new(
                GoogleSTTConfig::default(),
                auth.clone(),
            )),
            batch_recognizer: Arc::new(GoogleBatchRecognizer::new(GoogleSTTConfig::default(), auth)),
            translator: Arc::new(translator),
            synthesizer: Arc::new(synthesizer),
        })
    }
}

pub struct AppState {
    pub config: ServerConfig,
    pub coordinator: RelayCoordinator,
    pub batch: BatchTranslator,
    pub room_directory: RoomDirectory,
    ws_connections: AtomicUsize,
    ip_connections: DashMap<IpAddr, u32>,
}

impl AppState {
    pub fn new(config: ServerConfig, providers: Providers) -> Arc<Self> {
        let synthesizer = Arc::new(SynthesisService::new(
            providers.synthesizer,
            config.tts_cache_capacity,
            config.tts_retry_policy(),
        ));

        let coordinator = RelayCoordinator::new(
            Arc::new(RoomRegistry::new()),
            RelayServices {
                recognizer: providers.recognizer,
                translator: providers.translator.clone(),
                synthesizer: synthesizer.clone(),
            },
            config.session_defaults.clone(),
        );

        let batch = BatchTranslator::new(
            providers.batch_recognizer,
            providers.translator,
            synthesizer,
            config.session_defaults.clone(),
        );

        info!(
            cache_capacity = config.tts_cache_capacity,
            retry_attempts = config.tts_retry_max_attempts,
            "Application state initialized"
        );

        Arc::new(Self {
            config,
            coordinator,
            batch,
            room_directory: RoomDirectory::new(),
            ws_connections: AtomicUsize::new(0),
            ip_connections: DashMap::new(),
        })
    }

    /// Build state with the Google Cloud providers
    pub fn from_config(config: ServerConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let providers = Providers::google(&config)?;
        Ok(Self::new(config, providers))
    }

    /// Reserve a WebSocket slot for `ip`
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        let mut per_ip = self.ip_connections.entry(ip).or_insert(0);
        if *per_ip >= self.config.max_connections_per_ip {
            return Err(ConnectionLimitError::PerIpLimitReached);
        }

        if let Some(max) = self.config.max_websocket_connections {
            let reserved = self
                .ws_connections
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                    (current < max).then_some(current + 1)
                });
            if reserved.is_err() {
                drop(per_ip);
                self.ip_connections.remove_if(&ip, |_, count| *count == 0);
                return Err(ConnectionLimitError::GlobalLimitReached);
            }
        } else {
            self.ws_connections.fetch_add(1, Ordering::SeqCst);
        }

        *per_ip += 1;
        Ok(())
    }

    /// Release a slot taken by [`Self::try_acquire_connection`]
    pub fn release_connection(&self, ip: IpAddr) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_sub(1)
            });

        if let dashmap::mapref::entry::Entry::Occupied(mut entry) = self.ip_connections.entry(ip) {
            *entry.get_mut() = entry.get().saturating_sub(1);
            if *entry.get() == 0 {
                entry.remove();
            }
        }
    }

    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub fn ip_connection_count(&self, ip: &IpAddr) -> u32 {
        self.ip_connections.get(ip).map(|count| *count).unwrap_or(0)
    }
}
