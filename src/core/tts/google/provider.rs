//! Google Text-to-Speech v1 REST provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::config::{GoogleTTSConfig, VoiceFamily, build_request_body};
use crate::core::providers::google::TokenProvider;
use crate::core::tts::base::{SpeechSynthesizer, SynthesisRequest, TTSError, TTSResult};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

pub struct GoogleSynthesizer {
    config: GoogleTTSConfig,
    auth: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl GoogleSynthesizer {
    pub fn new(config: GoogleTTSConfig, auth: Arc<dyn TokenProvider>) -> TTSResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TTSError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            auth,
            client,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
        let token = self
            .auth
            .get_token()
            .await
            .map_err(|e| TTSError::InvalidConfiguration(format!("Google credentials: {e}")))?;

        let family = VoiceFamily::from_model(&request.voice_model);
        let mut http_request = self
            .client
            .post(&self.config.url)
            .header("Authorization", format!("Bearer {token}"))
            .json(&build_request_body(request));

        if family == VoiceFamily::Gemini
            && let Some(project_id) = &self.config.project_id
        {
            http_request = http_request.header("x-goog-user-project", project_id);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => TTSError::RateLimited(body),
                _ => TTSError::ProviderError(format!("Google TTS API error ({status}): {body}")),
            });
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| TTSError::ProviderError(format!("Invalid response: {e}")))?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| TTSError::AudioGenerationFailed(format!("Invalid audio payload: {e}")))?;

        if audio.is_empty() {
            return Err(TTSError::AudioGenerationFailed(
                "Provider returned no audio".to_string(),
            ));
        }

        debug!(
            language = %request.language,
            voice_model = %request.voice_model,
            bytes = audio.len(),
            "Synthesized audio"
        );
        Ok(Bytes::from(audio))
    }

    fn get_provider_info(&self) -> &'static str {
        "Google Cloud Text-to-Speech v1"
    }
}
