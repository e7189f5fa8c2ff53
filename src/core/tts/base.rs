//! Speech synthesis contract.

use async_trait::async_trait;
use bytes::Bytes;

/// Errors produced by speech synthesis providers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TTSError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),
    #[error("Gave up after {attempts} rate-limited attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<TTSError> },
}

impl TTSError {
    /// Only this error class is retried
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, TTSError::RateLimited(_))
    }
}

pub type TTSResult<T> = Result<T, TTSError>;

/// Everything that determines the synthesized audio.
///
/// Two requests with equal fields produce the same audio, so this type is
/// also the synthesis cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: String,
    pub voice_model: String,
    pub voice_gender: String,
    pub prompt: String,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        language: impl Into<String>,
        voice_model: impl Into<String>,
        voice_gender: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            voice_model: voice_model.into(),
            voice_gender: voice_gender.into(),
            prompt: prompt.into(),
        }
    }
}

/// Text-to-speech capability returning encoded (MP3) audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes>;

    fn get_provider_info(&self) -> &'static str;
}
