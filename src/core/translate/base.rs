use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslateError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Text translation capability
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language`. The source language is
    /// detected by the provider.
    async fn translate(&self, text: &str, target_language: &str)
    -> Result<String, TranslateError>;
}
