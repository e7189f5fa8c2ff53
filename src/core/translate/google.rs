//! Google Cloud Translation v2 (Basic) REST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::base::{TranslateError, Translator};
use crate::core::providers::google::TokenProvider;

/// Translation v2 endpoint
pub const GOOGLE_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTranslateConfig {
    #[serde(default = "default_url")]
    pub url: String,

    /// Project billed for the request (`x-goog-user-project`)
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    GOOGLE_TRANSLATE_URL.to_string()
}

fn default_timeout() -> u64 {
    15
}

impl Default for GoogleTranslateConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            project_id: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

pub struct GoogleTranslator {
    config: GoogleTranslateConfig,
    auth: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(
        config: GoogleTranslateConfig,
        auth: Arc<dyn TokenProvider>,
    ) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TranslateError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            auth,
            client,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, TranslateError> {
        let token = self
            .auth
            .get_token()
            .await
            .map_err(|e| TranslateError::AuthenticationFailed(e.to_string()))?;

        let mut request = self
            .client
            .post(&self.config.url)
            .header("Authorization", format!("Bearer {token}"))
            .json(&json!({
                "q": text,
                "target": target_language,
                "format": "text",
            }));
        if let Some(project_id) = &self.config.project_id {
            request = request.header("x-goog-user-project", project_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TranslateError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    TranslateError::AuthenticationFailed(body)
                }
                _ => TranslateError::ProviderError(format!(
                    "Google Translate API error ({status}): {body}"
                )),
            });
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::ProviderError(format!("Invalid response: {e}")))?;

        let translated = parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| TranslateError::ProviderError("Empty translation result".to_string()))?;

        debug!(target_language, chars = translated.len(), "Translated text");
        Ok(translated)
    }
}
