//! One-shot translation of an uploaded recording.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use super::relay::{RelayError, SessionDefaults};
use super::stt::BatchRecognizer;
use super::translate::Translator;
use super::tts::{SynthesisRequest, SynthesisService};

/// Result of a batch translation. All fields are empty when nothing was
/// recognized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTranslation {
    pub original_text: String,
    pub translated_text: String,
    pub audio: Option<Bytes>,
}

pub struct BatchTranslator {
    recognizer: Arc<dyn BatchRecognizer>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<SynthesisService>,
    defaults: SessionDefaults,
}

impl BatchTranslator {
    pub fn new(
        recognizer: Arc<dyn BatchRecognizer>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<SynthesisService>,
        defaults: SessionDefaults,
    ) -> Self {
        Self {
            recognizer,
            translator,
            synthesizer,
            defaults,
        }
    }

    /// Transcribe, translate and synthesize with the default voice
    pub async fn translate_audio(
        &self,
        audio: Bytes,
        content_type: Option<&str>,
        source_language: &str,
        target_language: &str,
    ) -> Result<BatchTranslation, RelayError> {
        let original_text = self
            .recognizer
            .transcribe(audio, source_language, content_type)
            .await?;

        if original_text.trim().is_empty() {
            info!(source_language, "Batch upload produced no transcript");
            return Ok(BatchTranslation::default());
        }

        let translated_text = self
            .translator
            .translate(&original_text, target_language)
            .await?;

        let audio = self
            .synthesizer
            .synthesize(SynthesisRequest::new(
                translated_text.clone(),
                target_language,
                self.defaults.voice_model.clone(),
                self.defaults.voice_gender.clone(),
                "",
            ))
            .await?;

        info!(
            source_language,
            target_language,
            audio_bytes = audio.len(),
            "Batch translation finished"
        );

        Ok(BatchTranslation {
            original_text,
            translated_text,
            audio: (!audio.is_empty()).then_some(audio),
        })
    }
}
