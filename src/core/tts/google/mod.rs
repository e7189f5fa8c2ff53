//! Google Cloud Text-to-Speech adapter.

mod config;
mod provider;

pub use config::{
    DEFAULT_GEMINI_SPEAKER, GOOGLE_TTS_URL, GoogleTTSConfig, VoiceFamily, build_request_body,
};
pub use provider::GoogleSynthesizer;
