//! Google Text-to-Speech request shaping.
//!
//! Two voice families share one endpoint. Standard, WaveNet and Neural2
//! voices select a voice by SSML gender and, for anything other than the
//! plain `Standard` model, by a derived voice name. Gemini voices carry a
//! model name, a speaker alias and an optional style prompt.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::tts::base::SynthesisRequest;

/// Text-to-Speech v1 synthesize endpoint
pub const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Speaker used by Gemini voices when no alias is given
pub const DEFAULT_GEMINI_SPEAKER: &str = "Kore";

const STANDARD_MODEL: &str = "Standard";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTTSConfig {
    /// Synthesize endpoint URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Project billed for Gemini voices (`x-goog-user-project`)
    #[serde(default)]
    pub project_id: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    GOOGLE_TTS_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for GoogleTTSConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            project_id: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceFamily {
    Standard,
    Gemini,
}

impl VoiceFamily {
    pub fn from_model(voice_model: &str) -> Self {
        if voice_model.starts_with("gemini") {
            VoiceFamily::Gemini
        } else {
            VoiceFamily::Standard
        }
    }
}

/// SSML gender name accepted by the API; unknown values read as neutral
fn ssml_gender(gender: &str) -> &'static str {
    match gender.trim().to_ascii_uppercase().as_str() {
        "MALE" => "MALE",
        "FEMALE" => "FEMALE",
        _ => "NEUTRAL",
    }
}

/// Voice name for non-`Standard` models, e.g. `es-ES-Wavenet-B`
fn standard_voice_name(request: &SynthesisRequest) -> Option<String> {
    if request.voice_model.is_empty() || request.voice_model == STANDARD_MODEL {
        return None;
    }
    let variant = if ssml_gender(&request.voice_gender) == "MALE" {
        "B"
    } else {
        "A"
    };
    Some(format!(
        "{}-{}-{}",
        request.language, request.voice_model, variant
    ))
}

/// Speaker alias for Gemini voices; the gender parameter carries it
fn gemini_speaker(request: &SynthesisRequest) -> &str {
    let alias = request.voice_gender.trim();
    if alias.is_empty() || alias.eq_ignore_ascii_case("NEUTRAL") {
        DEFAULT_GEMINI_SPEAKER
    } else {
        alias
    }
}

/// JSON body for `text:synthesize`
pub fn build_request_body(request: &SynthesisRequest) -> Value {
    match VoiceFamily::from_model(&request.voice_model) {
        VoiceFamily::Gemini => {
            let mut input = json!({ "text": request.text });
            if !request.prompt.trim().is_empty() {
                input["prompt"] = json!(request.prompt);
            }
            json!({
                "input": input,
                "voice": {
                    "languageCode": request.language,
                    "model_name": request.voice_model,
                    "name": gemini_speaker(request),
                },
                "audioConfig": { "audioEncoding": "MP3" },
            })
        }
        VoiceFamily::Standard => {
            let mut voice = json!({
                "languageCode": request.language,
                "ssmlGender": ssml_gender(&request.voice_gender),
            });
            if let Some(name) = standard_voice_name(request) {
                voice["name"] = json!(name);
            }
            json!({
                "input": { "text": request.text },
                "voice": voice,
                "audioConfig": { "audioEncoding": "MP3" },
            })
        }
    }
}
