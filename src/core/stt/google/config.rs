//! Google Speech-to-Text configuration and audio encoding selection.

use google_api_proto::google::cloud::speech::v1::{
    RecognitionConfig, StreamingRecognitionConfig, recognition_config::AudioEncoding,
};
use serde::{Deserialize, Serialize};

use crate::core::stt::base::STTConfig;

/// Public Speech-to-Text gRPC endpoint
pub const GOOGLE_SPEECH_ENDPOINT: &str = "https://speech.googleapis.com";

/// Sample rate sent with MP3 uploads
const MP3_SAMPLE_RATE_HZ: i32 = 16000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSTTConfig {
    /// gRPC endpoint, scheme included
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

fn default_endpoint() -> String {
    GOOGLE_SPEECH_ENDPOINT.to_string()
}

fn default_connection_timeout() -> u64 {
    10
}

impl Default for GoogleSTTConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

impl GoogleSTTConfig {
    /// Host name used for TLS verification
    pub fn domain(&self) -> Option<String> {
        url::Url::parse(&self.endpoint)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }
}

/// Map an encoding name from [`STTConfig`] to the Speech v1 enum
pub fn encoding_from_name(name: &str) -> AudioEncoding {
    match name.to_ascii_lowercase().as_str() {
        "webm_opus" | "webm" => AudioEncoding::WebmOpus,
        "ogg_opus" => AudioEncoding::OggOpus,
        "linear16" | "pcm16" => AudioEncoding::Linear16,
        "flac" => AudioEncoding::Flac,
        "mp3" => AudioEncoding::Mp3,
        "mulaw" => AudioEncoding::Mulaw,
        _ => AudioEncoding::EncodingUnspecified,
    }
}

/// Pick the encoding (and sample rate, when it must be explicit) for an
/// uploaded file from its content type.
pub fn encoding_for_content_type(content_type: Option<&str>) -> (AudioEncoding, Option<i32>) {
    let Some(content_type) = content_type else {
        return (AudioEncoding::EncodingUnspecified, None);
    };
    let content_type = content_type.to_ascii_lowercase();

    if content_type.contains("webm") || content_type.contains("ogg") {
        (AudioEncoding::WebmOpus, None)
    } else if content_type.contains("mpeg") || content_type.contains("mp3") {
        (AudioEncoding::Mp3, Some(MP3_SAMPLE_RATE_HZ))
    } else if content_type.contains("flac") {
        (AudioEncoding::Flac, None)
    } else if content_type.contains("wav") {
        (AudioEncoding::Linear16, None)
    } else {
        (AudioEncoding::EncodingUnspecified, None)
    }
}

/// Streaming request configuration sent as the first message of a stream
pub fn streaming_config(config: &STTConfig) -> StreamingRecognitionConfig {
    StreamingRecognitionConfig {
        config: Some(RecognitionConfig {
            encoding: encoding_from_name(&config.encoding) as i32,
            sample_rate_hertz: config.sample_rate as i32,
            language_code: config.language.clone(),
            enable_automatic_punctuation: config.punctuation,
            ..Default::default()
        }),
        interim_results: config.interim_results,
        ..Default::default()
    }
}

/// Unary request configuration for a whole uploaded file
pub fn batch_config(language: &str, content_type: Option<&str>) -> RecognitionConfig {
    let (encoding, sample_rate) = encoding_for_content_type(content_type);
    RecognitionConfig {
        encoding: encoding as i32,
        sample_rate_hertz: sample_rate.unwrap_or_default(),
        language_code: language.to_string(),
        enable_automatic_punctuation: true,
        ..Default::default()
    }
}
