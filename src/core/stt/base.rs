//! Streaming recognizer contract.
//!
//! A recognizer is opened once per speaker session. Opening never performs
//! network I/O on the caller's task: the provider spawns its own streaming
//! task, and audio sent before the upstream stream is negotiated is buffered
//! in the [`RecognizerStream`] channel.
//!
//! Provider callbacks are delivered as [`RecognizerEvent`]s on a single ordered
//! channel per session, so the consumer never handles two events for the same
//! session concurrently.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Buffer size of the per-session recognizer event channel
pub const EVENT_CHANNEL_BUFFER: usize = 256;

/// Errors produced by speech recognition providers
#[derive(Debug, Clone, thiserror::Error)]
pub enum STTError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
    #[error("Recognizer stream is closed")]
    StreamClosed,
}

/// Recognition parameters for one stream or one batch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct STTConfig {
    /// BCP-47 language code (e.g. "en-US")
    pub language: String,
    /// Sample rate of the incoming audio in Hz
    pub sample_rate: u32,
    /// Audio encoding name understood by the provider (e.g. "webm_opus")
    pub encoding: String,
    /// Request automatic punctuation
    pub punctuation: bool,
    /// Emit interim (non-final) results
    pub interim_results: bool,
}

impl Default for STTConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            sample_rate: 48000,
            encoding: "webm_opus".to_string(),
            punctuation: true,
            interim_results: false,
        }
    }
}

impl STTConfig {
    /// Streaming configuration for browser-captured WebM/Opus audio
    pub fn for_language(language: &str) -> Self {
        Self {
            language: language.to_string(),
            ..Default::default()
        }
    }
}

/// A single recognition result
#[derive(Debug, Clone, PartialEq)]
pub struct STTResult {
    pub transcript: String,
    pub is_final: bool,
    pub confidence: f32,
}

impl STTResult {
    pub fn new(transcript: impl Into<String>, is_final: bool, confidence: f32) -> Self {
        Self {
            transcript: transcript.into(),
            is_final,
            confidence,
        }
    }
}

/// Ordered events emitted by an open recognizer stream.
///
/// `Complete` or `Error` is always the last event of a stream.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    Transcript(STTResult),
    Complete,
    Error(STTError),
}

/// Send side of an open recognizer stream.
///
/// `send` never blocks: chunks are queued until the provider task consumes
/// them. `close_send` is idempotent.
#[derive(Debug)]
pub struct RecognizerStream {
    audio_tx: Mutex<Option<mpsc::UnboundedSender<Bytes>>>,
}

impl RecognizerStream {
    /// Create a stream handle and the receiver the provider task drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        (
            Self {
                audio_tx: Mutex::new(Some(audio_tx)),
            },
            audio_rx,
        )
    }

    /// Queue an audio chunk for the provider
    pub fn send(&self, chunk: Bytes) -> Result<(), STTError> {
        let guard = self.audio_tx.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(STTError::StreamClosed);
        };
        tx.send(chunk).map_err(|_| STTError::StreamClosed)
    }

    /// Close the send side. Returns true only for the call that closed it.
    pub fn close_send(&self) -> bool {
        self.audio_tx.lock().take().is_some()
    }

    pub fn is_open(&self) -> bool {
        self.audio_tx
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

/// An opened recognition stream: the send handle plus its event channel
#[derive(Debug)]
pub struct RecognizerSession {
    pub stream: RecognizerStream,
    pub events: mpsc::Receiver<RecognizerEvent>,
}

/// Streaming speech recognition capability
pub trait StreamingRecognizer: Send + Sync {
    /// Open a new stream. Must not block on network I/O.
    fn open(&self, config: STTConfig) -> Result<RecognizerSession, STTError>;

    fn get_provider_info(&self) -> &'static str;
}

/// One-shot recognition of a complete audio payload
#[async_trait]
pub trait BatchRecognizer: Send + Sync {
    /// Transcribe `audio`. `content_type` selects the encoding; an empty
    /// string is returned when nothing was recognized.
    async fn transcribe(
        &self,
        audio: Bytes,
        language: &str,
        content_type: Option<&str>,
    ) -> Result<String, STTError>;
}
