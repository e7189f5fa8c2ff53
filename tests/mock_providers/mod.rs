//! In-process providers for relay and route tests
//!
//! - `ScriptedRecognizer` turns every audio chunk into a final transcript of
//!   the chunk's UTF-8 text, and completes when the send side closes
//! - `PrefixTranslator` tags text with the target language and can be made to
//!   fail for chosen languages
//! - `CountingSynthesizer` returns deterministic audio and counts calls
//! - `FixedBatchRecognizer` returns a fixed transcript

// Not every test binary uses every mock
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use voice_relay::core::relay::{
    OutgoingMessage, RelayCoordinator, RelayServices, RoomRegistry, SessionDefaults,
};
use voice_relay::core::stt::{
    BatchRecognizer, EVENT_CHANNEL_BUFFER, RecognizerEvent, RecognizerSession, RecognizerStream,
    STTConfig, STTError, STTResult, StreamingRecognizer,
};
use voice_relay::core::translate::{TranslateError, Translator};
use voice_relay::core::tts::{
    RetryPolicy, SpeechSynthesizer, SynthesisRequest, SynthesisService, TTSError, TTSResult,
};

#[derive(Default)]
pub struct ScriptedRecognizer {
    opened: AtomicUsize,
    /// Report an error after the first transcript instead of completing
    fail_after_first: bool,
}

impl ScriptedRecognizer {
    pub fn failing() -> Self {
        Self {
            opened: AtomicUsize::new(0),
            fail_after_first: true,
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl StreamingRecognizer for ScriptedRecognizer {
    fn open(&self, _config: STTConfig) -> Result<RecognizerSession, STTError> {
        self.opened.fetch_add(1, Ordering::SeqCst);

        let (stream, mut audio_rx) = RecognizerStream::channel();
        let (event_tx, events) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let fail_after_first = self.fail_after_first;

        tokio::spawn(async move {
            while let Some(chunk) = audio_rx.recv().await {
                let text = String::from_utf8_lossy(&chunk).into_owned();
                let _ = event_tx
                    .send(RecognizerEvent::Transcript(STTResult::new(text, true, 0.9)))
                    .await;
                if fail_after_first {
                    let _ = event_tx
                        .send(RecognizerEvent::Error(STTError::ProviderError(
                            "stream reset".to_string(),
                        )))
                        .await;
                    return;
                }
            }
            let _ = event_tx.send(RecognizerEvent::Complete).await;
        });

        Ok(RecognizerSession { stream, events })
    }

    fn get_provider_info(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Default)]
pub struct PrefixTranslator {
    failing_languages: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl PrefixTranslator {
    pub fn failing_for(languages: &[&str]) -> Self {
        Self {
            failing_languages: languages.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_languages.contains(target_language) {
            return Err(TranslateError::ProviderError(format!(
                "unsupported target {target_language}"
            )));
        }
        Ok(format!("[{target_language}] {text}"))
    }
}

#[derive(Default)]
pub struct CountingSynthesizer {
    calls: AtomicU32,
    /// Calls answered with a rate-limit error before succeeding
    rate_limited_calls: u32,
    /// Always fail with a non-retryable error
    broken: bool,
}

impl CountingSynthesizer {
    pub fn rate_limited(times: u32) -> Self {
        Self {
            rate_limited_calls: times,
            ..Default::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Audio the mock synthesizer produces for `text`
pub fn fake_audio(text: &str) -> Bytes {
    Bytes::from(format!("mp3:{text}"))
}

#[async_trait]
impl SpeechSynthesizer for CountingSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(TTSError::ProviderError("invalid voice".to_string()));
        }
        if call < self.rate_limited_calls {
            return Err(TTSError::RateLimited("quota exceeded".to_string()));
        }
        Ok(fake_audio(&request.text))
    }

    fn get_provider_info(&self) -> &'static str {
        "counting"
    }
}

pub struct FixedBatchRecognizer {
    pub transcript: String,
}

#[async_trait]
impl BatchRecognizer for FixedBatchRecognizer {
    async fn transcribe(
        &self,
        _audio: Bytes,
        _language: &str,
        _content_type: Option<&str>,
    ) -> Result<String, STTError> {
        Ok(self.transcript.clone())
    }
}

/// Coordinator wired to the given mocks with no retry delay
pub fn coordinator_with(
    recognizer: Arc<ScriptedRecognizer>,
    translator: Arc<PrefixTranslator>,
    synthesizer: Arc<CountingSynthesizer>,
) -> RelayCoordinator {
    let synthesis = Arc::new(SynthesisService::new(
        synthesizer,
        100,
        RetryPolicy::new(1, Duration::from_millis(1)),
    ));

    RelayCoordinator::new(
        Arc::new(RoomRegistry::new()),
        RelayServices {
            recognizer,
            translator,
            synthesizer: synthesis,
        },
        SessionDefaults::default(),
    )
}

/// Receive the next message or panic after a generous timeout
pub async fn next_message(rx: &mut mpsc::Receiver<OutgoingMessage>) -> OutgoingMessage {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("outbound channel closed")
}

/// Collect messages until `STREAM_COMPLETE` (inclusive)
pub async fn until_complete(rx: &mut mpsc::Receiver<OutgoingMessage>) -> Vec<OutgoingMessage> {
    let mut received = Vec::new();
    loop {
        let message = next_message(rx).await;
        let done = message == OutgoingMessage::StreamComplete;
        received.push(message);
        if done {
            return received;
        }
    }
}

/// Everything already queued, without waiting
pub fn drain(rx: &mut mpsc::Receiver<OutgoingMessage>) -> Vec<OutgoingMessage> {
    let mut received = Vec::new();
    while let Ok(message) = rx.try_recv() {
        received.push(message);
    }
    received
}
