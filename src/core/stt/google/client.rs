//! Google Speech-to-Text v1 over gRPC.
//!
//! [`GoogleStreamingRecognizer`] runs one `StreamingRecognize` call per opened
//! stream on its own task. The first request carries the streaming
//! configuration; every following request carries one audio chunk taken from
//! the [`RecognizerStream`] buffer. When the send side is closed the request
//! stream ends, Google flushes its remaining results and the response stream
//! terminates, which is reported as [`RecognizerEvent::Complete`].
//!
//! [`GoogleBatchRecognizer`] performs a unary `Recognize` call for complete
//! uploads.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use google_api_proto::google::cloud::speech::v1::{
    RecognitionAudio, RecognizeRequest, StreamingRecognitionConfig, StreamingRecognizeRequest,
    StreamingRecognizeResponse, recognition_audio::AudioSource, speech_client::SpeechClient,
    streaming_recognize_request::StreamingRequest,
};
use tokio::sync::mpsc;
use tonic::Status;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info};

use super::config::{GoogleSTTConfig, batch_config, streaming_config};
use crate::core::providers::google::TokenProvider;
use crate::core::stt::base::{
    BatchRecognizer, EVENT_CHANNEL_BUFFER, RecognizerEvent, RecognizerSession, RecognizerStream,
    STTConfig, STTError, STTResult, StreamingRecognizer,
};

/// Open a TLS channel to the Speech endpoint
async fn connect_channel(config: &GoogleSTTConfig) -> Result<Channel, STTError> {
    let domain = config.domain().ok_or_else(|| {
        STTError::ConfigurationError(format!("Invalid speech endpoint: {}", config.endpoint))
    })?;

    let channel = Endpoint::from_shared(config.endpoint.clone())
        .map_err(|e| STTError::ConfigurationError(format!("Invalid speech endpoint: {e}")))?
        .tls_config(ClientTlsConfig::new().domain_name(domain))
        .map_err(|e| STTError::ConfigurationError(format!("TLS config error: {e}")))?
        .connect_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect()
        .await
        .map_err(|e| STTError::ConnectionFailed(format!("gRPC connection failed: {e}")))?;

    debug!(endpoint = %config.endpoint, "Connected to Google Speech endpoint");
    Ok(channel)
}

/// Build the `authorization` metadata value
async fn bearer_metadata(auth: &dyn TokenProvider) -> Result<AsciiMetadataValue, STTError> {
    let token = auth
        .get_token()
        .await
        .map_err(|e| STTError::AuthenticationFailed(e.to_string()))?;

    format!("Bearer {token}")
        .parse()
        .map_err(|_| STTError::AuthenticationFailed("Invalid access token".to_string()))
}

/// Convert a gRPC status into a recognizer error
pub fn grpc_status_to_stt_error(status: Status) -> STTError {
    let code = status.code();
    let message = status.message().to_string();

    match code {
        tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
            STTError::AuthenticationFailed(format!("{code:?}: {message}"))
        }
        tonic::Code::Unavailable => {
            STTError::ConnectionFailed(format!("Service unavailable: {message}"))
        }
        tonic::Code::InvalidArgument => {
            STTError::ConfigurationError(format!("Invalid argument: {message}"))
        }
        tonic::Code::DeadlineExceeded => {
            STTError::NetworkError(format!("Request timed out: {message}"))
        }
        _ => STTError::ProviderError(format!("gRPC error {code:?}: {message}")),
    }
}

/// Streaming recognizer backed by Google Speech-to-Text
pub struct GoogleStreamingRecognizer {
    config: GoogleSTTConfig,
    auth: Arc<dyn TokenProvider>,
}

impl GoogleStreamingRecognizer {
    pub fn new(config: GoogleSTTConfig, auth: Arc<dyn TokenProvider>) -> Self {
        Self { config, auth }
    }
}

impl StreamingRecognizer for GoogleStreamingRecognizer {
    fn open(&self, config: STTConfig) -> Result<RecognizerSession, STTError> {
        let (stream, audio_rx) = RecognizerStream::channel();
        let (event_tx, events) = mpsc::channel(EVENT_CHANNEL_BUFFER);

        let endpoint = self.config.clone();
        let auth = self.auth.clone();
        let request_config = streaming_config(&config);
        let language = config.language;

        tokio::spawn(async move {
            let outcome =
                run_streaming_recognize(&endpoint, auth, request_config, audio_rx, &event_tx).await;

            let terminal = match outcome {
                Ok(()) => {
                    info!(language = %language, "Google recognition stream completed");
                    RecognizerEvent::Complete
                }
                Err(e) => {
                    debug!(language = %language, error = %e, "Google recognition stream failed");
                    RecognizerEvent::Error(e)
                }
            };
            // Consumer may already be gone
            let _ = event_tx.send(terminal).await;
        });

        Ok(RecognizerSession { stream, events })
    }

    fn get_provider_info(&self) -> &'static str {
        "Google Cloud Speech-to-Text v1 (streaming)"
    }
}

async fn run_streaming_recognize(
    endpoint: &GoogleSTTConfig,
    auth: Arc<dyn TokenProvider>,
    request_config: StreamingRecognitionConfig,
    audio_rx: mpsc::UnboundedReceiver<Bytes>,
    event_tx: &mpsc::Sender<RecognizerEvent>,
) -> Result<(), STTError> {
    let authorization = bearer_metadata(auth.as_ref()).await?;
    let channel = connect_channel(endpoint).await?;
    let mut client = SpeechClient::new(channel);

    let mut request = tonic::Request::new(streaming_requests(request_config, audio_rx));
    request.metadata_mut().insert("authorization", authorization);

    let responses = client
        .streaming_recognize(request)
        .await
        .map_err(grpc_status_to_stt_error)?
        .into_inner();

    forward_responses(responses, event_tx).await
}

/// Request stream for one `StreamingRecognize` call: the configuration, then
/// one request per buffered chunk until the send side closes.
fn streaming_requests(
    request_config: StreamingRecognitionConfig,
    mut audio_rx: mpsc::UnboundedReceiver<Bytes>,
) -> impl Stream<Item = StreamingRecognizeRequest> + Send + 'static {
    async_stream::stream! {
        yield StreamingRecognizeRequest {
            streaming_request: Some(StreamingRequest::StreamingConfig(request_config)),
        };
        while let Some(chunk) = audio_rx.recv().await {
            yield StreamingRecognizeRequest {
                streaming_request: Some(StreamingRequest::AudioContent(chunk.into())),
            };
        }
    }
}

/// Turn recognition responses into recognizer events until the response
/// stream ends or the consumer goes away.
async fn forward_responses<S>(
    responses: S,
    event_tx: &mpsc::Sender<RecognizerEvent>,
) -> Result<(), STTError>
where
    S: Stream<Item = Result<StreamingRecognizeResponse, Status>>,
{
    let mut responses = std::pin::pin!(responses);

    while let Some(response) = responses.next().await {
        let response = response.map_err(grpc_status_to_stt_error)?;
        if let Some(status) = response.error
            && status.code != 0
        {
            return Err(STTError::ProviderError(format!(
                "Recognition error {}: {}",
                status.code, status.message
            )));
        }

        for result in response.results {
            let Some(alternative) = result.alternatives.into_iter().next() else {
                continue;
            };
            if alternative.transcript.trim().is_empty() {
                continue;
            }

            debug!(
                is_final = result.is_final,
                confidence = alternative.confidence,
                "Received transcript"
            );
            let event = RecognizerEvent::Transcript(STTResult::new(
                alternative.transcript,
                result.is_final,
                alternative.confidence,
            ));
            if event_tx.send(event).await.is_err() {
                debug!("Recognizer event consumer dropped");
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Unary recognizer for complete uploads
pub struct GoogleBatchRecognizer {
    config: GoogleSTTConfig,
    auth: Arc<dyn TokenProvider>,
}

impl GoogleBatchRecognizer {
    pub fn new(config: GoogleSTTConfig, auth: Arc<dyn TokenProvider>) -> Self {
        Self { config, auth }
    }
}

#[async_trait]
impl BatchRecognizer for GoogleBatchRecognizer {
    async fn transcribe(
        &self,
        audio: Bytes,
        language: &str,
        content_type: Option<&str>,
    ) -> Result<String, STTError> {
        if audio.is_empty() {
            return Err(STTError::AudioProcessingError(
                "Audio payload is empty".to_string(),
            ));
        }

        let authorization = bearer_metadata(self.auth.as_ref()).await?;
        let channel = connect_channel(&self.config).await?;
        let mut client = SpeechClient::new(channel);

        let mut request = tonic::Request::new(RecognizeRequest {
            config: Some(batch_config(language, content_type)),
            audio: Some(RecognitionAudio {
                audio_source: Some(AudioSource::Content(audio.into())),
            }),
        });
        request.metadata_mut().insert("authorization", authorization);

        let response = client
            .recognize(request)
            .await
            .map_err(grpc_status_to_stt_error)?
            .into_inner();

        let transcript = response
            .results
            .into_iter()
            .filter_map(|result| result.alternatives.into_iter().next())
            .map(|alternative| alternative.transcript)
            .collect::<Vec<_>>()
            .join(" ");

        debug!(
            language = %language,
            chars = transcript.len(),
            "Batch recognition finished"
        );
        Ok(transcript.trim().to_string())
    }
}
