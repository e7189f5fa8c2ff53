//! Connection lifecycle and the transcript fan-out.
//!
//! A speaker's audio feeds one recognizer stream. Each final transcript is
//! echoed to the speaker and then handed to every listener in the room as an
//! independent unit of work (translate, synthesize, deliver). The speaker
//! receives `STREAM_COMPLETE` exactly once, after recognition has closed and
//! every unit spawned for it has finished, whether it succeeded or not.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::messages::{ControlSignal, OutgoingMessage};
use super::room::RoomRegistry;
use super::session::{Session, SessionDefaults, SessionParams};
use crate::core::stt::{
    RecognizerEvent, RecognizerSession, RecognizerStream, STTConfig, STTError, StreamingRecognizer,
};
use crate::core::translate::{TranslateError, Translator};
use crate::core::tts::{SynthesisRequest, SynthesisService, TTSError};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Recognition failed: {0}")]
    Recognition(#[from] STTError),
    #[error("Translation failed: {0}")]
    Translation(#[from] TranslateError),
    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] TTSError),
}

/// Capability providers the relay drives
#[derive(Clone)]
pub struct RelayServices {
    pub recognizer: Arc<dyn StreamingRecognizer>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<SynthesisService>,
}

#[derive(Clone)]
pub struct RelayCoordinator {
    rooms: Arc<RoomRegistry>,
    services: RelayServices,
    defaults: SessionDefaults,
}

impl RelayCoordinator {
    pub fn new(rooms: Arc<RoomRegistry>, services: RelayServices, defaults: SessionDefaults) -> Self {
        Self {
            rooms,
            services,
            defaults,
        }
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    /// Create a session for a new connection and register it in its room
    pub fn connect(
        &self,
        params: SessionParams,
        outbound: mpsc::Sender<OutgoingMessage>,
    ) -> Arc<Session> {
        let session = Session::new(params, outbound);
        info!(
            session_id = %session.id(),
            room_id = %session.room_id(),
            role = %session.role(),
            "Session connected"
        );
        self.rooms.join(session.clone());
        session
    }

    /// Feed an audio chunk from the connection. The first chunk from a
    /// speaker opens the recognizer stream; listener audio is dropped.
    pub fn handle_audio(&self, session: &Arc<Session>, chunk: Bytes) -> Result<(), RelayError> {
        if !session.is_speaker() {
            debug!(session_id = %session.id(), "Dropping audio from listener");
            return Ok(());
        }

        let stream = session.recognizer_or_try_init(|| self.open_recognizer(session))?;
        stream.send(chunk)?;
        Ok(())
    }

    /// Handle a text frame. Unknown input is logged and ignored.
    pub async fn handle_text(&self, session: &Arc<Session>, text: &str) {
        match ControlSignal::parse(text) {
            Some(ControlSignal::EndOfAudio) => self.end_of_audio(session).await,
            None => debug!(
                session_id = %session.id(),
                len = text.len(),
                "Ignoring unrecognized text frame"
            ),
        }
    }

    /// Close the recognizer input. Without an open stream the session is
    /// immediately eligible for completion.
    pub async fn end_of_audio(&self, session: &Arc<Session>) {
        if !session.is_speaker() {
            debug!(session_id = %session.id(), "Ignoring end of audio from listener");
            return;
        }

        match session.recognizer() {
            Some(stream) => {
                if stream.close_send() {
                    debug!(session_id = %session.id(), "Recognizer input closed");
                }
            }
            None => {
                debug!(session_id = %session.id(), "End of audio without a recognizer stream");
                if session.completion().close_recognition() {
                    self.emit_stream_complete(session).await;
                }
            }
        }
    }

    /// Tear down a closed connection. In-flight fan-out units keep running.
    pub fn disconnect(&self, session: &Arc<Session>) {
        session.mark_closed();
        self.rooms.leave(session.room_id(), session.id());
        if let Some(stream) = session.recognizer() {
            stream.close_send();
        }
        info!(
            session_id = %session.id(),
            room_id = %session.room_id(),
            role = %session.role(),
            pending = session.completion().pending(),
            "Session disconnected"
        );
    }

    fn open_recognizer(&self, session: &Arc<Session>) -> Result<RecognizerStream, STTError> {
        let config = STTConfig::for_language(&session.params().source_language);
        let RecognizerSession { stream, events } = self.services.recognizer.open(config)?;

        info!(
            session_id = %session.id(),
            provider = self.services.recognizer.get_provider_info(),
            "Recognizer stream opened"
        );

        let coordinator = self.clone();
        let speaker = session.clone();
        tokio::spawn(async move { coordinator.run_recognition(speaker, events).await });

        Ok(stream)
    }

    /// Consume one speaker's recognizer events in order
    async fn run_recognition(self, speaker: Arc<Session>, mut events: mpsc::Receiver<RecognizerEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                RecognizerEvent::Transcript(result) => {
                    if result.is_final && !result.transcript.trim().is_empty() {
                        self.dispatch_transcript(&speaker, result.transcript).await;
                    }
                }
                RecognizerEvent::Complete => {
                    debug!(session_id = %speaker.id(), "Recognition complete");
                    break;
                }
                RecognizerEvent::Error(e) => {
                    warn!(session_id = %speaker.id(), error = %e, "Recognition failed");
                    break;
                }
            }
        }

        if speaker.completion().close_recognition() {
            self.emit_stream_complete(&speaker).await;
        }
    }

    async fn dispatch_transcript(&self, speaker: &Arc<Session>, transcript: String) {
        info!(
            session_id = %speaker.id(),
            room_id = %speaker.room_id(),
            "Final transcript"
        );
        speaker
            .deliver(OutgoingMessage::Transcript(transcript.clone()))
            .await;

        let listeners = self.rooms.listeners_excluding(speaker.room_id(), speaker.id());
        debug!(
            session_id = %speaker.id(),
            listeners = listeners.len(),
            "Fanning out transcript"
        );

        for listener in listeners {
            speaker.completion().begin_unit();

            let coordinator = self.clone();
            let speaker = speaker.clone();
            let transcript = transcript.clone();
            tokio::spawn(async move {
                let outcome = AssertUnwindSafe(coordinator.run_listener_unit(&listener, &transcript))
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(
                        speaker_id = %speaker.id(),
                        listener_id = %listener.id(),
                        error = %e,
                        "Listener pipeline failed"
                    ),
                    Err(_) => error!(
                        speaker_id = %speaker.id(),
                        listener_id = %listener.id(),
                        "Listener pipeline panicked"
                    ),
                }

                if speaker.completion().finish_unit() {
                    coordinator.emit_stream_complete(&speaker).await;
                }
            });
        }
    }

    /// Translate, synthesize and deliver one transcript to one listener
    async fn run_listener_unit(&self, listener: &Session, transcript: &str) -> Result<(), RelayError> {
        let params = listener.params();
        let translated = self
            .services
            .translator
            .translate(transcript, &params.target_language)
            .await?;

        let synthesized = self
            .services
            .synthesizer
            .synthesize(SynthesisRequest::new(
                translated.clone(),
                params.target_language.clone(),
                params.voice_model.clone(),
                params.voice_gender.clone(),
                params.voice_prompt.clone(),
            ))
            .await;

        match synthesized {
            Ok(audio) => {
                listener
                    .deliver_all([
                        OutgoingMessage::Translation(translated),
                        OutgoingMessage::Audio(audio),
                    ])
                    .await;
                Ok(())
            }
            Err(e) => {
                // The text still reaches the listener without its audio
                listener
                    .deliver(OutgoingMessage::Translation(translated))
                    .await;
                Err(e.into())
            }
        }
    }

    async fn emit_stream_complete(&self, speaker: &Session) {
        if speaker.deliver(OutgoingMessage::StreamComplete).await {
            info!(session_id = %speaker.id(), "Stream complete");
        }
    }
}
