//! Per-connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use uuid::Uuid;

use super::completion::CompletionTracker;
use super::messages::OutgoingMessage;
use crate::core::stt::{RecognizerStream, STTError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Speaker,
    Listener,
}

impl Role {
    /// Anything other than `listener` is a speaker
    pub fn from_param(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("listener") {
            Role::Listener
        } else {
            Role::Speaker
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Speaker => "speaker",
            Role::Listener => "listener",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values used when the handshake omits a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDefaults {
    pub room_id: String,
    pub source_language: String,
    pub target_language: String,
    pub voice_model: String,
    pub voice_gender: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            room_id: "default".to_string(),
            source_language: "en-US".to_string(),
            target_language: "es-ES".to_string(),
            voice_model: "Standard".to_string(),
            voice_gender: "NEUTRAL".to_string(),
        }
    }
}

/// Parameters fixed at connection time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub role: Role,
    pub room_id: String,
    pub source_language: String,
    pub target_language: String,
    pub voice_model: String,
    pub voice_gender: String,
    pub voice_prompt: String,
}

impl SessionParams {
    pub fn from_defaults(role: Role, defaults: &SessionDefaults) -> Self {
        Self {
            role,
            room_id: defaults.room_id.clone(),
            source_language: defaults.source_language.clone(),
            target_language: defaults.target_language.clone(),
            voice_model: defaults.voice_model.clone(),
            voice_gender: defaults.voice_gender.clone(),
            voice_prompt: String::new(),
        }
    }

    /// Parse the handshake query string. Values are percent-decoded; unknown
    /// keys are ignored and empty values fall back to `defaults`.
    pub fn from_query(query: Option<&str>, defaults: &SessionDefaults) -> Self {
        let mut params = Self::from_defaults(Role::Speaker, defaults);
        let Some(query) = query else {
            return params;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "prompt" {
                params.voice_prompt = value.into_owned();
                continue;
            }

            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "role" => params.role = Role::from_param(value),
                "roomId" => params.room_id = value.to_string(),
                "source" | "sourceLang" => params.source_language = value.to_string(),
                "target" | "targetLang" => params.target_language = value.to_string(),
                "voice" => params.voice_model = value.to_string(),
                "gender" => params.voice_gender = value.to_string(),
                _ => {}
            }
        }

        params
    }
}

/// One live connection
pub struct Session {
    id: Uuid,
    params: SessionParams,
    outbound: mpsc::Sender<OutgoingMessage>,
    recognizer: OnceCell<RecognizerStream>,
    completion: CompletionTracker,
    closed: AtomicBool,
    /// Held while queueing, so a group of messages stays contiguous
    delivery: Mutex<()>,
}

impl Session {
    pub fn new(params: SessionParams, outbound: mpsc::Sender<OutgoingMessage>) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            params,
            outbound,
            recognizer: OnceCell::new(),
            completion: CompletionTracker::new(),
            closed: AtomicBool::new(false),
            delivery: Mutex::new(()),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn role(&self) -> Role {
        self.params.role
    }

    pub fn room_id(&self) -> &str {
        &self.params.room_id
    }

    pub fn is_speaker(&self) -> bool {
        self.params.role == Role::Speaker
    }

    pub fn completion(&self) -> &CompletionTracker {
        &self.completion
    }

    /// The recognizer stream, if one was opened
    pub fn recognizer(&self) -> Option<&RecognizerStream> {
        self.recognizer.get()
    }

    /// Return the recognizer stream, opening it with `open` on first use.
    /// `open` runs at most once per session.
    pub fn recognizer_or_try_init<F>(&self, open: F) -> Result<&RecognizerStream, STTError>
    where
        F: FnOnce() -> Result<RecognizerStream, STTError>,
    {
        self.recognizer.get_or_try_init(open)
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Queue a message for this connection's writer. Returns false when the
    /// connection is gone and the message was discarded.
    pub async fn deliver(&self, message: OutgoingMessage) -> bool {
        let _guard = self.delivery.lock().await;
        self.enqueue(message).await
    }

    /// Queue several messages back to back; nothing delivered concurrently
    /// lands between them. Stops at the first discarded message.
    pub async fn deliver_all(&self, messages: impl IntoIterator<Item = OutgoingMessage>) -> bool {
        let _guard = self.delivery.lock().await;
        for message in messages {
            if !self.enqueue(message).await {
                return false;
            }
        }
        true
    }

    async fn enqueue(&self, message: OutgoingMessage) -> bool {
        if self.is_closed() {
            debug!(
                session_id = %self.id,
                kind = message.kind(),
                "Discarding message for closed session"
            );
            return false;
        }

        let kind = message.kind();
        if self.outbound.send(message).await.is_err() {
            debug!(session_id = %self.id, kind, "Discarding message, writer has stopped");
            return false;
        }
        true
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("role", &self.params.role)
            .field("room_id", &self.params.room_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
