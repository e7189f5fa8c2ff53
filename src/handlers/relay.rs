//! Relay WebSocket handler
//!
//! One connection is one session. Speakers send binary audio frames and an
//! `END_OF_AUDIO` text frame when they stop; they receive `TRANSCRIPT:` lines
//! and a final `STREAM_COMPLETE`. Listeners receive `TRANSLATION:` lines
//! followed by binary MP3 audio.

use axum::{
    Extension,
    extract::{
        RawQuery, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, info, warn};

use crate::core::relay::{Frame, OutgoingMessage, Session, SessionParams};
use crate::middleware::ClientIp;
use crate::state::AppState;

/// Per-connection outbound queue size
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (128 KB)
const MAX_WS_FRAME_SIZE: usize = 128 * 1024;

/// Maximum WebSocket message size (128 KB)
const MAX_WS_MESSAGE_SIZE: usize = 128 * 1024;

/// How long the writer gets to flush its close frame
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Relay WebSocket handler
///
/// Handshake query parameters: `roomId`, `role`, `source` (or `sourceLang`),
/// `target` (or `targetLang`), `voice`, `gender` and `prompt`. Missing values
/// take the configured defaults.
pub async fn relay_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    let params = SessionParams::from_query(query.as_deref(), state.coordinator.defaults());
    let client_ip = client_ip.map(|Extension(ip)| ip);

    debug!(
        room_id = %params.room_id,
        role = %params.role,
        "Relay WebSocket upgrade requested"
    );

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_relay_socket(socket, state, params, client_ip))
}

fn to_ws_message(message: OutgoingMessage) -> Message {
    match message.into_frame() {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(data) => Message::Binary(data),
    }
}

async fn handle_relay_socket(
    socket: WebSocket,
    app_state: Arc<AppState>,
    params: SessionParams,
    client_ip: Option<ClientIp>,
) {
    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<OutgoingMessage>(CHANNEL_BUFFER_SIZE);

    let coordinator = &app_state.coordinator;
    let session = coordinator.connect(params, message_tx);
    let session_id = session.id();

    let (close_tx, mut close_rx) = oneshot::channel::<()>();
    let ping_interval = app_state.config.ws_ping_interval();

    // Single writer per connection keeps frames whole and in order. Silent
    // peers are never closed; pings only keep the transport warm.
    let mut sender_task = tokio::spawn(async move {
        let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                message = message_rx.recv() => {
                    let Some(message) = message else { break };
                    if let Err(e) = sender.send(to_ws_message(message)).await {
                        debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                        return;
                    }
                }
                _ = ping.tick() => {
                    if let Err(e) = sender.send(Message::Ping(Bytes::new())).await {
                        debug!(session_id = %session_id, error = %e, "WebSocket ping failed");
                        return;
                    }
                }
                _ = &mut close_rx => break,
            }
        }

        // Sends our close frame, or flushes the reply to the client's
        if let Err(e) = sender.close().await {
            debug!(session_id = %session_id, error = %e, "WebSocket close failed");
        }
    });

    loop {
        match receiver.next().await {
            Some(Ok(msg)) => {
                if !process_relay_message(msg, &session, &app_state).await {
                    break;
                }
            }
            Some(Err(e)) => {
                warn!(session_id = %session_id, error = %e, "Relay WebSocket error");
                break;
            }
            None => {
                debug!(session_id = %session_id, "Relay WebSocket closed by client");
                break;
            }
        }
    }

    coordinator.disconnect(&session);
    let _ = close_tx.send(());
    if timeout(CLOSE_FLUSH_TIMEOUT, &mut sender_task).await.is_err() {
        debug!(session_id = %session_id, "WebSocket writer did not finish closing");
        sender_task.abort();
    }

    if let Some(ClientIp(ip)) = client_ip {
        app_state.release_connection(ip);
    }

    info!(session_id = %session_id, "Relay WebSocket connection terminated");
}

/// Handle one inbound frame. Returns false when the connection should close.
async fn process_relay_message(msg: Message, session: &Arc<Session>, app_state: &Arc<AppState>) -> bool {
    let coordinator = &app_state.coordinator;

    match msg {
        Message::Binary(data) => {
            if let Err(e) = coordinator.handle_audio(session, data) {
                warn!(session_id = %session.id(), error = %e, "Failed to forward audio");
            }
            true
        }
        Message::Text(text) => {
            coordinator.handle_text(session, text.as_str()).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            debug!(session_id = %session.id(), "Received close frame");
            false
        }
    }
}
