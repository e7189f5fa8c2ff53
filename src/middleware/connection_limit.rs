//! Connection limit middleware for WebSocket connections
//!
//! This module provides middleware to enforce connection limits:
//! - Global maximum WebSocket connections
//! - Per-IP connection limits
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use voice_relay::middleware::connection_limit_middleware;
//!
//! let app = Router::new()
//!     .route("/ws/translate", get(relay_handler))
//!     .layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         connection_limit_middleware,
//!     ));
//! ```

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::state::{AppState, ConnectionLimitError};

/// Client address of an admitted WebSocket upgrade. The relay handler
/// releases the slot when the connection closes.
#[derive(Clone, Debug)]
pub struct ClientIp(pub IpAddr);

/// Admit or reject WebSocket upgrades against the global and per-IP limits.
///
/// Rejections answer 503 when the server is full and 429 when the client IP
/// holds too many connections. Plain HTTP requests pass through unchecked.
pub async fn connection_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let is_ws_upgrade = request
        .headers()
        .get("upgrade")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    if !is_ws_upgrade {
        return next.run(request).await;
    }

    let client_ip = addr.ip();

    match state.try_acquire_connection(client_ip) {
        Ok(()) => {
            request.extensions_mut().insert(ClientIp(client_ip));
            let response = next.run(request).await;
            // A failed upgrade never reaches the socket handler
            if response.status() != StatusCode::SWITCHING_PROTOCOLS {
                state.release_connection(client_ip);
            }
            response
        }
        Err(ConnectionLimitError::GlobalLimitReached) => {
            tracing::warn!(
                ip = %client_ip,
                "Rejecting connection: global limit reached"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Server at capacity. Please try again later.",
            )
                .into_response()
        }
        Err(ConnectionLimitError::PerIpLimitReached) => {
            tracing::warn!(
                ip = %client_ip,
                "Rejecting connection: per-IP limit reached"
            );
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many connections from your IP address.",
            )
                .into_response()
        }
    }
}
