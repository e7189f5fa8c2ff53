use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::relay::relay_handler;
use crate::state::AppState;

/// Create the relay WebSocket router
///
/// Connection limits are applied in main.rs once state is available.
pub fn create_relay_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/translate", get(relay_handler))
        .layer(TraceLayer::new_for_http())
}
