use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, rooms, translate};
use crate::state::AppState;
use std::sync::Arc;

/// REST routes: health, room configuration and batch translation
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/api/rooms", post(rooms::upsert_room))
        .route("/api/rooms/{room_id}", get(rooms::get_room))
        .route("/api/translate", post(translate::translate_upload))
        .layer(TraceLayer::new_for_http())
}
