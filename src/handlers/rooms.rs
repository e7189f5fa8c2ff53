use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;

use crate::core::rooms::RoomConfig;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Create a room configuration, or replace the one with the same id
pub async fn upsert_room(
    State(state): State<Arc<AppState>>,
    Json(config): Json<RoomConfig>,
) -> AppResult<Json<RoomConfig>> {
    let saved = state.room_directory.upsert(config)?;
    info!(
        room_id = %saved.room_id,
        voice_model = ?saved.voice_model,
        "Room configuration saved"
    );
    Ok(Json(saved))
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> AppResult<Json<RoomConfig>> {
    state
        .room_directory
        .get(&room_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Room not found: {room_id}")))
}
