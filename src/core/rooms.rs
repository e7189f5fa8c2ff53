//! Room voice configuration directory.
//!
//! Room ids are UUIDs. Configurations live in memory for the lifetime of the
//! process.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub voice_model: Option<String>,
    #[serde(default)]
    pub voice_gender: Option<String>,
    #[serde(default)]
    pub voice_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomConfigError {
    #[error("Invalid room id: {0}")]
    InvalidRoomId(String),
}

#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: DashMap<Uuid, RoomConfig>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `config`, assigning a new id when none is given. An existing
    /// configuration with the same id is replaced.
    pub fn upsert(&self, mut config: RoomConfig) -> Result<RoomConfig, RoomConfigError> {
        let room_id = match config.room_id.trim() {
            "" => Uuid::new_v4(),
            raw => Uuid::parse_str(raw).map_err(|_| RoomConfigError::InvalidRoomId(raw.to_string()))?,
        };

        config.room_id = room_id.to_string();
        self.rooms.insert(room_id, config.clone());
        Ok(config)
    }

    /// Look up a configuration. Ids that are not UUIDs are never found.
    pub fn get(&self, room_id: &str) -> Option<RoomConfig> {
        let room_id = Uuid::parse_str(room_id.trim()).ok()?;
        self.rooms.get(&room_id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
