//! Process-wide room membership.
//!
//! Rooms are created on first join and removed when their last member
//! leaves. Join and leave go through the `DashMap` entry API, which holds the
//! shard lock for that room for the whole check-and-mutate, so a room can
//! never be removed while another session is joining it. Fan-out works on a
//! snapshot of cloned session handles and holds no lock while delivering.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use uuid::Uuid;

use super::session::{Role, Session};

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, HashMap<Uuid, Arc<Session>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, session: Arc<Session>) {
        let room_id = session.room_id().to_string();
        let session_id = session.id();

        let mut members = self.rooms.entry(room_id.clone()).or_default();
        members.insert(session_id, session);
        debug!(
            room_id = %room_id,
            session_id = %session_id,
            members = members.len(),
            "Session joined room"
        );
    }

    /// Remove a session. The room is discarded once empty. Returns whether
    /// the session was a member.
    pub fn leave(&self, room_id: &str, session_id: Uuid) -> bool {
        let Entry::Occupied(mut room) = self.rooms.entry(room_id.to_string()) else {
            return false;
        };

        let removed = room.get_mut().remove(&session_id).is_some();
        if room.get().is_empty() {
            room.remove();
            debug!(room_id = %room_id, "Room discarded");
        }
        removed
    }

    /// Snapshot of a room's members
    pub fn members(&self, room_id: &str) -> Vec<Arc<Session>> {
        self.rooms
            .get(room_id)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the listeners in a room, excluding `exclude`
    pub fn listeners_excluding(&self, room_id: &str, exclude: Uuid) -> Vec<Arc<Session>> {
        self.rooms
            .get(room_id)
            .map(|room| {
                room.values()
                    .filter(|s| s.id() != exclude && s.role() == Role::Listener)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map(|room| room.len()).unwrap_or(0)
    }

    pub fn contains_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
