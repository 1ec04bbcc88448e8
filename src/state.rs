use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::{config::DEFAULT_LOG_CAPACITY, room::Room};

/// Outbox of one connection; frames are pre-serialized JSON.
pub type Tx = mpsc::UnboundedSender<String>;

/* ------------ room registry ------------ */
pub type RoomHandle = Arc<Mutex<Room>>;

/// Owns every live room. Cloning shares the same map.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms:        Arc<RwLock<HashMap<String, RoomHandle>>>,
    log_capacity: usize,
}

impl Default for RoomRegistry {
    fn default() -> Self { Self::new(DEFAULT_LOG_CAPACITY) }
}

impl RoomRegistry {
    pub fn new(log_capacity: usize) -> Self {
        Self { rooms: Arc::default(), log_capacity }
    }

    /// Existing room, or a fresh empty one. The handle may be closed if the
    /// last member left in between; callers that join must check `is_closed`.
    pub async fn get_or_create(&self, room_id: &str) -> RoomHandle {
        if let Some(h) = self.rooms.read().await.get(room_id) {
            return h.clone();
        }
        let mut m = self.rooms.write().await;
        m.entry(room_id.to_string())
            .or_insert_with(|| {
                tracing::info!(room = %room_id, "room created");
                Arc::new(Mutex::new(Room::new(room_id, self.log_capacity)))
            })
            .clone()
    }

    pub async fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Drops `room_id` only if it still maps to `handle`, so a room created
    /// under the same id afterwards is never removed by a stale caller.
    pub async fn remove(&self, room_id: &str, handle: &RoomHandle) -> bool {
        let mut m = self.rooms.write().await;
        match m.get(room_id) {
            Some(cur) if Arc::ptr_eq(cur, handle) => {
                m.remove(room_id);
                tracing::info!(room = %room_id, "room destroyed");
                true
            }
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}
