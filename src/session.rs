//! session.rs — one connection's view of the registry: dispatch, membership, cleanup
use std::collections::HashSet;

use crate::{
    error::EventErr,
    protocol::ClientEvent,
    room::{Room, Telemetry},
    state::{RoomRegistry, Tx},
};

pub struct Session {
    id:       String,
    tx:       Tx,
    registry: RoomRegistry,
    joined:   HashSet<String>,
}

impl Session {
    pub fn new(registry: RoomRegistry, tx: Tx) -> Self {
        Self { id: uuid::Uuid::new_v4().to_string(), tx, registry, joined: HashSet::new() }
    }

    pub fn id(&self) -> &str { &self.id }

    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.joined.iter().map(String::as_str)
    }

    /// Parses and applies one text frame. Rejected frames are logged and dropped.
    pub async fn handle_text(&mut self, raw: &str) {
        let res = match ClientEvent::parse(raw) {
            Ok(ev) => {
                let (name, room) = (ev.name(), ev.room_id().to_string());
                self.apply(ev).await.map_err(|e| (name, room, e))
            }
            Err(e) => Err(("?", String::new(), EventErr::from(e))),
        };
        if let Err((event, room, reason)) = res {
            tracing::debug!(conn = %self.id, room = %room, event, %reason, "event dropped");
        }
    }

    pub async fn apply(&mut self, ev: ClientEvent) -> Result<(), EventErr> {
        let conn = self.id.as_str();
        match ev {
            ClientEvent::JoinRoom { room_id, nickname, avatar } => {
                self.join(&room_id, nickname.as_deref(), avatar.as_deref()).await;
                Ok(())
            }
            ClientEvent::UpdateProfile { room_id, nickname, avatar } => {
                self.with_room(&room_id, |r| r.update_profile(conn, nickname.as_deref(), avatar.as_deref())).await
            }
            ClientEvent::AddToPlaylist { room_id, url } => {
                self.with_room(&room_id, |r| r.add_to_playlist(conn, &url)).await
            }
            ClientEvent::SetVideoIndex { room_id, index } => {
                self.with_room(&room_id, |r| r.set_video_index(conn, index)).await
            }
            ClientEvent::NextVideo { room_id } => {
                self.with_room(&room_id, |r| {
                    r.next_video(conn);
                    Ok(())
                })
                .await
            }
            ClientEvent::VideoAction { room_id, action, time, paused } => {
                self.with_room(&room_id, |r| r.video_action(conn, action, time, paused)).await
            }
            ClientEvent::UpdateTime { room_id, current_time, video_progress, playing, seq } => {
                let t = Telemetry { current_time, video_progress, playing, seq };
                self.with_room(&room_id, |r| r.update_time(conn, t)).await
            }
        }
    }

    pub async fn join(&mut self, room_id: &str, nickname: Option<&str>, avatar: Option<&str>) {
        loop {
            let h = self.registry.get_or_create(room_id).await;
            let mut room = h.lock().await;
            if room.is_closed() {
                // emptied between lookup and lock: clear it out and take a fresh one
                drop(room);
                self.registry.remove(room_id, &h).await;
                continue;
            }
            room.join(&self.id, nickname, avatar, self.tx.clone());
            tracing::info!(conn = %self.id, room = %room_id, members = room.roster().len(), "joined");
            break;
        }
        self.joined.insert(room_id.to_string());
    }

    pub async fn leave(&mut self, room_id: &str) {
        self.joined.remove(room_id);
        let Some(h) = self.registry.get(room_id).await else { return };
        let closed = {
            let mut room = h.lock().await;
            if !room.leave(&self.id) {
                return;
            }
            tracing::info!(conn = %self.id, room = %room_id, members = room.roster().len(), "left");
            room.is_closed()
        };
        if closed {
            self.registry.remove(room_id, &h).await;
        }
    }

    /// Leaves every joined room. Called once when the transport goes away.
    pub async fn disconnect(&mut self) {
        let rooms: Vec<String> = self.joined.iter().cloned().collect();
        for room_id in rooms {
            self.leave(&room_id).await;
        }
    }

    /// Runs one synchronous room handler under the room's lock. Rooms that
    /// are gone, or emptied while we waited for the lock, count as unknown.
    async fn with_room<T>(
        &self,
        room_id: &str,
        f: impl FnOnce(&mut Room) -> Result<T, EventErr>,
    ) -> Result<T, EventErr> {
        let unknown = || EventErr::UnknownRoom(room_id.to_string());
        let h = self.registry.get(room_id).await.ok_or_else(unknown)?;
        let mut room = h.lock().await;
        if room.is_closed() {
            return Err(unknown());
        }
        f(&mut *room)
    }
}
