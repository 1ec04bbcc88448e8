//! room — one shared watch session: playlist, player, roster and action log
mod log;
mod playback;
mod roster;

pub use log::{ActionKind, ActionLog, ActionLogEntry};
pub use playback::{Playback, PlaybackSnapshot, VideoAction};
pub use roster::{display_name, Participant, Roster, Telemetry, GUEST};

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    error::EventErr,
    protocol::{LogPayload, ServerEvent},
    state::Tx,
};

/// Everything a late joiner (or the HTTP API) needs to render the room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_id: String,
    #[serde(flatten)]
    pub state:   PlaybackSnapshot,
    pub users:   Vec<Participant>,
    pub log:     Vec<ActionLogEntry>,
}

/// Each mutating method runs with the room's lock held and pushes the
/// resulting frames into the members' outboxes before returning.
#[derive(Debug)]
pub struct Room {
    id:       String,
    playback: Playback,
    roster:   Roster,
    log:      ActionLog,
    sinks:    HashMap<String, Tx>,
    closed:   bool,
}

impl Room {
    pub fn new(id: impl Into<String>, log_capacity: usize) -> Self {
        Self {
            id:       id.into(),
            playback: Playback::default(),
            roster:   Roster::default(),
            log:      ActionLog::with_capacity(log_capacity),
            sinks:    HashMap::new(),
            closed:   false,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn playback(&self) -> &Playback { &self.playback }
    pub fn roster(&self) -> &Roster { &self.roster }
    pub fn log(&self) -> &ActionLog { &self.log }

    /// Set once the last member left; the registry drops it right after.
    pub fn is_closed(&self) -> bool { self.closed }

    pub fn view(&self) -> RoomView {
        RoomView {
            room_id: self.id.clone(),
            state:   self.playback.snapshot(),
            users:   self.roster.members().to_vec(),
            log:     self.log.entries(),
        }
    }

    pub fn join(&mut self, conn: &str, nickname: Option<&str>, avatar: Option<&str>, tx: Tx) {
        let name = self.roster.join(conn, nickname, avatar).nickname.clone();
        self.sinks.insert(conn.to_string(), tx);

        self.broadcast(&self.users_event());
        self.send_to(conn, &ServerEvent::RoomState { room_id: self.id.clone(), state: self.playback.snapshot() });
        self.send_to(conn, &ServerEvent::ActionLog { room_id: self.id.clone(), log: LogPayload::Backlog(self.log.entries()) });
        self.send_to(conn, &self.playlist_event());

        self.record(ActionKind::Join, &name, Some("joined the room".into()));
    }

    /// Returns `false` when `conn` was not a member. Closes the room when it empties.
    pub fn leave(&mut self, conn: &str) -> bool {
        self.sinks.remove(conn);
        if self.roster.leave(conn).is_none() {
            return false;
        }
        if self.roster.is_empty() {
            self.closed = true;
        } else {
            self.broadcast(&self.users_event());
        }
        true
    }

    pub fn update_profile(&mut self, conn: &str, nickname: Option<&str>, avatar: Option<&str>) -> Result<(), EventErr> {
        let name = self
            .roster
            .set_profile(conn, nickname, avatar)
            .ok_or_else(|| EventErr::NotJoined(self.id.clone()))?
            .nickname
            .clone();
        self.broadcast(&self.users_event());
        self.record(ActionKind::Profile, &name, Some("updated profile".into()));
        Ok(())
    }

    pub fn add_to_playlist(&mut self, conn: &str, url: &str) -> Result<(), EventErr> {
        let name = self.roster.nickname_of(conn);
        self.queue(&name, url)
    }

    /// Appends a resolved media url on behalf of `nickname`, member or not.
    pub fn queue(&mut self, nickname: &str, url: &str) -> Result<(), EventErr> {
        let url = url.trim();
        if url.is_empty() {
            return Err(EventErr::BlankUrl);
        }
        self.playback.push(url.to_string());
        self.broadcast(&self.playlist_event());
        self.record(ActionKind::AddToPlaylist, nickname, Some(url.to_string()));
        Ok(())
    }

    pub fn set_video_index(&mut self, conn: &str, index: i64) -> Result<(), EventErr> {
        self.playback.select(index)?;
        self.broadcast(&self.playlist_event());
        self.broadcast(&self.video_event());
        self.record(ActionKind::SetVideo, &self.roster.nickname_of(conn), Some(format!("index={index}")));
        Ok(())
    }

    pub fn next_video(&mut self, conn: &str) {
        self.playback.finish_current();
        self.broadcast(&self.playlist_event());
        self.broadcast(&self.video_event());
        self.record(ActionKind::RemoveVideo, &self.roster.nickname_of(conn), Some("finished video removed".into()));
    }

    pub fn video_action(&mut self, conn: &str, action: VideoAction, time: f64, paused: Option<bool>) -> Result<(), EventErr> {
        self.playback.apply(action, time, paused)?;
        self.broadcast(&self.video_event());
        let kind = match action {
            VideoAction::Play  => ActionKind::Play,
            VideoAction::Pause => ActionKind::Pause,
            VideoAction::Seek  => ActionKind::Seek,
        };
        self.record(kind, &self.roster.nickname_of(conn), Some(format!("time={time:.2}s")));
        Ok(())
    }

    pub fn update_time(&mut self, conn: &str, telemetry: Telemetry) -> Result<(), EventErr> {
        match self.roster.report(conn, telemetry) {
            None             => Err(EventErr::NotJoined(self.id.clone())),
            Some(Err(last))  => Err(EventErr::StaleSeq { seq: telemetry.seq.unwrap_or_default(), last }),
            Some(Ok(()))     => {
                self.broadcast(&self.users_event());
                Ok(())
            }
        }
    }

    fn record(&mut self, kind: ActionKind, nickname: &str, details: Option<String>) {
        let entry = ActionLogEntry::new(kind, nickname, details);
        self.log.push(entry.clone());
        self.broadcast(&ServerEvent::ActionLog { room_id: self.id.clone(), log: LogPayload::Entry(entry) });
    }

    fn users_event(&self) -> ServerEvent {
        ServerEvent::RoomUsers { room_id: self.id.clone(), users: self.roster.members().to_vec() }
    }

    fn playlist_event(&self) -> ServerEvent {
        ServerEvent::PlaylistUpdate {
            room_id:       self.id.clone(),
            playlist:      self.playback.playlist().to_vec(),
            current_index: self.playback.current_index(),
        }
    }

    fn video_event(&self) -> ServerEvent {
        ServerEvent::VideoState { room_id: self.id.clone(), state: self.playback.snapshot() }
    }

    /// Serializes once, then pushes into every member's outbox. A closed outbox
    /// means that connection is already on its way out through `leave`.
    fn broadcast(&self, ev: &ServerEvent) {
        let json = ev.to_json();
        for tx in self.sinks.values() {
            tx.send(json.clone()).ok();
        }
    }

    fn send_to(&self, conn: &str, ev: &ServerEvent) {
        if let Some(tx) = self.sinks.get(conn) {
            tx.send(ev.to_json()).ok();
        }
    }
}
