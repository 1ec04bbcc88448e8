//! protocol.rs — JSON frames exchanged over `/ws`, tagged by `type`
use serde::{Deserialize, Serialize};

use crate::room::{ActionLogEntry, Participant, PlaybackSnapshot, VideoAction};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinRoom {
        room_id:  String,
        nickname: Option<String>,
        avatar:   Option<String>,
    },
    UpdateProfile {
        room_id:  String,
        nickname: Option<String>,
        avatar:   Option<String>,
    },
    AddToPlaylist {
        room_id: String,
        url:     String,
    },
    SetVideoIndex {
        room_id: String,
        index:   i64,
    },
    NextVideo {
        room_id: String,
    },
    VideoAction {
        room_id: String,
        action:  VideoAction,
        time:    f64,
        paused:  Option<bool>,
    },
    UpdateTime {
        room_id:        String,
        current_time:   f64,
        video_progress: f64,
        playing:        bool,
        seq:            Option<u64>,
    },
}

impl ClientEvent {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn room_id(&self) -> &str {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::UpdateProfile { room_id, .. }
            | Self::AddToPlaylist { room_id, .. }
            | Self::SetVideoIndex { room_id, .. }
            | Self::NextVideo { room_id }
            | Self::VideoAction { room_id, .. }
            | Self::UpdateTime { room_id, .. } => room_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. }      => "joinRoom",
            Self::UpdateProfile { .. } => "updateProfile",
            Self::AddToPlaylist { .. } => "addToPlaylist",
            Self::SetVideoIndex { .. } => "setVideoIndex",
            Self::NextVideo { .. }     => "nextVideo",
            Self::VideoAction { .. }   => "videoAction",
            Self::UpdateTime { .. }    => "updateTime",
        }
    }
}

/// Log payload: one appended entry, or the whole newest-first backlog on join.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogPayload {
    Entry(ActionLogEntry),
    Backlog(Vec<ActionLogEntry>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    RoomUsers {
        room_id: String,
        users:   Vec<Participant>,
    },
    RoomState {
        room_id: String,
        #[serde(flatten)]
        state:   PlaybackSnapshot,
    },
    VideoState {
        room_id: String,
        #[serde(flatten)]
        state:   PlaybackSnapshot,
    },
    PlaylistUpdate {
        room_id:       String,
        playlist:      Vec<String>,
        current_index: i64,
    },
    ActionLog {
        room_id: String,
        log:     LogPayload,
    },
}

impl ServerEvent {
    pub fn to_json(&self) -> String {
        // only plain strings, numbers and bools inside: serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
