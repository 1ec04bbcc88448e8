use std::collections::VecDeque;

use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Join,
    Profile,
    Play,
    Pause,
    Seek,
    SetVideo,
    AddToPlaylist,
    RemoveVideo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionLogEntry {
    pub id:       String,
    #[serde(rename = "type")]
    pub kind:     ActionKind,
    pub nickname: String,
    pub time:     i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details:  Option<String>,
}

impl ActionLogEntry {
    pub fn new(kind: ActionKind, nickname: &str, details: Option<String>) -> Self {
        Self {
            id: nanoid::nanoid!(),
            kind,
            nickname: nickname.to_string(),
            time: Utc::now().timestamp_millis(),
            details,
        }
    }
}

/// Newest-first room history, capped so a long-lived room cannot grow it forever.
#[derive(Debug)]
pub struct ActionLog {
    entries:  VecDeque<ActionLogEntry>,
    capacity: usize,
}

impl ActionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity.min(64)), capacity }
    }

    pub fn push(&mut self, entry: ActionLogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> Vec<ActionLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
