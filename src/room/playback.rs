use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::EventErr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoAction {
    Play,
    Pause,
    Seek,
}

/// Broadcast form of a room's playlist and player state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub playlist:      Vec<String>,
    pub current_index: i64,
    pub paused:        bool,
    pub time:          f64,
    pub updated_at:    i64,
}

/// Playlist plus authoritative player state.
///
/// `current` is `None` exactly when `items` is empty, and an empty playlist
/// is always paused.
#[derive(Debug, Clone)]
pub struct Playback {
    items:      Vec<String>,
    current:    Option<usize>,
    paused:     bool,
    time:       f64,
    updated_at: i64,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            items:      Vec::new(),
            current:    None,
            paused:     true,
            time:       0.0,
            updated_at: Utc::now().timestamp_millis(),
        }
    }
}

impl Playback {
    pub fn playlist(&self) -> &[String] { &self.items }
    pub fn current(&self) -> Option<usize> { self.current }
    pub fn paused(&self) -> bool { self.paused }
    pub fn time(&self) -> f64 { self.time }

    pub fn current_index(&self) -> i64 {
        self.current.map_or(-1, |i| i as i64)
    }

    /// Appends a url; the first video of an idle room gets selected but not started.
    pub fn push(&mut self, url: String) {
        self.items.push(url);
        if self.current.is_none() {
            self.current = Some(self.items.len() - 1);
            self.time    = 0.0;
        }
        self.touch();
    }

    pub fn select(&mut self, index: i64) -> Result<(), EventErr> {
        let len = self.items.len();
        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(EventErr::IndexOutOfRange { index, len })?;
        self.current = Some(slot);
        self.paused  = false;
        self.time    = 0.0;
        self.touch();
        Ok(())
    }

    /// Drops the video that just finished and autoplays whatever now sits in its slot.
    pub fn finish_current(&mut self) {
        if let Some(i) = self.current.filter(|&i| i < self.items.len()) {
            self.items.remove(i);
        }
        if self.items.is_empty() {
            self.current = None;
            self.paused  = true;
        } else {
            let last = self.items.len() - 1;
            self.current = Some(self.current.map_or(0, |i| i.min(last)));
            self.paused  = false;
        }
        self.time = 0.0;
        self.touch();
    }

    /// Applies a client's player event. An explicit `paused` wins over the action.
    /// Only a seek may move `time` backwards; nothing may unpause an empty playlist.
    pub fn apply(&mut self, action: VideoAction, time: f64, paused: Option<bool>) -> Result<(), EventErr> {
        if !time.is_finite() {
            return Err(EventErr::InvalidTime(time));
        }
        let next_paused = paused.unwrap_or(match action {
            VideoAction::Play  => false,
            VideoAction::Pause => true,
            VideoAction::Seek  => self.paused,
        });
        if self.current.is_none() && !next_paused {
            return Err(EventErr::NoVideo);
        }
        let reported = time.max(0.0);
        self.time = match action {
            VideoAction::Seek => reported,
            _                 => self.time.max(reported),
        };
        self.paused = next_paused;
        self.touch();
        Ok(())
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            playlist:      self.items.clone(),
            current_index: self.current_index(),
            paused:        self.paused,
            time:          self.time,
            updated_at:    self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().timestamp_millis();
    }
}
