use axum::{http::StatusCode, response::IntoResponse};
use std::fmt::Display;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Bad request: {0}")]
    Bad(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config: {0}")]
    Config(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppErr {
    fn into_response(self) -> axum::response::Response {
        let (code, body) = match self {
            AppErr::Bad(msg)      => (StatusCode::BAD_REQUEST, msg),
            AppErr::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            other                 => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        (code, body).into_response()
    }
}

/* ── small helpers: turn any error into Bad / NotFound ── */
pub fn bad<E: Display>(e: E) -> AppErr { AppErr::Bad(e.to_string()) }
pub fn not_found<E: Display>(e: E) -> AppErr { AppErr::NotFound(e.to_string()) }

/// Why an inbound room event was dropped. Never sent back to the client.
#[derive(thiserror::Error, Debug)]
pub enum EventErr {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown room {0}")]
    UnknownRoom(String),

    #[error("connection is not a member of room {0}")]
    NotJoined(String),

    #[error("index {index} out of range for playlist of {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("no video selected")]
    NoVideo,

    #[error("invalid time {0}")]
    InvalidTime(f64),

    #[error("blank url")]
    BlankUrl,

    #[error("stale telemetry seq {seq} (last applied {last})")]
    StaleSeq { seq: u64, last: u64 },
}

impl From<EventErr> for AppErr {
    fn from(e: EventErr) -> Self {
        match e {
            EventErr::UnknownRoom(_) => not_found(e),
            other                    => bad(other),
        }
    }
}
