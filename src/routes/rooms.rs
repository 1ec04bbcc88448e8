//! routes/rooms.rs — HTTP side door for collaborators (catalog, uploads, health probes)
use axum::{
    routing::{get, post},
    extract::{Extension, Json, Path},
    http::StatusCode,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{not_found, AppResult},
    room::{display_name, RoomView},
    state::RoomRegistry,
};

#[derive(Deserialize)]
struct AddVideo {
    url:      String,
    nickname: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms/:room_id", get(room_view))
        .route("/rooms/:room_id/playlist", post(add_video))
}

async fn health(Extension(rooms): Extension<RoomRegistry>) -> Json<Value> {
    Json(json!({"status": "ok", "rooms": rooms.len().await}))
}

async fn room_view(
    Extension(rooms): Extension<RoomRegistry>,
    Path(room_id): Path<String>,
) -> AppResult<Json<RoomView>> {
    let h = rooms.get(&room_id).await.ok_or_else(|| not_found(&room_id))?;
    let room = h.lock().await;
    if room.is_closed() {
        return Err(not_found(&room_id));
    }
    Ok(Json(room.view()))
}

/* ---------------- resolved media url → playlist ---------------- */
async fn add_video(
    Extension(rooms): Extension<RoomRegistry>,
    Path(room_id): Path<String>,
    Json(p): Json<AddVideo>,
) -> AppResult<StatusCode> {
    let h = rooms.get(&room_id).await.ok_or_else(|| not_found(&room_id))?;
    {
        let mut room = h.lock().await;
        if room.is_closed() {
            return Err(not_found(&room_id));
        }
        room.queue(&display_name(p.nickname.as_deref()), &p.url)?;
    }
    tracing::info!(room = %room_id, url = %p.url, "video queued over http");
    Ok(StatusCode::ACCEPTED)
}
