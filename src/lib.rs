//! Lock-step shared video rooms over WebSocket.
//! The binary lives in main.rs; the library is what integration tests mount.

pub mod config;
pub mod error;
pub mod protocol;
pub mod room;
pub mod routes;
pub mod session;
pub mod state;

use axum::{Extension, Router};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};

use crate::{config::Config, state::RoomRegistry};

const BODY_LIMIT: usize = 1024 * 1024;

/// Full application: `/api`, `/ws`, and the static client as fallback.
pub fn app(cfg: Config, rooms: RoomRegistry) -> Router {
    Router::new()
        .merge(routes::router())
        .fallback_service(ServeDir::new(&cfg.static_dir))
        .layer(Extension(rooms))
        .layer(Extension(cfg))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
}
