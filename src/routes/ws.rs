use axum::{
    Router, routing::get, Extension,
    extract::ws::{WebSocketUpgrade, WebSocket, Message},
    response::IntoResponse,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::{sync::mpsc, time};
use crate::{config::Config, session::Session, state::RoomRegistry};

pub fn router() -> Router {
    Router::new().route("/", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(cfg): Extension<Config>,
    Extension(rooms): Extension<RoomRegistry>,
) -> impl IntoResponse {
    ws.on_upgrade(move |s| user_ws(s, rooms, cfg))
}

/* ---------------- per connection ---------------- */
async fn user_ws(sock: WebSocket, rooms: RoomRegistry, cfg: Config) {
    let (sink, mut stream) = sock.split();
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let mut session = Session::new(rooms, tx);
    tracing::info!(conn = %session.id(), "connected");

    let writer = tokio::spawn(writer_task(sink, rx, cfg.ping_interval));

    /* events, strictly in receipt order */
    loop {
        let frame = match time::timeout(cfg.idle_timeout, stream.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                tracing::warn!(conn = %session.id(), error = %e, "receive error");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                tracing::info!(conn = %session.id(), "idle timeout");
                break;
            }
        };
        match frame {
            Message::Text(raw) => session.handle_text(&raw).await,
            Message::Close(_)  => break,
            Message::Binary(_) => tracing::debug!(conn = %session.id(), "binary frame ignored"),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    /* leave every room before anything else can touch them */
    session.disconnect().await;
    writer.abort();
    tracing::info!(conn = %session.id(), "disconnected");
}

/// Drains the outbox into the socket and keeps the link alive with pings.
async fn writer_task(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<String>,
    ping_every: time::Duration,
) {
    let mut ping = time::interval(ping_every);
    ping.tick().await;
    loop {
        let msg = tokio::select! {
            out = rx.recv() => match out {
                Some(json) => Message::Text(json),
                None       => break,
            },
            _ = ping.tick() => Message::Ping(Vec::new()),
        };
        if sink.send(msg).await.is_err() {
            break;
        }
    }
}
