//! End-to-end: real axum server on a random port, tokio-tungstenite clients.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::{net::SocketAddr, time::Duration};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use watch_sync::{config::Config, state::RoomRegistry};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start(cfg: Config) -> (SocketAddr, RoomRegistry) {
    let rooms = RoomRegistry::new(cfg.log_capacity);
    let app = watch_sync::app(cfg, rooms.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    (addr, rooms)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn send(ws: &mut Client, v: Value) {
    ws.send(Message::Text(v.to_string())).await.unwrap();
}

/// Next frame of the given type, skipping anything else.
async fn expect(ws: &mut Client, ty: &str) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {ty}"))
            .expect("stream ended")
            .unwrap();
        if let Message::Text(raw) = msg {
            let v: Value = serde_json::from_str(&raw).unwrap();
            if v["type"] == ty {
                return v;
            }
        }
    }
}

/// Asserts nothing of type `ty` arrives within a short window.
async fn expect_none(ws: &mut Client, ty: &str) {
    let deadline = tokio::time::sleep(Duration::from_millis(300));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => return,
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(raw))) => {
                    let v: Value = serde_json::from_str(&raw).unwrap();
                    assert_ne!(v["type"], ty, "unexpected {v}");
                }
                Some(Ok(_)) => {}
                _ => return,
            },
        }
    }
}

async fn join(ws: &mut Client, room: &str, name: &str) {
    send(ws, json!({"type":"joinRoom","roomId":room,"nickname":name})).await;
    expect(ws, "playlistUpdate").await;
}

fn users(frame: &Value) -> Vec<(String, bool)> {
    frame["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| (u["nickname"].as_str().unwrap().to_string(), u["isOwner"].as_bool().unwrap()))
        .collect()
}

#[tokio::test]
async fn joiners_see_roster_with_single_owner() {
    let (addr, _) = start(Config::default()).await;
    let mut alice = connect(addr).await;
    send(&mut alice, json!({"type":"joinRoom","roomId":"r1","nickname":"Alice"})).await;
    let first = expect(&mut alice, "roomUsers").await;
    assert_eq!(users(&first), [("Alice".to_string(), true)]);
    let state = expect(&mut alice, "roomState").await;
    assert_eq!(state["currentIndex"], -1);
    assert_eq!(state["paused"], true);

    let mut bob = connect(addr).await;
    send(&mut bob, json!({"type":"joinRoom","roomId":"r1","nickname":"Bob"})).await;
    let seen_by_alice = expect(&mut alice, "roomUsers").await;
    assert_eq!(users(&seen_by_alice), [("Alice".to_string(), true), ("Bob".to_string(), false)]);

    let backlog = expect(&mut bob, "actionLog").await;
    assert_eq!(backlog["log"][0]["type"], "join");
    assert_eq!(backlog["log"][0]["nickname"], "Alice");
}

#[tokio::test]
async fn playlist_and_playback_are_broadcast() {
    let (addr, _) = start(Config::default()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, "r1", "Alice").await;
    join(&mut bob, "r1", "Bob").await;

    send(&mut alice, json!({"type":"addToPlaylist","roomId":"r1","url":"v1.mp4"})).await;
    let up = expect(&mut bob, "playlistUpdate").await;
    assert_eq!(up["playlist"], json!(["v1.mp4"]));
    assert_eq!(up["currentIndex"], 0);

    send(&mut alice, json!({"type":"addToPlaylist","roomId":"r1","url":"v2.mp4"})).await;
    expect(&mut bob, "playlistUpdate").await;

    send(&mut bob, json!({"type":"videoAction","roomId":"r1","action":"seek","time":42.5})).await;
    let st = expect(&mut alice, "videoState").await;
    assert_eq!(st["time"], 42.5);
    assert_eq!(st["paused"], true);
    // the sender gets its own echo too
    let echo = expect(&mut bob, "videoState").await;
    assert_eq!(echo["time"], 42.5);

    send(&mut bob, json!({"type":"videoAction","roomId":"r1","action":"play","time":3.0})).await;
    let st = expect(&mut alice, "videoState").await;
    assert_eq!(st["paused"], false);
    assert_eq!(st["time"], 42.5);
    expect(&mut bob, "videoState").await;

    send(&mut alice, json!({"type":"nextVideo","roomId":"r1"})).await;
    let st = expect(&mut bob, "videoState").await;
    assert_eq!(st["playlist"], json!(["v2.mp4"]));
    assert_eq!(st["currentIndex"], 0);
    assert_eq!(st["paused"], false);
    assert_eq!(st["time"], 0.0);
    expect(&mut alice, "videoState").await;

    send(&mut alice, json!({"type":"nextVideo","roomId":"r1"})).await;
    let st = expect(&mut bob, "videoState").await;
    assert_eq!(st["playlist"], json!([]));
    let mine = expect(&mut alice, "videoState").await;
    assert_eq!(mine, st);
    assert_eq!(st["currentIndex"], -1);
    assert_eq!(st["paused"], true);
}

#[tokio::test]
async fn bad_events_are_dropped_and_connection_survives() {
    let (addr, _) = start(Config::default()).await;
    let mut alice = connect(addr).await;
    join(&mut alice, "r1", "Alice").await;

    alice.send(Message::Text("{nope".into())).await.unwrap();
    send(&mut alice, json!({"type":"removeVideo","roomId":"r1","index":0})).await;
    send(&mut alice, json!({"type":"setVideoIndex","roomId":"r1","index":3})).await;
    send(&mut alice, json!({"type":"addToPlaylist","roomId":"elsewhere","url":"x"})).await;
    expect_none(&mut alice, "playlistUpdate").await;

    send(&mut alice, json!({"type":"addToPlaylist","roomId":"r1","url":"v1"})).await;
    let up = expect(&mut alice, "playlistUpdate").await;
    assert_eq!(up["playlist"], json!(["v1"]));
}

#[tokio::test]
async fn disconnect_hands_over_ownership_then_destroys_room() {
    let (addr, rooms) = start(Config::default()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, "r1", "Alice").await;
    join(&mut bob, "r1", "Bob").await;
    send(&mut alice, json!({"type":"addToPlaylist","roomId":"r1","url":"v1"})).await;
    expect(&mut bob, "playlistUpdate").await;

    alice.close(None).await.unwrap();
    let left = expect(&mut bob, "roomUsers").await;
    assert_eq!(users(&left), [("Bob".to_string(), true)]);

    bob.close(None).await.unwrap();
    for _ in 0..50 {
        if rooms.is_empty().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(rooms.get("r1").await.is_none());

    let mut carol = connect(addr).await;
    send(&mut carol, json!({"type":"joinRoom","roomId":"r1","nickname":"Carol"})).await;
    let st = expect(&mut carol, "roomState").await;
    assert_eq!(st["playlist"], json!([]));
    assert_eq!(st["currentIndex"], -1);
}

#[tokio::test]
async fn silent_connections_are_evicted() {
    let cfg = Config {
        idle_timeout: Duration::from_millis(300),
        ping_interval: Duration::from_secs(60),
        ..Config::default()
    };
    let (addr, _) = start(cfg).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, "r1", "Alice").await;
    join(&mut bob, "r1", "Bob").await;

    // alice goes quiet; bob keeps reporting telemetry
    for n in 0..8u64 {
        send(&mut bob, json!({"type":"updateTime","roomId":"r1","currentTime":n as f64,"videoProgress":0.0,"playing":false,"seq":n})).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let mut last = expect(&mut bob, "roomUsers").await;
    while users(&last).len() > 1 {
        last = expect(&mut bob, "roomUsers").await;
    }
    assert_eq!(users(&last), [("Bob".to_string(), true)]);
}

#[tokio::test]
async fn http_side_door_reads_and_queues() {
    let (addr, _) = start(Config::default()).await;
    let http = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    let res = http.get(format!("{base}/rooms/r1")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    let res = http.post(format!("{base}/rooms/r1/playlist")).json(&json!({"url":"v1"})).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let mut alice = connect(addr).await;
    join(&mut alice, "r1", "Alice").await;

    let res = http
        .post(format!("{base}/rooms/r1/playlist"))
        .json(&json!({"url":"/videos/interstellar.mp4","nickname":"Catalog"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 202);
    let up = expect(&mut alice, "playlistUpdate").await;
    assert_eq!(up["playlist"], json!(["/videos/interstellar.mp4"]));
    let log = expect(&mut alice, "actionLog").await;
    assert_eq!(log["log"]["nickname"], "Catalog");

    let res = http.post(format!("{base}/rooms/r1/playlist")).json(&json!({"url":"  "})).send().await.unwrap();
    assert_eq!(res.status(), 400);

    let view: Value = http.get(format!("{base}/rooms/r1")).send().await.unwrap().json().await.unwrap();
    assert_eq!(view["roomId"], "r1");
    assert_eq!(view["currentIndex"], 0);
    assert_eq!(view["users"][0]["nickname"], "Alice");
    assert!(view["log"].as_array().unwrap().len() >= 2);

    let health: Value = http.get(format!("{base}/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(health, json!({"status":"ok","rooms":1}));
}
