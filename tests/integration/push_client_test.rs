//! Integration tests for the push-channel client lifecycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use beacon_core::config::ApiConfig;
use beacon_core::error::ErrorKind;
use beacon_protocol::events::{PushEvent, PushEventKind};
use beacon_protocol::frames::ClientFrame;
use beacon_realtime::{ConnectionState, PushClient};

use crate::helpers::{TestServer, fast_realtime, wait_for};

#[tokio::test]
async fn test_connect_is_idempotent_and_carries_token() {
    let mut server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    let (first, second) = tokio::join!(client.connect("sekrit"), client.connect("sekrit"));
    first.expect("first connect");
    second.expect("second connect");
    assert_eq!(client.state(), ConnectionState::Connected);

    let conn = server.next_conn().await;
    assert_eq!(conn.path, "/ws?token=sekrit");

    // The second connect must not have opened a second transport.
    server.expect_no_conn(200).await;

    client.disconnect();
}

#[tokio::test]
async fn test_pong_is_consumed_and_events_dispatch_in_order() {
    let mut server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.on(PushEventKind::NewIncident, move |inbound| {
        if let PushEvent::NewIncident(payload) = &inbound.event {
            sink.lock().expect("lock").push(payload.id);
        }
    });

    client.connect("tok").await.expect("connect");
    let mut conn = server.next_conn().await;

    conn.send_json(serde_json::json!({"type": "pong"})).await;
    conn.send_json(serde_json::json!({"type": "new_incident", "data": {"id": 1}}))
        .await;
    conn.send_json(serde_json::json!({"type": "new_incident", "data": {"incident_id": 2}}))
        .await;

    wait_for(|| seen.lock().expect("lock").len() == 2).await;
    assert_eq!(*seen.lock().expect("lock"), vec![1, 2]);
    // The pong reached the client but was never dispatched.
    assert_eq!(client.frames_received(), 3);

    client.disconnect();
}

#[tokio::test]
async fn test_malformed_frame_is_dropped_without_closing() {
    let mut server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    let seen = Arc::new(Mutex::new(0u32));
    let sink = seen.clone();
    client.on(PushEventKind::NewIncident, move |_| {
        *sink.lock().expect("lock") += 1;
    });

    client.connect("tok").await.expect("connect");
    let mut conn = server.next_conn().await;

    conn.send_text("this is not a frame").await;
    conn.send_json(serde_json::json!({"type": "new_incident", "data": {"id": 5}}))
        .await;

    wait_for(|| *seen.lock().expect("lock") == 1).await;
    assert_eq!(client.state(), ConnectionState::Connected);

    client.disconnect();
}

#[tokio::test]
async fn test_disconnect_sends_normal_close_and_stays_down() {
    let mut server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    client.connect("tok").await.expect("connect");
    let mut conn = server.next_conn().await;

    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Disconnected);

    assert_eq!(conn.next_close().await, Some(1000));
    server.expect_no_conn(300).await;
    assert_eq!(client.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_server_normal_close_suppresses_reconnect() {
    let mut server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    client.connect("tok").await.expect("connect");
    let conn = server.next_conn().await;

    conn.close_with(CloseCode::Normal).await;

    wait_for(|| client.state() == ConnectionState::Disconnected).await;
    server.expect_no_conn(300).await;
    assert_eq!(client.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_abnormal_close_triggers_reconnect() {
    let mut server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    client.connect("tok").await.expect("connect");
    let conn = server.next_conn().await;

    conn.close_with(CloseCode::Away).await;

    // The client comes back on its own after the backoff delay.
    let _replacement = server.next_conn().await;
    wait_for(|| client.state() == ConnectionState::Connected).await;
    // A successful open resets the attempt counter.
    assert_eq!(client.reconnect_attempts(), 0);

    client.disconnect();
}

#[tokio::test]
async fn test_reconnect_gives_up_after_cap() {
    let mut server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    client.connect("tok").await.expect("connect");
    let conn = server.next_conn().await;

    // Kill the listener, then the live connection: every retry is refused.
    server.stop_accepting();
    drop(conn);

    wait_for(|| client.reconnect_attempts() == 5).await;

    // Past the cap nothing else is scheduled.
    sleep(Duration::from_millis(400)).await;
    assert_eq!(client.reconnect_attempts(), 5);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_manual_reconnect_delegates_to_connect() {
    let mut server = TestServer::spawn().await;
    let mut config = fast_realtime();
    config.max_reconnect_attempts = 0; // no automatic retries at all
    let client = Arc::new(PushClient::new(server.api_config(), config));

    client.connect("tok").await.expect("connect");
    let conn = server.next_conn().await;

    conn.close_with(CloseCode::Away).await;
    wait_for(|| client.state() == ConnectionState::Disconnected).await;
    server.expect_no_conn(200).await;

    client.reconnect().await.expect("manual reconnect");
    let _conn = server.next_conn().await;
    assert_eq!(client.state(), ConnectionState::Connected);

    client.disconnect();
}

#[tokio::test]
async fn test_reconnect_without_credential_fails() {
    let server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    let err = client.reconnect().await.expect_err("no stored token");
    assert_eq!(err.kind, ErrorKind::Transport);
}

#[tokio::test]
async fn test_keepalive_timeout_forces_reconnect() {
    let mut server = TestServer::spawn().await;
    let mut config = fast_realtime();
    config.ping_interval_seconds = 1;
    config.pong_timeout_seconds = 1;
    let client = Arc::new(PushClient::new(server.api_config(), config));

    client.connect("tok").await.expect("connect");
    let mut conn = server.next_conn().await;

    // The keep-alive ping arrives on schedule; we never answer it.
    let ping = conn.next_json().await.expect("ping frame");
    assert_eq!(ping["type"], "ping");
    assert!(ping["data"]["timestamp"].is_i64());

    // Missing pong forces the transport closed, then reconnection kicks in.
    let _replacement = server.next_conn().await;
    wait_for(|| client.state() == ConnectionState::Connected).await;

    client.disconnect();
}

#[tokio::test]
async fn test_connect_times_out_against_a_stalled_endpoint() {
    // Accepts TCP but never answers the WebSocket handshake.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let hold = tokio::spawn(async move {
        let mut sockets = Vec::new();
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            sockets.push(socket);
        }
    });

    let api = ApiConfig {
        base_url: format!("http://{addr}"),
        ws_url: Some(format!("ws://{addr}/ws")),
        request_timeout_seconds: 5,
    };
    let mut config = fast_realtime();
    config.connect_timeout_seconds = 1;
    let client = Arc::new(PushClient::new(api, config));

    let err = client.connect("tok").await.expect_err("must time out");
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(client.state(), ConnectionState::Disconnected);

    hold.abort();
}

#[tokio::test]
async fn test_send_while_disconnected_is_dropped() {
    let server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));

    // Dropped with a warning; no panic, no state change.
    client.send(ClientFrame::new("ping", None));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
