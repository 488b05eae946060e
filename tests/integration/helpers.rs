//! Shared test helpers: a loopback push server and a stub REST collaborator.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use beacon_core::AppResult;
use beacon_core::config::{ApiConfig, RealtimeConfig};
use beacon_feed::NotificationApi;
use beacon_protocol::frames::{IncidentPayload, WelfarePayload};
use beacon_protocol::rest::NotificationDto;

/// A loopback push server accepting WebSocket upgrades on an OS-assigned port.
pub struct TestServer {
    pub addr: SocketAddr,
    conns: mpsc::UnboundedReceiver<ServerConn>,
    accept_task: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = mpsc::unbounded_channel();

        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let path = Arc::new(Mutex::new(String::new()));
                let seen = path.clone();
                let callback =
                    move |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
                        *seen.lock().expect("path lock") = req.uri().to_string();
                        Ok(response)
                    };
                let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
                    continue;
                };
                let path = path.lock().expect("path lock").clone();
                if tx.send(ServerConn { ws, path }).is_err() {
                    break;
                }
            }
        });

        Self {
            addr,
            conns: rx,
            accept_task,
        }
    }

    /// Client configuration pointing at this server.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: format!("http://{}", self.addr),
            ws_url: Some(format!("ws://{}/ws", self.addr)),
            request_timeout_seconds: 5,
        }
    }

    /// Waits for the next accepted connection.
    pub async fn next_conn(&mut self) -> ServerConn {
        tokio::time::timeout(Duration::from_secs(5), self.conns.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("accept loop gone")
    }

    /// Asserts that no connection arrives within the window.
    pub async fn expect_no_conn(&mut self, wait_ms: u64) {
        let waited = tokio::time::timeout(Duration::from_millis(wait_ms), self.conns.recv()).await;
        assert!(waited.is_err(), "unexpected connection");
    }

    /// Stops accepting; later connection attempts are refused.
    pub fn stop_accepting(&self) {
        self.accept_task.abort();
    }
}

/// Server side of one accepted push connection.
pub struct ServerConn {
    ws: WebSocketStream<TcpStream>,
    pub path: String,
}

impl ServerConn {
    pub async fn send_json(&mut self, value: serde_json::Value) {
        self.send_text(&value.to_string()).await;
    }

    pub async fn send_text(&mut self, raw: &str) {
        self.ws
            .send(Message::Text(raw.to_string().into()))
            .await
            .expect("server send");
    }

    /// Next text frame parsed as JSON; `None` once the connection closes.
    pub async fn next_json(&mut self) -> Option<serde_json::Value> {
        while let Some(message) = self.ws.next().await {
            match message {
                Ok(Message::Text(text)) => return serde_json::from_str(text.as_str()).ok(),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    }

    /// Reads until a close frame arrives; returns its code.
    pub async fn next_close(&mut self) -> Option<u16> {
        while let Some(message) = self.ws.next().await {
            match message {
                Ok(Message::Close(frame)) => return frame.map(|f| u16::from(f.code)),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    }

    /// Closes the connection with the given code.
    pub async fn close_with(mut self, code: CloseCode) {
        let _ = self
            .ws
            .send(Message::Close(Some(CloseFrame {
                code,
                reason: "".into(),
            })))
            .await;
        let _ = self.ws.flush().await;
    }
}

/// Realtime settings shrunk to test timescales.
pub fn fast_realtime() -> RealtimeConfig {
    RealtimeConfig {
        connect_timeout_seconds: 2,
        ping_interval_seconds: 30,
        pong_timeout_seconds: 10,
        reconnect_base_ms: 20,
        max_reconnect_attempts: 5,
        send_buffer_size: 16,
    }
}

/// Polls a condition until it holds or the test deadline passes.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met in time");
}

/// REST collaborator that always returns empty success.
pub struct StubApi;

#[async_trait]
impl NotificationApi for StubApi {
    async fn list_notifications(&self, _limit: usize) -> AppResult<Vec<NotificationDto>> {
        Ok(Vec::new())
    }

    async fn mark_read(&self, _id: &str) -> AppResult<()> {
        Ok(())
    }

    async fn mark_all_read(&self) -> AppResult<()> {
        Ok(())
    }

    async fn recent_incidents(&self) -> AppResult<Vec<IncidentPayload>> {
        Ok(Vec::new())
    }

    async fn welfare_needing_help(&self) -> AppResult<Vec<WelfarePayload>> {
        Ok(Vec::new())
    }
}
