//! The push-channel client — connection lifecycle, reconnection, keep-alive.
//!
//! One [`PushClient`] exists per authenticated session. It owns at most one
//! live transport at a time; every spawned task carries the generation it
//! was created under and bails out if the generation has moved on, so a
//! callback can never act on a torn-down connection.

use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use beacon_core::config::{ApiConfig, RealtimeConfig};
use beacon_core::error::ErrorKind;
use beacon_core::{AppError, AppResult};
use beacon_protocol::events::{InboundEvent, PushEventKind};
use beacon_protocol::frames::{ClientFrame, ServerFrame};

use crate::registry::{HandlerId, HandlerRegistry};
use crate::state::ConnectionState;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The normal-closure code; the only close that suppresses auto-reconnect.
const NORMAL_CLOSE: u16 = 1000;

enum WriterCmd {
    Frame(String),
    Close,
}

struct ClientInner {
    state: ConnectionState,
    /// Bumped on every connect attempt and on disconnect; stale-callback guard.
    generation: u64,
    reconnect_attempts: u32,
    token: Option<String>,
    writer_tx: Option<mpsc::Sender<WriterCmd>>,
    last_pong: Instant,
    reader_task: Option<JoinHandle<()>>,
    writer_task: Option<JoinHandle<()>>,
    keepalive_task: Option<JoinHandle<()>>,
    reconnect_cancel: CancellationToken,
}

/// Client side of the persistent push channel.
///
/// Owned by the session; dependency-injected into any component that needs
/// to subscribe rather than imported as ambient state.
pub struct PushClient {
    api: ApiConfig,
    config: RealtimeConfig,
    registry: HandlerRegistry,
    inner: Mutex<ClientInner>,
    state_tx: watch::Sender<ConnectionState>,
    frames_received: std::sync::atomic::AtomicU64,
}

impl std::fmt::Debug for PushClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushClient").finish()
    }
}

impl PushClient {
    /// Creates a disconnected client.
    pub fn new(api: ApiConfig, config: RealtimeConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            api,
            config,
            registry: HandlerRegistry::new(),
            inner: Mutex::new(ClientInner {
                state: ConnectionState::Disconnected,
                generation: 0,
                reconnect_attempts: 0,
                token: None,
                writer_tx: None,
                last_pong: Instant::now(),
                reader_task: None,
                writer_task: None,
                keepalive_task: None,
                reconnect_cancel: CancellationToken::new(),
            }),
            state_tx,
            frames_received: std::sync::atomic::AtomicU64::new(0),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, ClientInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock_inner().state
    }

    /// Watch channel for connection-state transitions.
    ///
    /// This is the broadcast path for consumers outside the event registry
    /// (status indicators, staleness banners).
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Automatic reconnection attempts consumed since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.lock_inner().reconnect_attempts
    }

    /// Total frames delivered by the transport, pongs included.
    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(AtomicOrdering::Relaxed)
    }

    /// Registers a handler for an event kind. Handlers for one kind run in
    /// registration order.
    pub fn on<F>(&self, kind: PushEventKind, handler: F) -> HandlerId
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.registry.on(kind, handler)
    }

    /// Removes a handler; unknown ids are a silent no-op.
    pub fn off(&self, kind: PushEventKind, id: HandlerId) {
        self.registry.off(kind, id);
    }

    /// Opens the push channel with the given credential.
    ///
    /// Idempotent: while a connection exists or an attempt is in flight this
    /// resolves immediately without opening a second transport. The attempt
    /// is bounded by the configured connection timeout.
    pub async fn connect(self: &Arc<Self>, token: &str) -> AppResult<()> {
        let endpoint = self.api.push_endpoint(token)?;

        let generation = {
            let mut inner = self.lock_inner();
            if inner.state != ConnectionState::Disconnected {
                return Ok(());
            }
            inner.state = ConnectionState::Connecting;
            inner.generation += 1;
            inner.token = Some(token.to_string());
            inner.generation
        };
        self.state_tx.send_replace(ConnectionState::Connecting);
        debug!(generation, "Opening push channel");

        let stream = match time::timeout(
            self.config.connect_timeout(),
            connect_async(endpoint.as_str()),
        )
        .await
        {
            Err(_) => {
                self.revert_connecting(generation);
                return Err(AppError::timeout(format!(
                    "Push channel open timed out after {}s",
                    self.config.connect_timeout_seconds
                )));
            }
            Ok(Err(e)) => {
                self.revert_connecting(generation);
                return Err(AppError::with_source(
                    ErrorKind::Transport,
                    format!("Failed to open push channel: {e}"),
                    e,
                ));
            }
            Ok(Ok((stream, _response))) => stream,
        };

        let (sink, source) = stream.split();
        let (writer_tx, writer_rx) = mpsc::channel(self.config.send_buffer_size);

        {
            let mut inner = self.lock_inner();
            if inner.generation != generation {
                // disconnect() ran while the handshake was in flight; the
                // socket drops here and the server sees an abrupt close.
                return Err(AppError::transport("Connection torn down during connect"));
            }
            inner.state = ConnectionState::Connected;
            inner.reconnect_attempts = 0;
            inner.writer_tx = Some(writer_tx);
            inner.last_pong = Instant::now();
            inner.writer_task = Some(tokio::spawn(run_writer(sink, writer_rx)));
            inner.reader_task = Some(tokio::spawn(self.clone().run_reader(source, generation)));
            inner.keepalive_task = Some(tokio::spawn(self.clone().run_keepalive(generation)));
        }
        self.state_tx.send_replace(ConnectionState::Connected);
        info!("Push channel connected");
        Ok(())
    }

    /// Manual retry entry point for UI-level triggers (visibility regain,
    /// a retry button). Delegates to the internal connect path.
    pub async fn reconnect(self: &Arc<Self>) -> AppResult<()> {
        let token = self.lock_inner().token.clone();
        match token {
            Some(token) => self.connect(&token).await,
            None => Err(AppError::transport(
                "Reconnect requested with no stored credential",
            )),
        }
    }

    /// Closes the push channel intentionally.
    ///
    /// Sends the normal-closure code (which suppresses auto-reconnect),
    /// synchronously stops the keep-alive, cancels any pending retry, and
    /// clears all subscriber registrations.
    pub fn disconnect(&self) {
        let was_live = {
            let mut inner = self.lock_inner();
            inner.generation += 1;
            inner.token = None;
            inner.reconnect_attempts = 0;
            inner.reconnect_cancel.cancel();
            inner.reconnect_cancel = CancellationToken::new();
            if let Some(task) = inner.keepalive_task.take() {
                task.abort();
            }
            if let Some(task) = inner.reader_task.take() {
                task.abort();
            }
            if let Some(tx) = inner.writer_tx.take() {
                let _ = tx.try_send(WriterCmd::Close);
            }
            // The writer finishes the close frame on its own time.
            inner.writer_task.take();
            let was_live = inner.state != ConnectionState::Disconnected;
            inner.state = ConnectionState::Disconnected;
            was_live
        };
        self.registry.clear();
        self.state_tx.send_replace(ConnectionState::Disconnected);
        if was_live {
            info!("Push channel disconnected");
        }
    }

    /// Transmits a frame if connected; otherwise the frame is dropped with
    /// a warning. Callers must not assume delivery.
    pub fn send(&self, frame: ClientFrame) {
        let inner = self.lock_inner();
        match (inner.state, &inner.writer_tx) {
            (ConnectionState::Connected, Some(tx)) => match serde_json::to_string(&frame) {
                Ok(text) => {
                    if tx.try_send(WriterCmd::Frame(text)).is_err() {
                        warn!(kind = %frame.kind, "Outbound buffer unavailable; dropping frame");
                    }
                }
                Err(e) => error!(error = %e, "Failed to serialize outbound frame"),
            },
            _ => {
                warn!(kind = %frame.kind, "Push channel not connected; dropping outbound frame");
            }
        }
    }

    fn revert_connecting(&self, generation: u64) {
        let mut inner = self.lock_inner();
        if inner.generation == generation && inner.state == ConnectionState::Connecting {
            inner.state = ConnectionState::Disconnected;
            drop(inner);
            self.state_tx.send_replace(ConnectionState::Disconnected);
        }
    }

    async fn run_reader(self: Arc<Self>, mut source: SplitStream<WsStream>, generation: u64) {
        let mut close_code: Option<u16> = None;

        while let Some(message) = source.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    self.frames_received.fetch_add(1, AtomicOrdering::Relaxed);
                    self.handle_text(text.as_str(), generation);
                }
                Ok(Message::Close(frame)) => {
                    close_code = frame.map(|f| u16::from(f.code));
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "Push channel read error");
                    break;
                }
            }
        }

        self.handle_closure(generation, close_code == Some(NORMAL_CLOSE));
    }

    /// Decodes one inbound frame. Malformed frames are logged and dropped
    /// without closing the connection.
    fn handle_text(&self, raw: &str, generation: u64) {
        let frame: ServerFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Dropping malformed push frame");
                return;
            }
        };

        match frame {
            ServerFrame::Pong => {
                let mut inner = self.lock_inner();
                if inner.generation == generation {
                    inner.last_pong = Instant::now();
                }
            }
            ServerFrame::Unknown => {
                trace!("Ignoring unrecognized push frame");
            }
            other => {
                if let Some(event) = other.into_event() {
                    self.registry.dispatch(&InboundEvent::now(event));
                }
            }
        }
    }

    async fn run_keepalive(self: Arc<Self>, generation: u64) {
        let mut ticker = time::interval(self.config.ping_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // first tick completes immediately

        loop {
            ticker.tick().await;
            {
                let inner = self.lock_inner();
                if inner.generation != generation || inner.state != ConnectionState::Connected {
                    return;
                }
            }

            let ping_sent = Instant::now();
            self.send(ClientFrame::ping());

            time::sleep(self.config.pong_timeout()).await;

            let timed_out = {
                let inner = self.lock_inner();
                if inner.generation != generation || inner.state != ConnectionState::Connected {
                    return;
                }
                inner.last_pong < ping_sent
            };

            if timed_out {
                warn!(
                    timeout_s = self.config.pong_timeout_seconds,
                    "No pong within the keep-alive window; forcing push channel closed"
                );
                self.handle_closure(generation, false);
                return;
            }
        }
    }

    /// Single closure authority: tears down the transport for this
    /// generation and, for abnormal closures, hands off to the
    /// reconnection schedule.
    fn handle_closure(self: &Arc<Self>, generation: u64, normal: bool) {
        {
            let mut inner = self.lock_inner();
            if inner.generation != generation || inner.state == ConnectionState::Disconnected {
                return; // stale callback for a transport already replaced
            }
            inner.state = ConnectionState::Disconnected;
            inner.writer_tx = None;
            if let Some(task) = inner.keepalive_task.take() {
                task.abort();
            }
            if let Some(task) = inner.writer_task.take() {
                task.abort();
            }
            if let Some(task) = inner.reader_task.take() {
                task.abort();
            }
        }
        self.state_tx.send_replace(ConnectionState::Disconnected);

        if normal {
            info!("Push channel closed");
        } else {
            info!("Push channel closed abnormally");
            self.schedule_reconnect();
        }
    }

    /// Schedules the next automatic reconnection attempt, if any remain.
    ///
    /// Attempt N waits `reconnect_base * N` (linear backoff). A failed
    /// attempt schedules the next one; a successful open resets the
    /// counter. Past the cap the client stays disconnected until
    /// [`PushClient::reconnect`] or [`PushClient::connect`] is called.
    fn schedule_reconnect(self: &Arc<Self>) {
        let (attempt, token, cancel) = {
            let mut inner = self.lock_inner();
            if inner.reconnect_attempts >= self.config.max_reconnect_attempts {
                warn!(
                    attempts = inner.reconnect_attempts,
                    "Reconnect attempts exhausted; staying disconnected"
                );
                return;
            }
            let Some(token) = inner.token.clone() else {
                return;
            };
            inner.reconnect_attempts += 1;
            (
                inner.reconnect_attempts,
                token,
                inner.reconnect_cancel.clone(),
            )
        };

        let delay = self.config.reconnect_delay(attempt);
        info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");

        let client = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = time::sleep(delay) => {}
            }
            if client.state() != ConnectionState::Disconnected {
                return;
            }
            if let Err(e) = client.connect(&token).await {
                warn!(attempt, error = %e, "Reconnect attempt failed");
                client.schedule_reconnect();
            }
        });
    }
}

async fn run_writer(
    mut sink: SplitSink<WsStream, Message>,
    mut writer_rx: mpsc::Receiver<WriterCmd>,
) {
    while let Some(cmd) = writer_rx.recv().await {
        match cmd {
            WriterCmd::Frame(text) => {
                if sink.send(Message::Text(text.into())).await.is_err() {
                    debug!("Push channel send failed; writer stopping");
                    break;
                }
            }
            WriterCmd::Close => {
                let _ = sink
                    .send(Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "client disconnect".into(),
                    })))
                    .await;
                break;
            }
        }
    }
}
