//! ConnectionManager: the only component that touches the agent socket.
//!
//! # Lifecycle
//!
//! ```text
//!   Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!        ▲                        │                  │
//!        └────────failure─────────┘                  │ close / send failure
//!        └──────────────── Closing ◀─────────────────┘
//! ```
//!
//! - `connect` is a no-op on a socket that is verifiably open.  A socket
//!   flagged connected whose peer has gone away is torn down first.
//! - Without an explicit URL, the URL comes from the session held by this
//!   manager, then from the [`SessionResolver`], then from the legacy
//!   endpoint.
//! - The URL fixes the input [`Dialect`] until the connection closes.
//! - Sends reconnect with bounded, linearly growing backoff; the send itself
//!   is never retried.
//!
//! # Concurrency
//!
//! Every operation takes `&mut self`, so calls on one manager are sequential
//! and messages go out in call order.  The receive loop runs as a separate
//! task on the read half of the socket; `close` cancels it and awaits its
//! exit before releasing the socket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use deskwire_core::{
    dialect_for_url, Dialect, DialectKind, EncodeError, InputEvent, KeyCombo, PointerCommand,
    Session, WireMessage,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};

use crate::application::resolve_session::{SessionResolver, SessionStore};
use crate::domain::config::ClientConfig;
use crate::error::ClientError;
use crate::infrastructure::receive::{handle_message, Flow, FrameCallback, FrameSlot, ReceiveTask};
use crate::infrastructure::rest_api::{AgentRestClient, API_KEY_HEADER};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// Upper bound on sending the closing handshake.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Transient: the receive task is being drained.
    Closing,
}

/// An open socket and everything fixed for its lifetime.
struct LiveConnection {
    dialect: Box<dyn Dialect>,
    url: String,
    sink: WsSink,
    /// Held here while no receive loop owns it.
    reader: Option<WsReader>,
    receive: Option<ReceiveTask>,
    /// Cleared by the receive loop when the peer goes away.
    open: Arc<AtomicBool>,
}

impl LiveConnection {
    fn start_receive(&mut self, slot: FrameSlot) {
        if let Some(reader) = self.reader.take() {
            debug!(url = %redact(&self.url), "starting receive loop");
            self.receive = Some(ReceiveTask::spawn(reader, slot, Arc::clone(&self.open)));
        }
    }

    /// Checks that the peer has not gone away.
    ///
    /// With no receive loop running, anything already buffered on the
    /// reader is consumed without waiting; a close frame, error or end of
    /// stream there means the socket is dead.
    fn verify_open(&mut self, slot: &FrameSlot) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        if self.receive.as_ref().is_some_and(ReceiveTask::is_finished) {
            self.open.store(false, Ordering::Release);
            return false;
        }
        if let Some(reader) = self.reader.as_mut() {
            while let Some(next) = reader.next().now_or_never() {
                let alive = match next {
                    Some(Ok(msg)) => handle_message(msg, slot) == Flow::Continue,
                    Some(Err(e)) => {
                        debug!(error = %e, "socket error found while verifying connection");
                        false
                    }
                    None => false,
                };
                if !alive {
                    self.open.store(false, Ordering::Release);
                    return false;
                }
            }
        }
        true
    }
}

/// Strips the query string (which may carry a session token) for logging.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Persistent client connection to one remote desktop agent.
pub struct ConnectionManager {
    config: ClientConfig,
    resolver: SessionResolver,
    state: ConnectionState,
    live: Option<LiveConnection>,
    /// Session used by the current or most recent connection; reused on
    /// reconnect until ended or the manager is closed.
    session: Option<Session>,
    frames: FrameSlot,
}

impl ConnectionManager {
    pub fn new(config: ClientConfig, resolver: SessionResolver) -> Self {
        Self {
            config,
            resolver,
            state: ConnectionState::Disconnected,
            live: None,
            session: None,
            frames: Arc::new(RwLock::new(None)),
        }
    }

    /// Builds a manager that creates sessions through the agent's REST API
    /// and caches them in `store`.
    ///
    /// # Errors
    ///
    /// [`ClientError::SessionApi`] if the REST client cannot be built.
    pub fn with_rest_api(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let api = Arc::new(AgentRestClient::new(&config)?);
        let resolver = SessionResolver::from_config(&config, api, store);
        Ok(Self::new(config, resolver))
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `true` while connected and the receive side has not seen the peer go.
    ///
    /// Advisory only: without a frame callback no receive loop watches the
    /// socket, so a peer close stays unnoticed here until the next
    /// [`connect`](Self::connect) or send verifies the connection.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
            && self
                .live
                .as_ref()
                .is_some_and(|l| l.open.load(Ordering::Acquire))
    }

    /// Dialect of the current connection.
    pub fn dialect(&self) -> Option<DialectKind> {
        self.live.as_ref().map(|l| l.dialect.kind())
    }

    /// URL of the current connection.
    pub fn endpoint_url(&self) -> Option<&str> {
        self.live.as_ref().map(|l| l.url.as_str())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Supplies a session obtained elsewhere; the next connect without an
    /// explicit URL uses it.
    pub fn use_session(&mut self, session: Session) {
        debug!(session_id = %session.session_id, "session supplied by caller");
        self.session = Some(session);
    }

    // ── Frame callback ────────────────────────────────────────────────────────

    /// Registers the consumer for decoded video frames.
    ///
    /// Replaces any previous callback.  On an open connection without a
    /// receive loop, the loop starts immediately, so this must then be
    /// called from within a Tokio runtime.
    pub fn set_frame_callback<F>(&mut self, callback: F)
    where
        F: Fn(&[u8], u32, u32) + Send + Sync + 'static,
    {
        let callback: FrameCallback = Arc::new(callback);
        *self.frames.write().unwrap_or_else(|p| p.into_inner()) = Some(callback);

        if let Some(live) = self.live.as_mut() {
            if live.open.load(Ordering::Acquire) {
                live.start_receive(Arc::clone(&self.frames));
            }
        }
    }

    /// Removes the frame callback; frames are dropped from now on.
    pub fn clear_frame_callback(&mut self) {
        *self.frames.write().unwrap_or_else(|p| p.into_inner()) = None;
    }

    fn has_frame_callback(&self) -> bool {
        self.frames.read().unwrap_or_else(|p| p.into_inner()).is_some()
    }

    // ── Connect / close ───────────────────────────────────────────────────────

    /// Opens the connection unless a verifiably open one exists.
    ///
    /// # Errors
    ///
    /// - [`ClientError::ConnectionFailed`] when the socket to an explicit or
    ///   session URL cannot be opened within the connect timeout.
    /// - [`ClientError::NoSessionAvailable`] when no session could be obtained
    ///   and the legacy endpoint failed too.
    #[instrument(skip_all, fields(instance = %self.config.instance_id))]
    pub async fn connect(&mut self, explicit_url: Option<&str>) -> Result<(), ClientError> {
        if self.state == ConnectionState::Connected {
            let frames = Arc::clone(&self.frames);
            if self.live.as_mut().is_some_and(|l| l.verify_open(&frames)) {
                debug!("already connected");
                return Ok(());
            }
            info!("connection found closed, reconnecting");
        }
        if self.live.is_some() {
            self.teardown().await;
        }

        self.state = ConnectionState::Connecting;
        let (url, legacy_fallback) = match explicit_url {
            Some(url) => (url.to_string(), false),
            None => self.resolve_url().await,
        };

        match self.open_socket(&url).await {
            Ok(live) => {
                info!(url = %redact(&url), dialect = ?live.dialect.kind(), "connected");
                self.live = Some(live);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(reason) => {
                warn!(url = %redact(&url), %reason, "connect failed");
                self.state = ConnectionState::Disconnected;
                let url = redact(&url).to_string();
                Err(if legacy_fallback {
                    ClientError::NoSessionAvailable { url, reason }
                } else {
                    ClientError::ConnectionFailed { url, reason }
                })
            }
        }
    }

    /// Returns the URL to connect to and whether it is the legacy fallback.
    async fn resolve_url(&mut self) -> (String, bool) {
        if let Some(session) = &self.session {
            debug!(session_id = %session.session_id, "reusing held session");
            return (session.websocket_url.clone(), false);
        }

        match self.resolver.resolve(&self.config.endpoint()).await {
            Ok(session) => {
                let url = session.websocket_url.clone();
                self.session = Some(session);
                (url, false)
            }
            Err(e) => {
                info!(error = %e, "falling back to legacy endpoint");
                (self.config.legacy_ws_url(), true)
            }
        }
    }

    async fn open_socket(&self, url: &str) -> Result<LiveConnection, String> {
        let dialect = dialect_for_url(url);
        let mut request = url.into_client_request().map_err(|e| e.to_string())?;

        // Session URLs carry their own token; only the legacy endpoint
        // authenticates by header.
        if dialect.kind().is_legacy() {
            if let Some(key) = &self.config.api_key {
                let value = HeaderValue::from_str(key)
                    .map_err(|_| "API key is not a valid header value".to_string())?;
                request.headers_mut().insert(API_KEY_HEADER, value);
            }
        }

        debug!(url = %redact(url), dialect = ?dialect.kind(), "opening socket");
        let timeout = self.config.connect_timeout;
        let (ws, _response) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| format!("timed out after {timeout:?}"))?
            .map_err(|e| e.to_string())?;

        let (sink, reader) = ws.split();
        let mut live = LiveConnection {
            dialect,
            url: url.to_string(),
            sink,
            reader: Some(reader),
            receive: None,
            open: Arc::new(AtomicBool::new(true)),
        };
        if self.has_frame_callback() {
            live.start_receive(Arc::clone(&self.frames));
        }
        Ok(live)
    }

    /// Stops the receive loop, closes the socket and forgets the held
    /// session.  Safe to call any number of times.
    #[instrument(skip_all, fields(instance = %self.config.instance_id))]
    pub async fn close(&mut self) {
        self.teardown().await;
        if let Some(session) = self.session.take() {
            debug!(session_id = %session.session_id, "released session reference");
        }
    }

    async fn teardown(&mut self) {
        let Some(mut live) = self.live.take() else {
            self.state = ConnectionState::Disconnected;
            return;
        };

        self.state = ConnectionState::Closing;
        if let Some(task) = live.receive.take() {
            task.stop().await;
        }
        match tokio::time::timeout(CLOSE_TIMEOUT, live.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "socket already closed"),
            Err(_) => debug!("closing handshake timed out"),
        }
        self.state = ConnectionState::Disconnected;
        info!(url = %redact(&live.url), "connection closed");
    }

    /// Ends a session at the agent and forgets it locally.
    ///
    /// A matching session held by this manager is released even if the
    /// agent call fails; the open socket, if any, is left alone.
    pub async fn end_session(&mut self, session_id: &str) -> Result<(), ClientError> {
        let result = self.resolver.end_session(session_id).await;
        if self.session.as_ref().is_some_and(|s| s.session_id == session_id) {
            self.session = None;
        }
        result.map_err(ClientError::from)
    }

    // ── Sending ───────────────────────────────────────────────────────────────

    /// Sends one pointer intent.
    ///
    /// NaN or infinite deltas fail with [`ClientError::ProtocolViolation`]
    /// before any connection attempt.
    pub async fn send_pointer_event(&mut self, event: &InputEvent) -> Result<(), ClientError> {
        event.validate()?;
        debug!(kind = event.kind(), "sending pointer event");
        self.transmit(|dialect| dialect.encode_event(event)).await
    }

    /// Validates a loosely-typed pointer request and sends it.
    ///
    /// Invalid requests fail with [`ClientError::ProtocolViolation`] before
    /// any connection attempt.
    pub async fn send_pointer_command(&mut self, command: PointerCommand) -> Result<(), ClientError> {
        let event = InputEvent::try_from(command)?;
        self.send_pointer_event(&event).await
    }

    /// Sends a keyboard chord.
    ///
    /// An empty chord fails with [`ClientError::ProtocolViolation`] before
    /// any connection attempt; a chord whose keys are all unknown sends
    /// nothing and succeeds.
    pub async fn send_key_combo(&mut self, combo: &KeyCombo) -> Result<(), ClientError> {
        if combo.is_empty() {
            return Err(EncodeError::EmptyKeyCombo.into());
        }
        debug!(keys = ?combo.keys(), "sending key combination");
        self.transmit(|dialect| dialect.encode_combo(combo)).await
    }

    #[instrument(skip_all, fields(instance = %self.config.instance_id))]
    async fn transmit<F>(&mut self, encode: F) -> Result<(), ClientError>
    where
        F: FnOnce(&dyn Dialect) -> Result<Vec<WireMessage>, EncodeError>,
    {
        self.ensure_connected().await?;

        let Some(live) = self.live.as_mut() else {
            return Err(ClientError::connection_failed(
                &self.config.legacy_ws_url(),
                "connection vanished after connect",
            ));
        };

        // Render everything first so a serialization failure sends nothing.
        let messages = encode(live.dialect.as_ref())?;
        let payloads = messages
            .iter()
            .map(WireMessage::to_json)
            .collect::<Result<Vec<_>, _>>()?;

        for text in payloads {
            if let Err(e) = live.sink.send(Message::Text(text)).await {
                warn!(error = %e, "send failed, marking connection disconnected");
                live.open.store(false, Ordering::Release);
                let url = redact(&live.url).to_string();
                self.state = ConnectionState::Disconnected;
                return Err(ClientError::connection_failed(&url, e));
            }
        }
        Ok(())
    }

    /// Connects, retrying per the configured [`crate::RetryPolicy`].
    async fn ensure_connected(&mut self) -> Result<(), ClientError> {
        let policy = self.config.retry.clone();
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.connect(None).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= attempts => {
                    warn!(attempts, error = %e, "giving up connecting");
                    return Err(e);
                }
                Err(e) => {
                    let delay = policy.delay_for(attempt);
                    warn!(attempt, max = attempts, ?delay, error = %e, "connect attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
