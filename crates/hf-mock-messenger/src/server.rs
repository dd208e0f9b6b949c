// SPDX-License-Identifier: MIT OR Apache-2.0
//! Axum routes and the running-server handle.

use crate::events::{InboundMessage, InboundReaction, OutboundEvent};
use crate::script::{Responder, Scheduled};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

/// Default route prefix, matching the real messenger mock.
pub const DEFAULT_PREFIX: &str = "/signal/api/v1";

/// Shared state behind every route.
pub struct MockState {
    events: broadcast::Sender<OutboundEvent>,
    disconnect: watch::Sender<u64>,
    sends: Mutex<Vec<InboundMessage>>,
    reactions: Mutex<Vec<InboundReaction>>,
    responder: Arc<dyn Responder>,
}

impl std::fmt::Debug for MockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockState")
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl MockState {
    /// Fresh state driven by `responder`.
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        let (events, _) = broadcast::channel(1024);
        let (disconnect, _) = watch::channel(0);
        Self {
            events,
            disconnect,
            sends: Mutex::new(Vec::new()),
            reactions: Mutex::new(Vec::new()),
            responder,
        }
    }

    /// Push an event to every open stream. Returns the number of streams
    /// that received it.
    pub fn emit(&self, event: OutboundEvent) -> usize {
        debug!(target: "hf.mock", event = event.name(), "emitting");
        self.events.send(event).unwrap_or(0)
    }

    /// End every open `all_events` stream.
    pub fn disconnect_all(&self) {
        self.disconnect.send_modify(|n| *n += 1);
        info!(target: "hf.mock", "dropping all event streams");
    }

    /// Open `all_events` streams.
    pub fn subscribers(&self) -> usize {
        self.events.receiver_count()
    }

    /// User messages received so far.
    pub fn sends(&self) -> Vec<InboundMessage> {
        self.sends.lock().expect("sends lock poisoned").clone()
    }

    /// Reactions received so far.
    pub fn reactions(&self) -> Vec<InboundReaction> {
        self.reactions.lock().expect("reactions lock poisoned").clone()
    }

    fn schedule(self: &Arc<Self>, scheduled: Vec<Scheduled>) {
        for Scheduled { after, event } in scheduled {
            if after.is_zero() {
                self.emit(event);
                continue;
            }
            let state = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                state.emit(restamp(event));
            });
        }
    }
}

fn restamp(event: OutboundEvent) -> OutboundEvent {
    match event {
        OutboundEvent::Send { to, message, .. } => OutboundEvent::send(to, message),
        other => other,
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    let body = Json(json!({ "error": message.into() }));
    (StatusCode::BAD_REQUEST, body).into_response()
}

/// The mock's router with routes nested under `prefix`.
pub fn build_app(state: Arc<MockState>, prefix: &str) -> Router {
    let routes = Router::new()
        .route("/send", post(cmd_send))
        .route("/react", post(cmd_react))
        .route("/all_events", get(cmd_all_events))
        .with_state(state);
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    }
}

async fn cmd_send(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let message = match InboundMessage::from_value(body) {
        Ok(m) => m,
        Err(reason) => {
            warn!(target: "hf.mock", %reason, "rejecting send");
            return bad_request(reason);
        }
    };
    info!(target: "hf.mock", from = %message.source_name, text = %message.message, "user message");
    let scheduled = state.responder.respond(&message, Utc::now());
    state.sends.lock().expect("sends lock poisoned").push(message);
    state.schedule(scheduled);
    (StatusCode::CREATED, Json(json!({ "message": "success" }))).into_response()
}

async fn cmd_react(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let reaction: InboundReaction = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => return bad_request(e.to_string()),
    };
    info!(target: "hf.mock", from = %reaction.from, emoji = %reaction.reaction.emoji, "reaction");
    let scheduled = state.responder.on_reaction(&reaction, Utc::now());
    state
        .reactions
        .lock()
        .expect("reactions lock poisoned")
        .push(reaction);
    state.schedule(scheduled);
    Json(json!({ "status": "reaction received" })).into_response()
}

async fn cmd_all_events(
    State(state): State<Arc<MockState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut disconnect = state.disconnect.subscribe();
    let ended = async move {
        let _ = disconnect.changed().await;
    };
    let stream = BroadcastStream::new(state.events.subscribe())
        .filter_map(|item| async move {
            match item {
                Ok(event) => Some(Ok(event.to_sse())),
                Err(lagged) => {
                    warn!(target: "hf.mock", error = %lagged, "subscriber lagged");
                    None
                }
            }
        })
        .take_until(ended);
    debug!(target: "hf.mock", subscribers = state.subscribers(), "event stream opened");
    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ---------------------------------------------------------------------------
// Running server
// ---------------------------------------------------------------------------

/// A mock bound to a local port.
#[derive(Debug)]
pub struct RunningMock {
    addr: SocketAddr,
    base_url: String,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RunningMock {
    /// Bind `127.0.0.1:0` and serve under [`DEFAULT_PREFIX`].
    pub async fn start(responder: Arc<dyn Responder>) -> std::io::Result<Self> {
        Self::bind("127.0.0.1:0", DEFAULT_PREFIX, responder).await
    }

    /// Bind `addr` and serve under `prefix`.
    pub async fn bind(addr: &str, prefix: &str, responder: Arc<dyn Responder>) -> std::io::Result<Self> {
        let state = Arc::new(MockState::new(responder));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let app = build_app(Arc::clone(&state), prefix);
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await;
            if let Err(err) = served {
                warn!(target: "hf.mock", error = %err, "server stopped with error");
            }
        });
        let base_url = format!("http://{addr}{}", prefix.trim_end_matches('/'));
        info!(target: "hf.mock", %base_url, "mock messenger listening");
        Ok(Self {
            addr,
            base_url,
            state,
            shutdown: Some(tx),
            task: Some(task),
        })
    }

    /// Bound socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL including the prefix, suitable for `signal-mock.base-url`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared state for emitting events and inspecting traffic.
    pub fn state(&self) -> &Arc<MockState> {
        &self.state
    }

    /// Emit an assistant message to the user with number `to`.
    pub fn emit_send(&self, to: &str, message: &str) -> usize {
        self.state.emit(OutboundEvent::send(to, message))
    }

    /// Emit a delivery receipt for the user with number `to`.
    pub fn emit_receipt(&self, to: &str, timestamps: Vec<i64>) -> usize {
        self.state.emit(OutboundEvent::Receipt {
            to: to.to_string(),
            timestamps,
        })
    }

    /// Emit any event.
    pub fn emit(&self, event: OutboundEvent) -> usize {
        self.state.emit(event)
    }

    /// End every open event stream; clients may reconnect.
    pub fn disconnect_all(&self) {
        self.state.disconnect_all();
    }

    /// Open event streams.
    pub fn subscribers(&self) -> usize {
        self.state.subscribers()
    }

    /// User messages received so far.
    pub fn sends(&self) -> Vec<InboundMessage> {
        self.state.sends()
    }

    /// Reactions received so far.
    pub fn reactions(&self) -> Vec<InboundReaction> {
        self.state.reactions()
    }

    /// Close open streams and stop serving.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn stop(&mut self) {
        self.state.disconnect_all();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for RunningMock {
    fn drop(&mut self) {
        self.stop();
    }
}
