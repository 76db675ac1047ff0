//! WebSocket ⇄ backend session driver.
//!
//! # Data Flow
//! ```text
//! Browser ──text──▶ SessionCore ──frame──▶ Backend
//! Browser ◀─{"backendResponse"}── SessionCore ◀─bytes── Backend
//! ```
//!
//! One task per session owns both sockets. Readiness on either side (or
//! the shutdown signal) becomes a [`SessionEvent`]; the core decides, this
//! module performs the resulting I/O. Closing one side always closes the
//! other, and no I/O happens once the core leaves the live states.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use bytes::BytesMut;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::net::{BackendTarget, SessionId};
use crate::observability::metrics;
use crate::relay::registry::{SessionEntry, SessionRegistry};
use crate::relay::state::{CloseReason, SessionAction, SessionCore, SessionEvent, SessionState};

const READ_CHUNK: usize = 8 * 1024;

/// Everything a session needs besides its client socket.
pub struct SessionContext {
    pub target: BackendTarget,
    pub connect_timeout: Duration,
    pub max_frame_size: u32,
    pub registry: SessionRegistry,
    pub shutdown: broadcast::Receiver<()>,
    pub client_addr: Option<SocketAddr>,
}

/// Run one session to completion.
pub async fn run_session(socket: WebSocket, ctx: SessionContext) {
    let id = SessionId::new();
    let span = tracing::info_span!("session", session_id = %id, client = ?ctx.client_addr);
    drive(id, socket, ctx).instrument(span).await
}

async fn drive(id: SessionId, socket: WebSocket, ctx: SessionContext) {
    let SessionContext {
        target,
        connect_timeout,
        max_frame_size,
        registry,
        mut shutdown,
        client_addr,
    } = ctx;

    tracing::info!(backend = %target, "Session opened");
    metrics::record_session_opened();

    let (ws_tx, mut ws_rx) = socket.split();
    let mut core = SessionCore::new(max_frame_size);
    let mut io = Endpoints {
        ws_tx,
        backend_wr: None,
    };

    registry.register(
        id,
        SessionEntry::new(target.to_string(), client_addr).with_state(core.state()),
    );

    // The client stays readable while the connect is in flight: early
    // messages are queued by the core and a close abandons the attempt.
    let connect = target.connect(connect_timeout);
    tokio::pin!(connect);
    let stream = loop {
        let event = tokio::select! {
            result = &mut connect => match result {
                Ok(stream) => break Some(stream),
                Err(e) => {
                    tracing::warn!(backend = %target, error = %e, "Backend connect failed");
                    Some(SessionEvent::BackendConnectFailed(format!("{}: {}", e.kind(), e)))
                }
            },
            message = ws_rx.next() => client_event(message),
            _ = shutdown.recv() => Some(SessionEvent::Shutdown),
        };

        if let Some(event) = event {
            io.apply(&mut core, event).await;
            registry.set_state(id, core.state());
        }
        if core.state() != SessionState::Connecting {
            break None;
        }
    };

    let Some(stream) = stream else {
        drop(ws_rx);
        return finish(id, &mut core, io, &registry).await;
    };

    registry.set_backend_local_addr(id, stream.local_addr().ok());
    let (mut backend_rd, backend_wr) = stream.into_split();
    io.backend_wr = Some(backend_wr);
    io.apply(&mut core, SessionEvent::BackendConnected).await;
    registry.set_state(id, core.state());

    let mut read_buf = BytesMut::with_capacity(READ_CHUNK);
    while core.state() == SessionState::Active {
        read_buf.reserve(READ_CHUNK);

        let event = tokio::select! {
            message = ws_rx.next() => client_event(message),
            result = backend_rd.read_buf(&mut read_buf) => Some(match result {
                Ok(0) => SessionEvent::BackendClosed,
                Ok(_) => SessionEvent::BackendData(read_buf.split().freeze()),
                Err(e) => SessionEvent::BackendError(format!("io: {}", e)),
            }),
            _ = shutdown.recv() => Some(SessionEvent::Shutdown),
        };

        if let Some(event) = event {
            io.apply(&mut core, event).await;
            registry.set_state(id, core.state());
        }
    }

    drop(backend_rd);
    drop(ws_rx);
    finish(id, &mut core, io, &registry).await
}

/// Release whatever is still open and drop the registry entry.
async fn finish(id: SessionId, core: &mut SessionCore, mut io: Endpoints, registry: &SessionRegistry) {
    registry.set_state(id, core.state());
    io.release().await;
    core.complete_close();
    registry.unregister(id);

    let cause = core.close_cause().map(|c| c.as_str()).unwrap_or("unknown");
    tracing::info!(cause, state = %core.state(), "Session closed");
    metrics::record_session_closed(cause);
}

/// Translate a client read into an event. Ping/pong is handled by the
/// WebSocket layer and produces nothing.
fn client_event(message: Option<Result<Message, axum::Error>>) -> Option<SessionEvent> {
    match message {
        Some(Ok(Message::Text(text))) => Some(SessionEvent::ClientText(text.as_str().to_owned())),
        Some(Ok(Message::Binary(data))) => Some(SessionEvent::ClientBinary(data)),
        Some(Ok(Message::Close(_))) | None => Some(SessionEvent::ClientClosed),
        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => None,
        Some(Err(e)) => Some(SessionEvent::ClientError(e.to_string())),
    }
}

/// The two halves a session writes to.
struct Endpoints {
    ws_tx: SplitSink<WebSocket, Message>,
    backend_wr: Option<OwnedWriteHalf>,
}

impl Endpoints {
    /// Feed `event` to the core and perform its actions. A failed write
    /// becomes a new event for the core, handled in the same pass.
    async fn apply(&mut self, core: &mut SessionCore, event: SessionEvent) {
        let mut queue: VecDeque<SessionAction> = core.handle(event).into();
        while let Some(action) = queue.pop_front() {
            if let Some(followup) = self.execute(action).await {
                queue.extend(core.handle(followup));
            }
        }
    }

    async fn execute(&mut self, action: SessionAction) -> Option<SessionEvent> {
        match action {
            SessionAction::SendToBackend(frame) => {
                let writer = self.backend_wr.as_mut()?;
                match writer.write_all(&frame).await {
                    Ok(()) => {
                        metrics::record_frame_relayed("to_backend");
                        None
                    }
                    Err(e) => Some(SessionEvent::BackendError(format!("io: {}", e))),
                }
            }
            SessionAction::SendToClient(envelope) => {
                let is_frame = !envelope.is_error();
                match self.ws_tx.send(Message::Text(envelope.to_json().into())).await {
                    Ok(()) => {
                        if is_frame {
                            metrics::record_frame_relayed("to_client");
                        }
                        None
                    }
                    Err(e) => Some(SessionEvent::ClientError(e.to_string())),
                }
            }
            SessionAction::CloseBackend => {
                if let Some(mut writer) = self.backend_wr.take() {
                    let _ = writer.shutdown().await;
                }
                None
            }
            SessionAction::CloseClient(reason) => {
                let (code, text) = match reason {
                    CloseReason::Normal => (close_code::NORMAL, "backend closed"),
                    CloseReason::GoingAway => (close_code::AWAY, "bridge shutting down"),
                    CloseReason::Error => (close_code::ERROR, "relay error"),
                };
                let frame = CloseFrame {
                    code,
                    reason: text.into(),
                };
                let _ = self.ws_tx.send(Message::Close(Some(frame))).await;
                None
            }
        }
    }

    /// Close both sides. Closing an already-closed side is a no-op.
    async fn release(&mut self) {
        if let Some(mut writer) = self.backend_wr.take() {
            let _ = writer.shutdown().await;
        }
        let _ = self.ws_tx.close().await;
    }
}

