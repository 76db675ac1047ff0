//! Session lifecycle state machine.
//!
//! # States
//! ```text
//! Connecting ──backend up──▶ Active ──either side closes/fails──▶ Closing ──▶ Closed
//!      │                                                            ▲
//!      └────────────── backend connect failed ──────────────────────┘
//! ```
//!
//! [`SessionCore`] holds no sockets. The session driver turns socket
//! readiness into [`SessionEvent`]s, feeds them in one at a time, and carries
//! out the returned [`SessionAction`]s. Every close-propagation rule lives in
//! [`SessionCore::handle`].

use bytes::Bytes;
use serde::Serialize;

use crate::protocol::{codec, FrameError, Reassembler};
use crate::relay::Envelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    /// Connecting or Active.
    pub fn is_live(self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Active)
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Active) | (Connecting, Closing) | (Active, Closing) | (Closing, Closed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session left the live states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCause {
    ConnectFailed,
    ClientClosed,
    ClientError,
    BackendClosed,
    BackendError,
    MalformedFrame,
    Shutdown,
}

impl CloseCause {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseCause::ConnectFailed => "connect_failed",
            CloseCause::ClientClosed => "client_closed",
            CloseCause::ClientError => "client_error",
            CloseCause::BackendClosed => "backend_closed",
            CloseCause::BackendError => "backend_error",
            CloseCause::MalformedFrame => "malformed_frame",
            CloseCause::Shutdown => "shutdown",
        }
    }
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    BackendConnected,
    /// Diagnostic text for the client.
    BackendConnectFailed(String),
    ClientText(String),
    ClientBinary(Bytes),
    ClientClosed,
    ClientError(String),
    BackendData(Bytes),
    BackendClosed,
    BackendError(String),
    Shutdown,
}

/// How the client side should be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Backend finished normally.
    Normal,
    /// Bridge is shutting down.
    GoingAway,
    /// Relay failure; a diagnostic was sent first.
    Error,
}

/// Work the driver must perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SendToBackend(Bytes),
    SendToClient(Envelope),
    CloseBackend,
    CloseClient(CloseReason),
}

/// Sans-I/O session core: lifecycle state plus the backend reassembly buffer.
#[derive(Debug)]
pub struct SessionCore {
    state: SessionState,
    reassembler: Reassembler,
    max_frame_size: u32,
    /// Client messages received before the backend connection was up.
    pending: Vec<Bytes>,
    client_open: bool,
    backend_open: bool,
    cause: Option<CloseCause>,
}

impl SessionCore {
    pub fn new(max_frame_size: u32) -> Self {
        Self {
            state: SessionState::Connecting,
            reassembler: Reassembler::new(max_frame_size),
            max_frame_size,
            pending: Vec::new(),
            client_open: true,
            backend_open: false,
            cause: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn close_cause(&self) -> Option<CloseCause> {
        self.cause
    }

    /// Whether the client side still needs closing.
    pub fn is_client_open(&self) -> bool {
        self.client_open
    }

    /// Whether the backend side still needs closing.
    pub fn is_backend_open(&self) -> bool {
        self.backend_open
    }

    /// Bytes of a backend frame still waiting for the rest of its payload.
    pub fn buffered(&self) -> usize {
        self.reassembler.buffered()
    }

    /// Process one event. Events after the session left the live states are
    /// ignored, so repeated close signals are no-ops.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match self.state {
            SessionState::Connecting => self.on_connecting(event),
            SessionState::Active => self.on_active(event),
            SessionState::Closing | SessionState::Closed => {
                tracing::trace!(state = %self.state, event = ?event, "Ignoring event on closing session");
                Vec::new()
            }
        }
    }

    /// Both endpoints have been released: Closing → Closed.
    pub fn complete_close(&mut self) {
        if self.state == SessionState::Closing {
            self.transition(SessionState::Closed);
        }
    }

    fn on_connecting(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::BackendConnected => {
                self.backend_open = true;
                self.transition(SessionState::Active);
                self.pending
                    .drain(..)
                    .map(SessionAction::SendToBackend)
                    .collect()
            }
            SessionEvent::BackendConnectFailed(description) => {
                self.begin_close(CloseCause::ConnectFailed);
                vec![
                    SessionAction::SendToClient(Envelope::error(description)),
                    self.close_client(CloseReason::Error),
                ]
            }
            SessionEvent::ClientText(text) => self.queue_or_reject(&text),
            SessionEvent::ClientBinary(data) => match std::str::from_utf8(&data) {
                Ok(text) => self.queue_or_reject(text),
                Err(_) => vec![binary_rejected()],
            },
            SessionEvent::ClientClosed => {
                self.client_open = false;
                self.begin_close(CloseCause::ClientClosed);
                Vec::new()
            }
            SessionEvent::ClientError(_) => {
                self.client_open = false;
                self.begin_close(CloseCause::ClientError);
                Vec::new()
            }
            SessionEvent::Shutdown => {
                self.begin_close(CloseCause::Shutdown);
                vec![self.close_client(CloseReason::GoingAway)]
            }
            SessionEvent::BackendData(_) | SessionEvent::BackendClosed | SessionEvent::BackendError(_) => {
                tracing::warn!(event = ?event, "Backend event before connection established");
                Vec::new()
            }
        }
    }

    fn on_active(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::ClientText(text) => vec![self.frame_for_backend(&text)],
            SessionEvent::ClientBinary(data) => match std::str::from_utf8(&data) {
                Ok(text) => vec![self.frame_for_backend(text)],
                Err(_) => vec![binary_rejected()],
            },
            SessionEvent::BackendData(data) => self.relay_backend_bytes(&data),
            SessionEvent::ClientClosed => {
                self.client_open = false;
                self.begin_close(CloseCause::ClientClosed);
                vec![self.close_backend()]
            }
            SessionEvent::ClientError(description) => {
                tracing::debug!(error = %description, "Client connection failed");
                self.client_open = false;
                self.begin_close(CloseCause::ClientError);
                vec![self.close_backend()]
            }
            SessionEvent::BackendClosed => {
                if !self.reassembler.is_empty() {
                    tracing::debug!(
                        buffered = self.reassembler.buffered(),
                        "Backend closed mid-frame, discarding partial frame"
                    );
                }
                self.backend_open = false;
                self.begin_close(CloseCause::BackendClosed);
                vec![self.close_client(CloseReason::Normal)]
            }
            SessionEvent::BackendError(description) => {
                self.backend_open = false;
                self.begin_close(CloseCause::BackendError);
                vec![
                    SessionAction::SendToClient(Envelope::error(description)),
                    self.close_client(CloseReason::Error),
                ]
            }
            SessionEvent::Shutdown => {
                self.begin_close(CloseCause::Shutdown);
                vec![self.close_client(CloseReason::GoingAway), self.close_backend()]
            }
            SessionEvent::BackendConnected | SessionEvent::BackendConnectFailed(_) => {
                tracing::warn!(event = ?event, "Connect event on active session");
                Vec::new()
            }
        }
    }

    fn queue_or_reject(&mut self, text: &str) -> Vec<SessionAction> {
        match codec::encode_with_limit(text, self.max_frame_size) {
            Ok(frame) => {
                self.pending.push(frame);
                Vec::new()
            }
            Err(e) => vec![message_rejected(&e)],
        }
    }

    /// Frame one client message. An oversized message is refused without
    /// touching the backend stream, so the session stays usable.
    fn frame_for_backend(&self, text: &str) -> SessionAction {
        match codec::encode_with_limit(text, self.max_frame_size) {
            Ok(frame) => SessionAction::SendToBackend(frame),
            Err(e) => message_rejected(&e),
        }
    }

    fn relay_backend_bytes(&mut self, data: &[u8]) -> Vec<SessionAction> {
        let drained = self.reassembler.push(data);

        let mut actions = Vec::with_capacity(drained.frames.len());
        for frame in drained.frames {
            match frame.into_json_text() {
                Ok(text) => actions.push(SessionAction::SendToClient(Envelope::BackendResponse(text))),
                Err(e) => {
                    // Frames after a corrupt one are dropped with the stream.
                    actions.extend(self.fail_malformed(&e));
                    return actions;
                }
            }
        }
        if let Some(e) = drained.error {
            actions.extend(self.fail_malformed(&e));
        }
        actions
    }

    fn fail_malformed(&mut self, error: &FrameError) -> Vec<SessionAction> {
        tracing::warn!(error = %error, "Malformed frame from backend, closing session");
        self.reassembler.clear();
        self.begin_close(CloseCause::MalformedFrame);
        vec![
            SessionAction::SendToClient(Envelope::error(format!("malformed_payload: {}", error))),
            self.close_client(CloseReason::Error),
            self.close_backend(),
        ]
    }

    fn begin_close(&mut self, cause: CloseCause) {
        if self.state.is_live() {
            self.cause = Some(cause);
            self.transition(SessionState::Closing);
        }
    }

    fn close_client(&mut self, reason: CloseReason) -> SessionAction {
        self.client_open = false;
        SessionAction::CloseClient(reason)
    }

    fn close_backend(&mut self) -> SessionAction {
        self.backend_open = false;
        SessionAction::CloseBackend
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid session transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(from = %self.state, to = %next, "Session state transition");
        self.state = next;
    }
}

fn message_rejected(error: &FrameError) -> SessionAction {
    SessionAction::SendToClient(Envelope::error(format!("message rejected: {}", error)))
}

fn binary_rejected() -> SessionAction {
    SessionAction::SendToClient(Envelope::error(
        "message rejected: binary messages must be UTF-8 JSON",
    ))
}
