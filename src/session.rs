//! Chat session state machine
//!
//! One `ChatSession` per connection attempt:
//! `Idle → Connecting → Active → Closed`. The session validates the
//! identity, performs the registration handshake, writes outbound text,
//! classifies inbound text and pushes every visible change to the
//! display surface. `Closed` is terminal; reconnecting needs a new
//! session.

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::TransportError;
use crate::event::{Controls, RenderedEvent, SurfaceUpdate};
use crate::framing::{encode, Deframer, Framing};
use crate::message::classify;
use crate::transport::{TransportEvent, TransportWriter};
use crate::types::{Identity, SessionId};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Closed,
}

/// A single client-to-relay connection
///
/// Exclusively owns its transport: the write half once established and
/// the background read task. Both are discarded on entering `Closed`.
pub struct ChatSession {
    id: SessionId,
    state: SessionState,
    /// Validated name awaiting the registration handshake
    pending: Option<Identity>,
    identity: Option<Identity>,
    framing: Framing,
    deframer: Deframer,
    writer: Option<TransportWriter>,
    task: Option<JoinHandle<()>>,
    surface: mpsc::UnboundedSender<SurfaceUpdate>,
}

impl ChatSession {
    pub fn new(framing: Framing, surface: mpsc::UnboundedSender<SurfaceUpdate>) -> Self {
        Self {
            id: SessionId::new(),
            state: SessionState::Idle,
            pending: None,
            identity: None,
            framing,
            deframer: Deframer::new(framing),
            writer: None,
            task: None,
            surface,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Registered name, set once the handshake has been sent
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Name accepted by `connect` but not yet registered with the relay
    pub fn pending_identity(&self) -> Option<&Identity> {
        self.pending.as_ref()
    }

    /// True while the session holds or is opening a transport
    pub fn is_live(&self) -> bool {
        matches!(self.state, SessionState::Connecting | SessionState::Active)
    }

    /// `Idle → Connecting`, guarded by identity validation
    ///
    /// Returns the accepted identity; the caller then opens the transport.
    /// On rejection the reason is shown and the session stays `Idle`.
    pub fn connect(&mut self, name: &str) -> Option<&Identity> {
        if self.state != SessionState::Idle {
            warn!("Session {} cannot connect from {:?}", self.id, self.state);
            return None;
        }

        match Identity::parse(name) {
            Ok(identity) => {
                info!("Session {} connecting as '{}'", self.id, identity);
                self.pending = Some(identity);
                self.state = SessionState::Connecting;
                self.emit(SurfaceUpdate::Controls {
                    controls: Controls::CONNECTING,
                });
                self.pending.as_ref()
            }
            Err(e) => {
                warn!("Session {} rejected name {:?}: {}", self.id, name, e);
                self.notice(e.to_string());
                None
            }
        }
    }

    /// Take ownership of the background transport task
    pub fn attach(&mut self, task: JoinHandle<()>) {
        if self.state == SessionState::Closed {
            task.abort();
            return;
        }
        self.task = Some(task);
    }

    /// Apply one transport event
    pub async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Established(writer) => self.on_established(writer).await,
            TransportEvent::Data(bytes) => self.on_data(&bytes),
            TransportEvent::Closed => self.close(),
            TransportEvent::Error(e) => self.fail(e),
        }
    }

    /// `Connecting → Active`: send the identity as the first payload
    async fn on_established(&mut self, mut writer: TransportWriter) {
        if self.state != SessionState::Connecting {
            debug!("Session {} ignoring late connection in {:?}", self.id, self.state);
            return;
        }
        let Some(identity) = self.pending.take() else {
            return;
        };

        let payload = encode(self.framing, identity.as_str());
        if let Err(e) = write_payload(&mut writer, &payload).await {
            self.fail(TransportError::Handshake(e));
            return;
        }

        self.writer = Some(writer);
        self.state = SessionState::Active;
        info!("Session {} registered as '{}'", self.id, identity);
        self.identity = Some(identity.clone());

        self.emit(SurfaceUpdate::Status {
            online: true,
            text: format!("Connected as {}", identity),
        });
        self.emit(SurfaceUpdate::Controls {
            controls: Controls::CHATTING,
        });
        self.notice(format!("You've joined the chat as {}!", identity));
    }

    /// Transmit user text verbatim; a no-op unless `Active`
    pub async fn send(&mut self, text: &str) {
        if self.state != SessionState::Active {
            debug!("Session {} dropping send in {:?}", self.id, self.state);
            return;
        }
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let payload = encode(self.framing, text);
        let result = write_payload(writer, &payload).await;
        match result {
            Ok(()) => debug!("Session {} sent {} bytes", self.id, payload.len()),
            Err(e) => self.fail(TransportError::Write(e)),
        }
    }

    /// Classify and render inbound bytes in arrival order
    pub fn on_data(&mut self, bytes: &[u8]) {
        if self.state != SessionState::Active {
            debug!("Session {} dropping {} bytes in {:?}", self.id, bytes.len(), self.state);
            return;
        }

        for text in self.deframer.push(bytes) {
            let event = RenderedEvent::from(classify(&text));
            self.emit(SurfaceUpdate::Render { event });
        }
    }

    /// Peer or local close. Idempotent.
    pub fn close(&mut self) {
        match self.state {
            SessionState::Closed | SessionState::Idle => {
                debug!("Session {} close ignored in {:?}", self.id, self.state);
            }
            SessionState::Connecting | SessionState::Active => {
                info!("Session {} closed", self.id);
                self.notice("Connection closed");
                self.enter_closed();
            }
        }
    }

    /// Transport failure: report it and go straight to `Closed`
    pub fn fail(&mut self, err: TransportError) {
        if self.state == SessionState::Closed {
            debug!("Session {} ignoring error after close: {}", self.id, err);
            return;
        }
        error!("Session {} transport error: {}", self.id, err);
        self.notice(err.to_string());
        self.enter_closed();
    }

    fn enter_closed(&mut self) {
        self.state = SessionState::Closed;
        self.writer = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }

        self.emit(SurfaceUpdate::Controls {
            controls: Controls::DISCONNECTED,
        });
        self.emit(SurfaceUpdate::Status {
            online: false,
            text: "Disconnected".to_string(),
        });
    }

    fn notice(&self, text: impl Into<String>) {
        self.emit(SurfaceUpdate::Render {
            event: RenderedEvent::system(text),
        });
    }

    fn emit(&self, update: SurfaceUpdate) {
        if self.surface.send(update).is_err() {
            debug!("Display surface gone, update dropped for {}", self.id);
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn write_payload(writer: &mut TransportWriter, payload: &[u8]) -> std::io::Result<()> {
    writer.write_all(payload).await?;
    writer.flush().await
}
