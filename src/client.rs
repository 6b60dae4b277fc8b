//! ChatClient actor implementation
//!
//! The single execution context of the client. User intents from the
//! display surface and events from the transport task arrive on one
//! mpsc channel and are applied in arrival order to the current session.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::event::{SurfaceUpdate, UserIntent};
use crate::session::{ChatSession, SessionState};
use crate::transport::{spawn_transport, TransportEvent};
use crate::types::SessionId;

/// Commands processed by the ChatClient actor
#[derive(Debug)]
pub enum ClientCommand {
    /// Something the user asked for
    Intent(UserIntent),
    /// Event from the transport of the given session
    Transport {
        session_id: SessionId,
        event: TransportEvent,
    },
    /// Close any session and stop the actor
    Shutdown,
}

/// The client actor
///
/// Holds at most one session. A new connect replaces a session that is
/// `Idle` or `Closed`, never a live one.
pub struct ChatClient {
    config: ClientConfig,
    session: Option<ChatSession>,
    /// Command receiver channel
    receiver: mpsc::Receiver<ClientCommand>,
    /// Handed to transport tasks so their events join the same queue;
    /// weak so that dropping every external sender ends `run`
    cmd_tx: mpsc::WeakSender<ClientCommand>,
    surface: mpsc::UnboundedSender<SurfaceUpdate>,
}

impl ChatClient {
    pub fn new(
        config: ClientConfig,
        receiver: mpsc::Receiver<ClientCommand>,
        cmd_tx: &mpsc::Sender<ClientCommand>,
        surface: mpsc::UnboundedSender<SurfaceUpdate>,
    ) -> Self {
        Self {
            config,
            session: None,
            receiver,
            cmd_tx: cmd_tx.downgrade(),
            surface,
        }
    }

    /// State of the current session, if any was started
    pub fn session_state(&self) -> Option<SessionState> {
        self.session.as_ref().map(ChatSession::state)
    }

    /// Run the ChatClient event loop
    ///
    /// Processes commands until `Shutdown` arrives or all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatClient started, relay at {}", self.config.address());

        while let Some(cmd) = self.receiver.recv().await {
            let shutdown = matches!(cmd, ClientCommand::Shutdown);
            self.handle_command(cmd).await;
            if shutdown {
                break;
            }
        }

        if let Some(mut session) = self.session.take() {
            session.close();
        }
        info!("ChatClient shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ClientCommand) {
        match cmd {
            ClientCommand::Intent(UserIntent::Connect(name)) => {
                self.handle_connect(&name);
            }
            ClientCommand::Intent(UserIntent::Send(text)) => {
                self.handle_send(&text).await;
            }
            ClientCommand::Intent(UserIntent::Disconnect) => {
                if let Some(session) = self.session.as_mut() {
                    session.close();
                }
            }
            ClientCommand::Transport { session_id, event } => {
                self.handle_transport(session_id, event).await;
            }
            ClientCommand::Shutdown => {
                if let Some(mut session) = self.session.take() {
                    session.close();
                }
            }
        }
    }

    /// Handle a connect request
    fn handle_connect(&mut self, name: &str) {
        if let Some(session) = self.session.as_ref().filter(|s| s.is_live()) {
            warn!(
                "Connect ignored: session {} is still {:?}",
                session.id(),
                session.state()
            );
            return;
        }

        let mut session = ChatSession::new(self.config.framing, self.surface.clone());
        if session.connect(name).is_some() {
            let task = spawn_transport(self.config.address(), session.id(), self.cmd_tx.clone());
            session.attach(task);
        }

        self.session = Some(session);
    }

    /// Handle an outbound chat line
    async fn handle_send(&mut self, text: &str) {
        match self.session.as_mut() {
            Some(session) => session.send(text).await,
            None => debug!("Send ignored: no session"),
        }
    }

    /// Route a transport event to its session, dropping stale ones
    async fn handle_transport(&mut self, session_id: SessionId, event: TransportEvent) {
        match self.session.as_mut() {
            Some(session) if session.id() == session_id => session.handle_event(event).await,
            _ => debug!("Dropping {:?} from stale session {}", event, session_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    use crate::color::color_for;
    use crate::event::RenderedEvent;

    const WAIT: Duration = Duration::from_secs(5);

    /// Client driven by hand; the returned sender keeps its queue open
    fn new_client(
        config: ClientConfig,
    ) -> (
        ChatClient,
        mpsc::UnboundedReceiver<SurfaceUpdate>,
        mpsc::Sender<ClientCommand>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (surface_tx, surface_rx) = mpsc::unbounded_channel();
        let client = ChatClient::new(config, cmd_rx, &cmd_tx, surface_tx);
        (client, surface_rx, cmd_tx)
    }

    fn start(
        config: ClientConfig,
    ) -> (
        mpsc::Sender<ClientCommand>,
        mpsc::UnboundedReceiver<SurfaceUpdate>,
        JoinHandle<()>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (surface_tx, surface_rx) = mpsc::unbounded_channel();
        let client = ChatClient::new(config, cmd_rx, &cmd_tx, surface_tx);
        (cmd_tx, surface_rx, tokio::spawn(client.run()))
    }

    fn config_for(listener: &TcpListener) -> ClientConfig {
        ClientConfig {
            port: listener.local_addr().unwrap().port(),
            ..ClientConfig::default()
        }
    }

    async fn next_render(rx: &mut mpsc::UnboundedReceiver<SurfaceUpdate>) -> RenderedEvent {
        loop {
            let update = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
            if let SurfaceUpdate::Render { event } = update {
                return event;
            }
        }
    }

    async fn intent(cmd_tx: &mpsc::Sender<ClientCommand>, intent: UserIntent) {
        cmd_tx.send(ClientCommand::Intent(intent)).await.unwrap();
    }

    #[tokio::test]
    async fn test_end_to_end_echo() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (cmd_tx, mut rx, handle) = start(config_for(&listener));

        intent(&cmd_tx, UserIntent::Connect("bob".to_string())).await;
        let (mut relay, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();

        let mut name = [0u8; 3];
        relay.read_exact(&mut name).await.unwrap();
        assert_eq!(&name, b"bob");
        assert_eq!(
            next_render(&mut rx).await,
            RenderedEvent::system("You've joined the chat as bob!")
        );

        relay.write_all(b"bob: hello").await.unwrap();
        let event = next_render(&mut rx).await;
        assert_eq!(
            event,
            RenderedEvent::User {
                sender: "bob".to_string(),
                body: "hello".to_string(),
                color: color_for("bob"),
            }
        );
        if let RenderedEvent::User { color, .. } = event {
            assert_eq!(color.hue, 157);
        }

        intent(&cmd_tx, UserIntent::Send("hi all".to_string())).await;
        let mut text = [0u8; 6];
        relay.read_exact(&mut text).await.unwrap();
        assert_eq!(&text, b"hi all");

        drop(relay);
        assert_eq!(
            next_render(&mut rx).await,
            RenderedEvent::system("Connection closed")
        );

        cmd_tx.send(ClientCommand::Shutdown).await.unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_reserved_name_opens_nothing() {
        let (mut client, mut rx, _cmd_tx) = new_client(ClientConfig::default());

        client
            .handle_command(ClientCommand::Intent(UserIntent::Connect(
                "SERVER".to_string(),
            )))
            .await;

        assert_eq!(client.session_state(), Some(SessionState::Idle));
        assert_eq!(
            rx.try_recv().unwrap(),
            SurfaceUpdate::Render {
                event: RenderedEvent::system("The name SERVER is not allowed!")
            }
        );
        assert!(rx.try_recv().is_err());
        tokio::task::yield_now().await;
        assert!(client.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_while_live_is_ignored() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (mut client, _rx, _cmd_tx) = new_client(config_for(&listener));

        client
            .handle_command(ClientCommand::Intent(UserIntent::Connect("bob".to_string())))
            .await;
        let first = client.session.as_ref().unwrap().id();

        client
            .handle_command(ClientCommand::Intent(UserIntent::Connect(
                "alice".to_string(),
            )))
            .await;

        let session = client.session.as_ref().unwrap();
        assert_eq!(session.id(), first);
        assert_eq!(session.pending_identity().unwrap().as_str(), "bob");
    }

    #[tokio::test]
    async fn test_stale_events_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (mut client, mut rx, _cmd_tx) = new_client(config_for(&listener));

        client
            .handle_command(ClientCommand::Intent(UserIntent::Connect("bob".to_string())))
            .await;
        while rx.try_recv().is_ok() {}

        client
            .handle_command(ClientCommand::Transport {
                session_id: SessionId::new(),
                event: TransportEvent::Closed,
            })
            .await;

        assert_eq!(client.session_state(), Some(SessionState::Connecting));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_failure_allows_retry() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let config = ClientConfig {
            port: addr.port(),
            ..ClientConfig::default()
        };
        let (cmd_tx, mut rx, handle) = start(config);

        intent(&cmd_tx, UserIntent::Connect("bob".to_string())).await;
        match next_render(&mut rx).await {
            RenderedEvent::System { text } => assert!(text.starts_with("Failed to connect:")),
            other => panic!("Expected system notice, got {:?}", other),
        }

        // the closed session is replaced by a fresh one
        intent(&cmd_tx, UserIntent::Connect("".to_string())).await;
        assert_eq!(
            next_render(&mut rx).await,
            RenderedEvent::system("Empty name is not allowed!")
        );

        cmd_tx.send(ClientCommand::Shutdown).await.unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_closes_once() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (cmd_tx, mut rx, handle) = start(config_for(&listener));

        intent(&cmd_tx, UserIntent::Connect("carol".to_string())).await;
        let (_relay, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert_eq!(
            next_render(&mut rx).await,
            RenderedEvent::system("You've joined the chat as carol!")
        );

        intent(&cmd_tx, UserIntent::Disconnect).await;
        intent(&cmd_tx, UserIntent::Disconnect).await;
        cmd_tx.send(ClientCommand::Shutdown).await.unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap();

        let mut closed = 0;
        while let Ok(update) = rx.try_recv() {
            if update
                == (SurfaceUpdate::Render {
                    event: RenderedEvent::system("Connection closed"),
                })
            {
                closed += 1;
            }
        }
        assert_eq!(closed, 1);
    }

    #[tokio::test]
    async fn test_run_ends_when_senders_dropped() {
        let (cmd_tx, _rx, handle) = start(ClientConfig::default());
        drop(cmd_tx);
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_run_ends_with_live_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (cmd_tx, mut rx, handle) = start(config_for(&listener));

        intent(&cmd_tx, UserIntent::Connect("dave".to_string())).await;
        let (_relay, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert_eq!(
            next_render(&mut rx).await,
            RenderedEvent::system("You've joined the chat as dave!")
        );

        drop(cmd_tx);
        timeout(WAIT, handle).await.unwrap().unwrap();
        assert_eq!(
            next_render(&mut rx).await,
            RenderedEvent::system("Connection closed")
        );
    }
}
