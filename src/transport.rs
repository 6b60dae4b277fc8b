//! TCP transport for a single session
//!
//! One spawned task per session: connect, hand the write half to the
//! session, then forward every read chunk to the client actor until EOF
//! or error. Every event is tagged with the owning `SessionId`.

use tokio::io::{AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::ClientCommand;
use crate::error::{SendError, TransportError};
use crate::types::SessionId;

/// Read buffer size per chunk
pub const READ_BUFFER_SIZE: usize = 1024;

/// Write half of a session's connection
pub type TransportWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Transport → session
pub enum TransportEvent {
    /// Connection is up; the session takes ownership of the writer
    Established(TransportWriter),
    /// Raw bytes, not aligned to message boundaries
    Data(Vec<u8>),
    /// Peer closed the connection
    Closed,
    /// Connect or read failure
    Error(TransportError),
}

impl std::fmt::Debug for TransportEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Established(_) => f.write_str("Established"),
            Self::Data(bytes) => write!(f, "Data({} bytes)", bytes.len()),
            Self::Closed => f.write_str("Closed"),
            Self::Error(e) => write!(f, "Error({})", e),
        }
    }
}

/// Open a connection for `session_id` in the background
///
/// The returned handle is owned by the session and aborted when it
/// closes, so no events are produced after that. Events go through a
/// weak sender: the transport never keeps the client's queue open.
pub fn spawn_transport(
    addr: String,
    session_id: SessionId,
    cmd_tx: mpsc::WeakSender<ClientCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Session {} connecting to {}", session_id, addr);

        let stream = match TcpStream::connect(addr.as_str()).await {
            Ok(stream) => stream,
            Err(e) => {
                debug!("Session {} failed to connect to {}: {}", session_id, addr, e);
                let _ = report(
                    &cmd_tx,
                    session_id,
                    TransportEvent::Error(TransportError::Connect(e)),
                )
                .await;
                return;
            }
        };

        info!("Session {} connected to {}", session_id, addr);
        let (mut reader, writer) = stream.into_split();

        if report(&cmd_tx, session_id, TransportEvent::Established(Box::new(writer)))
            .await
            .is_err()
        {
            return;
        }

        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let event = match reader.read(&mut buffer).await {
                Ok(0) => {
                    debug!("Session {} reached EOF", session_id);
                    TransportEvent::Closed
                }
                Ok(n) => TransportEvent::Data(buffer[..n].to_vec()),
                Err(e) => {
                    debug!("Session {} read error: {}", session_id, e);
                    TransportEvent::Error(TransportError::Read(e))
                }
            };

            let terminal = matches!(event, TransportEvent::Closed | TransportEvent::Error(_));
            if report(&cmd_tx, session_id, event).await.is_err() || terminal {
                break;
            }
        }

        debug!("Read task ended for session {}", session_id);
    })
}

async fn report(
    cmd_tx: &mpsc::WeakSender<ClientCommand>,
    session_id: SessionId,
    event: TransportEvent,
) -> Result<(), SendError> {
    let Some(cmd_tx) = cmd_tx.upgrade() else {
        debug!("Client gone, dropping transport event for {}", session_id);
        return Err(SendError::ChannelClosed);
    };

    cmd_tx
        .send(ClientCommand::Transport { session_id, event })
        .await
        .map_err(|_| {
            debug!("Client closed, dropping transport event for {}", session_id);
            SendError::ChannelClosed
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn next_event(rx: &mut mpsc::Receiver<ClientCommand>) -> (SessionId, TransportEvent) {
        match rx.recv().await {
            Some(ClientCommand::Transport { session_id, event }) => (session_id, event),
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_read_and_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let id = SessionId::new();

        let _task = spawn_transport(addr.to_string(), id, tx.downgrade());
        let (mut peer, _) = listener.accept().await.unwrap();

        let (session_id, event) = next_event(&mut rx).await;
        assert_eq!(session_id, id);
        assert!(matches!(event, TransportEvent::Established(_)));

        peer.write_all(b"SERVER: welcome").await.unwrap();
        let (_, event) = next_event(&mut rx).await;
        match event {
            TransportEvent::Data(bytes) => assert_eq!(bytes, b"SERVER: welcome".to_vec()),
            other => panic!("Expected data, got {:?}", other),
        }

        drop(peer);
        let (_, event) = next_event(&mut rx).await;
        assert!(matches!(event, TransportEvent::Closed));
    }

    #[tokio::test]
    async fn test_connect_refused_reports_error() {
        // bind then drop to get a port with no listener
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let (tx, mut rx) = mpsc::channel(16);

        let _task = spawn_transport(addr.to_string(), SessionId::new(), tx.downgrade());

        let (_, event) = next_event(&mut rx).await;
        match event {
            TransportEvent::Error(TransportError::Connect(_)) => {}
            other => panic!("Expected connect error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stops_when_client_gone() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(16);
        let weak = tx.downgrade();
        drop(tx);
        drop(rx);

        let task = spawn_transport(addr.to_string(), SessionId::new(), weak);
        let _peer = listener.accept().await.unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
