//! Line channel between the session and an engine process.
//!
//! The session only ever sees a [`Transport`]; the other end of the pair is
//! held by whatever drives the real process (see [`crate::process`]) or by a
//! scripted fake in tests. Lines flow in both directions strictly in order.

use tokio::sync::{mpsc, oneshot};

/// One unit of engine output delivered to the session.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A single trimmed line of engine output.
    Line(String),
    /// The engine side is gone (process exit, broken pipe), with a reason.
    Closed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("engine binary not found")]
    EngineNotFound,
    #[error("failed to spawn engine process: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine process has no {0} pipe")]
    MissingPipe(&'static str),
    #[error("engine channel closed")]
    ChannelClosed,
}

/// Session-side end of the engine line channel.
#[derive(Debug)]
pub struct Transport {
    command_tx: mpsc::Sender<String>,
    event_rx: mpsc::Receiver<TransportEvent>,
    kill_tx: Option<oneshot::Sender<()>>,
}

/// Engine-side end: consumed by the process bridge, or by a test fake
/// standing in for the engine.
pub struct TransportPeer {
    pub command_rx: mpsc::Receiver<String>,
    pub event_tx: mpsc::Sender<TransportEvent>,
    pub kill_rx: oneshot::Receiver<()>,
}

impl Transport {
    /// Build a connected transport/peer pair.
    pub fn pair(capacity: usize) -> (Transport, TransportPeer) {
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (kill_tx, kill_rx) = oneshot::channel();
        (
            Transport {
                command_tx,
                event_rx,
                kill_tx: Some(kill_tx),
            },
            TransportPeer {
                command_rx,
                event_tx,
                kill_rx,
            },
        )
    }

    /// Queue one command line for the engine.
    pub async fn send(&self, line: String) -> Result<(), TransportError> {
        self.command_tx
            .send(line)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Next engine event. `None` means the peer dropped its sender.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.event_rx.recv().await
    }

    /// Signal the peer to tear the engine down. Idempotent; dropping the
    /// transport has the same effect.
    pub fn terminate(&mut self) {
        if let Some(kill) = self.kill_tx.take() {
            let _ = kill.send(());
        }
    }
}

/// Produces the transport on `initialize()`. Injected into the session so
/// tests can hand it a scripted pair instead of spawning a real engine.
pub trait Connector: Send + 'static {
    fn connect(&mut self) -> Result<Transport, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_flow_both_ways_in_order() {
        let (mut transport, mut peer) = Transport::pair(8);

        transport.send("uci".to_string()).await.unwrap();
        transport.send("isready".to_string()).await.unwrap();
        assert_eq!(peer.command_rx.recv().await.as_deref(), Some("uci"));
        assert_eq!(peer.command_rx.recv().await.as_deref(), Some("isready"));

        peer.event_tx
            .send(TransportEvent::Line("uciok".into()))
            .await
            .unwrap();
        peer.event_tx
            .send(TransportEvent::Line("readyok".into()))
            .await
            .unwrap();
        assert!(matches!(transport.recv().await, Some(TransportEvent::Line(l)) if l == "uciok"));
        assert!(matches!(transport.recv().await, Some(TransportEvent::Line(l)) if l == "readyok"));
    }

    #[tokio::test]
    async fn test_terminate_reaches_peer() {
        let (mut transport, peer) = Transport::pair(8);
        transport.terminate();
        // A second terminate must be a no-op, not a panic.
        transport.terminate();
        assert!(peer.kill_rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_drop_counts_as_terminate() {
        let (transport, peer) = Transport::pair(8);
        drop(transport);
        // Sender dropped without an explicit signal: recv errors, which the
        // peer treats the same as a kill.
        assert!(peer.kill_rx.await.is_err());
    }

    #[tokio::test]
    async fn test_send_after_peer_gone_errors() {
        let (transport, peer) = Transport::pair(8);
        drop(peer);
        let err = transport.send("go".to_string()).await.unwrap_err();
        assert!(matches!(err, TransportError::ChannelClosed));
    }
}
