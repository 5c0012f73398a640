use tokio::sync::oneshot;
use tokio::time::Instant;

use super::commands::EngineError;
use super::snapshot::SessionSnapshot;
use crate::transport::{Connector, Transport, TransportEvent};
use crate::EngineEvaluation;

pub(crate) type InitReply = oneshot::Sender<Result<(), EngineError>>;
pub(crate) type BestMoveReply = oneshot::Sender<Result<EngineEvaluation, EngineError>>;

/// Where the startup handshake currently stands. `setoption` is only valid
/// between `uciok` and `isready`, hence the two waiting phases.
pub(crate) enum Handshake {
    Idle,
    /// `uci` sent, waiting for `uciok`.
    AwaitUciOk { reply: InitReply, deadline: Instant },
    /// Default options and `isready` sent, waiting for `readyok`.
    AwaitReadyOk { reply: InitReply, deadline: Instant },
}

impl Handshake {
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Handshake::Idle => None,
            Handshake::AwaitUciOk { deadline, .. } | Handshake::AwaitReadyOk { deadline, .. } => {
                Some(*deadline)
            }
        }
    }
}

/// The single outstanding best-move request.
pub(crate) struct PendingBestMove {
    pub reply: BestMoveReply,
    /// When to nudge an unresponsive engine with `stop`. Does not resolve
    /// the request by itself.
    pub stop_at: Instant,
    /// When to abandon the request entirely.
    pub hard_deadline: Instant,
    pub stop_sent: bool,
}

/// Internal mutable state, owned entirely by the session actor. No locks.
pub(crate) struct SessionState {
    pub connector: Box<dyn Connector>,
    pub transport: Option<Transport>,
    pub handshake: Handshake,
    pub ready: bool,
    /// Last engine evaluation in centipawns, mate-normalized. Only cleared
    /// by a game reset or disposal.
    pub evaluation_cp: Option<i32>,
    pub search_depth: u32,
    pub pending: Option<PendingBestMove>,
}

impl SessionState {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            transport: None,
            handshake: Handshake::Idle,
            ready: false,
            evaluation_cp: None,
            search_depth: 0,
            pending: None,
        }
    }

    /// Thinking is defined by the pending slot, so the two can never drift.
    pub fn thinking(&self) -> bool {
        self.pending.is_some()
    }

    pub fn evaluation_pawns(&self) -> Option<f64> {
        self.evaluation_cp.map(|cp| f64::from(cp) / 100.0)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            ready: self.ready,
            thinking: self.thinking(),
            evaluation_pawns: self.evaluation_pawns(),
            search_depth: self.search_depth,
        }
    }

    /// Next engine event; pends forever while no transport is attached. A
    /// silently dropped peer is reported as a closure.
    pub async fn next_transport_event(&mut self) -> TransportEvent {
        match self.transport.as_mut() {
            Some(transport) => transport
                .recv()
                .await
                .unwrap_or_else(|| TransportEvent::Closed("engine channel closed".into())),
            None => std::future::pending().await,
        }
    }

    /// Nearest armed timer: handshake deadline, safety stop, or the hard
    /// request deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        let request = self.pending.as_ref().map(|p| {
            if p.stop_sent {
                p.hard_deadline
            } else {
                p.stop_at
            }
        });
        match (self.handshake.deadline(), request) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
