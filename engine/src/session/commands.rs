use tokio::sync::{broadcast, oneshot};

use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;
use crate::EngineEvaluation;

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Transport failed to spawn, the handshake timed out, or the engine
    /// process died.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    /// A best-move request was issued while another was still pending.
    #[error("a best-move request is already in flight")]
    RequestAlreadyInFlight,
    /// The engine ignored both the search deadline and the forced stop.
    #[error("engine did not produce a best move before the deadline")]
    Unresponsive,
    /// The session was disposed or its actor is gone.
    #[error("engine session closed")]
    SessionClosed,
}

/// Commands sent to the session actor. Requests with results embed a oneshot
/// for the reply; fire-and-forget commands carry none.
pub enum SessionCommand {
    Initialize {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    SetDifficulty {
        label: String,
    },
    SetPosition {
        fen: String,
        moves: Vec<String>,
    },
    RequestBestMove {
        think_time_ms: u64,
        reply: oneshot::Sender<Result<EngineEvaluation, EngineError>>,
    },
    StopThinking,
    NewGame,
    Dispose {
        reply: oneshot::Sender<()>,
    },
    GetSnapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SessionEvent>)>,
    },
}
