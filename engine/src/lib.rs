//! Bridge to a UCI chess engine running as an isolated process.
//!
//! The UI layer talks to an [`EngineSession`]: a cloneable handle backed by an
//! actor task that owns the engine transport, speaks the UCI line protocol,
//! and turns engine output into best-move results and evaluation updates.
//! Move legality, FEN validation and game state live in the external rules
//! engine; this crate only serializes positions out and parses engine lines
//! back in.

pub mod difficulty;
pub mod process;
pub mod session;
pub mod transport;
pub mod uci;

pub use difficulty::Difficulty;
pub use process::ProcessConnector;
pub use session::{EngineError, EngineSession, SessionEvent, SessionSnapshot};
pub use transport::{Connector, Transport, TransportError, TransportEvent, TransportPeer};
pub use uci::{parse_line, Score, UciEvent};

use serde::Serialize;

/// Move sentinel the engine reports when the position has no legal move.
pub const NO_MOVE: &str = "(none)";

/// Result of a completed best-move request.
#[derive(Debug, Clone, Serialize)]
pub struct EngineEvaluation {
    /// Engine move in coordinate notation (`e2e4`, `e7e8q`), or [`NO_MOVE`].
    pub best_move: String,
    /// Predicted reply, when the engine offers one.
    pub ponder: Option<String>,
    /// Last reported evaluation in pawns, from the side to move's perspective.
    pub evaluation_pawns: Option<f64>,
    /// Depth of the deepest `info` line seen during the search.
    pub search_depth: u32,
}

impl EngineEvaluation {
    /// False when the engine reported the no-legal-move sentinel.
    pub fn has_move(&self) -> bool {
        self.best_move != NO_MOVE
    }
}
