use serde::Serialize;

/// Point-in-time view of the session, returned on subscribe and on demand.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// True once the engine completed its handshake.
    pub ready: bool,
    /// True while a best-move request is outstanding.
    pub thinking: bool,
    /// Last reported evaluation in pawns, unset before any search and after
    /// a game reset.
    pub evaluation_pawns: Option<f64>,
    /// Depth of the most recent `info` line in the current search.
    pub search_depth: u32,
}
