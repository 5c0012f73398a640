/// Events broadcast from the session actor to all subscribers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Handshake completed; the engine accepts position and search commands.
    Ready,
    /// A best-move request started (true) or finished (false).
    Thinking(bool),
    /// Evaluation update during an active search (frequent, lightweight).
    Evaluation { pawns: f64, depth: u32 },
    /// Transport or protocol failure notification.
    Error(String),
}
