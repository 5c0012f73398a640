use tokio::sync::{broadcast, mpsc, oneshot};

use super::actor::run_engine_actor;
use super::commands::{EngineError, SessionCommand};
use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;
use super::state::SessionState;
use crate::transport::Connector;
use crate::EngineEvaluation;

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

/// Cheap, cloneable handle to the engine session actor.
///
/// One session owns one engine transport. Methods never block; results are
/// delivered when the corresponding engine answer arrives. Dropping the last
/// handle tears the engine down.
#[derive(Clone)]
pub struct EngineSession {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl EngineSession {
    /// Spawn the session actor. The engine process itself is not started
    /// until [`EngineSession::initialize`].
    pub fn spawn(connector: impl Connector) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        let state = SessionState::new(Box::new(connector));
        tokio::spawn(run_engine_actor(state, cmd_rx, event_tx));
        Self { cmd_tx }
    }

    /// Start the engine and complete the UCI handshake. Idempotent: once a
    /// transport exists the call resolves immediately.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Initialize { reply: tx }).await?;
        rx.await.map_err(|_| EngineError::SessionClosed)?
    }

    /// Map a difficulty label onto engine strength options. Fire-and-forget;
    /// a no-op while no engine is attached.
    pub async fn set_difficulty(&self, label: &str) {
        let _ = self
            .cmd_tx
            .send(SessionCommand::SetDifficulty {
                label: label.to_string(),
            })
            .await;
    }

    /// Point the engine at a position. The FEN is forwarded untouched;
    /// validation belongs to the rules engine.
    pub async fn set_position(&self, fen: &str) {
        self.set_position_with_moves(fen, &[]).await;
    }

    /// Point the engine at the position reached by playing `moves` from `fen`.
    pub async fn set_position_with_moves(&self, fen: &str, moves: &[String]) {
        let _ = self
            .cmd_tx
            .send(SessionCommand::SetPosition {
                fen: fen.to_string(),
                moves: moves.to_vec(),
            })
            .await;
    }

    /// Ask the engine for the best move in the current position. At most one
    /// request may be outstanding.
    pub async fn request_best_move(
        &self,
        think_time_ms: u64,
    ) -> Result<EngineEvaluation, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::RequestBestMove {
            think_time_ms,
            reply: tx,
        })
        .await?;
        rx.await.map_err(|_| EngineError::SessionClosed)?
    }

    /// Force the engine to conclude the current search. The outstanding
    /// request still resolves through the resulting `bestmove`.
    pub async fn stop_thinking(&self) {
        let _ = self.cmd_tx.send(SessionCommand::StopThinking).await;
    }

    /// Reset the engine for a fresh game; clears the last evaluation.
    pub async fn new_game(&self) {
        let _ = self.cmd_tx.send(SessionCommand::NewGame).await;
    }

    /// Quit the engine and release the transport. Idempotent; the session
    /// may be initialized again afterwards.
    pub async fn dispose(&self) {
        let (tx, rx) = oneshot::channel();
        if self.send(SessionCommand::Dispose { reply: tx }).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::GetSnapshot { reply: tx }).await?;
        rx.await.map_err(|_| EngineError::SessionClosed)
    }

    /// Current state plus a live event stream.
    pub async fn subscribe(
        &self,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SessionEvent>), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Subscribe { reply: tx }).await?;
        rx.await.map_err(|_| EngineError::SessionClosed)
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), EngineError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::SessionClosed)
    }
}
