use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};
use tracing::Instrument;

use super::commands::{EngineError, SessionCommand};
use super::events::SessionEvent;
use super::state::{Handshake, PendingBestMove, SessionState};
use crate::uci::{parse_line, UciEvent};
use crate::EngineEvaluation;

/// Absolute limit on the whole `uci`..`readyok` handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Engines need a minimum think time to produce any analysis at all.
const MIN_THINK_TIME_MS: u64 = 300;

/// Past the requested think time, how long to wait before forcing `stop`.
const SAFETY_STOP_GRACE_MS: u64 = 2000;

/// Past the requested think time, how long before abandoning the request.
const HARD_DEADLINE_GRACE_MS: u64 = 5000;

const DEFAULT_HASH_MB: u32 = 16;
const DEFAULT_THREADS: u32 = 1;

/// The session actor loop. Owns all mutable state; processes commands,
/// engine output and timer deadlines sequentially, in that priority order.
pub(crate) async fn run_engine_actor(
    state: SessionState,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    run_engine_actor_inner(state, cmd_rx, event_tx)
        .instrument(tracing::info_span!("engine_session"))
        .await;
}

async fn run_engine_actor_inner(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    tracing::info!("Engine session actor started");

    loop {
        let deadline = state.next_deadline();

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&mut state, cmd, &event_tx).await,
                    None => {
                        // Every handle is gone; quit the engine on the way out.
                        dispose(&mut state).await;
                        break;
                    }
                }
            }

            event = state.next_transport_event() => {
                handle_transport_event(&mut state, event, &event_tx).await;
            }

            _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                handle_deadline(&mut state, &event_tx).await;
            }
        }
    }

    tracing::info!("Engine session actor exited");
}

async fn handle_command(
    state: &mut SessionState,
    cmd: SessionCommand,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match cmd {
        SessionCommand::Initialize { reply } => {
            initialize(state, reply, event_tx).await;
        }
        SessionCommand::SetDifficulty { label } => {
            set_difficulty(state, &label, event_tx).await;
        }
        SessionCommand::SetPosition { fen, moves } => {
            let mut line = format!("position fen {}", fen);
            if !moves.is_empty() {
                line.push_str(" moves");
                for mv in &moves {
                    line.push(' ');
                    line.push_str(mv);
                }
            }
            tracing::debug!("Setting position: fen={}, moves={}", fen, moves.len());
            send_line(state, event_tx, line).await;
        }
        SessionCommand::RequestBestMove {
            think_time_ms,
            reply,
        } => {
            request_best_move(state, think_time_ms, reply, event_tx).await;
        }
        SessionCommand::StopThinking => {
            tracing::debug!("Forwarding stop to engine");
            send_line(state, event_tx, "stop".to_string()).await;
        }
        SessionCommand::NewGame => {
            state.evaluation_cp = None;
            state.search_depth = 0;
            if send_line(state, event_tx, "ucinewgame".to_string()).await {
                send_line(state, event_tx, "isready".to_string()).await;
            }
        }
        SessionCommand::Dispose { reply } => {
            dispose(state).await;
            let _ = reply.send(());
        }
        SessionCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
        }
        SessionCommand::Subscribe { reply } => {
            let _ = reply.send((state.snapshot(), event_tx.subscribe()));
        }
    }
}

async fn initialize(
    state: &mut SessionState,
    reply: super::state::InitReply,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    // Idempotent: an existing transport means initialization already ran or
    // is still running. Callers wanting a fresh engine dispose first.
    if state.transport.is_some() {
        let _ = reply.send(Ok(()));
        return;
    }

    let transport = match state.connector.connect() {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("Engine spawn failed: {}", e);
            let _ = reply.send(Err(EngineError::Unavailable(e.to_string())));
            return;
        }
    };
    state.transport = Some(transport);

    tracing::info!("Engine transport connected, starting UCI handshake");
    if send_line(state, event_tx, "uci".to_string()).await {
        state.handshake = Handshake::AwaitUciOk {
            reply,
            deadline: Instant::now() + HANDSHAKE_TIMEOUT,
        };
    } else {
        let _ = reply.send(Err(EngineError::Unavailable(
            "engine channel closed".to_string(),
        )));
    }
}

async fn set_difficulty(
    state: &mut SessionState,
    label: &str,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    // Send-if-connected, like every other fire-and-forget command.
    if state.transport.is_none() {
        tracing::debug!("Ignoring difficulty change with no engine attached");
        return;
    }

    let difficulty = crate::Difficulty::from_label(label);
    let skill = difficulty.skill_level();
    tracing::info!("Setting difficulty {:?} (skill level {})", difficulty, skill);

    if !send_line(
        state,
        event_tx,
        format!("setoption name Skill Level value {}", skill),
    )
    .await
    {
        return;
    }

    match difficulty.limit_elo() {
        Some(elo) => {
            if send_line(
                state,
                event_tx,
                "setoption name UCI_LimitStrength value true".to_string(),
            )
            .await
            {
                send_line(
                    state,
                    event_tx,
                    format!("setoption name UCI_Elo value {}", elo),
                )
                .await;
            }
        }
        None => {
            send_line(
                state,
                event_tx,
                "setoption name UCI_LimitStrength value false".to_string(),
            )
            .await;
        }
    }
}

async fn request_best_move(
    state: &mut SessionState,
    think_time_ms: u64,
    reply: super::state::BestMoveReply,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    if state.pending.is_some() {
        let _ = reply.send(Err(EngineError::RequestAlreadyInFlight));
        return;
    }
    if state.transport.is_none() {
        let _ = reply.send(Err(EngineError::Unavailable(
            "engine not initialized".to_string(),
        )));
        return;
    }

    let movetime = think_time_ms.max(MIN_THINK_TIME_MS);
    state.search_depth = 0;

    if !send_line(state, event_tx, format!("go movetime {}", movetime)).await {
        let _ = reply.send(Err(EngineError::Unavailable(
            "engine channel closed".to_string(),
        )));
        return;
    }

    tracing::debug!("Search started, movetime={}ms", movetime);
    let now = Instant::now();
    state.pending = Some(PendingBestMove {
        reply,
        stop_at: now + Duration::from_millis(movetime + SAFETY_STOP_GRACE_MS),
        hard_deadline: now + Duration::from_millis(movetime + HARD_DEADLINE_GRACE_MS),
        stop_sent: false,
    });
    let _ = event_tx.send(SessionEvent::Thinking(true));
}

async fn dispose(state: &mut SessionState) {
    if let Some(mut transport) = state.transport.take() {
        tracing::info!("Disposing engine session");
        let _ = transport.send("quit".to_string()).await;
        transport.terminate();
    }
    // Dropping the handshake or pending slot drops its reply sender; a
    // caller still awaiting sees the session as closed.
    state.handshake = Handshake::Idle;
    state.pending = None;
    state.ready = false;
    state.evaluation_cp = None;
    state.search_depth = 0;
}

async fn handle_transport_event(
    state: &mut SessionState,
    event: crate::TransportEvent,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match event {
        crate::TransportEvent::Line(line) => match parse_line(&line) {
            Some(event) => handle_uci_event(state, event, event_tx).await,
            None => tracing::trace!("Ignoring engine line: {}", line),
        },
        crate::TransportEvent::Closed(reason) => {
            transport_failure(state, reason, event_tx);
        }
    }
}

async fn handle_uci_event(
    state: &mut SessionState,
    event: UciEvent,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match event {
        UciEvent::HandshakeAck => {
            match std::mem::replace(&mut state.handshake, Handshake::Idle) {
                Handshake::AwaitUciOk { reply, deadline } => {
                    tracing::debug!("Received uciok, sending engine options");
                    let ok = send_line(
                        state,
                        event_tx,
                        format!("setoption name Hash value {}", DEFAULT_HASH_MB),
                    )
                    .await
                        && send_line(
                            state,
                            event_tx,
                            format!("setoption name Threads value {}", DEFAULT_THREADS),
                        )
                        .await
                        && send_line(state, event_tx, "isready".to_string()).await;
                    if ok {
                        state.handshake = Handshake::AwaitReadyOk { reply, deadline };
                    } else {
                        let _ = reply.send(Err(EngineError::Unavailable(
                            "engine channel closed".to_string(),
                        )));
                    }
                }
                other => {
                    state.handshake = other;
                    tracing::debug!("uciok outside an active handshake, ignoring");
                }
            }
        }
        UciEvent::ReadyAck => {
            match std::mem::replace(&mut state.handshake, Handshake::Idle) {
                Handshake::AwaitReadyOk { reply, .. } => {
                    state.ready = true;
                    tracing::info!("Engine handshake complete");
                    let _ = event_tx.send(SessionEvent::Ready);
                    let _ = reply.send(Ok(()));
                }
                other => {
                    // Also the reply to the isready sent after ucinewgame.
                    state.handshake = other;
                    tracing::debug!("readyok outside an active handshake");
                }
            }
        }
        UciEvent::SearchInfo { depth, score } => {
            // Evaluation only moves while a request is outstanding.
            if state.pending.is_none() {
                return;
            }
            if let Some(score) = score {
                state.evaluation_cp = Some(score.centipawns());
            }
            if let Some(depth) = depth {
                state.search_depth = depth;
            }
            if let Some(pawns) = state.evaluation_pawns() {
                let _ = event_tx.send(SessionEvent::Evaluation {
                    pawns,
                    depth: state.search_depth,
                });
            }
        }
        UciEvent::BestMove { mv, ponder } => {
            let Some(pending) = state.pending.take() else {
                // Leftover answer to a stop after the request was abandoned.
                tracing::debug!("Discarding bestmove with no request outstanding: {}", mv);
                return;
            };
            tracing::info!("Received bestmove: {}", mv);
            let evaluation = EngineEvaluation {
                best_move: mv,
                ponder,
                evaluation_pawns: state.evaluation_pawns(),
                search_depth: state.search_depth,
            };
            let _ = event_tx.send(SessionEvent::Thinking(false));
            let _ = pending.reply.send(Ok(evaluation));
        }
    }
}

async fn handle_deadline(state: &mut SessionState, event_tx: &broadcast::Sender<SessionEvent>) {
    let now = Instant::now();

    if state.handshake.deadline().is_some_and(|d| d <= now) {
        // The transport is left attached so the caller can dispose and retry.
        if let Handshake::AwaitUciOk { reply, .. } | Handshake::AwaitReadyOk { reply, .. } =
            std::mem::replace(&mut state.handshake, Handshake::Idle)
        {
            tracing::error!("Timed out waiting for engine handshake");
            let _ = reply.send(Err(EngineError::Unavailable(
                "timed out waiting for engine handshake".to_string(),
            )));
        }
    }

    let due = state
        .pending
        .as_ref()
        .map(|p| (p.stop_sent, p.stop_at, p.hard_deadline));
    if let Some((stop_sent, stop_at, hard_deadline)) = due {
        if !stop_sent && stop_at <= now {
            if let Some(pending) = state.pending.as_mut() {
                pending.stop_sent = true;
            }
            tracing::warn!("No bestmove before the safety deadline, forcing stop");
            send_line(state, event_tx, "stop".to_string()).await;
        } else if stop_sent && hard_deadline <= now {
            if let Some(pending) = state.pending.take() {
                tracing::error!("Engine ignored stop, abandoning best-move request");
                let _ = pending.reply.send(Err(EngineError::Unresponsive));
                let _ = event_tx.send(SessionEvent::Thinking(false));
                let _ = event_tx.send(SessionEvent::Error(
                    "engine did not respond to stop".to_string(),
                ));
            }
        }
    }
}

/// Send one line to the engine. A dead channel is treated as a transport
/// failure; returns whether the line was accepted.
async fn send_line(
    state: &mut SessionState,
    event_tx: &broadcast::Sender<SessionEvent>,
    line: String,
) -> bool {
    let sent = match state.transport.as_ref() {
        None => return false,
        Some(transport) => transport.send(line).await.is_ok(),
    };
    if !sent {
        transport_failure(state, "engine channel closed".to_string(), event_tx);
    }
    sent
}

/// Drop the transport and fail everything waiting on it.
fn transport_failure(
    state: &mut SessionState,
    reason: String,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    tracing::error!("Engine transport failed: {}", reason);
    state.transport = None;
    state.ready = false;

    if let Handshake::AwaitUciOk { reply, .. } | Handshake::AwaitReadyOk { reply, .. } =
        std::mem::replace(&mut state.handshake, Handshake::Idle)
    {
        let _ = reply.send(Err(EngineError::Unavailable(reason.clone())));
    }
    if let Some(pending) = state.pending.take() {
        let _ = pending.reply.send(Err(EngineError::Unavailable(reason.clone())));
        let _ = event_tx.send(SessionEvent::Thinking(false));
    }
    let _ = event_tx.send(SessionEvent::Error(reason));
}
