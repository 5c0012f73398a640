//! Production transport: the engine as a child process with piped stdio.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::transport::{Connector, Transport, TransportError, TransportEvent, TransportPeer};

/// Env var overriding engine binary discovery.
pub const ENGINE_PATH_ENV: &str = "ENGINE_BRIDGE_ENGINE_PATH";

/// Grace period between the kill signal and actually killing the child, so a
/// `quit` already queued on stdin can take effect first.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

const CHANNEL_CAPACITY: usize = 32;

/// Spawns the engine binary and bridges its stdio to a [`Transport`] pair.
pub struct ProcessConnector {
    path: Option<PathBuf>,
}

impl ProcessConnector {
    /// Discover the engine binary at connect time (env var, then common
    /// install locations).
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Use a fixed binary path instead of discovery.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }
}

impl Default for ProcessConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for ProcessConnector {
    fn connect(&mut self) -> Result<Transport, TransportError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => find_engine_path().ok_or(TransportError::EngineNotFound)?,
        };
        tracing::info!("Spawning engine process: {}", path.display());

        let mut child = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                TransportError::Spawn(e)
            })?;

        let mut stdin = child.stdin.take().ok_or(TransportError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(TransportError::MissingPipe("stdout"))?;

        let (transport, peer) = Transport::pair(CHANNEL_CAPACITY);
        let TransportPeer {
            mut command_rx,
            event_tx,
            kill_rx,
        } = peer;

        // Writer: command lines -> child stdin.
        tokio::spawn(async move {
            while let Some(line) = command_rx.recv().await {
                tracing::trace!("UCI >> {}", line);
                if let Err(e) = stdin.write_all(format!("{}\n", line).as_bytes()).await {
                    tracing::error!("Failed to write to engine stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush engine stdin: {}", e);
                    break;
                }
            }
            tracing::debug!("Engine stdin writer exiting");
        });

        // Reader: child stdout -> one event per line.
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Engine stdout EOF");
                        let _ = event_tx
                            .send(TransportEvent::Closed("engine closed its output".into()))
                            .await;
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);
                        if event_tx
                            .send(TransportEvent::Line(trimmed.to_string()))
                            .await
                            .is_err()
                        {
                            // Session dropped its transport; nothing left to do.
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading engine stdout: {}", e);
                        let _ = event_tx
                            .send(TransportEvent::Closed(format!("read error: {}", e)))
                            .await;
                        break;
                    }
                }
            }
            tracing::debug!("Engine stdout reader exiting");
        });

        // Supervisor: owns the child. Reaps an early exit, or on the kill
        // signal waits out the grace period before forcing termination.
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    tracing::info!("Engine process exited: {:?}", status);
                    return;
                }
                _ = kill_rx => {}
            }
            if tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await.is_err() {
                tracing::warn!("Engine did not exit after quit, killing process");
                let _ = child.kill().await;
            }
            tracing::debug!("Engine supervisor exiting");
        });

        Ok(transport)
    }
}

/// Find an engine executable in common locations.
fn find_engine_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENGINE_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    let candidates = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // in PATH
    ];

    for candidate in candidates {
        let path = Path::new(candidate);
        if (path.exists() || candidate == "stockfish")
            && std::process::Command::new(candidate)
                .arg("--help")
                .output()
                .is_ok()
        {
            return Some(PathBuf::from(candidate));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_engine_not_found() {
        // An explicit bogus path fails at spawn, not discovery.
        let mut connector =
            ProcessConnector::with_path(PathBuf::from("/nonexistent/engine-binary"));
        let err = connector.connect().unwrap_err();
        assert!(matches!(err, TransportError::Spawn(_)));
    }
}
