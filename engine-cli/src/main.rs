//! One-shot command line front for the engine bridge: spawn an engine, set
//! up a position, ask for the best move, print the answer.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use engine::{EngineSession, ProcessConnector};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Parser, Debug)]
#[command(name = "engine-cli", about = "Ask a UCI engine for the best move in a position")]
struct Args {
    /// Path to the engine binary. Defaults to discovery (env var
    /// ENGINE_BRIDGE_ENGINE_PATH, then common Stockfish locations).
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Position to analyze, as a FEN string.
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// Moves played after the FEN, in coordinate notation (e.g. e2e4 e7e5).
    #[arg(long, num_args = 0..)]
    moves: Vec<String>,

    /// Think time in milliseconds.
    #[arg(long, default_value_t = 1000)]
    movetime: u64,

    /// Difficulty label: DEBUTANT, FACILE, MOYEN, DIFFICILE or EXPERT.
    #[arg(long)]
    difficulty: Option<String>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let connector = match args.engine {
        Some(path) => ProcessConnector::with_path(path),
        None => ProcessConnector::new(),
    };
    let session = EngineSession::spawn(connector);

    session
        .initialize()
        .await
        .context("engine initialization failed")?;

    if let Some(difficulty) = &args.difficulty {
        session.set_difficulty(difficulty).await;
    }

    tracing::info!("Analyzing position: {}", args.fen);
    session.set_position_with_moves(&args.fen, &args.moves).await;

    let evaluation = session
        .request_best_move(args.movetime)
        .await
        .context("best-move request failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else if evaluation.has_move() {
        println!("bestmove {}", evaluation.best_move);
        if let Some(ponder) = &evaluation.ponder {
            println!("ponder   {}", ponder);
        }
        if let Some(pawns) = evaluation.evaluation_pawns {
            println!("eval     {:+.2} (depth {})", pawns, evaluation.search_depth);
        }
    } else {
        println!("no legal move in this position");
    }

    session.dispose().await;
    Ok(())
}
