//! Stateless parsing of engine output lines.
//!
//! Real engines decorate their output with many fields this layer never
//! reads, and vendors add their own; anything unrecognized must parse to
//! nothing rather than fail.

/// Evaluation reported on an `info` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Moves until mate; negative when the side to move is being mated.
    Mate(i32),
}

/// Stand-in magnitude for a forced mate, matching the ±100-pawn convention
/// the UI layer renders.
pub const MATE_CENTIPAWNS: i32 = 10_000;

impl Score {
    /// Normalized centipawn value, with mates collapsed to ±[`MATE_CENTIPAWNS`].
    pub fn centipawns(self) -> i32 {
        match self {
            Score::Centipawns(cp) => cp,
            Score::Mate(moves) if moves > 0 => MATE_CENTIPAWNS,
            Score::Mate(_) => -MATE_CENTIPAWNS,
        }
    }
}

/// One parsed line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciEvent {
    /// `uciok`: the engine acknowledged the protocol handshake.
    HandshakeAck,
    /// `readyok`: the engine processed everything sent so far.
    ReadyAck,
    /// `info ...` carrying a search depth and/or a score.
    SearchInfo {
        depth: Option<u32>,
        score: Option<Score>,
    },
    /// `bestmove X [ponder Y]`. The move is kept as the raw token, including
    /// the `(none)` sentinel.
    BestMove { mv: String, ponder: Option<String> },
}

/// Parse one engine output line into at most one event.
///
/// Field extraction is order-independent and skips unknown tokens. Lines that
/// are malformed, unrecognized, or carry nothing this layer uses yield `None`.
pub fn parse_line(line: &str) -> Option<UciEvent> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first()? {
        &"uciok" => Some(UciEvent::HandshakeAck),
        &"readyok" => Some(UciEvent::ReadyAck),
        &"bestmove" => parse_bestmove(&tokens[1..]),
        &"info" => parse_info(&tokens[1..]),
        _ => None,
    }
}

fn parse_bestmove(tokens: &[&str]) -> Option<UciEvent> {
    let mv = tokens.first()?.to_string();
    let ponder = tokens
        .iter()
        .position(|t| *t == "ponder")
        .and_then(|i| tokens.get(i + 1))
        .map(|t| t.to_string());
    Some(UciEvent::BestMove { mv, ponder })
}

fn parse_info(tokens: &[&str]) -> Option<UciEvent> {
    let mut depth = None;
    let mut score = None;
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&kind) = tokens.get(i) {
                    i += 1;
                    if let Some(value) = tokens.get(i) {
                        score = match kind {
                            "cp" => value.parse().ok().map(Score::Centipawns),
                            "mate" => value.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            _ => {
                // Unknown keyword, skip.
            }
        }
        i += 1;
    }

    if depth.is_none() && score.is_none() {
        return None;
    }
    Some(UciEvent::SearchInfo { depth, score })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_handshake_lines() {
        assert_eq!(parse_line("uciok"), Some(UciEvent::HandshakeAck));
        assert_eq!(parse_line("readyok"), Some(UciEvent::ReadyAck));
    }

    #[test]
    fn test_parse_bestmove_with_ponder() {
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5"),
            Some(UciEvent::BestMove {
                mv: "e2e4".into(),
                ponder: Some("e7e5".into()),
            })
        );
    }

    #[test]
    fn test_parse_bestmove_without_ponder() {
        assert_eq!(
            parse_line("bestmove e7e8q"),
            Some(UciEvent::BestMove {
                mv: "e7e8q".into(),
                ponder: None,
            })
        );
    }

    #[test]
    fn test_parse_bestmove_none_sentinel_passes_through() {
        assert_eq!(
            parse_line("bestmove (none)"),
            Some(UciEvent::BestMove {
                mv: "(none)".into(),
                ponder: None,
            })
        );
    }

    #[test]
    fn test_parse_info_with_extra_fields() {
        // Full Stockfish-style info line; only depth and score matter.
        let line = "info depth 12 seldepth 16 multipv 1 score cp 35 nodes 15234 \
                    nps 812000 hashfull 12 time 187 pv e2e4 e7e5";
        assert_eq!(
            parse_line(line),
            Some(UciEvent::SearchInfo {
                depth: Some(12),
                score: Some(Score::Centipawns(35)),
            })
        );
    }

    #[test]
    fn test_parse_info_mate_without_depth() {
        assert_eq!(
            parse_line("info score mate -3 nodes 99"),
            Some(UciEvent::SearchInfo {
                depth: None,
                score: Some(Score::Mate(-3)),
            })
        );
    }

    #[test]
    fn test_parse_info_without_useful_fields_is_ignored() {
        assert_eq!(parse_line("info currmove e2e4 currmovenumber 1"), None);
        assert_eq!(parse_line("info string NNUE evaluation enabled"), None);
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("bestmove"), None);
        assert_eq!(parse_line("info depth notanumber score cp abc"), None);
        assert_eq!(parse_line("id name Stockfish 16"), None);
        assert_eq!(parse_line("option name Hash type spin"), None);
        assert_eq!(parse_line("vendor-extension foo bar"), None);
    }

    #[test]
    fn test_mate_normalization() {
        assert_eq!(Score::Mate(2).centipawns(), 10_000);
        assert_eq!(Score::Mate(-1).centipawns(), -10_000);
        assert_eq!(Score::Mate(0).centipawns(), -10_000);
        assert_eq!(Score::Centipawns(-230).centipawns(), -230);
    }
}
