//! Events parsed from engine output

use super::score::{Score, ScoreBound};

/// One recognised line of engine output
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Handshake acknowledgement
    UciOk,
    /// Answer to `isready`
    ReadyOk,
    /// `id name ...` / `id author ...`
    Id { key: String, value: String },
    /// `option name ...` advertisement (kept raw)
    Option { description: String },
    /// Search progress
    Info(InfoLine),
    /// Search finished; `best` is `None` for `bestmove (none)`
    BestMove {
        best: Option<String>,
        ponder: Option<String>,
    },
}

/// Fields of an `info` line
///
/// Every field is optional because engines send arbitrary subsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub bound: ScoreBound,
    /// Principal variation as UCI move strings
    pub pv: Vec<String>,
    /// Free text after `info string`
    pub string: Option<String>,
}

impl InfoLine {
    /// True when the line carried none of the telemetry fields
    pub fn is_empty(&self) -> bool {
        self.depth.is_none()
            && self.seldepth.is_none()
            && self.nodes.is_none()
            && self.nps.is_none()
            && self.time_ms.is_none()
            && self.score.is_none()
            && self.pv.is_empty()
    }
}

/// Parse a single line of engine output
///
/// Returns `None` for blank or unrecognised lines.
///
/// # Examples
///
/// ```
/// use uci_bridge::{parse_line, EngineEvent};
///
/// let event = parse_line("bestmove e2e4 ponder e7e5");
/// assert_eq!(
///     event,
///     Some(EngineEvent::BestMove {
///         best: Some("e2e4".to_string()),
///         ponder: Some("e7e5".to_string()),
///     })
/// );
/// assert_eq!(parse_line("Stockfish 16 by the Stockfish developers"), None);
/// ```
pub fn parse_line(line: &str) -> Option<EngineEvent> {
    let mut tokens = line.split_whitespace();
    let head = tokens.next()?;

    match head {
        "uciok" => Some(EngineEvent::UciOk),
        "readyok" => Some(EngineEvent::ReadyOk),
        "id" => {
            let key = tokens.next()?.to_string();
            let value = tokens.collect::<Vec<_>>().join(" ");
            Some(EngineEvent::Id { key, value })
        }
        "option" => Some(EngineEvent::Option {
            description: tokens.collect::<Vec<_>>().join(" "),
        }),
        "info" => Some(EngineEvent::Info(parse_info(tokens))),
        "bestmove" => {
            let best = tokens
                .next()
                .filter(|mv| *mv != "(none)" && *mv != "0000")
                .map(str::to_string);
            let ponder = match tokens.next() {
                Some("ponder") => tokens.next().map(str::to_string),
                _ => None,
            };
            Some(EngineEvent::BestMove { best, ponder })
        }
        _ => None,
    }
}

fn parse_info<'a>(tokens: impl Iterator<Item = &'a str>) -> InfoLine {
    let mut info = InfoLine::default();
    let mut tokens = tokens.peekable();

    while let Some(token) = tokens.next() {
        match token {
            "depth" => info.depth = tokens.next().and_then(|v| v.parse().ok()),
            "seldepth" => info.seldepth = tokens.next().and_then(|v| v.parse().ok()),
            "nodes" => info.nodes = tokens.next().and_then(|v| v.parse().ok()),
            "nps" => info.nps = tokens.next().and_then(|v| v.parse().ok()),
            "time" => info.time_ms = tokens.next().and_then(|v| v.parse().ok()),
            "multipv" => info.multipv = tokens.next().and_then(|v| v.parse().ok()),
            "score" => {
                let kind = tokens.next();
                let value = tokens.next().and_then(|v| v.parse::<i32>().ok());
                info.score = match (kind, value) {
                    (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                    _ => None,
                };
                info.bound = match tokens.peek() {
                    Some(&"lowerbound") => {
                        tokens.next();
                        ScoreBound::Lower
                    }
                    Some(&"upperbound") => {
                        tokens.next();
                        ScoreBound::Upper
                    }
                    _ => ScoreBound::Exact,
                };
            }
            // pv and string run to the end of the line
            "pv" => {
                info.pv = tokens.by_ref().map(str::to_string).collect();
            }
            "string" => {
                info.string = Some(tokens.by_ref().collect::<Vec<_>>().join(" "));
            }
            _ => {}
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(line: &str) -> InfoLine {
        match parse_line(line) {
            Some(EngineEvent::Info(info)) => info,
            other => panic!("expected info, got {:?}", other),
        }
    }

    #[test]
    fn test_handshake_lines() {
        assert_eq!(parse_line("uciok"), Some(EngineEvent::UciOk));
        assert_eq!(parse_line("  readyok  "), Some(EngineEvent::ReadyOk));
        assert_eq!(
            parse_line("id name Stockfish 16"),
            Some(EngineEvent::Id {
                key: "name".to_string(),
                value: "Stockfish 16".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_and_blank_lines_are_ignored() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("uciokay"), None);
        assert_eq!(parse_line("Stockfish 16 by the Stockfish developers"), None);
    }

    #[test]
    fn test_full_info_line() {
        let info = info("info depth 12 nodes 500000 nps 250000 score cp 35");
        assert_eq!(info.depth, Some(12));
        assert_eq!(info.nodes, Some(500_000));
        assert_eq!(info.nps, Some(250_000));
        assert_eq!(info.score, Some(Score::Centipawns(35)));
        assert_eq!(info.bound, ScoreBound::Exact);
    }

    #[test]
    fn test_mate_score() {
        let info = info("info depth 5 score mate 3");
        assert_eq!(info.depth, Some(5));
        assert_eq!(info.score, Some(Score::Mate(3)));
        assert_eq!(info.nodes, None);
    }

    #[test]
    fn test_stockfish_style_line() {
        let info = info(
            "info depth 20 seldepth 28 multipv 1 score cp -17 upperbound nodes 1234 nps 617000 hashfull 5 tbhits 0 time 2 pv d7d5 c2c4 e7e6",
        );
        assert_eq!(info.depth, Some(20));
        assert_eq!(info.seldepth, Some(28));
        assert_eq!(info.multipv, Some(1));
        assert_eq!(info.score, Some(Score::Centipawns(-17)));
        assert_eq!(info.bound, ScoreBound::Upper);
        assert_eq!(info.nodes, Some(1234));
        assert_eq!(info.time_ms, Some(2));
        assert_eq!(info.pv, vec!["d7d5", "c2c4", "e7e6"]);
    }

    #[test]
    fn test_info_string() {
        let info = info("info string NNUE evaluation using nn-5af11540bbfe.nnue enabled");
        assert!(info.is_empty());
        assert_eq!(
            info.string.as_deref(),
            Some("NNUE evaluation using nn-5af11540bbfe.nnue enabled")
        );
    }

    #[test]
    fn test_malformed_values_are_skipped() {
        let info = info("info depth x nodes 10 score cp");
        assert_eq!(info.depth, None);
        assert_eq!(info.nodes, Some(10));
        assert_eq!(info.score, None);
    }

    #[test]
    fn test_bestmove_variants() {
        assert_eq!(
            parse_line("bestmove e7e8q"),
            Some(EngineEvent::BestMove {
                best: Some("e7e8q".to_string()),
                ponder: None
            })
        );
        assert_eq!(
            parse_line("bestmove (none)"),
            Some(EngineEvent::BestMove {
                best: None,
                ponder: None
            })
        );
    }
}
