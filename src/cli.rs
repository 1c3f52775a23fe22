//! Command-line interface
//!
//! Three subcommands share one set of global flags that override the
//! settings file:
//!
//! - `play` - interactive game, local or versus the engine
//! - `analyze` - one-shot evaluation of a FEN or the end of a PGN
//! - `review` - step through a PGN and analyse positions on demand

use anyhow::{Context, Result};
use chessdesk::app::{AnalysisAction, AnalysisScreen, ClickOutcome, PlayMode, PlayScreen, SearchLimits};
use chessdesk::core::{settings_path, AppSettings};
use chessdesk::game::{BoardPosition, Color, GameState, NavDirection, Square};
use chessdesk::rendering::TextBoardView;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uci_bridge::{EngineSession, ProcessTransport, SessionUpdate};

#[derive(Parser, Debug)]
#[command(name = "chessdesk", version, about = "Play and analyse chess against a UCI engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Engine executable (default: stockfish)
    #[arg(long, global = true)]
    pub engine: Option<String>,

    /// Engine skill level, 1-20
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub difficulty: Option<i64>,

    /// Maximum search depth
    #[arg(long, global = true)]
    pub depth: Option<u32>,

    /// Thinking time per search in milliseconds
    #[arg(long = "movetime", global = true)]
    pub movetime_ms: Option<u64>,

    /// Settings file to use instead of the platform default
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long, global = true)]
    pub save_settings: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game in the terminal
    Play {
        #[arg(long, value_enum, default_value_t = PlayMode::Bot)]
        mode: PlayMode,
        /// Side played by the human in bot mode
        #[arg(long, value_enum, default_value_t = Side::White)]
        color: Side,
    },
    /// Print the engine's evaluation of one position
    Analyze {
        /// Position to analyse (default: the initial position)
        #[arg(long, conflicts_with = "pgn")]
        fen: Option<String>,
        /// Analyse the final position of this game record
        #[arg(long)]
        pgn: Option<PathBuf>,
        /// Seconds to wait for the engine on top of the thinking time
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
    /// Step through a game record with the engine at hand
    Review {
        /// PGN file to load
        pgn: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl Cli {
    /// Load the settings file and apply command-line overrides
    pub fn resolve_settings(&self) -> Result<(AppSettings, PathBuf)> {
        let path = self.settings.clone().unwrap_or_else(settings_path);
        let mut settings = AppSettings::load_or_default(&path);

        if let Some(engine) = &self.engine {
            settings.engine_path = engine.clone();
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty;
        }
        if let Some(depth) = self.depth {
            settings.max_depth = depth;
            settings.analysis_depth = depth;
        }
        if let Some(movetime) = self.movetime_ms {
            settings.thinking_time_ms = movetime;
        }
        settings
            .validate()
            .context("invalid settings after applying command-line flags")?;

        if self.save_settings {
            settings
                .save(&path)
                .with_context(|| format!("saving settings to {}", path.display()))?;
        }
        Ok((settings, path))
    }
}

fn spawn_engine(settings: &AppSettings) -> Result<EngineSession<ProcessTransport>> {
    EngineSession::spawn(&settings.engine_path, &settings.engine_args, settings.session_config())
        .with_context(|| format!("starting engine '{}'", settings.engine_path))
}

fn parse_square(text: &str) -> Option<Square> {
    text.trim().parse().ok()
}

// ============================================================================
// play
// ============================================================================

const PLAY_HELP: &str = "\
Commands:
  e2e4 | Nf3      play a move (long algebraic or SAN)
  click <square>  select a piece, then click a target
  moves           list legal moves
  new             start a new game
  level <1-20>    change engine difficulty
  flip            flip the board
  pgn             print the game as PGN
  board           redraw the board
  help            show this help
  quit            leave";

pub async fn run_play(settings: &AppSettings, mode: PlayMode, side: Side) -> Result<()> {
    let mut screen: PlayScreen<ProcessTransport> = match mode {
        PlayMode::Local => PlayScreen::local(),
        PlayMode::Bot => {
            let engine = spawn_engine(settings)?;
            PlayScreen::against_engine(engine, side.into(), SearchLimits::for_play(settings))
        }
    };
    info!("[CLI] Starting {} game", mode);

    let mut view = TextBoardView::new();
    view.set_flipped(mode == PlayMode::Bot && side == Side::Black);
    println!("{}", PLAY_HELP);
    draw_play(&screen, &mut view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if !handle_play_command(&mut screen, &mut view, line.trim()) {
                    break;
                }
            }
            update = screen.next_engine_update() => {
                let failed = matches!(update, SessionUpdate::Failed { .. });
                if let Some(played) = screen.handle_engine_update(update) {
                    println!("Engine plays {}", played.san);
                    draw_play(&screen, &mut view);
                } else if failed {
                    if let Some(message) = screen.message() {
                        println!("{}", message);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Returns `false` when the player asked to quit
fn handle_play_command(
    screen: &mut PlayScreen<ProcessTransport>,
    view: &mut TextBoardView,
    input: &str,
) -> bool {
    let mut words = input.split_whitespace();
    let Some(command) = words.next() else {
        return true;
    };

    match command {
        "quit" | "exit" => return false,
        "help" => println!("{}", PLAY_HELP),
        "board" => draw_play(screen, view),
        "flip" => {
            view.flip();
            draw_play(screen, view);
        }
        "new" => {
            screen.new_game();
            draw_play(screen, view);
        }
        "moves" => println!("{}", screen.game().legal_moves_uci().join(" ")),
        "pgn" => println!("{}", screen.game().to_pgn()),
        "level" => match words.next().and_then(|w| w.parse::<i64>().ok()) {
            Some(level) => match screen.set_difficulty(level) {
                Some(Ok(applied)) => println!("Difficulty set to {}", applied),
                Some(Err(e)) => println!("Could not change difficulty: {}", e),
                None => println!("No engine in local mode"),
            },
            None => println!("Usage: level <1-20>"),
        },
        "click" => match words.next().and_then(parse_square) {
            Some(square) => {
                match screen.on_square_click(square) {
                    ClickOutcome::Selected(targets) if targets.is_empty() => {
                        println!("That piece has no legal moves");
                    }
                    ClickOutcome::Ignored => println!("Nothing to do on {}", square),
                    _ => {}
                }
                draw_play(screen, view);
            }
            None => println!("Usage: click <square>"),
        },
        text => {
            if screen.on_move_text(text).is_some() {
                draw_play(screen, view);
            } else if screen.interaction_enabled() {
                println!("Illegal move: {}", text);
            } else {
                println!("Wait for your turn");
            }
        }
    }
    true
}

fn draw_play(screen: &PlayScreen<ProcessTransport>, view: &mut TextBoardView) {
    screen.render(view);
    println!("{}", view.frame());
    println!("{}", screen.status());
}

// ============================================================================
// analyze
// ============================================================================

pub async fn run_analyze(
    settings: &AppSettings,
    fen: Option<String>,
    pgn: Option<PathBuf>,
    timeout_secs: u64,
) -> Result<()> {
    let game = match (fen, pgn) {
        (Some(fen), _) => GameState::from_fen(&fen)?,
        (None, Some(path)) => load_game(&path)?,
        (None, None) => GameState::new(),
    };
    let position = game.current_position();
    let limits = SearchLimits::for_analysis(settings);
    let timeout = Duration::from_secs(timeout_secs);

    let mut engine = spawn_engine(settings)?;
    engine
        .wait_until_ready(timeout)
        .await
        .context("waiting for the engine handshake")?;
    engine.analyze(position.fen(), limits.max_depth, limits.movetime_ms)?;
    let best = engine
        .wait_for_best_move(timeout + Duration::from_millis(limits.movetime_ms))
        .await
        .context("waiting for the engine's best move")?;

    let snapshot = engine.snapshot().clone();
    engine.dispose();

    println!("Position: {}", position.fen());
    println!("Depth:    {}", snapshot.depth);
    println!(
        "Eval:     {}",
        snapshot
            .evaluation
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Nodes:    {} ({} nps)", snapshot.nodes, snapshot.nps);
    if !snapshot.pv.is_empty() {
        println!("PV:       {}", snapshot.pv.join(" "));
    }
    match best {
        Some(uci) => println!("Best:     {} ({})", san_of(&position, &uci).unwrap_or_else(|| uci.clone()), uci),
        None => println!("Best:     none ({})", game.terminal_reason()),
    }
    Ok(())
}

fn san_of(position: &BoardPosition, uci: &str) -> Option<String> {
    let mut game = GameState::from_fen(position.fen()).ok()?;
    game.apply_uci(uci).map(|played| played.san)
}

fn load_game(path: &Path) -> Result<GameState> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading game record {}", path.display()))?;
    let mut game = GameState::new();
    game.load_game_record(&text)
        .with_context(|| format!("loading game record {}", path.display()))?;
    Ok(game)
}

// ============================================================================
// review
// ============================================================================

const REVIEW_HELP: &str = "\
Commands:
  first | prev | next | last   navigate (also f, p, n, l)
  go                           analyse the position, or stop analysing
  status                       show engine output
  moves                        list the game's moves
  load <file>                  import another PGN
  flip                         flip the board
  help                         show this help
  quit                         leave";

pub async fn run_review(settings: &AppSettings, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading game record {}", path.display()))?;

    let engine = spawn_engine(settings)?;
    let mut screen = AnalysisScreen::new(engine, SearchLimits::for_analysis(settings));
    if let Err(e) = screen.load_pgn(&text) {
        warn!("[CLI] {}", e);
    }

    let mut view = TextBoardView::new();
    println!("{}", REVIEW_HELP);
    draw_review(&screen, &mut view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if !handle_review_command(&mut screen, &mut view, line.trim())? {
                    break;
                }
            }
            update = screen.next_engine_update() => {
                match update {
                    SessionUpdate::Ready | SessionUpdate::BestMove { .. } | SessionUpdate::Failed { .. } => {
                        println!("{}", screen.status_text());
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

/// Returns `Ok(false)` when the user asked to quit
fn handle_review_command(
    screen: &mut AnalysisScreen<ProcessTransport>,
    view: &mut TextBoardView,
    input: &str,
) -> Result<bool> {
    let mut words = input.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(true);
    };

    let direction = match command {
        "f" => Some(NavDirection::First),
        "p" => Some(NavDirection::Prev),
        "n" => Some(NavDirection::Next),
        "l" => Some(NavDirection::Last),
        other => other.parse::<NavDirection>().ok(),
    };
    if let Some(direction) = direction {
        if screen.navigate(direction) {
            draw_review(screen, view);
        }
        return Ok(true);
    }

    match command {
        "quit" | "exit" => return Ok(false),
        "help" => println!("{}", REVIEW_HELP),
        "flip" => {
            view.flip();
            draw_review(screen, view);
        }
        "status" => println!("{}", screen.status_text()),
        "moves" => println!("{}", screen.review().moves().join(" ")),
        "go" | "analyze" => match screen.run_analysis() {
            Ok(AnalysisAction::Started(_)) => println!("Analysing..."),
            Ok(AnalysisAction::Stopped) => println!("Analysis stopped"),
            Err(_) => println!("{}", screen.error().unwrap_or("Engine unavailable")),
        },
        "load" => {
            let Some(file) = words.next() else {
                println!("Usage: load <file>");
                return Ok(true);
            };
            match std::fs::read_to_string(file) {
                Ok(text) => {
                    if screen.load_pgn(&text).is_err() {
                        println!("{}", screen.error().unwrap_or("Invalid PGN"));
                    }
                    draw_review(screen, view);
                }
                Err(e) => println!("Could not read {}: {}", file, e),
            }
        }
        other => println!("Unknown command '{}'; type help", other),
    }
    Ok(true)
}

fn draw_review(screen: &AnalysisScreen<ProcessTransport>, view: &mut TextBoardView) {
    screen.render(view);
    println!("{}", view.frame());
    let review = screen.review();
    println!("{} / {} plies", review.label(), review.len());
    if let Some(error) = screen.error() {
        println!("{}", error);
    }
}
