//! Session state machine tests
//!
//! Every test drives an [`EngineSession`] through a [`ScriptedTransport`],
//! feeding engine output line by line and asserting on the exact command
//! lines the session wrote.

use super::*;
use crate::transport::{ScriptHandle, ScriptedTransport};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn new_session(difficulty: i64) -> (EngineSession<ScriptedTransport>, ScriptHandle) {
    let (transport, handle) = ScriptedTransport::new();
    let session = EngineSession::new(
        transport,
        SessionConfig {
            difficulty,
            ..SessionConfig::default()
        },
    );
    (session, handle)
}

fn ready_session() -> (EngineSession<ScriptedTransport>, ScriptHandle) {
    let (mut session, handle) = new_session(10);
    session.handle_line("uciok");
    handle.clear_sent();
    (session, handle)
}

fn clamp_warnings(session: &EngineSession<ScriptedTransport>) -> usize {
    session
        .warnings()
        .iter()
        .filter(|w| matches!(w, SessionWarning::DifficultyClamped(_)))
        .count()
}

// ============================================================================
// Handshake
// ============================================================================

#[test]
fn test_new_session_sends_handshake() {
    //! Creating a session sends exactly `uci` and waits for the ack
    let (session, handle) = new_session(10);

    assert_eq!(handle.sent(), vec!["uci"]);
    assert_eq!(session.phase(), SessionPhase::Starting);
    assert!(!session.is_ready());
}

#[test]
fn test_uciok_makes_ready_and_applies_difficulty_once() {
    //! The ack moves the session to Ready and sends the skill level once
    let (mut session, handle) = new_session(7);
    session.handle_line("id name Stockfish 16");
    assert_eq!(session.handle_line("uciok"), SessionUpdate::Ready);

    assert!(session.is_ready());
    assert_eq!(session.engine_name(), Some("Stockfish 16"));
    assert_eq!(
        handle.sent(),
        vec!["uci", "setoption name Skill Level value 7"]
    );

    // A duplicate ack must not resend the option
    assert_eq!(session.handle_line("uciok"), SessionUpdate::Ignored);
    assert_eq!(handle.sent().len(), 2);
}

#[test]
fn test_initial_difficulty_is_clamped_with_warning() {
    let (mut session, handle) = new_session(42);

    assert_eq!(session.difficulty().get(), 20);
    assert_eq!(clamp_warnings(&session), 1);

    session.handle_line("uciok");
    assert_eq!(
        handle.sent().last().map(String::as_str),
        Some("setoption name Skill Level value 20")
    );
}

// ============================================================================
// Analysis
// ============================================================================

#[test]
fn test_analyze_before_ready_has_no_effect() {
    //! Requests before the handshake are rejected without side effects
    let (mut session, handle) = new_session(10);
    let before = session.snapshot().clone();

    let result = session.analyze(START_FEN, 20, 1000);

    assert!(matches!(result, Err(BridgeError::NotReady)));
    assert_eq!(handle.sent(), vec!["uci"]);
    assert_eq!(session.phase(), SessionPhase::Starting);
    assert_eq!(session.snapshot(), &before);
    assert!(session.active_request().is_none());
}

#[test]
fn test_analyze_sends_position_then_go() {
    let (mut session, handle) = ready_session();

    let sequence = session.analyze(START_FEN, 18, 1500).expect("ready session");

    assert_eq!(sequence, 1);
    assert!(session.is_analyzing());
    assert_eq!(
        handle.sent(),
        vec![
            format!("position fen {}", START_FEN),
            "go depth 18 movetime 1500".to_string(),
        ]
    );
}

#[test]
fn test_info_line_updates_telemetry() {
    let (mut session, _handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");

    let update = session.handle_line("info depth 12 nodes 500000 nps 250000 score cp 35");

    assert_eq!(update, SessionUpdate::Progress);
    assert_eq!(session.depth(), 12);
    assert_eq!(session.nodes(), 500_000);
    assert_eq!(session.nps(), 250_000);
    assert_eq!(session.evaluation(), Some(Evaluation::Pawns(0.35)));
}

#[test]
fn test_mate_score_is_tagged() {
    let (mut session, _handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");

    session.handle_line("info depth 5 score mate 3");

    assert_eq!(session.depth(), 5);
    assert_eq!(session.evaluation(), Some(Evaluation::MateIn(3)));
    assert_ne!(session.evaluation(), Some(Evaluation::Pawns(3.0)));
    assert_ne!(session.evaluation(), Some(Evaluation::Pawns(300.0)));
}

#[test]
fn test_partial_info_keeps_other_fields() {
    //! Fields missing from a progress line keep their previous values
    let (mut session, _handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");

    session.handle_line("info depth 10 nodes 1000 score cp -20");
    session.handle_line("info nps 99000");

    assert_eq!(session.depth(), 10);
    assert_eq!(session.nodes(), 1000);
    assert_eq!(session.nps(), 99_000);
    assert_eq!(session.evaluation(), Some(Evaluation::Pawns(-0.2)));
}

#[test]
fn test_bestmove_completes_analysis() {
    let (mut session, _handle) = ready_session();
    let sequence = session.analyze(START_FEN, 20, 1000).expect("ready session");

    let update = session.handle_line("bestmove e2e4 ponder e7e5");

    assert_eq!(
        update,
        SessionUpdate::BestMove {
            sequence,
            best: Some("e2e4".to_string())
        }
    );
    assert_eq!(session.best_move(), Some("e2e4"));
    assert_eq!(session.snapshot().ponder.as_deref(), Some("e7e5"));
    assert!(!session.is_analyzing());
    assert_eq!(session.phase(), SessionPhase::Ready);
}

#[test]
fn test_new_analysis_resets_telemetry() {
    let (mut session, _handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");
    session.handle_line("info depth 9 nodes 1234 score cp 50");
    session.handle_line("bestmove d2d4");

    session.analyze(START_FEN, 20, 1000).expect("ready session");

    assert_eq!(session.snapshot(), &EngineSnapshot::default());
    assert_eq!(session.best_move(), None);
}

#[test]
fn test_info_outside_analysis_is_ignored() {
    let (mut session, _handle) = ready_session();

    assert_eq!(
        session.handle_line("info depth 30 score cp 900"),
        SessionUpdate::Ignored
    );
    assert_eq!(session.depth(), 0);
    assert_eq!(session.evaluation(), None);
}

#[test]
fn test_unknown_lines_are_ignored() {
    let (mut session, _handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");

    assert_eq!(
        session.handle_line("Stockfish 16 by the Stockfish developers"),
        SessionUpdate::Ignored
    );
    assert!(session.is_analyzing());
}

// ============================================================================
// Stop and supersession
// ============================================================================

#[test]
fn test_stop_without_analysis_is_noop() {
    let (mut session, handle) = ready_session();

    assert!(!session.stop());
    assert!(handle.sent().is_empty());
    assert_eq!(session.phase(), SessionPhase::Ready);
}

#[test]
fn test_stop_returns_to_ready_immediately() {
    let (mut session, handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");
    handle.clear_sent();

    assert!(session.stop());

    assert_eq!(handle.sent(), vec!["stop"]);
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session.active_request().is_none());
}

#[test]
fn test_late_bestmove_after_stop_is_discarded() {
    //! The engine still answers a stopped search; that answer is stale
    let (mut session, _handle) = ready_session();
    let sequence = session.analyze(START_FEN, 20, 1000).expect("ready session");
    session.stop();

    let update = session.handle_line("bestmove g1f3");

    assert_eq!(update, SessionUpdate::Stale { sequence });
    assert_eq!(session.best_move(), None);
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session
        .warnings()
        .iter()
        .any(|w| matches!(w, SessionWarning::StaleBestMove { sequence: s, .. } if *s == sequence)));
}

#[test]
fn test_analyze_while_analyzing_stops_then_restarts() {
    let (mut session, handle) = ready_session();
    let first = session.analyze(START_FEN, 20, 1000).expect("ready session");
    handle.clear_sent();

    let second = session
        .analyze("8/8/8/8/8/8/8/K6k w - - 0 1", 10, 500)
        .expect("ready session");

    assert_eq!(second, first + 1);
    assert_eq!(
        handle.sent(),
        vec![
            "stop".to_string(),
            "position fen 8/8/8/8/8/8/8/K6k w - - 0 1".to_string(),
            "go depth 10 movetime 500".to_string(),
        ]
    );

    // Progress of the superseded search is not attributed to the new one
    assert_eq!(
        session.handle_line("info depth 25 score cp 80"),
        SessionUpdate::Ignored
    );
    assert_eq!(
        session.handle_line("bestmove e2e4"),
        SessionUpdate::Stale { sequence: first }
    );
    assert!(session.is_analyzing());

    assert_eq!(
        session.handle_line("info depth 3 score cp 0"),
        SessionUpdate::Progress
    );
    assert_eq!(
        session.handle_line("bestmove a1b1"),
        SessionUpdate::BestMove {
            sequence: second,
            best: Some("a1b1".to_string())
        }
    );
    assert_eq!(session.best_move(), Some("a1b1"));
}

#[test]
fn test_unsolicited_bestmove_is_ignored() {
    let (mut session, _handle) = ready_session();

    assert_eq!(session.handle_line("bestmove e2e4"), SessionUpdate::Ignored);
    assert_eq!(session.best_move(), None);
}

#[test]
fn test_bestmove_none_finishes_without_move() {
    let (mut session, _handle) = ready_session();
    let sequence = session
        .analyze("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 20, 1000)
        .expect("ready session");

    assert_eq!(
        session.handle_line("bestmove (none)"),
        SessionUpdate::BestMove {
            sequence,
            best: None
        }
    );
    assert_eq!(session.phase(), SessionPhase::Ready);
}

// ============================================================================
// Difficulty
// ============================================================================

#[test]
fn test_set_difficulty_before_ready_is_rejected() {
    let (mut session, handle) = new_session(10);

    assert!(matches!(session.set_difficulty(5), Err(BridgeError::NotReady)));
    assert_eq!(session.difficulty().get(), 10);
    assert_eq!(handle.sent(), vec!["uci"]);
}

#[test]
fn test_set_difficulty_clamps_and_warns_once_per_call() {
    let (mut session, handle) = ready_session();

    assert_eq!(session.set_difficulty(0).map(SkillLevel::get).ok(), Some(1));
    assert_eq!(clamp_warnings(&session), 1);
    assert_eq!(session.set_difficulty(99).map(SkillLevel::get).ok(), Some(20));
    assert_eq!(clamp_warnings(&session), 2);
    assert_eq!(session.set_difficulty(15).map(SkillLevel::get).ok(), Some(15));
    assert_eq!(clamp_warnings(&session), 2);

    assert_eq!(
        handle.sent(),
        vec![
            "setoption name Skill Level value 1",
            "setoption name Skill Level value 20",
            "setoption name Skill Level value 15",
        ]
    );
}

#[test]
fn test_set_difficulty_does_not_interrupt_analysis() {
    let (mut session, handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");
    handle.clear_sent();

    session.set_difficulty(3).expect("handshake completed");

    assert!(session.is_analyzing());
    assert_eq!(handle.sent(), vec!["setoption name Skill Level value 3"]);
}

// ============================================================================
// Failures and disposal
// ============================================================================

#[test]
fn test_transport_error_suppresses_commands() {
    let (mut session, handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");
    handle.clear_sent();

    handle.push_event(TransportEvent::Error("pipe broken".to_string()));
    let updates = session.pump();

    assert_eq!(
        updates,
        vec![SessionUpdate::Failed {
            message: "pipe broken".to_string()
        }]
    );
    assert!(!session.is_ready());
    assert!(session.active_request().is_none());

    assert!(matches!(
        session.analyze(START_FEN, 20, 1000),
        Err(BridgeError::NotReady)
    ));
    assert!(!session.stop());
    assert!(session.set_difficulty(4).is_err());
    assert!(handle.sent().is_empty());

    // A late result from the dead engine is not applied
    assert_eq!(session.handle_line("bestmove e2e4"), SessionUpdate::Ignored);
    assert_eq!(session.best_move(), None);
}

#[test]
fn test_failed_send_fails_session() {
    let (mut session, handle) = ready_session();
    handle.fail_sends();

    assert!(session.analyze(START_FEN, 20, 1000).is_err());
    assert_eq!(session.phase(), SessionPhase::Failed);
    assert!(session
        .log()
        .iter()
        .any(|entry| entry.direction == LogDirection::Error));
}

#[test]
fn test_closed_transport_is_a_failure() {
    let (mut session, handle) = ready_session();
    handle.push_event(TransportEvent::Closed);

    session.pump();

    assert_eq!(session.phase(), SessionPhase::Failed);
}

#[test]
fn test_restart_recovers_from_failure() {
    let (mut session, _old) = ready_session();
    session.set_difficulty(4).expect("handshake completed");
    session.fail("engine crashed".to_string());

    let (transport, handle) = ScriptedTransport::new();
    session.restart(transport);
    assert_eq!(session.phase(), SessionPhase::Starting);
    assert_eq!(handle.sent(), vec!["uci"]);

    session.handle_line("uciok");
    assert!(session.is_ready());
    assert_eq!(
        handle.sent(),
        vec!["uci", "setoption name Skill Level value 4"]
    );
}

#[test]
fn test_difficulty_accepted_during_rehandshake() {
    //! After a restart the new level is held back until `uciok`
    let (mut session, _old) = ready_session();
    session.fail("engine crashed".to_string());

    let (transport, handle) = ScriptedTransport::new();
    session.restart(transport);

    let applied = session.set_difficulty(6).expect("ready was reached before");
    assert_eq!(applied.get(), 6);
    assert_eq!(handle.sent(), vec!["uci"]);

    session.handle_line("uciok");
    assert_eq!(
        handle.sent(),
        vec!["uci", "setoption name Skill Level value 6"]
    );
}

#[test]
fn test_dispose_terminates_and_silences() {
    let (mut session, handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");
    handle.clear_sent();

    session.dispose();

    assert!(handle.is_terminated());
    assert_eq!(session.phase(), SessionPhase::Disposed);
    assert!(matches!(
        session.analyze(START_FEN, 20, 1000),
        Err(BridgeError::Disposed)
    ));
    assert!(!session.stop());
    assert_eq!(session.handle_line("bestmove e2e4"), SessionUpdate::Ignored);
    assert!(handle.sent().is_empty());

    // Idempotent
    session.dispose();
}

#[test]
fn test_drop_terminates_engine() {
    let (session, handle) = ready_session();
    drop(session);
    assert!(handle.is_terminated());
}

#[test]
fn test_protocol_log_is_bounded() {
    let (transport, handle) = ScriptedTransport::new();
    let mut session = EngineSession::new(
        transport,
        SessionConfig {
            difficulty: 10,
            log_capacity: 5,
        },
    );
    for i in 0..20 {
        handle.push_line(&format!("info string line {}", i));
    }
    session.pump();

    assert_eq!(session.log().len(), 5);
    assert_eq!(
        session.log().last().map(|e| e.line.as_str()),
        Some("info string line 19")
    );
}

#[test]
fn test_pump_applies_lines_in_order() {
    let (transport, handle) = ScriptedTransport::new();
    let mut session = EngineSession::new(transport, SessionConfig::default());
    handle.push_line("id name Scripted");
    handle.push_line("uciok");

    let updates = session.pump();

    assert_eq!(updates, vec![SessionUpdate::Ignored, SessionUpdate::Ready]);
    assert!(session.is_ready());
}

#[tokio::test]
async fn test_wait_for_best_move() {
    let (mut session, handle) = ready_session();
    session.analyze(START_FEN, 20, 1000).expect("ready session");
    handle.push_line("info depth 1 score cp 10");
    handle.push_line("bestmove e2e4");

    let best = session
        .wait_for_best_move(Duration::from_secs(1))
        .await
        .expect("scripted bestmove");

    assert_eq!(best.as_deref(), Some("e2e4"));
    assert_eq!(session.evaluation(), Some(Evaluation::Pawns(0.1)));
}

#[tokio::test]
async fn test_wait_until_ready() {
    let (transport, handle) = ScriptedTransport::new();
    let mut session = EngineSession::new(transport, SessionConfig::default());
    handle.push_line("uciok");

    session
        .wait_until_ready(Duration::from_secs(1))
        .await
        .expect("scripted handshake");

    assert!(session.is_ready());
}

#[tokio::test]
async fn test_wait_until_ready_reports_exhausted_script() {
    let (transport, _handle) = ScriptedTransport::new();
    let mut session = EngineSession::new(transport, SessionConfig::default());

    let result = session.wait_until_ready(Duration::from_secs(1)).await;

    assert!(matches!(result, Err(BridgeError::Transport { .. })));
}

#[tokio::test]
async fn test_next_update_ends_after_failure() {
    //! A failed session yields nothing more, even with output still queued
    let (mut session, handle) = ready_session();
    handle.push_event(TransportEvent::Closed);
    handle.push_line("info depth 3 score cp 10");

    let update = session.next_update().await;
    assert!(matches!(update, Some(SessionUpdate::Failed { .. })));
    assert_eq!(session.next_update().await, None);
    assert_eq!(session.next_update().await, None);
}
