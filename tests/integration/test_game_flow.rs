//! Integration tests for a full game across session restarts.
//!
//! These tests drive `GameSession` over file storage the way the CLI does,
//! rebuilding the session between steps to simulate separate invocations.

use std::path::PathBuf;

use escape_room_engine::{
    Config, ContentStore, FileStorage, GameSession, GameStatus, Grade, SessionMode, Storage,
    STORAGE_KEY,
};
use escape_room_report::{json::JsonGenerator, MarkdownGenerator, SessionReport};

/// Creates an empty state directory unique to the test.
fn state_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("escape_room_it_{name}"));
    std::fs::remove_dir_all(&dir).ok();
    dir
}

fn config(dir: &PathBuf, mode: SessionMode) -> Config {
    Config {
        session_mode: mode,
        state_dir: dir.display().to_string(),
        rng_seed: Some(42),
        ..Config::default()
    }
}

/// Opens a session as a fresh CLI invocation would.
fn open(config: &Config) -> GameSession<FileStorage> {
    GameSession::new(
        ContentStore::builtin().expect("builtin content"),
        FileStorage::new(&config.state_dir),
        config,
    )
}

/// Required and recommended controls for the current scenario.
fn perfect_selection(session: &GameSession<FileStorage>) -> Vec<String> {
    let scenario = session
        .state()
        .current_scenario
        .as_ref()
        .expect("current scenario");
    let rubric = session.content().rubric(&scenario.id).expect("rubric");
    rubric
        .required_controls
        .iter()
        .chain(&rubric.recommended_controls)
        .cloned()
        .collect()
}

#[test]
fn test_full_sequence_survives_restarts() {
    let dir = state_dir("full_sequence");
    let config = config(&dir, SessionMode::Sequence);

    open(&config).start();
    let total = open(&config).total_scenarios();
    assert_eq!(total, 5);

    for n in 1..=total {
        let mut session = open(&config);
        assert!(session.is_playing(), "scenario {n} not resumed");
        assert_eq!(session.current_scenario_number(), n);

        for id in perfect_selection(&session) {
            session.toggle_control(&id);
        }

        let mut session = open(&config);
        let result = session.submit().expect("grading").expect("submitted");
        assert_eq!(result.score, 100);
        assert_eq!(result.grade, Grade::A);

        let mut session = open(&config);
        if n < total {
            assert!(session.is_scenario_complete());
            session.advance();
        } else {
            assert!(session.has_results());
        }
    }

    let session = open(&config);
    assert_eq!(session.state().status, GameStatus::Results);

    let report = SessionReport::from_state(session.state()).expect("report");
    assert_eq!(report.scenarios_completed, 5);
    assert_eq!(report.average_score, 100);
    assert_eq!(report.overall_grade, Grade::A);

    let markdown = MarkdownGenerator::for_session(&report).generate();
    assert!(markdown.contains("| Scenarios | 5/5 |"));
    let json = JsonGenerator::new(&report).generate().expect("json");
    assert!(json.contains("\"overallGrade\":\"A\""));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_reset_discards_saved_game() {
    let dir = state_dir("reset");
    let config = config(&dir, SessionMode::Single);

    let mut session = open(&config);
    session.start();
    session.toggle_control("audit-logging");
    assert!(session.storage().get(STORAGE_KEY).expect("read").is_some());

    session.reset();
    assert!(session.storage().get(STORAGE_KEY).expect("read").is_none());

    let session = open(&config);
    assert_eq!(session.state().status, GameStatus::Idle);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_corrupt_snapshot_starts_fresh() {
    let dir = state_dir("corrupt");
    let config = config(&dir, SessionMode::Single);

    let mut storage = FileStorage::new(&dir);
    storage
        .set(STORAGE_KEY, r#"{"status": "submitted", "selectedControlIds": [], "hintsUsed": 0}"#)
        .expect("write");

    let session = open(&config);
    assert_eq!(session.state().status, GameStatus::Idle);
    assert!(storage.get(STORAGE_KEY).expect("read").is_none());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_seed_fixes_scenario_order() {
    let dir_a = state_dir("seed_a");
    let dir_b = state_dir("seed_b");

    let mut a = open(&config(&dir_a, SessionMode::Sequence));
    let mut b = open(&config(&dir_b, SessionMode::Sequence));
    a.start();
    b.start();

    let ids = |s: &GameSession<FileStorage>| {
        s.state()
            .scenarios
            .iter()
            .map(|sc| sc.id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&a), ids(&b));

    std::fs::remove_dir_all(&dir_a).ok();
    std::fs::remove_dir_all(&dir_b).ok();
}

#[test]
fn test_empty_submit_changes_nothing() {
    let dir = state_dir("empty_submit");
    let config = config(&dir, SessionMode::Single);

    let mut session = open(&config);
    session.start();
    let before = session.state().clone();

    assert!(session.submit().expect("no error").is_none());
    assert_eq!(session.state(), &before);

    std::fs::remove_dir_all(&dir).ok();
}
