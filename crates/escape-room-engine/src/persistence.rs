//! Session persistence.
//!
//! Snapshots are stored as JSON under [`STORAGE_KEY`] in a [`Storage`]
//! backend. Saving is best-effort: failures are logged and the session
//! carries on in memory. Loading validates the snapshot's shape before
//! trusting it and fills any missing fields from the idle state, so
//! snapshots written by older builds still load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{EscapeRoomError, Result};
use crate::game_state::{GameState, GameStatus};

/// Key the session snapshot is stored under.
pub const STORAGE_KEY: &str = "governance-escape-room-state";

// ============================================================================
// Storage backends
// ============================================================================

/// Minimal key-value store.
pub trait Storage {
    /// Reads a value. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Deletes a value. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory storage, used by tests and the HTTP server.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the stored files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EscapeRoomError::storage(key, e.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| EscapeRoomError::storage(key, e.to_string()))?;
        // Replace atomically via a sibling temp file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| EscapeRoomError::storage(key, e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| EscapeRoomError::storage(key, e.to_string()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EscapeRoomError::storage(key, e.to_string())),
        }
    }
}

// ============================================================================
// Snapshot operations
// ============================================================================

/// Persists the state. Failures are logged and swallowed.
pub fn save_game_state<S: Storage + ?Sized>(storage: &mut S, state: &GameState) {
    let result = serde_json::to_string(state)
        .map_err(EscapeRoomError::from)
        .and_then(|json| storage.set(STORAGE_KEY, &json));
    if let Err(e) = result {
        warn!(error = %e, "Failed to persist game state");
    }
}

/// Removes the persisted snapshot. Failures are logged and swallowed.
pub fn clear_game_state<S: Storage + ?Sized>(storage: &mut S) {
    if let Err(e) = storage.remove(STORAGE_KEY) {
        warn!(error = %e, "Failed to clear persisted game state");
    }
}

/// Loads and reconciles the persisted snapshot.
///
/// Returns `None` when there is no snapshot or it fails validation. An
/// invalid snapshot is also removed from storage.
pub fn load_game_state<S: Storage + ?Sized>(storage: &mut S) -> Option<GameState> {
    let raw = match storage.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Failed to read persisted game state");
            return None;
        }
    };

    match parse_snapshot(&raw) {
        Ok(state) => {
            debug!(status = %state.status, "Loaded persisted game state");
            Some(state)
        }
        Err(reason) => {
            warn!(%reason, "Discarding invalid persisted game state");
            clear_game_state(storage);
            None
        }
    }
}

/// Returns `true` if a loaded snapshot should be resumed.
///
/// Active games need a current scenario; finished results are always kept.
/// A reload after the last scenario therefore shows the results again
/// instead of dropping back to idle.
#[must_use]
pub fn should_restore(state: &GameState) -> bool {
    match state.status {
        GameStatus::Idle => false,
        GameStatus::Playing | GameStatus::ScenarioComplete => state.current_scenario.is_some(),
        GameStatus::Results => true,
    }
}

/// Validates a raw snapshot and overlays it on the idle state.
fn parse_snapshot(raw: &str) -> std::result::Result<GameState, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("malformed JSON: {e}"))?;
    let Value::Object(fields) = value else {
        return Err("snapshot is not an object".to_string());
    };

    let status_known = fields
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| GameStatus::ALL.iter().any(|known| known.as_str() == s));
    if !status_known {
        return Err("missing or unknown status".to_string());
    }
    if !fields.get("selectedControlIds").is_some_and(Value::is_array) {
        return Err("selectedControlIds is not an array".to_string());
    }
    if !fields.get("hintsUsed").is_some_and(Value::is_number) {
        return Err("hintsUsed is not a number".to_string());
    }

    let Value::Object(mut merged) =
        serde_json::to_value(GameState::idle()).map_err(|e| e.to_string())?
    else {
        return Err("idle state did not serialize to an object".to_string());
    };
    for (key, value) in fields {
        if !value.is_null() && merged.contains_key(&key) {
            merged.insert(key, value);
        }
    }

    serde_json::from_value(Value::Object(merged)).map_err(|e| format!("incompatible snapshot: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::content::ContentStore;
    use crate::game_state::GameAction;

    fn playing_state() -> GameState {
        let content = ContentStore::builtin().unwrap();
        GameState::idle()
            .transition(GameAction::Start {
                scenarios: content.scenarios()[..2].to_vec(),
                started_at: Utc::now(),
            })
            .transition(GameAction::ToggleControl("audit-logging".into()))
    }

    /// Storage whose writes always fail.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Err(EscapeRoomError::storage(key, "disk on fire"))
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<()> {
            Err(EscapeRoomError::storage(key, "disk on fire"))
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            Err(EscapeRoomError::storage(key, "disk on fire"))
        }
    }

    #[test]
    fn test_save_then_load() {
        let mut storage = MemoryStorage::new();
        let state = playing_state();
        save_game_state(&mut storage, &state);

        let loaded = load_game_state(&mut storage).unwrap();
        assert_eq!(loaded, state);
        assert!(should_restore(&loaded));
    }

    #[test]
    fn test_load_missing_returns_none() {
        let mut storage = MemoryStorage::new();
        assert!(load_game_state(&mut storage).is_none());
    }

    #[test]
    fn test_unknown_status_is_discarded_and_cleared() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                STORAGE_KEY,
                r#"{"status": "submitted", "selectedControlIds": [], "hintsUsed": 0}"#,
            )
            .unwrap();

        assert!(load_game_state(&mut storage).is_none());
        assert_eq!(storage.get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_wrong_field_types_are_discarded() {
        let cases = [
            r#"{"status": "playing", "selectedControlIds": "audit-logging", "hintsUsed": 0}"#,
            r#"{"status": "playing", "selectedControlIds": [], "hintsUsed": "two"}"#,
            r#"{"selectedControlIds": [], "hintsUsed": 0}"#,
            "[1, 2, 3]",
            "{ not json",
        ];
        for raw in cases {
            let mut storage = MemoryStorage::new();
            storage.set(STORAGE_KEY, raw).unwrap();
            assert!(load_game_state(&mut storage).is_none(), "accepted: {raw}");
            assert_eq!(storage.get(STORAGE_KEY).unwrap(), None);
        }
    }

    #[test]
    fn test_missing_fields_filled_from_idle() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                STORAGE_KEY,
                r#"{"status": "idle", "selectedControlIds": ["a"], "hintsUsed": 2, "legacyFlag": true}"#,
            )
            .unwrap();

        let loaded = load_game_state(&mut storage).unwrap();
        assert_eq!(loaded.status, GameStatus::Idle);
        assert_eq!(loaded.selected_control_ids, vec!["a"]);
        assert_eq!(loaded.hints_used, 2);
        assert!(loaded.scenarios.is_empty());
        assert!(loaded.hint_history.is_empty());
        assert!(!should_restore(&loaded));
    }

    #[test]
    fn test_playing_without_scenario_is_not_restored() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                STORAGE_KEY,
                r#"{"status": "playing", "selectedControlIds": [], "hintsUsed": 0, "currentScenario": null}"#,
            )
            .unwrap();

        let loaded = load_game_state(&mut storage).unwrap();
        assert!(!should_restore(&loaded));
    }

    #[test]
    fn test_finished_results_are_restored() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                STORAGE_KEY,
                r#"{"status": "results", "selectedControlIds": [], "hintsUsed": 0, "currentScenario": null}"#,
            )
            .unwrap();

        let loaded = load_game_state(&mut storage).unwrap();
        assert_eq!(loaded.status, GameStatus::Results);
        assert!(should_restore(&loaded));
    }

    #[test]
    fn test_broken_storage_is_tolerated() {
        let mut storage = BrokenStorage;
        save_game_state(&mut storage, &playing_state());
        clear_game_state(&mut storage);
        assert!(load_game_state(&mut storage).is_none());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join("test_escape_room_file_storage");
        let mut storage = FileStorage::new(&dir);

        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "value").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("value"));
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);

        std::fs::remove_dir_all(&dir).ok();
    }
}
