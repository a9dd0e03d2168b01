//! Session driver.
//!
//! [`GameSession`] wires the pure state machine to content, grading,
//! randomness and storage. Every transition is persisted, and a saved game
//! is picked back up on construction.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::{Config, SessionMode};
use crate::content::{ContentStore, ControlCategory};
use crate::error::Result;
use crate::game_state::{GameAction, GameState, GameStatus};
use crate::grading::{grade_submission, GradingResult};
use crate::hints::{HintArbiter, HintContext, HintResult};
use crate::persistence::{clear_game_state, load_game_state, save_game_state, should_restore, Storage};

/// One player's game, backed by a [`Storage`].
pub struct GameSession<S: Storage> {
    state: GameState,
    content: Arc<ContentStore>,
    storage: S,
    rng: StdRng,
    mode: SessionMode,
    max_hints: u32,
}

impl<S: Storage> GameSession<S> {
    /// Creates a session and resumes any saved game worth resuming.
    ///
    /// The configured seed, if any, makes scenario order reproducible.
    pub fn new(content: Arc<ContentStore>, storage: S, config: &Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(
            content,
            storage,
            config.session_mode,
            config.hints.max_hints_per_session,
            rng,
        )
    }

    /// Creates a session with an explicit random source.
    pub fn with_rng(
        content: Arc<ContentStore>,
        storage: S,
        mode: SessionMode,
        max_hints: u32,
        rng: StdRng,
    ) -> Self {
        let mut session = Self {
            state: GameState::idle(),
            content,
            storage,
            rng,
            mode,
            max_hints,
        };
        session.restore_from_storage();
        session
    }

    /// Reloads the saved game, if it describes an active or finished game.
    ///
    /// Returns `true` when a game was restored.
    pub fn restore_from_storage(&mut self) -> bool {
        let Some(saved) = load_game_state(&mut self.storage) else {
            return false;
        };
        if !should_restore(&saved) {
            debug!(status = %saved.status, "Saved game not resumable, starting fresh");
            return false;
        }
        info!(
            status = %saved.status,
            scenario = saved.current_scenario_number(),
            total = saved.total_scenarios(),
            "Resuming saved game"
        );
        self.state = self.state.transition(GameAction::Restore(Box::new(saved)));
        true
    }

    fn apply(&mut self, action: GameAction) -> &GameState {
        self.state = self.state.transition(action);
        save_game_state(&mut self.storage, &self.state);
        &self.state
    }

    /// Starts a new game.
    ///
    /// Single mode plays one random scenario; sequence mode plays all of
    /// them in shuffled order.
    pub fn start(&mut self) -> &GameState {
        let scenarios = match self.mode {
            SessionMode::Single => self
                .content
                .random_scenario(&mut self.rng)
                .cloned()
                .into_iter()
                .collect(),
            SessionMode::Sequence => self.content.shuffled_scenarios(&mut self.rng),
        };
        info!(count = scenarios.len(), mode = ?self.mode, "Starting session");
        self.apply(GameAction::Start {
            scenarios,
            started_at: Utc::now(),
        })
    }

    /// Adds or removes a control from the selection.
    pub fn toggle_control(&mut self, control_id: &str) -> &GameState {
        debug!(control_id, "Toggling control");
        self.apply(GameAction::ToggleControl(control_id.to_string()))
    }

    /// Adds a control to the selection if absent.
    pub fn select_control(&mut self, control_id: &str) -> &GameState {
        debug!(control_id, "Selecting control");
        self.apply(GameAction::SelectControl(control_id.to_string()))
    }

    /// Removes a control from the selection if present.
    pub fn deselect_control(&mut self, control_id: &str) -> &GameState {
        debug!(control_id, "Deselecting control");
        self.apply(GameAction::DeselectControl(control_id.to_string()))
    }

    /// Records a delivered hint. Quota is the caller's concern.
    pub fn add_hint(&mut self, hint: impl Into<String>) -> &GameState {
        self.apply(GameAction::AddHint(hint.into()))
    }

    /// Grades and records the current selection.
    ///
    /// Returns `Ok(None)` when nothing can be submitted (not playing or
    /// empty selection).
    ///
    /// # Errors
    ///
    /// Returns `RubricNotFound` if the current scenario has no rubric.
    pub fn submit(&mut self) -> Result<Option<GradingResult>> {
        if !self.state.can_submit() {
            return Ok(None);
        }
        let Some(scenario_id) = self.state.current_scenario.as_ref().map(|s| s.id.clone()) else {
            return Ok(None);
        };

        let result = grade_submission(&self.content, &scenario_id, &self.state.selected_control_ids)?;
        info!(
            scenario = %scenario_id,
            score = result.score,
            grade = %result.grade,
            "Scenario submitted"
        );
        self.apply(GameAction::Submit {
            grading_result: result.clone(),
            submitted_at: Utc::now(),
        });
        Ok(Some(result))
    }

    /// Moves past a completed scenario.
    pub fn advance(&mut self) -> &GameState {
        let state = self.apply(GameAction::Advance);
        info!(status = %state.status, scenario = state.current_scenario_number(), "Advanced");
        &self.state
    }

    /// Returns to idle and clears the saved game.
    pub fn reset(&mut self) -> &GameState {
        info!("Resetting session");
        self.state = self.state.transition(GameAction::Reset);
        clear_game_state(&mut self.storage);
        &self.state
    }

    /// Asks the arbiter for a hint on the current scenario.
    ///
    /// Returns `Ok(None)` when no game is in progress. The hint is only
    /// recorded if a provider answered.
    ///
    /// # Errors
    ///
    /// Returns `HintQuotaExceeded` once the quota is spent, or
    /// `HintUnavailable` when every provider failed.
    pub async fn request_hint(
        &mut self,
        arbiter: &HintArbiter,
        category: Option<ControlCategory>,
    ) -> Result<Option<HintResult>> {
        let Some(scenario) = self.state.current_scenario.as_ref().filter(|_| self.state.is_playing())
        else {
            return Ok(None);
        };

        let context = HintContext {
            scenario_id: scenario.id.clone(),
            category,
            selected_control_ids: self.state.selected_control_ids.clone(),
            hints_used: self.state.hints_used,
        };
        let result = arbiter.get_hint(&context).await?;
        self.add_hint(result.hint.clone());
        Ok(Some(result))
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Content the session plays from.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns `true` while the player is selecting controls.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Returns `true` after a non-final scenario was submitted.
    #[must_use]
    pub fn is_scenario_complete(&self) -> bool {
        self.state.status == GameStatus::ScenarioComplete
    }

    /// Returns `true` once every scenario has been submitted.
    #[must_use]
    pub fn has_results(&self) -> bool {
        self.state.status == GameStatus::Results
    }

    /// Returns `true` when a submission would be accepted.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.state.can_submit()
    }

    /// Returns `true` when a hint may be requested.
    #[must_use]
    pub fn can_request_hint(&self) -> bool {
        self.state.can_request_hint(self.max_hints)
    }

    /// Hints left on the current scenario.
    #[must_use]
    pub const fn hints_remaining(&self) -> u32 {
        self.state.hints_remaining(self.max_hints)
    }

    /// Number of scenarios in the session.
    #[must_use]
    pub fn total_scenarios(&self) -> usize {
        self.state.total_scenarios()
    }

    /// One-based position of the current scenario.
    #[must_use]
    pub fn current_scenario_number(&self) -> usize {
        self.state.current_scenario_number()
    }

    /// Returns `true` when the current scenario is the last one.
    #[must_use]
    pub fn is_last_scenario(&self) -> bool {
        self.state.is_last_scenario()
    }
}
