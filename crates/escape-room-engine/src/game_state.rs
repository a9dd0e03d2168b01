//! Game state and its transition function.
//!
//! [`GameState::transition`] is pure: it takes the current state and an
//! action and returns the next state. Actions that are not valid in the
//! current status return an unchanged copy.
//!
//! ```text
//! idle --start--> playing --submit--> scenario-complete --advance--> playing
//!                    |                                      |
//!                    +--submit (last scenario)--> results <-+ (none left)
//! ```
//!
//! `start`, `reset` and `restore` are accepted from any status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::Scenario;
use crate::grading::GradingResult;

// ============================================================================
// GameStatus
// ============================================================================

/// Where the player is in a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    /// No session in progress.
    #[default]
    Idle,
    /// Selecting controls for the current scenario.
    Playing,
    /// Current scenario graded, more remain.
    ScenarioComplete,
    /// Every scenario graded.
    Results,
}

impl GameStatus {
    /// Every status, for snapshot validation.
    pub const ALL: [Self; 4] = [
        Self::Idle,
        Self::Playing,
        Self::ScenarioComplete,
        Self::Results,
    ];

    /// Wire identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::ScenarioComplete => "scenario-complete",
            Self::Results => "results",
        }
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ScenarioSessionResult
// ============================================================================

/// The record kept for each submitted scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSessionResult {
    /// The scenario played.
    pub scenario: Scenario,
    /// Controls the player submitted.
    pub selected_control_ids: Vec<String>,
    /// Grade for the submission.
    pub grading_result: GradingResult,
    /// Hints used on this scenario.
    pub hints_used: u32,
}

// ============================================================================
// GameAction
// ============================================================================

/// Every input the state machine accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    /// Begin a session with the given scenario sequence.
    Start {
        /// Scenarios in play order.
        scenarios: Vec<Scenario>,
        /// Session start time.
        started_at: DateTime<Utc>,
    },
    /// Add the control if absent, remove it if present.
    ToggleControl(String),
    /// Add the control if absent.
    SelectControl(String),
    /// Remove the control if present.
    DeselectControl(String),
    /// Record a delivered hint.
    AddHint(String),
    /// Record the grade for the current scenario.
    Submit {
        /// Result from the grading engine.
        grading_result: GradingResult,
        /// Submission time.
        submitted_at: DateTime<Utc>,
    },
    /// Move past a completed scenario.
    Advance,
    /// Return to idle.
    Reset,
    /// Replace the state wholesale with a persisted snapshot.
    Restore(Box<GameState>),
}

// ============================================================================
// GameState
// ============================================================================

/// Complete session state. Persisted after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Current status.
    pub status: GameStatus,
    /// Scenario sequence for the session.
    pub scenarios: Vec<Scenario>,
    /// Index of the current scenario within `scenarios`.
    pub current_scenario_index: usize,
    /// The scenario being played.
    pub current_scenario: Option<Scenario>,
    /// Selected control ids in selection order, without duplicates.
    pub selected_control_ids: Vec<String>,
    /// Hints used on the current scenario.
    pub hints_used: u32,
    /// Hint texts delivered for the current scenario.
    pub hint_history: Vec<String>,
    /// Grade for the most recent submission.
    pub grading_result: Option<GradingResult>,
    /// One entry per submitted scenario.
    pub scenario_results: Vec<ScenarioSessionResult>,
    /// When the session started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the most recent scenario was submitted.
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::idle()
    }
}

impl GameState {
    /// The canonical idle state.
    ///
    /// # Examples
    ///
    /// ```
    /// use escape_room_engine::{GameState, GameStatus};
    ///
    /// let state = GameState::idle();
    /// assert_eq!(state.status, GameStatus::Idle);
    /// assert!(state.current_scenario.is_none());
    /// assert_eq!(state.hints_used, 0);
    /// ```
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            status: GameStatus::Idle,
            scenarios: Vec::new(),
            current_scenario_index: 0,
            current_scenario: None,
            selected_control_ids: Vec::new(),
            hints_used: 0,
            hint_history: Vec::new(),
            grading_result: None,
            scenario_results: Vec::new(),
            started_at: None,
            submitted_at: None,
        }
    }

    /// Applies an action and returns the next state.
    #[must_use]
    pub fn transition(&self, action: GameAction) -> Self {
        match action {
            GameAction::Start {
                scenarios,
                started_at,
            } => self.start(scenarios, started_at),
            GameAction::ToggleControl(id) => self.while_playing(|next| {
                if let Some(pos) = next.selected_control_ids.iter().position(|s| *s == id) {
                    next.selected_control_ids.remove(pos);
                } else {
                    next.selected_control_ids.push(id);
                }
            }),
            GameAction::SelectControl(id) => self.while_playing(|next| {
                if !next.selected_control_ids.contains(&id) {
                    next.selected_control_ids.push(id);
                }
            }),
            GameAction::DeselectControl(id) => self.while_playing(|next| {
                next.selected_control_ids.retain(|s| *s != id);
            }),
            GameAction::AddHint(hint) => self.while_playing(|next| {
                next.hint_history.push(hint);
                next.hints_used += 1;
            }),
            GameAction::Submit {
                grading_result,
                submitted_at,
            } => self.submit(grading_result, submitted_at),
            GameAction::Advance => self.advance(),
            GameAction::Reset => Self::idle(),
            GameAction::Restore(state) => *state,
        }
    }

    fn start(&self, scenarios: Vec<Scenario>, started_at: DateTime<Utc>) -> Self {
        let Some(first) = scenarios.first().cloned() else {
            return self.clone();
        };
        Self {
            status: GameStatus::Playing,
            scenarios,
            current_scenario: Some(first),
            started_at: Some(started_at),
            ..Self::idle()
        }
    }

    fn while_playing(&self, apply: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        if self.status == GameStatus::Playing {
            apply(&mut next);
        }
        next
    }

    fn submit(&self, grading_result: GradingResult, submitted_at: DateTime<Utc>) -> Self {
        if !self.can_submit() {
            return self.clone();
        }
        let Some(scenario) = self.current_scenario.clone() else {
            return self.clone();
        };

        let mut next = self.clone();
        next.scenario_results.push(ScenarioSessionResult {
            scenario,
            selected_control_ids: self.selected_control_ids.clone(),
            grading_result: grading_result.clone(),
            hints_used: self.hints_used,
        });
        next.grading_result = Some(grading_result);
        next.submitted_at = Some(submitted_at);
        next.status = if self.is_last_scenario() {
            GameStatus::Results
        } else {
            GameStatus::ScenarioComplete
        };
        next
    }

    fn advance(&self) -> Self {
        if self.status != GameStatus::ScenarioComplete {
            return self.clone();
        }

        let mut next = self.clone();
        let next_index = self.current_scenario_index + 1;
        match self.scenarios.get(next_index) {
            Some(scenario) => {
                next.status = GameStatus::Playing;
                next.current_scenario_index = next_index;
                next.current_scenario = Some(scenario.clone());
                next.selected_control_ids.clear();
                next.hints_used = 0;
                next.hint_history.clear();
                next.grading_result = None;
            }
            None => next.status = GameStatus::Results,
        }
        next
    }

    /// Returns `true` while the player is selecting controls.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    /// Returns `true` when a submission would be accepted.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.is_playing()
            && self.current_scenario.is_some()
            && !self.selected_control_ids.is_empty()
    }

    /// Returns `true` when a hint may be requested under `max_hints`.
    #[must_use]
    pub fn can_request_hint(&self, max_hints: u32) -> bool {
        self.is_playing() && self.hints_used < max_hints
    }

    /// Hints left under `max_hints`.
    #[must_use]
    pub const fn hints_remaining(&self, max_hints: u32) -> u32 {
        max_hints.saturating_sub(self.hints_used)
    }

    /// Returns `true` when the current scenario is the last in the sequence.
    #[must_use]
    pub fn is_last_scenario(&self) -> bool {
        self.current_scenario_index + 1 >= self.scenarios.len()
    }

    /// Number of scenarios in the session.
    #[must_use]
    pub fn total_scenarios(&self) -> usize {
        self.scenarios.len()
    }

    /// One-based position of the current scenario, `0` when idle.
    #[must_use]
    pub fn current_scenario_number(&self) -> usize {
        if self.current_scenario.is_some() {
            self.current_scenario_index + 1
        } else {
            0
        }
    }

    /// Returns `true` if `control_id` is currently selected.
    #[must_use]
    pub fn is_selected(&self, control_id: &str) -> bool {
        self.selected_control_ids.iter().any(|id| id == control_id)
    }
}

// ============================================================================
// Tests
// ============================================================================
