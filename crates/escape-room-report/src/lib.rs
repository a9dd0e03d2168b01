//! Governance Escape Room reports
//!
//! This crate turns grading results and finished sessions into reports.
//! Reports can be serialized to JSON for programmatic access or rendered to
//! Markdown for human consumption.
//!
//! # Types
//!
//! - [`SessionReport`] - Summary of a whole session
//! - [`ScenarioSummary`] - One row per submitted scenario
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - Compact or pretty JSON for any report value
//! - [`MarkdownGenerator`] - Markdown for a single grading result or a session
//!
//! # Example
//!
//! ```rust
//! use escape_room_engine::{grade_submission, ContentStore};
//! use escape_room_report::json::JsonGenerator;
//! use escape_room_report::MarkdownGenerator;
//!
//! let content = ContentStore::builtin().unwrap();
//! let result = grade_submission(&content, "scenario-4-prompt-injection", &["prompt-hardening"]).unwrap();
//!
//! let markdown = MarkdownGenerator::for_result("Prompt injection", &result).generate();
//! assert!(markdown.contains("## Missed Picks"));
//!
//! let json = JsonGenerator::new(&result).generate().unwrap();
//! assert!(json.contains("\"score\""));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use escape_room_engine::{GameState, GameStatus, Grade};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid report data.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Session Report
// ============================================================================

/// One submitted scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    /// Scenario id.
    pub scenario_id: String,
    /// Scenario title.
    pub title: String,
    /// Scenario icon.
    pub icon: String,
    /// Final score.
    pub score: u8,
    /// Letter grade.
    pub grade: Grade,
    /// Hints used on this scenario.
    pub hints_used: u32,
    /// Correct picks.
    pub correct_count: usize,
    /// Missed required and recommended controls.
    pub missed_count: usize,
    /// Anti-patterns selected.
    pub unnecessary_count: usize,
}

/// Summary of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    /// Session status when the report was taken.
    pub status: GameStatus,
    /// Scenarios submitted so far.
    pub scenarios_completed: usize,
    /// Scenarios in the session.
    pub total_scenarios: usize,
    /// Mean score, rounded half up.
    pub average_score: u8,
    /// Grade of the rounded average.
    pub overall_grade: Grade,
    /// Hints used across all scenarios.
    pub total_hints_used: u32,
    /// When the session started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the last scenario was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Seconds between start and last submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    /// Per-scenario rows in play order.
    pub scenarios: Vec<ScenarioSummary>,
}

impl SessionReport {
    /// Builds a report from a session state.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidData`] if no scenario has been submitted.
    pub fn from_state(state: &GameState) -> Result<Self> {
        if state.scenario_results.is_empty() {
            return Err(ReportError::InvalidData(
                "no scenario has been submitted yet".to_string(),
            ));
        }

        let scenarios: Vec<ScenarioSummary> = state
            .scenario_results
            .iter()
            .map(|r| ScenarioSummary {
                scenario_id: r.scenario.id.clone(),
                title: r.scenario.title.clone(),
                icon: r.scenario.icon.clone(),
                score: r.grading_result.score,
                grade: r.grading_result.grade,
                hints_used: r.hints_used,
                correct_count: r.grading_result.correct_picks.len(),
                missed_count: r.grading_result.missed_picks.len(),
                unnecessary_count: r.grading_result.unnecessary_picks.len(),
            })
            .collect();

        let average_score = average(scenarios.iter().map(|s| s.score));
        let duration_seconds = match (state.started_at, state.submitted_at) {
            (Some(start), Some(end)) => u64::try_from((end - start).num_seconds()).ok(),
            _ => None,
        };

        Ok(Self {
            status: state.status,
            scenarios_completed: scenarios.len(),
            total_scenarios: state.total_scenarios(),
            average_score,
            overall_grade: Grade::from_score(average_score),
            total_hints_used: scenarios.iter().map(|s| s.hints_used).sum(),
            started_at: state.started_at,
            finished_at: state.submitted_at,
            duration_seconds,
            scenarios,
        })
    }

    /// Returns `true` once every scenario in the session was submitted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == GameStatus::Results
    }
}

/// Integer mean rounded half up. Zero for an empty input.
fn average(scores: impl Iterator<Item = u8>) -> u8 {
    let (sum, count) = scores.fold((0u32, 0u32), |(sum, n), s| (sum + u32::from(s), n + 1));
    if count == 0 {
        return 0;
    }
    u8::try_from((2 * sum + count) / (2 * count)).unwrap_or(u8::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};
    use escape_room_engine::{grade_submission, ContentStore, GameAction, GameState};

    /// A two-scenario session with both scenarios submitted.
    ///
    /// Scenario 1 gets every required and recommended control (100). Scenario
    /// 2 gets two of three required controls and one anti-pattern.
    pub fn finished_session() -> GameState {
        let content = ContentStore::builtin().unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let scenarios = vec![
            content.scenario("scenario-1-leaky-sharepoint").unwrap().clone(),
            content.scenario("scenario-2-label-lockdown").unwrap().clone(),
        ];

        let first = [
            "least-privilege-access",
            "sharepoint-permissions-audit",
            "site-collection-scoping",
            "restricted-sharepoint-search",
            "audit-logging",
        ];
        let second = ["sensitivity-labels", "encryption-enforcement", "tool-scoping"];

        let mut state = GameState::idle().transition(GameAction::Start {
            scenarios,
            started_at: start,
        });
        for id in first {
            state = state.transition(GameAction::SelectControl(id.to_string()));
        }
        state = state.transition(GameAction::AddHint("look at permissions".to_string()));
        state = state.transition(GameAction::Submit {
            grading_result: grade_submission(&content, "scenario-1-leaky-sharepoint", &first)
                .unwrap(),
            submitted_at: start + chrono::Duration::seconds(150),
        });
        state = state.transition(GameAction::Advance);
        for id in second {
            state = state.transition(GameAction::SelectControl(id.to_string()));
        }
        state.transition(GameAction::Submit {
            grading_result: grade_submission(&content, "scenario-2-label-lockdown", &second)
                .unwrap(),
            submitted_at: start + chrono::Duration::seconds(365),
        })
    }
}
