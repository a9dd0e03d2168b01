//! Rubric-based grading.
//!
//! [`grade_submission`] is a pure function of the catalog, a scenario id and
//! the player's selection. It never mutates anything and always returns a
//! fully populated [`GradingResult`].
//!
//! Scoring:
//! - required coverage earns up to [`REQUIRED_POINTS_MAX`]
//! - recommended coverage earns up to [`RECOMMENDED_POINTS_MAX`]
//! - each anti-pattern costs [`PENALTY_PER_ITEM`], capped at [`MAX_PENALTY`]
//!
//! An empty required or recommended set earns its full points. The final
//! score is clamped to `0..=100` and rounded once from the unrounded sum.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::{AdminRole, ContentStore, ScenarioRubric};
use crate::error::{EscapeRoomError, Result};

/// Points available for covering the required controls.
pub const REQUIRED_POINTS_MAX: u32 = 70;
/// Points available for covering the recommended controls.
pub const RECOMMENDED_POINTS_MAX: u32 = 30;
/// Points deducted per selected anti-pattern.
pub const PENALTY_PER_ITEM: u32 = 4;
/// Largest total anti-pattern deduction.
pub const MAX_PENALTY: u32 = 20;

/// Caveat attached to every admin role mapping.
pub const ADMIN_ROLE_DISCLAIMER: &str = "Verify specific role requirements in your tenant as custom roles or Privileged Identity Management may apply. Role requirements may change based on Microsoft updates.";

const CORRECT_FALLBACK: &str = "This is a relevant governance control for this scenario.";
const MISSED_FALLBACK: &str = "This control would have helped address the scenario.";
const UNNECESSARY_FALLBACK: &str = "This control is not directly relevant to the scenario.";

// ============================================================================
// Grade
// ============================================================================

/// Letter grade derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    /// 90 and above.
    A,
    /// 80 to 89.
    B,
    /// 70 to 79.
    C,
    /// 60 to 69.
    D,
    /// Below 60.
    F,
}

impl Grade {
    /// Maps a score to a grade. Thresholds are inclusive.
    ///
    /// # Examples
    ///
    /// ```
    /// use escape_room_engine::Grade;
    ///
    /// assert_eq!(Grade::from_score(90), Grade::A);
    /// assert_eq!(Grade::from_score(89), Grade::B);
    /// assert_eq!(Grade::from_score(59), Grade::F);
    /// ```
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }

    /// Short encouragement shown next to the grade.
    #[must_use]
    pub const fn verdict(&self) -> &'static str {
        match self {
            Self::A => "Excellent! You identified the key governance controls.",
            Self::B => "Good job! You found most of the important controls.",
            Self::C => "Not bad. A few key controls were missed.",
            Self::D => "Keep learning. Several important controls were missed.",
            Self::F => "Review the feedback below to strengthen your governance knowledge.",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{letter}")
    }
}

// ============================================================================
// Result types
// ============================================================================

/// Feedback for one control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFeedback {
    /// Control id.
    pub control_id: String,
    /// Control name, or the id when the control is unknown.
    pub control_name: String,
    /// Why the control matters (or doesn't) here.
    pub rationale: String,
    /// Present only on missed picks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improved_approach: Option<String>,
}

/// Roles needed to implement one correctly selected control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRoleMapping {
    /// Control id.
    pub control_id: String,
    /// Control name.
    pub control_name: String,
    /// Role identifiers.
    pub required_roles: Vec<AdminRole>,
    /// Role labels, parallel to `required_roles`.
    pub required_role_names: Vec<String>,
}

/// How the score was assembled.
///
/// Coverage values are rounded individually for display, so they may not
/// add up to the score exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Rounded required points earned.
    pub required_coverage: u32,
    /// Required points available.
    pub required_max_points: u32,
    /// Rounded recommended points earned.
    pub recommended_coverage: u32,
    /// Recommended points available.
    pub recommended_max_points: u32,
    /// Anti-pattern deduction, zero or negative.
    pub anti_pattern_penalty: i32,
    /// Required controls selected.
    pub required_selected: usize,
    /// Required controls in the rubric.
    pub required_total: usize,
    /// Recommended controls selected.
    pub recommended_selected: usize,
    /// Recommended controls in the rubric.
    pub recommended_total: usize,
    /// Anti-patterns selected.
    pub anti_pattern_selected: usize,
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    /// Final score, `0..=100`.
    pub score: u8,
    /// Letter grade.
    pub grade: Grade,
    /// Score components.
    pub breakdown: ScoreBreakdown,
    /// Required then recommended controls the player selected.
    pub correct_picks: Vec<ControlFeedback>,
    /// Required then recommended controls the player missed.
    pub missed_picks: Vec<ControlFeedback>,
    /// Anti-patterns the player selected.
    pub unnecessary_picks: Vec<ControlFeedback>,
    /// Implementation pitfalls from the rubric.
    pub gotchas: Vec<String>,
    /// Better approach from the rubric.
    pub improved_approach: String,
    /// Roles for each correct pick that has any.
    pub admin_roles: Vec<AdminRoleMapping>,
    /// Caveat for the role mapping.
    pub admin_role_disclaimer: String,
}

// ============================================================================
// Grading
// ============================================================================

/// Grades a selection against a scenario's rubric.
///
/// Selections are treated as a set: duplicates and unknown ids are ignored.
///
/// # Errors
///
/// Returns `RubricNotFound` if the scenario has no rubric.
///
/// # Examples
///
/// ```
/// use escape_room_engine::{grade_submission, ContentStore, Grade};
///
/// let content = ContentStore::builtin().unwrap();
/// let none: [&str; 0] = [];
/// let result = grade_submission(&content, "scenario-1-leaky-sharepoint", &none).unwrap();
/// assert_eq!(result.score, 0);
/// assert_eq!(result.grade, Grade::F);
/// ```
pub fn grade_submission<S: AsRef<str>>(
    content: &ContentStore,
    scenario_id: &str,
    selected_control_ids: &[S],
) -> Result<GradingResult> {
    let rubric = content
        .rubric(scenario_id)
        .ok_or_else(|| EscapeRoomError::rubric_not_found(scenario_id))?;

    let selected: HashSet<&str> = selected_control_ids.iter().map(AsRef::as_ref).collect();
    let (required_hit, required_missed) = partition(&rubric.required_controls, &selected);
    let (recommended_hit, recommended_missed) =
        partition(&rubric.recommended_controls, &selected);
    let (anti_hit, _) = partition(&rubric.anti_pattern_controls, &selected);

    let required_points = coverage_points(
        required_hit.len(),
        rubric.required_controls.len(),
        REQUIRED_POINTS_MAX,
    );
    let recommended_points = coverage_points(
        recommended_hit.len(),
        rubric.recommended_controls.len(),
        RECOMMENDED_POINTS_MAX,
    );
    let penalty = penalty_points(anti_hit.len());

    let raw = required_points + recommended_points - f64::from(penalty);
    let score = u8::try_from(round_points(raw.clamp(0.0, 100.0)).min(100)).unwrap_or(100);
    let grade = Grade::from_score(score);

    let breakdown = ScoreBreakdown {
        required_coverage: round_points(required_points),
        required_max_points: REQUIRED_POINTS_MAX,
        recommended_coverage: round_points(recommended_points),
        recommended_max_points: RECOMMENDED_POINTS_MAX,
        anti_pattern_penalty: -i32::try_from(penalty).unwrap_or(i32::MAX),
        required_selected: required_hit.len(),
        required_total: rubric.required_controls.len(),
        recommended_selected: recommended_hit.len(),
        recommended_total: rubric.recommended_controls.len(),
        anti_pattern_selected: anti_hit.len(),
    };

    let correct_picks: Vec<ControlFeedback> = required_hit
        .iter()
        .chain(&recommended_hit)
        .map(|id| feedback(content, rubric, id, CORRECT_FALLBACK, false))
        .collect();
    let missed_picks = required_missed
        .iter()
        .chain(&recommended_missed)
        .map(|id| feedback(content, rubric, id, MISSED_FALLBACK, true))
        .collect();
    let unnecessary_picks = anti_hit
        .iter()
        .map(|id| feedback(content, rubric, id, UNNECESSARY_FALLBACK, false))
        .collect();

    let admin_roles = correct_picks
        .iter()
        .filter_map(|pick| {
            let control = content.control(&pick.control_id)?;
            if control.admin_roles.is_empty() {
                return None;
            }
            Some(AdminRoleMapping {
                control_id: pick.control_id.clone(),
                control_name: pick.control_name.clone(),
                required_roles: control.admin_roles.clone(),
                required_role_names: control.admin_role_names(),
            })
        })
        .collect();

    debug!(
        scenario_id,
        score,
        grade = %grade,
        required = breakdown.required_selected,
        recommended = breakdown.recommended_selected,
        anti_patterns = breakdown.anti_pattern_selected,
        "Graded submission"
    );

    Ok(GradingResult {
        score,
        grade,
        breakdown,
        correct_picks,
        missed_picks,
        unnecessary_picks,
        gotchas: rubric.gotchas.clone(),
        improved_approach: rubric.improved_approach.clone(),
        admin_roles,
        admin_role_disclaimer: ADMIN_ROLE_DISCLAIMER.to_string(),
    })
}

/// Splits rubric ids into (selected, missed), keeping rubric order.
fn partition<'a>(ids: &'a [String], selected: &HashSet<&str>) -> (Vec<&'a str>, Vec<&'a str>) {
    ids.iter()
        .map(String::as_str)
        .partition(|id| selected.contains(id))
}

fn coverage_points(hit: usize, total: usize, max: u32) -> f64 {
    if total == 0 {
        return f64::from(max);
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = hit as f64 / total as f64;
    ratio * f64::from(max)
}

fn penalty_points(anti_patterns: usize) -> u32 {
    let count = u32::try_from(anti_patterns).unwrap_or(u32::MAX);
    count.saturating_mul(PENALTY_PER_ITEM).min(MAX_PENALTY)
}

/// Rounds a non-negative point value half-up.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_points(points: f64) -> u32 {
    points.max(0.0).round() as u32
}

fn feedback(
    content: &ContentStore,
    rubric: &ScenarioRubric,
    control_id: &str,
    fallback: &str,
    missed: bool,
) -> ControlFeedback {
    ControlFeedback {
        control_id: control_id.to_string(),
        control_name: content
            .control(control_id)
            .map_or_else(|| control_id.to_string(), |c| c.name.clone()),
        rationale: rubric.rationale(control_id).unwrap_or(fallback).to_string(),
        improved_approach: missed.then(|| rubric.improved_approach.clone()),
    }
}
