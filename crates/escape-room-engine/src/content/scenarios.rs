//! Scenario and rubric types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Scenario difficulty. Only `standard` exists today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// The default difficulty.
    #[default]
    Standard,
}

/// A governance incident the player must respond to.
///
/// Carries no grading data, so it is safe to hand to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Stable identifier, e.g. `scenario-1-leaky-sharepoint`.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Emoji shown next to the title.
    pub icon: String,
    /// Short topic line.
    pub topic: String,
    /// Narrative in markdown.
    pub story: String,
    /// What could go wrong.
    pub risk_statement: String,
    /// What good governance looks like here.
    pub governance_objective: String,
    /// Difficulty level.
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Grading rubric for one scenario.
///
/// The three control lists are sets: disjoint and free of duplicates.
/// Their order is the order feedback is reported in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRubric {
    /// Scenario this rubric grades.
    #[serde(default)]
    pub scenario_id: String,
    /// Controls needed for full required credit.
    pub required_controls: Vec<String>,
    /// Controls that earn bonus credit.
    #[serde(default)]
    pub recommended_controls: Vec<String>,
    /// Controls that cost points when selected.
    #[serde(default)]
    pub anti_pattern_controls: Vec<String>,
    /// Explanation per control id.
    #[serde(default)]
    pub control_rationales: BTreeMap<String, String>,
    /// Real-world implementation pitfalls, in display order.
    #[serde(default)]
    pub gotchas: Vec<String>,
    /// What a better response would have looked like.
    pub improved_approach: String,
}

impl ScenarioRubric {
    /// Rationale for a control, if the rubric has one.
    #[must_use]
    pub fn rationale(&self, control_id: &str) -> Option<&str> {
        self.control_rationales.get(control_id).map(String::as_str)
    }

    /// Every control id the rubric mentions, in required, recommended,
    /// anti-pattern order.
    pub fn referenced_controls(&self) -> impl Iterator<Item = &String> {
        self.required_controls
            .iter()
            .chain(&self.recommended_controls)
            .chain(&self.anti_pattern_controls)
    }
}

/// A scenario bundled with its rubric, as stored in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    /// Player-facing scenario data.
    #[serde(flatten)]
    pub scenario: Scenario,
    /// Grading rubric.
    pub rubric: ScenarioRubric,
}
