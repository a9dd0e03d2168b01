//! Static content: the control library and the scenario catalog.
//!
//! The built-in catalog is embedded at compile time and validated once on
//! first use. Custom catalogs go through the same checks in
//! [`ContentStore::new`]: control ids are unique, every rubric references
//! known controls only, and a rubric's required, recommended and
//! anti-pattern sets are pairwise disjoint.

mod controls;
mod scenarios;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::Rng;

pub use controls::{AdminRole, Control, ControlCategory};
pub use scenarios::{Difficulty, Scenario, ScenarioDefinition, ScenarioRubric};

use crate::error::{EscapeRoomError, Result};

const BUILTIN_CONTROLS: &str = include_str!("../../data/controls.json");
const BUILTIN_SCENARIOS: &str = include_str!("../../data/scenarios.json");

static BUILTIN: Lazy<std::result::Result<Arc<ContentStore>, String>> = Lazy::new(|| {
    ContentStore::from_json(BUILTIN_CONTROLS, BUILTIN_SCENARIOS)
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

/// Immutable catalog of controls, scenarios and rubrics.
#[derive(Debug, Clone)]
pub struct ContentStore {
    controls: Vec<Control>,
    control_index: HashMap<String, usize>,
    scenarios: Vec<Scenario>,
    rubrics: HashMap<String, ScenarioRubric>,
}

impl ContentStore {
    /// Returns the shared built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns `ContentIntegrity` if the embedded catalog is invalid.
    pub fn builtin() -> Result<Arc<Self>> {
        BUILTIN
            .clone()
            .map_err(|message| EscapeRoomError::content_integrity("builtin", message))
    }

    /// Parses and validates a catalog from JSON documents.
    pub fn from_json(controls_json: &str, scenarios_json: &str) -> Result<Self> {
        let controls: Vec<Control> = serde_json::from_str(controls_json)?;
        let definitions: Vec<ScenarioDefinition> = serde_json::from_str(scenarios_json)?;
        Self::new(controls, definitions)
    }

    /// Builds a catalog, checking every rubric invariant.
    ///
    /// # Errors
    ///
    /// Returns `ContentIntegrity` for duplicate ids, rubrics that reference
    /// unknown controls, or overlapping rubric sets.
    pub fn new(controls: Vec<Control>, definitions: Vec<ScenarioDefinition>) -> Result<Self> {
        let mut control_index = HashMap::with_capacity(controls.len());
        for (idx, control) in controls.iter().enumerate() {
            if control_index.insert(control.id.clone(), idx).is_some() {
                return Err(EscapeRoomError::content_integrity(
                    "controls",
                    format!("duplicate control id '{}'", control.id),
                ));
            }
        }

        let mut scenarios = Vec::with_capacity(definitions.len());
        let mut rubrics = HashMap::with_capacity(definitions.len());
        for ScenarioDefinition {
            scenario,
            mut rubric,
        } in definitions
        {
            rubric.scenario_id.clone_from(&scenario.id);
            validate_rubric(&rubric, &control_index)?;
            if rubrics.insert(scenario.id.clone(), rubric).is_some() {
                return Err(EscapeRoomError::content_integrity(
                    &scenario.id,
                    "duplicate scenario id",
                ));
            }
            scenarios.push(scenario);
        }

        Ok(Self {
            controls,
            control_index,
            scenarios,
            rubrics,
        })
    }

    /// All controls in library order.
    #[must_use]
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Looks up a control by id.
    #[must_use]
    pub fn control(&self, id: &str) -> Option<&Control> {
        self.control_index.get(id).map(|&idx| &self.controls[idx])
    }

    /// Every control id in library order.
    #[must_use]
    pub fn control_ids(&self) -> Vec<&str> {
        self.controls.iter().map(|c| c.id.as_str()).collect()
    }

    /// Controls in one category, in library order.
    #[must_use]
    pub fn controls_by_category(&self, category: ControlCategory) -> Vec<&Control> {
        self.controls
            .iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Controls grouped by category in display order. Empty categories are
    /// omitted.
    #[must_use]
    pub fn grouped_by_category(&self) -> Vec<(ControlCategory, Vec<&Control>)> {
        ControlCategory::ALL
            .into_iter()
            .map(|category| (category, self.controls_by_category(category)))
            .filter(|(_, controls)| !controls.is_empty())
            .collect()
    }

    /// All scenarios in catalog order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Looks up a scenario by id.
    #[must_use]
    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Looks up the rubric for a scenario.
    #[must_use]
    pub fn rubric(&self, scenario_id: &str) -> Option<&ScenarioRubric> {
        self.rubrics.get(scenario_id)
    }

    /// Picks one scenario uniformly at random.
    pub fn random_scenario<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Scenario> {
        if self.scenarios.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.scenarios.len());
        self.scenarios.get(idx)
    }

    /// Returns every scenario in a uniformly shuffled order.
    pub fn shuffled_scenarios<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Scenario> {
        let mut scenarios = self.scenarios.clone();
        // Fisher-Yates shuffle
        for i in (1..scenarios.len()).rev() {
            let j = rng.gen_range(0..=i);
            scenarios.swap(i, j);
        }
        scenarios
    }
}

fn validate_rubric(rubric: &ScenarioRubric, control_index: &HashMap<String, usize>) -> Result<()> {
    let fail = |message: String| EscapeRoomError::content_integrity(&rubric.scenario_id, message);

    if let Some(unknown) = rubric
        .referenced_controls()
        .find(|id| !control_index.contains_key(id.as_str()))
    {
        return Err(fail(format!("rubric references unknown control '{unknown}'")));
    }

    let mut seen = HashSet::new();
    for id in rubric.referenced_controls() {
        if !seen.insert(id.as_str()) {
            return Err(fail(format!(
                "control '{id}' appears more than once across the rubric sets"
            )));
        }
    }

    Ok(())
}
