//! Hint lookup.
//!
//! A [`HintArbiter`] owns a primary [`HintProvider`] and an optional
//! fallback. It validates the request and enforces the per-session quota
//! before any provider is contacted, then tries the primary and falls back
//! on any failure. Callers see exactly one outcome per request.

mod arbiter;
mod local;
mod remote;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use arbiter::{HintArbiter, HintInfo};
pub use local::LocalHintProvider;
pub use remote::RemoteHintProvider;

use crate::content::ControlCategory;
use crate::error::Result;

/// Fallback documentation link for hints.
pub const DEFAULT_LEARN_MORE_URL: &str =
    "https://learn.microsoft.com/microsoft-365-copilot/microsoft-365-copilot-setup";

/// Which provider produced a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintSource {
    /// The configured primary provider answered.
    Primary,
    /// The primary failed and the fallback answered.
    Fallback,
}

/// Context for a hint request.
///
/// `selected_control_ids` is accepted for future use and never sent to a
/// remote provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintContext {
    /// Scenario the player is on. Required.
    #[serde(default)]
    pub scenario_id: String,
    /// Category the player wants help with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ControlCategory>,
    /// Controls currently selected.
    #[serde(default)]
    pub selected_control_ids: Vec<String>,
    /// Hints already used this scenario.
    #[serde(default)]
    pub hints_used: u32,
}

impl HintContext {
    /// Creates a context for a scenario with no category and no prior hints.
    #[must_use]
    pub fn new(scenario_id: impl Into<String>) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            ..Self::default()
        }
    }

    /// Sets the requested category.
    #[must_use]
    pub const fn with_category(mut self, category: ControlCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the number of hints already used.
    #[must_use]
    pub const fn with_hints_used(mut self, hints_used: u32) -> Self {
        self.hints_used = hints_used;
        self
    }
}

/// A hint as produced by a single provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    /// Hint text.
    pub text: String,
    /// Documentation link.
    pub learn_more_url: Option<String>,
    /// Category the hint addresses, if any.
    pub category: Option<ControlCategory>,
}

/// A hint as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResult {
    /// Hint text.
    pub hint: String,
    /// Which provider answered.
    pub source: HintSource,
    /// Documentation link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learn_more_url: Option<String>,
    /// Category the hint addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ControlCategory>,
}

impl HintResult {
    fn from_hint(hint: Hint, source: HintSource) -> Self {
        Self {
            hint: hint.text,
            source,
            learn_more_url: hint.learn_more_url,
            category: hint.category,
        }
    }
}

/// A source of hints.
pub trait HintProvider: Send + Sync {
    /// Short provider name, e.g. `remote`.
    fn name(&self) -> &'static str;

    /// Produces a hint for the context.
    fn get_hint<'a>(&'a self, context: &'a HintContext) -> BoxFuture<'a, Result<Hint>>;
}
