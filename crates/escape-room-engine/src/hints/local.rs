//! Curated offline hints.

use futures::future::{self, BoxFuture, FutureExt};

use super::{Hint, HintContext, HintProvider, DEFAULT_LEARN_MORE_URL};
use crate::content::ControlCategory;
use crate::error::Result;

const DEFAULT_HINT: &str =
    "Think about which governance controls would address the specific risks described in this scenario.";

/// Hints for one scenario: a general nudge plus category-specific ones.
struct ScenarioHints {
    scenario_id: &'static str,
    general: &'static str,
    by_category: &'static [(ControlCategory, &'static str)],
}

const FALLBACK_HINTS: ScenarioHints = ScenarioHints {
    scenario_id: "fallback",
    general: "Start from the risk statement: which control would have stopped the harm at its source?",
    by_category: &[
        (ControlCategory::DataAccess, "Ask who could reach the data before anything went wrong, not who logged in."),
        (ControlCategory::InformationProtection, "Classification travels with a file; permissions stay behind with the site."),
        (ControlCategory::DlpCompliance, "Follow the data: where did it leave the boundary it belonged in?"),
        (ControlCategory::IdentityAccess, "Was anyone actually unauthenticated, or were legitimate users doing the wrong thing?"),
        (ControlCategory::AgentSafety, "Consider what the agent was allowed to do versus what it should have done."),
        (ControlCategory::MonitoringLifecycle, "How long did the problem go unnoticed, and who should have approved the change?"),
    ],
};

const SCENARIO_HINTS: &[ScenarioHints] = &[
    ScenarioHints {
        scenario_id: "scenario-1-leaky-sharepoint",
        general: "Copilot only surfaced what Sarah could already open. Focus on why she could open it.",
        by_category: &[
            (ControlCategory::DataAccess, "Look at how the HR library got its permissions and how far Copilot's search reaches."),
            (ControlCategory::MonitoringLifecycle, "Months passed before anyone noticed. What would have surfaced the exposure sooner?"),
        ],
    },
    ScenarioHints {
        scenario_id: "scenario-2-label-lockdown",
        general: "A watermark typed by hand is not the same as a classification the platform enforces.",
        by_category: &[
            (ControlCategory::InformationProtection, "Think about labels, what they can enforce, and how new documents get one without anyone remembering."),
            (ControlCategory::DlpCompliance, "The draft left the company by email. What could have stopped labeled content at that boundary?"),
        ],
    },
    ScenarioHints {
        scenario_id: "scenario-3-dlp-tripwires",
        general: "Nobody was hacked. Authorized automation moved regulated data somewhere it never should have gone.",
        by_category: &[
            (ControlCategory::DlpCompliance, "Consider how connectors are grouped and whether data may cross between groups, and which regions data may live in."),
            (ControlCategory::MonitoringLifecycle, "The intern's flow ran hourly for six weeks. Who should have reviewed it before it went live?"),
        ],
    },
    ScenarioHints {
        scenario_id: "scenario-4-prompt-injection",
        general: "The attack arrived as ordinary chat input. What should the agent do with text that looks like instructions?",
        by_category: &[
            (ControlCategory::AgentSafety, "Look at the system instructions, the reach of the cancel action, and what checks ran on incoming text."),
            (ControlCategory::MonitoringLifecycle, "Forty-seven cancellations went through unchallenged. Where could a confirmation step or an alert have fit?"),
        ],
    },
    ScenarioHints {
        scenario_id: "scenario-5-shadow-connector",
        general: "The connector was never approved and the contractors were never vetted. Start with those two gaps.",
        by_category: &[
            (ControlCategory::AgentSafety, "Which connectors should makers be able to pick from in the first place?"),
            (ControlCategory::IdentityAccess, "External contractors reached internal content. What governs guests?"),
            (ControlCategory::MonitoringLifecycle, "A new external integration went live within an hour. What process should sit in between?"),
        ],
    },
];

/// Serves hints from a built-in table. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHintProvider;

impl LocalHintProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Picks a hint synchronously.
    ///
    /// The first hint, or any request without a category, gets the general
    /// hint. Later requests prefer the category hint; without one they
    /// rotate through the scenario's hints by `hints_used`.
    #[must_use]
    pub fn pick(&self, context: &HintContext) -> Hint {
        let table = SCENARIO_HINTS
            .iter()
            .find(|h| h.scenario_id == context.scenario_id)
            .unwrap_or(&FALLBACK_HINTS);

        let general = || Hint {
            text: table.general.to_string(),
            learn_more_url: Some(DEFAULT_LEARN_MORE_URL.to_string()),
            category: None,
        };

        let Some(category) = context.category.filter(|_| context.hints_used > 0) else {
            return general();
        };

        if let Some((_, text)) = table.by_category.iter().find(|(c, _)| *c == category) {
            return Hint {
                text: (*text).to_string(),
                learn_more_url: Some(DEFAULT_LEARN_MORE_URL.to_string()),
                category: Some(category),
            };
        }

        let pool: Vec<&str> = std::iter::once(table.general)
            .chain(table.by_category.iter().map(|(_, text)| *text))
            .collect();
        let idx = usize::try_from(context.hints_used).unwrap_or(0) % pool.len();
        Hint {
            text: pool.get(idx).copied().unwrap_or(DEFAULT_HINT).to_string(),
            learn_more_url: Some(DEFAULT_LEARN_MORE_URL.to_string()),
            category: None,
        }
    }
}

impl HintProvider for LocalHintProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn get_hint<'a>(&'a self, context: &'a HintContext) -> BoxFuture<'a, Result<Hint>> {
        future::ready(Ok(self.pick(context))).boxed()
    }
}
