//! Primary/fallback hint selection with quota enforcement.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::{HintContext, HintProvider, HintResult, HintSource, LocalHintProvider, RemoteHintProvider};
use crate::config::{HintConfig, HintProviderKind};
use crate::content::ContentStore;
use crate::error::{EscapeRoomError, Result};

/// Public hint settings, as reported by `GET /api/hints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintInfo {
    /// Hints allowed per session.
    pub max_hints_per_session: u32,
    /// Configured primary provider.
    pub provider: HintProviderKind,
}

/// Routes hint requests to a primary provider with an optional fallback.
pub struct HintArbiter {
    primary: Box<dyn HintProvider>,
    fallback: Option<Box<dyn HintProvider>>,
    max_hints: u32,
    kind: HintProviderKind,
}

impl HintArbiter {
    /// Creates an arbiter from explicit providers.
    #[must_use]
    pub fn new(
        primary: Box<dyn HintProvider>,
        fallback: Option<Box<dyn HintProvider>>,
        max_hints: u32,
        kind: HintProviderKind,
    ) -> Self {
        Self {
            primary,
            fallback,
            max_hints,
            kind,
        }
    }

    /// Builds the arbiter the configuration asks for.
    ///
    /// `remote` gets the local table as fallback. `local` has no fallback
    /// since it cannot fail.
    pub fn from_config(config: &HintConfig, content: Arc<ContentStore>) -> Result<Self> {
        let arbiter = match config.provider {
            HintProviderKind::Remote => Self::new(
                Box::new(RemoteHintProvider::new(config, content)?),
                Some(Box::new(LocalHintProvider::new())),
                config.max_hints_per_session,
                config.provider,
            ),
            HintProviderKind::Local => Self::new(
                Box::new(LocalHintProvider::new()),
                None,
                config.max_hints_per_session,
                config.provider,
            ),
        };
        Ok(arbiter)
    }

    /// Hints allowed per session.
    #[must_use]
    pub const fn max_hints(&self) -> u32 {
        self.max_hints
    }

    /// Returns the public hint settings.
    #[must_use]
    pub const fn info(&self) -> HintInfo {
        HintInfo {
            max_hints_per_session: self.max_hints,
            provider: self.kind,
        }
    }

    /// Gets one hint.
    ///
    /// Missing scenario ids and exhausted quotas are rejected before any
    /// provider is called. A primary failure is logged and the fallback is
    /// tried; if that fails too the request fails with `HintUnavailable`.
    pub async fn get_hint(&self, context: &HintContext) -> Result<HintResult> {
        if context.scenario_id.trim().is_empty() {
            return Err(EscapeRoomError::MissingScenarioId);
        }
        if context.hints_used >= self.max_hints {
            return Err(EscapeRoomError::HintQuotaExceeded {
                used: context.hints_used,
                max: self.max_hints,
            });
        }

        let primary_err = match self.primary.get_hint(context).await {
            Ok(hint) => {
                debug!(provider = self.primary.name(), "Hint served by primary provider");
                return Ok(HintResult::from_hint(hint, HintSource::Primary));
            }
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            error!(
                provider = self.primary.name(),
                error = %primary_err,
                transient = primary_err.is_transient(),
                "Hint provider failed"
            );
            return Err(EscapeRoomError::hint_unavailable(primary_err.to_string()));
        };

        warn!(
            provider = self.primary.name(),
            fallback = fallback.name(),
            error = %primary_err,
            transient = primary_err.is_transient(),
            "Primary hint provider failed, using fallback"
        );

        match fallback.get_hint(context).await {
            Ok(hint) => Ok(HintResult::from_hint(hint, HintSource::Fallback)),
            Err(e) => {
                error!(
                    provider = fallback.name(),
                    error = %e,
                    transient = e.is_transient(),
                    "Fallback hint provider failed"
                );
                Err(EscapeRoomError::hint_unavailable(e.to_string()))
            }
        }
    }
}
