//! Error types for the escape room engine.
//!
//! This module defines the error hierarchy for every engine operation:
//! configuration loading, content integrity, grading, hint lookup and
//! session persistence.

use std::path::PathBuf;

/// A specialized `Result` type for escape room engine operations.
pub type Result<T> = std::result::Result<T, EscapeRoomError>;

/// Message shown to players when no hint provider could answer.
pub const HINT_UNAVAILABLE_MESSAGE: &str = "Could not get a hint right now. Please try again.";

/// Errors that can occur while running the escape room.
///
/// Variants are grouped by the part of the game that raises them. Config
/// errors carry a suggestion for the player or operator.
#[derive(Debug, thiserror::Error)]
pub enum EscapeRoomError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your escape-room.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Content Errors
    // ========================================================================
    /// The control or scenario catalog violates a rubric invariant.
    #[error("Content integrity violation in '{scenario_id}': {message}\n\nSuggestion: Fix the rubric so its control sets are disjoint and reference known controls")]
    ContentIntegrity {
        /// Scenario whose rubric is broken.
        scenario_id: String,
        /// What is wrong with it.
        message: String,
    },

    // ========================================================================
    // Grading Errors
    // ========================================================================
    /// No rubric exists for the requested scenario.
    #[error("Rubric not found for scenario: {scenario_id}")]
    RubricNotFound {
        /// The unknown scenario id.
        scenario_id: String,
    },

    // ========================================================================
    // Hint Errors
    // ========================================================================
    /// A hint request arrived without a scenario id.
    #[error("scenarioId is required")]
    MissingScenarioId,

    /// The session already used every hint it is allowed.
    #[error("Maximum hints reached for this game ({used}/{max})")]
    HintQuotaExceeded {
        /// Hints used so far.
        used: u32,
        /// Hints allowed per session.
        max: u32,
    },

    /// A single hint provider failed.
    #[error("Hint provider '{provider}' failed ({kind}): {message}")]
    HintProviderError {
        /// Name of the provider that failed.
        provider: String,
        /// Failure classification.
        kind: ProviderErrorKind,
        /// Detail from the provider.
        message: String,
    },

    /// Every configured hint provider failed.
    #[error("No hint provider could answer: {message}\n\nSuggestion: Check the hint endpoint or switch hints.provider to 'local'")]
    HintUnavailable {
        /// Last provider failure.
        message: String,
    },

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// The key-value store rejected a read or write.
    #[error("Storage error for key '{key}': {message}\n\nSuggestion: Check that the state directory is writable")]
    StorageError {
        /// The storage key involved.
        key: String,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Categories of hint provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The provider did not answer within the configured timeout.
    Timeout,
    /// The provider could not be reached.
    Network,
    /// The provider answered with a non-success status.
    Status,
    /// The provider's answer could not be decoded.
    Decode,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network"),
            Self::Status => write!(f, "status"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

impl EscapeRoomError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ContentIntegrity` error.
    #[must_use]
    pub fn content_integrity(scenario_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContentIntegrity {
            scenario_id: scenario_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `RubricNotFound` error.
    #[must_use]
    pub fn rubric_not_found(scenario_id: impl Into<String>) -> Self {
        Self::RubricNotFound {
            scenario_id: scenario_id.into(),
        }
    }

    /// Creates a new `HintProviderError`.
    #[must_use]
    pub fn hint_provider(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::HintProviderError {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    /// Creates a new `HintUnavailable` error.
    #[must_use]
    pub fn hint_unavailable(message: impl Into<String>) -> Self {
        Self::HintUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `StorageError`.
    #[must_use]
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageError {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error is transient and may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::HintProviderError {
                kind: ProviderErrorKind::Timeout
                    | ProviderErrorKind::Network
                    | ProviderErrorKind::Status,
                ..
            } | Self::HintUnavailable { .. }
                | Self::StorageError { .. }
        )
    }

    /// Returns `true` if this error is fatal to the operation and must not be retried.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::ContentIntegrity { .. }
                | Self::RubricNotFound { .. }
        )
    }

    /// Returns the text a player should see for this error.
    ///
    /// Provider internals are never exposed; request validation errors are
    /// shown as-is.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingScenarioId => "scenarioId is required".to_string(),
            Self::HintQuotaExceeded { .. } => "Maximum hints reached for this game".to_string(),
            Self::HintProviderError { .. } | Self::HintUnavailable { .. } => {
                HINT_UNAVAILABLE_MESSAGE.to_string()
            }
            Self::RubricNotFound { .. } => self.to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rubric_not_found_message() {
        let err = EscapeRoomError::rubric_not_found("scenario-x");
        assert_eq!(err.to_string(), "Rubric not found for scenario: scenario-x");
    }

    #[test]
    fn test_config_validation_has_suggestion() {
        let err = EscapeRoomError::config_validation("hints.timeoutMs must be greater than 0", "Set it");
        let msg = err.to_string();
        assert!(msg.contains("timeoutMs"));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_provider_error_kind_display() {
        assert_eq!(ProviderErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(ProviderErrorKind::Decode.to_string(), "decode");
    }

    #[test]
    fn test_is_transient() {
        let timeout = EscapeRoomError::hint_provider("remote", ProviderErrorKind::Timeout, "5s");
        assert!(timeout.is_transient());

        let decode = EscapeRoomError::hint_provider("remote", ProviderErrorKind::Decode, "bad");
        assert!(!decode.is_transient());

        assert!(!EscapeRoomError::rubric_not_found("x").is_transient());
    }

    #[test]
    fn test_is_fatal() {
        assert!(EscapeRoomError::rubric_not_found("x").is_fatal());
        assert!(EscapeRoomError::content_integrity("s", "overlap").is_fatal());
        assert!(!EscapeRoomError::MissingScenarioId.is_fatal());
        assert!(!EscapeRoomError::hint_unavailable("down").is_fatal());
    }

    #[test]
    fn test_user_message_hides_provider_details() {
        let err = EscapeRoomError::hint_provider(
            "remote",
            ProviderErrorKind::Network,
            "connection refused at 10.0.0.1",
        );
        assert_eq!(err.user_message(), HINT_UNAVAILABLE_MESSAGE);
        assert_eq!(
            EscapeRoomError::HintQuotaExceeded { used: 3, max: 3 }.user_message(),
            "Maximum hints reached for this game"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: EscapeRoomError = io_err.into();
        assert!(matches!(err, EscapeRoomError::Io(_)));
    }
}
