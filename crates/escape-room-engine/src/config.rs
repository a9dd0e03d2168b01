//! Configuration types for the escape room.
//!
//! This module provides the configuration structures that control session
//! flow, state persistence and hint provider selection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EscapeRoomError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "escape-room.json";

/// Default remote hint endpoint (Microsoft Learn MCP).
pub const DEFAULT_HINT_ENDPOINT: &str = "https://learn.microsoft.com/api/mcp";

/// Default directory for persisted session state.
fn default_state_dir() -> String {
    ".escape-room".to_string()
}

/// Default hint quota per session.
const fn default_max_hints() -> u32 {
    3
}

/// Default remote hint timeout in milliseconds.
const fn default_timeout_ms() -> u64 {
    5000
}

fn default_endpoint() -> String {
    DEFAULT_HINT_ENDPOINT.to_string()
}

/// Main configuration for the escape room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Whether a session plays one scenario or the whole shuffled set.
    #[serde(default)]
    pub session_mode: SessionMode,

    /// Directory holding the persisted session snapshot.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Fixed seed for scenario shuffling. `None` draws from OS entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// Hint lookup configuration.
    #[serde(default)]
    pub hints: HintConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_mode: SessionMode::default(),
            state_dir: default_state_dir(),
            rng_seed: None,
            hints: HintConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `escape-room.json` in the current directory. If not found,
    /// returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            EscapeRoomError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `escape-room.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `EscapeRoomError::ConfigParseError` if the file exists but
    /// contains invalid JSON or invalid enum values.
    ///
    /// Returns `EscapeRoomError::ConfigValidationError` if the configuration
    /// values are invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(EscapeRoomError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| EscapeRoomError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `HINT_PROVIDER`, `MCP_ENDPOINT` and `MCP_API_KEY` overrides
    /// from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies hint overrides read through `lookup`, then re-validates.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidationError` for an unknown provider name or when
    /// the overridden configuration no longer validates.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = non_empty("HINT_PROVIDER") {
            self.hints.provider = HintProviderKind::from_str_case_insensitive(&provider)
                .ok_or_else(|| {
                    EscapeRoomError::config_validation(
                        format!("HINT_PROVIDER '{provider}' is not a known provider"),
                        "Set HINT_PROVIDER to 'remote' or 'local'",
                    )
                })?;
        }
        if let Some(endpoint) = non_empty("MCP_ENDPOINT") {
            self.hints.endpoint = endpoint;
        }
        if let Some(api_key) = non_empty("MCP_API_KEY") {
            self.hints.api_key = Some(api_key);
        }

        self.validate()
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `EscapeRoomError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.state_dir.trim().is_empty() {
            return Err(EscapeRoomError::config_validation(
                "stateDir must not be empty",
                "Provide a state directory in your escape-room.json (use '.escape-room' for the default)",
            ));
        }

        if self.hints.max_hints_per_session == 0 {
            return Err(EscapeRoomError::config_validation(
                "hints.maxHintsPerSession must be greater than 0",
                "Set hints.maxHintsPerSession to at least 1 in your escape-room.json",
            ));
        }

        if self.hints.timeout_ms == 0 {
            return Err(EscapeRoomError::config_validation(
                "hints.timeoutMs must be greater than 0",
                "Set hints.timeoutMs to at least 1 in your escape-room.json",
            ));
        }

        if self.hints.provider == HintProviderKind::Remote && self.hints.endpoint.trim().is_empty()
        {
            return Err(EscapeRoomError::config_validation(
                "hints.endpoint must not be empty when the remote provider is selected",
                "Set hints.endpoint or switch hints.provider to 'local'",
            ));
        }

        Ok(())
    }
}

/// How many scenarios a session plays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// Every scenario, in shuffled order (default).
    #[default]
    Sequence,
    /// One randomly chosen scenario.
    Single,
}

impl SessionMode {
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequence" => Some(Self::Sequence),
            "single" => Some(Self::Single),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for SessionMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid session mode '{s}': expected one of 'sequence', 'single'"
            ))
        })
    }
}

impl Serialize for SessionMode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(match self {
            Self::Sequence => "sequence",
            Self::Single => "single",
        })
    }
}

/// Which hint provider is tried first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HintProviderKind {
    /// Remote documentation search, falling back to the local table (default).
    #[default]
    Remote,
    /// Curated local hints only.
    Local,
}

impl HintProviderKind {
    /// Parses a provider name, case-insensitively.
    ///
    /// `mcp` is accepted as an alias for `remote`.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "mcp" => Some(Self::Remote),
            "local" => Some(Self::Local),
            _ => None,
        }
    }

    /// Returns the provider name used in API responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

impl<'de> Deserialize<'de> for HintProviderKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid hint provider '{s}': expected one of 'remote', 'local'"
            ))
        })
    }
}

impl Serialize for HintProviderKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Hint lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintConfig {
    /// Provider tried first.
    #[serde(default)]
    pub provider: HintProviderKind,

    /// Hints allowed per session.
    #[serde(default = "default_max_hints")]
    pub max_hints_per_session: u32,

    /// Remote search endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Optional bearer token for the remote endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Remote request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Log remote requests and responses at info level.
    #[serde(default)]
    pub enable_logging: bool,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            provider: HintProviderKind::default(),
            max_hints_per_session: default_max_hints(),
            endpoint: default_endpoint(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            enable_logging: false,
        }
    }
}

impl HintConfig {
    /// Returns the remote timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}
