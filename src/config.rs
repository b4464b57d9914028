//! Machine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a phase runs its activity operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMode {
    /// Launch every operation at once.
    #[default]
    Parallel,

    /// Launch operations one at a time, in chain order.
    Sequential,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid machine configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Tunables for a [`StateMachine`](crate::StateMachine).
///
/// # Example
///
/// ```rust
/// use statetree::config::{MachineConfig, PhaseMode};
///
/// let config = MachineConfig::from_json(r#"{ "phase_mode": "sequential" }"#).unwrap();
/// assert_eq!(config.phase_mode, PhaseMode::Sequential);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub phase_mode: PhaseMode,
}

impl MachineConfig {
    pub fn sequential() -> Self {
        Self {
            phase_mode: PhaseMode::Sequential,
        }
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
