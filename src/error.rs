//! Runtime errors raised while driving a state machine.

use crate::core::ActivityError;
use thiserror::Error;

/// Errors surfaced by [`StateMachine`](crate::StateMachine) operations.
///
/// State keys are rendered with their `Debug` form so the error type does
/// not depend on the key type.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Unknown state '{0}'")]
    UnknownState(String),

    #[error("State '{child}' is not a child of '{parent}'")]
    NotAChild { parent: String, child: String },

    #[error("Activity '{activity}' of state '{state}' failed")]
    ActivityFailed {
        state: String,
        activity: String,
        #[source]
        source: ActivityError,
    },
}

impl MachineError {
    pub(crate) fn unknown_state(key: &impl std::fmt::Debug) -> Self {
        Self::UnknownState(format!("{key:?}"))
    }
}
