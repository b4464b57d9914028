//! Errors raised while wiring a state tree.

use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("State '{0}' is declared more than once")]
    DuplicateState(String),

    #[error("Parent state '{0}' not declared. Declare parents before their children")]
    UnknownParent(String),

    #[error("State '{0}' not declared")]
    UnknownState(String),

    #[error("State '{child}' is not a child of '{parent}'")]
    NotAChild { parent: String, child: String },
}
