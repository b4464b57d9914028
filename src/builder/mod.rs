//! Builder API for wiring state trees.
//!
//! States are registered with explicit parent edges instead of being
//! discovered from struct fields, so the tree's shape is visible where it
//! is declared.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
