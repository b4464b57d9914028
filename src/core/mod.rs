//! Core state tree types.
//!
//! This module contains the pieces the sequencer is built from:
//! - State hooks via the `State` trait
//! - Activities and their lifecycle modes
//! - Cooperative cancellation
//! - The arena-backed state tree with least-common-ancestor logic
//! - History of completed transitions

mod activity;
mod cancel;
mod history;
mod state;
mod tree;

pub use activity::{
    Activity, ActivityError, ActivityFuture, ActivityMode, InstantActivity, Lifecycle,
    LifecycleOutcome,
};
pub use cancel::CancellationToken;
pub use history::{TransitionHistory, TransitionRecord};
pub use state::State;
pub use tree::{PathToRoot, StateTree};

pub(crate) use activity::ActivitySlot;
pub(crate) use tree::ActivityRef;

use std::fmt::Debug;
use std::hash::Hash;

/// Bound satisfied by types usable as state identifiers.
///
/// Implemented automatically; fieldless enums deriving
/// `Clone, Copy, PartialEq, Eq, Hash, Debug` qualify.
pub trait StateKey: Copy + Eq + Hash + Debug + 'static {}

impl<T: Copy + Eq + Hash + Debug + 'static> StateKey for T {}
