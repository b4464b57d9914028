//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::config::{MachineConfig, PhaseMode};
use crate::core::{Activity, ActivitySlot, State, StateKey, StateTree};
use crate::machine::StateMachine;

/// Builder that wires a state tree with explicit parent edges.
///
/// Parents must be declared before their children, which keeps the tree
/// acyclic with a single root by construction.
pub struct StateMachineBuilder<K: StateKey> {
    tree: StateTree<K>,
    config: MachineConfig,
}

impl<K: StateKey> StateMachineBuilder<K> {
    /// Create a builder whose tree is rooted at `root`.
    pub fn new(root: K, state: impl State<K> + 'static) -> Self {
        Self {
            tree: StateTree::new(root, Box::new(state)),
            config: MachineConfig::default(),
        }
    }

    /// Declare `key` as a child of `parent`.
    pub fn state(mut self, key: K, parent: K, state: impl State<K> + 'static) -> Result<Self, BuildError> {
        if self.tree.contains(&key) {
            return Err(BuildError::DuplicateState(format!("{key:?}")));
        }
        let parent = self
            .tree
            .lookup(&parent)
            .ok_or_else(|| BuildError::UnknownParent(format!("{parent:?}")))?;

        self.tree.push(key, Some(parent), Box::new(state));
        Ok(self)
    }

    /// Default child entered when `parent` is entered and its
    /// `initial_state` hook returns `None`.
    pub fn initial(mut self, parent: K, child: K) -> Result<Self, BuildError> {
        let parent_idx = self.lookup(&parent)?;
        let child_idx = self.lookup(&child)?;
        if self.tree.parent_of(child_idx) != Some(parent_idx) {
            return Err(BuildError::NotAChild {
                parent: format!("{parent:?}"),
                child: format!("{child:?}"),
            });
        }

        self.tree.set_default_child(parent_idx, child_idx);
        Ok(self)
    }

    /// Attach an activity to `key`. Activities run in attachment order
    /// within a sequential phase.
    pub fn activity(mut self, key: K, activity: impl Activity + 'static) -> Result<Self, BuildError> {
        let idx = self.lookup(&key)?;
        self.tree.add_activity(idx, ActivitySlot::new(Box::new(activity)));
        Ok(self)
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn phase_mode(mut self, mode: PhaseMode) -> Self {
        self.config.phase_mode = mode;
        self
    }

    /// Finish wiring. The machine starts on its first `tick`.
    pub fn build(self) -> StateMachine<K> {
        StateMachine::new(self.tree, self.config)
    }

    fn lookup(&self, key: &K) -> Result<usize, BuildError> {
        self.tree
            .lookup(key)
            .ok_or_else(|| BuildError::UnknownState(format!("{key:?}")))
    }
}
