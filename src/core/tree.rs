//! Arena-backed hierarchical state tree.
//!
//! Nodes live in a `Vec` and refer to each other by index; a key map
//! translates user keys at the API boundary. The topology (parents,
//! children) is fixed once the builder finishes. Only the active-path
//! marking (`active`, `active_child`) changes afterwards, and only through
//! [`StateTree::change_state`] and the enter/exit cascade.

use super::activity::{ActivityMode, ActivitySlot};
use super::state::State;
use super::StateKey;
use crate::error::MachineError;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Location of an activity: owning node index and position in its list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ActivityRef {
    pub(crate) state: usize,
    pub(crate) slot: usize,
}

pub(crate) struct StateNode<K> {
    key: K,
    parent: Option<usize>,
    children: Vec<usize>,
    default_child: Option<usize>,
    active_child: Option<usize>,
    active: bool,
    state: Box<dyn State<K>>,
    activities: Vec<ActivitySlot>,
}

/// The state tree owned by a [`StateMachine`](crate::StateMachine).
///
/// Read accessors are public; mutation goes through the machine.
pub struct StateTree<K> {
    nodes: Vec<StateNode<K>>,
    index: HashMap<K, usize>,
}

impl<K: StateKey> StateTree<K> {
    pub(crate) fn new(root: K, state: Box<dyn State<K>>) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        tree.push(root, None, state);
        tree
    }

    pub(crate) fn push(&mut self, key: K, parent: Option<usize>, state: Box<dyn State<K>>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(StateNode {
            key,
            parent,
            children: Vec::new(),
            default_child: None,
            active_child: None,
            active: false,
            state,
            activities: Vec::new(),
        });
        self.index.insert(key, idx);
        if let Some(parent) = parent {
            self.nodes[parent].children.push(idx);
        }
        idx
    }

    pub(crate) fn set_default_child(&mut self, parent: usize, child: usize) {
        self.nodes[parent].default_child = Some(child);
    }

    pub(crate) fn add_activity(&mut self, idx: usize, slot: ActivitySlot) {
        self.nodes[idx].activities.push(slot);
    }

    pub(crate) fn lookup(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub(crate) fn idx(&self, key: &K) -> Result<usize, MachineError> {
        self.lookup(key).ok_or_else(|| MachineError::unknown_state(key))
    }

    pub(crate) fn key(&self, idx: usize) -> K {
        self.nodes[idx].key
    }

    pub(crate) fn parent_of(&self, idx: usize) -> Option<usize> {
        self.nodes[idx].parent
    }

    /// Key of the root state.
    pub fn root(&self) -> K {
        self.nodes[0].key
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Parent of `key`, `None` for the root.
    pub fn parent(&self, key: K) -> Result<Option<K>, MachineError> {
        let idx = self.idx(&key)?;
        Ok(self.nodes[idx].parent.map(|p| self.key(p)))
    }

    /// Declared children of `key`, in registration order.
    pub fn children(&self, key: K) -> Result<Vec<K>, MachineError> {
        let idx = self.idx(&key)?;
        Ok(self.nodes[idx].children.iter().map(|&c| self.key(c)).collect())
    }

    pub fn active_child(&self, key: K) -> Result<Option<K>, MachineError> {
        let idx = self.idx(&key)?;
        Ok(self.nodes[idx].active_child.map(|c| self.key(c)))
    }

    /// Whether `key` is on the active path.
    pub fn is_active(&self, key: K) -> Result<bool, MachineError> {
        Ok(self.nodes[self.idx(&key)?].active)
    }

    /// Deepest active descendant of `key` (or `key` itself).
    pub fn leaf_of(&self, key: K) -> Result<K, MachineError> {
        let idx = self.idx(&key)?;
        Ok(self.key(self.leaf_idx(idx)))
    }

    /// Deepest state on the active path.
    pub fn leaf(&self) -> K {
        self.key(self.leaf_idx(0))
    }

    /// States from the root down to the active leaf.
    ///
    /// Empty until the machine has started.
    pub fn active_path(&self) -> Vec<K> {
        if !self.nodes[0].active {
            return Vec::new();
        }
        let mut path = vec![self.nodes[0].key];
        let mut cursor = self.nodes[0].active_child;
        while let Some(idx) = cursor {
            path.push(self.nodes[idx].key);
            cursor = self.nodes[idx].active_child;
        }
        path
    }

    /// Lazy walk from `key` to the root via parent links.
    pub fn path_to_root(&self, key: K) -> Result<PathToRoot<'_, K>, MachineError> {
        let idx = self.idx(&key)?;
        Ok(PathToRoot {
            tree: self,
            cursor: Some(idx),
        })
    }

    /// Least common ancestor of `a` and `b`; `lca(a, a) == a`.
    pub fn lca(&self, a: K, b: K) -> Result<Option<K>, MachineError> {
        let (a, b) = (self.idx(&a)?, self.idx(&b)?);
        Ok(self.lca_idx(a, b).map(|idx| self.key(idx)))
    }

    /// Modes of the activities attached to `key`, in attachment order.
    pub fn activity_modes(&self, key: K) -> Result<Vec<ActivityMode>, MachineError> {
        let idx = self.idx(&key)?;
        Ok(self.nodes[idx].activities.iter().map(ActivitySlot::mode).collect())
    }

    pub(crate) fn leaf_idx(&self, mut idx: usize) -> usize {
        while let Some(child) = self.nodes[idx].active_child {
            idx = child;
        }
        idx
    }

    pub(crate) fn lca_idx(&self, a: usize, b: usize) -> Option<usize> {
        let mut ancestors = HashSet::new();
        let mut cursor = Some(a);
        while let Some(idx) = cursor {
            ancestors.insert(idx);
            cursor = self.nodes[idx].parent;
        }

        let mut cursor = Some(b);
        while let Some(idx) = cursor {
            if ancestors.contains(&idx) {
                return Some(idx);
            }
            cursor = self.nodes[idx].parent;
        }
        None
    }

    /// Active states strictly below `lca`, deepest first (exit order).
    pub(crate) fn exit_chain(&self, lca: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes[lca].active_child;
        while let Some(idx) = cursor {
            chain.push(idx);
            cursor = self.nodes[idx].active_child;
        }
        chain.reverse();
        chain
    }

    /// States from just below `lca` down to `to`, parent first (enter order).
    pub(crate) fn enter_chain(&self, to: usize, lca: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut cursor = Some(to);
        while let Some(idx) = cursor {
            if idx == lca {
                break;
            }
            chain.push(idx);
            cursor = self.nodes[idx].parent;
        }
        chain.reverse();
        chain
    }

    /// Active descendants of `idx`, parent first.
    pub(crate) fn active_descendants(&self, idx: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes[idx].active_child;
        while let Some(child) = cursor {
            chain.push(child);
            cursor = self.nodes[child].active_child;
        }
        chain
    }

    pub(crate) fn activity_count(&self, idx: usize) -> usize {
        self.nodes[idx].activities.len()
    }

    pub(crate) fn slot(&self, at: ActivityRef) -> &ActivitySlot {
        &self.nodes[at.state].activities[at.slot]
    }

    pub(crate) fn slot_mut(&mut self, at: ActivityRef) -> &mut ActivitySlot {
        &mut self.nodes[at.state].activities[at.slot]
    }

    fn initial_child(&self, idx: usize) -> Result<Option<usize>, MachineError> {
        let node = &self.nodes[idx];
        let Some(key) = node.state.initial_state() else {
            return Ok(node.default_child);
        };
        let child = self.idx(&key)?;
        if self.nodes[child].parent != Some(idx) {
            return Err(MachineError::NotAChild {
                parent: format!("{:?}", node.key),
                child: format!("{key:?}"),
            });
        }
        Ok(Some(child))
    }

    /// Mark `idx` active under its parent and run `on_enter`. With
    /// `cascade`, keep entering initial children until a leaf is reached.
    pub(crate) fn enter(&mut self, idx: usize, cascade: bool) -> Result<(), MachineError> {
        if let Some(parent) = self.nodes[idx].parent {
            self.nodes[parent].active_child = Some(idx);
        }

        let node = &mut self.nodes[idx];
        node.active = true;
        node.state.on_enter();
        debug!(state = ?node.key, "Entered state");

        if cascade {
            if let Some(child) = self.initial_child(idx)? {
                self.enter(child, true)?;
            }
        }
        Ok(())
    }

    /// Exit the active child first, then clear the link and run `on_exit`.
    /// Exiting an inactive state does nothing.
    pub(crate) fn exit(&mut self, idx: usize) {
        if !self.nodes[idx].active {
            return;
        }
        if let Some(child) = self.nodes[idx].active_child {
            self.exit(child);
        }

        let node = &mut self.nodes[idx];
        node.active_child = None;
        node.active = false;
        node.state.on_exit();
        debug!(state = ?node.key, "Exited state");
    }

    /// Move the active path from `from` to `to` through their LCA.
    ///
    /// Everything active below the LCA is exited leaf first, then the
    /// chain from the LCA down to `to` is entered parent first. Only `to`
    /// cascades into its initial child. When `to` is the LCA itself it
    /// becomes the leaf.
    pub(crate) fn change_state(&mut self, from: usize, to: usize) -> Result<(), MachineError> {
        if from == to {
            return Ok(());
        }
        let Some(lca) = self.lca_idx(from, to) else {
            debug!(from = ?self.key(from), to = ?self.key(to), "No common ancestor, ignoring");
            return Ok(());
        };

        if let Some(child) = self.nodes[lca].active_child {
            self.exit(child);
        }
        self.nodes[lca].active_child = None;

        for idx in self.enter_chain(to, lca) {
            self.enter(idx, idx == to)?;
        }
        Ok(())
    }

    /// Run one tick through the active path.
    ///
    /// A state whose `transition` hook fires returns the request without
    /// updating itself or its descendants; its ancestors still run
    /// `on_update`, children before parents.
    pub(crate) fn update(&mut self, delta_time: f32) -> Result<Option<(usize, usize)>, MachineError> {
        if !self.nodes[0].active {
            return Ok(None);
        }
        self.update_node(0, delta_time)
    }

    fn update_node(&mut self, idx: usize, delta_time: f32) -> Result<Option<(usize, usize)>, MachineError> {
        if let Some(target) = self.nodes[idx].state.transition() {
            let to = self.idx(&target)?;
            return Ok(Some((idx, to)));
        }

        let request = match self.nodes[idx].active_child {
            Some(child) => self.update_node(child, delta_time)?,
            None => None,
        };
        self.nodes[idx].state.on_update(delta_time);
        Ok(request)
    }
}

/// Iterator from a state up to the root. Cloning restarts the walk from
/// the clone's position.
#[derive(Clone)]
pub struct PathToRoot<'a, K> {
    tree: &'a StateTree<K>,
    cursor: Option<usize>,
}

impl<K: StateKey> Iterator for PathToRoot<'_, K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let idx = self.cursor?;
        self.cursor = self.tree.nodes[idx].parent;
        Some(self.tree.nodes[idx].key)
    }
}
