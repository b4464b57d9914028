//! The state machine: a state tree plus its transition sequencer.

use crate::config::{MachineConfig, PhaseMode};
use crate::core::{StateKey, StateTree, TransitionHistory};
use crate::error::MachineError;
use crate::sequencer::TransitionSequencer;
use std::iter;
use tracing::{info, warn};

/// Hierarchical state machine driven by the host's frame loop.
///
/// Build one with [`StateMachineBuilder`](crate::builder::StateMachineBuilder)
/// and call [`tick`](Self::tick) once per frame.
pub struct StateMachine<K: StateKey> {
    tree: StateTree<K>,
    sequencer: TransitionSequencer<K>,
    started: bool,
}

impl<K: StateKey> StateMachine<K> {
    pub(crate) fn new(tree: StateTree<K>, config: MachineConfig) -> Self {
        Self {
            tree,
            sequencer: TransitionSequencer::new(config.phase_mode),
            started: false,
        }
    }

    /// Enter the root and cascade into its default leaf, then activate the
    /// activities along that path. Only the first successful call has any
    /// effect; a failed cascade is unwound and retried on the next call.
    pub fn start(&mut self) -> Result<(), MachineError> {
        if self.started {
            return Ok(());
        }

        if let Err(error) = self.tree.enter(0, true) {
            self.tree.exit(0);
            warn!(error = %error, "State machine failed to start");
            return Err(error);
        }
        self.started = true;
        info!(root = ?self.tree.root(), leaf = ?self.tree.leaf(), "State machine started");

        let path: Vec<usize> = iter::once(0)
            .chain(self.tree.active_descendants(0))
            .collect();
        self.sequencer.begin_activation(&mut self.tree, &path)
    }

    /// Advance one frame. Starts the machine on first use.
    ///
    /// Errors from activity work surface here; the affected transition
    /// stalls until [`abort_transition`](Self::abort_transition) is called.
    pub fn tick(&mut self, delta_time: f32) -> Result<(), MachineError> {
        if !self.started {
            self.start()?;
        }
        self.sequencer.tick(&mut self.tree, delta_time)
    }

    /// Switch the active path immediately, without running activity
    /// phases. Requests with `from == to` are ignored.
    pub fn change_state(&mut self, from: K, to: K) -> Result<(), MachineError> {
        let (from, to) = (self.tree.idx(&from)?, self.tree.idx(&to)?);
        self.tree.change_state(from, to)
    }

    /// Queue a phased transition, as a state's `transition` hook would.
    pub fn request_transition(&mut self, from: K, to: K) -> Result<(), MachineError> {
        let (from, to) = (self.tree.idx(&from)?, self.tree.idx(&to)?);
        self.sequencer.request_transition(&mut self.tree, from, to)
    }

    /// Cancel the running transition and drop any pending one.
    pub fn abort_transition(&mut self) {
        self.sequencer.abort();
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether a phase sequence is running (tree ticking is suspended).
    pub fn is_transitioning(&self) -> bool {
        self.sequencer.is_busy()
    }

    /// `(from, to)` of the transition currently running its phases.
    pub fn current_transition(&self) -> Option<(K, K)> {
        self.sequencer
            .in_flight()
            .map(|(from, to)| (self.tree.key(from), self.tree.key(to)))
    }

    /// `(from, to)` waiting for the current transition to finish.
    pub fn pending_transition(&self) -> Option<(K, K)> {
        self.sequencer
            .pending()
            .map(|(from, to)| (self.tree.key(from), self.tree.key(to)))
    }

    pub fn tree(&self) -> &StateTree<K> {
        &self.tree
    }

    pub fn sequencer(&self) -> &TransitionSequencer<K> {
        &self.sequencer
    }

    pub fn history(&self) -> &TransitionHistory<K> {
        self.sequencer.history()
    }

    pub fn phase_mode(&self) -> PhaseMode {
        self.sequencer.phase_mode()
    }

    pub fn root(&self) -> K {
        self.tree.root()
    }

    /// Deepest state on the active path.
    pub fn leaf(&self) -> K {
        self.tree.leaf()
    }

    pub fn active_path(&self) -> Vec<K> {
        self.tree.active_path()
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::StateMachineBuilder;
    use crate::core::{ActivityMode, InstantActivity, State};
    use crate::error::MachineError;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Key {
        Root,
        A,
        B,
    }

    struct Counter(std::rc::Rc<std::cell::Cell<u32>>);

    impl State<Key> for Counter {
        fn on_enter(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn start_is_idempotent() {
        let entries = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut machine = StateMachineBuilder::new(Key::Root, Counter(entries.clone()))
            .state(Key::A, Key::Root, ())
            .unwrap()
            .initial(Key::Root, Key::A)
            .unwrap()
            .build();

        machine.start().unwrap();
        machine.start().unwrap();
        machine.tick(0.1).unwrap();

        assert_eq!(entries.get(), 1);
        assert_eq!(machine.active_path(), vec![Key::Root, Key::A]);
    }

    struct MissingInitial;

    impl State<Key> for MissingInitial {
        fn initial_state(&self) -> Option<Key> {
            Some(Key::B)
        }
    }

    #[test]
    fn failed_start_is_unwound_and_retried() {
        let mut machine = StateMachineBuilder::new(Key::Root, MissingInitial)
            .state(Key::A, Key::Root, ())
            .unwrap()
            .build();

        for _ in 0..2 {
            let err = machine.tick(0.1).unwrap_err();
            assert!(matches!(err, MachineError::UnknownState(_)));
            assert!(!machine.is_started());
            assert!(machine.active_path().is_empty());
        }
    }

    #[test]
    fn tick_starts_the_machine() {
        let mut machine = StateMachineBuilder::new(Key::Root, ())
            .state(Key::A, Key::Root, ())
            .unwrap()
            .activity(Key::A, InstantActivity::new("fade"))
            .unwrap()
            .initial(Key::Root, Key::A)
            .unwrap()
            .build();

        assert!(!machine.is_started());
        machine.tick(0.0).unwrap();
        assert!(machine.is_started());
        assert_eq!(machine.leaf(), Key::A);
        assert_eq!(machine.tree().activity_modes(Key::A).unwrap(), vec![ActivityMode::Active]);
    }

    #[test]
    fn change_state_switches_immediately() {
        let mut machine = StateMachineBuilder::new(Key::Root, ())
            .state(Key::A, Key::Root, ())
            .unwrap()
            .state(Key::B, Key::Root, ())
            .unwrap()
            .initial(Key::Root, Key::A)
            .unwrap()
            .build();
        machine.start().unwrap();

        machine.change_state(Key::A, Key::B).unwrap();
        assert_eq!(machine.active_path(), vec![Key::Root, Key::B]);
        assert!(!machine.is_transitioning());
    }

    #[test]
    fn request_to_self_is_ignored() {
        let mut machine = StateMachineBuilder::new(Key::Root, ())
            .state(Key::A, Key::Root, ())
            .unwrap()
            .build();
        machine.start().unwrap();

        machine.request_transition(Key::A, Key::A).unwrap();
        assert!(!machine.is_transitioning());
        assert!(machine.current_transition().is_none());
    }
}
