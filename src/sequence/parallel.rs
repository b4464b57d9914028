//! Launch every operation at once; done when all have finished.

use super::{PhaseStep, RunningStep, Sequence};
use crate::core::{CancellationToken, StateKey, StateTree};
use crate::error::MachineError;

/// Phase that launches all operations together.
///
/// Completion does not depend on the order in which operations finish.
pub struct ParallelPhase {
    steps: Vec<PhaseStep>,
    token: CancellationToken,
    running: Vec<RunningStep>,
    done: bool,
    faulted: bool,
}

impl ParallelPhase {
    pub(crate) fn new(steps: Vec<PhaseStep>, token: CancellationToken) -> Self {
        Self {
            steps,
            token,
            running: Vec::new(),
            done: false,
            faulted: false,
        }
    }

    fn poll_all<K: StateKey>(&mut self, tree: &mut StateTree<K>) -> Result<(), MachineError> {
        let mut first_error = None;
        for step in self.running.iter_mut().filter(|s| !s.is_finished()) {
            if let Err(error) = step.poll(tree) {
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => {
                self.faulted = true;
                Err(error)
            }
            None => Ok(()),
        }
    }
}

impl<K: StateKey> Sequence<K> for ParallelPhase {
    fn start(&mut self, tree: &mut StateTree<K>) -> Result<(), MachineError> {
        if self.steps.is_empty() {
            self.done = true;
            return Ok(());
        }

        self.running = self
            .steps
            .iter()
            .map(|&step| RunningStep::launch(step, tree, self.token.clone()))
            .collect();
        self.poll_all(tree)
    }

    fn update(&mut self, tree: &mut StateTree<K>) -> Result<bool, MachineError> {
        if self.done {
            return Ok(true);
        }
        if self.faulted {
            return Ok(false);
        }

        self.poll_all(tree)?;
        self.done = self.running.iter().all(RunningStep::is_finished);
        Ok(self.done)
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActivityMode, ActivityRef, Lifecycle};
    use crate::sequence::test_support::{tree_with, Gated};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn activate(slot: usize) -> PhaseStep {
        PhaseStep {
            at: ActivityRef { state: 0, slot },
            lifecycle: Lifecycle::Activate,
        }
    }

    #[test]
    fn empty_phase_completes_on_start() {
        let mut tree = tree_with(Vec::new());
        let mut phase = ParallelPhase::new(Vec::new(), CancellationToken::new());

        Sequence::<u8>::start(&mut phase, &mut tree).unwrap();
        assert!(Sequence::<u8>::is_done(&phase));
        assert!(phase.update(&mut tree).unwrap());
    }

    #[test]
    fn launches_every_step_at_start() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (first, second) = (Rc::new(Cell::new(false)), Rc::new(Cell::new(false)));
        let mut tree = tree_with(vec![
            Box::new(Gated { name: "one", release: Rc::clone(&first), log: Rc::clone(&log) }),
            Box::new(Gated { name: "two", release: Rc::clone(&second), log: Rc::clone(&log) }),
        ]);
        let mut phase = ParallelPhase::new(vec![activate(0), activate(1)], CancellationToken::new());

        phase.start(&mut tree).unwrap();
        assert_eq!(*log.borrow(), vec!["activate one", "activate two"]);
        assert_eq!(tree.activity_modes(0).unwrap(), vec![ActivityMode::Activating; 2]);

        second.set(true);
        assert!(!phase.update(&mut tree).unwrap());
        assert_eq!(
            tree.activity_modes(0).unwrap(),
            vec![ActivityMode::Activating, ActivityMode::Active]
        );

        first.set(true);
        assert!(phase.update(&mut tree).unwrap());
        assert_eq!(tree.activity_modes(0).unwrap(), vec![ActivityMode::Active; 2]);
    }
}
