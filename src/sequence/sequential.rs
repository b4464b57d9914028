//! Run operations strictly one at a time, in list order.

use super::{PhaseStep, RunningStep, Sequence};
use crate::core::{CancellationToken, StateKey, StateTree};
use crate::error::MachineError;

/// Phase that launches the next operation only after the current one has
/// finished. At most one operation advances per `update`.
pub struct SequentialPhase {
    steps: Vec<PhaseStep>,
    token: CancellationToken,
    next: usize,
    current: Option<RunningStep>,
    done: bool,
    faulted: bool,
}

impl SequentialPhase {
    pub(crate) fn new(steps: Vec<PhaseStep>, token: CancellationToken) -> Self {
        Self {
            steps,
            token,
            next: 0,
            current: None,
            done: false,
            faulted: false,
        }
    }

    fn advance<K: StateKey>(&mut self, tree: &mut StateTree<K>) -> Result<(), MachineError> {
        let Some(&step) = self.steps.get(self.next) else {
            self.current = None;
            self.done = true;
            return Ok(());
        };
        self.next += 1;

        let mut running = RunningStep::launch(step, tree, self.token.clone());
        let polled = running.poll(tree);
        self.current = Some(running);
        polled.map(|_| ()).inspect_err(|_| self.faulted = true)
    }
}

impl<K: StateKey> Sequence<K> for SequentialPhase {
    fn start(&mut self, tree: &mut StateTree<K>) -> Result<(), MachineError> {
        self.advance(tree)
    }

    fn update(&mut self, tree: &mut StateTree<K>) -> Result<bool, MachineError> {
        if self.done {
            return Ok(true);
        }
        if self.faulted {
            return Ok(false);
        }

        let finished = match self.current.as_mut() {
            Some(running) => running.poll(tree).inspect_err(|_| self.faulted = true)?,
            None => true,
        };
        if finished {
            self.advance(tree)?;
        }
        Ok(self.done)
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
