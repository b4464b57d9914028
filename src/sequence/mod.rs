//! Phase sequences: batches of activity lifecycle operations.
//!
//! A phase is one half of a transition (exit or enter). Its operations are
//! independent of each other and run either one at a time or all at once
//! depending on [`PhaseMode`]. Nothing here blocks: futures are polled
//! with a no-op waker once when launched and once per `update`, which the
//! sequencer calls every tick.

mod parallel;
mod sequential;

pub use parallel::ParallelPhase;
pub use sequential::SequentialPhase;

use crate::config::PhaseMode;
use crate::core::{ActivityFuture, ActivityRef, CancellationToken, Lifecycle, StateKey, StateTree};
use crate::error::MachineError;
use futures::task::noop_waker_ref;
use futures::FutureExt;
use std::task::{Context, Poll};
use tracing::warn;

/// Polling contract shared by phase implementations.
pub trait Sequence<K: StateKey> {
    /// Launch the operations (all of them, or the first).
    fn start(&mut self, tree: &mut StateTree<K>) -> Result<(), MachineError>;

    /// Advance the batch. Returns whether every operation has finished.
    ///
    /// A failing operation is reported once as `Err`; the phase then stays
    /// incomplete.
    fn update(&mut self, tree: &mut StateTree<K>) -> Result<bool, MachineError>;

    fn is_done(&self) -> bool;
}

/// One lifecycle operation on one activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PhaseStep {
    pub(crate) at: ActivityRef,
    pub(crate) lifecycle: Lifecycle,
}

/// Build the phase implementation selected by `mode`.
pub(crate) fn phase<K: StateKey>(
    mode: PhaseMode,
    steps: Vec<PhaseStep>,
    token: CancellationToken,
) -> Box<dyn Sequence<K>> {
    match mode {
        PhaseMode::Parallel => Box::new(ParallelPhase::new(steps, token)),
        PhaseMode::Sequential => Box::new(SequentialPhase::new(steps, token)),
    }
}

/// A launched step. `future` is `None` once it has finished, or from the
/// start when the activity's mode guard rejected the operation.
struct RunningStep {
    step: PhaseStep,
    future: Option<ActivityFuture>,
}

impl RunningStep {
    fn launch<K: StateKey>(step: PhaseStep, tree: &mut StateTree<K>, token: CancellationToken) -> Self {
        let future = tree.slot_mut(step.at).launch(step.lifecycle, token);
        Self { step, future }
    }

    fn is_finished(&self) -> bool {
        self.future.is_none()
    }

    /// Poll once. Returns whether the step has finished.
    fn poll<K: StateKey>(&mut self, tree: &mut StateTree<K>) -> Result<bool, MachineError> {
        let Some(future) = self.future.as_mut() else {
            return Ok(true);
        };

        let mut cx = Context::from_waker(noop_waker_ref());
        let result = match future.poll_unpin(&mut cx) {
            Poll::Pending => return Ok(false),
            Poll::Ready(result) => result,
        };
        self.future = None;

        match result {
            Ok(outcome) => {
                tree.slot_mut(self.step.at).settle(self.step.lifecycle, outcome);
                Ok(true)
            }
            Err(source) => {
                let error = MachineError::ActivityFailed {
                    state: format!("{:?}", tree.key(self.step.at.state)),
                    activity: tree.slot(self.step.at).name().to_string(),
                    source,
                };
                warn!(error = %error, lifecycle = ?self.step.lifecycle, "Phase step failed, phase stalled");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::{Activity, ActivityFuture, CancellationToken, LifecycleOutcome, State, StateTree};
    use crate::core::ActivitySlot;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Activity whose operations finish only when `release` is set.
    pub(crate) struct Gated {
        pub(crate) name: &'static str,
        pub(crate) release: Rc<Cell<bool>>,
        pub(crate) log: Rc<RefCell<Vec<String>>>,
    }

    impl Gated {
        fn gate(&self, label: String) -> ActivityFuture {
            self.log.borrow_mut().push(label);
            let release = Rc::clone(&self.release);
            Box::pin(futures::future::poll_fn(move |_| {
                if release.get() {
                    std::task::Poll::Ready(Ok(LifecycleOutcome::Completed))
                } else {
                    std::task::Poll::Pending
                }
            }))
        }
    }

    impl Activity for Gated {
        fn name(&self) -> &str {
            self.name
        }

        fn activate(&mut self, _token: CancellationToken) -> ActivityFuture {
            self.gate(format!("activate {}", self.name))
        }

        fn deactivate(&mut self, _token: CancellationToken) -> ActivityFuture {
            self.gate(format!("deactivate {}", self.name))
        }
    }

    /// Single-node tree carrying the given activities.
    pub(crate) fn tree_with(activities: Vec<Box<dyn Activity>>) -> StateTree<u8> {
        let mut tree = StateTree::new(0u8, Box::new(()) as Box<dyn State<u8>>);
        for activity in activities {
            tree.add_activity(0, ActivitySlot::new(activity));
        }
        tree
    }
}
