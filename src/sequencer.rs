//! Transition sequencing: exit phase, tree swap, enter phase.
//!
//! ```text
//! Idle --request--> ExitPhase --done--> (change_state) --> EnterPhase --done--> Idle
//!                      |                                      |
//!                      +---- requests while busy overwrite the pending slot
//! ```
//!
//! While a phase is running the tree is not ticked. The tree is mutated
//! exactly once per transition, between the two phases. A request made
//! while busy replaces any earlier pending request and starts as soon as
//! the in-flight transition ends.

use crate::config::PhaseMode;
use crate::core::{
    ActivityRef, CancellationToken, Lifecycle, StateKey, StateTree, TransitionHistory,
    TransitionRecord,
};
use crate::error::MachineError;
use crate::sequence::{self, PhaseStep, Sequence};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

struct InFlight {
    id: Uuid,
    from: usize,
    to: usize,
    lca: Option<usize>,
    started_at: DateTime<Utc>,
}

/// Work scheduled to run once the exit phase completes.
struct EnterPhase {
    from: usize,
    to: usize,
    chain: Vec<usize>,
}

/// Drives transitions for a [`StateMachine`](crate::StateMachine).
pub struct TransitionSequencer<K: StateKey> {
    mode: PhaseMode,
    phase: Option<Box<dyn Sequence<K>>>,
    next_phase: Option<EnterPhase>,
    pending: Option<(usize, usize)>,
    in_flight: Option<InFlight>,
    /// Set when the tree swap between phases failed. Cleared by `abort`.
    stalled: bool,
    token: CancellationToken,
    history: TransitionHistory<K>,
}

impl<K: StateKey> TransitionSequencer<K> {
    pub(crate) fn new(mode: PhaseMode) -> Self {
        Self {
            mode,
            phase: None,
            next_phase: None,
            pending: None,
            in_flight: None,
            stalled: false,
            token: CancellationToken::new(),
            history: TransitionHistory::new(),
        }
    }

    pub fn phase_mode(&self) -> PhaseMode {
        self.mode
    }

    /// Whether a phase sequence is running.
    pub fn is_busy(&self) -> bool {
        self.phase.is_some()
    }

    pub fn history(&self) -> &TransitionHistory<K> {
        &self.history
    }

    /// Token handed to the operations of the current transition.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn in_flight(&self) -> Option<(usize, usize)> {
        self.in_flight.as_ref().map(|t| (t.from, t.to))
    }

    pub(crate) fn pending(&self) -> Option<(usize, usize)> {
        self.pending
    }

    /// Ask for a transition. Requests to the current state are ignored;
    /// while busy the request overwrites the pending slot.
    pub(crate) fn request_transition(
        &mut self,
        tree: &mut StateTree<K>,
        from: usize,
        to: usize,
    ) -> Result<(), MachineError> {
        if from == to {
            return Ok(());
        }
        if self.is_busy() {
            if let Some((_, dropped)) = self.pending.replace((from, to)) {
                debug!(dropped = ?tree.key(dropped), "Pending transition overwritten");
            }
            info!(from = ?tree.key(from), to = ?tree.key(to), "Transition queued while busy");
            return Ok(());
        }
        self.begin_transition(tree, from, to)
    }

    fn begin_transition(
        &mut self,
        tree: &mut StateTree<K>,
        from: usize,
        to: usize,
    ) -> Result<(), MachineError> {
        self.renew_token();

        let lca = tree.lca_idx(from, to);
        let (exit_chain, enter_chain) = match lca {
            Some(lca) => (tree.exit_chain(lca), tree.enter_chain(to, lca)),
            None => (Vec::new(), Vec::new()),
        };

        let id = Uuid::new_v4();
        info!(
            transition = %id,
            from = ?tree.key(from),
            to = ?tree.key(to),
            lca = ?lca.map(|l| tree.key(l)),
            mode = ?self.mode,
            "Beginning transition"
        );
        self.in_flight = Some(InFlight {
            id,
            from,
            to,
            lca,
            started_at: Utc::now(),
        });
        self.next_phase = Some(EnterPhase {
            from,
            to,
            chain: enter_chain,
        });

        let steps = gather_phase_steps(tree, &exit_chain, Lifecycle::Deactivate);
        self.start_phase(tree, steps)
    }

    /// Activate the activities along `chain` without a tree change. Used
    /// once, when the machine starts. Nothing to activate means no phase,
    /// so the first tick reaches the tree.
    pub(crate) fn begin_activation(
        &mut self,
        tree: &mut StateTree<K>,
        chain: &[usize],
    ) -> Result<(), MachineError> {
        let steps = gather_phase_steps(tree, chain, Lifecycle::Activate);
        if steps.is_empty() {
            return Ok(());
        }
        self.renew_token();
        self.start_phase(tree, steps)
    }

    fn renew_token(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
    }

    fn start_phase(&mut self, tree: &mut StateTree<K>, steps: Vec<PhaseStep>) -> Result<(), MachineError> {
        let phase = self
            .phase
            .insert(sequence::phase(self.mode, steps, self.token.clone()));
        phase.start(tree)
    }

    /// Advance the running phase, or tick the tree when idle.
    ///
    /// A stalled transition keeps the sequencer busy and does nothing until
    /// it is aborted.
    pub(crate) fn tick(&mut self, tree: &mut StateTree<K>, delta_time: f32) -> Result<(), MachineError> {
        if self.stalled {
            return Ok(());
        }
        if let Some(phase) = self.phase.as_mut() {
            if phase.update(tree)? {
                match self.next_phase.take() {
                    Some(next) => self.run_enter_phase(tree, next)?,
                    None => self.end_transition(tree)?,
                }
            }
            return Ok(());
        }

        if let Some((from, to)) = tree.update(delta_time)? {
            self.request_transition(tree, from, to)?;
        }
        Ok(())
    }

    fn run_enter_phase(&mut self, tree: &mut StateTree<K>, next: EnterPhase) -> Result<(), MachineError> {
        if let Err(error) = tree.change_state(next.from, next.to) {
            self.stalled = true;
            warn!(
                transition = ?self.in_flight.as_ref().map(|t| t.id),
                error = %error,
                "Tree swap failed, transition stalled"
            );
            return Err(error);
        }

        let mut chain = next.chain;
        if chain.last() == Some(&next.to) {
            chain.extend(tree.active_descendants(next.to));
        }
        let steps = gather_phase_steps(tree, &chain, Lifecycle::Activate);
        self.start_phase(tree, steps)
    }

    fn end_transition(&mut self, tree: &mut StateTree<K>) -> Result<(), MachineError> {
        self.phase = None;

        if let Some(done) = self.in_flight.take() {
            let record = TransitionRecord {
                id: done.id,
                from: tree.key(done.from),
                to: tree.key(done.to),
                lca: done.lca.map(|l| tree.key(l)),
                started_at: done.started_at,
                completed_at: Utc::now(),
            };
            info!(
                transition = %record.id,
                to = ?record.to,
                elapsed = ?record.elapsed(),
                "Transition complete"
            );
            self.history.record(record);
        }

        if let Some((from, to)) = self.pending.take() {
            self.begin_transition(tree, from, to)?;
        }
        Ok(())
    }

    /// Cancel the running transition and drop everything queued.
    ///
    /// The tree is left as it is: unchanged if the exit phase was running,
    /// already switched if the enter phase was. Activities keep whatever
    /// mode they reached.
    pub(crate) fn abort(&mut self) {
        if !self.is_busy() && self.pending.is_none() {
            return;
        }
        self.token.cancel();
        self.phase = None;
        self.stalled = false;
        self.next_phase = None;
        self.pending = None;
        let id = self.in_flight.take().map(|t| t.id);
        warn!(transition = ?id, "Transition aborted");
    }
}

/// One step per activity whose mode admits `lifecycle`, across `chain` in
/// order. Activities already in the target mode are skipped.
fn gather_phase_steps<K: StateKey>(
    tree: &StateTree<K>,
    chain: &[usize],
    lifecycle: Lifecycle,
) -> Vec<PhaseStep> {
    let phase = match lifecycle {
        Lifecycle::Activate => "Enter",
        Lifecycle::Deactivate => "Exit",
    };

    let mut steps = Vec::new();
    for &state in chain {
        for slot in 0..tree.activity_count(state) {
            let at = ActivityRef { state, slot };
            let activity = tree.slot(at);
            if activity.mode() != lifecycle.required_mode() {
                continue;
            }
            debug!(
                phase,
                state = ?tree.key(state),
                activity = activity.name(),
                mode = ?activity.mode(),
                "Gathered phase step"
            );
            steps.push(PhaseStep { at, lifecycle });
        }
    }
    steps
}
