//! Activities: asynchronous lifecycle work attached to a state.
//!
//! An activity is activated when its state joins the active path and
//! deactivated when the state leaves it. Either operation may take many
//! frames (asset loads, fades, network handshakes). The runtime owns the
//! [`ActivityMode`] bookkeeping; implementors only supply the work.

use super::cancel::CancellationToken;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Lifecycle mode of an activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityMode {
    Inactive,
    Activating,
    Active,
    Deactivating,
}

impl ActivityMode {
    /// Whether the activity is between its two settled modes.
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Activating | Self::Deactivating)
    }
}

/// How a lifecycle operation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// The work finished; the mode settles to `Active` or `Inactive`.
    Completed,

    /// The work observed cancellation and stopped early. The mode is left
    /// in `Activating`/`Deactivating`; any rollback is the activity's own
    /// responsibility.
    Cancelled,
}

/// Errors raised by activity work.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("activity work failed: {0}")]
    Failed(String),

    #[error("activity resource unavailable: {0}")]
    Unavailable(String),
}

/// Future returned by activity lifecycle operations.
///
/// Futures are `'static`: clone whatever the work needs out of the
/// activity before returning. They are polled on the thread that drives
/// `tick`, so they need not be `Send`.
pub type ActivityFuture = LocalBoxFuture<'static, Result<LifecycleOutcome, ActivityError>>;

/// A unit of asynchronous lifecycle work bound to a state.
///
/// The default bodies complete immediately, which is enough for
/// activities that only exist to be observed.
pub trait Activity {
    /// Name used in logs and error reports.
    fn name(&self) -> &str {
        "activity"
    }

    /// Perform activation work.
    fn activate(&mut self, _token: CancellationToken) -> ActivityFuture {
        Box::pin(futures::future::ready(Ok(LifecycleOutcome::Completed)))
    }

    /// Perform deactivation work.
    fn deactivate(&mut self, _token: CancellationToken) -> ActivityFuture {
        Box::pin(futures::future::ready(Ok(LifecycleOutcome::Completed)))
    }
}

/// Activity that settles as soon as it is launched.
///
/// Useful as a marker whose mode reflects whether its state is on the
/// active path.
#[derive(Clone, Debug)]
pub struct InstantActivity {
    name: String,
}

impl InstantActivity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Activity for InstantActivity {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Direction of a lifecycle operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Activate,
    Deactivate,
}

impl Lifecycle {
    /// Mode an activity must be in for the operation to run.
    pub fn required_mode(self) -> ActivityMode {
        match self {
            Self::Activate => ActivityMode::Inactive,
            Self::Deactivate => ActivityMode::Active,
        }
    }

    fn transitional_mode(self) -> ActivityMode {
        match self {
            Self::Activate => ActivityMode::Activating,
            Self::Deactivate => ActivityMode::Deactivating,
        }
    }

    fn settled_mode(self) -> ActivityMode {
        match self {
            Self::Activate => ActivityMode::Active,
            Self::Deactivate => ActivityMode::Inactive,
        }
    }
}

/// An activity together with the mode the runtime tracks for it.
pub(crate) struct ActivitySlot {
    activity: Box<dyn Activity>,
    mode: ActivityMode,
}

impl ActivitySlot {
    pub(crate) fn new(activity: Box<dyn Activity>) -> Self {
        Self {
            activity,
            mode: ActivityMode::Inactive,
        }
    }

    pub(crate) fn mode(&self) -> ActivityMode {
        self.mode
    }

    pub(crate) fn name(&self) -> &str {
        self.activity.name()
    }

    /// Launch an operation. Returns `None` when the guard rejects it
    /// (activating a non-inactive activity, deactivating a non-active one).
    pub(crate) fn launch(
        &mut self,
        lifecycle: Lifecycle,
        token: CancellationToken,
    ) -> Option<ActivityFuture> {
        if self.mode != lifecycle.required_mode() {
            return None;
        }

        self.mode = lifecycle.transitional_mode();
        Some(match lifecycle {
            Lifecycle::Activate => self.activity.activate(token),
            Lifecycle::Deactivate => self.activity.deactivate(token),
        })
    }

    /// Record the outcome of a finished operation.
    pub(crate) fn settle(&mut self, lifecycle: Lifecycle, outcome: LifecycleOutcome) {
        if outcome == LifecycleOutcome::Cancelled {
            return;
        }

        self.mode = lifecycle.settled_mode();
        match lifecycle {
            Lifecycle::Activate => info!(activity = self.name(), mode = ?self.mode, "Activated"),
            Lifecycle::Deactivate => {
                info!(activity = self.name(), mode = ?self.mode, "Deactivated")
            }
        }
    }
}
