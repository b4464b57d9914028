//! Statetree: a hierarchical state machine runtime with phased transitions
//!
//! States form a tree. At any time one path from the root to a leaf is
//! active. Each state may carry activities whose activation and
//! deactivation take several frames. When a state asks to leave, the
//! transition runs in two phases: first every activity on the exiting
//! branch is deactivated, then the tree is switched through the least
//! common ancestor, then every activity on the entering branch is
//! activated. Tree ticking is suspended while a phase runs, and requests
//! arriving meanwhile collapse into a single pending transition.
//!
//! # Core Concepts
//!
//! - **State**: behavior hooks for a tree node via the `State` trait
//! - **Activity**: asynchronous lifecycle work attached to a state
//! - **Phase**: a batch of activity operations run sequentially or in parallel
//! - **Sequencer**: exit phase, tree swap, enter phase, with coalescing
//!
//! Everything runs on the thread that calls [`StateMachine::tick`]. Activity
//! futures are polled, never awaited, so no frame ever blocks.
//!
//! # Example
//!
//! ```rust
//! use statetree::builder::StateMachineBuilder;
//! use statetree::core::{ActivityMode, InstantActivity, State};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Screen { Root, Menu, Game }
//!
//! struct Menu { frames: u32 }
//!
//! impl State<Screen> for Menu {
//!     fn transition(&mut self) -> Option<Screen> {
//!         (self.frames >= 2).then_some(Screen::Game)
//!     }
//!
//!     fn on_update(&mut self, _delta_time: f32) {
//!         self.frames += 1;
//!     }
//! }
//!
//! let mut machine = StateMachineBuilder::new(Screen::Root, ())
//!     .state(Screen::Menu, Screen::Root, Menu { frames: 0 })?
//!     .state(Screen::Game, Screen::Root, ())?
//!     .initial(Screen::Root, Screen::Menu)?
//!     .activity(Screen::Game, InstantActivity::new("hud"))?
//!     .build();
//!
//! for _ in 0..6 {
//!     machine.tick(1.0 / 60.0)?;
//! }
//!
//! assert_eq!(machine.leaf(), Screen::Game);
//! assert_eq!(machine.tree().activity_modes(Screen::Game)?, vec![ActivityMode::Active]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod machine;
pub mod sequence;
pub mod sequencer;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use config::{MachineConfig, PhaseMode};
pub use crate::core::{Activity, ActivityMode, CancellationToken, LifecycleOutcome, State, StateKey};
pub use error::MachineError;
pub use machine::StateMachine;
pub use sequencer::TransitionSequencer;
