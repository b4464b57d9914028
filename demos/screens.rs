//! Screen Flow
//!
//! This demo drives a small menu/game screen tree through phased
//! transitions.
//!
//! Key concepts:
//! - Composite states with default children
//! - Activities that take several frames (a fade)
//! - Exit phase, tree swap, enter phase
//! - Transition history
//!
//! Run with: RUST_LOG=statetree=debug cargo run --example screens

use std::future;
use std::task::Poll;

use statetree::builder::StateMachineBuilder;
use statetree::core::{ActivityFuture, CancellationToken, InstantActivity};
use statetree::{state_key, Activity, LifecycleOutcome, State};
use tracing_subscriber::EnvFilter;

state_key! {
    enum Screen {
        Root,
        Menu,
        Game,
        Playing,
        Paused,
    }
}

/// Fade that takes a fixed number of frames in either direction.
struct Fade {
    frames: u32,
}

impl Fade {
    fn run(&self, token: CancellationToken) -> ActivityFuture {
        let mut remaining = self.frames;
        Box::pin(future::poll_fn(move |_| {
            if token.is_cancelled() {
                return Poll::Ready(Ok(LifecycleOutcome::Cancelled));
            }
            if remaining == 0 {
                return Poll::Ready(Ok(LifecycleOutcome::Completed));
            }
            remaining -= 1;
            Poll::Pending
        }))
    }
}

impl Activity for Fade {
    fn name(&self) -> &str {
        "fade"
    }

    fn activate(&mut self, token: CancellationToken) -> ActivityFuture {
        self.run(token)
    }

    fn deactivate(&mut self, token: CancellationToken) -> ActivityFuture {
        self.run(token)
    }
}

/// Leaves for `next` after `frames` updates.
struct Timed {
    frames: u32,
    elapsed: u32,
    next: Screen,
}

impl Timed {
    fn new(frames: u32, next: Screen) -> Self {
        Self {
            frames,
            elapsed: 0,
            next,
        }
    }
}

impl State<Screen> for Timed {
    fn transition(&mut self) -> Option<Screen> {
        (self.elapsed >= self.frames).then_some(self.next)
    }

    fn on_enter(&mut self) {
        self.elapsed = 0;
    }

    fn on_update(&mut self, _delta_time: f32) {
        self.elapsed += 1;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Screen Flow ===\n");

    let mut machine = StateMachineBuilder::new(Screen::Root, ())
        .state(Screen::Menu, Screen::Root, Timed::new(3, Screen::Game))?
        .state(Screen::Game, Screen::Root, ())?
        .state(Screen::Playing, Screen::Game, Timed::new(4, Screen::Paused))?
        .state(Screen::Paused, Screen::Game, Timed::new(2, Screen::Menu))?
        .initial(Screen::Root, Screen::Menu)?
        .initial(Screen::Game, Screen::Playing)?
        .activity(Screen::Menu, Fade { frames: 2 })?
        .activity(Screen::Game, Fade { frames: 3 })?
        .activity(Screen::Game, InstantActivity::new("hud"))?
        .activity(Screen::Paused, InstantActivity::new("overlay"))?
        .build();

    for frame in 0..40 {
        machine.tick(1.0 / 60.0)?;

        let marker = if machine.is_transitioning() { "~" } else { " " };
        let path: Vec<_> = machine.active_path().iter().map(|s| s.name()).collect();
        println!("frame {frame:>2} {marker} {}", path.join(" > "));
    }

    println!("\nTransitions:");
    for record in machine.history().records() {
        println!(
            "  {:?} -> {:?} via {:?} ({} us)",
            record.from,
            record.to,
            record.lca,
            record.elapsed().as_micros()
        );
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
