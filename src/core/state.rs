//! State hooks.
//!
//! A state's position in the tree (parent, children, active child) is
//! owned by the [`StateTree`](super::tree::StateTree). Implementors of
//! [`State`] only describe behavior: which child to enter by default, when
//! to leave, and what to do on enter, exit and update.

/// Behavior of a node in the state tree, keyed by `K`.
///
/// Every method has a default, so `()` is a valid state for nodes that
/// only group children or carry activities.
///
/// # Example
///
/// ```rust
/// use statetree::core::State;
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum Screen { Root, Splash, Menu }
///
/// struct Splash { elapsed: f32 }
///
/// impl State<Screen> for Splash {
///     fn transition(&mut self) -> Option<Screen> {
///         (self.elapsed >= 2.0).then_some(Screen::Menu)
///     }
///
///     fn on_enter(&mut self) {
///         self.elapsed = 0.0;
///     }
///
///     fn on_update(&mut self, delta_time: f32) {
///         self.elapsed += delta_time;
///     }
/// }
/// ```
pub trait State<K> {
    /// Child to enter automatically when this state is entered.
    ///
    /// `None` falls back to the default child registered with the builder;
    /// a state with neither is a leaf.
    fn initial_state(&self) -> Option<K> {
        None
    }

    /// Evaluated every tick while this state is on the active path.
    ///
    /// `Some(target)` requests a transition away from this state and
    /// preempts the update of this state and its descendants for the tick.
    fn transition(&mut self) -> Option<K> {
        None
    }

    /// Called once each time the state is entered.
    fn on_enter(&mut self) {}

    /// Called once each time the state is exited, after its children.
    fn on_exit(&mut self) {}

    /// Called once per tick while active, after the active child.
    fn on_update(&mut self, _delta_time: f32) {}
}

impl<K> State<K> for () {}
