//! Property-based tests for tree topology and transitions.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated trees.

use proptest::prelude::*;
use statetree::builder::StateMachineBuilder;
use statetree::core::InstantActivity;
use statetree::{ActivityMode, StateMachine};

/// Node `i > 0` has parent `parents[i - 1]`, which is always `< i`.
#[derive(Clone, Debug)]
struct Shape {
    parents: Vec<usize>,
}

impl Shape {
    fn len(&self) -> usize {
        self.parents.len() + 1
    }

    fn machine(&self) -> StateMachine<usize> {
        let mut builder = StateMachineBuilder::new(0usize, ())
            .activity(0, InstantActivity::new("node-0"))
            .unwrap();
        for (i, &parent) in self.parents.iter().enumerate() {
            let key = i + 1;
            builder = builder
                .state(key, parent, ())
                .and_then(|b| b.activity(key, InstantActivity::new(format!("node-{key}"))))
                .unwrap();
        }
        builder.build()
    }

    fn ancestors(&self, mut node: usize) -> Vec<usize> {
        let mut chain = vec![node];
        while node > 0 {
            node = self.parents[node - 1];
            chain.push(node);
        }
        chain
    }
}

prop_compose! {
    fn arbitrary_shape()(len in 1..24usize)
        (parents in (1..len).map(|i| 0..i).collect::<Vec<_>>()) -> Shape {
        Shape { parents }
    }
}

prop_compose! {
    fn shape_with_nodes()(shape in arbitrary_shape())
        (a in 0..shape.len(), b in 0..shape.len(), shape in Just(shape)) -> (Shape, usize, usize) {
        (shape, a, b)
    }
}

prop_compose! {
    fn shape_with_walk()(shape in arbitrary_shape())
        (walk in prop::collection::vec(0..shape.len(), 1..12), shape in Just(shape)) -> (Shape, Vec<usize>) {
        (shape, walk)
    }
}

fn settle(machine: &mut StateMachine<usize>) {
    for _ in 0..16 {
        machine.tick(0.016).unwrap();
        if !machine.is_transitioning() {
            return;
        }
    }
    panic!("machine did not settle");
}

proptest! {
    #[test]
    fn lca_is_the_deepest_common_ancestor((shape, a, b) in shape_with_nodes()) {
        let machine = shape.machine();
        let lca = machine.tree().lca(a, b).unwrap().unwrap();

        let (from_a, from_b) = (shape.ancestors(a), shape.ancestors(b));
        prop_assert!(from_a.contains(&lca));
        prop_assert!(from_b.contains(&lca));

        let depth = |n: usize| shape.ancestors(n).len();
        for common in from_a.iter().filter(|n| from_b.contains(n)) {
            prop_assert!(depth(*common) <= depth(lca));
        }
        prop_assert_eq!(machine.tree().lca(b, a).unwrap(), Some(lca));
    }

    #[test]
    fn lca_of_a_state_with_itself_is_the_state((shape, a, _b) in shape_with_nodes()) {
        let machine = shape.machine();
        prop_assert_eq!(machine.tree().lca(a, a).unwrap(), Some(a));
    }

    #[test]
    fn path_to_root_matches_parent_links((shape, a, _b) in shape_with_nodes()) {
        let machine = shape.machine();
        let path: Vec<usize> = machine.tree().path_to_root(a).unwrap().collect();
        prop_assert_eq!(path, shape.ancestors(a));
    }

    #[test]
    fn change_state_leaves_exactly_the_target_path_active((shape, walk) in shape_with_walk()) {
        let mut machine = shape.machine();
        machine.start().unwrap();

        for target in walk {
            let leaf = machine.leaf();
            machine.change_state(leaf, target).unwrap();

            let mut expected = shape.ancestors(target);
            expected.reverse();
            prop_assert_eq!(machine.active_path(), expected.clone());

            for node in 0..shape.len() {
                let on_path = expected.contains(&node);
                prop_assert_eq!(machine.tree().is_active(node).unwrap(), on_path);
                if !on_path {
                    prop_assert_eq!(machine.tree().active_child(node).unwrap(), None);
                }
            }
        }
    }

    #[test]
    fn phased_transitions_keep_activities_in_step_with_the_active_path(
        (shape, walk) in shape_with_walk()
    ) {
        let mut machine = shape.machine();
        settle(&mut machine);

        for target in walk {
            let leaf = machine.leaf();
            machine.request_transition(leaf, target).unwrap();
            settle(&mut machine);

            prop_assert_eq!(machine.leaf(), target);
            for node in 0..shape.len() {
                let expected = if machine.tree().is_active(node).unwrap() {
                    ActivityMode::Active
                } else {
                    ActivityMode::Inactive
                };
                prop_assert_eq!(machine.tree().activity_modes(node).unwrap(), vec![expected]);
            }
        }
    }
}
