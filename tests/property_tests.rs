//! Property-based tests for the state machine engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated graphs and request sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use switchyard::{HandlerResult, StateHistory, StateMachine, TransitionRecord};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
enum TestState {
    Initial,
    Processing,
    Complete,
    Failed,
}

prop_compose! {
    fn arbitrary_state()(variant in 0..4u8) -> TestState {
        match variant {
            0 => TestState::Initial,
            1 => TestState::Processing,
            2 => TestState::Complete,
            _ => TestState::Failed,
        }
    }
}

prop_compose! {
    fn arbitrary_edges()(
        edges in prop::collection::vec((arbitrary_state(), arbitrary_state()), 0..12)
    ) -> Vec<(TestState, TestState)> {
        edges
    }
}

fn machine_with(edges: &[(TestState, TestState)]) -> StateMachine<TestState> {
    let mut machine = StateMachine::with_initial(TestState::Initial);
    for (from, to) in edges {
        machine.add_transition(*from, *to);
    }
    machine
}

proptest! {
    #[test]
    fn count_grows_by_one_or_zero(
        edges in arbitrary_edges(),
        requests in prop::collection::vec(arbitrary_state(), 0..20)
    ) {
        let mut machine = machine_with(&edges);

        for target in requests {
            let before = machine.transition_count();
            let moved = machine.transition(target).unwrap();
            let after = machine.transition_count();

            prop_assert_eq!(after, before + u64::from(moved));
        }
    }

    #[test]
    fn moves_follow_declared_edges(
        edges in arbitrary_edges(),
        requests in prop::collection::vec(arbitrary_state(), 0..20)
    ) {
        let declared: HashSet<_> = edges.iter().copied().collect();
        let mut machine = machine_with(&edges);

        for target in requests {
            let from = *machine.current_state().unwrap();
            let legal = declared.contains(&(from, target));

            prop_assert_eq!(machine.can_transition(&target), legal);
            prop_assert_eq!(machine.transition(target).unwrap(), legal);

            let expected = if legal { target } else { from };
            prop_assert_eq!(machine.current_state(), Some(&expected));
        }
    }

    #[test]
    fn records_match_the_path_taken(
        edges in arbitrary_edges(),
        requests in prop::collection::vec(arbitrary_state(), 0..20)
    ) {
        let mut machine = machine_with(&edges);
        let mut path = vec![TestState::Initial];

        for target in requests {
            if machine.transition(target).unwrap() {
                path.push(target);
            }
        }

        let history = machine.history();
        prop_assert_eq!(history.len() as u64, machine.transition_count());
        for (i, record) in history.iter().enumerate() {
            prop_assert_eq!(record.sequence, i as u64 + 1);
            prop_assert_eq!(record.from, Some(path[i]));
            prop_assert_eq!(record.to, path[i + 1]);
        }
    }

    #[test]
    fn reset_always_returns_to_initial(
        edges in arbitrary_edges(),
        requests in prop::collection::vec(arbitrary_state(), 0..10)
    ) {
        let mut machine = machine_with(&edges);
        for target in requests {
            machine.transition(target).unwrap();
        }

        machine.reset();

        prop_assert_eq!(machine.current_state(), Some(&TestState::Initial));
        prop_assert_eq!(machine.transition_count(), 0);
        prop_assert!(machine.history().is_empty());
    }

    #[test]
    fn released_handler_never_fires_again(
        releases in prop::collection::vec(any::<bool>(), 1..6)
    ) {
        let mut machine = StateMachine::with_initial(TestState::Initial);
        machine.add_all_transitions([TestState::Initial, TestState::Processing], false);

        let registration = machine.on_entering(|_: &TestState| -> HandlerResult { Ok(()) });
        let mut released_once = false;
        for release in releases {
            if release {
                let first = registration.release();
                prop_assert_eq!(first, !released_once);
                released_once = true;
            }
            prop_assert_eq!(registration.is_active(), !released_once);
        }
    }

    #[test]
    fn history_keeps_the_newest_records(
        capacity in 1usize..8,
        targets in prop::collection::vec(arbitrary_state(), 0..20)
    ) {
        let mut history = StateHistory::with_capacity(capacity);
        for (i, to) in targets.iter().enumerate() {
            history.push(TransitionRecord {
                from: None,
                requested: *to,
                to: *to,
                timestamp: chrono::Utc::now(),
                sequence: i as u64 + 1,
            });
        }

        let kept = targets.len().min(capacity);
        prop_assert_eq!(history.len(), kept);
        prop_assert_eq!(history.dropped() as usize, targets.len() - kept);
        if let Some(last) = history.last() {
            prop_assert_eq!(last.sequence, targets.len() as u64);
        }
    }

    #[test]
    fn history_roundtrip_serialization(
        edges in arbitrary_edges(),
        requests in prop::collection::vec(arbitrary_state(), 0..8)
    ) {
        let mut machine = machine_with(&edges);
        for target in requests {
            machine.transition(target).unwrap();
        }

        let json = serde_json::to_string(machine.history()).unwrap();
        let deserialized: StateHistory<TestState> = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(machine.history().get_path(), deserialized.get_path());
    }
}
