//! End-to-end scenarios exercising the public API.

use std::sync::{Arc, Mutex};
use switchyard::{
    state_enum, HandlerError, HandlerResult, MachineConfig, MachineError, Phase, Registration,
    StateMachine, StateMachineBuilder, TransitionError,
};

state_enum! {
    enum Ticket {
        Open,
        Triaged,
        InProgress,
        Blocked,
        Closed,
    }
}

type Log = Arc<Mutex<Vec<String>>>;

fn ticket_machine() -> StateMachine<Ticket> {
    StateMachineBuilder::new()
        .initial(Ticket::Open)
        .transitions(Ticket::Open, [Ticket::Triaged, Ticket::Closed])
        .transitions(Ticket::Triaged, [Ticket::InProgress, Ticket::Closed])
        .transitions(Ticket::InProgress, [Ticket::Blocked, Ticket::Closed])
        .transition(Ticket::Blocked, Ticket::InProgress)
        .build()
        .unwrap()
}

fn record(log: &Log, label: &'static str) -> impl Fn(&Ticket) -> HandlerResult {
    let log = Arc::clone(log);
    move |state: &Ticket| -> HandlerResult {
        log.lock().unwrap().push(format!("{label}:{state}"));
        Ok(())
    }
}

#[test]
fn legal_and_illegal_edges() {
    let mut machine = ticket_machine();

    assert_eq!(machine.transition(Ticket::InProgress), Ok(false));
    assert_eq!(machine.current_state(), Some(&Ticket::Open));
    assert_eq!(machine.transition_count(), 0);

    assert_eq!(machine.transition(Ticket::Triaged), Ok(true));
    assert_eq!(machine.transition(Ticket::InProgress), Ok(true));
    assert_eq!(machine.current_state(), Some(&Ticket::InProgress));
    assert_eq!(machine.transition_count(), 2);

    assert!(matches!(
        machine.try_transition(Ticket::Open),
        Err(TransitionError::Illegal {
            from: Some(Ticket::InProgress),
            to: Ticket::Open,
        })
    ));
}

#[test]
fn release_is_idempotent() {
    let log: Log = Arc::default();
    let mut machine = ticket_machine();
    let registration = machine.on_entering(record(&log, "enter"));

    machine.transition(Ticket::Triaged).unwrap();
    assert!(registration.release());
    assert!(!registration.release());
    machine.transition(Ticket::InProgress).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["enter:Triaged"]);
}

#[test]
fn before_entering_router_redirects_until_released() {
    let mut machine = ticket_machine();
    let registration = machine.route_before_entering(
        Ticket::Closed,
        |current: Option<&Ticket>, _: &Ticket| -> Option<Ticket> {
            // Untriaged tickets get triaged instead of closed.
            (current == Some(&Ticket::Open)).then_some(Ticket::Triaged)
        },
    );

    assert_eq!(machine.try_transition(Ticket::Closed), Ok(Ticket::Triaged));
    let routed = machine.history().last().unwrap();
    assert_eq!(routed.requested, Ticket::Closed);
    assert_eq!(routed.to, Ticket::Triaged);

    machine.reset();
    registration.release();
    assert_eq!(machine.try_transition(Ticket::Closed), Ok(Ticket::Closed));
}

#[test]
fn routers_run_in_scope_order() {
    let log: Log = Arc::default();
    let mut machine = ticket_machine();

    let scopes = [
        "after-exiting",
        "edge",
        "global",
        "before-entering",
    ];
    let mut registrations: Vec<Registration> = Vec::new();
    for scope in scopes {
        let log = Arc::clone(&log);
        let router = move |_: Option<&Ticket>, _: &Ticket| -> Option<Ticket> {
            log.lock().unwrap().push(scope.to_string());
            None
        };
        let registration = match scope {
            "after-exiting" => machine.route_after_exiting(Ticket::Open, router),
            "edge" => machine.route_on_transition_between(Ticket::Open, Ticket::Triaged, router),
            "global" => machine.route_on_transition(router),
            _ => machine.route_before_entering(Ticket::Triaged, router),
        };
        registrations.push(registration);
    }

    machine.transition(Ticket::Triaged).unwrap();

    assert_eq!(*log.lock().unwrap(), scopes);
    assert!(registrations.iter().all(Registration::is_active));
}

#[test]
fn diverging_routers_reject_the_move() {
    let mut machine = ticket_machine();
    machine.route_on_transition(|_: Option<&Ticket>, next: &Ticket| -> Option<Ticket> {
        match next {
            Ticket::Triaged => Some(Ticket::Closed),
            Ticket::Closed => Some(Ticket::Triaged),
            _ => None,
        }
    });

    let err = machine.try_transition(Ticket::Triaged).unwrap_err();

    assert!(err.is_routing());
    assert!(matches!(err, TransitionError::RoutingDiverged { .. }));
    assert_eq!(machine.current_state(), Some(&Ticket::Open));
}

#[test]
fn routing_off_the_graph_is_rejected() {
    let mut machine = ticket_machine();
    machine.route_before_entering(Ticket::Triaged, |_: Option<&Ticket>, _: &Ticket| {
        Some(Ticket::Blocked)
    });

    assert!(matches!(
        machine.try_transition(Ticket::Triaged),
        Err(TransitionError::RoutedOffGraph {
            routed: Ticket::Blocked,
            ..
        })
    ));
    assert_eq!(machine.transition(Ticket::Triaged), Ok(false));
    assert_eq!(machine.transition_count(), 0);
}

#[test]
fn overlapping_sequence_fires_each_time() {
    state_enum! {
        enum Step {
            A,
            B,
        }
    }

    let matches: Arc<Mutex<Vec<Vec<Step>>>> = Arc::default();
    let sink = Arc::clone(&matches);
    let mut machine = StateMachine::new();
    machine.add_all_transitions(Step::ALL.iter().copied(), false);
    machine
        .on_sequence([Step::A, Step::B, Step::A], move |tail: &[Step]| -> HandlerResult {
            sink.lock().unwrap().push(tail.to_vec());
            Ok(())
        })
        .unwrap();

    for step in [Step::A, Step::B, Step::A, Step::B, Step::A] {
        assert_eq!(machine.transition(step), Ok(true));
    }

    let matches = matches.lock().unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m == &[Step::A, Step::B, Step::A]));
}

#[test]
fn empty_sequence_is_rejected() {
    let mut machine = ticket_machine();
    let result = machine.on_sequence(Vec::new(), |_: &[Ticket]| -> HandlerResult { Ok(()) });
    assert!(matches!(result, Err(MachineError::EmptyPattern)));
}

#[test]
fn reset_restores_initial_state() {
    let log: Log = Arc::default();
    let mut machine = ticket_machine();
    machine.transition(Ticket::Triaged).unwrap();
    machine.transition(Ticket::InProgress).unwrap();
    machine.on_entering(record(&log, "enter"));
    machine.on_exiting(record(&log, "exit"));

    machine.reset();

    assert_eq!(machine.current_state(), Some(&Ticket::Open));
    assert_eq!(machine.transition_count(), 0);
    assert!(machine.history().is_empty());
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(machine.transition(Ticket::Triaged), Ok(true));
}

#[test]
fn specific_exit_handler_runs_before_global() {
    let log: Log = Arc::default();
    let mut machine = ticket_machine();
    machine.on_exiting(record(&log, "exit"));
    machine.on_exiting_state(Ticket::Open, record(&log, "exit-open"));

    machine.transition(Ticket::Triaged).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["exit-open:Open", "exit:Open"]);
}

#[test]
fn full_dispatch_order() {
    let log: Log = Arc::default();
    let mut machine = ticket_machine();
    machine.on_exiting(record(&log, "exit"));
    machine.on_entering(record(&log, "enter"));
    let transitions = Arc::clone(&log);
    machine.on_transition(move |from: &Ticket, to: &Ticket| -> HandlerResult {
        transitions.lock().unwrap().push(format!("move:{from}->{to}"));
        Ok(())
    });
    let sequences = Arc::clone(&log);
    machine
        .on_sequence([Ticket::Triaged], move |_: &[Ticket]| -> HandlerResult {
            sequences.lock().unwrap().push("sequence".into());
            Ok(())
        })
        .unwrap();

    machine.transition(Ticket::Triaged).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["exit:Open", "enter:Triaged", "move:Open->Triaged", "sequence"]
    );
}

#[test]
fn handler_failure_reports_phase() {
    let mut machine = ticket_machine();
    machine.on_transition_between(
        Ticket::Triaged,
        Ticket::InProgress,
        |_: &Ticket, _: &Ticket| -> HandlerResult { Err(HandlerError::new("no assignee")) },
    );

    machine.transition(Ticket::Triaged).unwrap();
    let err = machine.transition(Ticket::InProgress).unwrap_err();

    assert_eq!(err.phase, Phase::Transition);
    assert!(err.committed());
    assert_eq!(err.to_string(), "transition handler failed: no assignee");
    assert_eq!(machine.current_state(), Some(&Ticket::InProgress));
}

#[test]
fn handler_releasing_another_mid_dispatch() {
    let log: Log = Arc::default();
    let mut machine = ticket_machine();
    let later: Arc<Mutex<Option<Registration>>> = Arc::default();

    let slot = Arc::clone(&later);
    machine.on_entering(move |_: &Ticket| -> HandlerResult {
        if let Some(registration) = slot.lock().unwrap().take() {
            registration.release();
        }
        Ok(())
    });
    let registration = machine.on_entering(record(&log, "later"));
    *later.lock().unwrap() = Some(registration.clone());

    machine.transition(Ticket::Triaged).unwrap();

    assert!(log.lock().unwrap().is_empty());
    assert!(!registration.is_active());
}

#[test]
fn initial_state_is_frozen_after_a_move() {
    let mut machine = ticket_machine();
    assert!(machine.set_initial_state(Ticket::Triaged).is_ok());
    assert_eq!(machine.current_state(), Some(&Ticket::Triaged));

    machine.transition(Ticket::InProgress).unwrap();

    assert!(matches!(
        machine.set_initial_state(Ticket::Open),
        Err(MachineError::InitialStateFrozen { transitions: 1 })
    ));
}

#[test]
fn config_limits_record_retention() {
    let mut machine = StateMachineBuilder::new()
        .initial(Ticket::InProgress)
        .transitions(Ticket::InProgress, [Ticket::Blocked])
        .transition(Ticket::Blocked, Ticket::InProgress)
        .config(MachineConfig {
            record_capacity: 2,
            ..MachineConfig::default()
        })
        .build()
        .unwrap();

    for _ in 0..3 {
        machine.transition(Ticket::Blocked).unwrap();
        machine.transition(Ticket::InProgress).unwrap();
    }

    let history = machine.history();
    assert_eq!(machine.transition_count(), 6);
    assert_eq!(history.len(), 2);
    assert_eq!(history.dropped(), 4);
    assert_eq!(history.last().map(|r| r.sequence), Some(6));
}

#[test]
fn config_deserializes_with_defaults() {
    let config: MachineConfig = serde_json::from_str(r#"{"max_routing_passes": 3}"#).unwrap();
    assert_eq!(config.max_routing_passes, Some(3));
    assert_eq!(config.record_capacity, MachineConfig::default().record_capacity);
}
