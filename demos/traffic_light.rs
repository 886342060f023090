//! Traffic Light State Machine
//!
//! This demo drives a cyclic state machine with handlers and a router.
//!
//! Key concepts:
//! - Cyclic state transitions (states repeat)
//! - Entry handlers announcing each light
//! - A router diverting to a flashing light during maintenance
//! - Sequence detection counting completed cycles
//!
//! Run with: cargo run --example traffic_light

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use switchyard::{state_enum, HandlerResult, StateMachineBuilder};

state_enum! {
    enum TrafficLight {
        Red,
        Yellow,
        Green,
        FlashingRed,
    }
}

fn main() {
    println!("=== Traffic Light State Machine ===\n");

    let mut machine = StateMachineBuilder::new()
        .initial(TrafficLight::Red)
        .transition(TrafficLight::Red, TrafficLight::Green)
        .transition(TrafficLight::Green, TrafficLight::Yellow)
        .transition(TrafficLight::Yellow, TrafficLight::Red)
        .transition(TrafficLight::Red, TrafficLight::FlashingRed)
        .transition(TrafficLight::FlashingRed, TrafficLight::Red)
        .build()
        .unwrap();

    machine.on_entering(|light: &TrafficLight| -> HandlerResult {
        println!("  light is now {light}");
        Ok(())
    });

    let maintenance = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&maintenance);
    machine.route_before_entering(
        TrafficLight::Green,
        move |_: Option<&TrafficLight>, _: &TrafficLight| -> Option<TrafficLight> {
            flag.load(Ordering::SeqCst).then_some(TrafficLight::FlashingRed)
        },
    );

    let cycles = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&cycles);
    machine
        .on_sequence(
            [TrafficLight::Green, TrafficLight::Yellow, TrafficLight::Red],
            move |_: &[TrafficLight]| -> HandlerResult {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .unwrap();

    println!("Initial state: {:?}\n", machine.current_state());

    println!("Two normal cycles:");
    for _ in 0..2 {
        for light in [TrafficLight::Green, TrafficLight::Yellow, TrafficLight::Red] {
            machine.transition(light).unwrap();
        }
    }

    println!("\nRed -> Yellow is not allowed:");
    let moved = machine.transition(TrafficLight::Yellow).unwrap();
    println!("  moved: {moved}");

    println!("\nMaintenance mode diverts Green to FlashingRed:");
    maintenance.store(true, Ordering::SeqCst);
    let entered = machine.try_transition(TrafficLight::Green).unwrap();
    println!("  requested Green, entered {entered}");
    maintenance.store(false, Ordering::SeqCst);
    machine.transition(TrafficLight::Red).unwrap();

    println!("\nCompleted cycles: {}", cycles.load(Ordering::SeqCst));
    println!("Transitions: {}", machine.transition_count());
    let path: Vec<String> = machine
        .history()
        .get_path()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    println!("Path: {}", path.join(" -> "));

    println!("\n=== Demo Complete ===");
}
