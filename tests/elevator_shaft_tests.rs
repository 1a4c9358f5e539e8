//! Elevator shaft dispatch tests

use arcology::simulation::{
    AgentId, CallDirection, Direction, ElevatorCar, ElevatorShaft, ElevatorState, ShaftId, SimId,
};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

fn agent(n: usize) -> AgentId {
    AgentId(SimId(n))
}

fn zone0_shaft() -> ElevatorShaft {
    ElevatorShaft::new(ShaftId::new("shaft_0"), 10, 0, 14)
}

/// Advance the shaft in 100ms steps
fn run(shaft: &mut ElevatorShaft, ms: u32) {
    for _ in 0..ms / 100 {
        shaft.update(100.0, 14);
    }
}

#[test]
fn test_new_shaft_covers_built_part_of_zone() {
    let shaft = zone0_shaft();
    assert_eq!(shaft.min_floor, 0);
    assert_eq!(shaft.max_floor, 14);
    assert_eq!(shaft.car.current_floor, 0);
    assert!(shaft.call_queue.is_empty());

    let short = ElevatorShaft::new(ShaftId::new("shaft_1"), 10, 1, 18);
    assert_eq!(short.min_floor, 15);
    assert_eq!(short.max_floor, 18);
    assert_eq!(short.car.current_floor, 15);

    // A zone above the building still spans its lobby floor
    let empty = ElevatorShaft::new(ShaftId::new("shaft_2"), 10, 2, 5);
    assert_eq!(empty.min_floor, 30);
    assert_eq!(empty.max_floor, 30);
}

#[test]
fn test_single_floor_hop() {
    let mut shaft = zone0_shaft();
    assert!(shaft.call_elevator(1, CallDirection::Up, agent(1)));

    // First tick dispatches: target set, doors open at the car's own floor
    shaft.update(100.0, 14);
    assert_eq!(shaft.car.state, ElevatorState::DoorsOpening);
    assert_eq!(shaft.car.current_floor, 0);
    assert_eq!(shaft.car.target_floor, Some(1));
    assert!(shaft.call_queue.is_empty());

    let mut elapsed = 0;
    while !(shaft.car.current_floor == 1 && shaft.car.state == ElevatorState::DoorsOpening) {
        shaft.update(100.0, 14);
        elapsed += 100;
        assert!(elapsed <= 10_000, "car never arrived");
    }
    assert_eq!(elapsed, 4000);

    // The waiting agent is loaded once the doors are open
    run(&mut shaft, 500);
    assert_eq!(shaft.car.state, ElevatorState::Loading);
    assert!(shaft.car.has_passenger(agent(1)));
    assert!(shaft.waiting_at(1).is_empty());
}

#[test]
fn test_idle_car_takes_oldest_call() {
    let mut shaft = zone0_shaft();
    shaft.car.current_floor = 5;
    shaft.call_elevator(9, CallDirection::Up, agent(1));
    shaft.call_elevator(6, CallDirection::Up, agent(2));

    shaft.update(1.0, 14);
    assert_eq!(shaft.car.target_floor, Some(9));
    assert_eq!(shaft.call_queue.len(), 1);
    assert_eq!(shaft.call_queue[0].floor, 6);
}

#[test]
fn test_moving_up_prefers_closest_call_ahead_in_same_direction() {
    let mut shaft = zone0_shaft();
    shaft.car.current_floor = 5;
    shaft.car.direction = Direction::Up;
    shaft.call_elevator(3, CallDirection::Down, agent(1));
    shaft.call_elevator(9, CallDirection::Up, agent(2));
    shaft.call_elevator(7, CallDirection::Down, agent(3));
    shaft.call_elevator(8, CallDirection::Up, agent(4));

    shaft.update(1.0, 14);
    assert_eq!(shaft.car.target_floor, Some(8));
    let remaining: Vec<i32> = shaft.call_queue.iter().map(|c| c.floor).collect();
    assert_eq!(remaining, vec![3, 9, 7]);
}

#[test]
fn test_moving_down_prefers_closest_call_below() {
    let mut shaft = zone0_shaft();
    shaft.car.current_floor = 10;
    shaft.car.direction = Direction::Down;
    shaft.call_elevator(12, CallDirection::Down, agent(1));
    shaft.call_elevator(4, CallDirection::Down, agent(2));
    shaft.call_elevator(7, CallDirection::Down, agent(3));
    shaft.call_elevator(6, CallDirection::Up, agent(4));

    shaft.update(1.0, 14);
    assert_eq!(shaft.car.target_floor, Some(7));
}

#[test]
fn test_no_call_ahead_falls_back_to_queue_head() {
    let mut shaft = zone0_shaft();
    shaft.car.current_floor = 5;
    shaft.car.direction = Direction::Up;
    shaft.call_elevator(3, CallDirection::Down, agent(1));
    shaft.call_elevator(2, CallDirection::Up, agent(2));
    shaft.call_elevator(9, CallDirection::Down, agent(3));

    shaft.update(1.0, 14);
    assert_eq!(shaft.car.target_floor, Some(3));
    assert_eq!(shaft.call_queue.len(), 2);
}

#[test]
fn test_call_at_car_floor_opens_doors_without_moving() {
    let mut shaft = zone0_shaft();
    shaft.call_elevator(0, CallDirection::Up, agent(1));
    shaft.update(100.0, 14);
    assert_eq!(shaft.car.state, ElevatorState::DoorsOpening);
    assert_eq!(shaft.car.target_floor, None);
    assert!(shaft.is_at_floor(0));

    run(&mut shaft, 500);
    assert!(shaft.car.has_passenger(agent(1)));
    run(&mut shaft, 1500);
    assert_eq!(shaft.car.state, ElevatorState::Idle);
    assert_eq!(shaft.car.current_floor, 0);
}

#[test]
fn test_call_boundaries() {
    let mut shaft = zone0_shaft();
    assert!(shaft.call_elevator(0, CallDirection::Up, agent(1)));
    assert!(shaft.call_elevator(14, CallDirection::Down, agent(2)));
    assert!(!shaft.call_elevator(15, CallDirection::Down, agent(3)));
    assert!(!shaft.call_elevator(-1, CallDirection::Up, agent(4)));
    assert_eq!(shaft.call_queue.len(), 2);
    assert!(shaft.waiting_at(15).is_empty());
}

#[test]
fn test_out_of_zone_call_is_declined() {
    let mut shaft = zone0_shaft();
    let before = shaft.call_queue.len();
    assert!(!shaft.call_elevator(20, CallDirection::Up, agent(1)));
    assert_eq!(shaft.call_queue.len(), before);
}

#[test]
fn test_calls_are_shared_per_floor_and_direction() {
    let mut shaft = zone0_shaft();
    shaft.call_elevator(4, CallDirection::Up, agent(1));
    shaft.call_elevator(4, CallDirection::Up, agent(2));
    shaft.call_elevator(4, CallDirection::Up, agent(1));
    shaft.call_elevator(4, CallDirection::Down, agent(3));

    assert_eq!(shaft.call_queue.len(), 2);
    assert_eq!(shaft.call_queue[0].requesting_agents, vec![agent(1), agent(2)]);
    assert!(shaft.has_call(4, CallDirection::Up));
    assert!(shaft.has_call(4, CallDirection::Down));
    assert!(!shaft.has_call(5, CallDirection::Up));
    assert_eq!(shaft.waiting_at(4), &[agent(1), agent(2), agent(3)]);
}

#[test]
fn test_full_car_leaves_rest_waiting() {
    let mut shaft = zone0_shaft();
    shaft.car = ElevatorCar::with_capacity(0, 2);
    for n in 1..=3 {
        shaft.call_elevator(0, CallDirection::Up, agent(n));
    }

    run(&mut shaft, 600);
    assert_eq!(shaft.car.state, ElevatorState::Loading);
    assert_eq!(shaft.car.passengers, vec![agent(1), agent(2)]);
    assert_eq!(shaft.waiting_at(0), &[agent(3)]);
}

#[test]
fn test_max_floor_only_grows_within_zone() {
    let mut shaft = ElevatorShaft::new(ShaftId::new("shaft_0"), 10, 0, 3);
    assert_eq!(shaft.max_floor, 3);
    assert!(!shaft.call_elevator(5, CallDirection::Up, agent(1)));

    shaft.update(1.0, 8);
    assert_eq!(shaft.max_floor, 8);
    assert!(shaft.call_elevator(5, CallDirection::Up, agent(1)));

    shaft.update(1.0, 5);
    assert_eq!(shaft.max_floor, 8);

    shaft.update(1.0, 40);
    assert_eq!(shaft.max_floor, 14);
}

#[test]
fn test_remove_resident_prunes_calls() {
    let mut shaft = zone0_shaft();
    shaft.call_elevator(3, CallDirection::Up, agent(1));
    shaft.call_elevator(3, CallDirection::Up, agent(2));
    shaft.call_elevator(5, CallDirection::Up, agent(1));
    shaft.call_elevator(6, CallDirection::Up, agent(3));

    shaft.remove_resident(agent(1));

    let floors: Vec<i32> = shaft.call_queue.iter().map(|c| c.floor).collect();
    assert_eq!(floors, vec![3, 6]);
    assert_eq!(shaft.call_queue[0].requesting_agents, vec![agent(2)]);
    assert_eq!(shaft.waiting_at(3), &[agent(2)]);
    assert!(shaft.waiting_at(5).is_empty());

    // Unknown agents are a no-op
    shaft.remove_resident(agent(99));
    assert_eq!(shaft.call_queue.len(), 2);
}

#[test]
fn test_remove_resident_leaves_car() {
    let mut shaft = zone0_shaft();
    shaft.call_elevator(0, CallDirection::Up, agent(1));
    run(&mut shaft, 600);
    assert!(shaft.car.has_passenger(agent(1)));

    shaft.remove_resident(agent(1));
    assert!(shaft.car.passengers.is_empty());
}

#[test]
fn test_wait_time_estimate() {
    let mut shaft = zone0_shaft();
    assert_eq!(shaft.wait_time(3), 6000.0);

    shaft.call_elevator(5, CallDirection::Up, agent(1));
    shaft.call_elevator(3, CallDirection::Up, agent(2));
    assert_eq!(shaft.wait_time(5), 10_000.0);
    assert_eq!(shaft.wait_time(3), 10_000.0);
    assert_eq!(shaft.wait_time(0), 8000.0);
}

#[test]
fn test_every_call_serviced_eventually() {
    let mut shaft = zone0_shaft();
    let floors = [7, 2, 12, 4, 9];
    for (n, floor) in floors.iter().enumerate() {
        shaft.call_elevator(*floor, CallDirection::Up, agent(n));
    }

    let mut visited = Vec::new();
    for _ in 0..2000 {
        shaft.update(100.0, 14);
        if shaft.car.state == ElevatorState::Loading && visited.last() != Some(&shaft.car.current_floor) {
            visited.push(shaft.car.current_floor);
        }
    }

    assert!(shaft.call_queue.is_empty());
    for floor in floors {
        assert!(visited.contains(&floor), "floor {} never served: {:?}", floor, visited);
    }
}

#[test]
fn test_random_calls_stay_within_range() {
    let mut rng = StdRng::seed_from_u64(0x5AF7);
    let mut shaft = ElevatorShaft::new(ShaftId::new("shaft_0"), 10, 0, 4);
    let mut top = 4;

    for _ in 0..2000 {
        match rng.random_range(0..4) {
            0 => {
                let floor = rng.random_range(-5..35);
                let direction = if rng.random_bool(0.5) {
                    CallDirection::Up
                } else {
                    CallDirection::Down
                };
                let accepted = shaft.call_elevator(floor, direction, agent(rng.random_range(0..20)));
                assert_eq!(accepted, floor >= shaft.min_floor && floor <= shaft.max_floor);
            }
            1 => shaft.remove_resident(agent(rng.random_range(0..20))),
            _ => {
                let previous_max = shaft.max_floor;
                top = (top + rng.random_range(0..2)).min(40);
                shaft.update(rng.random_range(50..500) as f32, top);
                assert!(shaft.max_floor >= previous_max);
                assert!(shaft.max_floor <= 14);
            }
        }

        for call in &shaft.call_queue {
            assert!(call.floor >= shaft.min_floor && call.floor <= shaft.max_floor);
        }
        assert!(shaft.car.passengers.len() <= shaft.car.capacity);
    }
}
