//! Elevator save data tests

use arcology::simulation::{
    AgentId, AgentKind, CallDirection, Direction, ElevatorCarData, ElevatorSaveData,
    ElevatorShaftData, ElevatorState, ElevatorSystem, Position, RoomType, ShaftId, SimId,
    SimWorld, SAVE_VERSION,
};

fn agent(n: usize) -> AgentId {
    AgentId(SimId(n))
}

fn car_data(passenger_ids: Vec<AgentId>, capacity: usize) -> ElevatorCarData {
    ElevatorCarData {
        current_floor: 4,
        target_floor: Some(9),
        passenger_ids,
        capacity,
        state: ElevatorState::Moving,
        direction: Direction::Up,
    }
}

fn save_with(car: ElevatorCarData) -> ElevatorSaveData {
    ElevatorSaveData {
        version: SAVE_VERSION,
        shafts: vec![ElevatorShaftData {
            id: ShaftId::new("shaft_0"),
            position: 10,
            min_floor: 0,
            max_floor: 14,
            zone: 0,
            car,
        }],
    }
}

#[test]
fn test_snapshot_roundtrip_through_json() {
    let mut system = ElevatorSystem::with_top_floor(20);
    system.create_shaft(ShaftId::new("shaft_0"), 10, 0);
    system.create_shaft(ShaftId::new("shaft_1"), 12, 1);

    let json = system.to_json().expect("encode");
    let data = ElevatorSystem::from_json(&json).expect("decode");
    assert_eq!(data, system.snapshot());
    assert_eq!(data.version, SAVE_VERSION);

    let mut restored = ElevatorSystem::new();
    restored.restore(&data, |_| true).expect("restore");
    assert_eq!(restored.shaft_count(), 2);
    let high = restored.shaft(&ShaftId::new("shaft_1")).expect("shaft_1");
    assert_eq!((high.position, high.zone), (12, 1));
    assert_eq!((high.min_floor, high.max_floor), (15, 20));
    assert_eq!(high.car.current_floor, 15);
}

#[test]
fn test_json_field_names() {
    let json = serde_json::to_value(save_with(car_data(vec![agent(3)], 8))).expect("encode");
    let shaft = &json["shafts"][0];
    assert_eq!(shaft["id"], "shaft_0");
    assert_eq!(shaft["minFloor"], 0);
    assert_eq!(shaft["maxFloor"], 14);

    let car = &shaft["car"];
    assert_eq!(car["currentFloor"], 4);
    assert_eq!(car["targetFloor"], 9);
    assert_eq!(car["passengerIds"], serde_json::json!([3]));
    assert_eq!(car["state"], "MOVING");
    assert_eq!(car["direction"], "up");
}

#[test]
fn test_restored_car_is_at_rest() {
    let mut system = ElevatorSystem::new();
    system
        .restore(&save_with(car_data(vec![agent(1), agent(2)], 8)), |_| true)
        .expect("restore");

    let car = &system.shaft(&ShaftId::new("shaft_0")).expect("shaft").car;
    assert_eq!(car.current_floor, 4);
    assert_eq!(car.target_floor, None);
    assert_eq!(car.state, ElevatorState::Idle);
    assert_eq!(car.direction, Direction::Idle);
    assert_eq!(car.passengers, vec![agent(1), agent(2)]);
}

#[test]
fn test_unknown_and_excess_passengers_are_dropped() {
    let data = save_with(car_data(vec![agent(1), agent(7), agent(1), agent(2), agent(3)], 2));
    let mut system = ElevatorSystem::new();
    system
        .restore(&data, |id| id != agent(7))
        .expect("restore");

    let car = &system.shaft(&ShaftId::new("shaft_0")).expect("shaft").car;
    assert_eq!(car.passengers, vec![agent(1), agent(2)]);
}

#[test]
fn test_bad_save_leaves_registry_untouched() {
    let mut system = ElevatorSystem::with_top_floor(5);
    system.create_shaft(ShaftId::new("shaft_a"), 3, 0);

    let mut wrong_version = save_with(car_data(Vec::new(), 8));
    wrong_version.version = SAVE_VERSION + 1;
    assert!(system.restore(&wrong_version, |_| true).is_err());

    let mut empty_range = save_with(car_data(Vec::new(), 8));
    empty_range.shafts[0].min_floor = 20;
    assert!(system.restore(&empty_range, |_| true).is_err());

    assert!(system.restore(&save_with(car_data(Vec::new(), 0)), |_| true).is_err());

    assert_eq!(system.shaft_count(), 1);
    assert!(system.shaft(&ShaftId::new("shaft_a")).is_some());
}

#[test]
fn test_garbage_json_is_an_error() {
    assert!(ElevatorSystem::from_json("not json").is_err());
    assert!(ElevatorSystem::from_json(r#"{"version": 1}"#).is_err());
}

#[test]
fn test_restore_drops_pending_calls() {
    let mut system = ElevatorSystem::with_top_floor(10);
    system.create_shaft(ShaftId::new("shaft_0"), 10, 0);
    system.call_elevator(6, CallDirection::Down, agent(1));

    let data = system.snapshot();
    system.restore(&data, |_| true).expect("restore");
    let shaft = system.shaft(&ShaftId::new("shaft_0")).expect("shaft");
    assert!(shaft.call_queue.is_empty());
    assert!(shaft.waiting_at(6).is_empty());
}

#[test]
fn test_world_restore_resolves_passengers_against_agents() {
    let mut world = SimWorld::new_with_seed(3);
    world.move_in_chance = 0.0;
    world.add_room(RoomType::Lobby, 0, 0).expect("lobby");
    world.add_room(RoomType::Apartment, 4, 0).expect("apartment");
    let rider = world.spawn_agent(AgentKind::Resident, Position::default());

    let mut data = world.elevators.snapshot();
    data.shafts[0].car.passenger_ids = vec![rider, agent(99)];
    let json = serde_json::to_string(&data).expect("encode");

    world.restore_elevators(&json).expect("restore");
    let car = &world.elevators.shaft(&ShaftId::new("shaft_0")).expect("shaft").car;
    assert_eq!(car.passengers, vec![rider]);

    assert!(world.restore_elevators("{").is_err());
    assert_eq!(world.elevators.shaft_count(), 1);
}
