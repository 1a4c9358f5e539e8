//! Standalone tower simulation module
//!
//! This module contains the elevator network, the agents riding it and the
//! world that runs them. It can be driven headless from the console or from
//! tests without any rendering layer.

mod agent;
mod building;
mod elevator_car;
mod elevator_shaft;
mod elevator_system;
mod save;
mod stats;
mod time_system;
mod types;
mod world;
pub mod zones;

// Re-export public types for external use
pub use agent::{
    elevator_wait_stress, AgentKind, AgentUpdateResult, ArrivalAction, PathLeg, SimAgent,
    TravelState, TripStart, ARRIVAL_DISTANCE, EATING_DURATION_MS, EATING_STRESS_RELIEF,
    MAX_STRESS, WALK_SPEED,
};
pub use building::{Building, Room, RoomType, APARTMENT_CAPACITY, OFFICE_JOBS};
pub use elevator_car::{
    ElevatorCar, ElevatorState, DOOR_ANIMATION_TIME, ELEVATOR_CAPACITY,
    ELEVATOR_TRAVEL_TIME_PER_FLOOR, LOADING_TIME,
};
pub use elevator_shaft::{ElevatorCall, ElevatorShaft};
pub use elevator_system::ElevatorSystem;
pub use save::{ElevatorCarData, ElevatorSaveData, ElevatorShaftData, SAVE_VERSION};
pub use stats::SimStats;
pub use time_system::{
    DayOfWeek, DayPhase, ScheduleEvent, TimeEvent, TimeSystem, MS_PER_GAME_HOUR, SPEEDS,
};
pub use types::{
    floor_at_y, floor_y, grid_x, AgentId, CallDirection, Direction, Position, RoomId, ShaftId,
    SimId, FLOOR_HEIGHT, GRID_SIZE, GROUND_Y,
};
pub use world::SimWorld;
