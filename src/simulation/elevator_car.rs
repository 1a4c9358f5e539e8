//! Elevator car state machine
//!
//! A car only knows its own floor, target and passengers. The shaft that owns
//! it decides where it goes next; the car just runs the door/load/travel
//! timings one tick at a time.

use serde::{Deserialize, Serialize};

use super::types::{AgentId, Direction, FLOOR_HEIGHT};

/// Time to travel one floor in milliseconds
pub const ELEVATOR_TRAVEL_TIME_PER_FLOOR: f32 = 2000.0;
/// Time for the doors to open or close in milliseconds
pub const DOOR_ANIMATION_TIME: f32 = 500.0;
/// Time the doors stay open for passengers in milliseconds
pub const LOADING_TIME: f32 = 1000.0;
/// Default maximum number of passengers
pub const ELEVATOR_CAPACITY: usize = 8;

/// What the car is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElevatorState {
    #[default]
    Idle,
    DoorsOpening,
    Loading,
    DoorsClosing,
    Moving,
}

/// The single car running in a shaft
#[derive(Debug, Clone)]
pub struct ElevatorCar {
    /// Floor the car occupies; the departure floor while moving
    pub current_floor: i32,
    /// Destination floor, `None` when the car has nowhere to go
    pub target_floor: Option<i32>,
    /// Agents inside the car in boarding order
    pub passengers: Vec<AgentId>,
    pub capacity: usize,
    pub state: ElevatorState,
    pub direction: Direction,
    /// Milliseconds spent in the current state
    pub state_timer: f32,
}

impl ElevatorCar {
    pub fn new(start_floor: i32) -> Self {
        Self::with_capacity(start_floor, ELEVATOR_CAPACITY)
    }

    pub fn with_capacity(start_floor: i32, capacity: usize) -> Self {
        Self {
            current_floor: start_floor,
            target_floor: None,
            passengers: Vec::new(),
            capacity,
            state: ElevatorState::Idle,
            direction: Direction::Idle,
            state_timer: 0.0,
        }
    }

    /// Advance the state machine by `delta_ms`
    ///
    /// The top floor is accepted for parity with the shaft update but the car
    /// itself never needs it.
    pub fn update(&mut self, delta_ms: f32, _top_floor: i32) {
        self.state_timer += delta_ms;

        match self.state {
            // Leaves only when the shaft opens the doors for a call
            ElevatorState::Idle => {}
            ElevatorState::DoorsOpening => {
                if self.state_timer >= DOOR_ANIMATION_TIME {
                    self.transition(ElevatorState::Loading);
                }
            }
            ElevatorState::Loading => {
                if self.state_timer >= LOADING_TIME {
                    self.transition(ElevatorState::DoorsClosing);
                }
            }
            ElevatorState::DoorsClosing => {
                if self.state_timer >= DOOR_ANIMATION_TIME {
                    match self.target_floor {
                        Some(target) if target != self.current_floor => {
                            self.direction = if target > self.current_floor {
                                Direction::Up
                            } else {
                                Direction::Down
                            };
                            self.transition(ElevatorState::Moving);
                        }
                        _ => self.go_idle(),
                    }
                }
            }
            ElevatorState::Moving => match (self.target_floor, self.travel_time()) {
                (Some(target), Some(travel_time)) => {
                    if self.state_timer >= travel_time {
                        self.current_floor = target;
                        self.target_floor = None;
                        self.transition(ElevatorState::DoorsOpening);
                    }
                }
                // Target cleared mid-trip
                _ => self.go_idle(),
            },
        }
    }

    fn transition(&mut self, state: ElevatorState) {
        self.state = state;
        self.state_timer = 0.0;
    }

    fn go_idle(&mut self) {
        self.target_floor = None;
        self.direction = Direction::Idle;
        self.transition(ElevatorState::Idle);
    }

    /// Start the door cycle at the current floor if the car is idle
    pub fn open_doors(&mut self) {
        if self.state == ElevatorState::Idle {
            self.transition(ElevatorState::DoorsOpening);
        }
    }

    /// Total time of the current trip, if there is one
    pub fn travel_time(&self) -> Option<f32> {
        self.target_floor.map(|target| {
            (target - self.current_floor).abs() as f32 * ELEVATOR_TRAVEL_TIME_PER_FLOOR
        })
    }

    /// Set the destination; a target equal to the current floor is ignored
    pub fn set_target_floor(&mut self, floor: i32) {
        if floor != self.current_floor {
            self.target_floor = Some(floor);
        }
    }

    pub fn can_accept_passengers(&self) -> bool {
        self.state == ElevatorState::Loading && self.passengers.len() < self.capacity
    }

    /// Board an agent. Only succeeds while loading and below capacity.
    pub fn add_passenger(&mut self, agent: AgentId) -> bool {
        if !self.can_accept_passengers() {
            return false;
        }
        if !self.passengers.contains(&agent) {
            self.passengers.push(agent);
        }
        true
    }

    pub fn remove_passenger(&mut self, agent: AgentId) {
        self.passengers.retain(|p| *p != agent);
    }

    pub fn has_passenger(&self, agent: AgentId) -> bool {
        self.passengers.contains(&agent)
    }

    /// Vertical offset of a floor relative to the ground line (negative is up)
    pub fn floor_offset(floor: i32) -> f32 {
        -(floor as f32) * FLOOR_HEIGHT
    }

    /// Vertical render offset, interpolated between floors while moving
    pub fn visual_y(&self) -> f32 {
        let start = Self::floor_offset(self.current_floor);
        match (self.state, self.target_floor, self.travel_time()) {
            (ElevatorState::Moving, Some(target), Some(travel_time)) if travel_time > 0.0 => {
                let progress = (self.state_timer / travel_time).clamp(0.0, 1.0);
                let end = Self::floor_offset(target);
                start + (end - start) * progress
            }
            _ => start,
        }
    }
}
