//! Elevator shaft: one car, one zone, one call queue
//!
//! The shaft owns the hall calls for its zone and decides which one the car
//! serves next. It also keeps per-floor waiting lists so agents standing at a
//! landing are loaded while the car's doors are open.

use log::{debug, warn};
use std::collections::BTreeMap;

use super::elevator_car::{ElevatorCar, ElevatorState, ELEVATOR_TRAVEL_TIME_PER_FLOOR};
use super::types::{AgentId, CallDirection, Direction, ShaftId};
use super::zones::{zone_max_floor, zone_min_floor};

/// A pending request for service at one floor in one direction
#[derive(Debug, Clone, PartialEq)]
pub struct ElevatorCall {
    pub floor: i32,
    pub direction: CallDirection,
    /// Shaft clock (ms) when the call was first made
    pub timestamp_ms: f64,
    /// Agents sharing this call, without duplicates
    pub requesting_agents: Vec<AgentId>,
}

/// An elevator shaft serving a single zone
#[derive(Debug, Clone)]
pub struct ElevatorShaft {
    pub id: ShaftId,
    /// Horizontal grid coordinate
    pub position: i32,
    pub zone: i32,
    pub min_floor: i32,
    pub max_floor: i32,
    pub car: ElevatorCar,
    pub call_queue: Vec<ElevatorCall>,
    /// Floor -> agents waiting at that landing, in arrival order
    waiting_agents: BTreeMap<i32, Vec<AgentId>>,
    /// Milliseconds this shaft has been running, used to stamp calls
    elapsed_ms: f64,
}

impl ElevatorShaft {
    /// Create a shaft whose range covers the built part of `zone`
    ///
    /// The car starts at the zone's lowest floor.
    pub fn new(id: ShaftId, position: i32, zone: i32, building_top_floor: i32) -> Self {
        let min_floor = zone_min_floor(zone);
        let max_floor = building_top_floor.clamp(min_floor, zone_max_floor(zone));

        Self {
            id,
            position,
            zone,
            min_floor,
            max_floor,
            car: ElevatorCar::new(min_floor),
            call_queue: Vec::new(),
            waiting_agents: BTreeMap::new(),
            elapsed_ms: 0.0,
        }
    }

    /// Rebuild a shaft from saved bounds around an existing car
    pub(crate) fn from_parts(
        id: ShaftId,
        position: i32,
        zone: i32,
        min_floor: i32,
        max_floor: i32,
        car: ElevatorCar,
    ) -> Self {
        Self {
            id,
            position,
            zone,
            min_floor,
            max_floor,
            car,
            call_queue: Vec::new(),
            waiting_agents: BTreeMap::new(),
            elapsed_ms: 0.0,
        }
    }

    /// Advance the shaft by one tick
    pub fn update(&mut self, delta_ms: f32, building_top_floor: i32) {
        self.elapsed_ms += delta_ms as f64;
        self.extend_range(building_top_floor);
        self.car.update(delta_ms, building_top_floor);
        self.process_calls();
    }

    /// Grow the serviceable range towards the building's top floor
    ///
    /// The range only ever grows, and never past the zone.
    pub fn extend_range(&mut self, building_top_floor: i32) {
        self.max_floor = self
            .max_floor
            .max(building_top_floor)
            .clamp(self.min_floor, zone_max_floor(self.zone));
    }

    fn process_calls(&mut self) {
        let can_dispatch = match self.car.state {
            ElevatorState::Idle => true,
            ElevatorState::DoorsOpening => self.car.target_floor.is_none(),
            _ => false,
        };

        if can_dispatch {
            if let Some(call) = self.find_next_call() {
                debug!(
                    "{}: serving call at floor {} ({:?}) from floor {}",
                    self.id, call.floor, call.direction, self.car.current_floor
                );
                self.car.set_target_floor(call.floor);
                self.car.open_doors();
            }
        }

        if self.car.state == ElevatorState::Loading {
            self.load_waiting_agents();
        }
    }

    /// Pick and remove the next call to serve
    ///
    /// A freshly idle car takes the oldest call. A travelling car prefers the
    /// closest call ahead of it in its own direction, and otherwise falls back
    /// to the oldest call, reversing if need be.
    fn find_next_call(&mut self) -> Option<ElevatorCall> {
        if self.call_queue.is_empty() {
            return None;
        }

        let current = self.car.current_floor;
        let direction = self.car.direction;
        if direction == Direction::Idle {
            return Some(self.call_queue.remove(0));
        }

        // min_by_key keeps the first of equally close calls, i.e. queue order
        let ahead = self
            .call_queue
            .iter()
            .enumerate()
            .filter(|(_, call)| {
                let is_ahead = match direction {
                    Direction::Up => call.floor > current,
                    Direction::Down => call.floor < current,
                    Direction::Idle => false,
                };
                is_ahead && direction.matches(call.direction)
            })
            .min_by_key(|(_, call)| (call.floor - current).abs())
            .map(|(index, _)| index);

        Some(self.call_queue.remove(ahead.unwrap_or(0)))
    }

    /// Move agents waiting at the car's floor into the car, oldest first
    fn load_waiting_agents(&mut self) {
        let floor = self.car.current_floor;
        let Some(waiting) = self.waiting_agents.get_mut(&floor) else {
            return;
        };

        let car = &mut self.car;
        // Agents that do not fit stay queued for the next stop here
        waiting.retain(|agent| !car.add_passenger(*agent));

        if waiting.is_empty() {
            self.waiting_agents.remove(&floor);
        }
    }

    /// Whether a call at `floor` would be accepted by this shaft
    pub fn serves_floor(&self, floor: i32) -> bool {
        floor >= self.min_floor && floor <= self.max_floor
    }

    /// Register a hall call. Returns false when the floor is outside the zone.
    pub fn call_elevator(&mut self, floor: i32, direction: CallDirection, agent: AgentId) -> bool {
        if !self.serves_floor(floor) {
            warn!(
                "Cannot call elevator on floor {} - outside zone {} (floors {}-{})",
                floor, self.zone, self.min_floor, self.max_floor
            );
            return false;
        }

        match self
            .call_queue
            .iter_mut()
            .find(|call| call.floor == floor && call.direction == direction)
        {
            Some(call) => {
                if !call.requesting_agents.contains(&agent) {
                    call.requesting_agents.push(agent);
                }
            }
            None => self.call_queue.push(ElevatorCall {
                floor,
                direction,
                timestamp_ms: self.elapsed_ms,
                requesting_agents: vec![agent],
            }),
        }

        let waiting = self.waiting_agents.entry(floor).or_default();
        if !waiting.contains(&agent) {
            waiting.push(agent);
        }

        true
    }

    /// Whether the car is stopped at `floor` with its doors opening or open
    pub fn is_at_floor(&self, floor: i32) -> bool {
        self.car.current_floor == floor
            && matches!(
                self.car.state,
                ElevatorState::Loading | ElevatorState::DoorsOpening
            )
    }

    /// Whether a call is pending at `floor` in `direction`
    pub fn has_call(&self, floor: i32, direction: CallDirection) -> bool {
        self.call_queue
            .iter()
            .any(|call| call.floor == floor && call.direction == direction)
    }

    /// Rough estimate of the wait at `floor` in milliseconds
    ///
    /// Travel time from the car to the floor plus two floors' worth of travel
    /// per call ahead in the queue. A floor with no pending call is estimated
    /// as if its call joined the back of the queue.
    pub fn wait_time(&self, floor: i32) -> f32 {
        let travel = (self.car.current_floor - floor).abs() as f32 * ELEVATOR_TRAVEL_TIME_PER_FLOOR;
        let queue_position = self
            .call_queue
            .iter()
            .position(|call| call.floor == floor)
            .unwrap_or(self.call_queue.len());

        travel + queue_position as f32 * ELEVATOR_TRAVEL_TIME_PER_FLOOR * 2.0
    }

    /// Agents waiting at a landing
    pub fn waiting_at(&self, floor: i32) -> &[AgentId] {
        self.waiting_agents
            .get(&floor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Forget an agent everywhere in this shaft
    ///
    /// Calls survive as long as another agent still needs them.
    pub fn remove_resident(&mut self, agent: AgentId) {
        self.car.remove_passenger(agent);

        self.waiting_agents.retain(|_, waiting| {
            waiting.retain(|a| *a != agent);
            !waiting.is_empty()
        });

        self.call_queue.retain_mut(|call| {
            let before = call.requesting_agents.len();
            call.requesting_agents.retain(|a| *a != agent);
            call.requesting_agents.len() == before || !call.requesting_agents.is_empty()
        });
    }
}
