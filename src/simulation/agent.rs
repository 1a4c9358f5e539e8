//! Autonomous agents and their transport state machine
//!
//! An agent never blocks. Every trip is a sequence of travel states advanced
//! once per tick, polling the shaft and car it depends on.

use log::{debug, warn};

use super::building::{Building, Room};
use super::elevator_car::ElevatorState;
use super::elevator_system::ElevatorSystem;
use super::time_system::MS_PER_GAME_HOUR;
use super::types::{
    floor_at_y, floor_y, grid_x, AgentId, CallDirection, Position, RoomId, ShaftId, GROUND_Y,
};
use super::zones::{transfer_floor, zone_of};

/// Walking speed in pixels per second
pub const WALK_SPEED: f32 = 100.0;
/// Distance at which a walker counts as arrived
pub const ARRIVAL_DISTANCE: f32 = 5.0;
pub const MAX_STRESS: f32 = 100.0;
/// How long a meal takes in milliseconds
pub const EATING_DURATION_MS: f32 = MS_PER_GAME_HOUR / 2.0;
/// Stress relieved by finishing a meal
pub const EATING_STRESS_RELIEF: f32 = 10.0;

/// What an agent is in the building for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Lives in an apartment, may also hold a job
    Resident,
    /// Commutes in from the lobby for the working day
    OfficeWorker,
}

/// Activity started when a walk ends at its room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalAction {
    StartWorking,
    StartEating,
    StartSleeping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelState {
    #[default]
    Idle,
    Walking,
    WalkingToElevator,
    WaitingForElevator,
    RidingElevator,
    Working,
    Eating,
    Sleeping,
}

/// Leg of a cross-zone journey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathLeg {
    /// Riding the home zone's shaft to the sky lobby
    First,
    /// Changing shafts at the sky lobby
    Transfer,
    /// Riding the destination zone's shaft
    Final,
}

/// How a trip was started by [`SimAgent::go_to_room`]
#[derive(Debug, Clone, PartialEq)]
pub enum TripStart {
    /// Destination is on the current floor
    Walk,
    /// A call was placed on this shaft
    Elevator(ShaftId),
    /// No shaft could take the call, so the agent walks straight to the room
    FallbackWalk,
}

/// Result of an agent update indicating what the world should act on
#[derive(Debug, Clone, PartialEq)]
pub enum AgentUpdateResult {
    Continue,
    /// A walk ended at its room; the arrival action has already been applied
    ArrivedAtRoom(Option<RoomId>),
    BoardedElevator { shaft: ShaftId, waited_ms: f64 },
    /// First leg finished and the second leg's call was placed
    ReachedTransferFloor { floor: i32 },
    /// Mid-trip the elevator route ran out and the agent walks the rest
    FellBackToWalking,
    /// A room or shaft the trip relied on disappeared
    TripAbandoned,
    FinishedEating,
}

/// Stress added when boarding after waiting `wait_ms`
pub fn elevator_wait_stress(wait_ms: f64) -> f32 {
    if wait_ms > 120_000.0 {
        20.0
    } else if wait_ms > 60_000.0 {
        10.0
    } else if wait_ms > 30_000.0 {
        5.0
    } else {
        0.0
    }
}

/// An autonomous agent in the tower
#[derive(Debug, Clone)]
pub struct SimAgent {
    pub id: AgentId,
    pub name: String,
    pub kind: AgentKind,
    pub position: Position,
    /// 0 (calm) to 100
    pub stress: f32,
    pub home: Option<RoomId>,
    pub job: Option<RoomId>,

    pub travel_state: TravelState,
    pub walk_target: Option<Position>,
    pub on_arrival: Option<ArrivalAction>,
    pub target_room: Option<RoomId>,
    pub elevator_shaft: Option<ShaftId>,
    pub path_leg: Option<PathLeg>,
    pub sky_lobby_transfer_floor: Option<i32>,
    /// Simulation clock (ms) when the agent reached the landing
    pub elevator_wait_start_ms: Option<f64>,
    /// Time spent in the current activity
    pub activity_timer: f32,
}

impl SimAgent {
    pub fn new(id: AgentId, name: impl Into<String>, kind: AgentKind, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            position,
            stress: 0.0,
            home: None,
            job: None,
            travel_state: TravelState::Idle,
            walk_target: None,
            on_arrival: None,
            target_room: None,
            elevator_shaft: None,
            path_leg: None,
            sky_lobby_transfer_floor: None,
            elevator_wait_start_ms: None,
            activity_timer: 0.0,
        }
    }

    pub fn current_floor(&self) -> i32 {
        floor_at_y(self.position.y)
    }

    pub fn is_idle(&self) -> bool {
        self.travel_state == TravelState::Idle
    }

    /// Whether the agent is somewhere between leaving and arriving
    pub fn is_travelling(&self) -> bool {
        matches!(
            self.travel_state,
            TravelState::Walking
                | TravelState::WalkingToElevator
                | TravelState::WaitingForElevator
                | TravelState::RidingElevator
        )
    }

    pub fn add_stress(&mut self, amount: f32) {
        self.stress = (self.stress + amount).clamp(0.0, MAX_STRESS);
    }

    /// One-off frustration penalty for a wait that just ended in boarding
    pub fn apply_elevator_wait_stress(&mut self, wait_ms: f64) -> f32 {
        let stress = elevator_wait_stress(wait_ms);
        if stress > 0.0 {
            self.add_stress(stress);
            debug!("{} waited {:.0}ms for an elevator (+{} stress)", self.name, wait_ms, stress);
        }
        stress
    }

    fn clear_route(&mut self) {
        self.walk_target = None;
        self.elevator_shaft = None;
        self.path_leg = None;
        self.sky_lobby_transfer_floor = None;
        self.elevator_wait_start_ms = None;
    }

    /// Start a trip to `room`, replacing any trip in progress
    pub fn go_to_room(
        &mut self,
        room: &Room,
        on_arrival: Option<ArrivalAction>,
        elevators: &mut ElevatorSystem,
    ) -> TripStart {
        // Drop any stale landing registration from an abandoned trip
        if self.elevator_shaft.is_some() {
            elevators.remove_resident(self.id);
        }
        self.clear_route();
        self.target_room = Some(room.id);
        self.on_arrival = on_arrival;
        self.activity_timer = 0.0;

        let current_floor = self.current_floor();
        if current_floor == room.floor {
            self.walk_to(room.world_position());
            return TripStart::Walk;
        }

        let current_zone = zone_of(current_floor);
        let target_zone = zone_of(room.floor);

        let leg_destination = match transfer_floor(current_zone, target_zone) {
            Some(transfer) if transfer == current_floor => {
                // Already standing in the sky lobby
                self.path_leg = Some(PathLeg::Transfer);
                return match self.continue_to_next_zone(room, elevators) {
                    Some(shaft) => TripStart::Elevator(shaft),
                    None => TripStart::FallbackWalk,
                };
            }
            Some(transfer) => {
                self.path_leg = Some(PathLeg::First);
                self.sky_lobby_transfer_floor = Some(transfer);
                transfer
            }
            None => room.floor,
        };

        let direction = CallDirection::between(current_floor, leg_destination);
        match elevators.call_elevator(current_floor, direction, self.id) {
            Some(shaft_id) => {
                let Some(shaft) = elevators.shaft(&shaft_id) else {
                    self.fall_back_to_walking(room);
                    return TripStart::FallbackWalk;
                };
                self.walk_target = Some(Position::new(
                    grid_x(shaft.position),
                    floor_y(current_floor),
                ));
                self.elevator_shaft = Some(shaft_id.clone());
                self.travel_state = TravelState::WalkingToElevator;
                TripStart::Elevator(shaft_id)
            }
            None => {
                warn!(
                    "{} found no elevator on floor {}, walking to {}",
                    self.name, current_floor, room.id
                );
                self.fall_back_to_walking(room);
                TripStart::FallbackWalk
            }
        }
    }

    /// Walk straight to a room, ignoring floors
    fn fall_back_to_walking(&mut self, room: &Room) {
        self.clear_route();
        self.walk_to(room.world_position());
    }

    fn walk_to(&mut self, target: Position) {
        self.walk_target = Some(target);
        self.travel_state = TravelState::Walking;
    }

    /// Second leg from the sky lobby into the destination zone
    ///
    /// Returns the shaft that took the call, or `None` after falling back to
    /// walking.
    fn continue_to_next_zone(
        &mut self,
        room: &Room,
        elevators: &mut ElevatorSystem,
    ) -> Option<ShaftId> {
        let sky_floor = self.current_floor();
        let target_zone = zone_of(room.floor);

        let accepted = elevators.shaft_id_for_zone(target_zone).filter(|shaft_id| {
            let direction = CallDirection::between(sky_floor, room.floor);
            elevators.call_shaft(shaft_id, sky_floor, direction, self.id)
        });
        let Some(shaft_id) = accepted else {
            warn!(
                "{} cannot continue from sky lobby {} into zone {}, walking to {}",
                self.name, sky_floor, target_zone, room.id
            );
            self.fall_back_to_walking(room);
            return None;
        };

        let shaft_x = elevators
            .shaft(&shaft_id)
            .map(|shaft| grid_x(shaft.position))
            .unwrap_or(self.position.x);

        self.path_leg = Some(PathLeg::Final);
        self.sky_lobby_transfer_floor = None;
        self.elevator_shaft = Some(shaft_id.clone());
        self.walk_target = Some(Position::new(shaft_x, floor_y(sky_floor)));
        self.travel_state = TravelState::WalkingToElevator;
        Some(shaft_id)
    }

    /// Give up the current trip and stand still
    fn abandon_trip(&mut self, elevators: &mut ElevatorSystem) -> AgentUpdateResult {
        warn!("{} abandoned its trip in state {:?}", self.name, self.travel_state);
        elevators.remove_resident(self.id);
        self.clear_route();
        self.target_room = None;
        self.on_arrival = None;
        self.travel_state = TravelState::Idle;
        AgentUpdateResult::TripAbandoned
    }

    /// Step towards the walk target; true once arrived
    fn step_walk(&mut self, delta_ms: f32, target: Position) -> bool {
        let step = WALK_SPEED * delta_ms / 1000.0;
        self.position = self.position.move_towards(&target, step);
        if self.position.distance(&target) < ARRIVAL_DISTANCE {
            self.position = target;
            return true;
        }
        false
    }

    fn start_activity(&mut self, action: ArrivalAction) {
        self.activity_timer = 0.0;
        self.travel_state = match action {
            ArrivalAction::StartWorking => TravelState::Working,
            ArrivalAction::StartEating => TravelState::Eating,
            ArrivalAction::StartSleeping => TravelState::Sleeping,
        };
    }

    /// Advance the agent by one tick
    ///
    /// `now_ms` is the simulation clock used to time elevator waits. The
    /// elevator registry must already have been updated this tick.
    pub fn update(
        &mut self,
        delta_ms: f32,
        now_ms: f64,
        building: &Building,
        elevators: &mut ElevatorSystem,
    ) -> AgentUpdateResult {
        // Destination demolished mid-trip
        if self.is_travelling() && self.target_room.is_some_and(|id| building.room(id).is_none()) {
            return self.abandon_trip(elevators);
        }

        match self.travel_state {
            TravelState::Idle | TravelState::Working | TravelState::Sleeping => {
                AgentUpdateResult::Continue
            }
            TravelState::Eating => {
                self.activity_timer += delta_ms;
                if self.activity_timer >= EATING_DURATION_MS {
                    self.add_stress(-EATING_STRESS_RELIEF);
                    self.activity_timer = 0.0;
                    self.travel_state = TravelState::Idle;
                    return AgentUpdateResult::FinishedEating;
                }
                AgentUpdateResult::Continue
            }
            TravelState::Walking => {
                let Some(target) = self.walk_target else {
                    return self.abandon_trip(elevators);
                };
                if !self.step_walk(delta_ms, target) {
                    return AgentUpdateResult::Continue;
                }
                self.walk_target = None;
                match self.on_arrival.take() {
                    Some(action) => self.start_activity(action),
                    None => self.travel_state = TravelState::Idle,
                }
                AgentUpdateResult::ArrivedAtRoom(self.target_room.take())
            }
            TravelState::WalkingToElevator => {
                let Some(target) = self.walk_target else {
                    return self.abandon_trip(elevators);
                };
                if self.step_walk(delta_ms, target) {
                    self.walk_target = None;
                    self.elevator_wait_start_ms = Some(now_ms);
                    self.travel_state = TravelState::WaitingForElevator;
                }
                AgentUpdateResult::Continue
            }
            TravelState::WaitingForElevator => self.update_waiting(now_ms, building, elevators),
            TravelState::RidingElevator => self.update_riding(building, elevators),
        }
    }

    /// Floor the active leg ends on
    fn leg_destination(&self, room: &Room) -> i32 {
        match (self.path_leg, self.sky_lobby_transfer_floor) {
            (Some(PathLeg::First), Some(transfer)) => transfer,
            _ => room.floor,
        }
    }

    fn update_waiting(
        &mut self,
        now_ms: f64,
        building: &Building,
        elevators: &mut ElevatorSystem,
    ) -> AgentUpdateResult {
        let (Some(shaft_id), Some(room)) = (
            self.elevator_shaft.clone(),
            self.target_room.and_then(|id| building.room(id)),
        ) else {
            return self.abandon_trip(elevators);
        };
        if self.path_leg == Some(PathLeg::First) && self.sky_lobby_transfer_floor.is_none() {
            return self.abandon_trip(elevators);
        }

        let floor = self.current_floor();
        let destination = self.leg_destination(room);
        let direction = CallDirection::between(floor, destination);

        let Some(shaft) = elevators.shaft_mut(&shaft_id) else {
            return self.abandon_trip(elevators);
        };

        let at_floor = shaft.is_at_floor(floor);
        let aboard = shaft.car.has_passenger(self.id);

        if at_floor && (aboard || shaft.car.can_accept_passengers()) {
            let boarded = aboard || shaft.car.add_passenger(self.id);
            if boarded {
                shaft.car.set_target_floor(destination);
                let waited_ms = self
                    .elevator_wait_start_ms
                    .map(|start| (now_ms - start).max(0.0))
                    .unwrap_or(0.0);
                self.apply_elevator_wait_stress(waited_ms);
                self.elevator_wait_start_ms = None;
                self.travel_state = TravelState::RidingElevator;
                debug!(
                    "{} boarded {} at floor {} heading for {}",
                    self.name, shaft_id, floor, destination
                );
                return AgentUpdateResult::BoardedElevator {
                    shaft: shaft_id,
                    waited_ms,
                };
            }
            return AgentUpdateResult::Continue;
        }

        if aboard {
            // Loaded while still walking up and then carried away
            shaft.car.remove_passenger(self.id);
            shaft.call_elevator(floor, direction, self.id);
        } else if !at_floor
            && !shaft.has_call(floor, direction)
            && shaft.car.target_floor != Some(floor)
        {
            // Call was served without room for us
            if shaft.serves_floor(floor) {
                shaft.call_elevator(floor, direction, self.id);
            } else {
                warn!("{} is waiting where {} does not stop", self.name, shaft_id);
                self.fall_back_to_walking(room);
                return AgentUpdateResult::FellBackToWalking;
            }
        }

        AgentUpdateResult::Continue
    }

    fn update_riding(
        &mut self,
        building: &Building,
        elevators: &mut ElevatorSystem,
    ) -> AgentUpdateResult {
        let (Some(shaft_id), Some(room)) = (
            self.elevator_shaft.clone(),
            self.target_room.and_then(|id| building.room(id)),
        ) else {
            return self.abandon_trip(elevators);
        };
        if self.path_leg == Some(PathLeg::First) && self.sky_lobby_transfer_floor.is_none() {
            return self.abandon_trip(elevators);
        }
        let destination = self.leg_destination(room);

        let arrived = {
            let Some(shaft) = elevators.shaft_mut(&shaft_id) else {
                return self.abandon_trip(elevators);
            };
            if !shaft.car.has_passenger(self.id) {
                return self.abandon_trip(elevators);
            }

            self.position = Position::new(grid_x(shaft.position), GROUND_Y + shaft.car.visual_y());

            let car = &mut shaft.car;
            let stopped = matches!(
                car.state,
                ElevatorState::Loading | ElevatorState::DoorsOpening
            );
            if stopped && car.current_floor == destination {
                car.remove_passenger(self.id);
                true
            } else {
                // A car must not go idle while we are still aboard
                if car.target_floor.is_none()
                    && matches!(car.state, ElevatorState::Loading | ElevatorState::Idle)
                {
                    car.set_target_floor(destination);
                    car.open_doors();
                }
                false
            }
        };

        if !arrived {
            return AgentUpdateResult::Continue;
        }

        self.position.y = floor_y(destination);
        if self.path_leg == Some(PathLeg::First) {
            debug!("{} reached sky lobby {}", self.name, destination);
            self.elevator_shaft = None;
            self.path_leg = Some(PathLeg::Transfer);
            return match self.continue_to_next_zone(room, elevators) {
                Some(_) => AgentUpdateResult::ReachedTransferFloor { floor: destination },
                None => AgentUpdateResult::FellBackToWalking,
            };
        }

        debug!("{} left {} at floor {}", self.name, shaft_id, destination);
        self.clear_route();
        self.walk_to(room.world_position());
        AgentUpdateResult::Continue
    }
}
