//! Main simulation world that ties everything together
//!
//! The world is the arena: it owns the building, the elevator network and
//! every agent, and relations between them are plain id lookups. One call to
//! [`SimWorld::tick`] advances the clock, then every shaft, then every agent.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use super::agent::{AgentKind, AgentUpdateResult, ArrivalAction, SimAgent, TravelState, TripStart};
use super::building::{Building, RoomType, APARTMENT_CAPACITY, OFFICE_JOBS};
use super::elevator_system::ElevatorSystem;
use super::stats::SimStats;
use super::time_system::{ScheduleEvent, TimeEvent, TimeSystem};
use super::types::{floor_at_y, AgentId, Position, RoomId, ShaftId, SimId, GROUND_Y};
use super::zones::zone_of;

/// Chance per tick that someone moves into a vacant apartment
pub const MOVE_IN_CHANCE: f64 = 0.01;
/// Chance that a new resident also takes an office job
pub const RESIDENT_JOB_CHANCE: f64 = 0.5;

const FIRST_NAMES: [&str; 12] = [
    "Ada", "Bruno", "Chen", "Dara", "Emil", "Farah", "Goran", "Hana", "Ivo", "June", "Kofi", "Lena",
];
const LAST_NAMES: [&str; 8] = [
    "Okafor", "Lindqvist", "Moreau", "Tanaka", "Silva", "Novak", "Haddad", "Kowalski",
];

/// The main simulation world
pub struct SimWorld {
    pub building: Building,

    /// Every elevator shaft, keyed by id
    pub elevators: ElevatorSystem,

    /// All agents, residents and office workers alike
    pub agents: BTreeMap<AgentId, SimAgent>,

    /// Game clock and speed multiplier
    pub time: TimeSystem,

    pub stats: SimStats,

    /// Next agent id to assign
    next_agent_id: usize,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,

    /// Per-tick move-in probability; set to 0 to freeze the population
    pub move_in_chance: f64,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    fn new_internal(rng: Option<StdRng>) -> Self {
        Self {
            building: Building::new(),
            elevators: ElevatorSystem::new(),
            agents: BTreeMap::new(),
            time: TimeSystem::new(),
            stats: SimStats::default(),
            next_agent_id: 0,
            rng,
            move_in_chance: MOVE_IN_CHANCE,
        }
    }

    pub fn new() -> Self {
        Self::new_internal(None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(Some(StdRng::seed_from_u64(seed)))
    }

    /// Get a random value in the given range, using seeded RNG if available
    fn random_range(&mut self, range: std::ops::Range<f64>) -> f64 {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        match &mut self.rng {
            Some(rng) => slice.choose(rng),
            None => slice.choose(&mut rand::rng()),
        }
    }

    fn next_agent_id(&mut self) -> AgentId {
        let id = AgentId(SimId(self.next_agent_id));
        self.next_agent_id += 1;
        id
    }

    fn random_name(&mut self) -> String {
        let first = self.choose_random(&FIRST_NAMES).copied().unwrap_or("Alex");
        let last = self.choose_random(&LAST_NAMES).copied().unwrap_or("Doe");
        format!("{} {}", first, last)
    }

    /// Place a room. Lobbies and sky lobbies also get the shaft serving their zone.
    pub fn add_room(&mut self, room_type: RoomType, floor: i32, position: i32) -> Result<RoomId> {
        let id = self.building.add_room(room_type, floor, position)?;
        self.elevators.grow_to(self.building.top_floor());

        if room_type.anchors_elevator() {
            let zone = match room_type {
                RoomType::Lobby => 0,
                _ => zone_of(floor),
            };
            let shaft_id = ShaftId::new(format!("shaft_{}", self.elevators.shaft_count()));
            let shaft_position = position + room_type.width() / 2;
            self.elevators.create_shaft(shaft_id, shaft_position, zone);
        }

        debug!("Placed {} {} on floor {}", room_type.label(), id, floor);
        Ok(id)
    }

    /// Demolish a room. Agents living or working there lose that link;
    /// agents heading there abandon the trip on their next update.
    pub fn remove_room(&mut self, id: RoomId) -> Result<()> {
        let room = self.building.remove_room(id)?;
        for agent in self.agents.values_mut() {
            if agent.home == Some(id) {
                agent.home = None;
            }
            if agent.job == Some(id) {
                agent.job = None;
            }
        }
        info!("Removed {} {}", room.room_type.label(), id);
        Ok(())
    }

    /// Residents living in an apartment
    pub fn residents_of(&self, room: RoomId) -> usize {
        self.agents.values().filter(|a| a.home == Some(room)).count()
    }

    /// Agents employed at an office
    pub fn workers_at(&self, room: RoomId) -> usize {
        self.agents.values().filter(|a| a.job == Some(room)).count()
    }

    fn vacant_rooms(&self, room_type: RoomType, capacity: usize) -> Vec<RoomId> {
        self.building
            .rooms_of_type(room_type)
            .into_iter()
            .filter(|room| {
                let taken = match room_type {
                    RoomType::Apartment => self.residents_of(room.id),
                    _ => self.workers_at(room.id),
                };
                taken < capacity
            })
            .map(|room| room.id)
            .collect()
    }

    /// Add a bare agent at a screen position
    pub fn spawn_agent(&mut self, kind: AgentKind, position: Position) -> AgentId {
        let id = self.next_agent_id();
        let name = self.random_name();
        self.agents.insert(id, SimAgent::new(id, name, kind, position));
        self.stats.agents_spawned += 1;
        id
    }

    /// Move a resident into an apartment with a free slot
    pub fn spawn_resident(&mut self, home: RoomId) -> Result<AgentId> {
        let room = self.building.room(home).context("Home room not found")?;
        if room.room_type != RoomType::Apartment {
            anyhow::bail!("{} is a {}, not an apartment", home, room.room_type.label());
        }
        if self.residents_of(home) >= APARTMENT_CAPACITY {
            anyhow::bail!("Apartment {} is full", home);
        }

        let position = room.world_position();
        let id = self.spawn_agent(AgentKind::Resident, position);
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.home = Some(home);
            debug!("{} moved into {}", agent.name, home);
        }
        Ok(id)
    }

    /// Bring an office worker into the lobby for a job at `job`
    pub fn spawn_office_worker(&mut self, job: RoomId) -> Result<AgentId> {
        let room = self.building.room(job).context("Office not found")?;
        if room.room_type != RoomType::Office {
            anyhow::bail!("{} is a {}, not an office", job, room.room_type.label());
        }
        if self.workers_at(job) >= OFFICE_JOBS {
            anyhow::bail!("Office {} has no open jobs", job);
        }
        let lobby = self
            .building
            .rooms_of_type(RoomType::Lobby)
            .first()
            .map(|lobby| lobby.world_position())
            .context("Office workers need a lobby to arrive through")?;

        let id = self.spawn_agent(AgentKind::OfficeWorker, lobby);
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.job = Some(job);
        }
        Ok(id)
    }

    /// Remove an agent and every elevator reference to it
    pub fn remove_agent(&mut self, id: AgentId) -> Option<SimAgent> {
        let agent = self.agents.remove(&id)?;
        self.elevators.remove_resident(id);
        self.stats.agents_removed += 1;
        debug!("{} left the tower", agent.name);
        Some(agent)
    }

    /// Start a trip for an agent
    pub fn send_agent_to_room(
        &mut self,
        agent_id: AgentId,
        room_id: RoomId,
        on_arrival: Option<ArrivalAction>,
    ) -> Result<TripStart> {
        let room = self
            .building
            .room(room_id)
            .with_context(|| format!("Room {} not found", room_id))?;
        let agent = self
            .agents
            .get_mut(&agent_id)
            .with_context(|| format!("Agent {} not found", agent_id))?;

        let start = agent.go_to_room(room, on_arrival, &mut self.elevators);
        self.stats.trips_requested += 1;
        if start == TripStart::FallbackWalk {
            self.stats.fallback_walks += 1;
        }
        Ok(start)
    }

    /// Same as [`Self::send_agent_to_room`] for policy code that cannot fail loudly
    fn dispatch(&mut self, agent_id: AgentId, room_id: RoomId, on_arrival: Option<ArrivalAction>) {
        if let Err(e) = self.send_agent_to_room(agent_id, room_id, on_arrival) {
            warn!("Could not send {} to {}: {:#}", agent_id, room_id, e);
        }
    }

    /// Change the speed multiplier
    pub fn set_speed(&mut self, speed: u32) -> Result<()> {
        if let Some(event) = self.time.set_speed(speed)? {
            self.handle_time_event(&event);
        }
        Ok(())
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_ms: f32) {
        let scaled = self.time.scale(delta_ms);
        if scaled <= 0.0 {
            return;
        }
        self.stats.elapsed_ms += scaled as f64;

        for event in self.time.advance(scaled) {
            self.handle_time_event(&event);
        }

        // Shafts move before agents poll them
        self.elevators.update(scaled, self.building.top_floor());

        let now_ms = self.time.elapsed_ms();
        let results = self.update_agents(scaled, now_ms);
        for (agent_id, result) in results {
            self.process_agent_result(agent_id, result);
        }

        self.run_idle_policy();
        self.try_move_in();
    }

    /// Update all agents
    fn update_agents(&mut self, delta_ms: f32, now_ms: f64) -> Vec<(AgentId, AgentUpdateResult)> {
        let mut results = Vec::new();

        // Collect agent IDs to avoid borrow issues
        let agent_ids: Vec<AgentId> = self.agents.keys().copied().collect();

        for agent_id in agent_ids {
            if let Some(agent) = self.agents.get_mut(&agent_id) {
                let result = agent.update(delta_ms, now_ms, &self.building, &mut self.elevators);
                if result != AgentUpdateResult::Continue {
                    results.push((agent_id, result));
                }
            }
        }

        results
    }

    fn process_agent_result(&mut self, agent_id: AgentId, result: AgentUpdateResult) {
        match result {
            AgentUpdateResult::Continue => {}
            AgentUpdateResult::ArrivedAtRoom(room) => {
                self.stats.trips_completed += 1;
                debug!("{} arrived at {:?}", agent_id, room);
            }
            AgentUpdateResult::BoardedElevator { waited_ms, .. } => {
                self.stats.record_boarding(waited_ms);
            }
            AgentUpdateResult::ReachedTransferFloor { .. } => {
                self.stats.transfers += 1;
            }
            AgentUpdateResult::FellBackToWalking => {
                self.stats.fallback_walks += 1;
            }
            AgentUpdateResult::TripAbandoned => {
                self.stats.abandoned_trips += 1;
            }
            AgentUpdateResult::FinishedEating => {
                // Back to work if there still is any, otherwise home
                let Some(agent) = self.agents.get(&agent_id) else {
                    return;
                };
                let (job, home) = (agent.job, agent.home);
                if let (Some(job), true) = (job, self.time.is_work_hours()) {
                    self.dispatch(agent_id, job, Some(ArrivalAction::StartWorking));
                } else if let Some(home) = home {
                    self.dispatch(agent_id, home, None);
                }
            }
        }
    }

    fn handle_time_event(&mut self, event: &TimeEvent) {
        match event {
            TimeEvent::Schedule { event, hour, day } => {
                info!("Day {} {:02}:00 {}", day, hour, event.name());
                self.handle_schedule_event(*event);
            }
            TimeEvent::DayChanged { day, .. } => {
                info!("Day {} ({}) begins", day, self.time.day_of_week());
            }
            TimeEvent::SpeedChanged { speed, previous_speed } => {
                info!("Speed changed from {}x to {}x", previous_speed, speed);
            }
            other => debug!("{}: {:?}", other.name(), other),
        }
    }

    fn agents_where(&self, filter: impl Fn(&SimAgent) -> bool) -> Vec<AgentId> {
        self.agents
            .values()
            .filter(|a| filter(*a))
            .map(|a| a.id)
            .collect()
    }

    fn handle_schedule_event(&mut self, event: ScheduleEvent) {
        match event {
            ScheduleEvent::WakeUp => {
                for id in self.agents_where(|a| a.travel_state == TravelState::Sleeping) {
                    if let Some(agent) = self.agents.get_mut(&id) {
                        agent.travel_state = TravelState::Idle;
                    }
                }
            }
            ScheduleEvent::WorkStart => self.spawn_office_workers(),
            ScheduleEvent::LunchStart => {
                let fast_food: Vec<RoomId> = self
                    .building
                    .rooms_of_type(RoomType::FastFood)
                    .iter()
                    .map(|room| room.id)
                    .collect();
                if fast_food.is_empty() {
                    return;
                }
                let hungry = self.agents_where(|a| {
                    a.kind == AgentKind::OfficeWorker && a.travel_state == TravelState::Working
                });
                for id in hungry {
                    if let Some(&restaurant) = self.choose_random(&fast_food) {
                        self.dispatch(id, restaurant, Some(ArrivalAction::StartEating));
                    }
                }
            }
            ScheduleEvent::LunchEnd => {}
            ScheduleEvent::WorkEnd => {
                for id in self.agents_where(|a| a.kind == AgentKind::OfficeWorker) {
                    self.remove_agent(id);
                }
                let commuters = self.agents_where(|a| {
                    a.kind == AgentKind::Resident && a.travel_state == TravelState::Working
                });
                for id in commuters {
                    if let Some(home) = self.agents.get(&id).and_then(|a| a.home) {
                        self.dispatch(id, home, None);
                    }
                }
            }
            // Idle residents are sent home by the idle policy from now on
            ScheduleEvent::Sleep => {}
        }
    }

    /// Fill every open office job with a commuter from the lobby
    fn spawn_office_workers(&mut self) {
        let offices = self.vacant_rooms(RoomType::Office, OFFICE_JOBS);
        let mut spawned = 0;
        for office in offices {
            let open = OFFICE_JOBS.saturating_sub(self.workers_at(office));
            for _ in 0..open {
                match self.spawn_office_worker(office) {
                    Ok(id) => {
                        spawned += 1;
                        self.dispatch(id, office, Some(ArrivalAction::StartWorking));
                    }
                    Err(e) => {
                        warn!("Could not spawn office worker: {:#}", e);
                        return;
                    }
                }
            }
        }
        if spawned > 0 {
            info!("{} office workers arrived", spawned);
        }
    }

    /// Give idle agents something to do
    fn run_idle_policy(&mut self) {
        let work_hours = self.time.is_work_hours();
        let night = self.time.is_night();

        for id in self.agents_where(SimAgent::is_idle) {
            let Some(agent) = self.agents.get(&id) else {
                continue;
            };
            let (job, home, kind) = (agent.job, agent.home, agent.kind);
            match kind {
                AgentKind::Resident => {
                    if let (Some(job), true) = (job, work_hours) {
                        self.dispatch(id, job, Some(ArrivalAction::StartWorking));
                    } else if let (Some(home), true) = (home, night) {
                        self.dispatch(id, home, Some(ArrivalAction::StartSleeping));
                    }
                }
                AgentKind::OfficeWorker => {
                    if let (Some(job), true) = (job, work_hours) {
                        self.dispatch(id, job, Some(ArrivalAction::StartWorking));
                    }
                }
            }
        }
    }

    /// Occasionally move a new resident into a vacant apartment
    fn try_move_in(&mut self) {
        if self.move_in_chance <= 0.0 || self.random_range(0.0..1.0) >= self.move_in_chance {
            return;
        }
        let vacant = self.vacant_rooms(RoomType::Apartment, APARTMENT_CAPACITY);
        let Some(&home) = self.choose_random(&vacant) else {
            return;
        };
        let id = match self.spawn_resident(home) {
            Ok(id) => id,
            Err(e) => {
                warn!("Move-in failed: {:#}", e);
                return;
            }
        };

        if self.random_range(0.0..1.0) < RESIDENT_JOB_CHANCE {
            let offices = self.vacant_rooms(RoomType::Office, OFFICE_JOBS);
            if let Some(&office) = self.choose_random(&offices) {
                if let Some(agent) = self.agents.get_mut(&id) {
                    agent.job = Some(office);
                }
            }
        }
    }

    /// Encode the elevator network as JSON
    pub fn save_elevators(&self) -> Result<String> {
        self.elevators.to_json()
    }

    /// Replace the elevator network from JSON, keeping only known passengers
    pub fn restore_elevators(&mut self, json: &str) -> Result<()> {
        let data = ElevatorSystem::from_json(json)?;
        let agents = &self.agents;
        self.elevators
            .restore(&data, |id| agents.contains_key(&id))
            .context("Failed to restore elevators")
    }

    /// Create a default test world: two zones joined by a sky lobby
    pub fn create_test_world() -> Self {
        Self::build_test_world(SimWorld::new())
    }

    /// Create a default test world with a seeded RNG for reproducible simulations
    pub fn create_test_world_with_seed(seed: u64) -> Self {
        Self::build_test_world(SimWorld::new_with_seed(seed))
    }

    /// Internal helper to build the test world structure
    pub fn build_test_world(mut world: SimWorld) -> Self {
        let mut layout = vec![(RoomType::Lobby, 0, 0), (RoomType::SkyLobby, 15, 0)];

        // Zone 0: homes low, offices higher up, one place to eat
        for floor in 1..=6 {
            layout.push((RoomType::Apartment, floor, 0));
            layout.push((RoomType::Apartment, floor, 3));
        }
        for floor in [8, 10, 12] {
            layout.push((RoomType::Office, floor, 0));
            layout.push((RoomType::Office, floor, 4));
        }
        layout.push((RoomType::FastFood, 7, 0));
        layout.push((RoomType::Kitchen, 7, 4));

        // Zone 1 above the sky lobby
        for floor in 16..=18 {
            layout.push((RoomType::Apartment, floor, 0));
            layout.push((RoomType::Apartment, floor, 3));
        }
        layout.push((RoomType::Office, 20, 0));
        layout.push((RoomType::Restaurant, 19, 0));

        for (room_type, floor, position) in layout {
            if let Err(e) = world.add_room(room_type, floor, position) {
                warn!("Skipping test room: {:#}", e);
            }
        }

        // Two residents per apartment, every other one with a job
        let apartments: Vec<RoomId> = world
            .building
            .rooms_of_type(RoomType::Apartment)
            .iter()
            .map(|room| room.id)
            .collect();
        let offices: Vec<RoomId> = world
            .building
            .rooms_of_type(RoomType::Office)
            .iter()
            .map(|room| room.id)
            .collect();
        for (index, home) in apartments.into_iter().enumerate() {
            for slot in 0..2 {
                let Ok(id) = world.spawn_resident(home) else {
                    continue;
                };
                if slot == 0 && !offices.is_empty() {
                    let office = offices[index % offices.len()];
                    if let Some(agent) = world.agents.get_mut(&id) {
                        agent.job = Some(office);
                    }
                }
            }
        }

        world
    }

    /// Count agents per travel state
    pub fn travel_state_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for agent in self.agents.values() {
            *counts
                .entry(format!("{:?}", agent.travel_state))
                .or_insert(0) += 1;
        }
        counts
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Arcology Summary ===");
        println!("Time: {} (speed {}x)", self.time, self.time.speed());
        println!(
            "Rooms: {}, Top floor: {}, Elevators: {}",
            self.building.room_count(),
            self.building.top_floor(),
            self.elevators.shaft_count()
        );
        println!("Agents: {}", self.agents.len());
        for (state, count) in self.travel_state_counts() {
            println!("  {}: {}", state, count);
        }
        println!();

        println!("--- Elevators ---");
        for shaft in self.elevators.shafts() {
            println!(
                "  {} (zone {}, floors {}-{}): floor {} {:?} target={:?} passengers={}/{} calls={}",
                shaft.id,
                shaft.zone,
                shaft.min_floor,
                shaft.max_floor,
                shaft.car.current_floor,
                shaft.car.state,
                shaft.car.target_floor,
                shaft.car.passengers.len(),
                shaft.car.capacity,
                shaft.call_queue.len()
            );
        }
        println!();

        println!("--- Trips ---");
        println!(
            "  requested={} completed={} boardings={} transfers={} fallbacks={} abandoned={}",
            self.stats.trips_requested,
            self.stats.trips_completed,
            self.stats.boardings,
            self.stats.transfers,
            self.stats.fallback_walks,
            self.stats.abandoned_trips
        );
        println!(
            "  average wait {:.1}s, max {:.1}s",
            self.stats.average_wait_ms() / 1000.0,
            self.stats.max_wait_ms / 1000.0
        );
    }

    /// Draw an elevation view of the tower in the terminal
    pub fn draw_tower(&self) {
        let shafts = self.elevators.shafts();
        let top = self.building.top_floor();

        let mut agents_per_floor: BTreeMap<i32, usize> = BTreeMap::new();
        for agent in self.agents.values() {
            *agents_per_floor.entry(agent.current_floor()).or_insert(0) += 1;
        }

        println!("\n=== Tower ===");
        println!("Legend: E=Car (n=passengers), |=Shaft, .=Outside zone, w=Waiting agents");
        println!();
        for floor in (0..=top).rev() {
            let mut line = format!("{:>3} ", floor);
            for shaft in &shafts {
                // Render the car where it appears to be, not just its departure floor
                let car_floor = floor_at_y(GROUND_Y + shaft.car.visual_y());
                let cell = if car_floor == floor {
                    let n = shaft.car.passengers.len();
                    if n > 0 {
                        format!("[E{}]", n.min(9))
                    } else {
                        "[E ]".to_string()
                    }
                } else if shaft.serves_floor(floor) {
                    " |  ".to_string()
                } else {
                    " .  ".to_string()
                };
                line.push_str(&cell);
            }

            let rooms: String = self
                .building
                .rooms()
                .filter(|room| room.floor == floor)
                .map(|room| room.room_type.label().chars().next().unwrap_or('?'))
                .collect();
            let waiting: usize = shafts.iter().map(|s| s.waiting_at(floor).len()).sum();
            let people = agents_per_floor.get(&floor).copied().unwrap_or(0);

            line.push_str(&format!(" {:<8} agents={:<3}", rooms, people));
            if waiting > 0 {
                line.push_str(&format!(" w={}", waiting));
            }
            println!("{}", line);
        }
        let axis: String = shafts.iter().map(|s| format!("{:<4}", s.position)).collect();
        println!("x=  {}", axis);
        println!();
    }
}
