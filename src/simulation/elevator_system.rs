//! Elevator dispatch registry
//!
//! Owns every shaft in the building and routes hall calls to the shaft that
//! serves the caller's zone.

use log::{info, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::elevator_shaft::ElevatorShaft;
use super::types::{grid_x, AgentId, CallDirection, ShaftId, GRID_SIZE};
use super::zones::zone_of;

/// All elevator shafts of a building
#[derive(Debug, Clone, Default)]
pub struct ElevatorSystem {
    shafts: HashMap<ShaftId, ElevatorShaft>,
    /// Building top floor seen by the last update; bounds newly created shafts
    top_floor: i32,
}

impl ElevatorSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that already knows how tall the building is
    pub fn with_top_floor(top_floor: i32) -> Self {
        Self {
            shafts: HashMap::new(),
            top_floor,
        }
    }

    /// Create and register a shaft. An existing shaft with the same id is replaced.
    pub fn create_shaft(&mut self, id: ShaftId, position: i32, zone: i32) -> &mut ElevatorShaft {
        let shaft = ElevatorShaft::new(id.clone(), position, zone, self.top_floor);
        info!(
            "Created elevator {} at x={} serving zone {} (floors {}-{})",
            id, position, zone, shaft.min_floor, shaft.max_floor
        );
        match self.shafts.entry(id) {
            Entry::Occupied(mut entry) => {
                warn!("Elevator {} replaced an existing shaft with the same id", entry.key());
                entry.insert(shaft);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(shaft),
        }
    }

    /// Put a fully built shaft into the registry (used when restoring a save)
    pub(crate) fn insert_shaft(&mut self, shaft: ElevatorShaft) {
        self.shafts.insert(shaft.id.clone(), shaft);
    }

    /// Shaft serving `zone`; if several claim it, the lowest id wins
    pub fn shaft_for_zone(&self, zone: i32) -> Option<&ElevatorShaft> {
        self.shafts
            .values()
            .filter(|shaft| shaft.zone == zone)
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    /// Id of the first shaft serving `zone`
    pub fn shaft_id_for_zone(&self, zone: i32) -> Option<ShaftId> {
        self.shaft_for_zone(zone).map(|shaft| shaft.id.clone())
    }

    /// Shaft serving the zone that contains `floor`
    pub fn shaft_for_floor(&self, floor: i32) -> Option<&ElevatorShaft> {
        self.shaft_for_zone(zone_of(floor))
    }

    pub fn shaft(&self, id: &ShaftId) -> Option<&ElevatorShaft> {
        self.shafts.get(id)
    }

    pub fn shaft_mut(&mut self, id: &ShaftId) -> Option<&mut ElevatorShaft> {
        self.shafts.get_mut(id)
    }

    /// All shafts, ordered by horizontal position then id
    pub fn shafts(&self) -> Vec<&ElevatorShaft> {
        let mut shafts: Vec<&ElevatorShaft> = self.shafts.values().collect();
        shafts.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        shafts
    }

    /// Shaft within one grid unit of a screen x coordinate
    pub fn shaft_at_position(&self, x: f32) -> Option<&ElevatorShaft> {
        self.shafts
            .values()
            .find(|shaft| (grid_x(shaft.position) - x).abs() <= GRID_SIZE)
    }

    pub fn shaft_count(&self) -> usize {
        self.shafts.len()
    }

    pub fn top_floor(&self) -> i32 {
        self.top_floor
    }

    /// Let every shaft reach a taller building without advancing time
    pub fn grow_to(&mut self, building_top_floor: i32) {
        self.top_floor = self.top_floor.max(building_top_floor);
        for shaft in self.shafts.values_mut() {
            shaft.extend_range(building_top_floor);
        }
    }

    /// Advance every shaft with the same building height
    pub fn update(&mut self, delta_ms: f32, building_top_floor: i32) {
        self.top_floor = building_top_floor;
        for shaft in self.shafts.values_mut() {
            shaft.update(delta_ms, building_top_floor);
        }
    }

    /// Route a hall call to the shaft serving `floor`'s zone
    ///
    /// Returns the shaft that accepted the call, or `None` when no shaft serves
    /// that zone or the shaft declined the floor. Callers fall back to walking.
    pub fn call_elevator(
        &mut self,
        floor: i32,
        direction: CallDirection,
        agent: AgentId,
    ) -> Option<ShaftId> {
        let zone = zone_of(floor);
        let Some(id) = self.shaft_id_for_zone(zone) else {
            warn!("No elevator shaft found for floor {} (zone {})", floor, zone);
            return None;
        };

        self.call_shaft(&id, floor, direction, agent).then_some(id)
    }

    /// Place a hall call on a specific shaft
    pub fn call_shaft(
        &mut self,
        id: &ShaftId,
        floor: i32,
        direction: CallDirection,
        agent: AgentId,
    ) -> bool {
        match self.shafts.get_mut(id) {
            Some(shaft) => shaft.call_elevator(floor, direction, agent),
            None => {
                warn!("Call for unknown elevator {}", id);
                false
            }
        }
    }

    /// Forget an agent in every shaft
    pub fn remove_resident(&mut self, agent: AgentId) {
        for shaft in self.shafts.values_mut() {
            shaft.remove_resident(agent);
        }
    }

    pub fn clear(&mut self) {
        self.shafts.clear();
    }
}
