//! Save data for the elevator network
//!
//! Shafts and cars are stored by value and passengers by id. In-flight calls
//! and mid-trip car state are not kept: a restored car is always at rest on
//! its last floor.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::elevator_car::{ElevatorCar, ElevatorState};
use super::elevator_shaft::ElevatorShaft;
use super::elevator_system::ElevatorSystem;
use super::types::{AgentId, Direction, ShaftId};

/// Version number for the save format (increment when the format changes)
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatorCarData {
    pub current_floor: i32,
    pub target_floor: Option<i32>,
    pub passenger_ids: Vec<AgentId>,
    pub capacity: usize,
    pub state: ElevatorState,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatorShaftData {
    pub id: ShaftId,
    pub position: i32,
    pub min_floor: i32,
    pub max_floor: i32,
    pub zone: i32,
    pub car: ElevatorCarData,
}

/// Every shaft of a building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatorSaveData {
    pub version: u32,
    pub shafts: Vec<ElevatorShaftData>,
}

impl From<&ElevatorCar> for ElevatorCarData {
    fn from(car: &ElevatorCar) -> Self {
        Self {
            current_floor: car.current_floor,
            target_floor: car.target_floor,
            passenger_ids: car.passengers.clone(),
            capacity: car.capacity,
            state: car.state,
            direction: car.direction,
        }
    }
}

impl From<&ElevatorShaft> for ElevatorShaftData {
    fn from(shaft: &ElevatorShaft) -> Self {
        Self {
            id: shaft.id.clone(),
            position: shaft.position,
            min_floor: shaft.min_floor,
            max_floor: shaft.max_floor,
            zone: shaft.zone,
            car: ElevatorCarData::from(&shaft.car),
        }
    }
}

impl ElevatorCarData {
    /// Rebuild the car at rest, keeping only passengers `is_known` resolves
    pub fn restore(&self, is_known: impl Fn(AgentId) -> bool) -> Result<ElevatorCar> {
        if self.capacity == 0 {
            anyhow::bail!("Car capacity must be positive");
        }

        let mut car = ElevatorCar::with_capacity(self.current_floor, self.capacity);
        for &agent in &self.passenger_ids {
            if !is_known(agent) {
                warn!("Dropping unknown passenger {} from restored car", agent);
            } else if car.passengers.len() < car.capacity && !car.passengers.contains(&agent) {
                car.passengers.push(agent);
            }
        }
        debug_assert_eq!(car.state, ElevatorState::Idle);
        Ok(car)
    }
}

impl ElevatorShaftData {
    pub fn restore(&self, is_known: impl Fn(AgentId) -> bool) -> Result<ElevatorShaft> {
        if self.min_floor > self.max_floor {
            anyhow::bail!(
                "Shaft {} has an empty floor range {}-{}",
                self.id,
                self.min_floor,
                self.max_floor
            );
        }
        let car = self
            .car
            .restore(is_known)
            .with_context(|| format!("Failed to restore car of {}", self.id))?;

        Ok(ElevatorShaft::from_parts(
            self.id.clone(),
            self.position,
            self.zone,
            self.min_floor,
            self.max_floor,
            car,
        ))
    }
}

impl ElevatorSystem {
    /// Capture every shaft, ordered by position
    pub fn snapshot(&self) -> ElevatorSaveData {
        ElevatorSaveData {
            version: SAVE_VERSION,
            shafts: self
                .shafts()
                .into_iter()
                .map(ElevatorShaftData::from)
                .collect(),
        }
    }

    /// Replace every shaft with the saved ones
    ///
    /// Passenger ids are re-resolved through `is_known`; unknown agents are
    /// dropped. On error the registry is left untouched.
    pub fn restore(
        &mut self,
        data: &ElevatorSaveData,
        is_known: impl Fn(AgentId) -> bool,
    ) -> Result<()> {
        if data.version != SAVE_VERSION {
            anyhow::bail!(
                "Unsupported elevator save version {} (expected {})",
                data.version,
                SAVE_VERSION
            );
        }

        let shafts = data
            .shafts
            .iter()
            .map(|shaft| shaft.restore(&is_known))
            .collect::<Result<Vec<_>>>()?;

        self.clear();
        for shaft in shafts {
            self.insert_shaft(shaft);
        }
        info!("Restored {} elevator shafts", self.shaft_count());
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot()).context("Failed to encode elevator data")
    }

    pub fn from_json(json: &str) -> Result<ElevatorSaveData> {
        serde_json::from_str(json).context("Failed to decode elevator data")
    }
}
