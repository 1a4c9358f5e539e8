//! Core types for the tower simulation
//!
//! Identifiers, screen geometry and travel directions shared by the
//! elevator network and the agents riding it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimId(pub usize);

/// A wrapper type for agent IDs (residents and office workers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub SimId);

/// A wrapper type for room IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub SimId);

/// Elevator shafts are named (`shaft_0`, `shaft_1`, ...) rather than numbered
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShaftId(pub String);

impl ShaftId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShaftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{}", self.0 .0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room_{}", self.0 .0)
    }
}

/// Width of one horizontal grid unit in pixels
pub const GRID_SIZE: f32 = 64.0;

/// Height of one floor in pixels
pub const FLOOR_HEIGHT: f32 = GRID_SIZE;

/// Screen y of the ground line (floor 0). Screen y grows downwards.
pub const GROUND_Y: f32 = 500.0;

/// Screen y of the walking line of a floor
pub fn floor_y(floor: i32) -> f32 {
    GROUND_Y - floor as f32 * FLOOR_HEIGHT
}

/// Floor containing a screen y coordinate, never below the ground floor
pub fn floor_at_y(y: f32) -> i32 {
    // Small bias so a position snapped onto a floor line never rounds down a floor
    let floor = ((GROUND_Y - y) / FLOOR_HEIGHT + 1e-3).floor() as i32;
    floor.max(0)
}

/// Screen x of a horizontal grid coordinate
pub fn grid_x(position: i32) -> f32 {
    position as f32 * GRID_SIZE
}

/// A 2D screen position in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Step towards `target` by at most `max_step`, never overshooting it
    pub fn move_towards(&self, target: &Position, max_step: f32) -> Position {
        let dist = self.distance(target);
        if dist <= max_step || dist == 0.0 {
            return *target;
        }
        Position {
            x: self.x + (target.x - self.x) / dist * max_step,
            y: self.y + (target.y - self.y) / dist * max_step,
        }
    }
}

/// Direction requested by a hall call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Up,
    Down,
}

impl CallDirection {
    /// Direction of travel from one floor to another; equal floors count as up
    pub fn between(from: i32, to: i32) -> Self {
        if to >= from {
            CallDirection::Up
        } else {
            CallDirection::Down
        }
    }
}

/// Current or most recent travel direction of an elevator car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    #[default]
    Idle,
}

impl Direction {
    /// Whether a hall call in `call` direction continues this travel direction
    pub fn matches(&self, call: CallDirection) -> bool {
        matches!(
            (self, call),
            (Direction::Up, CallDirection::Up) | (Direction::Down, CallDirection::Down)
        )
    }
}

impl From<CallDirection> for Direction {
    fn from(call: CallDirection) -> Self {
        match call {
            CallDirection::Up => Direction::Up,
            CallDirection::Down => Direction::Down,
        }
    }
}
