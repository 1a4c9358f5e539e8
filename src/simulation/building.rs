//! Rooms and the building that holds them
//!
//! Only what the transport layer needs: where a room is, which floor it is
//! on, and how tall the building currently is.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{Position, RoomId, SimId, FLOOR_HEIGHT, GRID_SIZE, GROUND_Y};
use super::zones::is_sky_lobby_floor;

/// Residents an apartment can house
pub const APARTMENT_CAPACITY: usize = 4;
/// Jobs an office provides
pub const OFFICE_JOBS: usize = 6;

/// Kinds of room a player can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Lobby,
    SkyLobby,
    Apartment,
    Office,
    Farm,
    Kitchen,
    FastFood,
    Restaurant,
}

impl RoomType {
    /// Width in grid units
    pub fn width(&self) -> i32 {
        match self {
            RoomType::Lobby | RoomType::SkyLobby => 20,
            RoomType::Apartment | RoomType::Kitchen => 3,
            RoomType::Office | RoomType::Farm | RoomType::FastFood => 4,
            RoomType::Restaurant => 5,
        }
    }

    /// Whether placing this room anchors an elevator shaft
    pub fn anchors_elevator(&self) -> bool {
        matches!(self, RoomType::Lobby | RoomType::SkyLobby)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoomType::Lobby => "Lobby",
            RoomType::SkyLobby => "Sky Lobby",
            RoomType::Apartment => "Apartment",
            RoomType::Office => "Office",
            RoomType::Farm => "Farm",
            RoomType::Kitchen => "Kitchen",
            RoomType::FastFood => "Fast Food",
            RoomType::Restaurant => "Restaurant",
        }
    }
}

/// A placed room
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub room_type: RoomType,
    pub floor: i32,
    /// Left edge in grid units
    pub position: i32,
    pub width: i32,
}

impl Room {
    /// Screen position of the middle of the room
    pub fn world_position(&self) -> Position {
        Position::new(
            self.position as f32 * GRID_SIZE + self.width as f32 * GRID_SIZE / 2.0,
            GROUND_Y - (self.floor as f32 + 0.5) * FLOOR_HEIGHT,
        )
    }

    fn overlaps(&self, floor: i32, position: i32, width: i32) -> bool {
        self.floor == floor && position < self.position + self.width && position + width > self.position
    }
}

/// The building: every placed room, keyed by id
#[derive(Debug, Clone, Default)]
pub struct Building {
    rooms: BTreeMap<RoomId, Room>,
    next_id: usize,
}

impl Building {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a room after a light sanity check of floor and overlap
    pub fn add_room(&mut self, room_type: RoomType, floor: i32, position: i32) -> Result<RoomId> {
        match room_type {
            RoomType::Lobby if floor != 0 => {
                anyhow::bail!("Lobby must be on the ground floor, not floor {}", floor)
            }
            RoomType::SkyLobby if !is_sky_lobby_floor(floor) => {
                anyhow::bail!("Floor {} is not a sky lobby floor", floor)
            }
            RoomType::Lobby | RoomType::SkyLobby => {}
            _ if floor < 1 => anyhow::bail!("{} must be above the lobby", room_type.label()),
            _ => {}
        }

        let width = room_type.width();
        if let Some(existing) = self
            .rooms
            .values()
            .find(|room| room.overlaps(floor, position, width))
        {
            anyhow::bail!(
                "{} on floor {} at {} overlaps {} {}",
                room_type.label(),
                floor,
                position,
                existing.room_type.label(),
                existing.id
            );
        }

        let id = RoomId(SimId(self.next_id));
        self.next_id += 1;
        self.rooms.insert(
            id,
            Room {
                id,
                room_type,
                floor,
                position,
                width,
            },
        );
        Ok(id)
    }

    pub fn remove_room(&mut self, id: RoomId) -> Result<Room> {
        self.rooms
            .remove(&id)
            .with_context(|| format!("Room {} not found", id))
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn rooms_of_type(&self, room_type: RoomType) -> Vec<&Room> {
        self.rooms
            .values()
            .filter(|room| room.room_type == room_type)
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Highest floor holding a room, 0 for an empty building
    pub fn top_floor(&self) -> i32 {
        self.rooms.values().map(|room| room.floor).max().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
