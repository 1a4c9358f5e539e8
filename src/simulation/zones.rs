//! Vertical zone topology
//!
//! Floors are partitioned into fixed-size zones by integer division. Each
//! zone above the ground zone begins with a sky-lobby floor, which is the
//! only place riders may change from one zone's shaft to another's.

/// Floors per zone (0-14, 15-29, 30-44, ...)
pub const ZONE_SIZE: i32 = 15;

/// Floors that begin each zone above the ground zone
pub const SKY_LOBBY_FLOORS: [i32; 6] = [15, 30, 45, 60, 75, 90];

/// Zone containing a floor
pub fn zone_of(floor: i32) -> i32 {
    floor.div_euclid(ZONE_SIZE)
}

/// Lowest floor of a zone
pub fn zone_min_floor(zone: i32) -> i32 {
    zone * ZONE_SIZE
}

/// Highest floor of a zone
pub fn zone_max_floor(zone: i32) -> i32 {
    (zone + 1) * ZONE_SIZE - 1
}

/// Sky-lobby floor that begins `zone`, if the zone has one
pub fn sky_lobby_floor(zone: i32) -> Option<i32> {
    if zone <= 0 {
        return None;
    }
    SKY_LOBBY_FLOORS.get((zone - 1) as usize).copied()
}

/// Whether `floor` is one of the designated sky-lobby floors
pub fn is_sky_lobby_floor(floor: i32) -> bool {
    SKY_LOBBY_FLOORS.contains(&floor)
}

/// Floor where a rider must change shafts travelling between two zones
///
/// Going up, that is the sky lobby beginning the target zone; going down, the
/// sky lobby beginning the current zone. Same-zone trips have no transfer.
pub fn transfer_floor(current_zone: i32, target_zone: i32) -> Option<i32> {
    if target_zone > current_zone {
        sky_lobby_floor(target_zone)
    } else if target_zone < current_zone {
        sky_lobby_floor(current_zone)
    } else {
        None
    }
}
