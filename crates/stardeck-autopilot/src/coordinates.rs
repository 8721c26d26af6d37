//! Resolving the ship and its destination into one comparable frame.

use glam::DVec3;
use stardeck_core::entity::EntityId;
use stardeck_core::types::Position;

/// Ship and destination expressed in the same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCoordinates {
    pub position: DVec3,
    pub destination: DVec3,
    /// True when both are in light-years.
    pub interstellar: bool,
}

/// Bring `ship` and the destination into a common frame.
///
/// `system_position` looks up a solar system's interstellar position. A ship
/// and destination in the same frame are compared as-is; otherwise whichever
/// side sits inside a solar system is represented by that system's position.
/// `None` when a system lookup fails.
pub fn resolve_coordinates(
    ship: &Position,
    destination: DVec3,
    destination_system: Option<EntityId>,
    system_position: impl Fn(EntityId) -> Option<DVec3>,
) -> Option<ResolvedCoordinates> {
    let ship_system = ship.frame.system();

    if ship_system == destination_system {
        return Some(ResolvedCoordinates {
            position: ship.to_vec3(),
            destination,
            interstellar: ship_system.is_none(),
        });
    }

    let position = match ship_system {
        Some(system) => system_position(system)?,
        None => ship.to_vec3(),
    };
    let destination = match destination_system {
        Some(system) => system_position(system)?,
        None => destination,
    };
    Some(ResolvedCoordinates {
        position,
        destination,
        interstellar: true,
    })
}
