//! Spatial world manager: partitions solar-system space into fixed-size
//! cubic shards, each with its own rigid-body simulation.
//!
//! The rigid-body engine works in f32, which loses sub-meter precision past
//! a few thousand km. Shards keep every body close to its shard origin.
//! Interstellar space has no shards.

use glam::DVec3;
use log::debug;

use stardeck_core::components::PhysicsWorld;
use stardeck_core::entity::EntityId;
use stardeck_core::enums::{ComponentKind, PositionFrame};
use stardeck_core::types::Position;

use crate::context::SimContext;
use crate::ecs::Ecs;
use crate::physics::RigidBodyWorld;

/// Deterministic shard key. Shards never span solar systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectorId {
    pub system: EntityId,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl SectorId {
    /// Center of the shard cube, in the system's km frame.
    pub fn origin(&self, shard_size: f64) -> Position {
        let center = |i: i64| (i as f64 + 0.5) * shard_size;
        Position::solar(self.system, center(self.x), center(self.y), center(self.z))
    }
}

/// `floor(coord / shard_size)` per axis. `None` for interstellar or
/// non-finite positions.
pub fn sector_id(position: &Position, shard_size: f64) -> Option<SectorId> {
    let PositionFrame::Solar { system } = position.frame else {
        return None;
    };
    if !position.is_finite() || !(shard_size > 0.0) {
        return None;
    }
    let cell = |c: f64| (c / shard_size).floor() as i64;
    Some(SectorId {
        system,
        x: cell(position.x),
        y: cell(position.y),
        z: cell(position.z),
    })
}

/// Snapped shard center for a position.
pub fn world_origin(position: &Position, shard_size: f64) -> Option<Position> {
    sector_id(position, shard_size).map(|sector| sector.origin(shard_size))
}

pub fn to_local(absolute: DVec3, origin: DVec3) -> DVec3 {
    absolute - origin
}

pub fn to_absolute(local: DVec3, origin: DVec3) -> DVec3 {
    local + origin
}

/// Whether a position lies within a shard: same frame, and inside the
/// half-open cube `[-size/2, size/2)` around its origin on every axis, so a
/// point on a shared face belongs to the same shard `sector_id` picks.
pub fn entity_in_world(position: &Position, world_location: &Position, shard_size: f64) -> bool {
    if position.frame != world_location.frame || position.frame.is_interstellar() {
        return false;
    }
    let half = shard_size * 0.5;
    let local = to_local(position.to_vec3(), world_location.to_vec3());
    local.cmpge(DVec3::splat(-half)).all() && local.cmplt(DVec3::splat(half)).all()
}

/// The physics-world entity whose location falls in `sector`.
pub fn find_world(ecs: &Ecs, sector: SectorId, shard_size: f64) -> Option<EntityId> {
    ecs.entities_with(ComponentKind::PhysicsWorld).find(|&id| {
        ecs.get::<PhysicsWorld>(id)
            .and_then(|world| sector_id(&world.location, shard_size))
            == Some(sector)
    })
}

/// Create a physics-world entity for `sector` with a fresh rigid-body
/// simulation rooted at its origin.
pub fn materialize_world(ctx: &mut SimContext, sector: SectorId) -> EntityId {
    let location = sector.origin(ctx.config.shard_size);
    let id = ctx
        .ecs
        .add_entity()
        .with(PhysicsWorld {
            location,
            enabled: true,
            idle_ticks: 0,
        })
        .id();
    ctx.shards.insert_world(id, RigidBodyWorld::new());
    debug!(
        "materialized physics world {id} for sector ({}, {}, {}) in {}",
        sector.x, sector.y, sector.z, sector.system
    );
    id
}

/// Existing world for `sector`, or a new one.
pub fn find_or_materialize_world(ctx: &mut SimContext, sector: SectorId) -> EntityId {
    match find_world(&ctx.ecs, sector, ctx.config.shard_size) {
        Some(id) => {
            if !ctx.shards.has_world(id) {
                ctx.shards.insert_world(id, RigidBodyWorld::new());
            }
            id
        }
        None => materialize_world(ctx, sector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: f64 = 10_000.0;

    fn system() -> EntityId {
        EntityId::new(7, 0)
    }

    #[test]
    fn sector_floors_each_axis() {
        let p = Position::solar(system(), 9_999.0, -0.5, 25_000.0);
        let s = sector_id(&p, SIZE).unwrap();
        assert_eq!((s.x, s.y, s.z), (0, -1, 2));
        assert_eq!(s.system, system());
    }

    #[test]
    fn interstellar_has_no_sector() {
        let p = Position::interstellar(1.0, 2.0, 3.0);
        assert!(sector_id(&p, SIZE).is_none());
        let nan = Position::solar(system(), f64::NAN, 0.0, 0.0);
        assert!(sector_id(&nan, SIZE).is_none());
    }

    #[test]
    fn same_sector_same_origin() {
        let a = Position::solar(system(), 100.0, 200.0, 300.0);
        let b = Position::solar(system(), 9_000.0, 5.0, 9_999.9);
        assert_eq!(sector_id(&a, SIZE), sector_id(&b, SIZE));
        let origin = world_origin(&a, SIZE).unwrap();
        assert_eq!(origin.to_vec3(), DVec3::splat(5_000.0));
        assert_eq!(origin, world_origin(&b, SIZE).unwrap());
    }

    #[test]
    fn local_round_trip_is_exact_for_shard_origins() {
        let origin = DVec3::new(5_000.0, -15_000.0, 1.5e9 + 5_000.0);
        let abs = DVec3::new(5_123.25, -14_000.5, 1.5e9 + 4_321.0);
        assert_eq!(to_absolute(to_local(abs, origin), origin), abs);
    }

    #[test]
    fn in_world_checks_frame_and_extent() {
        let world = Position::solar(system(), 5_000.0, 5_000.0, 5_000.0);
        assert!(entity_in_world(
            &Position::solar(system(), 0.0, 9_999.5, 5_000.0),
            &world,
            SIZE
        ));
        assert!(!entity_in_world(
            &Position::solar(system(), 10_001.0, 5_000.0, 5_000.0),
            &world,
            SIZE
        ));
        assert!(!entity_in_world(
            &Position::solar(EntityId::new(8, 0), 5_000.0, 5_000.0, 5_000.0),
            &world,
            SIZE
        ));
    }

    #[test]
    fn shared_face_belongs_to_the_floor_sector() {
        let here = Position::solar(system(), 5_000.0, 5_000.0, 5_000.0);
        let next = Position::solar(system(), 15_000.0, 5_000.0, 5_000.0);
        let face = Position::solar(system(), 10_000.0, 5_000.0, 5_000.0);

        assert_eq!(sector_id(&face, SIZE), sector_id(&next, SIZE));
        assert!(!entity_in_world(&face, &here, SIZE));
        assert!(entity_in_world(&face, &next, SIZE));

        let low_face = Position::solar(system(), 0.0, 5_000.0, 5_000.0);
        assert!(entity_in_world(&low_face, &here, SIZE));
    }
}
