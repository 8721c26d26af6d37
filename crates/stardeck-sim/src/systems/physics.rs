//! Physics integration with a per-entity strategy.
//!
//! Slow bodies inside a solar system live as rigid bodies in the shard that
//! contains them and get collision response. Everything else (interstellar
//! travel, warp-speed ships, disabled shards) is integrated kinematically.
//! Both paths share the same ordered force contributions.

use std::collections::HashMap;

use glam::{DQuat, DVec3};
use log::{debug, warn};
use rapier3d::prelude::RigidBody;

use stardeck_core::components::{ImpulseEngines, PhysicsWorld};
use stardeck_core::constants::LIGHT_YEAR_KM;
use stardeck_core::entity::EntityId;
use stardeck_core::enums::ComponentKind;
use stardeck_core::types::{Position, Rotation, RotationVelocity, Velocity};

use super::{secs, ship_system_with};
use crate::context::SimContext;
use crate::ecs::{Ecs, System};
use crate::physics::bodies::{from_na_rotation, from_na_vector, to_na_rotation, to_na_vector, BodySpec};
use crate::physics::motion::{
    apply_contributions, forward_speed, integrate_rotation, KinematicBody, MotionBody, MotionIntent,
};
use crate::physics::{BodyLink, RigidBodyWorld};
use crate::spatial::{
    entity_in_world, find_or_materialize_world, find_world, sector_id, to_absolute, to_local, SectorId,
};

#[derive(Default)]
pub struct PhysicsSystem {
    worlds: Vec<EntityId>,
    links: Vec<(EntityId, BodyLink)>,
    /// Stars and planets with no shard in their sector, keyed to the
    /// physics-world version the lookup saw.
    fixed_misses: HashMap<EntityId, (SectorId, u64)>,
}

impl System for PhysicsSystem {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::Position)
            && !ecs.has(id, ComponentKind::PhysicsWorld)
            && !ecs.has(id, ComponentKind::SolarSystem)
            && [
                ComponentKind::Velocity,
                ComponentKind::IsShip,
                ComponentKind::IsPlanet,
                ComponentKind::IsStar,
                ComponentKind::IsTorpedo,
            ]
            .iter()
            .any(|&kind| ecs.has(id, kind))
    }

    fn exit(&mut self, ctx: &mut SimContext, id: EntityId) {
        self.fixed_misses.remove(&id);
        if ctx.shards.detach(id) {
            debug!("{id} removed from its physics world");
        }
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, elapsed_ms: f64) {
        let dt = secs(elapsed_ms);
        let Some(position) = ctx.ecs.get::<Position>(id).copied() else {
            return;
        };
        let velocity = ctx
            .ecs
            .get::<Velocity>(id)
            .map_or(DVec3::ZERO, Velocity::to_vec3);
        if !position.is_finite() || !velocity.is_finite() {
            warn!("{id} has a non-finite position or velocity, skipping integration");
            return;
        }

        let intent = MotionIntent::gather(&ctx.ecs, id);
        // Warp imposes its speed this tick, so route by whichever is faster.
        let speed = velocity.length().max(intent.warp_speed.unwrap_or(0.0));
        match self.resolve_world(ctx, id, &position, speed) {
            Some(world) => collision_update(ctx, id, world, &position, velocity, &intent, dt),
            None => {
                if ctx.shards.detach(id) {
                    debug!("{id} switched to the kinematic path");
                }
                kinematic_update(ctx, id, &position, velocity, &intent, dt);
            }
        }
    }

    fn post_update(&mut self, ctx: &mut SimContext, elapsed_ms: f64) {
        let dt = secs(elapsed_ms);

        self.worlds.clear();
        self.worlds.extend(ctx.shards.world_ids());
        for &world in &self.worlds {
            let Some(state) = ctx.ecs.get::<PhysicsWorld>(world) else {
                ctx.shards.remove_world(world);
                debug!("dropped physics world {world}, its entity is gone");
                continue;
            };
            if !state.enabled {
                continue;
            }
            if let Some(sim) = ctx.shards.world_mut(world) {
                sim.step(dt);
            }
        }

        self.links.clear();
        self.links.extend(ctx.shards.links());
        for &(entity, link) in &self.links {
            if link.fixed {
                continue;
            }
            let Some(origin) = ctx
                .ecs
                .get::<PhysicsWorld>(link.world)
                .filter(|w| w.enabled)
                .map(|w| w.location.to_vec3())
            else {
                continue;
            };
            let Some(body) = ctx.shards.rigid_body(entity) else {
                continue;
            };
            let translation = from_na_vector(body.translation());
            let rotation = from_na_rotation(body.rotation());
            let linvel = from_na_vector(body.linvel());
            let angvel = from_na_vector(body.angvel());
            write_motion(
                &mut ctx.ecs,
                entity,
                to_absolute(translation, origin),
                rotation,
                linvel,
                angvel,
            );
        }

        self.track_idle_worlds(ctx);
    }
}

impl PhysicsSystem {
    /// Count ticks each shard has gone without a moving body and evict
    /// shards idle past the configured limit.
    fn track_idle_worlds(&mut self, ctx: &mut SimContext) {
        let limit = ctx.config.shard_eviction_ticks;
        for &world in &self.worlds {
            let occupied = self
                .links
                .iter()
                .any(|(_, link)| link.world == world && !link.fixed);
            let Some(state) = ctx.ecs.get_mut::<PhysicsWorld>(world) else {
                continue;
            };
            state.idle_ticks = if occupied { 0 } else { state.idle_ticks + 1 };
            let idle = state.idle_ticks;

            if limit.is_some_and(|n| idle >= n) {
                ctx.shards.remove_world(world);
                if let Err(e) = ctx.ecs.remove_entity_by_id(world) {
                    warn!("failed to evict physics world {world}: {e}");
                    continue;
                }
                debug!("evicted physics world {world} after {idle} idle ticks");
            }
        }
    }

    /// The shard an entity should be simulated in this tick, or `None` for
    /// the kinematic path.
    fn resolve_world(
        &mut self,
        ctx: &mut SimContext,
        id: EntityId,
        position: &Position,
        speed: f64,
    ) -> Option<EntityId> {
        if position.frame.is_interstellar() || speed > ctx.config.high_speed_threshold {
            return None;
        }
        let shard_size = ctx.config.shard_size;

        if let Some(link) = ctx.shards.body_of(id) {
            let still_inside = ctx
                .ecs
                .get::<PhysicsWorld>(link.world)
                .is_some_and(|w| w.enabled && entity_in_world(position, &w.location, shard_size));
            if still_inside {
                return Some(link.world);
            }
        }

        let sector = sector_id(position, shard_size)?;
        let fixed = ctx.ecs.has(id, ComponentKind::IsStar) || ctx.ecs.has(id, ComponentKind::IsPlanet);
        let world = if fixed {
            // Fixed bodies never materialize shards, so a miss holds until
            // the set of physics worlds changes.
            let version = ctx.ecs.kind_version(ComponentKind::PhysicsWorld);
            if self.fixed_misses.get(&id) == Some(&(sector, version)) {
                return None;
            }
            let Some(world) = find_world(&ctx.ecs, sector, shard_size) else {
                self.fixed_misses.insert(id, (sector, version));
                return None;
            };
            self.fixed_misses.remove(&id);
            if !ctx.shards.has_world(world) {
                ctx.shards.insert_world(world, RigidBodyWorld::new());
            }
            world
        } else {
            find_or_materialize_world(ctx, sector)
        };
        ctx.ecs
            .get::<PhysicsWorld>(world)
            .is_some_and(|w| w.enabled)
            .then_some(world)
    }
}

fn collision_update(
    ctx: &mut SimContext,
    id: EntityId,
    world: EntityId,
    position: &Position,
    velocity: DVec3,
    intent: &MotionIntent,
    dt: f64,
) {
    let Some(origin) = ctx.ecs.get::<PhysicsWorld>(world).map(|w| w.location.to_vec3()) else {
        return;
    };
    let local = to_local(position.to_vec3(), origin);
    let rotation = ctx
        .ecs
        .get::<Rotation>(id)
        .map_or(DQuat::IDENTITY, Rotation::to_quat);

    let link = match ctx.shards.body_of(id) {
        Some(link) if link.world == world => link,
        _ => {
            let spec = BodySpec::for_entity(&ctx.ecs, id);
            let (body, collider) = spec.build(&mut ctx.shards, local, rotation);
            let Some(link) = ctx.shards.attach(id, world, body, collider) else {
                return;
            };
            debug!("{id} joined physics world {world}");
            link
        }
    };
    if link.fixed {
        return;
    }

    let angvel = ctx
        .ecs
        .get::<RotationVelocity>(id)
        .map_or(DVec3::ZERO, RotationVelocity::to_vec3);

    let Some(body) = ctx.shards.rigid_body_mut(id) else {
        return;
    };
    body.set_translation(to_na_vector(local), true);
    body.set_rotation(to_na_rotation(rotation), true);
    let mut body = RapierBody(body);
    body.set_linvel(velocity);
    body.set_angvel(angvel);
    apply_contributions(&mut body, rotation, intent, dt);
}

fn kinematic_update(
    ctx: &mut SimContext,
    id: EntityId,
    position: &Position,
    velocity: DVec3,
    intent: &MotionIntent,
    dt: f64,
) {
    let rotation = ctx
        .ecs
        .get::<Rotation>(id)
        .map_or(DQuat::IDENTITY, Rotation::to_quat);
    let angvel = ctx
        .ecs
        .get::<RotationVelocity>(id)
        .map_or(DVec3::ZERO, RotationVelocity::to_vec3);

    let mut body = KinematicBody {
        linvel: velocity,
        angvel,
    };
    apply_contributions(&mut body, rotation, intent, dt);

    let mut step = body.linvel * dt;
    if position.frame.is_interstellar() {
        step /= LIGHT_YEAR_KM;
    }
    let next_rotation = integrate_rotation(rotation, body.angvel, dt);
    write_motion(
        &mut ctx.ecs,
        id,
        position.to_vec3() + step,
        next_rotation,
        body.linvel,
        body.angvel,
    );
}

/// Store integrated motion on the entity, plus forward speed on its
/// impulse engines.
fn write_motion(ecs: &mut Ecs, id: EntityId, position: DVec3, rotation: DQuat, velocity: DVec3, angvel: DVec3) {
    if let Some(p) = ecs.get_mut::<Position>(id) {
        p.set_vec3(position);
    }
    if let Some(r) = ecs.get_mut::<Rotation>(id) {
        *r = Rotation::from_quat(rotation);
    }
    if let Some(v) = ecs.get_mut::<Velocity>(id) {
        *v = Velocity::from_vec3(velocity);
    }
    if let Some(w) = ecs.get_mut::<RotationVelocity>(id) {
        *w = RotationVelocity::from_vec3(angvel);
    }
    if let Some(engines) = ship_system_with(ecs, id, ComponentKind::ImpulseEngines) {
        if let Some(engines) = ecs.get_mut::<ImpulseEngines>(engines) {
            engines.forward_velocity = forward_speed(velocity, rotation);
        }
    }
}

/// Rigid body viewed through the shared contribution interface.
///
/// Velocity changes are written as velocities: mass properties are only
/// settled by the first step, and thrust intents already account for mass.
struct RapierBody<'a>(&'a mut RigidBody);

impl MotionBody for RapierBody<'_> {
    fn linvel(&self) -> DVec3 {
        from_na_vector(self.0.linvel())
    }

    fn set_linvel(&mut self, v: DVec3) {
        self.0.set_linvel(to_na_vector(v), true);
    }

    fn apply_velocity_change(&mut self, dv: DVec3) {
        let v = self.linvel() + dv;
        self.set_linvel(v);
    }

    fn angvel(&self) -> DVec3 {
        from_na_vector(self.0.angvel())
    }

    fn set_angvel(&mut self, w: DVec3) {
        self.0.set_angvel(to_na_vector(w), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimConfig;
    use crate::spatial::materialize_world;
    use crate::world_setup::{spawn_planet, spawn_solar_system};

    #[test]
    fn fixed_body_miss_is_cached_until_worlds_change() {
        let mut ctx = SimContext::new(SimConfig::default());
        let mut physics = PhysicsSystem::default();
        let system = spawn_solar_system(&mut ctx.ecs, DVec3::ZERO, 1.0e10);
        let planet = spawn_planet(&mut ctx.ecs, system, DVec3::splat(2_000.0), 100.0);
        let position = *ctx.ecs.get::<Position>(planet).unwrap();
        let sector = sector_id(&position, ctx.config.shard_size).unwrap();

        assert_eq!(physics.resolve_world(&mut ctx, planet, &position, 0.0), None);
        let version = ctx.ecs.kind_version(ComponentKind::PhysicsWorld);
        assert_eq!(physics.fixed_misses.get(&planet), Some(&(sector, version)));

        // A world elsewhere is a change too, but the retry still misses.
        let far = Position::solar(system, 1.0e7, 0.0, 0.0);
        let far_sector = sector_id(&far, ctx.config.shard_size).unwrap();
        materialize_world(&mut ctx, far_sector);
        assert_eq!(physics.resolve_world(&mut ctx, planet, &position, 0.0), None);
        assert!(ctx.shards.body_of(planet).is_none());

        let world = materialize_world(&mut ctx, sector);
        assert_eq!(physics.resolve_world(&mut ctx, planet, &position, 0.0), Some(world));
        assert!(!physics.fixed_misses.contains_key(&planet));
    }
}
