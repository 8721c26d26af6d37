//! Snapshot builder: reads the ECS and the shard table and produces a
//! complete `SimSnapshot`.
//!
//! Read-only; never modifies the world.

use stardeck_core::components::*;
use stardeck_core::enums::*;
use stardeck_core::state::*;
use stardeck_core::types::{Position, Rotation, Velocity};

use super::ship_system_with;
use crate::context::SimContext;
use crate::ecs::Ecs;
use crate::physics::motion::forward_speed;
use crate::physics::ShardTable;

/// Build a complete SimSnapshot from the current context.
pub fn build_snapshot(ctx: &SimContext, phase: SimPhase) -> SimSnapshot {
    SimSnapshot {
        time: ctx.time,
        phase,
        ships: build_ships(&ctx.ecs, &ctx.shards),
        bodies: build_bodies(&ctx.ecs),
        power: build_power(&ctx.ecs),
        reactors: build_reactors(&ctx.ecs),
        batteries: build_batteries(&ctx.ecs),
        physics_worlds: build_physics_worlds(&ctx.ecs, &ctx.shards),
    }
}

fn build_ships(ecs: &Ecs, shards: &ShardTable) -> Vec<ShipView> {
    ecs.entities_with(ComponentKind::IsShip)
        .map(|id| {
            let position = ecs.get::<Position>(id).copied().unwrap_or_default();
            let rotation = ecs.get::<Rotation>(id).copied().unwrap_or_default();
            let velocity = ecs.get::<Velocity>(id).copied().unwrap_or_default();
            let installed = |kind| ship_system_with(ecs, id, kind);
            let impulse = installed(ComponentKind::ImpulseEngines).and_then(|e| ecs.get::<ImpulseEngines>(e));
            let warp = installed(ComponentKind::WarpEngines).and_then(|e| ecs.get::<WarpEngines>(e));
            let autopilot = ecs.get::<Autopilot>(id);

            ShipView {
                id,
                name: ecs.get::<IsShip>(id).map(|s| s.name.clone()).unwrap_or_default(),
                position,
                rotation,
                velocity,
                speed: velocity.speed(),
                forward_speed: forward_speed(velocity.to_vec3(), rotation.to_quat()),
                impulse_target_speed: impulse.map(|i| i.target_speed),
                warp_factor: warp.map(|w| w.current_warp_factor),
                autopilot_engaged: autopilot.is_some_and(|a| a.locked_target.is_some()),
                driving: autopilot.and_then(|a| a.driving),
                physics_path: if shards.body_of(id).is_some() {
                    PhysicsPath::Collision
                } else {
                    PhysicsPath::Kinematic
                },
            }
        })
        .collect()
}

fn build_bodies(ecs: &Ecs) -> Vec<BodyView> {
    let systems = ecs.entities_with(ComponentKind::SolarSystem).filter_map(|id| {
        Some((id, BodyKind::SolarSystem, ecs.get::<SolarSystem>(id)?.radius))
    });
    let stars = ecs
        .entities_with(ComponentKind::IsStar)
        .filter_map(|id| Some((id, BodyKind::Star, ecs.get::<IsStar>(id)?.radius)));
    let planets = ecs
        .entities_with(ComponentKind::IsPlanet)
        .filter_map(|id| Some((id, BodyKind::Planet, ecs.get::<IsPlanet>(id)?.radius)));

    systems
        .chain(stars)
        .chain(planets)
        .map(|(id, kind, radius)| BodyView {
            id,
            kind,
            position: ecs.get::<Position>(id).copied().unwrap_or_default(),
            radius,
        })
        .collect()
}

fn build_power(ecs: &Ecs) -> Vec<PowerView> {
    ecs.entities_with(ComponentKind::Power)
        .filter_map(|id| {
            let power = ecs.get::<Power>(id)?;
            Some(PowerView {
                id,
                requested_power: power.requested_power,
                power_draw: power.power_draw,
                current_power: power.current_power,
                overloaded: power.current_power > power.max_safe_power,
            })
        })
        .collect()
}

fn build_reactors(ecs: &Ecs) -> Vec<ReactorView> {
    ecs.entities_with(ComponentKind::Reactor)
        .filter_map(|id| {
            let reactor = ecs.get::<Reactor>(id)?;
            Some(ReactorView {
                id,
                current_output: reactor.current_output,
                max_output: reactor.max_output,
            })
        })
        .collect()
}

fn build_batteries(ecs: &Ecs) -> Vec<BatteryView> {
    ecs.entities_with(ComponentKind::Battery)
        .filter_map(|id| {
            let battery = ecs.get::<Battery>(id)?;
            Some(BatteryView {
                id,
                storage: battery.storage,
                capacity: battery.capacity,
                charge_amount: battery.charge_amount,
                discharge_amount: battery.discharge_amount,
            })
        })
        .collect()
}

fn build_physics_worlds(ecs: &Ecs, shards: &ShardTable) -> Vec<PhysicsWorldView> {
    ecs.entities_with(ComponentKind::PhysicsWorld)
        .filter_map(|id| {
            let world = ecs.get::<PhysicsWorld>(id)?;
            Some(PhysicsWorldView {
                id,
                location: world.location,
                enabled: world.enabled,
                bodies: shards.body_count(id),
            })
        })
        .collect()
}
