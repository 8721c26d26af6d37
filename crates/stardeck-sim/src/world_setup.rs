//! Entity spawn factories for setting up the simulation world.
//!
//! Ships are spawned with their subsystems as separate entities linked
//! through `ShipSystems`, and a single reactor-fed power node with a
//! backup battery.

use glam::DVec3;
use rand::Rng;

use stardeck_core::components::*;
use stardeck_core::entity::EntityId;
use stardeck_core::error::EcsError;
use stardeck_core::types::{Position, Rotation, RotationVelocity, Velocity};

use crate::context::SimContext;
use crate::ecs::Ecs;

/// Every entity making up one spawned ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipHandles {
    pub ship: EntityId,
    pub reactor: EntityId,
    pub battery: EntityId,
    pub node: EntityId,
    pub impulse: EntityId,
    pub warp: EntityId,
    pub thrusters: EntityId,
    pub dampeners: EntityId,
}

/// The demo world: one system with a star, a planet and a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoWorld {
    pub system: EntityId,
    pub star: EntityId,
    pub planet: EntityId,
    pub ship: ShipHandles,
}

/// Solar system anchored at an interstellar position (light-years).
pub fn spawn_solar_system(ecs: &mut Ecs, position_ly: DVec3, radius_km: f64) -> EntityId {
    ecs.add_entity()
        .with(SolarSystem { radius: radius_km })
        .with(Position::interstellar(position_ly.x, position_ly.y, position_ly.z))
        .id()
}

/// Star at the center of `system`.
pub fn spawn_star(ecs: &mut Ecs, system: EntityId, radius_km: f64) -> EntityId {
    ecs.add_entity()
        .with(IsStar { radius: radius_km })
        .with(Position::solar(system, 0.0, 0.0, 0.0))
        .with(Mass { mass: 2.0e30 })
        .id()
}

pub fn spawn_planet(ecs: &mut Ecs, system: EntityId, position_km: DVec3, radius_km: f64) -> EntityId {
    ecs.add_entity()
        .with(IsPlanet { radius: radius_km })
        .with(Position::solar(system, position_km.x, position_km.y, position_km.z))
        .with(Mass { mass: 6.0e24 })
        .id()
}

pub fn spawn_torpedo(ecs: &mut Ecs, position: Position, velocity: DVec3) -> EntityId {
    ecs.add_entity()
        .with(IsTorpedo::default())
        .with(position)
        .with(Velocity::from_vec3(velocity))
        .with(Rotation::default())
        .with(Mass { mass: 50.0 })
        .id()
}

/// Spawn a ship with a full set of powered subsystems.
pub fn spawn_ship(ecs: &mut Ecs, name: &str, position: Position) -> Result<ShipHandles, EcsError> {
    let ship = ecs
        .add_entity()
        .with(IsShip {
            name: name.to_string(),
        })
        .with(position)
        .with(Velocity::default())
        .with(Rotation::default())
        .with(RotationVelocity::default())
        .with(Mass::default())
        .with(Size::default())
        .with(Autopilot::default())
        .with(ShipSystems::default())
        .id();

    let impulse = spawn_powered(ecs, ImpulseEngines::default(), powered(40.0, 5.0, 50.0));
    let warp = spawn_powered(ecs, WarpEngines::default(), powered(60.0, 10.0, 80.0));
    let thrusters = spawn_powered(ecs, Thrusters::default(), powered(10.0, 1.0, 15.0));
    let dampeners = spawn_powered(ecs, InertialDampeners::default(), powered(5.0, 1.0, 8.0));

    let node = ecs
        .add_entity()
        .with(PowerNode {
            connected_systems: vec![impulse, warp, thrusters, dampeners],
            ..PowerNode::default()
        })
        .id();
    let battery = ecs
        .add_entity()
        .with(Battery {
            connected_nodes: vec![node],
            ..Battery::default()
        })
        .id();
    let reactor = ecs
        .add_entity()
        .with(Reactor {
            connected: vec![node, battery],
            ..Reactor::default()
        })
        .id();

    let rooms = [
        (reactor, "Engineering"),
        (battery, "Engineering"),
        (node, "Engineering"),
        (impulse, "Impulse Room"),
        (warp, "Warp Core"),
        (thrusters, "Bridge"),
        (dampeners, "Bridge"),
    ];
    for (system, room) in rooms {
        ecs.link_ship_system(ship, system, Some(room.to_string()))?;
    }

    Ok(ShipHandles {
        ship,
        reactor,
        battery,
        node,
        impulse,
        warp,
        thrusters,
        dampeners,
    })
}

/// Spawn `count` ships at random offsets of up to `spread_km` per axis
/// around `center_km` in `system`, drawing from the context RNG.
pub fn scatter_ships(
    ctx: &mut SimContext,
    system: EntityId,
    center_km: DVec3,
    count: usize,
    spread_km: f64,
) -> Result<Vec<ShipHandles>, EcsError> {
    let spread = spread_km.abs().max(1.0);
    (0..count)
        .map(|i| {
            let offset = DVec3::new(
                ctx.rng.gen_range(-spread..spread),
                ctx.rng.gen_range(-spread..spread),
                ctx.rng.gen_range(-spread..spread),
            );
            let p = center_km + offset;
            spawn_ship(
                &mut ctx.ecs,
                &format!("Ship {}", i + 1),
                Position::solar(system, p.x, p.y, p.z),
            )
        })
        .collect()
}

/// A system with a star, one planet and a ship parked between them.
pub fn setup_demo(ecs: &mut Ecs) -> Result<DemoWorld, EcsError> {
    let system = spawn_solar_system(ecs, DVec3::ZERO, stardeck_core::constants::DEFAULT_SOLAR_SYSTEM_RADIUS_KM);
    let star = spawn_star(ecs, system, IsStar::default().radius);
    let planet = spawn_planet(ecs, system, DVec3::new(1.5e8, 0.0, 0.0), IsPlanet::default().radius);
    let ship = spawn_ship(ecs, "Odyssey", Position::solar(system, 1.5e8, 0.0, -50_000.0))?;
    Ok(DemoWorld {
        system,
        star,
        planet,
        ship,
    })
}

fn spawn_powered<T: crate::ecs::Component>(ecs: &mut Ecs, component: T, power: Power) -> EntityId {
    ecs.add_entity().with(component).with(power).id()
}

fn powered(nominal: f64, required: f64, max_safe: f64) -> Power {
    Power {
        requested_power: nominal,
        default_power: nominal,
        required_power: required,
        max_safe_power: max_safe,
        ..Power::default()
    }
}
