//! Systems run by the scheduler each tick, in pipeline order:
//! power, then engines, then physics, then autopilot.
//!
//! Engine and power components live either on the ship entity itself or on
//! subsystem entities linked to it through `ShipSystems`.

pub mod autopilot_forward;
pub mod autopilot_rotation;
pub mod boundary;
pub mod impulse;
pub mod physics;
pub mod power_draw;
pub mod power_grid;
pub mod reactor;
pub mod snapshot;
pub mod thrusters;
pub mod warp;

use stardeck_core::components::{Mass, Power};
use stardeck_core::entity::EntityId;
use stardeck_core::enums::ComponentKind;

use crate::ecs::{Ecs, System};
use crate::physics::bodies::sanitize_mass;

/// The default ordered pipeline.
pub fn default_pipeline() -> Vec<Box<dyn System>> {
    vec![
        Box::new(reactor::ReactorOutputSystem),
        Box::new(power_draw::PowerDrawSystem),
        Box::new(power_grid::PowerGridSystem::default()),
        Box::new(warp::WarpEngineSystem),
        Box::new(impulse::ImpulseEngineSystem),
        Box::new(thrusters::ThrusterSystem),
        Box::new(physics::PhysicsSystem::default()),
        Box::new(boundary::SystemBoundarySystem),
        Box::new(autopilot_rotation::AutopilotRotationSystem),
        Box::new(autopilot_forward::AutopilotForwardSystem),
    ]
}

/// The ship a subsystem is installed on. A ship is its own owner.
pub fn owner_ship(ecs: &Ecs, id: EntityId) -> Option<EntityId> {
    if ecs.has(id, ComponentKind::IsShip) {
        Some(id)
    } else {
        ecs.ship_of(id)
    }
}

/// The entity carrying `kind` for `ship`: the ship itself, or its first
/// linked subsystem with that component.
pub fn ship_system_with(ecs: &Ecs, ship: EntityId, kind: ComponentKind) -> Option<EntityId> {
    if ecs.has(ship, kind) {
        return Some(ship);
    }
    ecs.get::<stardeck_core::components::ShipSystems>(ship)?
        .ids()
        .find(|&system| ecs.has(system, kind))
}

/// Mass of the ship owning `id`, with the degenerate-mass fallback.
pub fn ship_mass(ecs: &Ecs, id: EntityId) -> f64 {
    let ship = owner_ship(ecs, id).unwrap_or(id);
    sanitize_mass(ecs.get::<Mass>(ship).map(|m| m.mass))
}

/// Fraction of nominal performance a powered system delivers.
///
/// Systems without a `Power` component always run at 1. Below
/// `required_power` a system does nothing; otherwise it scales with how much
/// of its draw is met.
pub fn efficiency(power: Option<&Power>) -> f64 {
    let Some(power) = power else {
        return 1.0;
    };
    let current = finite(power.current_power);
    let draw = finite(power.power_draw);
    if current < finite(power.required_power) {
        0.0
    } else if draw <= 0.0 {
        1.0
    } else {
        (current / draw).clamp(0.0, 1.0)
    }
}

/// Elapsed milliseconds as seconds.
pub fn secs(elapsed_ms: f64) -> f64 {
    if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
        elapsed_ms / 1000.0
    } else {
        0.0
    }
}

pub(crate) fn finite(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_rules() {
        assert_eq!(efficiency(None), 1.0);
        let mut p = Power {
            requested_power: 10.0,
            power_draw: 8.0,
            current_power: 4.0,
            required_power: 2.0,
            ..Power::default()
        };
        assert!((efficiency(Some(&p)) - 0.5).abs() < 1e-12);
        p.current_power = 1.0;
        assert_eq!(efficiency(Some(&p)), 0.0);
        p.required_power = 0.0;
        p.power_draw = 0.0;
        p.current_power = 0.0;
        assert_eq!(efficiency(Some(&p)), 1.0);
    }
}
