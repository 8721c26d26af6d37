//! Impulse engines: turn the commanded target speed into a forward
//! acceleration intent for the physics system.

use stardeck_core::components::{ImpulseEngines, Power};
use stardeck_core::entity::EntityId;
use stardeck_core::enums::ComponentKind;

use super::{efficiency, finite, secs, ship_mass};
use crate::context::SimContext;
use crate::ecs::{Ecs, System};

pub struct ImpulseEngineSystem;

impl System for ImpulseEngineSystem {
    fn name(&self) -> &'static str {
        "impulse_engines"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::ImpulseEngines)
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, elapsed_ms: f64) {
        let dt = secs(elapsed_ms);
        let eff = efficiency(ctx.ecs.get::<Power>(id));
        let mass = ship_mass(&ctx.ecs, id);
        let Some(engines) = ctx.ecs.get_mut::<ImpulseEngines>(id) else {
            return;
        };
        engines.forward_acceleration = forward_acceleration(engines, mass, eff, dt);
    }
}

/// Acceleration (km/s²) that moves forward speed toward the target.
///
/// The gap closes by a fraction `min(1, rate · dt)` each tick, where the
/// rate is the engine's full-thrust acceleration relative to cruising speed.
/// Speed therefore approaches the target asymptotically and never
/// overshoots. Unpowered engines produce nothing.
pub fn forward_acceleration(engines: &ImpulseEngines, mass: f64, efficiency: f64, dt: f64) -> f64 {
    if dt <= 0.0 || efficiency <= 0.0 || engines.cruising_speed <= 0.0 {
        return 0.0;
    }
    let ceiling = finite(engines.emergency_speed).max(engines.cruising_speed);
    let target = finite(engines.target_speed).clamp(0.0, ceiling) * efficiency;
    let gap = target - finite(engines.forward_velocity);
    let rate = finite(engines.thrust).max(0.0) / mass / engines.cruising_speed;
    gap * (rate * dt).min(1.0) / dt
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 30.0;

    #[test]
    fn approaches_target_without_overshoot() {
        let mut engines = ImpulseEngines {
            target_speed: 500.0,
            ..ImpulseEngines::default()
        };
        let mut last = 0.0;
        for _ in 0..600 {
            let a = forward_acceleration(&engines, 2_000.0, 1.0, DT);
            engines.forward_velocity += a * DT;
            assert!(engines.forward_velocity >= last);
            assert!(engines.forward_velocity <= 500.0 + 1e-9);
            last = engines.forward_velocity;
        }
        assert!((last - 500.0).abs() < 1e-3);
    }

    #[test]
    fn brakes_toward_lower_target() {
        let engines = ImpulseEngines {
            target_speed: 0.0,
            forward_velocity: 300.0,
            ..ImpulseEngines::default()
        };
        assert!(forward_acceleration(&engines, 2_000.0, 1.0, DT) < 0.0);
    }

    #[test]
    fn unpowered_engines_do_nothing() {
        let engines = ImpulseEngines {
            target_speed: 500.0,
            ..ImpulseEngines::default()
        };
        assert_eq!(forward_acceleration(&engines, 2_000.0, 0.0, DT), 0.0);
    }

    #[test]
    fn heavy_ship_accelerates_slower() {
        let engines = ImpulseEngines {
            target_speed: 500.0,
            ..ImpulseEngines::default()
        };
        let light = forward_acceleration(&engines, 2_000.0, 1.0, DT);
        let heavy = forward_acceleration(&engines, 200_000.0, 1.0, DT);
        assert!(heavy < light);
    }
}
