//! Thrusters: commanded translation and rotation become local-frame
//! acceleration intents.

use glam::DVec3;

use stardeck_core::components::{Power, Thrusters};
use stardeck_core::entity::EntityId;
use stardeck_core::enums::ComponentKind;

use super::{efficiency, ship_mass};
use crate::context::SimContext;
use crate::ecs::{Ecs, System};

pub struct ThrusterSystem;

impl System for ThrusterSystem {
    fn name(&self) -> &'static str {
        "thrusters"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::Thrusters)
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, _elapsed_ms: f64) {
        let eff = efficiency(ctx.ecs.get::<Power>(id));
        let mass = ship_mass(&ctx.ecs, id);
        let Some(thrusters) = ctx.ecs.get_mut::<Thrusters>(id) else {
            return;
        };
        let scale = |command: DVec3, thrust: f64| {
            let command = if command.is_finite() {
                command.clamp(DVec3::splat(-1.0), DVec3::ONE)
            } else {
                DVec3::ZERO
            };
            command * thrust.max(0.0) / mass * eff
        };
        thrusters.direction_acceleration = scale(thrusters.direction, thrusters.direction_thrust);
        thrusters.rotation_acceleration = scale(thrusters.rotation_delta, thrusters.rotation_thrust);
    }
}
