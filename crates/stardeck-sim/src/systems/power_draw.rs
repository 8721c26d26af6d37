//! Power draw: how much each powered entity wants from the grid given its
//! current workload, capped by the crew's requested ceiling.

use stardeck_core::components::*;
use stardeck_core::entity::EntityId;
use stardeck_core::enums::ComponentKind;
use stardeck_core::types::Position;

use super::{finite, owner_ship};
use crate::context::SimContext;
use crate::ecs::{Ecs, System};

pub struct PowerDrawSystem;

impl System for PowerDrawSystem {
    fn name(&self) -> &'static str {
        "power_draw"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::Power)
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, _elapsed_ms: f64) {
        let Some(power) = ctx.ecs.get::<Power>(id) else {
            return;
        };
        let demand = workload_demand(&ctx.ecs, id, power);
        let requested = finite(power.requested_power).max(0.0);
        let draw = demand.min(requested).max(0.0);

        if let Some(power) = ctx.ecs.get_mut::<Power>(id) {
            power.requested_power = requested;
            power.power_draw = draw;
            power.current_power = finite(power.current_power).clamp(0.0, draw);
        }
    }
}

/// Demand at the system's current workload, in MW.
pub fn workload_demand(ecs: &Ecs, id: EntityId, power: &Power) -> f64 {
    let nominal = finite(power.default_power).max(0.0);
    let required = finite(power.required_power).max(0.0);

    if let Some(engines) = ecs.get::<ImpulseEngines>(id) {
        if engines.target_speed <= 0.0 || engines.cruising_speed <= 0.0 {
            return 0.0;
        }
        return (nominal * engines.target_speed / engines.cruising_speed).max(required);
    }
    if let Some(warp) = ecs.get::<WarpEngines>(id) {
        if warp.current_warp_factor <= 0.0 {
            return 0.0;
        }
        let interstellar = owner_ship(ecs, id)
            .and_then(|ship| ecs.get::<Position>(ship))
            .is_some_and(|p| p.frame.is_interstellar());
        let cruise = warp.cruising_speed(interstellar);
        if cruise <= 0.0 {
            return required;
        }
        let speed = warp.speed_for_factor(warp.current_warp_factor, interstellar);
        return (nominal * speed / cruise).max(required);
    }
    if let Some(thrusters) = ecs.get::<Thrusters>(id) {
        return if thrusters.is_thrusting() {
            nominal
        } else {
            required
        };
    }
    if let Some(dampeners) = ecs.get::<InertialDampeners>(id) {
        return if dampeners.dampening > 0.0 {
            nominal
        } else {
            0.0
        };
    }
    nominal
}
