//! Warp engines: map the commanded warp factor onto a forward speed that
//! physics imposes directly, ignoring mass.

use stardeck_core::components::{Power, WarpEngines};
use stardeck_core::constants::WARP_RESPONSE_PER_SEC;
use stardeck_core::entity::EntityId;
use stardeck_core::enums::ComponentKind;
use stardeck_core::types::Position;

use super::{efficiency, finite, owner_ship, secs};
use crate::context::SimContext;
use crate::ecs::{Ecs, System};

/// Below this (km/s) a winding-down warp field collapses to rest.
const WARP_REST_SPEED: f64 = 0.01;

pub struct WarpEngineSystem;

impl System for WarpEngineSystem {
    fn name(&self) -> &'static str {
        "warp_engines"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::WarpEngines)
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, elapsed_ms: f64) {
        let dt = secs(elapsed_ms);
        let eff = efficiency(ctx.ecs.get::<Power>(id));
        let interstellar = owner_ship(&ctx.ecs, id)
            .and_then(|ship| ctx.ecs.get::<Position>(ship))
            .is_some_and(|p| p.frame.is_interstellar());
        let Some(warp) = ctx.ecs.get_mut::<WarpEngines>(id) else {
            return;
        };
        warp.forward_velocity = next_forward_velocity(warp, interstellar, eff, dt);
    }
}

/// Ease forward speed toward the speed of the commanded factor.
pub fn next_forward_velocity(warp: &WarpEngines, interstellar: bool, efficiency: f64, dt: f64) -> f64 {
    let target = warp.speed_for_factor(warp.current_warp_factor, interstellar) * efficiency;
    let current = finite(warp.forward_velocity).max(0.0);
    let next = current + (target - current) * (WARP_RESPONSE_PER_SEC * dt).min(1.0);
    if target <= 0.0 && next < WARP_REST_SPEED {
        0.0
    } else {
        next
    }
}
