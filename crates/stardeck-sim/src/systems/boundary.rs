//! Moves ships between solar-system frames and interstellar space when they
//! cross a system's boundary radius.

use glam::DVec3;
use log::{info, warn};

use stardeck_core::components::SolarSystem;
use stardeck_core::constants::LIGHT_YEAR_KM;
use stardeck_core::entity::EntityId;
use stardeck_core::enums::{ComponentKind, PositionFrame};
use stardeck_core::types::Position;

use crate::context::SimContext;
use crate::ecs::{Ecs, System};

/// Entering a system requires getting this far inside its radius, so a ship
/// skimming the boundary does not flip frames every tick.
const ENTRY_RADIUS_FRACTION: f64 = 0.99;

pub struct SystemBoundarySystem;

impl System for SystemBoundarySystem {
    fn name(&self) -> &'static str {
        "system_boundary"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::IsShip) && ecs.has(id, ComponentKind::Position)
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, _elapsed_ms: f64) {
        let Some(position) = ctx.ecs.get::<Position>(id).copied() else {
            return;
        };
        if !position.is_finite() {
            return;
        }
        let next = match position.frame {
            PositionFrame::Solar { system } => leave_system(&ctx.ecs, id, system, &position),
            PositionFrame::Interstellar => enter_system(&ctx.ecs, &position),
        };
        let Some(next) = next else {
            return;
        };
        if let Some(p) = ctx.ecs.get_mut::<Position>(id) {
            *p = next;
        }
        ctx.ecs.mark_dirty(id);
    }
}

/// Interstellar position of a ship that has passed its system's radius.
fn leave_system(ecs: &Ecs, id: EntityId, system: EntityId, position: &Position) -> Option<Position> {
    let Some(anchor) = system_anchor(ecs, system) else {
        warn!("{id} is framed in missing solar system {system}");
        return None;
    };
    let radius = ecs.get::<SolarSystem>(system).map_or(0.0, |s| s.radius);
    let offset = position.to_vec3();
    if offset.length() <= radius {
        return None;
    }
    let ly = anchor + offset / LIGHT_YEAR_KM;
    info!("{id} left solar system {system}");
    Some(Position::interstellar(ly.x, ly.y, ly.z))
}

/// Solar position of an interstellar ship that is now inside a system.
fn enter_system(ecs: &Ecs, position: &Position) -> Option<Position> {
    let here = position.to_vec3();
    ecs.entities_with(ComponentKind::SolarSystem)
        .find_map(|system| {
            let anchor = system_anchor(ecs, system)?;
            let radius = ecs.get::<SolarSystem>(system)?.radius;
            let offset = (here - anchor) * LIGHT_YEAR_KM;
            (offset.length() < radius * ENTRY_RADIUS_FRACTION).then_some((system, offset))
        })
        .map(|(system, offset)| {
            info!("ship entered solar system {system}");
            Position::solar(system, offset.x, offset.y, offset.z)
        })
}

/// A solar system's interstellar position in light-years.
fn system_anchor(ecs: &Ecs, system: EntityId) -> Option<DVec3> {
    ecs.get::<Position>(system)
        .filter(|p| p.frame.is_interstellar() && p.is_finite())
        .map(Position::to_vec3)
}
