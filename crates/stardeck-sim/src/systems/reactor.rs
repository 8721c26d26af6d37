//! Reactor output: the power each reactor puts on the grid this tick.

use stardeck_core::components::Reactor;
use stardeck_core::entity::EntityId;
use stardeck_core::enums::ComponentKind;

use super::finite;
use crate::context::SimContext;
use crate::ecs::{Ecs, System};

pub struct ReactorOutputSystem;

impl System for ReactorOutputSystem {
    fn name(&self) -> &'static str {
        "reactor_output"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::Reactor)
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, _elapsed_ms: f64) {
        if let Some(reactor) = ctx.ecs.get_mut::<Reactor>(id) {
            reactor.current_output =
                finite(reactor.max_output).max(0.0) * finite(reactor.desired_output).clamp(0.0, 1.0);
        }
    }
}
