//! Ordered system execution with lazily maintained membership.

use std::collections::BTreeSet;

use log::{debug, trace};

use stardeck_core::entity::EntityId;

use super::world::Ecs;
use crate::context::SimContext;

/// Membership re-tests can cascade when hooks create or change entities;
/// bounded so a misbehaving hook cannot stall the tick.
const MAX_REFRESH_PASSES: usize = 8;

/// A unit of per-tick logic over the entities it matches.
///
/// Only `update` mutates entity state. `post_update` may write results of a
/// global barrier (the physics step) back onto entities.
pub trait System {
    fn name(&self) -> &'static str;

    /// Run every Nth tick. Elapsed time accumulates across skipped ticks.
    fn frequency(&self) -> u32 {
        1
    }

    /// Membership predicate, re-evaluated only when the entity is dirty.
    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool;

    fn enter(&mut self, _ctx: &mut SimContext, _id: EntityId) {}

    fn exit(&mut self, _ctx: &mut SimContext, _id: EntityId) {}

    fn pre_update(&mut self, _ctx: &SimContext, _elapsed_ms: f64) {}

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, elapsed_ms: f64);

    fn post_update(&mut self, _ctx: &mut SimContext, _elapsed_ms: f64) {}
}

struct SystemEntry {
    system: Box<dyn System>,
    members: BTreeSet<EntityId>,
    counter: u32,
    accumulated_ms: f64,
}

/// Systems in registration order, which is also execution order.
#[derive(Default)]
pub struct Scheduler {
    entries: Vec<SystemEntry>,
    scratch: Vec<EntityId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system and evaluate every existing entity against it.
    pub fn register(&mut self, ctx: &mut SimContext, system: Box<dyn System>) {
        let mut entry = SystemEntry {
            system,
            members: BTreeSet::new(),
            counter: 0,
            accumulated_ms: 0.0,
        };
        let existing: Vec<EntityId> = ctx.ecs.entities().collect();
        for id in existing {
            if entry.system.matches(&ctx.ecs, id) {
                entry.members.insert(id);
                entry.system.enter(ctx, id);
            }
        }
        debug!(
            "registered system {} with {} members",
            entry.system.name(),
            entry.members.len()
        );
        self.entries.push(entry);
    }

    /// Apply pending removals and re-test dirty entities.
    pub fn refresh(&mut self, ctx: &mut SimContext) {
        for _ in 0..MAX_REFRESH_PASSES {
            let removed = ctx.ecs.take_removed();
            let dirty = ctx.ecs.take_dirty();
            if removed.is_empty() && dirty.is_empty() {
                return;
            }

            for &id in &removed {
                for entry in &mut self.entries {
                    if entry.members.remove(&id) {
                        trace!("{} exit {id} (removed)", entry.system.name());
                        entry.system.exit(ctx, id);
                    }
                }
            }

            for &id in &dirty {
                if !ctx.ecs.is_alive(id) {
                    continue;
                }
                for entry in &mut self.entries {
                    let matches = entry.system.matches(&ctx.ecs, id);
                    let member = entry.members.contains(&id);
                    if matches && !member {
                        entry.members.insert(id);
                        trace!("{} enter {id}", entry.system.name());
                        entry.system.enter(ctx, id);
                    } else if !matches && member {
                        entry.members.remove(&id);
                        trace!("{} exit {id}", entry.system.name());
                        entry.system.exit(ctx, id);
                    }
                }
            }
        }
        debug!("membership refresh did not settle in {MAX_REFRESH_PASSES} passes");
    }

    /// One tick: refresh memberships, then run each due system in order.
    pub fn run(&mut self, ctx: &mut SimContext, elapsed_ms: f64) {
        self.refresh(ctx);

        for entry in &mut self.entries {
            entry.counter += 1;
            entry.accumulated_ms += elapsed_ms;
            if entry.counter < entry.system.frequency().max(1) {
                continue;
            }
            entry.counter = 0;
            let dt_ms = std::mem::take(&mut entry.accumulated_ms);

            entry.system.pre_update(ctx, dt_ms);
            self.scratch.clear();
            self.scratch.extend(entry.members.iter().copied());
            for &id in &self.scratch {
                if ctx.ecs.is_alive(id) {
                    entry.system.update(ctx, id, dt_ms);
                }
            }
            entry.system.post_update(ctx, dt_ms);
        }
    }

    pub fn system_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.system.name())
    }

    /// Members of the named system, ordered by id.
    pub fn members_of(&self, name: &str) -> Option<&BTreeSet<EntityId>> {
        self.entries
            .iter()
            .find(|entry| entry.system.name() == name)
            .map(|entry| &entry.members)
    }

    /// Names of the systems an entity currently belongs to.
    pub fn systems_of(&self, id: EntityId) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|entry| entry.members.contains(&id))
            .map(|entry| entry.system.name())
            .collect()
    }
}
