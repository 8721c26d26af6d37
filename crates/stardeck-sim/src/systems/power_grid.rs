//! Power grid: routes reactor output and battery reserves through power
//! nodes to the terminal systems of one ship.
//!
//! Per ship per tick:
//! 1. each node requests the summed draw of its connected systems;
//! 2. reactors feeding batteries go first, then by ascending connection count;
//! 3. each reactor water-fills its output over its nodes' unmet requests and
//!    charges its batteries with what is left;
//! 4. nodes still short discharge their connected batteries;
//! 5. nodes hand their supply to their systems by distribution mode.

use std::collections::HashMap;
use std::ops::Range;

use log::trace;

use stardeck_core::components::*;
use stardeck_core::constants::MS_PER_HOUR;
use stardeck_core::entity::EntityId;
use stardeck_core::enums::{ComponentKind, DistributionMode};

use super::finite;
use crate::context::SimContext;
use crate::ecs::{Ecs, System};
use crate::waterfill::Allocator;

struct NodeState {
    id: EntityId,
    requested: f64,
    supplied: f64,
}

struct ReactorState {
    output: f64,
    feeds_battery: bool,
    /// Indices into `nodes`, as a range of `reactor_nodes`.
    nodes: Range<usize>,
    /// Indices into `batteries`, as a range of `reactor_batteries`.
    batteries: Range<usize>,
}

impl ReactorState {
    fn connections(&self) -> usize {
        self.nodes.len() + self.batteries.len()
    }
}

/// Scratch buffers are kept between ticks.
#[derive(Default)]
pub struct PowerGridSystem {
    alloc: Allocator,
    systems: Vec<EntityId>,
    nodes: Vec<NodeState>,
    batteries: Vec<EntityId>,
    reactors: Vec<ReactorState>,
    reactor_nodes: Vec<usize>,
    reactor_batteries: Vec<usize>,
    requests: Vec<f64>,
    grants: Vec<f64>,
    picked: Vec<usize>,
    supplied_to: HashMap<EntityId, f64>,
}

impl System for PowerGridSystem {
    fn name(&self) -> &'static str {
        "power_grid"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::IsShip) && ecs.has(id, ComponentKind::ShipSystems)
    }

    fn update(&mut self, ctx: &mut SimContext, ship: EntityId, elapsed_ms: f64) {
        let hours = if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            elapsed_ms / MS_PER_HOUR
        } else {
            0.0
        };
        let ecs = &mut ctx.ecs;

        self.systems.clear();
        if let Some(links) = ecs.get::<ShipSystems>(ship) {
            self.systems.extend(links.ids());
        }
        if ecs.has(ship, ComponentKind::Power) {
            self.systems.push(ship);
        }
        self.systems.retain(|&id| ecs.is_alive(id));

        self.collect_nodes(ecs);
        self.collect_batteries(ecs);
        self.collect_reactors(ecs);

        self.run_reactors(ecs, hours);
        self.discharge_batteries(ecs, hours);
        self.distribute(ecs);

        trace!(
            "power grid {ship}: {} nodes, {} reactors, {} batteries",
            self.nodes.len(),
            self.reactors.len(),
            self.batteries.len()
        );
    }
}

impl PowerGridSystem {
    fn collect_nodes(&mut self, ecs: &Ecs) {
        self.nodes.clear();
        for &id in &self.systems {
            let Some(node) = ecs.get::<PowerNode>(id) else {
                continue;
            };
            let requested = node
                .connected_systems
                .iter()
                .filter_map(|&system| ecs.get::<Power>(system))
                .map(|power| finite(power.power_draw).max(0.0))
                .sum();
            self.nodes.push(NodeState {
                id,
                requested,
                supplied: 0.0,
            });
        }
    }

    fn collect_batteries(&mut self, ecs: &mut Ecs) {
        self.batteries.clear();
        for &id in &self.systems {
            if let Some(battery) = ecs.get_mut::<Battery>(id) {
                battery.capacity = finite(battery.capacity).max(0.0);
                battery.storage = finite(battery.storage).clamp(0.0, battery.capacity);
                battery.charge_amount = 0.0;
                battery.discharge_amount = 0.0;
                self.batteries.push(id);
            }
        }
    }

    fn collect_reactors(&mut self, ecs: &Ecs) {
        self.reactors.clear();
        self.reactor_nodes.clear();
        self.reactor_batteries.clear();
        for &id in &self.systems {
            let Some(reactor) = ecs.get::<Reactor>(id) else {
                continue;
            };
            let node_start = self.reactor_nodes.len();
            let battery_start = self.reactor_batteries.len();
            for target in &reactor.connected {
                if let Some(i) = self.nodes.iter().position(|n| n.id == *target) {
                    self.reactor_nodes.push(i);
                } else if let Some(i) = self.batteries.iter().position(|b| b == target) {
                    self.reactor_batteries.push(i);
                }
            }
            let batteries = battery_start..self.reactor_batteries.len();
            self.reactors.push(ReactorState {
                output: finite(reactor.current_output).max(0.0),
                feeds_battery: !batteries.is_empty(),
                nodes: node_start..self.reactor_nodes.len(),
                batteries,
            });
        }
        self.reactors
            .sort_by_key(|r| (!r.feeds_battery, r.connections()));
    }

    fn run_reactors(&mut self, ecs: &mut Ecs, hours: f64) {
        for r in 0..self.reactors.len() {
            let reactor = &self.reactors[r];
            if reactor.connections() == 0 {
                continue;
            }
            let output = reactor.output;
            let node_range = reactor.nodes.clone();
            let battery_range = reactor.batteries.clone();

            self.requests.clear();
            for &i in &self.reactor_nodes[node_range.clone()] {
                let node = &self.nodes[i];
                self.requests.push((node.requested - node.supplied).max(0.0));
            }
            self.alloc.water_fill(&self.requests, output, &mut self.grants);
            let mut leftover = output;
            for (k, &i) in self.reactor_nodes[node_range].iter().enumerate() {
                self.nodes[i].supplied += self.grants[k];
                leftover -= self.grants[k];
            }

            if leftover <= 0.0 || hours <= 0.0 || battery_range.is_empty() {
                continue;
            }
            self.requests.clear();
            for &b in &self.reactor_batteries[battery_range.clone()] {
                let room = ecs.get::<Battery>(self.batteries[b]).map_or(0.0, |battery| {
                    let by_rate = finite(battery.charge_rate) - battery.charge_amount;
                    let by_capacity = (battery.capacity - battery.storage) / hours;
                    by_rate.min(by_capacity).max(0.0)
                });
                self.requests.push(room);
            }
            self.alloc.water_fill(&self.requests, leftover, &mut self.grants);
            for (k, &b) in self.reactor_batteries[battery_range].iter().enumerate() {
                let grant = self.grants[k];
                if let Some(battery) = ecs.get_mut::<Battery>(self.batteries[b]) {
                    battery.storage = (battery.storage + grant * hours).clamp(0.0, battery.capacity);
                    battery.charge_amount += grant;
                }
            }
        }
    }

    fn discharge_batteries(&mut self, ecs: &mut Ecs, hours: f64) {
        for n in 0..self.nodes.len() {
            let shortfall = self.nodes[n].requested - self.nodes[n].supplied;
            if shortfall <= 1e-12 {
                continue;
            }
            let node_id = self.nodes[n].id;

            self.picked.clear();
            self.requests.clear();
            for (b, &battery_id) in self.batteries.iter().enumerate() {
                let Some(battery) = ecs.get::<Battery>(battery_id) else {
                    continue;
                };
                if !battery.connected_nodes.contains(&node_id) {
                    continue;
                }
                let by_rate = finite(battery.discharge_rate) - battery.discharge_amount;
                // Nothing can be drawn over a zero-length tick.
                let by_storage = if hours > 0.0 {
                    battery.storage / hours
                } else {
                    0.0
                };
                self.picked.push(b);
                self.requests.push(by_rate.min(by_storage).max(0.0));
            }
            if self.picked.is_empty() {
                continue;
            }

            self.alloc.water_fill(&self.requests, shortfall, &mut self.grants);
            for (k, &b) in self.picked.iter().enumerate() {
                let grant = self.grants[k];
                if let Some(battery) = ecs.get_mut::<Battery>(self.batteries[b]) {
                    battery.storage = (battery.storage - grant * hours).clamp(0.0, battery.capacity);
                    battery.discharge_amount += grant;
                }
                self.nodes[n].supplied += grant;
            }
        }
    }

    fn distribute(&mut self, ecs: &mut Ecs) {
        self.supplied_to.clear();
        for node_state in &self.nodes {
            let Some(node) = ecs.get_mut::<PowerNode>(node_state.id) else {
                continue;
            };
            node.requested_power = node_state.requested;
            node.supplied_power = node_state.supplied;
            let mode = node.distribution_mode;

            self.picked.clear();
            self.requests.clear();
            let Some(node) = ecs.get::<PowerNode>(node_state.id) else {
                continue;
            };
            for (k, &system) in node.connected_systems.iter().enumerate() {
                if let Some(power) = ecs.get::<Power>(system) {
                    self.picked.push(k);
                    self.requests.push(finite(power.power_draw).max(0.0));
                }
            }
            match mode {
                DistributionMode::Evenly => {
                    self.alloc
                        .water_fill(&self.requests, node_state.supplied, &mut self.grants)
                }
                DistributionMode::MostFirst => self.alloc.greedy_fill(
                    &self.requests,
                    node_state.supplied,
                    true,
                    &mut self.grants,
                ),
                DistributionMode::LeastFirst => self.alloc.greedy_fill(
                    &self.requests,
                    node_state.supplied,
                    false,
                    &mut self.grants,
                ),
            }
            for (g, &k) in self.picked.iter().enumerate() {
                let system = node.connected_systems[k];
                *self.supplied_to.entry(system).or_insert(0.0) += self.grants[g];
            }
        }

        for &id in &self.systems {
            let supplied = self.supplied_to.get(&id).copied().unwrap_or(0.0);
            set_current_power(ecs, id, supplied);
        }
        for (&id, &supplied) in &self.supplied_to {
            set_current_power(ecs, id, supplied);
        }
    }
}

fn set_current_power(ecs: &mut Ecs, id: EntityId, supplied: f64) {
    if let Some(power) = ecs.get_mut::<Power>(id) {
        let draw = finite(power.power_draw).max(0.0);
        power.current_power = finite(supplied).clamp(0.0, draw);
    }
}
