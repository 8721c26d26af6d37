//! Forward autopilot: picks impulse or warp for the remaining distance and
//! commands that engine's target through its PID controller.

use glam::DVec3;
use log::debug;

use stardeck_autopilot::coordinates::resolve_coordinates;
use stardeck_autopilot::forward::{impulse_command, select_engine, warp_command};
use stardeck_autopilot::pid;
use stardeck_autopilot::steering::heading_error;
use stardeck_core::components::{Autopilot, AutopilotTarget, ImpulseEngines, Thrusters, WarpEngines};
use stardeck_core::constants::{AUTOPILOT_ARRIVAL_DISTANCE_KM, AUTOPILOT_HEADING_TOLERANCE, LIGHT_YEAR_KM};
use stardeck_core::entity::EntityId;
use stardeck_core::enums::{ComponentKind, ForwardEngine};
use stardeck_core::types::{Position, Rotation};

use super::{secs, ship_system_with};
use crate::context::SimContext;
use crate::ecs::{Ecs, System};

pub struct AutopilotForwardSystem;

/// Engines installed on one ship.
#[derive(Clone, Copy)]
struct Drives {
    impulse: Option<EntityId>,
    warp: Option<EntityId>,
    thrusters: Option<EntityId>,
}

impl Drives {
    fn of(ecs: &Ecs, ship: EntityId) -> Self {
        Self {
            impulse: ship_system_with(ecs, ship, ComponentKind::ImpulseEngines),
            warp: ship_system_with(ecs, ship, ComponentKind::WarpEngines),
            thrusters: ship_system_with(ecs, ship, ComponentKind::Thrusters),
        }
    }

    fn set_impulse_target(&self, ecs: &mut Ecs, speed: f64) {
        if let Some(engines) = self.impulse.and_then(|e| ecs.get_mut::<ImpulseEngines>(e)) {
            engines.target_speed = speed;
        }
    }

    fn set_warp_factor(&self, ecs: &mut Ecs, factor: f64) {
        if let Some(warp) = self.warp.and_then(|e| ecs.get_mut::<WarpEngines>(e)) {
            warp.current_warp_factor = factor;
        }
    }
}

impl System for AutopilotForwardSystem {
    fn name(&self) -> &'static str {
        "autopilot_forward"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::Autopilot) && ecs.has(id, ComponentKind::Position)
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, elapsed_ms: f64) {
        let dt = secs(elapsed_ms);
        let ecs = &mut ctx.ecs;
        let Some(mut autopilot) = ecs.get::<Autopilot>(id).cloned() else {
            return;
        };
        let drives = Drives::of(ecs, id);

        let target = match autopilot.desired_coordinates {
            Some(coordinates) if autopilot.forward_autopilot => AutopilotTarget {
                coordinates,
                system: autopilot.desired_system,
            },
            _ => {
                release(ecs, id, autopilot, drives);
                return;
            }
        };

        let Some(position) = ecs.get::<Position>(id).copied() else {
            return;
        };
        let rotation = ecs.get::<Rotation>(id).copied().unwrap_or_default();
        let Some(resolved) = resolve_coordinates(&position, target.coordinates, target.system, |system| {
            ecs.get::<Position>(system).map(Position::to_vec3)
        }) else {
            debug!("{id} autopilot cannot resolve its destination frame");
            release(ecs, id, autopilot, drives);
            return;
        };

        if autopilot.locked_target != Some(target) {
            debug!("{id} autopilot locked onto {:?}", target.coordinates);
            reset_controllers(&mut autopilot);
            autopilot.locked_target = Some(target);
        }

        let mut distance = resolved.position.distance(resolved.destination);
        if resolved.interstellar {
            distance *= LIGHT_YEAR_KM;
        }
        if !distance.is_finite() {
            release(ecs, id, autopilot, drives);
            return;
        }

        if distance < AUTOPILOT_ARRIVAL_DISTANCE_KM {
            if autopilot.driving.take().is_some() {
                debug!("{id} autopilot arrived");
            }
            drives.set_impulse_target(ecs, 0.0);
            drives.set_warp_factor(ecs, 0.0);
            store(ecs, id, autopilot);
            return;
        }

        let impulse = drives.impulse.and_then(|e| ecs.get::<ImpulseEngines>(e)).copied();
        let warp = drives.warp.and_then(|e| ecs.get::<WarpEngines>(e)).copied();
        let engine = match (select_engine(distance, impulse.map_or(0.0, |i| i.cruising_speed)), impulse, warp) {
            (ForwardEngine::Warp, _, Some(_)) => ForwardEngine::Warp,
            (_, Some(_), _) => ForwardEngine::Impulse,
            (_, None, Some(_)) => ForwardEngine::Warp,
            (_, None, None) => return,
        };

        if autopilot.driving != Some(engine) {
            debug!("{id} autopilot switching to {engine:?}");
            pid::reset(&mut autopilot.impulse_controller);
            pid::reset(&mut autopilot.warp_controller);
            autopilot.driving = Some(engine);
        }

        let aligned =
            heading_error(rotation.to_quat(), resolved.position, resolved.destination) <= AUTOPILOT_HEADING_TOLERANCE;
        match (engine, impulse, warp) {
            (ForwardEngine::Impulse, Some(impulse), _) => {
                let speed = impulse_command(
                    &mut autopilot.impulse_controller,
                    distance,
                    dt,
                    impulse.cruising_speed,
                );
                drives.set_impulse_target(ecs, if aligned { speed } else { 0.0 });
                drives.set_warp_factor(ecs, 0.0);
            }
            (ForwardEngine::Warp, _, Some(warp)) => {
                let interstellar = position.frame.is_interstellar();
                let top = warp.speed_for_factor(warp.max_factor(), interstellar);
                let speed = warp_command(&mut autopilot.warp_controller, distance, dt, top);
                let factor = warp.factor_for_speed(speed, interstellar);
                drives.set_warp_factor(ecs, if aligned { factor } else { 0.0 });
                drives.set_impulse_target(ecs, 0.0);
            }
            _ => {}
        }
        store(ecs, id, autopilot);
    }
}

/// Halt a ship that was driving toward a target it no longer has. Does
/// nothing once released, so manual engine commands stick.
fn release(ecs: &mut Ecs, id: EntityId, mut autopilot: Autopilot, drives: Drives) {
    if autopilot.locked_target.is_some() {
        halt(ecs, id, &mut autopilot, drives);
        store(ecs, id, autopilot);
    }
}

/// Stop the ship once when the destination is lost.
fn halt(ecs: &mut Ecs, id: EntityId, autopilot: &mut Autopilot, drives: Drives) {
    debug!("{id} autopilot disengaged");
    drives.set_impulse_target(ecs, 0.0);
    drives.set_warp_factor(ecs, 0.0);
    if let Some(thrusters) = drives.thrusters.and_then(|t| ecs.get_mut::<Thrusters>(t)) {
        thrusters.rotation_delta = DVec3::ZERO;
    }
    reset_controllers(autopilot);
    autopilot.locked_target = None;
    autopilot.driving = None;
}

fn reset_controllers(autopilot: &mut Autopilot) {
    for controller in [
        &mut autopilot.yaw_controller,
        &mut autopilot.pitch_controller,
        &mut autopilot.roll_controller,
        &mut autopilot.impulse_controller,
        &mut autopilot.warp_controller,
    ] {
        pid::reset(controller);
    }
}

fn store(ecs: &mut Ecs, id: EntityId, autopilot: Autopilot) {
    if let Some(slot) = ecs.get_mut::<Autopilot>(id) {
        *slot = autopilot;
    }
}
