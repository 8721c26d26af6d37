//! Rotation autopilot: turns the ship to face its destination through the
//! rotation thrusters.

use glam::DVec3;

use stardeck_autopilot::coordinates::resolve_coordinates;
use stardeck_autopilot::pid;
use stardeck_autopilot::steering::{look_at, rotation_error};
use stardeck_core::components::{Autopilot, PidController, Thrusters};
use stardeck_core::constants::ROTATION_SNAP_EPSILON;
use stardeck_core::entity::EntityId;
use stardeck_core::enums::ComponentKind;
use stardeck_core::types::{Position, Rotation, RotationVelocity};

use super::{secs, ship_system_with};
use crate::context::SimContext;
use crate::ecs::{Ecs, System};

pub struct AutopilotRotationSystem;

impl System for AutopilotRotationSystem {
    fn name(&self) -> &'static str {
        "autopilot_rotation"
    }

    fn matches(&self, ecs: &Ecs, id: EntityId) -> bool {
        ecs.has(id, ComponentKind::Autopilot)
            && ecs.has(id, ComponentKind::Position)
            && ecs.has(id, ComponentKind::Rotation)
    }

    fn update(&mut self, ctx: &mut SimContext, id: EntityId, elapsed_ms: f64) {
        let dt = secs(elapsed_ms);
        let ecs = &mut ctx.ecs;
        let Some(autopilot) = ecs.get::<Autopilot>(id) else {
            return;
        };
        if !autopilot.rotation_autopilot {
            return;
        }
        let Some(coordinates) = autopilot.desired_coordinates else {
            return;
        };
        let (Some(position), Some(rotation)) = (ecs.get::<Position>(id), ecs.get::<Rotation>(id)) else {
            return;
        };
        let Some(resolved) = resolve_coordinates(position, coordinates, autopilot.desired_system, |system| {
            ecs.get::<Position>(system).map(Position::to_vec3)
        }) else {
            return;
        };
        let Some(desired) = look_at(resolved.position, resolved.destination) else {
            return;
        };
        let error = rotation_error(rotation.to_quat(), desired);
        let thrusters = ship_system_with(ecs, id, ComponentKind::Thrusters);

        if error.angle < ROTATION_SNAP_EPSILON {
            if let Some(r) = ecs.get_mut::<Rotation>(id) {
                *r = Rotation::from_quat(desired);
            }
            if let Some(w) = ecs.get_mut::<RotationVelocity>(id) {
                *w = RotationVelocity::default();
            }
            set_rotation_delta(ecs, thrusters, DVec3::ZERO);
            if let Some(autopilot) = ecs.get_mut::<Autopilot>(id) {
                pid::reset(&mut autopilot.yaw_controller);
                pid::reset(&mut autopilot.pitch_controller);
                pid::reset(&mut autopilot.roll_controller);
            }
            return;
        }

        let Some(autopilot) = ecs.get_mut::<Autopilot>(id) else {
            return;
        };
        let delta = DVec3::new(
            drive(&mut autopilot.pitch_controller, error.pitch, dt),
            drive(&mut autopilot.yaw_controller, error.yaw, dt),
            drive(&mut autopilot.roll_controller, error.roll, dt),
        );
        set_rotation_delta(ecs, thrusters, delta);
    }
}

/// Steer one axis: the controller chases the remaining error toward zero.
fn drive(controller: &mut PidController, error: f64, dt: f64) -> f64 {
    pid::retarget(controller, error);
    pid::step(controller, 0.0, dt).clamp(-1.0, 1.0)
}

fn set_rotation_delta(ecs: &mut Ecs, thrusters: Option<EntityId>, delta: DVec3) {
    if let Some(thrusters) = thrusters.and_then(|t| ecs.get_mut::<Thrusters>(t)) {
        thrusters.rotation_delta = delta;
    }
}
