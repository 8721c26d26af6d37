//! Force contributions shared by both integration paths.
//!
//! Contributions are applied in a fixed order: dampening, warp velocity
//! override, forward impulse, thruster translation, thruster rotation. The
//! collision path feeds them to a rigid body; the kinematic path to a plain
//! velocity pair.

use glam::{DQuat, DVec3};

use stardeck_core::components::{ImpulseEngines, InertialDampeners, Thrusters, WarpEngines};
use stardeck_core::constants::THRUSTER_BRAKE_FACTOR;
use stardeck_core::entity::EntityId;

use crate::ecs::{Component, Ecs};
use crate::systems::ship_system_with;

/// Thruster intent for one tick, ship-local.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustIntent {
    pub linear: DVec3,
    pub max_speed: f64,
    pub angular: DVec3,
    pub max_rate: f64,
}

/// Everything the engines asked of the integrator this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionIntent {
    /// Exponential decay rate (1/s), 0 without dampeners.
    pub dampening: f64,
    pub damp_lateral: bool,
    pub damp_forward: bool,
    pub damp_rotation: bool,
    /// Forward speed imposed by warp, if engaged.
    pub warp_speed: Option<f64>,
    /// km/s² along the facing.
    pub forward_acceleration: f64,
    pub thrust: Option<ThrustIntent>,
}

impl MotionIntent {
    /// Collect the intents of every engine installed on `ship`.
    pub fn gather(ecs: &Ecs, ship: EntityId) -> Self {
        let warp_speed = installed::<WarpEngines>(ecs, ship)
            .filter(|w| w.current_warp_factor > 0.0 || w.forward_velocity > 0.0)
            .map(|w| finite_or_zero(w.forward_velocity));
        let impulse = installed::<ImpulseEngines>(ecs, ship);
        let forward_acceleration = impulse.map_or(0.0, |i| finite_or_zero(i.forward_acceleration));
        let impulse_engaged = impulse.is_some_and(|i| i.target_speed > 0.0);

        let thrusters = installed::<Thrusters>(ecs, ship);
        let translating = thrusters.is_some_and(|t| t.direction.length_squared() > 1e-12);
        let rotating = thrusters.is_some_and(Thrusters::is_rotating);
        let thrust = thrusters.map(|t| ThrustIntent {
            linear: finite_vec(t.direction_acceleration),
            max_speed: t.direction_max_speed.max(0.0),
            angular: finite_vec(t.rotation_acceleration),
            max_rate: t.rotation_max_speed.max(0.0),
        });

        let dampening = installed::<InertialDampeners>(ecs, ship)
            .map_or(0.0, |d| finite_or_zero(d.dampening).max(0.0));

        Self {
            dampening,
            damp_lateral: !translating,
            damp_forward: !translating && !impulse_engaged && warp_speed.is_none(),
            damp_rotation: !rotating,
            warp_speed,
            forward_acceleration,
            thrust,
        }
    }
}

fn installed<T: Component>(ecs: &Ecs, ship: EntityId) -> Option<&T> {
    ship_system_with(ecs, ship, T::KIND).and_then(|system| ecs.get::<T>(system))
}

/// Velocity state the contributions act on.
pub trait MotionBody {
    fn linvel(&self) -> DVec3;
    fn set_linvel(&mut self, v: DVec3);
    /// Add `dv` to the linear velocity.
    fn apply_velocity_change(&mut self, dv: DVec3);
    fn angvel(&self) -> DVec3;
    fn set_angvel(&mut self, w: DVec3);
}

/// Plain velocities for the kinematic path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicBody {
    pub linvel: DVec3,
    pub angvel: DVec3,
}

impl MotionBody for KinematicBody {
    fn linvel(&self) -> DVec3 {
        self.linvel
    }

    fn set_linvel(&mut self, v: DVec3) {
        self.linvel = v;
    }

    fn apply_velocity_change(&mut self, dv: DVec3) {
        self.linvel += dv;
    }

    fn angvel(&self) -> DVec3 {
        self.angvel
    }

    fn set_angvel(&mut self, w: DVec3) {
        self.angvel = w;
    }
}

/// Apply every contribution in order.
pub fn apply_contributions(body: &mut impl MotionBody, rotation: DQuat, intent: &MotionIntent, dt: f64) {
    if intent.dampening > 0.0 {
        if intent.damp_lateral {
            let v = damp_linear(body.linvel(), rotation, intent.dampening, dt, intent.damp_forward);
            body.set_linvel(v);
        }
        if intent.damp_rotation {
            body.set_angvel(body.angvel() * decay(intent.dampening, dt));
        }
    }

    if let Some(speed) = intent.warp_speed {
        body.set_linvel(with_forward_speed(body.linvel(), rotation, speed));
    }

    if intent.forward_acceleration != 0.0 {
        body.apply_velocity_change(rotation * DVec3::Z * intent.forward_acceleration * dt);
    }

    if let Some(thrust) = intent.thrust {
        let dv = thruster_delta(body.linvel(), rotation, thrust.linear, thrust.max_speed, dt);
        if dv != DVec3::ZERO {
            body.apply_velocity_change(dv);
        }
        body.set_angvel(thruster_angular(
            body.angvel(),
            rotation,
            thrust.angular,
            thrust.max_rate,
            dt,
        ));
    }
}

/// `exp(-rate · dt)`.
pub fn decay(rate: f64, dt: f64) -> f64 {
    (-rate * dt).exp()
}

/// Decay uncommanded motion. The forward component is left alone unless
/// `include_forward`.
pub fn damp_linear(v: DVec3, rotation: DQuat, rate: f64, dt: f64, include_forward: bool) -> DVec3 {
    let k = decay(rate, dt);
    if include_forward {
        return v * k;
    }
    let forward = rotation * DVec3::Z;
    let along = forward * v.dot(forward);
    along + (v - along) * k
}

/// Replace the forward component of `v` with `speed`.
pub fn with_forward_speed(v: DVec3, rotation: DQuat, speed: f64) -> DVec3 {
    let forward = rotation * DVec3::Z;
    v - forward * v.dot(forward) + forward * speed
}

/// World-frame velocity change from thrusters. Along each local axis,
/// thrust may not push speed past `max_speed`; thrust against the current
/// motion is always allowed.
pub fn thruster_delta(v: DVec3, rotation: DQuat, accel_local: DVec3, max_speed: f64, dt: f64) -> DVec3 {
    let local_v = rotation.inverse() * v;
    let limit = |speed: f64, accel: f64| {
        let dv = accel * dt;
        if dv * speed > 0.0 {
            let room = (max_speed - speed.abs()).max(0.0);
            dv.signum() * dv.abs().min(room)
        } else {
            dv.clamp(-(max_speed + speed.abs()), max_speed + speed.abs())
        }
    };
    let local_dv = DVec3::new(
        limit(local_v.x, accel_local.x),
        limit(local_v.y, accel_local.y),
        limit(local_v.z, accel_local.z),
    );
    rotation * local_dv
}

/// New angular velocity after thruster torque. Above `max_rate` the
/// thrusters brake instead of adding torque.
pub fn thruster_angular(w: DVec3, rotation: DQuat, accel_local: DVec3, max_rate: f64, dt: f64) -> DVec3 {
    if w.length() > max_rate {
        w * THRUSTER_BRAKE_FACTOR
    } else {
        w + rotation * (accel_local * dt)
    }
}

/// Integrate orientation from world-frame angular velocity.
pub fn integrate_rotation(rotation: DQuat, w: DVec3, dt: f64) -> DQuat {
    if w == DVec3::ZERO {
        return rotation;
    }
    (DQuat::from_scaled_axis(w * dt) * rotation).normalize()
}

/// Velocity component along the facing.
pub fn forward_speed(v: DVec3, rotation: DQuat) -> f64 {
    v.dot(rotation * DVec3::Z)
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

fn finite_vec(v: DVec3) -> DVec3 {
    if v.is_finite() {
        v
    } else {
        DVec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 30.0;

    #[test]
    fn lateral_damping_keeps_forward_speed() {
        let v = DVec3::new(3.0, 0.0, 100.0);
        let damped = damp_linear(v, DQuat::IDENTITY, 1.0, 1.0, false);
        assert!((damped.z - 100.0).abs() < 1e-12);
        assert!((damped.x - 3.0 * (-1.0f64).exp()).abs() < 1e-12);

        let all = damp_linear(v, DQuat::IDENTITY, 1.0, 1.0, true);
        assert!((all.z - 100.0 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn warp_overrides_forward_component_only() {
        let q = DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2);
        let v = DVec3::new(5.0, 2.0, 0.0);
        let out = with_forward_speed(v, q, 1_000.0);
        assert!((forward_speed(out, q) - 1_000.0).abs() < 1e-9);
        assert!((out.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn thrusters_respect_axis_cap() {
        let q = DQuat::IDENTITY;
        let dv = thruster_delta(DVec3::new(0.95, 0.0, 0.0), q, DVec3::new(3.0, 0.0, 0.0), 1.0, DT);
        assert!((dv.x - 0.05).abs() < 1e-12, "capped to the remaining room");

        let brake = thruster_delta(DVec3::new(0.95, 0.0, 0.0), q, DVec3::new(-3.0, 0.0, 0.0), 1.0, DT);
        assert!((brake.x + 0.1).abs() < 1e-12, "thrust against the motion is not capped");

        // Forward speed from the main engines is far past the cap; thrusters
        // add nothing more along it.
        let dv = thruster_delta(DVec3::new(0.0, 0.0, 1_500.0), q, DVec3::new(0.0, 0.0, 1.0), 1.0, DT);
        assert_eq!(dv.z, 0.0);
    }

    #[test]
    fn thrusters_brake_when_spinning_too_fast() {
        let w = DVec3::new(0.0, 0.8, 0.0);
        let out = thruster_angular(w, DQuat::IDENTITY, DVec3::new(0.0, 1.0, 0.0), 0.5, DT);
        assert!((out.y - 0.8 * THRUSTER_BRAKE_FACTOR).abs() < 1e-12);

        let out = thruster_angular(DVec3::ZERO, DQuat::IDENTITY, DVec3::new(0.0, 0.3, 0.0), 0.5, 1.0);
        assert!((out.y - 0.3).abs() < 1e-12);
    }

    #[test]
    fn kinematic_contributions_in_order() {
        let mut body = KinematicBody {
            linvel: DVec3::new(1.0, 0.0, 10.0),
            angvel: DVec3::ZERO,
        };
        let intent = MotionIntent {
            dampening: 1.0,
            damp_lateral: true,
            damp_forward: false,
            damp_rotation: true,
            warp_speed: Some(500.0),
            forward_acceleration: 30.0,
            thrust: None,
        };
        apply_contributions(&mut body, DQuat::IDENTITY, &intent, DT);
        assert!((body.linvel.z - (500.0 + 1.0)).abs() < 1e-9);
        assert!(body.linvel.x < 1.0);
    }

    #[test]
    fn zero_angular_velocity_keeps_rotation_exact() {
        let q = DQuat::from_rotation_x(0.3);
        assert_eq!(integrate_rotation(q, DVec3::ZERO, DT), q);
    }
}
