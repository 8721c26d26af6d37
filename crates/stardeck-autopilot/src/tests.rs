#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use glam::{DQuat, DVec3};
    use stardeck_core::components::{Autopilot, PidController};
    use stardeck_core::constants::*;
    use stardeck_core::entity::EntityId;
    use stardeck_core::enums::ForwardEngine;
    use stardeck_core::types::Position;

    use crate::coordinates::resolve_coordinates;
    use crate::forward::{impulse_command, select_engine, warp_command};
    use crate::pid;
    use crate::steering::{heading_error, look_at, rotation_error};

    const DT: f64 = 1.0 / 30.0;

    // --- PID ---

    #[test]
    fn test_pid_proportional_only() {
        let mut c = PidController::new(2.0, 0.0, 0.0, 0.0);
        pid::retarget(&mut c, 10.0);
        let out = pid::step(&mut c, 4.0, DT);
        assert!((out - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_pid_first_step_has_no_derivative_kick() {
        let mut c = PidController::new(0.0, 0.0, 5.0, 0.0);
        pid::retarget(&mut c, 1.0);
        assert_eq!(pid::step(&mut c, 0.0, DT), 0.0);
        // Error drops from 1.0 to 0.5 over one step.
        let out = pid::step(&mut c, 0.5, DT);
        assert!((out - 5.0 * (-0.5 / DT)).abs() < 1e-9);
    }

    #[test]
    fn test_pid_integral_is_bounded() {
        let mut c = PidController::new(0.0, 0.5, 0.0, 2.0);
        pid::retarget(&mut c, 100.0);
        let mut out = 0.0;
        for _ in 0..10_000 {
            out = pid::step(&mut c, 0.0, DT);
        }
        assert!((out - 2.0).abs() < 1e-9, "integral term capped at i_max, got {out}");
    }

    #[test]
    fn test_pid_reset_and_degenerate_input() {
        let mut c = PidController::new(1.0, 1.0, 1.0, 0.0);
        pid::retarget(&mut c, 3.0);
        pid::step(&mut c, 0.0, DT);
        pid::step(&mut c, 1.0, DT);
        pid::reset(&mut c);
        assert_eq!(c.sum_error, 0.0);
        assert!(c.last_error.is_none());

        assert_eq!(pid::step(&mut c, f64::NAN, DT), 0.0);
        assert_eq!(pid::step(&mut c, 0.0, 0.0), 0.0);
        assert!(c.last_error.is_none(), "rejected steps leave state untouched");
    }

    // --- Steering ---

    #[test]
    fn test_look_at_faces_target() {
        let from = DVec3::new(10.0, -4.0, 2.0);
        for to in [
            DVec3::new(20.0, -4.0, 2.0),
            DVec3::new(10.0, 50.0, 2.0),
            DVec3::new(-3.0, 7.0, -9.0),
            DVec3::new(10.0, -4.0, -100.0),
        ] {
            let q = look_at(from, to).unwrap();
            let forward = q * DVec3::Z;
            let expected = (to - from).normalize();
            assert!(
                (forward - expected).length() < 1e-9,
                "facing {forward:?}, expected {expected:?}"
            );
        }
        assert!(look_at(from, from).is_none());
    }

    #[test]
    fn test_rotation_error_axes() {
        let current = DQuat::IDENTITY;
        let yawed = DQuat::from_rotation_y(0.3);
        let e = rotation_error(current, yawed);
        assert!((e.yaw - 0.3).abs() < 1e-9);
        assert!(e.pitch.abs() < 1e-9 && e.roll.abs() < 1e-9);
        assert!((e.angle - 0.3).abs() < 1e-9);

        let pitched = DQuat::from_rotation_x(-0.2);
        let e = rotation_error(current, pitched);
        assert!((e.pitch + 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_error_is_relative_to_current() {
        // Both orientations yawed near ±π: absolute yaw would wrap, the
        // relative error must not.
        let current = DQuat::from_rotation_y(PI - 0.05);
        let desired = DQuat::from_rotation_y(-PI + 0.05);
        let e = rotation_error(current, desired);
        assert!((e.yaw - 0.1).abs() < 1e-9, "got {}", e.yaw);
    }

    #[test]
    fn test_heading_error() {
        let q = DQuat::IDENTITY;
        assert!(heading_error(q, DVec3::ZERO, DVec3::new(0.0, 0.0, 5.0)) < 1e-12);
        let side = heading_error(q, DVec3::ZERO, DVec3::new(5.0, 0.0, 0.0));
        assert!((side - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(heading_error(q, DVec3::ONE, DVec3::ONE), 0.0);
    }

    /// Drive a free-floating body with the default rotation gains and the
    /// default ship's angular authority; it must settle onto the target.
    #[test]
    fn test_rotation_controllers_converge() {
        let autopilot = Autopilot::default();
        let (mut yaw, mut pitch, mut roll) = (
            autopilot.yaw_controller,
            autopilot.pitch_controller,
            autopilot.roll_controller,
        );
        let angular_accel = 1_000.0 / DEFAULT_SHIP_MASS;
        let max_rate = 0.5;

        let mut q = DQuat::IDENTITY;
        let mut omega = DVec3::ZERO;
        let desired = look_at(DVec3::ZERO, DVec3::new(-40.0, 25.0, -60.0)).unwrap();

        let mut settled_at = None;
        for tick in 0..3_000 {
            let e = rotation_error(q, desired);
            if e.angle < ROTATION_SNAP_EPSILON {
                settled_at = Some(tick);
                break;
            }
            pid::retarget(&mut yaw, e.yaw);
            pid::retarget(&mut pitch, e.pitch);
            pid::retarget(&mut roll, e.roll);
            let delta = DVec3::new(
                pid::step(&mut pitch, 0.0, DT).clamp(-1.0, 1.0),
                pid::step(&mut yaw, 0.0, DT).clamp(-1.0, 1.0),
                pid::step(&mut roll, 0.0, DT).clamp(-1.0, 1.0),
            );
            if omega.length() > max_rate {
                omega *= THRUSTER_BRAKE_FACTOR;
            } else {
                omega += delta * angular_accel * DT;
            }
            q = (q * DQuat::from_scaled_axis(omega * DT)).normalize();
        }
        assert!(settled_at.is_some(), "rotation never settled");
    }

    // --- Coordinates ---

    #[test]
    fn test_resolve_same_frame() {
        let sys = EntityId::new(1, 0);
        let ship = Position::solar(sys, 1.0, 2.0, 3.0);
        let r = resolve_coordinates(&ship, DVec3::new(9.0, 0.0, 0.0), Some(sys), |_| None).unwrap();
        assert_eq!(r.position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(r.destination, DVec3::new(9.0, 0.0, 0.0));
        assert!(!r.interstellar);

        let ship = Position::interstellar(1.0, 1.0, 1.0);
        let r = resolve_coordinates(&ship, DVec3::ZERO, None, |_| None).unwrap();
        assert!(r.interstellar);
    }

    #[test]
    fn test_resolve_across_frames() {
        let a = EntityId::new(1, 0);
        let b = EntityId::new(2, 0);
        let lookup = |id: EntityId| {
            if id == a {
                Some(DVec3::new(10.0, 0.0, 0.0))
            } else if id == b {
                Some(DVec3::new(0.0, 20.0, 0.0))
            } else {
                None
            }
        };

        // In a system, heading into interstellar space.
        let ship = Position::solar(a, 5_000.0, 0.0, 0.0);
        let r = resolve_coordinates(&ship, DVec3::new(3.0, 3.0, 3.0), None, lookup).unwrap();
        assert_eq!(r.position, DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(r.destination, DVec3::new(3.0, 3.0, 3.0));
        assert!(r.interstellar);

        // Interstellar, heading into a system.
        let ship = Position::interstellar(1.0, 0.0, 0.0);
        let r = resolve_coordinates(&ship, DVec3::new(7.0, 7.0, 7.0), Some(b), lookup).unwrap();
        assert_eq!(r.position, DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(r.destination, DVec3::new(0.0, 20.0, 0.0));

        // System to system.
        let ship = Position::solar(a, 0.0, 0.0, 0.0);
        let r = resolve_coordinates(&ship, DVec3::ZERO, Some(b), lookup).unwrap();
        assert_eq!(r.position, DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(r.destination, DVec3::new(0.0, 20.0, 0.0));

        // Unknown system.
        let ship = Position::solar(EntityId::new(9, 0), 0.0, 0.0, 0.0);
        assert!(resolve_coordinates(&ship, DVec3::ZERO, None, lookup).is_none());
    }

    // --- Forward engines ---

    #[test]
    fn test_select_engine_by_travel_time() {
        assert_eq!(select_engine(1_500.0 * 15.0, 1_500.0), ForwardEngine::Impulse);
        assert_eq!(select_engine(1_500.0 * 15.0 + 1.0, 1_500.0), ForwardEngine::Warp);
        assert_eq!(select_engine(10.0, 0.0), ForwardEngine::Warp);
    }

    #[test]
    fn test_impulse_command_clamped() {
        let mut c = Autopilot::default().impulse_controller;
        let far = impulse_command(&mut c, 1.0e6, DT, 1_500.0);
        assert_eq!(far, 1_500.0);
        pid::reset(&mut c);
        let near = impulse_command(&mut c, 10.0, DT, 1_500.0);
        assert!(near > 0.0 && near < 1_500.0);
        pid::reset(&mut c);
        assert_eq!(impulse_command(&mut c, 0.0, DT, 1_500.0), 0.0);
    }

    #[test]
    fn test_warp_command_stops_short() {
        let mut c = Autopilot::default().warp_controller;
        assert_eq!(warp_command(&mut c, WARP_STOP_DISTANCE_KM * 0.5, DT, 1e9), 0.0);
        pid::reset(&mut c);
        assert_eq!(warp_command(&mut c, 1e15, DT, 1e9), 1e9);
    }
}
