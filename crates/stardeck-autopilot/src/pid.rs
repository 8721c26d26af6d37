//! PID stepping over the `PidController` state stored on the entity.

use stardeck_core::components::PidController;

/// Advance the controller one step and return its output.
///
/// Error is `target - measured`. The derivative term is zero on the first
/// step after a reset. Non-finite inputs or a non-positive `dt` produce 0
/// and leave the state untouched.
pub fn step(pid: &mut PidController, measured: f64, dt: f64) -> f64 {
    let error = pid.target - measured;
    if !error.is_finite() || !dt.is_finite() || dt <= 0.0 {
        return 0.0;
    }

    pid.sum_error += error * dt;
    if pid.i_max > 0.0 && pid.ki > 0.0 {
        let bound = pid.i_max / pid.ki;
        pid.sum_error = pid.sum_error.clamp(-bound, bound);
    }

    let derivative = match pid.last_error {
        Some(last) => (error - last) / dt,
        None => 0.0,
    };
    pid.last_error = Some(error);

    pid.kp * error + pid.ki * pid.sum_error + pid.kd * derivative
}

/// Move the setpoint without clearing accumulated state.
pub fn retarget(pid: &mut PidController, target: f64) {
    pid.target = if target.is_finite() { target } else { 0.0 };
}

/// Clear the integral and derivative history.
pub fn reset(pid: &mut PidController) {
    pid.sum_error = 0.0;
    pid.last_error = None;
}
