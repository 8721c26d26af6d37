//! Forward-engine selection and commands for translation autopilot.

use stardeck_core::components::PidController;
use stardeck_core::constants::{IMPULSE_TRAVEL_TIME_LIMIT_SECS, WARP_STOP_DISTANCE_KM};
use stardeck_core::enums::ForwardEngine;

use crate::pid;

/// Impulse when the trip takes at most the travel-time limit at impulse
/// cruising speed, warp otherwise. Ships without usable impulse always warp.
pub fn select_engine(distance_km: f64, impulse_cruising_speed: f64) -> ForwardEngine {
    if impulse_cruising_speed <= 0.0 {
        return ForwardEngine::Warp;
    }
    if distance_km / impulse_cruising_speed > IMPULSE_TRAVEL_TIME_LIMIT_SECS {
        ForwardEngine::Warp
    } else {
        ForwardEngine::Impulse
    }
}

/// Impulse target speed (km/s) that closes `distance_km` to zero.
pub fn impulse_command(
    controller: &mut PidController,
    distance_km: f64,
    dt: f64,
    max_speed: f64,
) -> f64 {
    pid::retarget(controller, 0.0);
    let output = pid::step(controller, -distance_km, dt);
    output.clamp(0.0, max_speed.max(0.0))
}

/// Warp speed (km/s) that brings the ship to rest `WARP_STOP_DISTANCE_KM`
/// short of the destination.
pub fn warp_command(
    controller: &mut PidController,
    distance_km: f64,
    dt: f64,
    max_speed: f64,
) -> f64 {
    pid::retarget(controller, 0.0);
    let remaining = distance_km - WARP_STOP_DISTANCE_KM;
    let output = pid::step(controller, -remaining, dt);
    output.clamp(0.0, max_speed.max(0.0))
}
