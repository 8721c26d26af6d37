//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Milliseconds per hour, for power × time = energy.
pub const MS_PER_HOUR: f64 = 3_600_000.0;

// --- Units ---

/// Kilometers in one light-year.
pub const LIGHT_YEAR_KM: f64 = 9_460_730_472_580.8;

// --- Spatial sharding ---

/// Edge length of a physics shard cube in km. Shard-local coordinates are
/// handed to the rigid-body engine in f32, so this keeps them well under the
/// range where f32 loses sub-meter precision.
pub const DEFAULT_SHARD_SIZE_KM: f64 = 10_000.0;

/// Above this speed (km/s) collision fidelity is dropped for the kinematic path.
pub const DEFAULT_HIGH_SPEED_THRESHOLD_KM_S: f64 = 5_000.0;

/// Default boundary radius of a solar system (~67 AU).
pub const DEFAULT_SOLAR_SYSTEM_RADIUS_KM: f64 = 1.0e10;

// --- Bodies ---

pub const DEFAULT_SHIP_MASS: f64 = 2_000.0;

/// Substituted for zero, negative or non-finite mass.
pub const FALLBACK_MASS: f64 = 1.0;

// --- Engines ---

/// When angular speed exceeds the thruster cap, angular velocity is scaled by
/// this each tick instead of receiving more torque.
pub const THRUSTER_BRAKE_FACTOR: f64 = 0.9;

/// Rate (1/s) at which warp forward velocity eases toward its target speed.
pub const WARP_RESPONSE_PER_SEC: f64 = 2.0;

// --- Autopilot ---

/// Remaining rotation (radians) below which orientation snaps to the target.
pub const ROTATION_SNAP_EPSILON: f64 = 0.002;

/// Heading error (radians) above which forward thrust is withheld.
pub const AUTOPILOT_HEADING_TOLERANCE: f64 = 0.035;

/// If impulse would need longer than this at cruising speed, use warp.
pub const IMPULSE_TRAVEL_TIME_LIMIT_SECS: f64 = 15.0;

/// Warp aims to stop this far (km) from the destination.
pub const WARP_STOP_DISTANCE_KM: f64 = 10_000.0;

/// Within this distance (km) the destination counts as reached.
pub const AUTOPILOT_ARRIVAL_DISTANCE_KM: f64 = 0.5;

/// Rotation runs as a critically damped PD loop at the default ship's
/// angular authority. Integral action stays off: it winds up during the
/// rate-limited slew.
pub const ROTATION_PID_KP: f64 = 2.0;
pub const ROTATION_PID_KI: f64 = 0.0;
pub const ROTATION_PID_KD: f64 = 4.0;
pub const ROTATION_PID_I_MAX: f64 = 0.0;

pub const IMPULSE_PID_KP: f64 = 0.5;
pub const IMPULSE_PID_KI: f64 = 0.0;
pub const IMPULSE_PID_KD: f64 = 1.0;
pub const IMPULSE_PID_I_MAX: f64 = 0.0;

pub const WARP_PID_KP: f64 = 0.5;
pub const WARP_PID_KI: f64 = 0.0;
pub const WARP_PID_KD: f64 = 1.0;
pub const WARP_PID_I_MAX: f64 = 0.0;
