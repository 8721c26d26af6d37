//! ECS components.
//!
//! Components are plain data structs. Game logic lives in systems, not
//! components; the few methods here are pure derivations over a component's
//! own fields.
//!
//! Every component is `#[serde(default)]` so a partial JSON object merged over
//! an existing value always deserializes.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::entity::EntityId;
use crate::enums::{DistributionMode, ForwardEngine};
use crate::types::Position;

pub use crate::types::{Rotation, RotationVelocity, Velocity};

/// Inertial mass. Used by impulse engines and thrusters, ignored by warp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mass {
    pub mass: f64,
}

impl Default for Mass {
    fn default() -> Self {
        Self {
            mass: DEFAULT_SHIP_MASS,
        }
    }
}

/// Hull extents in km. Ship colliders are generated from this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            length: 0.35,
            width: 0.12,
            height: 0.06,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsShip {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsPlanet {
    /// Radius in km.
    pub radius: f64,
}

impl Default for IsPlanet {
    fn default() -> Self {
        Self { radius: 6_371.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsStar {
    /// Radius in km.
    pub radius: f64,
}

impl Default for IsStar {
    fn default() -> Self {
        Self { radius: 696_340.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsTorpedo {
    /// Collision radius in km.
    pub radius: f64,
}

impl Default for IsTorpedo {
    fn default() -> Self {
        Self { radius: 0.005 }
    }
}

/// A solar system. Its own `Position` is interstellar (light-years); entities
/// framed in it are positioned in km from its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarSystem {
    /// Boundary radius in km, beyond which ships drop into interstellar space.
    pub radius: f64,
}

impl Default for SolarSystem {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SOLAR_SYSTEM_RADIUS_KM,
        }
    }
}

/// Power state of a terminal (consuming) ship system. Values in MW.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Power {
    /// Ceiling set by the crew.
    pub requested_power: f64,
    /// Demand from the current workload, never above `requested_power`.
    pub power_draw: f64,
    /// Supplied this tick, never above `power_draw`.
    pub current_power: f64,
    /// Above this the system is being overdriven.
    pub max_safe_power: f64,
    /// Below this the system does not function at all.
    pub required_power: f64,
    /// Demand at nominal full workload.
    pub default_power: f64,
}

impl Default for Power {
    fn default() -> Self {
        Self {
            requested_power: 10.0,
            power_draw: 0.0,
            current_power: 0.0,
            max_safe_power: 20.0,
            required_power: 2.0,
            default_power: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reactor {
    /// Maximum output in MW.
    pub max_output: f64,
    /// Fraction of `max_output` the crew has dialed in, 0..=1.
    pub desired_output: f64,
    /// Output produced this tick in MW.
    pub current_output: f64,
    /// Power nodes and batteries this reactor feeds.
    pub connected: Vec<EntityId>,
}

impl Default for Reactor {
    fn default() -> Self {
        Self {
            max_output: 120.0,
            desired_output: 1.0,
            current_output: 0.0,
            connected: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Battery {
    /// Capacity in MWh.
    pub capacity: f64,
    /// Stored energy in MWh, clamped to `[0, capacity]`.
    pub storage: f64,
    /// Maximum charge power in MW.
    pub charge_rate: f64,
    /// Maximum discharge power in MW.
    pub discharge_rate: f64,
    /// Power nodes this battery can discharge into.
    pub connected_nodes: Vec<EntityId>,
    /// Power taken in during the last tick, MW.
    pub charge_amount: f64,
    /// Power given out during the last tick, MW.
    pub discharge_amount: f64,
}

impl Default for Battery {
    fn default() -> Self {
        Self {
            capacity: 1.0,
            storage: 1.0,
            charge_rate: 10.0,
            discharge_rate: 20.0,
            connected_nodes: Vec::new(),
            charge_amount: 0.0,
            discharge_amount: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerNode {
    pub connected_systems: Vec<EntityId>,
    pub distribution_mode: DistributionMode,
    /// Sum of connected systems' draw, recomputed every tick.
    pub requested_power: f64,
    /// Power actually routed through this node last tick.
    pub supplied_power: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpulseEngines {
    /// km/s at nominal power.
    pub cruising_speed: f64,
    /// km/s ceiling when overdriven.
    pub emergency_speed: f64,
    /// Full-throttle force; acceleration is `thrust / mass`.
    pub thrust: f64,
    /// Commanded forward speed in km/s.
    pub target_speed: f64,
    /// Forward acceleration intent for this tick (km/s²), set by the engine system.
    pub forward_acceleration: f64,
    /// Ship's measured forward speed, written back by physics.
    pub forward_velocity: f64,
}

impl Default for ImpulseEngines {
    fn default() -> Self {
        Self {
            cruising_speed: 1_500.0,
            emergency_speed: 2_000.0,
            thrust: 3_000_000.0,
            target_speed: 0.0,
            forward_acceleration: 0.0,
            forward_velocity: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpEngines {
    /// km/s at the highest non-emergency factor inside a solar system.
    pub solar_cruising_speed: f64,
    /// km/s at the highest non-emergency factor in interstellar space.
    pub interstellar_cruising_speed: f64,
    /// Warp 1 speed as a fraction of cruising speed.
    pub min_speed_multiplier: f64,
    /// Emergency (top) factor speed as a multiple of cruising speed.
    pub emergency_multiplier: f64,
    /// Number of warp factors; the top one is emergency speed.
    pub warp_factor_count: u32,
    /// Commanded warp factor. Fractional values interpolate.
    pub current_warp_factor: f64,
    /// Forward speed imposed on the ship this tick in km/s.
    pub forward_velocity: f64,
}

impl Default for WarpEngines {
    fn default() -> Self {
        Self {
            solar_cruising_speed: 30_000_000.0,
            interstellar_cruising_speed: 500_000_000_000.0,
            min_speed_multiplier: 0.01,
            emergency_multiplier: 1.25,
            warp_factor_count: 5,
            current_warp_factor: 0.0,
            forward_velocity: 0.0,
        }
    }
}

impl WarpEngines {
    /// Speed of the highest non-emergency factor in the given frame.
    pub fn cruising_speed(&self, interstellar: bool) -> f64 {
        if interstellar {
            self.interstellar_cruising_speed
        } else {
            self.solar_cruising_speed
        }
    }

    /// Top factor; commanding it runs at emergency speed.
    pub fn max_factor(&self) -> f64 {
        self.warp_factor_count.max(1) as f64
    }

    /// Speed in km/s for a (possibly fractional) warp factor.
    ///
    /// Factor 1 runs at `min_speed_multiplier` of cruise, factor
    /// `count - 1` at cruise and factor `count` at emergency speed, with
    /// linear interpolation in between.
    pub fn speed_for_factor(&self, factor: f64, interstellar: bool) -> f64 {
        let cruise = self.cruising_speed(interstellar);
        let top = self.max_factor();
        let f = if factor.is_finite() {
            factor.clamp(0.0, top)
        } else {
            0.0
        };
        let min = cruise * self.min_speed_multiplier;
        let emergency = cruise * self.emergency_multiplier;
        let cruise_factor = top - 1.0;

        if f <= 1.0 {
            min * f
        } else if f <= cruise_factor {
            lerp(min, cruise, (f - 1.0) / (cruise_factor - 1.0))
        } else {
            let (base_factor, base_speed) = if cruise_factor > 1.0 {
                (cruise_factor, cruise)
            } else {
                (1.0, min)
            };
            lerp(base_speed, emergency, (f - base_factor) / (top - base_factor))
        }
    }

    /// Inverse of [`speed_for_factor`](Self::speed_for_factor), clamped to
    /// `[0, max_factor]`.
    pub fn factor_for_speed(&self, speed: f64, interstellar: bool) -> f64 {
        if !speed.is_finite() || speed <= 0.0 {
            return 0.0;
        }
        let cruise = self.cruising_speed(interstellar);
        let top = self.max_factor();
        let min = cruise * self.min_speed_multiplier;
        let emergency = cruise * self.emergency_multiplier;
        let cruise_factor = top - 1.0;

        if speed <= min || top <= 1.0 {
            return if min > 0.0 { (speed / min).min(1.0) } else { 1.0 };
        }
        if cruise_factor > 1.0 && speed <= cruise {
            let span = cruise - min;
            let t = if span > 0.0 { (speed - min) / span } else { 1.0 };
            return 1.0 + t * (cruise_factor - 1.0);
        }
        let (base_factor, base_speed) = if cruise_factor > 1.0 {
            (cruise_factor, cruise)
        } else {
            (1.0, min)
        };
        let span = emergency - base_speed;
        let t = if span > 0.0 {
            ((speed - base_speed) / span).min(1.0)
        } else {
            1.0
        };
        base_factor + t * (top - base_factor)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thrusters {
    /// Commanded translation, ship-local, each axis in [-1, 1].
    pub direction: DVec3,
    /// Commanded rotation, ship-local (x pitch, y yaw, z roll), each axis in [-1, 1].
    pub rotation_delta: DVec3,
    /// Translation speed cap along each local axis, km/s.
    pub direction_max_speed: f64,
    /// Translation force; acceleration is `direction_thrust / mass`.
    pub direction_thrust: f64,
    /// Angular speed cap, rad/s.
    pub rotation_max_speed: f64,
    /// Rotation force; angular acceleration is `rotation_thrust / mass`.
    pub rotation_thrust: f64,
    /// Local linear acceleration intent for this tick (km/s²).
    pub direction_acceleration: DVec3,
    /// Local angular acceleration intent for this tick (rad/s²).
    pub rotation_acceleration: DVec3,
}

impl Default for Thrusters {
    fn default() -> Self {
        Self {
            direction: DVec3::ZERO,
            rotation_delta: DVec3::ZERO,
            direction_max_speed: 1.0,
            direction_thrust: 1_000.0,
            rotation_max_speed: 0.5,
            rotation_thrust: 1_000.0,
            direction_acceleration: DVec3::ZERO,
            rotation_acceleration: DVec3::ZERO,
        }
    }
}

impl Thrusters {
    /// Whether any translation or rotation is being commanded.
    pub fn is_thrusting(&self) -> bool {
        self.direction.length_squared() > 1e-12 || self.rotation_delta.length_squared() > 1e-12
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation_delta.length_squared() > 1e-12
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertialDampeners {
    /// Exponential decay rate of uncommanded motion, 1/s.
    pub dampening: f64,
}

impl Default for InertialDampeners {
    fn default() -> Self {
        Self { dampening: 1.0 }
    }
}

/// A spatial shard with its own rigid-body simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsWorld {
    /// Shard origin (center of the shard cube), in its frame's units.
    pub location: Position,
    pub enabled: bool,
    /// Consecutive ticks this shard has held no bodies.
    pub idle_ticks: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self {
            location: Position::default(),
            enabled: true,
            idle_ticks: 0,
        }
    }
}

/// Plain PID controller state. Owned by the entity; stepped by the autopilot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidController {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Bound on the accumulated integral term, 0 disables the bound.
    pub i_max: f64,
    pub target: f64,
    pub sum_error: f64,
    pub last_error: Option<f64>,
}

impl Default for PidController {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64, i_max: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            i_max,
            target: 0.0,
            sum_error: 0.0,
            last_error: None,
        }
    }
}

/// Destination the autopilot has locked onto; a change resets the controllers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutopilotTarget {
    pub coordinates: DVec3,
    pub system: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Autopilot {
    /// Destination in the desired system's frame (km), or light-years when
    /// `desired_system` is `None`.
    pub desired_coordinates: Option<DVec3>,
    pub desired_system: Option<EntityId>,
    pub rotation_autopilot: bool,
    pub forward_autopilot: bool,
    pub yaw_controller: PidController,
    pub pitch_controller: PidController,
    pub roll_controller: PidController,
    pub impulse_controller: PidController,
    pub warp_controller: PidController,
    pub driving: Option<ForwardEngine>,
    pub locked_target: Option<AutopilotTarget>,
}

impl Default for Autopilot {
    fn default() -> Self {
        let rotation = PidController::new(
            ROTATION_PID_KP,
            ROTATION_PID_KI,
            ROTATION_PID_KD,
            ROTATION_PID_I_MAX,
        );
        Self {
            desired_coordinates: None,
            desired_system: None,
            rotation_autopilot: true,
            forward_autopilot: true,
            yaw_controller: rotation,
            pitch_controller: rotation,
            roll_controller: rotation,
            impulse_controller: PidController::new(
                IMPULSE_PID_KP,
                IMPULSE_PID_KI,
                IMPULSE_PID_KD,
                IMPULSE_PID_I_MAX,
            ),
            warp_controller: PidController::new(
                WARP_PID_KP,
                WARP_PID_KI,
                WARP_PID_KD,
                WARP_PID_I_MAX,
            ),
            driving: None,
            locked_target: None,
        }
    }
}

/// One subsystem link on a ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSystemLink {
    pub system: EntityId,
    /// Room the subsystem is installed in, if assigned.
    pub room: Option<String>,
}

/// The subsystems installed on a ship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipSystems {
    pub systems: Vec<ShipSystemLink>,
}

impl ShipSystems {
    pub fn contains(&self, system: EntityId) -> bool {
        self.systems.iter().any(|link| link.system == system)
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.systems.iter().map(|link| link.system)
    }
}
