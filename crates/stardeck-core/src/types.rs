//! Fundamental geometric and simulation types.
//!
//! Transform components keep plain scalar fields so that the external API
//! layer can merge partial updates key by key; math happens in `glam` types
//! obtained through the conversion helpers.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::enums::PositionFrame;

/// Position of an entity.
///
/// Units depend on the frame: kilometers relative to the containing solar
/// system's center, or light-years in interstellar space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub frame: PositionFrame,
}

/// Linear velocity in km/s, world frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation quaternion. Ship-local forward is +Z, up is +Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// Angular velocity in rad/s, world frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationVelocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64, frame: PositionFrame) -> Self {
        Self { x, y, z, frame }
    }

    /// Position in km inside a solar system.
    pub fn solar(system: crate::entity::EntityId, x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, PositionFrame::Solar { system })
    }

    /// Position in light-years in interstellar space.
    pub fn interstellar(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, PositionFrame::Interstellar)
    }

    pub fn to_vec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    pub fn set_vec3(&mut self, v: DVec3) {
        self.x = v.x;
        self.y = v.y;
        self.z = v.z;
    }

    /// Distance to another position in the same frame's units.
    pub fn range_to(&self, other: &Position) -> f64 {
        self.to_vec3().distance(other.to_vec3())
    }

    pub fn is_finite(&self) -> bool {
        self.to_vec3().is_finite()
    }
}

impl Velocity {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_vec3(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn to_vec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Speed magnitude (km/s).
    pub fn speed(&self) -> f64 {
        self.to_vec3().length()
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::from_quat(DQuat::IDENTITY)
    }
}

impl Rotation {
    pub fn from_quat(q: DQuat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }

    /// Normalized quaternion. A degenerate (zero-length) value reads as identity.
    pub fn to_quat(&self) -> DQuat {
        let q = DQuat::from_xyzw(self.x, self.y, self.z, self.w);
        let len = q.length();
        if len.is_finite() && len > 1e-12 {
            q / len
        } else {
            DQuat::IDENTITY
        }
    }

    /// Unit vector the entity is facing, in world frame.
    pub fn forward(&self) -> DVec3 {
        self.to_quat() * DVec3::Z
    }
}

impl RotationVelocity {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_vec3(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn to_vec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

impl SimTime {
    /// Advance by one tick of `dt_secs`.
    pub fn advance(&mut self, dt_secs: f64) {
        self.tick += 1;
        self.elapsed_secs += dt_secs;
    }
}
