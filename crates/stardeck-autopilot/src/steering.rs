//! Orientation math: look-at quaternions and relative yaw/pitch/roll.
//!
//! Ship-local forward is +Z and up is +Y. Yaw, pitch and roll of the error
//! are the components of the shortest-path rotation vector from the current
//! to the desired orientation, in ship axes. They never wrap across ±π and
//! turning about any one of them leaves the other two unchanged.

use glam::{DMat3, DQuat, DVec3};

/// Orientation that faces `to` from `from` with +Y kept as close to up as
/// possible. `None` when the points coincide.
pub fn look_at(from: DVec3, to: DVec3) -> Option<DQuat> {
    let forward = (to - from).try_normalize()?;
    let up = if forward.cross(DVec3::Y).length_squared() < 1e-12 {
        DVec3::X
    } else {
        DVec3::Y
    };
    let right = up.cross(forward).normalize();
    let true_up = forward.cross(right);
    Some(DQuat::from_mat3(&DMat3::from_cols(right, true_up, forward)).normalize())
}

/// Rotation remaining from `current` to `desired`, in the ship's own axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationError {
    /// About local Y.
    pub yaw: f64,
    /// About local X.
    pub pitch: f64,
    /// About local Z.
    pub roll: f64,
    /// Total remaining angle in radians, `[0, π]`.
    pub angle: f64,
}

pub fn rotation_error(current: DQuat, desired: DQuat) -> RotationError {
    let mut delta = (current.inverse() * desired).normalize();
    if delta.w < 0.0 {
        delta = -delta;
    }
    let axis = delta.to_scaled_axis();
    RotationError {
        yaw: axis.y,
        pitch: axis.x,
        roll: axis.z,
        angle: axis.length(),
    }
}

/// Angle between the ship's facing and the direction to `to`. Zero when the
/// points coincide.
pub fn heading_error(rotation: DQuat, from: DVec3, to: DVec3) -> f64 {
    match (to - from).try_normalize() {
        Some(direction) => (rotation * DVec3::Z).angle_between(direction),
        None => 0.0,
    }
}
