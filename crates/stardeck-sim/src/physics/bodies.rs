//! Rigid-body construction and glam ↔ nalgebra conversion.

use glam::{DQuat, DVec3};
use log::warn;
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

use stardeck_core::components::{IsPlanet, IsStar, IsTorpedo, Mass, Size};
use stardeck_core::constants::FALLBACK_MASS;
use stardeck_core::entity::EntityId;

use crate::ecs::Ecs;

use super::ShardTable;

pub fn to_na_vector(v: DVec3) -> Vector<Real> {
    vector![v.x as Real, v.y as Real, v.z as Real]
}

pub fn from_na_vector(v: &Vector<Real>) -> DVec3 {
    DVec3::new(v.x as f64, v.y as f64, v.z as f64)
}

pub fn to_na_rotation(q: DQuat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(
        q.w as Real,
        q.x as Real,
        q.y as Real,
        q.z as Real,
    ))
}

pub fn from_na_rotation(q: &UnitQuaternion<Real>) -> DQuat {
    DQuat::from_xyzw(q.i as f64, q.j as f64, q.k as f64, q.w as f64).normalize()
}

/// Usable mass: zero, negative or non-finite values fall back to
/// `FALLBACK_MASS`.
pub fn sanitize_mass(mass: Option<f64>) -> f64 {
    match mass {
        Some(m) if m.is_finite() && m > 0.0 => m,
        Some(m) => {
            warn!("degenerate mass {m}, using {FALLBACK_MASS}");
            FALLBACK_MASS
        }
        None => FALLBACK_MASS,
    }
}

/// Collider geometry for an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Ball { radius: f64 },
    Hull(Size),
}

/// What kind of rigid body an entity gets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySpec {
    pub shape: BodyShape,
    pub mass: f64,
    /// Planets and stars do not move and only join shards that already exist.
    pub fixed: bool,
}

impl BodySpec {
    pub fn for_entity(ecs: &Ecs, id: EntityId) -> Self {
        let mass = sanitize_mass(ecs.get::<Mass>(id).map(|m| m.mass));
        if let Some(star) = ecs.get::<IsStar>(id) {
            return Self {
                shape: BodyShape::Ball {
                    radius: star.radius,
                },
                mass,
                fixed: true,
            };
        }
        if let Some(planet) = ecs.get::<IsPlanet>(id) {
            return Self {
                shape: BodyShape::Ball {
                    radius: planet.radius,
                },
                mass,
                fixed: true,
            };
        }
        if let Some(torpedo) = ecs.get::<IsTorpedo>(id) {
            return Self {
                shape: BodyShape::Ball {
                    radius: torpedo.radius,
                },
                mass,
                fixed: false,
            };
        }
        Self {
            shape: BodyShape::Hull(ecs.get::<Size>(id).copied().unwrap_or_default()),
            mass,
            fixed: false,
        }
    }

    /// Body and collider placed at a shard-local transform.
    pub fn build(
        &self,
        shards: &mut ShardTable,
        local_position: DVec3,
        rotation: DQuat,
    ) -> (RigidBody, Collider) {
        let builder = if self.fixed {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic().can_sleep(false).ccd_enabled(true)
        };
        let mut body = builder.build();
        body.set_translation(to_na_vector(local_position), true);
        body.set_rotation(to_na_rotation(rotation), true);

        let shape = match self.shape {
            BodyShape::Ball { radius } => SharedShape::ball((radius.abs().max(1e-3)) as Real),
            BodyShape::Hull(size) => shards.ship_shape(&size),
        };
        let collider = ColliderBuilder::new(shape).mass(self.mass as Real).build();
        (body, collider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_fallback() {
        assert_eq!(sanitize_mass(Some(500.0)), 500.0);
        assert_eq!(sanitize_mass(Some(0.0)), FALLBACK_MASS);
        assert_eq!(sanitize_mass(Some(-3.0)), FALLBACK_MASS);
        assert_eq!(sanitize_mass(Some(f64::NAN)), FALLBACK_MASS);
        assert_eq!(sanitize_mass(None), FALLBACK_MASS);
    }

    #[test]
    fn rotation_conversion_round_trip() {
        let q = DQuat::from_euler(glam::EulerRot::YXZ, 0.4, -0.2, 1.1);
        let back = from_na_rotation(&to_na_rotation(q));
        assert!(q.angle_between(back) < 1e-5);
    }

    #[test]
    fn ship_shapes_are_cached_by_size() {
        let mut shards = ShardTable::new();
        let spec = BodySpec {
            shape: BodyShape::Hull(Size::default()),
            mass: 10.0,
            fixed: false,
        };
        spec.build(&mut shards, DVec3::ZERO, DQuat::IDENTITY);
        spec.build(&mut shards, DVec3::ONE, DQuat::IDENTITY);
        assert_eq!(shards.cached_shape_count(), 1);
    }
}
