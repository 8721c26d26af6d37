//! Rigid-body shards and the motion math shared by the collision and
//! kinematic integration paths.

pub mod bodies;
pub mod motion;
pub mod world;

pub use world::{BodyLink, RigidBodyWorld, ShardTable};
