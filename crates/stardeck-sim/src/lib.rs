//! Simulation engine for STARDECK.
//!
//! Owns the entity store and the system pipeline, shards solar-system space
//! into rigid-body worlds, distributes reactor power and flies ships on
//! autopilot. Produces a `SimSnapshot` every tick.

pub mod context;
pub mod ecs;
pub mod engine;
pub mod physics;
pub mod spatial;
pub mod systems;
pub mod waterfill;
pub mod world_setup;

pub use stardeck_core as core;
pub use context::SimContext;
pub use engine::{SimConfig, SimulationEngine};
