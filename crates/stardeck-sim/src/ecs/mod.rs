//! Struct-of-arrays entity store and the system scheduler.
//!
//! Each component type has its own `Vec<Option<T>>` column indexed by entity
//! slot. System membership is computed lazily: presence changes mark an
//! entity dirty, and the scheduler re-tests dirty entities once at the start
//! of the next tick.

pub mod scheduler;
pub mod store;
pub mod world;

pub use scheduler::{Scheduler, System};
pub use store::{Component, ComponentStore};
pub use world::{Ecs, EntityBuilder, EntityView};
