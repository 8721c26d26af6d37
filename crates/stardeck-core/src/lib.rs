//! Core types and definitions for the STARDECK simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! entity ids, components, commands, snapshots, errors and constants.
//! It has no dependency on the physics engine or any runtime.

pub mod commands;
pub mod components;
pub mod constants;
pub mod entity;
pub mod enums;
pub mod error;
pub mod state;
pub mod types;

pub use entity::EntityId;
pub use error::EcsError;

#[cfg(test)]
mod tests;
