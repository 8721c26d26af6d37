//! Autopilot control math for STARDECK.
//!
//! PID stepping, look-at steering, coordinate resolution between frames and
//! forward-engine selection. No ECS dependency; operates on plain data and
//! is driven by the autopilot systems in `stardeck-sim`.

pub mod coordinates;
pub mod forward;
pub mod pid;
pub mod steering;

pub use stardeck_core as core;

#[cfg(test)]
mod tests;
