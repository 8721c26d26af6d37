//! Simulation snapshot: the read-only state handed to the broadcast
//! collaborator after each tick.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::enums::*;
use crate::types::{Position, Rotation, SimTime, Velocity};

/// Complete visible state after a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub time: SimTime,
    pub phase: SimPhase,
    pub ships: Vec<ShipView>,
    pub bodies: Vec<BodyView>,
    pub power: Vec<PowerView>,
    pub reactors: Vec<ReactorView>,
    pub batteries: Vec<BatteryView>,
    pub physics_worlds: Vec<PhysicsWorldView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipView {
    pub id: EntityId,
    pub name: String,
    pub position: Position,
    pub rotation: Rotation,
    pub velocity: Velocity,
    /// Speed magnitude (km/s).
    pub speed: f64,
    /// Velocity component along the ship's facing (km/s).
    pub forward_speed: f64,
    pub impulse_target_speed: Option<f64>,
    pub warp_factor: Option<f64>,
    pub autopilot_engaged: bool,
    pub driving: Option<ForwardEngine>,
    pub physics_path: PhysicsPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    SolarSystem,
    Star,
    Planet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyView {
    pub id: EntityId,
    pub kind: BodyKind,
    pub position: Position,
    /// Radius in km.
    pub radius: f64,
}

/// Power state of one terminal system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerView {
    pub id: EntityId,
    pub requested_power: f64,
    pub power_draw: f64,
    pub current_power: f64,
    /// Whether the system is being driven above its safe limit.
    pub overloaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactorView {
    pub id: EntityId,
    pub current_output: f64,
    pub max_output: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryView {
    pub id: EntityId,
    pub storage: f64,
    pub capacity: f64,
    pub charge_amount: f64,
    pub discharge_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsWorldView {
    pub id: EntityId,
    pub location: Position,
    pub enabled: bool,
    pub bodies: usize,
}
