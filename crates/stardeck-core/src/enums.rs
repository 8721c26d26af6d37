//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Coordinate frame a position is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionFrame {
    /// Light-years, galaxy-wide.
    #[default]
    Interstellar,
    /// Kilometers from the center of a solar system entity.
    Solar { system: EntityId },
}

impl PositionFrame {
    /// Containing solar system, if any.
    pub fn system(&self) -> Option<EntityId> {
        match self {
            PositionFrame::Interstellar => None,
            PositionFrame::Solar { system } => Some(*system),
        }
    }

    pub fn is_interstellar(&self) -> bool {
        matches!(self, PositionFrame::Interstellar)
    }
}

/// How a power node hands its supply down to its terminal systems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistributionMode {
    /// Water-fill: smallest draws satisfied first, remainder split evenly.
    #[default]
    Evenly,
    /// Largest draw first, greedily.
    MostFirst,
    /// Smallest draw first, greedily.
    LeastFirst,
}

/// Which forward propulsion the autopilot is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForwardEngine {
    Impulse,
    Warp,
}

/// Integration strategy the physics system picked for an entity this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicsPath {
    /// Direct integration, no collision resolution.
    #[default]
    Kinematic,
    /// Rigid body inside a spatial shard's simulation.
    Collision,
}

/// Run state of the simulation engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    #[default]
    Running,
    Paused,
}

/// Component type key. One variant per component column in the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    Position,
    Velocity,
    Rotation,
    RotationVelocity,
    Mass,
    Size,
    IsShip,
    IsPlanet,
    IsStar,
    IsTorpedo,
    SolarSystem,
    Power,
    Reactor,
    Battery,
    PowerNode,
    ImpulseEngines,
    WarpEngines,
    Thrusters,
    InertialDampeners,
    PhysicsWorld,
    Autopilot,
    ShipSystems,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 22] = [
        ComponentKind::Position,
        ComponentKind::Velocity,
        ComponentKind::Rotation,
        ComponentKind::RotationVelocity,
        ComponentKind::Mass,
        ComponentKind::Size,
        ComponentKind::IsShip,
        ComponentKind::IsPlanet,
        ComponentKind::IsStar,
        ComponentKind::IsTorpedo,
        ComponentKind::SolarSystem,
        ComponentKind::Power,
        ComponentKind::Reactor,
        ComponentKind::Battery,
        ComponentKind::PowerNode,
        ComponentKind::ImpulseEngines,
        ComponentKind::WarpEngines,
        ComponentKind::Thrusters,
        ComponentKind::InertialDampeners,
        ComponentKind::PhysicsWorld,
        ComponentKind::Autopilot,
        ComponentKind::ShipSystems,
    ];
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
