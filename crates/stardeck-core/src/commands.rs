//! Commands sent by external collaborators to the simulation.
//!
//! Commands are queued and applied at the next tick boundary, so nothing
//! outside the systems themselves writes component state mid-tick.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::enums::ComponentKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimCommand {
    // --- Entity lifecycle ---
    /// Destroy an entity and all of its components.
    RemoveEntity { id: EntityId },
    /// Shallow per-key merge into a component, creating it if absent.
    MergeComponent {
        id: EntityId,
        kind: ComponentKind,
        data: serde_json::Value,
    },
    /// Detach one component from an entity.
    RemoveComponent { id: EntityId, kind: ComponentKind },

    // --- Simulation control ---
    /// Set time scale (1.0 = normal, 2.0 = double).
    SetTimeScale { scale: f64 },
    /// Pause the simulation.
    Pause,
    /// Resume the simulation.
    Resume,
}
