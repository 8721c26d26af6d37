//! Error type for the entity lifecycle API.
//!
//! Raised only at the boundary where external collaborators create, remove and
//! mutate entities. The tick path never produces these; systems return early
//! on missing data instead.

use std::fmt;

use crate::entity::EntityId;
use crate::enums::ComponentKind;

#[derive(Debug)]
pub enum EcsError {
    /// The id is stale or was never handed out.
    UnknownEntity(EntityId),
    /// The entity exists but lacks a component the operation needs.
    MissingComponent { id: EntityId, kind: ComponentKind },
    /// A subsystem may belong to only one ship at a time.
    SystemAlreadyAssigned { system: EntityId, ship: EntityId },
    /// A JSON component payload did not fit the component's shape.
    Json(serde_json::Error),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::UnknownEntity(id) => write!(f, "unknown entity {id}"),
            EcsError::MissingComponent { id, kind } => {
                write!(f, "entity {id} has no {kind} component")
            }
            EcsError::SystemAlreadyAssigned { system, ship } => {
                write!(f, "system {system} already belongs to ship {ship}")
            }
            EcsError::Json(e) => write!(f, "invalid component data: {e}"),
        }
    }
}

impl std::error::Error for EcsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EcsError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EcsError {
    fn from(e: serde_json::Error) -> Self {
        EcsError::Json(e)
    }
}
