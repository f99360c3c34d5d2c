//! Unit lifecycle notifications from the host

use serde::{Deserialize, Serialize};

use crate::core::types::UnitId;
use crate::units::UnitSnapshot;

/// Something happened to a unit between ticks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UnitEvent {
    /// A unit came into existence (own) or was first seen (enemy)
    Created(UnitSnapshot),
    Destroyed(UnitId),
    /// The unit changed type in place, e.g. a worker became a building
    Morphed(UnitSnapshot),
    /// A known unit came back into vision
    Shown(UnitSnapshot),
    Hidden(UnitId),
    /// The unit changed owner
    Renegaded(UnitSnapshot),
}

impl UnitEvent {
    pub fn unit(&self) -> UnitId {
        match self {
            UnitEvent::Created(s) | UnitEvent::Morphed(s) | UnitEvent::Shown(s) | UnitEvent::Renegaded(s) => s.id,
            UnitEvent::Destroyed(id) | UnitEvent::Hidden(id) => *id,
        }
    }
}
