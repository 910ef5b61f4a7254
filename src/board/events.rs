//! Board notifications

use serde::{Deserialize, Serialize};

use crate::board::position::{Position, Team};
use crate::core::types::UnitId;

/// Emitted after every successful board mutation
///
/// Each specific event is followed by a `BoardChanged`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoardEvent {
    UnitPlaced {
        unit: UnitId,
        position: Position,
        team: Team,
    },
    UnitMoved {
        unit: UnitId,
        from: Position,
        to: Position,
    },
    UnitRemoved {
        unit: UnitId,
        position: Position,
        team: Team,
    },
    BoardChanged,
}
