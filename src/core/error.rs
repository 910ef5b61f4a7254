use thiserror::Error;

use crate::battle::state::BattleState;
use crate::board::{Position, Team};
use crate::core::types::UnitId;

/// Why a place or move request was refused by the board
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("Position {0} is outside the board")]
    OutOfBounds(Position),

    #[error("{team:?} unit cannot be placed at {position}: outside its zone")]
    WrongZone { position: Position, team: Team },

    #[error("{team:?} team is full ({capacity} units)")]
    TeamFull { team: Team, capacity: usize },

    #[error("Position {position} is occupied by unit {occupant}")]
    Occupied { position: Position, occupant: UnitId },

    #[error("Unit {0} is not on the board")]
    NotOnBoard(UnitId),

    #[error("Unit {unit} already fights for the {current:?} team")]
    TeamMismatch { unit: UnitId, current: Team },

    #[error("Rule '{rule}' rejected placement: {reason}")]
    Rejected { rule: String, reason: String },
}

/// Structural problems with a battle setup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    #[error("Enemy roster is empty")]
    EmptyRoster,

    #[error("Roster has {units} units but {positions} positions")]
    PositionCountMismatch { units: usize, positions: usize },

    #[error("Time limit must be positive, got {0}")]
    NonPositiveTimeLimit(f32),

    #[error("Escalation interval must be positive, got {0}")]
    NonPositiveEscalationInterval(f32),
}

/// Why a battle could not be started
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StartError {
    #[error("No battle setup supplied")]
    MissingSetup,

    #[error("Invalid battle setup: {0}")]
    InvalidSetup(#[from] SetupError),

    #[error("A battle is already active (state {0:?})")]
    AlreadyActive(BattleState),

    #[error("Not enough combatants: {home} home, {away} away")]
    NoCombatants { home: usize, away: usize },
}

/// Failure while resolving a single unit's action during a tick
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Unit {0} is borrowed elsewhere")]
    UnitBusy(UnitId),

    #[error("Board refused step: {0}")]
    Board(#[from] PlacementError),
}

/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
