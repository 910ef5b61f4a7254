//! Built-in placement rules, in the order the default policy runs them

use super::{PlacementPhase, PlacementRequest, PlacementRule};
use crate::board::{GridBoard, Team};
use crate::core::error::PlacementError;

/// Target cell must exist on the board
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsRule;

impl PlacementRule for BoundsRule {
    fn name(&self) -> &str {
        "bounds"
    }

    fn check(&self, board: &GridBoard, request: &PlacementRequest) -> Result<(), PlacementError> {
        if board.is_valid_position(request.position) {
            Ok(())
        } else {
            Err(PlacementError::OutOfBounds(request.position))
        }
    }
}

/// Home units deploy only in the home zone, away units only in the away zone
///
/// Combat steps are exempt: units may chase into the opposing zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneRule;

impl PlacementRule for ZoneRule {
    fn name(&self) -> &str {
        "zone"
    }

    fn check(&self, board: &GridBoard, request: &PlacementRequest) -> Result<(), PlacementError> {
        if request.phase == PlacementPhase::Combat {
            return Ok(());
        }

        let allowed = match request.team {
            Team::Home => board.is_home_zone(request.position),
            Team::Away => board.is_away_zone(request.position),
        };

        if allowed {
            Ok(())
        } else {
            Err(PlacementError::WrongZone {
                position: request.position,
                team: request.team,
            })
        }
    }
}

/// A team may not grow past the configured size
///
/// Existing members are always allowed through, so moves never trip it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamCapacityRule;

impl PlacementRule for TeamCapacityRule {
    fn name(&self) -> &str {
        "team_capacity"
    }

    fn check(&self, board: &GridBoard, request: &PlacementRequest) -> Result<(), PlacementError> {
        if board.is_member(request.team, request.unit) {
            return Ok(());
        }

        let capacity = board.max_team_size();
        if board.team_size(request.team) >= capacity {
            return Err(PlacementError::TeamFull {
                team: request.team,
                capacity,
            });
        }
        Ok(())
    }
}

/// Target cell must be empty or already hold the requesting unit
#[derive(Debug, Clone, Copy, Default)]
pub struct OccupancyRule;

impl PlacementRule for OccupancyRule {
    fn name(&self) -> &str {
        "occupancy"
    }

    fn check(&self, board: &GridBoard, request: &PlacementRequest) -> Result<(), PlacementError> {
        match board.unit_at(request.position) {
            Some(occupant) if occupant != request.unit => Err(PlacementError::Occupied {
                position: request.position,
                occupant,
            }),
            _ => Ok(()),
        }
    }
}
