//! Placement policy: an ordered, fail-fast chain of rules
//!
//! The board consults the policy before every place or move. Rules only
//! read the board; the first rule that fails decides the error.

mod rules;

pub use rules::{BoundsRule, OccupancyRule, TeamCapacityRule, ZoneRule};

use std::fmt;

use crate::board::{GridBoard, Position, Team};
use crate::core::error::PlacementError;
use crate::core::types::UnitId;

/// Where a placement request comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPhase {
    /// Setup and external place/move requests
    Deployment,
    /// Single-cell steps taken by the battle loop
    Combat,
}

/// A unit asking to occupy a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    pub unit: UnitId,
    pub position: Position,
    pub team: Team,
    pub phase: PlacementPhase,
}

/// One independent check in the placement chain
pub trait PlacementRule {
    /// Short name used in logs and rejection messages
    fn name(&self) -> &str;

    fn check(&self, board: &GridBoard, request: &PlacementRequest) -> Result<(), PlacementError>;
}

/// Ordered list of placement rules
///
/// The default chain is bounds, zone, team capacity, occupancy. Extra
/// rules registered later run after the built-in ones.
pub struct PlacementPolicy {
    rules: Vec<Box<dyn PlacementRule>>,
}

impl PlacementPolicy {
    /// Policy with no rules at all
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule to the end of the chain
    pub fn register<R: PlacementRule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    pub fn with_rule<R: PlacementRule + 'static>(mut self, rule: R) -> Self {
        self.register(rule);
        self
    }

    /// Run every rule in order, stopping at the first failure
    pub fn validate(
        &self,
        board: &GridBoard,
        request: &PlacementRequest,
    ) -> Result<(), PlacementError> {
        for rule in &self.rules {
            if let Err(err) = rule.check(board, request) {
                tracing::debug!(rule = rule.name(), unit = %request.unit, "placement rejected: {}", err);
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self::empty()
            .with_rule(BoundsRule)
            .with_rule(ZoneRule)
            .with_rule(TeamCapacityRule)
            .with_rule(OccupancyRule)
    }
}

impl fmt::Debug for PlacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacementPolicy")
            .field("rules", &self.rule_names())
            .finish()
    }
}
