//! Occupancy grid with home and away zones
//!
//! Every mutation validates first and writes second, so a refused request
//! leaves the board exactly as it was.

use std::fmt;

use ahash::AHashMap;

use crate::board::events::BoardEvent;
use crate::board::position::{Position, Team};
use crate::core::config::{BattleConfig, BoardConfig};
use crate::core::error::PlacementError;
use crate::core::types::UnitId;
use crate::events::{EventBus, SubscriptionId};
use crate::placement::{PlacementPhase, PlacementPolicy, PlacementRequest};
use crate::unit::SharedUnit;

/// What the board knows about one placed unit
#[derive(Clone)]
struct BoardEntry {
    unit: SharedUnit,
    position: Position,
    team: Team,
}

/// Fixed-size grid holding at most one unit per cell
pub struct GridBoard {
    layout: BoardConfig,
    max_team_size: usize,
    /// Row-major, `width * height` cells
    cells: Vec<Option<UnitId>>,
    entries: AHashMap<UnitId, BoardEntry>,
    /// Team members in placement order
    home: Vec<UnitId>,
    away: Vec<UnitId>,
    policy: PlacementPolicy,
    listeners: EventBus<BoardEvent>,
    /// Mutations not yet picked up by the battle simulator
    journal: Vec<BoardEvent>,
}

impl GridBoard {
    pub fn new(config: &BattleConfig) -> Self {
        Self::with_policy(config, PlacementPolicy::default())
    }

    pub fn with_policy(config: &BattleConfig, policy: PlacementPolicy) -> Self {
        let layout = config.board;
        let cell_count = (layout.width.max(0) * layout.height.max(0)) as usize;
        Self {
            layout,
            max_team_size: config.max_team_size,
            cells: vec![None; cell_count],
            entries: AHashMap::new(),
            home: Vec::new(),
            away: Vec::new(),
            policy,
            listeners: EventBus::new(),
            journal: Vec::new(),
        }
    }

    // ===== GEOMETRY =====

    pub fn width(&self) -> i32 {
        self.layout.width
    }

    pub fn height(&self) -> i32 {
        self.layout.height
    }

    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.layout.width && pos.y < self.layout.height
    }

    pub fn is_home_zone(&self, pos: Position) -> bool {
        self.is_valid_position(pos) && pos.y < self.layout.home_rows
    }

    pub fn is_away_zone(&self, pos: Position) -> bool {
        self.is_valid_position(pos) && pos.y >= self.layout.home_rows
    }

    /// Team whose zone contains `pos`
    pub fn zone_of(&self, pos: Position) -> Option<Team> {
        if self.is_home_zone(pos) {
            Some(Team::Home)
        } else if self.is_away_zone(pos) {
            Some(Team::Away)
        } else {
            None
        }
    }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        if self.is_valid_position(pos) {
            Some((pos.y * self.layout.width + pos.x) as usize)
        } else {
            None
        }
    }

    // ===== QUERIES =====

    pub fn unit_at(&self, pos: Position) -> Option<UnitId> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    pub fn position_of(&self, unit: UnitId) -> Option<Position> {
        self.entries.get(&unit).map(|e| e.position)
    }

    pub fn team_of(&self, unit: UnitId) -> Option<Team> {
        self.entries.get(&unit).map(|e| e.team)
    }

    pub fn unit_handle(&self, unit: UnitId) -> Option<SharedUnit> {
        self.entries.get(&unit).map(|e| e.unit.clone())
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.entries.contains_key(&unit)
    }

    /// Members of a team, in the order they were placed
    pub fn units_of(&self, team: Team) -> &[UnitId] {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }

    pub fn is_member(&self, team: Team, unit: UnitId) -> bool {
        self.team_of(unit) == Some(team)
    }

    pub fn team_size(&self, team: Team) -> usize {
        self.units_of(team).len()
    }

    pub fn max_team_size(&self) -> usize {
        self.max_team_size
    }

    /// All placed units as `(id, position, team)`, home team first
    pub fn occupants(&self) -> impl Iterator<Item = (UnitId, Position, Team)> + '_ {
        self.home
            .iter()
            .chain(self.away.iter())
            .filter_map(|id| self.entries.get(id).map(|e| (*id, e.position, e.team)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn policy(&self) -> &PlacementPolicy {
        &self.policy
    }

    /// Register additional placement rules
    pub fn policy_mut(&mut self) -> &mut PlacementPolicy {
        &mut self.policy
    }

    // ===== MUTATIONS =====

    /// Put a unit on the board, or relocate it if it is already placed
    ///
    /// A placed unit keeps its team; asking to place it for the other team
    /// is refused.
    pub fn place(
        &mut self,
        unit: SharedUnit,
        position: Position,
        team: Team,
    ) -> Result<(), PlacementError> {
        let id = unit
            .try_borrow()
            .map(|u| u.id())
            .map_err(|_| PlacementError::Rejected {
                rule: "handle".into(),
                reason: "unit is borrowed elsewhere".into(),
            })?;

        if let Some(current) = self.team_of(id) {
            if current != team {
                return Err(PlacementError::TeamMismatch { unit: id, current });
            }
            return self.relocate(id, position, PlacementPhase::Deployment);
        }

        self.check(PlacementRequest {
            unit: id,
            position,
            team,
            phase: PlacementPhase::Deployment,
        })?;

        let Some(index) = self.index(position) else {
            return Err(PlacementError::OutOfBounds(position));
        };
        self.cells[index] = Some(id);
        self.entries.insert(
            id,
            BoardEntry {
                unit,
                position,
                team,
            },
        );
        match team {
            Team::Home => self.home.push(id),
            Team::Away => self.away.push(id),
        }

        tracing::debug!(unit = %id, ?team, "placed at {}", position);
        self.emit(BoardEvent::UnitPlaced {
            unit: id,
            position,
            team,
        });
        self.emit(BoardEvent::BoardChanged);
        Ok(())
    }

    /// Move a placed unit to another cell, under the full placement policy
    pub fn move_unit(&mut self, unit: UnitId, to: Position) -> Result<(), PlacementError> {
        self.relocate(unit, to, PlacementPhase::Deployment)
    }

    /// One battle-loop step; zone restrictions do not apply
    pub fn step_unit(&mut self, unit: UnitId, to: Position) -> Result<(), PlacementError> {
        self.relocate(unit, to, PlacementPhase::Combat)
    }

    /// Take a unit off the board, returning the cell it occupied
    pub fn remove(&mut self, unit: UnitId) -> Result<Position, PlacementError> {
        let entry = self
            .entries
            .remove(&unit)
            .ok_or(PlacementError::NotOnBoard(unit))?;

        if let Some(index) = self.index(entry.position) {
            self.cells[index] = None;
        }
        match entry.team {
            Team::Home => self.home.retain(|id| *id != unit),
            Team::Away => self.away.retain(|id| *id != unit),
        }

        tracing::debug!(unit = %unit, "removed from {}", entry.position);
        self.emit(BoardEvent::UnitRemoved {
            unit,
            position: entry.position,
            team: entry.team,
        });
        self.emit(BoardEvent::BoardChanged);
        Ok(entry.position)
    }

    /// Remove every unit
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        let order: Vec<UnitId> = self.home.iter().chain(self.away.iter()).copied().collect();
        for id in order {
            if let Some(entry) = self.entries.remove(&id) {
                self.emit(BoardEvent::UnitRemoved {
                    unit: id,
                    position: entry.position,
                    team: entry.team,
                });
            }
        }
        self.cells.iter_mut().for_each(|c| *c = None);
        self.home.clear();
        self.away.clear();
        self.emit(BoardEvent::BoardChanged);
    }

    fn relocate(
        &mut self,
        unit: UnitId,
        to: Position,
        phase: PlacementPhase,
    ) -> Result<(), PlacementError> {
        let (from, team) = self
            .entries
            .get(&unit)
            .map(|e| (e.position, e.team))
            .ok_or(PlacementError::NotOnBoard(unit))?;

        self.check(PlacementRequest {
            unit,
            position: to,
            team,
            phase,
        })?;

        if from == to {
            return Ok(());
        }

        let (Some(from_index), Some(to_index)) = (self.index(from), self.index(to)) else {
            return Err(PlacementError::OutOfBounds(to));
        };
        self.cells[from_index] = None;
        self.cells[to_index] = Some(unit);
        if let Some(entry) = self.entries.get_mut(&unit) {
            entry.position = to;
        }

        self.emit(BoardEvent::UnitMoved { unit, from, to });
        self.emit(BoardEvent::BoardChanged);
        Ok(())
    }

    /// Raw bounds and occupancy, then the policy chain
    fn check(&self, request: PlacementRequest) -> Result<(), PlacementError> {
        if !self.is_valid_position(request.position) {
            return Err(PlacementError::OutOfBounds(request.position));
        }
        self.policy.validate(self, &request)?;

        // A cell holds one unit even under a policy without the occupancy rule
        if let Some(occupant) = self.unit_at(request.position) {
            if occupant != request.unit {
                return Err(PlacementError::Occupied {
                    position: request.position,
                    occupant,
                });
            }
        }
        Ok(())
    }

    // ===== NOTIFICATIONS =====

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&BoardEvent) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Drain mutations recorded since the last call
    pub fn take_journal(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.journal)
    }

    fn emit(&mut self, event: BoardEvent) {
        self.listeners.publish(&event);
        self.journal.push(event);
    }
}

impl fmt::Debug for GridBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridBoard")
            .field("width", &self.layout.width)
            .field("height", &self.layout.height)
            .field("home_rows", &self.layout.home_rows)
            .field("home", &self.home)
            .field("away", &self.away)
            .field("policy", &self.policy)
            .finish()
    }
}
