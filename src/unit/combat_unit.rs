//! Per-battle wrapper around a persistent unit

use std::cell::{Ref, RefMut};
use std::fmt;

use ahash::AHashMap;

use crate::board::{Position, Team};
use crate::core::error::ActionError;
use crate::core::types::UnitId;
use crate::unit::persistent::{PersistentUnit, SharedUnit, StatKind};

/// Skill identifier, as assigned by the skill subsystem
pub type SkillId = u32;

/// Ephemeral battle state for one unit
///
/// Created when a battle starts (or when a unit joins mid-battle) and
/// dropped when the unit leaves the board or the battle finalizes.
/// `position` always mirrors the board.
#[derive(Clone)]
pub struct CombatUnit {
    unit: SharedUnit,
    id: UnitId,
    pub team: Team,
    pub position: Position,
    /// Seconds until the next basic attack is allowed
    pub attack_cooldown: f32,
    skill_cooldowns: AHashMap<SkillId, f32>,
}

impl CombatUnit {
    /// `id` must be the id the board holds for `unit`
    pub fn new(id: UnitId, unit: SharedUnit, team: Team, position: Position) -> Self {
        Self {
            unit,
            id,
            team,
            position,
            attack_cooldown: 0.0,
            skill_cooldowns: AHashMap::new(),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn is_home(&self) -> bool {
        self.team == Team::Home
    }

    pub fn handle(&self) -> &SharedUnit {
        &self.unit
    }

    /// Alive according to the underlying unit. A unit that is currently
    /// borrowed elsewhere is treated as alive.
    pub fn is_alive(&self) -> bool {
        self.unit
            .try_borrow()
            .map(|u| u.is_alive())
            .unwrap_or(true)
    }

    pub fn display_name(&self) -> String {
        self.unit
            .try_borrow()
            .map(|u| u.name().to_string())
            .unwrap_or_else(|_| self.id.to_string())
    }

    pub fn stat(&self, kind: StatKind) -> Result<f32, ActionError> {
        Ok(self.read()?.stat(kind))
    }

    pub(crate) fn read(&self) -> Result<Ref<'_, dyn PersistentUnit>, ActionError> {
        self.unit
            .try_borrow()
            .map_err(|_| ActionError::UnitBusy(self.id))
    }

    pub(crate) fn write(&self) -> Result<RefMut<'_, dyn PersistentUnit + 'static>, ActionError> {
        self.unit
            .try_borrow_mut()
            .map_err(|_| ActionError::UnitBusy(self.id))
    }

    pub fn can_attack(&self) -> bool {
        self.attack_cooldown <= 0.0
    }

    /// Count the attack cooldown down, never below zero
    pub fn tick_attack_cooldown(&mut self, dt: f32) {
        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);
    }

    /// Remaining cooldown for a skill; unknown skills are ready
    pub fn skill_cooldown(&self, skill: SkillId) -> f32 {
        self.skill_cooldowns.get(&skill).copied().unwrap_or(0.0)
    }

    pub fn set_skill_cooldown(&mut self, skill: SkillId, seconds: f32) {
        self.skill_cooldowns.insert(skill, seconds.max(0.0));
    }

    pub fn skill_cooldowns_mut(&mut self) -> impl Iterator<Item = (&SkillId, &mut f32)> {
        self.skill_cooldowns.iter_mut()
    }
}

impl fmt::Debug for CombatUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatUnit")
            .field("id", &self.id)
            .field("team", &self.team)
            .field("position", &self.position)
            .field("attack_cooldown", &self.attack_cooldown)
            .finish()
    }
}
