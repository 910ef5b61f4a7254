//! Battle setup: the immutable description of one encounter

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::core::error::SetupError;
use crate::core::types::Seconds;
use crate::unit::SharedUnit;

/// Damage escalation schedule for long battles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationSettings {
    pub enabled: bool,
    /// Battle time before the first level can be reached
    pub start_time: Seconds,
    /// Seconds between level increments once started
    pub interval: Seconds,
    /// Extra damage per level, in percent
    pub percent_per_level: f32,
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: 30.0,
            interval: 10.0,
            percent_per_level: 5.0,
        }
    }
}

/// Base rewards before the outcome lookup is applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSettings {
    pub base_gold: u32,
    pub base_experience: u32,
    pub multiplier: f32,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            base_gold: 100,
            base_experience: 50,
            multiplier: 1.0,
        }
    }
}

/// Everything needed to start a battle against a fixed enemy roster
///
/// `enemy_units[i]` is deployed at `enemy_positions[i]`.
#[derive(Clone)]
pub struct BattleSetup {
    pub name: String,
    pub time_limit: Seconds,
    pub escalation: EscalationSettings,
    pub enemy_units: Vec<SharedUnit>,
    pub enemy_positions: Vec<Position>,
    pub rewards: RewardSettings,
}

impl BattleSetup {
    pub fn new(name: impl Into<String>, time_limit: Seconds) -> Self {
        Self {
            name: name.into(),
            time_limit,
            escalation: EscalationSettings::default(),
            enemy_units: Vec::new(),
            enemy_positions: Vec::new(),
            rewards: RewardSettings::default(),
        }
    }

    pub fn with_enemy(mut self, unit: SharedUnit, position: Position) -> Self {
        self.enemy_units.push(unit);
        self.enemy_positions.push(position);
        self
    }

    pub fn with_escalation(mut self, escalation: EscalationSettings) -> Self {
        self.escalation = escalation;
        self
    }

    pub fn with_rewards(mut self, rewards: RewardSettings) -> Self {
        self.rewards = rewards;
        self
    }

    /// Structural checks only; says nothing about whether placement succeeds
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.enemy_units.is_empty() {
            return Err(SetupError::EmptyRoster);
        }
        if self.enemy_units.len() != self.enemy_positions.len() {
            return Err(SetupError::PositionCountMismatch {
                units: self.enemy_units.len(),
                positions: self.enemy_positions.len(),
            });
        }
        if !(self.time_limit > 0.0) {
            return Err(SetupError::NonPositiveTimeLimit(self.time_limit));
        }
        if self.escalation.enabled && !(self.escalation.interval > 0.0) {
            return Err(SetupError::NonPositiveEscalationInterval(
                self.escalation.interval,
            ));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemy_units.len()
    }

    /// `(unit, position)` pairs in roster order
    pub fn deployments(&self) -> impl Iterator<Item = (&SharedUnit, Position)> + '_ {
        self.enemy_units
            .iter()
            .zip(self.enemy_positions.iter().copied())
    }
}

impl fmt::Debug for BattleSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BattleSetup")
            .field("name", &self.name)
            .field("time_limit", &self.time_limit)
            .field("escalation", &self.escalation)
            .field("enemies", &self.enemy_units.len())
            .field("enemy_positions", &self.enemy_positions)
            .field("rewards", &self.rewards)
            .finish()
    }
}
