//! Battle configuration with documented constants
//!
//! All tunable numbers live here. A config is passed explicitly to the
//! board and the simulator; nothing reads a global instance.

use serde::{Deserialize, Serialize};

use crate::battle::result::BattleOutcome;
use crate::core::error::ConfigError;

/// Board dimensions and zone split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Number of columns
    pub width: i32,
    /// Number of rows
    pub height: i32,
    /// Rows `0..home_rows` form the home zone, the rest the away zone
    pub home_rows: i32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 7,
            height: 8,
            home_rows: 4,
        }
    }
}

/// Reward factors for one outcome, applied to the setup's base rewards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReward {
    pub gold_factor: f32,
    pub experience_factor: f32,
}

impl OutcomeReward {
    pub const fn new(gold_factor: f32, experience_factor: f32) -> Self {
        Self {
            gold_factor,
            experience_factor,
        }
    }
}

/// Fixed outcome -> reward lookup
///
/// Victory pays the most, defeat the least. All factors are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    pub victory: OutcomeReward,
    pub draw: OutcomeReward,
    pub defeat: OutcomeReward,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            victory: OutcomeReward::new(1.0, 1.0),
            draw: OutcomeReward::new(0.5, 0.5),
            defeat: OutcomeReward::new(0.2, 0.2),
        }
    }
}

impl RewardTable {
    pub fn for_outcome(&self, outcome: BattleOutcome) -> OutcomeReward {
        match outcome {
            BattleOutcome::Victory => self.victory,
            BattleOutcome::Draw => self.draw,
            BattleOutcome::Defeat => self.defeat,
        }
    }
}

/// Configuration for the board and the battle loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    // === BOARD ===
    pub board: BoardConfig,

    /// Maximum members per team, enforced by the team-capacity rule
    pub max_team_size: usize,

    // === TIME ===
    /// Length of one simulation tick in seconds
    ///
    /// The loop runs `floor(accumulated / fixed_step)` ticks per advance,
    /// so the tick count depends only on total elapsed time.
    pub fixed_step: f32,

    // === COMBAT ===
    /// Attack speeds below this are clamped before computing the cooldown
    ///
    /// Keeps `1 / attack_speed` finite for units with zero speed.
    pub min_attack_speed: f32,

    // === REWARDS ===
    pub rewards: RewardTable,

    /// Remove the setup's surviving away units from the board on finalize
    pub clear_enemies_on_finalize: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            max_team_size: 8,
            fixed_step: 0.1,
            min_attack_speed: 0.01,
            rewards: RewardTable::default(),
            clear_enemies_on_finalize: true,
        }
    }
}

impl BattleConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let board = &self.board;
        if board.width <= 0 || board.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "board must have positive size, got {}x{}",
                board.width, board.height
            )));
        }

        // Both zones need at least one row
        if board.home_rows <= 0 || board.home_rows >= board.height {
            return Err(ConfigError::Invalid(format!(
                "home_rows ({}) must be in 1..{}",
                board.home_rows, board.height
            )));
        }

        if self.max_team_size == 0 {
            return Err(ConfigError::Invalid("max_team_size must be at least 1".into()));
        }

        if self.fixed_step <= 0.0 || !self.fixed_step.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "fixed_step must be positive, got {}",
                self.fixed_step
            )));
        }

        if self.min_attack_speed <= 0.0 {
            return Err(ConfigError::Invalid("min_attack_speed must be positive".into()));
        }

        let table = &self.rewards;
        for (name, reward) in [
            ("victory", table.victory),
            ("draw", table.draw),
            ("defeat", table.defeat),
        ] {
            if reward.gold_factor < 0.0 || reward.experience_factor < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} reward factors must be non-negative",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Parse and validate a config from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }
}
