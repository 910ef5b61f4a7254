//! Battle outcomes and the result record emitted when a battle ends

use serde::{Deserialize, Serialize};

use crate::battle::setup::RewardSettings;
use crate::core::config::RewardTable;
use crate::core::types::{Seconds, Tick};

/// Outcome from the home team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Draw,
}

/// Why the battle stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// One or both sides ran out of living units, or the caller ended it
    Decided,
    /// The setup's time limit was reached
    TimeLimit,
    /// `force_end_battle` was called
    Forced,
}

/// Gold and experience awarded for a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reward {
    pub gold: u32,
    pub experience: u32,
}

impl Reward {
    pub const ZERO: Reward = Reward {
        gold: 0,
        experience: 0,
    };

    /// Outcome lookup applied to the setup's base rewards
    pub fn for_outcome(outcome: BattleOutcome, table: &RewardTable, base: &RewardSettings) -> Self {
        let factors = table.for_outcome(outcome);
        let scale = |amount: u32, factor: f32| -> u32 {
            let value = (amount as f32 * base.multiplier.max(0.0) * factor.max(0.0)).round();
            value.max(0.0) as u32
        };
        Self {
            gold: scale(base.base_gold, factors.gold_factor),
            experience: scale(base.base_experience, factors.experience_factor),
        }
    }
}

/// Running counters collected while the battle is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattleStats {
    /// Damage absorbed by away units from home attacks
    pub damage_dealt: i64,
    /// Damage absorbed by home units from away attacks
    pub damage_taken: i64,
    pub enemies_defeated: u32,
    pub allies_lost: u32,
    pub ticks: Tick,
}

/// Final record of one battle, built once and emitted with `BattleEnded`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub battle_name: String,
    pub outcome: BattleOutcome,
    pub end_reason: EndReason,
    /// Battle clock at the moment the battle ended
    pub duration: Seconds,
    pub was_force_ended: bool,
    pub reward: Reward,
    pub stats: BattleStats,
}

impl BattleResult {
    pub fn is_victory(&self) -> bool {
        self.outcome == BattleOutcome::Victory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_lookup_scales_base() {
        let table = RewardTable::default();
        let base = RewardSettings {
            base_gold: 100,
            base_experience: 40,
            multiplier: 1.5,
        };
        let victory = Reward::for_outcome(BattleOutcome::Victory, &table, &base);
        assert_eq!(victory, Reward { gold: 150, experience: 60 });

        let draw = Reward::for_outcome(BattleOutcome::Draw, &table, &base);
        assert_eq!(draw, Reward { gold: 75, experience: 30 });

        let defeat = Reward::for_outcome(BattleOutcome::Defeat, &table, &base);
        assert_eq!(defeat, Reward { gold: 30, experience: 12 });
    }

    #[test]
    fn test_reward_never_negative() {
        let base = RewardSettings {
            base_gold: 10,
            base_experience: 10,
            multiplier: -3.0,
        };
        let reward = Reward::for_outcome(BattleOutcome::Victory, &RewardTable::default(), &base);
        assert_eq!(reward, Reward::ZERO);
    }

    #[test]
    fn test_result_serializes() {
        let result = BattleResult {
            battle_name: "Bridge".into(),
            outcome: BattleOutcome::Draw,
            end_reason: EndReason::Forced,
            duration: 2.5,
            was_force_ended: true,
            reward: Reward::ZERO,
            stats: BattleStats::default(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"Forced\""));
        let back: BattleResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
