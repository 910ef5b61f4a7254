//! External systems the simulator calls into
//!
//! All of them are optional. A simulator without a ledger still computes
//! rewards; it just has nowhere to deposit the gold.

use crate::board::GridBoard;
use crate::unit::CombatUnit;

/// Receives currency earned from battles
pub trait RewardLedger {
    fn add_currency(&mut self, amount: u32, reason: &str);
}

/// Owns skill logic; the simulator only asks it to age cooldowns
pub trait SkillSystem {
    fn update_cooldowns(&mut self, unit: &mut CombatUnit, dt: f32);
}

/// Recomputes team bonuses when the board layout changes
pub trait SynergySystem {
    fn recalculate(&mut self, board: &GridBoard);
}

/// Skill system that only counts every cooldown down to zero
#[derive(Debug, Clone, Copy, Default)]
pub struct CooldownTicker;

impl SkillSystem for CooldownTicker {
    fn update_cooldowns(&mut self, unit: &mut CombatUnit, dt: f32) {
        for (_, remaining) in unit.skill_cooldowns_mut() {
            *remaining = (*remaining - dt).max(0.0);
        }
    }
}
