//! Battle system - auto-battle between two teams on a grid board
//!
//! Deterministic given the same inputs:
//! - Fixed-step ticks, independent of frame rate
//! - Targets and steps chosen with fixed tie-breaks
//! - Home roster acts before away roster, in placement order

pub mod collaborators;
pub mod escalation;
pub mod events;
pub mod movement;
pub mod resolution;
pub mod result;
pub mod setup;
pub mod simulator;
pub mod state;
pub mod targeting;

// Re-exports for convenient access
pub use collaborators::{CooldownTicker, RewardLedger, SkillSystem, SynergySystem};
pub use escalation::Escalation;
pub use events::{BattleEvent, BattleEventLog, BattleEventType};
pub use movement::{chase_step, greedy_step};
pub use resolution::{attack_cooldown, compute_damage};
pub use result::{BattleOutcome, BattleResult, BattleStats, EndReason, Reward};
pub use setup::{BattleSetup, EscalationSettings, RewardSettings};
pub use simulator::BattleSimulator;
pub use state::BattleState;
pub use targeting::find_nearest_target;
