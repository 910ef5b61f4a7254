//! Battle notifications and the per-call event log

use serde::{Deserialize, Serialize};

use crate::battle::result::BattleResult;
use crate::battle::state::BattleState;
use crate::board::Position;
use crate::core::types::{Tick, UnitId};

/// Log entry for battle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub tick: Tick,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    StateChanged {
        from: BattleState,
        to: BattleState,
    },
    UnitTookDamage {
        attacker: UnitId,
        target: UnitId,
        amount: i32,
    },
    UnitMoved {
        unit: UnitId,
        from: Position,
        to: Position,
    },
    UnitDefeated {
        unit: UnitId,
    },
    EscalationRaised {
        level: u32,
    },
    BattleEnded {
        result: BattleResult,
    },
}

/// Events fired during one simulator call, in firing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String, tick: Tick) {
        self.events.push(BattleEvent {
            tick,
            event_type,
            description,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter()
    }

    /// The result carried by a `BattleEnded` event, if one fired
    pub fn battle_result(&self) -> Option<&BattleResult> {
        self.events.iter().find_map(|e| match &e.event_type {
            BattleEventType::BattleEnded { result } => Some(result),
            _ => None,
        })
    }

    pub fn damage_events(&self) -> impl Iterator<Item = (UnitId, UnitId, i32)> + '_ {
        self.events.iter().filter_map(|e| match e.event_type {
            BattleEventType::UnitTookDamage {
                attacker,
                target,
                amount,
            } => Some((attacker, target, amount)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::result::{BattleOutcome, BattleStats, EndReason, Reward};

    #[test]
    fn test_log_queries() {
        let (a, b) = (UnitId::new(), UnitId::new());
        let mut log = BattleEventLog::new();
        log.push(
            BattleEventType::UnitTookDamage {
                attacker: a,
                target: b,
                amount: 4,
            },
            "hit".into(),
            1,
        );
        log.push(BattleEventType::UnitDefeated { unit: b }, "down".into(), 1);
        assert!(log.battle_result().is_none());

        let result = BattleResult {
            battle_name: "Pass".into(),
            outcome: BattleOutcome::Victory,
            end_reason: EndReason::Decided,
            duration: 1.0,
            was_force_ended: false,
            reward: Reward::ZERO,
            stats: BattleStats::default(),
        };
        log.push(
            BattleEventType::BattleEnded {
                result: result.clone(),
            },
            "end".into(),
            1,
        );

        assert_eq!(log.len(), 3);
        assert_eq!(log.damage_events().collect::<Vec<_>>(), vec![(a, b, 4)]);
        assert_eq!(log.battle_result(), Some(&result));
    }
}
