//! Battle lifecycle states

use serde::{Deserialize, Serialize};

/// Lifecycle of one battle
///
/// `Idle -> Preparing -> InProgress -> Ending -> Idle`, with
/// `Preparing -> Idle` when setup fails. Idle is both the initial state
/// and where every battle finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattleState {
    #[default]
    Idle,
    Preparing,
    InProgress,
    Ending,
}

impl BattleState {
    /// Whether `self -> next` is an allowed transition
    pub fn can_transition_to(&self, next: BattleState) -> bool {
        use BattleState::*;
        matches!(
            (self, next),
            (Idle, Preparing)
                | (Preparing, InProgress)
                | (Preparing, Idle)
                | (InProgress, Ending)
                | (Ending, Idle)
        )
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, BattleState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        use BattleState::*;
        assert!(Idle.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(InProgress));
        assert!(Preparing.can_transition_to(Idle));
        assert!(InProgress.can_transition_to(Ending));
        assert!(Ending.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Idle));
        assert!(!Ending.can_transition_to(InProgress));
        assert!(!Preparing.can_transition_to(Ending));
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(BattleState::default(), BattleState::Idle);
        assert!(!BattleState::Idle.is_active());
    }
}
