//! Greedy chase movement
//!
//! One cell per tick toward the target with no routing around obstacles.
//! A blocked unit simply waits, possibly forever.

use crate::board::{GridBoard, Position};

/// Next cell on the greedy line from `from` toward `to`
///
/// Steps along the axis with the larger offset; X wins ties.
pub fn greedy_step(from: Position, to: Position) -> Option<Position> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    if dx == 0 && dy == 0 {
        return None;
    }

    if dx.abs() >= dy.abs() {
        Some(from.offset(dx.signum(), 0))
    } else {
        Some(from.offset(0, dy.signum()))
    }
}

/// The greedy step, if the destination is on the board and empty
pub fn chase_step(board: &GridBoard, from: Position, target: Position) -> Option<Position> {
    let next = greedy_step(from, target)?;
    if board.is_valid_position(next) && board.unit_at(next).is_none() {
        Some(next)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Team;
    use crate::core::config::BattleConfig;
    use crate::unit::{share, UnitRecord, UnitStats};

    #[test]
    fn test_step_along_longer_axis() {
        assert_eq!(
            greedy_step(Position::new(3, 1), Position::new(3, 6)),
            Some(Position::new(3, 2))
        );
        assert_eq!(
            greedy_step(Position::new(0, 0), Position::new(5, 2)),
            Some(Position::new(1, 0))
        );
        assert_eq!(
            greedy_step(Position::new(4, 6), Position::new(3, 1)),
            Some(Position::new(4, 5))
        );
    }

    #[test]
    fn test_x_axis_wins_ties() {
        assert_eq!(
            greedy_step(Position::new(2, 2), Position::new(4, 4)),
            Some(Position::new(3, 2))
        );
        assert_eq!(
            greedy_step(Position::new(2, 2), Position::new(0, 0)),
            Some(Position::new(1, 2))
        );
    }

    #[test]
    fn test_no_step_onto_self() {
        assert_eq!(greedy_step(Position::new(1, 1), Position::new(1, 1)), None);
    }

    #[test]
    fn test_blocked_destination_is_skipped() {
        let mut board = GridBoard::new(&BattleConfig::default());
        let blocker = share(UnitRecord::new("Blocker", 10, UnitStats::default()));
        board.place(blocker, Position::new(3, 2), Team::Home).unwrap();

        assert_eq!(
            chase_step(&board, Position::new(3, 1), Position::new(3, 6)),
            None
        );
        assert_eq!(
            chase_step(&board, Position::new(2, 1), Position::new(2, 6)),
            Some(Position::new(2, 2))
        );
    }
}
