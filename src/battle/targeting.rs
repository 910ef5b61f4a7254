//! Target selection

use crate::board::Position;
use crate::unit::CombatUnit;

/// Nearest living opponent by Manhattan distance
///
/// Returns `(index, distance)`. On equal distance the lowest roster index
/// wins; battle replays depend on this.
pub fn find_nearest_target(from: Position, opponents: &[CombatUnit]) -> Option<(usize, i32)> {
    let mut best: Option<(usize, i32)> = None;

    for (index, candidate) in opponents.iter().enumerate() {
        if !candidate.is_alive() {
            continue;
        }
        let distance = from.manhattan(&candidate.position);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }

    best
}
