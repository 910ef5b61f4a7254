//! Spatial bookkeeping for the battle grid
//!
//! The board only knows which unit stands where and for which team. It
//! consults the placement policy before every mutation and reports each
//! successful change to subscribers and to its journal.

pub mod events;
pub mod grid;
pub mod position;

pub use events::BoardEvent;
pub use grid::GridBoard;
pub use position::{Position, Team};
