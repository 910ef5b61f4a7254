//! Grid Battle - Team Auto-Battle Simulation
//!
//! Two teams on a small rectangular board. Players place units in their
//! half; the simulator then runs the fight in fixed-step ticks until one
//! side is wiped out or time runs out.

pub mod battle;
pub mod board;
pub mod core;
pub mod events;
pub mod placement;
pub mod unit;
