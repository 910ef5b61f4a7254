//! Units: persistent characters and their per-battle wrappers

pub mod combat_unit;
pub mod persistent;

pub use combat_unit::{CombatUnit, SkillId};
pub use persistent::{share, PersistentUnit, SharedUnit, StatKind, UnitRecord, UnitStats};
