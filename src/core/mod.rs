pub mod config;
pub mod error;
pub mod types;

pub use config::{BattleConfig, BoardConfig, OutcomeReward, RewardTable};
pub use error::{ActionError, ConfigError, PlacementError, SetupError, StartError};
pub use types::{Seconds, Tick, UnitId};
