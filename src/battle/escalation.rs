//! Damage escalation: long battles get deadlier over time
//!
//! Driven by the battle clock, not the tick count. The level only ever
//! goes up while a battle runs.

use crate::battle::setup::EscalationSettings;
use crate::core::types::Seconds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escalation {
    settings: EscalationSettings,
    level: u32,
}

impl Escalation {
    pub fn new(settings: EscalationSettings) -> Self {
        Self { settings, level: 0 }
    }

    /// Disabled schedule; the multiplier stays at 1
    pub fn disabled() -> Self {
        Self::new(EscalationSettings::default())
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Damage multiplier for the current level
    pub fn multiplier(&self) -> f32 {
        1.0 + self.level as f32 * self.settings.percent_per_level / 100.0
    }

    /// Bring the level up to date with the battle clock
    ///
    /// Returns the new level when it changed.
    pub fn update(&mut self, elapsed: Seconds) -> Option<u32> {
        let s = &self.settings;
        if !s.enabled || s.interval <= 0.0 || elapsed < s.start_time {
            return None;
        }

        let target = ((elapsed - s.start_time) / s.interval).floor() as u32;
        if target > self.level {
            self.level = target;
            Some(self.level)
        } else {
            None
        }
    }
}
