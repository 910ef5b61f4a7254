//! Persistent units: the long-lived characters a battle borrows
//!
//! The battle core only consumes the [`PersistentUnit`] trait. [`UnitRecord`]
//! is a plain implementation used by the runner and by tests.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::UnitId;

/// Stats the battle loop reads from a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Attack,
    Defense,
    /// Attacks per second
    AttackSpeed,
    /// Manhattan distance in cells
    AttackRange,
}

/// A unit that outlives a single battle
pub trait PersistentUnit {
    fn id(&self) -> UnitId;
    fn name(&self) -> &str;

    fn hp(&self) -> i32;
    fn max_hp(&self) -> i32;
    fn mp(&self) -> i32;

    fn stat(&self, kind: StatKind) -> f32;

    /// Apply damage, returning the amount actually absorbed
    fn take_damage(&mut self, amount: i32) -> i32;

    fn add_experience(&mut self, amount: u32);

    fn is_alive(&self) -> bool {
        self.hp() > 0
    }
}

/// Shared handle to a persistent unit
///
/// The battle model is single-threaded, so `Rc<RefCell<_>>` is enough.
/// A multi-threaded host must serialize every entry point before calling in.
pub type SharedUnit = Rc<RefCell<dyn PersistentUnit>>;

/// Wrap any unit in a shared handle
pub fn share<U: PersistentUnit + 'static>(unit: U) -> SharedUnit {
    Rc::new(RefCell::new(unit))
}

/// Base stat block for a [`UnitRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    pub attack: f32,
    pub defense: f32,
    pub attack_speed: f32,
    pub attack_range: f32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            attack: 5.0,
            defense: 2.0,
            attack_speed: 1.0,
            attack_range: 1.0,
        }
    }
}

/// Experience needed per level step
const EXPERIENCE_PER_LEVEL: u32 = 100;

/// Straightforward persistent unit with HP/MP, stats and experience
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRecord {
    #[serde(default)]
    pub id: UnitId,
    pub name: String,
    pub max_hp: i32,
    #[serde(default)]
    pub hp: i32,
    #[serde(default)]
    pub max_mp: i32,
    #[serde(default)]
    pub mp: i32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub stats: UnitStats,
    /// Flat per-stat bonuses from equipment and the like
    #[serde(default)]
    pub bonuses: AHashMap<StatKind, f32>,
}

fn default_level() -> u32 {
    1
}

impl UnitRecord {
    pub fn new(name: impl Into<String>, max_hp: i32, stats: UnitStats) -> Self {
        Self {
            id: UnitId::new(),
            name: name.into(),
            max_hp,
            hp: max_hp,
            max_mp: 0,
            mp: 0,
            level: 1,
            experience: 0,
            stats,
            bonuses: AHashMap::new(),
        }
    }

    pub fn with_bonus(mut self, kind: StatKind, amount: f32) -> Self {
        *self.bonuses.entry(kind).or_insert(0.0) += amount;
        self
    }

    /// Records loaded from files may omit `hp`; treat that as full health
    pub fn normalized(mut self) -> Self {
        if self.hp <= 0 && self.max_hp > 0 {
            self.hp = self.max_hp;
        }
        if self.mp <= 0 {
            self.mp = self.max_mp;
        }
        self
    }

    fn base_stat(&self, kind: StatKind) -> f32 {
        match kind {
            StatKind::Attack => self.stats.attack,
            StatKind::Defense => self.stats.defense,
            StatKind::AttackSpeed => self.stats.attack_speed,
            StatKind::AttackRange => self.stats.attack_range,
        }
    }
}

impl PersistentUnit for UnitRecord {
    fn id(&self) -> UnitId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hp(&self) -> i32 {
        self.hp
    }

    fn max_hp(&self) -> i32 {
        self.max_hp
    }

    fn mp(&self) -> i32 {
        self.mp
    }

    fn stat(&self, kind: StatKind) -> f32 {
        self.base_stat(kind) + self.bonuses.get(&kind).copied().unwrap_or(0.0)
    }

    fn take_damage(&mut self, amount: i32) -> i32 {
        if amount <= 0 || self.hp <= 0 {
            return 0;
        }
        let applied = amount.min(self.hp);
        self.hp -= applied;
        applied
    }

    fn add_experience(&mut self, amount: u32) {
        self.experience = self.experience.saturating_add(amount);
        while self.experience >= self.level * EXPERIENCE_PER_LEVEL {
            self.experience -= self.level * EXPERIENCE_PER_LEVEL;
            self.level += 1;
        }
    }
}
