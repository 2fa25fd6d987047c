//! Core types shared across the duel engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three combat stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Speed,
    Attack,
    Defense,
}

impl Stat {
    /// All stats in tie-break priority order (Speed > Attack > Defense)
    pub fn all() -> &'static [Stat] {
        &[Stat::Speed, Stat::Attack, Stat::Defense]
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Speed => write!(f, "Speed"),
            Stat::Attack => write!(f, "Attack"),
            Stat::Defense => write!(f, "Defense"),
        }
    }
}

/// Current Speed/Attack/Defense/Morale of a combatant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLine {
    pub speed: i32,
    pub attack: i32,
    pub defense: i32,
    pub morale: i32,
}

impl StatLine {
    /// Read one combat stat
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Speed => self.speed,
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
        }
    }

    /// Mutable access to one combat stat
    pub fn get_mut(&mut self, stat: Stat) -> &mut i32 {
        match stat {
            Stat::Speed => &mut self.speed,
            Stat::Attack => &mut self.attack,
            Stat::Defense => &mut self.defense,
        }
    }

    /// Add the same delta to Speed, Attack and Defense
    pub fn shift_all(&mut self, delta: i32) {
        self.speed += delta;
        self.attack += delta;
        self.defense += delta;
    }

    /// The currently highest combat stat, ties broken Speed > Attack > Defense
    pub fn highest_stat(&self) -> Stat {
        let mut best = Stat::Speed;
        for &stat in &Stat::all()[1..] {
            if self.get(stat) > self.get(best) {
                best = stat;
            }
        }
        best
    }
}

/// Which roster a combatant belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideId {
    A,
    B,
}

impl SideId {
    /// The opposing side
    pub fn opponent(self) -> SideId {
        match self {
            SideId::A => SideId::B,
            SideId::B => SideId::A,
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideId::A => write!(f, "Side A"),
            SideId::B => write!(f, "Side B"),
        }
    }
}

/// Weapon lethality mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponMode {
    /// Live steel: full injury odds including outright death
    Live,
    /// Blunted weapons: softer odds, no death results
    Blunted,
}

impl FromStr for WeaponMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(WeaponMode::Live),
            "blunted" => Ok(WeaponMode::Blunted),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for WeaponMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaponMode::Live => write!(f, "live"),
            WeaponMode::Blunted => write!(f, "blunted"),
        }
    }
}

/// Shape of the duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelType {
    Melee,
    Ranged,
    /// Side A opens with ranged volleys, then both sides close to melee
    Mixed,
}

impl DuelType {
    /// Starting combat context for a side
    pub fn opening_context(self, side: SideId) -> CombatContext {
        match (self, side) {
            (DuelType::Melee, _) => CombatContext::Melee,
            (DuelType::Ranged, _) => CombatContext::Ranged,
            (DuelType::Mixed, SideId::A) => CombatContext::Ranged,
            (DuelType::Mixed, SideId::B) => CombatContext::Melee,
        }
    }
}

impl FromStr for DuelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "melee" => Ok(DuelType::Melee),
            "ranged" => Ok(DuelType::Ranged),
            "mixed" => Ok(DuelType::Mixed),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for DuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuelType::Melee => write!(f, "melee"),
            DuelType::Ranged => write!(f, "ranged"),
            DuelType::Mixed => write!(f, "mixed"),
        }
    }
}

/// Context a combatant is currently fighting in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatContext {
    Melee,
    Ranged,
}

/// Which contexts a perk table entry applies in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextScope {
    Melee,
    Ranged,
    All,
}

impl ContextScope {
    /// Whether an entry with this scope applies in the given context
    pub fn applies_to(self, context: CombatContext) -> bool {
        match self {
            ContextScope::All => true,
            ContextScope::Melee => context == CombatContext::Melee,
            ContextScope::Ranged => context == CombatContext::Ranged,
        }
    }
}
