//! Ruleset configuration: perk table, items, injury odds and tunable constants

use super::ConfigError;
use crate::injury::{CriticalInjuryTable, InjuryTables};
use crate::perk::{Perk, PerkKind};
use crate::types::{CombatContext, ContextScope, StatLine};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of the perk stat table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerkModifier {
    pub perk: PerkKind,
    pub tier: u8,
    pub context: ContextScope,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
}

/// Flat bonus granted by a named item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemModifier {
    pub name: String,
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
}

/// Age range and the malus applied to every combat stat within it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBand {
    pub from: u32,
    /// Inclusive upper bound; open-ended when absent
    #[serde(default)]
    pub to: Option<u32>,
    pub malus: i32,
}

impl AgeBand {
    fn contains(&self, age: u32) -> bool {
        self.from <= age && self.to.map_or(true, |to| age <= to)
    }
}

/// The complete, swappable rule data for a duel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Morale every combatant starts from before perks
    #[serde(default = "default_base_morale")]
    pub base_morale: i32,
    /// Initiative total a ranged attacker needs to loose a shot
    #[serde(default = "default_ranged_hit_threshold")]
    pub ranged_hit_threshold: i32,
    /// Opening volley rounds in mixed duels
    #[serde(default = "default_volley_rounds")]
    pub volley_rounds: u32,
    /// Attackers a combatant can absorb per round before overflow
    #[serde(default = "default_base_capacity")]
    pub base_capacity: u32,
    /// Flat malus on a critical success against the defender's best stat
    #[serde(default = "default_crit_malus")]
    pub crit_malus: i32,
    #[serde(default = "default_heroic_stand_bonus")]
    pub heroic_stand_bonus: i32,
    /// Enemies per ally needed to trigger Heroic Stand
    #[serde(default = "default_heroic_stand_ratio")]
    pub heroic_stand_ratio: u32,
    #[serde(default = "default_age_bands")]
    pub age_bands: Vec<AgeBand>,
    #[serde(default = "default_perk_modifiers")]
    pub perks: Vec<PerkModifier>,
    #[serde(default = "default_item_modifiers")]
    pub items: Vec<ItemModifier>,
    #[serde(default)]
    pub injuries: InjuryTables,
    #[serde(default)]
    pub critical_injuries: CriticalInjuryTable,
}

fn default_base_morale() -> i32 {
    50
}
fn default_ranged_hit_threshold() -> i32 {
    30
}
fn default_volley_rounds() -> u32 {
    2
}
fn default_base_capacity() -> u32 {
    3
}
fn default_crit_malus() -> i32 {
    2
}
fn default_heroic_stand_bonus() -> i32 {
    3
}
fn default_heroic_stand_ratio() -> u32 {
    4
}

fn default_age_bands() -> Vec<AgeBand> {
    let band = |from, to, malus| AgeBand { from, to, malus };
    vec![
        band(0, Some(11), 10),
        band(12, Some(12), 8),
        band(13, Some(13), 6),
        band(14, Some(14), 4),
        band(15, Some(15), 2),
        band(16, Some(50), 0),
        band(51, Some(60), 2),
        band(61, Some(70), 4),
        band(71, Some(80), 6),
        band(81, Some(90), 8),
        band(91, None, 10),
    ]
}

fn default_perk_modifiers() -> Vec<PerkModifier> {
    use ContextScope::{All, Melee, Ranged};
    use PerkKind::*;

    // (perk, context, [T1, T2, T3] as speed/attack/defense)
    let table: &[(PerkKind, ContextScope, &[(i32, i32, i32)])] = &[
        (BladeSpecialist, Melee, &[(1, 1, 0), (2, 1, 1), (2, 2, 2)]),
        (AxeAndBluntSpecialist, Melee, &[(1, 1, 0), (2, 2, 0), (2, 3, 1)]),
        (SpearSpecialist, Melee, &[(1, 0, 1), (2, 1, 1), (3, 1, 2)]),
        (Duelist, Melee, &[(2, 0, 0), (4, 0, 0), (5, 0, 0)]),
        (ShieldSpecialist, Melee, &[(0, 0, 2), (0, 0, 4), (0, 0, 6)]),
        (ShieldSpecialist, Ranged, &[(0, 0, 1), (0, 0, 2), (0, 0, 3)]),
        (SteelTempest, Melee, &[(0, 1, 1), (0, 2, 2), (0, 3, 3)]),
        (SwornSword, Melee, &[(1, 0, 1), (2, 0, 2), (3, 0, 3)]),
        (Bloodlust, Melee, &[(0, 0, 2)]),
        (Berserker, Melee, &[(0, 2, 0), (0, 2, 0)]),
        (BowSpecialist, Ranged, &[(2, 1, 0), (3, 2, 0), (4, 3, 0)]),
        (CrossbowSpecialist, Ranged, &[(1, 2, 0), (2, 4, 0), (3, 6, 0)]),
        (Marksman, Ranged, &[(2, 0, 0), (4, 0, 0), (6, 1, 0)]),
        (ThrownProjectileSpecialist, All, &[(1, 0, 0), (2, 0, 0), (3, 1, 0)]),
        (BattlefieldChampion, All, &[(1, 1, 0), (2, 2, 0), (3, 3, 0)]),
        (FavoredByFortune, All, &[(1, 0, 0), (0, 0, 2)]),
    ];

    table
        .iter()
        .flat_map(|&(perk, context, tiers)| {
            tiers
                .iter()
                .zip(1u8..)
                .map(move |(&(speed, attack, defense), tier)| PerkModifier {
                    perk,
                    tier,
                    context,
                    speed,
                    attack,
                    defense,
                })
        })
        .collect()
}

fn default_item_modifiers() -> Vec<ItemModifier> {
    let item = |name: &str, attack, defense| ItemModifier {
        name: name.to_string(),
        attack,
        defense,
    };
    vec![
        item("Shield", 0, 2),
        item("Gambeson", 0, 1),
        item("Mail Hauberk", 0, 2),
        item("Plate Armour", 0, 3),
        item("Steel Helm", 0, 1),
        item("Longsword", 1, 0),
        item("Bastard Sword", 1, 0),
        item("Greatsword", 2, 0),
        item("Warhammer", 2, 0),
        item("Poleaxe", 2, 0),
        item("Longbow", 1, 0),
        item("Crossbow", 2, 0),
    ]
}

impl Default for Ruleset {
    fn default() -> Self {
        Ruleset {
            base_morale: default_base_morale(),
            ranged_hit_threshold: default_ranged_hit_threshold(),
            volley_rounds: default_volley_rounds(),
            base_capacity: default_base_capacity(),
            crit_malus: default_crit_malus(),
            heroic_stand_bonus: default_heroic_stand_bonus(),
            heroic_stand_ratio: default_heroic_stand_ratio(),
            age_bands: default_age_bands(),
            perks: default_perk_modifiers(),
            items: default_item_modifiers(),
            injuries: InjuryTables::default(),
            critical_injuries: CriticalInjuryTable::default(),
        }
    }
}

impl Ruleset {
    /// Raw age malus from the band table (before any perk reduction)
    pub fn age_malus(&self, age: u32) -> i32 {
        self.age_bands
            .iter()
            .find(|band| band.contains(age))
            .map(|band| band.malus)
            .unwrap_or(0)
    }

    /// Summed Speed/Attack/Defense delta of one perk in a context
    pub fn perk_delta(&self, perk: Perk, context: CombatContext) -> StatLine {
        self.perks
            .iter()
            .filter(|m| m.perk == perk.kind && m.tier == perk.tier && m.context.applies_to(context))
            .fold(StatLine::default(), |mut acc, m| {
                acc.speed += m.speed;
                acc.attack += m.attack;
                acc.defense += m.defense;
                acc
            })
    }

    /// Look up an item by name, ignoring case
    pub fn item(&self, name: &str) -> Option<&ItemModifier> {
        let name = name.trim();
        self.items.iter().find(|item| item.name.eq_ignore_ascii_case(name))
    }

    /// Check every table and constant for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("base_morale", self.base_morale),
            ("ranged_hit_threshold", self.ranged_hit_threshold),
            ("heroic_stand_bonus", self.heroic_stand_bonus),
            ("crit_malus", self.crit_malus),
        ];
        for (name, value) in positive {
            if value <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive (got {value})"
                )));
            }
        }
        for (name, value) in [
            ("volley_rounds", self.volley_rounds),
            ("base_capacity", self.base_capacity),
            ("heroic_stand_ratio", self.heroic_stand_ratio),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be at least 1"
                )));
            }
        }

        self.validate_age_bands()?;

        for (i, modifier) in self.perks.iter().enumerate() {
            if !(1..=3).contains(&modifier.tier) {
                return Err(ConfigError::Invalid(format!(
                    "perk entry {i} ({}) has tier {} outside 1-3",
                    modifier.perk, modifier.tier
                )));
            }
            let duplicate = self.perks[..i].iter().any(|other| {
                other.perk == modifier.perk
                    && other.tier == modifier.tier
                    && other.context == modifier.context
            });
            if duplicate {
                return Err(ConfigError::Invalid(format!(
                    "perk {} T{} is listed twice for the same context",
                    modifier.perk, modifier.tier
                )));
            }
        }

        for (i, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "item entry {i} has an empty name"
                )));
            }
        }

        self.injuries.validate()?;
        self.critical_injuries.validate()
    }

    fn validate_age_bands(&self) -> Result<(), ConfigError> {
        let mut expected = Some(0u32);
        for band in &self.age_bands {
            let Some(start) = expected else {
                return Err(ConfigError::Invalid(
                    "age band listed after an open-ended band".to_string(),
                ));
            };
            if band.from != start {
                return Err(ConfigError::Invalid(format!(
                    "age band should start at {start} (starts at {})",
                    band.from
                )));
            }
            if band.malus < 0 {
                return Err(ConfigError::Invalid(format!(
                    "age band from {} has a negative malus",
                    band.from
                )));
            }
            expected = match band.to {
                Some(to) if to < band.from => {
                    return Err(ConfigError::Invalid(format!(
                        "age band {}-{to} is inverted",
                        band.from
                    )))
                }
                Some(to) => Some(to + 1),
                None => None,
            };
        }
        if expected.is_some() {
            return Err(ConfigError::Invalid(
                "the last age band must be open-ended".to_string(),
            ));
        }
        Ok(())
    }
}

/// The canonical built-in ruleset
pub fn default_ruleset() -> Ruleset {
    Ruleset::default()
}

/// Load and validate a ruleset from a TOML or JSON file
pub fn load_ruleset(path: &Path) -> Result<Ruleset, ConfigError> {
    let ruleset: Ruleset = super::load_document(path)?;
    ruleset.validate()?;
    Ok(ruleset)
}

/// Parse and validate a ruleset from a TOML string
pub fn parse_ruleset(content: &str) -> Result<Ruleset, ConfigError> {
    let ruleset: Ruleset = super::parse_document(content, super::Format::Toml)?;
    ruleset.validate()?;
    Ok(ruleset)
}
