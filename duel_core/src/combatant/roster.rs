//! Roster records as read from TOML or JSON files

use super::{Combatant, DEFAULT_AGE, DEFAULT_INJURY_THRESHOLD, DEFAULT_MORALE_THRESHOLD};
use crate::config::{load_document, parse_document, ConfigError, Format, Ruleset};
use crate::perk::Perk;
use crate::types::StatLine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// One combatant as written in a roster file
///
/// Missing fields fall back to defaults. A non-integer `age` is a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_age")]
    pub age: u32,
    #[serde(default)]
    pub perks: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    /// Up to three pre-existing maluses: Speed, Attack, Defense
    #[serde(default)]
    pub injuries: Vec<i32>,
    #[serde(default = "default_injury_threshold")]
    pub injury_threshold: i64,
    #[serde(default = "default_morale_threshold")]
    pub morale_threshold: i64,
}

fn default_name() -> String {
    "Unnamed".to_string()
}
fn default_age() -> u32 {
    DEFAULT_AGE
}
fn default_injury_threshold() -> i64 {
    DEFAULT_INJURY_THRESHOLD as i64
}
fn default_morale_threshold() -> i64 {
    DEFAULT_MORALE_THRESHOLD as i64
}

impl RosterRecord {
    pub fn new(name: impl Into<String>) -> Self {
        RosterRecord {
            name: name.into(),
            age: DEFAULT_AGE,
            perks: Vec::new(),
            items: Vec::new(),
            injuries: Vec::new(),
            injury_threshold: default_injury_threshold(),
            morale_threshold: default_morale_threshold(),
        }
    }

    /// Build a combatant, skipping perks and items the ruleset does not know
    pub fn to_combatant(&self, ruleset: &Ruleset) -> Combatant {
        let mut combatant = Combatant::new(self.name.clone(), self.age);

        for raw in &self.perks {
            match raw.parse::<Perk>() {
                Ok(perk) => combatant.perks.insert(perk),
                Err(err) => warn!(combatant = %self.name, "ignoring {err}"),
            }
        }

        for item in &self.items {
            if ruleset.item(item).is_some() {
                combatant.items.push(item.trim().to_string());
            } else {
                warn!(combatant = %self.name, item = %item, "ignoring unknown item");
            }
        }

        if self.injuries.len() > 3 {
            warn!(
                combatant = %self.name,
                count = self.injuries.len(),
                "only the first three injury maluses are used"
            );
        }
        let malus = |i: usize| self.injuries.get(i).copied().unwrap_or(0).max(0);
        combatant.injury_malus = StatLine {
            speed: malus(0),
            attack: malus(1),
            defense: malus(2),
            morale: 0,
        };

        combatant.injury_threshold = match u32::try_from(self.injury_threshold) {
            Ok(value) if value > 0 => value,
            _ => {
                warn!(combatant = %self.name, value = self.injury_threshold, "invalid injury_threshold, using default");
                DEFAULT_INJURY_THRESHOLD
            }
        };
        combatant.morale_threshold = match i32::try_from(self.morale_threshold) {
            Ok(value) if value >= 0 => value,
            _ => {
                warn!(combatant = %self.name, value = self.morale_threshold, "invalid morale_threshold, using default");
                DEFAULT_MORALE_THRESHOLD
            }
        };

        combatant
    }
}

/// A roster file: `[[combatant]]` tables in TOML, or `{"combatant": [...]}` in JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(rename = "combatant", alias = "combatants", default)]
    pub combatants: Vec<RosterRecord>,
}

impl Roster {
    pub fn new(combatants: Vec<RosterRecord>) -> Self {
        Roster { combatants }
    }

    /// Load a roster file, choosing TOML or JSON by extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_document(path)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        parse_document(content, Format::Toml)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        parse_document(content, Format::Json)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }
}
