//! Critical-injury detail table (d20)

use crate::config::ConfigError;
use crate::dice::DiceSource;
use crate::types::{Stat, StatLine};
use serde::{Deserialize, Serialize};

/// Mechanical effect of a critical injury
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InjuryEffect {
    /// Killed outright: Morale drops to zero
    Death,
    /// Flat penalty to Speed, Attack and Defense
    AllStatsMalus { amount: i32 },
    /// Penalty to one stat, never below zero
    SingleStatMalus { stat: Stat, amount: i32 },
    /// No lasting mechanical penalty
    NoEffect,
}

impl InjuryEffect {
    /// Apply the effect to a stat line, returning the new line
    pub fn apply(self, stats: StatLine) -> StatLine {
        let mut next = stats;
        match self {
            InjuryEffect::Death => next.morale = 0,
            InjuryEffect::AllStatsMalus { amount } => next.shift_all(-amount),
            InjuryEffect::SingleStatMalus { stat, amount } => {
                let value = next.get_mut(stat);
                *value = (*value - amount).max(0);
            }
            InjuryEffect::NoEffect => {}
        }
        next
    }
}

/// A named entry of the critical table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalInjury {
    pub roll: u32,
    pub name: String,
    pub effect: InjuryEffect,
}

impl CriticalInjury {
    fn new(roll: u32, name: &str, effect: InjuryEffect) -> Self {
        CriticalInjury {
            roll,
            name: name.to_string(),
            effect,
        }
    }
}

/// The fixed 20-entry critical-injury table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriticalInjuryTable {
    pub entries: Vec<CriticalInjury>,
}

impl Default for CriticalInjuryTable {
    fn default() -> Self {
        use InjuryEffect::*;
        let all = |amount| AllStatsMalus { amount };
        let one = |stat, amount| SingleStatMalus { stat, amount };

        CriticalInjuryTable {
            entries: vec![
                CriticalInjury::new(1, "Death", Death),
                CriticalInjury::new(2, "Brain Damage", all(12)),
                CriticalInjury::new(3, "Spine Damage", all(12)),
                CriticalInjury::new(4, "Internal Organ Hit", all(8)),
                CriticalInjury::new(5, "Cracked Skull", all(8)),
                CriticalInjury::new(6, "Punctured Lung", all(8)),
                CriticalInjury::new(7, "Broken Arm", one(Stat::Attack, 8)),
                CriticalInjury::new(8, "Broken Leg", one(Stat::Speed, 8)),
                CriticalInjury::new(9, "Severed Hand", one(Stat::Attack, 10)),
                CriticalInjury::new(10, "Severed Foot", one(Stat::Speed, 10)),
                CriticalInjury::new(11, "Blinded Eye", all(6)),
                CriticalInjury::new(12, "Deafened", all(4)),
                CriticalInjury::new(13, "Pneumothorax", all(8)),
                CriticalInjury::new(14, "Severe Haemorrhage", all(8)),
                CriticalInjury::new(15, "Broken Ribs", all(4)),
                CriticalInjury::new(16, "Concussion", all(4)),
                CriticalInjury::new(17, "Dislocated Shoulder", one(Stat::Attack, 6)),
                CriticalInjury::new(18, "Torn Tendon", all(6)),
                CriticalInjury::new(19, "Deep Laceration", all(4)),
                CriticalInjury::new(20, "Knocked Unconscious", NoEffect),
            ],
        }
    }
}

impl CriticalInjuryTable {
    /// Entry for a d20 roll
    pub fn lookup(&self, roll: u32) -> Option<&CriticalInjury> {
        self.entries.iter().find(|entry| entry.roll == roll)
    }

    /// Roll a d20 and return the matching entry
    pub fn roll_detail(&self, dice: &mut impl DiceSource) -> CriticalInjury {
        let roll = dice.roll_d(20);
        self.lookup(roll).cloned().unwrap_or_else(|| CriticalInjury {
            roll,
            name: "Critical Injury".to_string(),
            effect: InjuryEffect::NoEffect,
        })
    }

    /// Check the table covers exactly 1..=20 with the fixed end entries
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = [false; 20];
        for entry in &self.entries {
            if !(1..=20).contains(&entry.roll) {
                return Err(ConfigError::Invalid(format!(
                    "critical injury roll {} is outside 1-20",
                    entry.roll
                )));
            }
            let slot = &mut seen[(entry.roll - 1) as usize];
            if *slot {
                return Err(ConfigError::Invalid(format!(
                    "critical injury roll {} is listed twice",
                    entry.roll
                )));
            }
            *slot = true;
        }
        if let Some(missing) = seen.iter().position(|covered| !covered) {
            return Err(ConfigError::Invalid(format!(
                "critical injury roll {} is missing",
                missing + 1
            )));
        }
        if self.lookup(1).map(|e| e.effect) != Some(InjuryEffect::Death) {
            return Err(ConfigError::Invalid(
                "critical injury 1 must be Death".to_string(),
            ));
        }
        if self.lookup(20).map(|e| e.effect) != Some(InjuryEffect::NoEffect) {
            return Err(ConfigError::Invalid(
                "critical injury 20 must carry no effect".to_string(),
            ));
        }
        Ok(())
    }
}
