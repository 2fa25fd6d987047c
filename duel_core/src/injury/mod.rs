//! Injury Tables - percentile severity lookups and the critical-injury table
//!
//! Severity class and specific flavor are kept apart: the d100 tables only
//! decide Minor/Major/Critical/Death, and a Critical result is detailed by a
//! separate d20 roll on [`CriticalInjuryTable`].

mod critical;

pub use critical::{CriticalInjury, CriticalInjuryTable, InjuryEffect};

use crate::config::ConfigError;
use crate::dice::DiceSource;
use crate::types::WeaponMode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Injury severity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
    Death,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Minor => write!(f, "Minor Injury"),
            Severity::Major => write!(f, "Major Injury"),
            Severity::Critical => write!(f, "Critical Injury"),
            Severity::Death => write!(f, "Death"),
        }
    }
}

/// One inclusive band of a percentile table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryBand {
    pub low: u32,
    pub high: u32,
    pub severity: Severity,
}

impl InjuryBand {
    pub const fn new(low: u32, high: u32, severity: Severity) -> Self {
        InjuryBand { low, high, severity }
    }

    pub fn contains(&self, roll: u32) -> bool {
        self.low <= roll && roll <= self.high
    }
}

/// A d100 severity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InjuryTable {
    pub bands: Vec<InjuryBand>,
}

impl InjuryTable {
    pub fn new(bands: Vec<InjuryBand>) -> Self {
        InjuryTable { bands }
    }

    /// Map a 1-100 roll to a severity
    ///
    /// Validated tables cover every roll; anything outside falls back to Minor.
    pub fn lookup(&self, roll: u32) -> Severity {
        self.bands
            .iter()
            .find(|band| band.contains(roll))
            .map(|band| band.severity)
            .unwrap_or(Severity::Minor)
    }

    /// Check that the bands partition [1, 100] with no gaps or overlaps
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let mut bands = self.bands.clone();
        bands.sort_by_key(|band| band.low);

        let mut expected = 1;
        for band in &bands {
            if band.low > band.high {
                return Err(ConfigError::Invalid(format!(
                    "{name}: band {}-{} is inverted",
                    band.low, band.high
                )));
            }
            if band.low < expected {
                return Err(ConfigError::Invalid(format!(
                    "{name}: band {}-{} overlaps the previous band",
                    band.low, band.high
                )));
            }
            if band.low > expected {
                return Err(ConfigError::Invalid(format!(
                    "{name}: rolls {}-{} are not covered",
                    expected,
                    band.low - 1
                )));
            }
            expected = band.high + 1;
        }

        if expected != 101 {
            return Err(ConfigError::Invalid(format!(
                "{name}: table must end at 100 (ends at {})",
                expected - 1
            )));
        }
        Ok(())
    }
}

/// A pair of tables, one per weapon mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeTables {
    pub live: InjuryTable,
    pub blunted: InjuryTable,
}

impl ModeTables {
    pub fn for_mode(&self, mode: WeaponMode) -> &InjuryTable {
        match mode {
            WeaponMode::Live => &self.live,
            WeaponMode::Blunted => &self.blunted,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        self.live.validate(&format!("{name}.live"))?;
        self.blunted.validate(&format!("{name}.blunted"))?;
        if self.blunted.bands.iter().any(|b| b.severity == Severity::Death) {
            return Err(ConfigError::Invalid(format!(
                "{name}.blunted: blunted weapons cannot produce Death"
            )));
        }
        Ok(())
    }
}

/// Primary and secondary injury odds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryTables {
    /// Rolled when a combatant's Morale is reduced to zero or below
    pub primary: ModeTables,
    /// Rolled on critical successes and failures
    pub secondary: ModeTables,
}

impl Default for InjuryTables {
    fn default() -> Self {
        use Severity::*;
        InjuryTables {
            primary: ModeTables {
                live: InjuryTable::new(vec![
                    InjuryBand::new(1, 5, Death),
                    InjuryBand::new(6, 20, Critical),
                    InjuryBand::new(21, 50, Major),
                    InjuryBand::new(51, 100, Minor),
                ]),
                blunted: InjuryTable::new(vec![
                    InjuryBand::new(1, 10, Major),
                    InjuryBand::new(11, 100, Minor),
                ]),
            },
            secondary: ModeTables {
                live: InjuryTable::new(vec![
                    InjuryBand::new(1, 2, Critical),
                    InjuryBand::new(3, 40, Major),
                    InjuryBand::new(41, 100, Minor),
                ]),
                blunted: InjuryTable::new(vec![
                    InjuryBand::new(1, 20, Major),
                    InjuryBand::new(21, 100, Minor),
                ]),
            },
        }
    }
}

impl InjuryTables {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.primary.validate("primary")?;
        self.secondary.validate("secondary")
    }

    /// Roll a primary injury severity
    pub fn primary_injury(&self, mode: WeaponMode, dice: &mut impl DiceSource) -> InjuryRoll {
        let roll = dice.roll_d(100);
        InjuryRoll {
            roll,
            severity: self.primary.for_mode(mode).lookup(roll),
        }
    }

    /// Roll a secondary injury severity
    pub fn secondary_injury(&self, mode: WeaponMode, dice: &mut impl DiceSource) -> InjuryRoll {
        let roll = dice.roll_d(100);
        InjuryRoll {
            roll,
            severity: self.secondary.for_mode(mode).lookup(roll),
        }
    }
}

/// A percentile roll and the severity it mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryRoll {
    pub roll: u32,
    pub severity: Severity,
}
