//! duel_core - Round resolution engine for tabletop duels
//!
//! This library provides:
//! - Dice Engine: injectable, seedable dice (`DiceSource`)
//! - Injury Tables: severity odds per weapon mode and the critical-injury table
//! - Stat Resolver: working stats from age, perks, items and old injuries
//! - Engagement Resolver: initiative, pairing, attacks and their consequences
//! - Round Orchestrator: the duel state machine and its report

pub mod combatant;
pub mod config;
pub mod dice;
pub mod duel;
pub mod engagement;
pub mod injury;
pub mod perk;
pub mod prelude;
pub mod stats;
pub mod types;

// Re-export core types for convenience
pub use combatant::{Actor, Combatant, CombatantId, DefeatCause, Roster, RosterRecord, Side};
pub use config::{default_ruleset, load_ruleset, parse_ruleset, ConfigError, Ruleset};
pub use dice::{DiceRoll, DiceSource, RngDice, ScriptedDice};
pub use duel::{
    run_duel, Duel, DuelConfig, DuelError, DuelEvent, DuelOutcome, DuelPhase, DuelReport,
};
pub use engagement::{Battlefield, Pairing, Resolver, TieRule};
pub use injury::{CriticalInjury, CriticalInjuryTable, InjuryEffect, InjuryTables, Severity};
pub use perk::{Perk, PerkKind, PerkSet};
pub use stats::WorkingStats;
pub use types::{CombatContext, DuelType, SideId, Stat, StatLine, WeaponMode};
