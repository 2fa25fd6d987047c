//! Prelude module for convenient imports
//!
//! ```rust
//! use duel_core::prelude::*;
//! ```

// Core types
pub use crate::combatant::{Combatant, DefeatCause, RosterRecord, Side};
pub use crate::types::{CombatContext, DuelType, SideId, Stat, StatLine, WeaponMode};
pub use crate::perk::{Perk, PerkKind};

// Dice
pub use crate::dice::{DiceSource, RngDice, ScriptedDice};

// Duel
pub use crate::duel::{
    run_duel, Duel, DuelConfig, DuelError, DuelEvent, DuelOutcome, DuelPhase, DuelReport,
};
pub use crate::engagement::TieRule;

// Config
pub use crate::config::{default_ruleset, Ruleset};
