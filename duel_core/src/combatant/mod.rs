//! Combatants, their transient state, and the two sides of a duel

mod roster;

pub use roster::{Roster, RosterRecord};

use crate::perk::{Perk, PerkKind, PerkSet};
use crate::types::{CombatContext, SideId, StatLine};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a combatant left the fight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum DefeatCause {
    /// Morale fell to or below the yield threshold
    Yielded,
    /// Morale fell to zero or below
    Incapacitated,
    /// Too many injuries to keep fighting
    Overwhelmed,
    /// Carried off by a critical injury
    CriticalInjury { injury: String },
    Killed,
    /// A rampage ran its course
    Collapsed,
}

impl fmt::Display for DefeatCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefeatCause::Yielded => write!(f, "yields"),
            DefeatCause::Incapacitated => write!(f, "is incapacitated"),
            DefeatCause::Overwhelmed => write!(f, "withdraws with too many injuries"),
            DefeatCause::CriticalInjury { injury } => {
                write!(f, "is carried off with a critical injury ({injury})")
            }
            DefeatCause::Killed => write!(f, "is killed"),
            DefeatCause::Collapsed => write!(f, "collapses after the rampage"),
        }
    }
}

/// State reset at the end of every round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub engaged: bool,
    pub critical_success: bool,
    pub critical_failure: bool,
    /// Attacks absorbed this round
    pub combatants_faced: u32,
    pub initiative: Option<i32>,
    pub shield_reroll_used: bool,
    /// A rampage began this round and is not counted down until the next
    pub rampage_started: bool,
}

/// State that lives for one duel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelState {
    pub lucky_reroll_used: bool,
    pub fortune_reroll_used: bool,
    pub berserk_triggered: bool,
    pub bloodlust_triggered: bool,
    pub terrifying_presence_applied: bool,
    pub heroic_stand_active: bool,
    pub major_injuries_taken: u32,
    pub immunity_remaining: u32,
    /// Attackers this combatant can absorb per round
    pub max_attackers: u32,
    pub rampage_rounds_remaining: u32,
    /// Added to the yield threshold by an opponent's presence
    pub yield_threshold_bonus: i32,
}

/// A duel participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub side: SideId,
    pub age: u32,
    pub perks: PerkSet,
    pub items: Vec<String>,
    pub injury_threshold: u32,
    pub morale_threshold: i32,
    /// Pre-existing Speed/Attack/Defense maluses
    pub injury_malus: StatLine,

    pub stats: StatLine,
    pub context: CombatContext,
    pub injuries_taken: u32,
    pub round: RoundState,
    pub duel: DuelState,
    pub defeat: Option<DefeatCause>,
}

pub const DEFAULT_INJURY_THRESHOLD: u32 = 4;
pub const DEFAULT_MORALE_THRESHOLD: i32 = 15;
pub const DEFAULT_AGE: u32 = 18;

impl Combatant {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Combatant {
            name: name.into(),
            side: SideId::A,
            age,
            perks: PerkSet::new(),
            items: Vec::new(),
            injury_threshold: DEFAULT_INJURY_THRESHOLD,
            morale_threshold: DEFAULT_MORALE_THRESHOLD,
            injury_malus: StatLine::default(),
            stats: StatLine::default(),
            context: CombatContext::Melee,
            injuries_taken: 0,
            round: RoundState::default(),
            duel: DuelState::default(),
            defeat: None,
        }
    }

    pub fn with_perk(mut self, kind: PerkKind, tier: u8) -> Self {
        self.perks.insert(Perk::new(kind, tier));
        self
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn with_thresholds(mut self, injury_threshold: u32, morale_threshold: i32) -> Self {
        self.injury_threshold = injury_threshold;
        self.morale_threshold = morale_threshold;
        self
    }

    /// Pre-existing maluses to Speed, Attack and Defense
    pub fn with_injury_malus(mut self, speed: i32, attack: i32, defense: i32) -> Self {
        self.injury_malus = StatLine {
            speed,
            attack,
            defense,
            morale: 0,
        };
        self
    }

    /// Name and side, for the duel log
    pub fn actor(&self) -> Actor {
        Actor {
            side: self.side,
            name: self.name.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.defeat.is_none()
    }

    pub fn is_raging(&self) -> bool {
        self.duel.rampage_rounds_remaining > 0
    }

    /// Morale at or below which this combatant yields
    pub fn yield_threshold(&self) -> i32 {
        self.morale_threshold + self.duel.yield_threshold_bonus
    }

    /// Per-round attacker cap, after presence restrictions
    pub fn attacker_capacity(&self) -> u32 {
        if self.perks.has_tier(PerkKind::TerrifyingPresence, 2) {
            1
        } else {
            self.duel.max_attackers
        }
    }

    /// Whether the combatant may take another attack this round
    pub fn can_be_engaged(&self) -> bool {
        self.is_active() && self.round.combatants_faced < self.attacker_capacity()
    }

    /// Immune to free attacks (Terrifying Presence T2+)
    pub fn shielded_from_free_attacks(&self) -> bool {
        self.perks.has_tier(PerkKind::TerrifyingPresence, 2)
    }

    /// Remove from play; the first cause sticks
    pub fn defeat(&mut self, cause: DefeatCause) {
        if self.defeat.is_none() {
            self.defeat = Some(cause);
        }
    }

    pub fn reset_round(&mut self) {
        self.round = RoundState::default();
    }
}

/// A combatant as named in the duel log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub side: SideId,
    pub name: String,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.side)
    }
}

/// Reference to one combatant: which side, and its index within that side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombatantId {
    pub side: SideId,
    pub index: usize,
}

/// One roster of combatants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    pub members: Vec<Combatant>,
}

impl Side {
    pub fn new(members: Vec<Combatant>) -> Self {
        Side { members }
    }

    /// Tag every member with the side it fights for
    pub fn assign(&mut self, side: SideId) {
        for member in &mut self.members {
            member.side = side;
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.members.iter().filter(|c| c.is_active()).count()
    }

    /// Indices of combatants still fighting
    pub fn active_indices(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// Sum of attacker capacities over active members
    pub fn total_capacity(&self) -> u32 {
        self.members
            .iter()
            .filter(|c| c.is_active())
            .map(|c| c.attacker_capacity())
            .sum()
    }

    /// Drop defeated combatants, returning them in roster order
    pub fn remove_defeated(&mut self) -> Vec<Combatant> {
        let (active, defeated): (Vec<_>, Vec<_>) =
            self.members.drain(..).partition(|c| c.is_active());
        self.members = active;
        defeated
    }
}

impl FromIterator<Combatant> for Side {
    fn from_iter<I: IntoIterator<Item = Combatant>>(iter: I) -> Self {
        Side::new(iter.into_iter().collect())
    }
}
