//! Duel events, outcome and the final report

use crate::combatant::{Actor, DefeatCause};
use crate::injury::Severity;
use crate::types::{CombatContext, DuelType, SideId, Stat, WeaponMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural critical on an initiative roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Critical {
    Success,
    Failure,
}

/// Phase a round belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    RangedVolley,
    Engagement,
}

/// How an attack was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    Strike,
    Free,
    Volley,
    ThrownCounter,
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackKind::Strike => write!(f, "strikes"),
            AttackKind::Free => write!(f, "lands a free attack on"),
            AttackKind::Volley => write!(f, "looses a volley at"),
            AttackKind::ThrownCounter => write!(f, "hurls a weapon at"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalemateReason {
    /// No combatant outranked any opponent on initiative
    InitiativeTie,
    /// A fortune perk forced the round to be re-rolled
    FortuneReroll,
}

/// What an injury did to its victim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InjuryOutcome {
    StatMalus { stat: Stat, amount: i32 },
    AllStatsMalus { amount: i32 },
    Immune { remaining: u32 },
    Bloodlust,
    ShruggedOff,
    Critical { injury: String },
    Death,
    /// Rolled for the record after the combatant already fell
    Recorded,
}

impl fmt::Display for InjuryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjuryOutcome::StatMalus { stat, amount } => write!(f, "-{amount} {stat}"),
            InjuryOutcome::AllStatsMalus { amount } => write!(f, "-{amount} to all stats"),
            InjuryOutcome::Immune { remaining } => {
                write!(f, "ignored by Indomitable ({remaining} left)")
            }
            InjuryOutcome::Bloodlust => write!(f, "Bloodlust surges: +2 Speed, +2 Attack"),
            InjuryOutcome::ShruggedOff => write!(f, "shrugged off with grace"),
            InjuryOutcome::Critical { injury } => write!(f, "{injury}"),
            InjuryOutcome::Death => write!(f, "fatal"),
            InjuryOutcome::Recorded => write!(f, "on the record"),
        }
    }
}

/// One thing that happened during a duel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DuelEvent {
    DuelStarted {
        weapon_mode: WeaponMode,
        duel_type: DuelType,
        side_a: usize,
        side_b: usize,
    },
    RoundStarted {
        round: u32,
        phase: Phase,
    },
    Initiative {
        who: Actor,
        total: i32,
        faces: Vec<u32>,
        critical: Option<Critical>,
        rerolled: bool,
    },
    FortuneReroll {
        who: Actor,
    },
    Stalemate {
        round: u32,
        reason: StalemateReason,
    },
    NoTarget {
        who: Actor,
    },
    Missed {
        kind: AttackKind,
        who: Actor,
        total: i32,
    },
    Attack {
        kind: AttackKind,
        attacker: Actor,
        defender: Actor,
        dice: Vec<u32>,
        damage: i32,
        doubled: bool,
        morale: i32,
    },
    CriticalSuccess {
        attacker: Actor,
        defender: Actor,
        stat: Stat,
        malus: i32,
    },
    CriticalFailure {
        who: Actor,
        stat: Stat,
        malus: i32,
    },
    ShieldReroll {
        who: Actor,
        discarded: Severity,
    },
    Injury {
        who: Actor,
        severity: Severity,
        roll: u32,
        outcome: InjuryOutcome,
    },
    SecondWind {
        who: Actor,
        morale: i32,
    },
    Rampage {
        who: Actor,
        rounds: u32,
    },
    Defeated {
        who: Actor,
        cause: DefeatCause,
    },
    HeroicStand {
        who: Actor,
        active: bool,
    },
    TerrifyingPresence {
        who: Actor,
        bonus: i32,
    },
    ContextSwitch {
        who: Actor,
        context: CombatContext,
    },
    DuelEnded {
        outcome: DuelOutcome,
        rounds: u32,
    },
}

impl fmt::Display for DuelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuelEvent::DuelStarted { weapon_mode, duel_type, side_a, side_b } => write!(
                f,
                "A {duel_type} duel with {weapon_mode} weapons begins: {side_a} vs {side_b}"
            ),
            DuelEvent::RoundStarted { round, phase } => match phase {
                Phase::RangedVolley => write!(f, "--- Round {round} (volley) ---"),
                Phase::Engagement => write!(f, "--- Round {round} ---"),
            },
            DuelEvent::Initiative { who, total, faces, critical, rerolled } => {
                write!(f, "{who} rolls initiative {total} {faces:?}")?;
                if *rerolled {
                    write!(f, " after a lucky reroll")?;
                }
                match critical {
                    Some(Critical::Success) => write!(f, " - critical success!"),
                    Some(Critical::Failure) => write!(f, " - critical failure!"),
                    None => Ok(()),
                }
            }
            DuelEvent::FortuneReroll { who } => {
                write!(f, "{who} is favored by fortune: the round is re-rolled")
            }
            DuelEvent::Stalemate { round, reason } => match reason {
                StalemateReason::InitiativeTie => {
                    write!(f, "Round {round} is a stalemate: initiative tied")
                }
                StalemateReason::FortuneReroll => {
                    write!(f, "Round {round} is a stalemate: fortune intervened")
                }
            },
            DuelEvent::NoTarget { who } => write!(f, "{who} finds no one to engage"),
            DuelEvent::Missed { kind, who, total } => match kind {
                AttackKind::Volley | AttackKind::ThrownCounter => {
                    write!(f, "{who} misses (initiative {total})")
                }
                _ => write!(f, "{who} cannot find an opening (initiative {total})"),
            },
            DuelEvent::Attack { kind, attacker, defender, dice, damage, doubled, morale } => {
                write!(f, "{attacker} {kind} {defender} for {damage} {dice:?}")?;
                if *doubled {
                    write!(f, " (doubled)")?;
                }
                write!(f, ", morale now {morale}")
            }
            DuelEvent::CriticalSuccess { attacker, defender, stat, malus } => write!(
                f,
                "{attacker} lands a critical blow: {defender} suffers -{malus} {stat}"
            ),
            DuelEvent::CriticalFailure { who, stat, malus } => {
                write!(f, "{who} fumbles and hurts themself: -{malus} {stat}")
            }
            DuelEvent::ShieldReroll { who, discarded } => {
                write!(f, "{who} deflects a {discarded} with their shield and rerolls")
            }
            DuelEvent::Injury { who, severity, roll, outcome } => {
                write!(f, "{who} suffers a {severity} (rolled {roll}): {outcome}")
            }
            DuelEvent::SecondWind { who, morale } => {
                write!(f, "{who} finds a second wind! Morale restored to {morale}")
            }
            DuelEvent::Rampage { who, rounds } => {
                write!(f, "{who} flies into a rampage for {rounds} round(s)")
            }
            DuelEvent::Defeated { who, cause } => write!(f, "{who} {cause}"),
            DuelEvent::HeroicStand { who, active: true } => {
                write!(f, "{who} is badly outnumbered and makes a heroic stand")
            }
            DuelEvent::HeroicStand { who, active: false } => {
                write!(f, "{who} is no longer outnumbered; the heroic stand ends")
            }
            DuelEvent::TerrifyingPresence { who, bonus } => write!(
                f,
                "{who} stands alone and terrifies the enemy: their yield thresholds rise by {bonus}"
            ),
            DuelEvent::ContextSwitch { who, context } => match context {
                CombatContext::Melee => write!(f, "{who} draws steel and closes to melee"),
                CombatContext::Ranged => write!(f, "{who} falls back to ranged"),
            },
            DuelEvent::DuelEnded { outcome, rounds } => {
                write!(f, "Result after {rounds} round(s): {outcome}")
            }
        }
    }
}

/// Terminal result of a duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelOutcome {
    SideAWins,
    SideBWins,
    Draw,
}

impl DuelOutcome {
    pub fn winner(self) -> Option<SideId> {
        match self {
            DuelOutcome::SideAWins => Some(SideId::A),
            DuelOutcome::SideBWins => Some(SideId::B),
            DuelOutcome::Draw => None,
        }
    }
}

impl fmt::Display for DuelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuelOutcome::SideAWins => write!(f, "Side A wins"),
            DuelOutcome::SideBWins => write!(f, "Side B wins"),
            DuelOutcome::Draw => write!(f, "draw"),
        }
    }
}

/// Everything a finished duel produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelReport {
    pub events: Vec<DuelEvent>,
    pub lines: Vec<String>,
    pub outcome: DuelOutcome,
    pub rounds: u32,
    /// Injuries suffered by Side A and Side B
    pub injuries: [u32; 2],
}

impl DuelReport {
    pub fn new(events: Vec<DuelEvent>, outcome: DuelOutcome, rounds: u32) -> Self {
        let lines = events.iter().map(|event| event.to_string()).collect();
        let mut injuries = [0u32; 2];
        for event in &events {
            if let DuelEvent::Injury { who, outcome, .. } = event {
                if *outcome != InjuryOutcome::Recorded {
                    injuries[side_slot(who.side)] += 1;
                }
            }
        }
        DuelReport {
            events,
            lines,
            outcome,
            rounds,
            injuries,
        }
    }

    pub fn injuries_for(&self, side: SideId) -> u32 {
        self.injuries[side_slot(side)]
    }

    /// Count events matching a predicate
    pub fn count(&self, predicate: impl Fn(&DuelEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }

    /// One-line summary of the result
    pub fn summary(&self) -> String {
        format!(
            "{} after {} round(s) (injuries: A {}, B {})",
            self.outcome, self.rounds, self.injuries[0], self.injuries[1]
        )
    }
}

fn side_slot(side: SideId) -> usize {
    match side {
        SideId::A => 0,
        SideId::B => 1,
    }
}
