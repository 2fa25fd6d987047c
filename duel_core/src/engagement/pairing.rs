//! Acting order, target selection and outnumbering overflow

use super::Battlefield;
use crate::combatant::{Combatant, CombatantId};
use crate::types::SideId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How equal initiative totals are settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieRule {
    /// Equal totals: neither combatant may strike the other
    #[default]
    Stalemate,
    /// Ties go to higher Speed, then Side A
    SpeedThenSide,
}

impl FromStr for TieRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "stalemate" => Ok(TieRule::Stalemate),
            "speed then side" | "speed" => Ok(TieRule::SpeedThenSide),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for TieRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieRule::Stalemate => write!(f, "stalemate"),
            TieRule::SpeedThenSide => write!(f, "speed-then-side"),
        }
    }
}

/// Who may strike whom in a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Only opponents the attacker outranks on initiative
    Initiative(TieRule),
    /// Any opponent, once the attacker's total reaches the threshold
    Threshold(i32),
}

fn initiative_of(c: &Combatant) -> i32 {
    c.round.initiative.unwrap_or(i32::MIN)
}

fn side_rank(side: SideId) -> u8 {
    match side {
        SideId::A => 0,
        SideId::B => 1,
    }
}

/// Sort ids into acting order: initiative high to low, then Speed, then
/// Side A before Side B, then roster order
pub fn acting_order(field: &Battlefield, ids: &[CombatantId]) -> Vec<CombatantId> {
    let mut keyed: Vec<(CombatantId, i32, i32)> = ids
        .iter()
        .filter_map(|&id| {
            let c = field.get(id)?;
            Some((id, initiative_of(c), c.stats.speed))
        })
        .collect();

    keyed.sort_by(|(x, x_init, x_speed), (y, y_init, y_speed)| {
        y_init
            .cmp(x_init)
            .then(y_speed.cmp(x_speed))
            .then(side_rank(x.side).cmp(&side_rank(y.side)))
            .then(x.index.cmp(&y.index))
    });

    keyed.into_iter().map(|(id, _, _)| id).collect()
}

/// Whether `attacker` beat `defender` on initiative this round
pub fn outranks(attacker: &Combatant, defender: &Combatant, tie_rule: TieRule) -> bool {
    let ordering = initiative_of(attacker).cmp(&initiative_of(defender));
    let ordering = match tie_rule {
        TieRule::Stalemate => ordering,
        TieRule::SpeedThenSide => ordering
            .then(attacker.stats.speed.cmp(&defender.stats.speed))
            .then(side_rank(defender.side).cmp(&side_rank(attacker.side))),
    };
    ordering == Ordering::Greater
}

/// Whether at least one active pair of opponents can exchange a blow
pub fn any_pairing(field: &Battlefield, pairing: Pairing) -> bool {
    let Pairing::Initiative(tie_rule) = pairing else {
        return true;
    };
    let active = |side: SideId| field.side(side).members.iter().filter(|c| c.is_active());
    active(SideId::A).any(|a| {
        active(SideId::B).any(|b| outranks(a, b, tie_rule) || outranks(b, a, tie_rule))
    })
}

/// Free attacks the larger side earns
///
/// Overflow happens when the larger headcount exceeds the smaller side's
/// combined capacity or three times its headcount; every attacker beyond a
/// one-to-one matchup then attacks freely.
pub fn overflow(larger: usize, smaller: usize, smaller_capacity: u32) -> usize {
    if smaller == 0 || larger <= smaller {
        return 0;
    }
    if larger as u64 > u64::from(smaller_capacity) || larger > 3 * smaller {
        larger - smaller
    } else {
        0
    }
}

/// The lowest-initiative members of the larger side, one per free attack
pub fn free_attackers(field: &Battlefield) -> Vec<CombatantId> {
    let a = field.a.active_count();
    let b = field.b.active_count();
    let (larger, smaller) = match a.cmp(&b) {
        Ordering::Greater => (SideId::A, SideId::B),
        Ordering::Less => (SideId::B, SideId::A),
        Ordering::Equal => return Vec::new(),
    };

    let count = overflow(
        field.side(larger).active_count(),
        field.side(smaller).active_count(),
        field.side(smaller).total_capacity(),
    );
    if count == 0 {
        return Vec::new();
    }

    let mut ids = acting_order(field, &field.active_ids(larger));
    ids.reverse();
    ids.truncate(count);
    ids
}

/// Lowest-morale opponent the attacker may strike and that can still be
/// engaged this round
///
/// Ties go to the lower initiative, then to roster order.
pub fn choose_target(
    field: &Battlefield,
    attacker: CombatantId,
    pairing: Pairing,
) -> Option<CombatantId> {
    let striker = field.get(attacker)?;
    let side = attacker.side.opponent();
    field
        .side(side)
        .members
        .iter()
        .enumerate()
        .filter(|(_, c)| c.can_be_engaged())
        .filter(|(_, c)| match pairing {
            Pairing::Initiative(tie_rule) => outranks(striker, c, tie_rule),
            Pairing::Threshold(_) => true,
        })
        .min_by(|(i, x), (j, y)| {
            x.stats
                .morale
                .cmp(&y.stats.morale)
                .then(initiative_of(x).cmp(&initiative_of(y)))
                .then(i.cmp(j))
        })
        .map(|(index, _)| CombatantId { side, index })
}

/// Lowest-morale active opponent, ignoring attacker caps
pub fn weakest_opponent(field: &Battlefield, side: SideId) -> Option<CombatantId> {
    let opponent = side.opponent();
    field
        .side(opponent)
        .members
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_active())
        .min_by_key(|(index, c)| (c.stats.morale, *index))
        .map(|(index, _)| CombatantId {
            side: opponent,
            index,
        })
}
