//! Initiative rolls and critical detection

use super::Resolver;
use crate::combatant::Combatant;
use crate::dice::DiceSource;
use crate::duel::{Critical, DuelEvent};
use crate::perk::PerkKind;

/// Outcome of one initiative roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiativeRoll {
    pub total: i32,
    pub faces: Vec<u32>,
    pub critical: Option<Critical>,
    pub rerolled: bool,
}

/// Classify a pair of faces; a success face and a 1 together cancel out
pub fn classify_faces(faces: &[u32], success_face: u32) -> Option<Critical> {
    let success = faces.iter().any(|&face| face >= success_face);
    let failure = faces.contains(&1);
    match (success, failure) {
        (true, false) => Some(Critical::Success),
        (false, true) => Some(Critical::Failure),
        _ => None,
    }
}

/// Lowest face that counts as a critical success
fn success_face(combatant: &Combatant) -> u32 {
    if combatant.perks.has_tier(PerkKind::Duelist, 3) {
        19
    } else {
        20
    }
}

impl<D: DiceSource> Resolver<'_, D> {
    /// Roll 2d20 + Speed, spending a lucky reroll on a natural 1
    ///
    /// With `track_crits` unset (volleys, thrown counters) the critical flags
    /// are left clear.
    pub fn roll_initiative(&mut self, combatant: &mut Combatant, track_crits: bool) -> InitiativeRoll {
        let mut roll = self.dice.roll_pair(20);
        let mut rerolled = false;
        if roll.has_face(1)
            && combatant.perks.has(PerkKind::FavoredByFortune)
            && !combatant.duel.lucky_reroll_used
        {
            combatant.duel.lucky_reroll_used = true;
            roll = self.dice.roll_pair(20);
            rerolled = true;
        }

        let critical = if track_crits {
            classify_faces(&roll.faces, success_face(combatant))
        } else {
            None
        };
        let total = roll.total + combatant.stats.speed;

        combatant.round.initiative = Some(total);
        combatant.round.critical_success = critical == Some(Critical::Success);
        combatant.round.critical_failure = critical == Some(Critical::Failure);

        self.events.push(DuelEvent::Initiative {
            who: combatant.actor(),
            total,
            faces: roll.faces.clone(),
            critical,
            rerolled,
        });

        InitiativeRoll {
            total,
            faces: roll.faces,
            critical,
            rerolled,
        }
    }
}
