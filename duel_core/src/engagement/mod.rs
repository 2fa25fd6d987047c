//! Engagement Resolver - initiative, pairing, attacks and their consequences
//!
//! A [`Resolver`] carries what every step of a round needs: the ruleset, the
//! weapon mode, the dice and the event log. The [`Battlefield`] holds both
//! sides; defeated combatants stay in place (flagged) until the round ends so
//! that ids remain valid for the whole round.

mod initiative;
mod pairing;
mod strike;
mod wounds;

pub use initiative::{classify_faces, InitiativeRoll};
pub use pairing::{
    acting_order, any_pairing, choose_target, free_attackers, outranks, overflow,
    weakest_opponent, Pairing, TieRule,
};
pub use strike::compute_damage;

use crate::combatant::{Combatant, CombatantId, Side};
use crate::config::Ruleset;
use crate::dice::DiceSource;
use crate::duel::{AttackKind, DuelEvent, StalemateReason};
use crate::perk::PerkKind;
use crate::types::{SideId, WeaponMode};

/// Both sides of a duel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Battlefield {
    pub a: Side,
    pub b: Side,
}

impl Battlefield {
    pub fn new(a: Side, b: Side) -> Self {
        Battlefield { a, b }
    }

    pub fn side(&self, side: SideId) -> &Side {
        match side {
            SideId::A => &self.a,
            SideId::B => &self.b,
        }
    }

    pub fn side_mut(&mut self, side: SideId) -> &mut Side {
        match side {
            SideId::A => &mut self.a,
            SideId::B => &mut self.b,
        }
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.side(id.side).members.get(id.index)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.side_mut(id.side).members.get_mut(id.index)
    }

    /// Mutable access to two combatants on opposite sides
    pub fn pair_mut(
        &mut self,
        first: CombatantId,
        second: CombatantId,
    ) -> Option<(&mut Combatant, &mut Combatant)> {
        match (first.side, second.side) {
            (SideId::A, SideId::B) => Some((
                self.a.members.get_mut(first.index)?,
                self.b.members.get_mut(second.index)?,
            )),
            (SideId::B, SideId::A) => Some((
                self.b.members.get_mut(first.index)?,
                self.a.members.get_mut(second.index)?,
            )),
            _ => None,
        }
    }

    /// Ids of active combatants on one side, in roster order
    pub fn active_ids(&self, side: SideId) -> Vec<CombatantId> {
        self.side(side)
            .active_indices()
            .into_iter()
            .map(|index| CombatantId { side, index })
            .collect()
    }

    /// Active ids of Side A then Side B
    pub fn all_active_ids(&self) -> Vec<CombatantId> {
        let mut ids = self.active_ids(SideId::A);
        ids.extend(self.active_ids(SideId::B));
        ids
    }

    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.a.members.iter().chain(self.b.members.iter())
    }

    pub fn combatants_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.a.members.iter_mut().chain(self.b.members.iter_mut())
    }
}

/// How an engagement round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult {
    Fought,
    Stalemate(StalemateReason),
}

/// Shared state for resolving one round
pub struct Resolver<'a, D: DiceSource> {
    pub ruleset: &'a Ruleset,
    pub mode: WeaponMode,
    pub dice: &'a mut D,
    pub events: &'a mut Vec<DuelEvent>,
}

impl<'a, D: DiceSource> Resolver<'a, D> {
    pub fn new(
        ruleset: &'a Ruleset,
        mode: WeaponMode,
        dice: &'a mut D,
        events: &'a mut Vec<DuelEvent>,
    ) -> Self {
        Resolver {
            ruleset,
            mode,
            dice,
            events,
        }
    }

    /// Resolve one engagement round
    ///
    /// Under [`Pairing::Initiative`] an attacker may only strike opponents it
    /// outranks; under [`Pairing::Threshold`] any opponent, once its total
    /// reaches the threshold (ranged duels).
    pub fn engagement_round(
        &mut self,
        field: &mut Battlefield,
        round: u32,
        pairing: Pairing,
    ) -> RoundResult {
        for id in field.all_active_ids() {
            if let Some(combatant) = field.get_mut(id) {
                self.roll_initiative(combatant, true);
            }
        }

        if self.fortune_intervenes(field) {
            let reason = StalemateReason::FortuneReroll;
            self.events.push(DuelEvent::Stalemate { round, reason });
            return RoundResult::Stalemate(reason);
        }

        let free = free_attackers(field);
        if free.is_empty() && !any_pairing(field, pairing) {
            let reason = StalemateReason::InitiativeTie;
            self.events.push(DuelEvent::Stalemate { round, reason });
            return RoundResult::Stalemate(reason);
        }

        let regular: Vec<CombatantId> = field
            .all_active_ids()
            .into_iter()
            .filter(|id| !free.contains(id))
            .collect();

        for id in acting_order(field, &regular) {
            self.take_turn(field, id, pairing);
        }

        for id in free {
            self.free_attack(field, id);
        }

        RoundResult::Fought
    }

    fn take_turn(&mut self, field: &mut Battlefield, id: CombatantId, pairing: Pairing) {
        let Some(actor) = field.get_mut(id).filter(|c| c.is_active()) else {
            return;
        };
        // a fumble hurts the roller but does not cancel its attack
        if actor.round.critical_failure {
            self.critical_failure(actor);
            if !actor.is_active() {
                return;
            }
        }
        let critical = actor.round.critical_success;
        let initiative = actor.round.initiative.unwrap_or(i32::MIN);
        let who = actor.actor();

        if let Pairing::Threshold(threshold) = pairing {
            if initiative < threshold {
                self.events.push(DuelEvent::Missed {
                    kind: AttackKind::Strike,
                    who,
                    total: initiative,
                });
                return;
            }
        }

        let Some(target) = choose_target(field, id, pairing) else {
            self.events.push(DuelEvent::NoTarget { who });
            return;
        };

        let Some((attacker, defender)) = field.pair_mut(id, target) else {
            return;
        };
        attacker.round.engaged = true;
        if critical {
            self.critical_success(&who, defender);
            if !defender.is_active() {
                return;
            }
        }
        self.strike(AttackKind::Strike, attacker, defender, critical);
    }

    fn free_attack(&mut self, field: &mut Battlefield, id: CombatantId) {
        let Some(attacker) = field.get(id).filter(|c| c.is_active()) else {
            return;
        };
        let who = attacker.actor();

        let opponent = id.side.opponent();
        let targets: Vec<CombatantId> = field
            .active_ids(opponent)
            .into_iter()
            .filter(|t| field.get(*t).is_some_and(|c| !c.shielded_from_free_attacks()))
            .collect();
        if targets.is_empty() {
            self.events.push(DuelEvent::NoTarget { who });
            return;
        }

        let target = targets[self.dice.pick_index(targets.len())];
        if let Some((attacker, defender)) = field.pair_mut(id, target) {
            attacker.round.engaged = true;
            self.strike(AttackKind::Free, attacker, defender, false);
        }
    }

    /// An opponent of a critical roller may spend Favored by Fortune T2+ to
    /// void the whole round
    fn fortune_intervenes(&mut self, field: &mut Battlefield) -> bool {
        for side in [SideId::A, SideId::B] {
            let threatened = field
                .side(side.opponent())
                .members
                .iter()
                .any(|c| c.is_active() && c.round.critical_success);
            if !threatened {
                continue;
            }
            let holder = field.side_mut(side).members.iter_mut().find(|c| {
                c.is_active()
                    && c.perks.has_tier(PerkKind::FavoredByFortune, 2)
                    && !c.duel.fortune_reroll_used
            });
            if let Some(holder) = holder {
                holder.duel.fortune_reroll_used = true;
                let who = holder.actor();
                self.events.push(DuelEvent::FortuneReroll { who });
                return true;
            }
        }
        false
    }
}
