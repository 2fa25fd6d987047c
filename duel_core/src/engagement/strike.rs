//! Damage rolls and the checks that follow a landed blow

use super::Resolver;
use crate::combatant::{Combatant, DefeatCause};
use crate::dice::DiceSource;
use crate::duel::{AttackKind, DuelEvent};
use crate::injury::Severity;
use crate::perk::PerkKind;
use tracing::debug;

/// Damage dice: 3d5
const DAMAGE_DICE_FACES: u32 = 5;

/// Dice total plus Attack minus Defense, never below 1
pub fn compute_damage(dice_total: i32, attack: i32, defense: i32) -> i32 {
    (dice_total + attack - defense).max(1)
}

impl<D: DiceSource> Resolver<'_, D> {
    /// Roll damage and apply it to the defender, then run the defeat checks
    pub fn strike(
        &mut self,
        kind: AttackKind,
        attacker: &Combatant,
        defender: &mut Combatant,
        critical: bool,
    ) -> i32 {
        let roll = self.dice.roll_triple(DAMAGE_DICE_FACES);
        let mut damage = compute_damage(roll.total, attacker.stats.attack, defender.stats.defense);
        let doubled = critical && attacker.perks.has_tier(PerkKind::SteelTempest, 3);
        if doubled {
            damage *= 2;
        }

        let morale_before = defender.stats.morale;
        defender.stats.morale -= damage;
        defender.round.combatants_faced += 1;

        debug!(
            attacker = %attacker.name,
            defender = %defender.name,
            damage,
            morale = defender.stats.morale,
            "blow landed"
        );
        self.events.push(DuelEvent::Attack {
            kind,
            attacker: attacker.actor(),
            defender: defender.actor(),
            dice: roll.faces,
            damage,
            doubled,
            morale: defender.stats.morale,
        });

        self.after_damage(defender, morale_before);
        damage
    }

    /// Berserker reversal, then removal on Morale or injury limits
    pub fn after_damage(&mut self, defender: &mut Combatant, morale_before: i32) {
        let threshold = defender.yield_threshold();
        let morale = defender.stats.morale;
        let crossed = morale <= 0 || morale <= threshold;

        if crossed && defender.is_raging() {
            defender.stats.morale = 1;
        } else if crossed && !self.berserk(defender, morale_before, threshold) {
            let cause = if morale <= 0 {
                match self.record_primary_injury(defender) {
                    Severity::Death => DefeatCause::Killed,
                    _ => DefeatCause::Incapacitated,
                }
            } else {
                DefeatCause::Yielded
            };
            defender.defeat(cause.clone());
            self.events.push(DuelEvent::Defeated {
                who: defender.actor(),
                cause,
            });
            return;
        }

        self.check_injury_limit(defender);
    }

    /// One-shot Berserker trigger; true when the combatant keeps fighting
    fn berserk(&mut self, defender: &mut Combatant, morale_before: i32, threshold: i32) -> bool {
        let Some(tier) = defender.perks.tier(PerkKind::Berserker) else {
            return false;
        };
        if defender.duel.berserk_triggered {
            return false;
        }
        defender.duel.berserk_triggered = true;

        if tier >= 2 {
            let rounds = self.dice.roll_d(3);
            defender.duel.rampage_rounds_remaining = rounds;
            defender.round.rampage_started = true;
            defender.stats.morale = 1;
            self.events.push(DuelEvent::Rampage {
                who: defender.actor(),
                rounds,
            });
        } else {
            let morale = (2 * morale_before).max(threshold + 1);
            defender.stats.morale = morale;
            self.events.push(DuelEvent::SecondWind {
                who: defender.actor(),
                morale,
            });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ruleset;
    use crate::dice::ScriptedDice;
    use crate::engagement::test_support::prepared;
    use crate::types::{SideId, WeaponMode};
    use proptest::prelude::*;

    fn pair(attacker: Combatant, defender: Combatant, ruleset: &Ruleset) -> (Combatant, Combatant) {
        (
            prepared(attacker, SideId::A, ruleset),
            prepared(defender, SideId::B, ruleset),
        )
    }

    #[test]
    fn test_damage_floor() {
        assert_eq!(compute_damage(3, 0, 40), 1);
        assert_eq!(compute_damage(15, 2, 1), 16);
    }

    #[test]
    fn test_strike_reduces_morale() {
        let ruleset = Ruleset::default();
        let (a, mut b) = pair(
            Combatant::new("Aldric", 30).with_item("Greatsword"),
            Combatant::new("Brom", 30).with_item("Shield"),
            &ruleset,
        );
        let mut dice = ScriptedDice::from_faces([4, 4, 4]);
        let mut events = Vec::new();
        let mut resolver = Resolver::new(&ruleset, WeaponMode::Live, &mut dice, &mut events);
        let damage = resolver.strike(AttackKind::Strike, &a, &mut b, false);
        assert_eq!(damage, 12);
        assert_eq!(b.stats.morale, 38);
        assert_eq!(b.round.combatants_faced, 1);
    }

    #[test]
    fn test_steel_tempest_doubles_on_crit() {
        let ruleset = Ruleset::default();
        let (a, mut b) = pair(
            Combatant::new("Aldric", 30).with_perk(PerkKind::SteelTempest, 3),
            Combatant::new("Brom", 30).with_perk(PerkKind::Indomitable, 3),
            &ruleset,
        );
        let mut dice = ScriptedDice::from_faces([2, 2, 2]);
        let mut events = Vec::new();
        let mut resolver = Resolver::new(&ruleset, WeaponMode::Live, &mut dice, &mut events);
        // 6 + 3 attack, doubled
        assert_eq!(resolver.strike(AttackKind::Strike, &a, &mut b, true), 18);
    }

    #[test]
    fn test_yield_at_threshold() {
        let ruleset = Ruleset::default();
        let (a, mut b) = pair(Combatant::new("A", 30), Combatant::new("B", 30), &ruleset);
        b.stats.morale = 20;
        let mut dice = ScriptedDice::from_faces([1, 2, 2]);
        let mut events = Vec::new();
        let mut resolver = Resolver::new(&ruleset, WeaponMode::Live, &mut dice, &mut events);
        resolver.strike(AttackKind::Strike, &a, &mut b, false);
        assert_eq!(b.stats.morale, 15);
        assert_eq!(b.defeat, Some(DefeatCause::Yielded));
    }

    #[test]
    fn test_zero_morale_rolls_primary_injury() {
        let ruleset = Ruleset::default();
        let (a, mut b) = pair(Combatant::new("A", 30), Combatant::new("B", 30), &ruleset);
        b.stats.morale = 5;
        // damage 15, then primary d100 = 3 (Death under live weapons)
        let mut dice = ScriptedDice::from_faces([5, 5, 5, 3]);
        let mut events = Vec::new();
        let mut resolver = Resolver::new(&ruleset, WeaponMode::Live, &mut dice, &mut events);
        resolver.strike(AttackKind::Strike, &a, &mut b, false);
        assert_eq!(b.defeat, Some(DefeatCause::Killed));

        let (_, mut c) = pair(Combatant::new("A", 30), Combatant::new("C", 30), &ruleset);
        c.stats.morale = 5;
        let mut dice = ScriptedDice::from_faces([5, 5, 5, 3]);
        let mut events = Vec::new();
        let mut resolver = Resolver::new(&ruleset, WeaponMode::Blunted, &mut dice, &mut events);
        resolver.strike(AttackKind::Strike, &a, &mut c, false);
        assert_eq!(c.defeat, Some(DefeatCause::Incapacitated));
    }

    #[test]
    fn test_second_wind_fires_once() {
        let ruleset = Ruleset::default();
        let (a, mut b) = pair(
            Combatant::new("A", 30),
            Combatant::new("B", 30).with_perk(PerkKind::Berserker, 1),
            &ruleset,
        );
        b.stats.morale = 18;
        let mut dice = ScriptedDice::from_faces([2, 2, 2, 5, 5, 5]);
        let mut events = Vec::new();
        let mut resolver = Resolver::new(&ruleset, WeaponMode::Live, &mut dice, &mut events);

        // Berserker T1 gives +2 Attack only, so damage is 6 - 0
        resolver.strike(AttackKind::Strike, &a, &mut b, false);
        assert!(b.is_active());
        assert_eq!(b.stats.morale, 36);
        assert!(b.duel.berserk_triggered);

        b.stats.morale = 18;
        resolver.strike(AttackKind::Strike, &a, &mut b, false);
        assert_eq!(b.defeat, Some(DefeatCause::Yielded));
    }

    #[test]
    fn test_rampage_pins_morale() {
        let ruleset = Ruleset::default();
        let (a, mut b) = pair(
            Combatant::new("A", 30),
            Combatant::new("B", 30).with_perk(PerkKind::Berserker, 2),
            &ruleset,
        );
        b.stats.morale = 10;
        let mut dice = ScriptedDice::from_faces([5, 5, 5, 2, 5, 5, 5]);
        let mut events = Vec::new();
        let mut resolver = Resolver::new(&ruleset, WeaponMode::Live, &mut dice, &mut events);

        resolver.strike(AttackKind::Strike, &a, &mut b, false);
        assert!(b.is_active());
        assert_eq!(b.stats.morale, 1);
        assert_eq!(b.duel.rampage_rounds_remaining, 2);
        assert!(b.round.rampage_started);

        resolver.strike(AttackKind::Strike, &a, &mut b, false);
        assert!(b.is_active());
        assert_eq!(b.stats.morale, 1);
    }

    #[test]
    fn test_raised_threshold_forces_yield() {
        let ruleset = Ruleset::default();
        let (a, mut b) = pair(Combatant::new("A", 30), Combatant::new("B", 30), &ruleset);
        b.duel.yield_threshold_bonus = 10;
        b.stats.morale = 30;
        let mut dice = ScriptedDice::from_faces([2, 2, 2]);
        let mut events = Vec::new();
        let mut resolver = Resolver::new(&ruleset, WeaponMode::Live, &mut dice, &mut events);
        resolver.strike(AttackKind::Strike, &a, &mut b, false);
        assert_eq!(b.stats.morale, 24);
        assert_eq!(b.defeat, Some(DefeatCause::Yielded));
    }

    proptest! {
        #[test]
        fn prop_damage_at_least_one(
            dice_total in 3i32..=15,
            attack in -40i32..40,
            defense in -40i32..40,
        ) {
            prop_assert!(compute_damage(dice_total, attack, defense) >= 1);
        }
    }
}
