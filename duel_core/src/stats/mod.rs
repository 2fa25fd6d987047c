//! Stat Resolver - working stats from age, perks, items and injuries
//!
//! Resolution always recomputes from the static inputs, so calling it twice
//! with the same combatant and context yields the same result.

use crate::combatant::Combatant;
use crate::config::Ruleset;
use crate::perk::{PerkKind, PerkSet};
use crate::types::{CombatContext, StatLine};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Morale granted per Indomitable tier
const INDOMITABLE_MORALE_PER_TIER: i32 = 15;

/// Output of a full stat resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingStats {
    pub stats: StatLine,
    /// Major injuries whose malus is ignored
    pub immunity: u32,
    /// Attackers absorbed per round before overflow
    pub capacity: u32,
    /// Extra opening volley rounds this combatant grants its side
    pub extra_volleys: u32,
}

/// Age malus after Duelist reduction, never negative
pub fn age_malus(age: u32, perks: &PerkSet, ruleset: &Ruleset) -> i32 {
    let raw = ruleset.age_malus(age);
    let reduction = perks
        .tier(PerkKind::Duelist)
        .map_or(0, |tier| 2 * i32::from(tier));
    (raw - reduction).max(0)
}

/// Summed perk stat deltas for a context
pub fn perk_contribution(perks: &PerkSet, context: CombatContext, ruleset: &Ruleset) -> StatLine {
    perks.iter().fold(StatLine::default(), |mut acc, &perk| {
        let delta = ruleset.perk_delta(perk, context);
        acc.speed += delta.speed;
        acc.attack += delta.attack;
        acc.defense += delta.defense;
        acc
    })
}

/// Summed item bonuses; unknown names contribute nothing
pub fn item_contribution(items: &[String], ruleset: &Ruleset) -> StatLine {
    items
        .iter()
        .filter_map(|name| ruleset.item(name))
        .fold(StatLine::default(), |mut acc, item| {
            acc.attack += item.attack;
            acc.defense += item.defense;
            acc
        })
}

/// Derive working stats for a combatant in a context
pub fn resolve(combatant: &Combatant, context: CombatContext, ruleset: &Ruleset) -> WorkingStats {
    let mut stats = StatLine {
        morale: ruleset.base_morale,
        ..StatLine::default()
    };

    stats.shift_all(-age_malus(combatant.age, &combatant.perks, ruleset));

    let perks = perk_contribution(&combatant.perks, context, ruleset);
    stats.speed += perks.speed;
    stats.attack += perks.attack;
    stats.defense += perks.defense;

    let indomitable = combatant
        .perks
        .tier(PerkKind::Indomitable)
        .map_or(0, u32::from);
    stats.morale += INDOMITABLE_MORALE_PER_TIER * indomitable as i32;

    let items = item_contribution(&combatant.items, ruleset);
    stats.attack += items.attack;
    stats.defense += items.defense;

    stats.speed -= combatant.injury_malus.speed;
    stats.attack -= combatant.injury_malus.attack;
    stats.defense -= combatant.injury_malus.defense;

    WorkingStats {
        stats,
        immunity: indomitable,
        capacity: ruleset.base_capacity + indomitable,
        extra_volleys: u32::from(combatant.perks.has_tier(PerkKind::Marksman, 3)),
    }
}

/// Resolve stats and reset every duel-scoped flag for a fresh duel
pub fn prepare(combatant: &mut Combatant, context: CombatContext, ruleset: &Ruleset) {
    let working = resolve(combatant, context, ruleset);
    combatant.stats = working.stats;
    combatant.context = context;
    combatant.injuries_taken = 0;
    combatant.defeat = None;
    combatant.reset_round();
    combatant.duel = Default::default();
    combatant.duel.immunity_remaining = working.immunity;
    combatant.duel.max_attackers = working.capacity;
    debug!(
        combatant = %combatant.name,
        speed = combatant.stats.speed,
        attack = combatant.stats.attack,
        defense = combatant.stats.defense,
        morale = combatant.stats.morale,
        "stats resolved"
    );
}

/// Swap perk contributions from the current context to `to`
///
/// Age, item and injury adjustments are left untouched, as are any stat
/// changes picked up during the fight.
pub fn switch_context(combatant: &mut Combatant, to: CombatContext, ruleset: &Ruleset) {
    if combatant.context == to {
        return;
    }
    let old = perk_contribution(&combatant.perks, combatant.context, ruleset);
    let new = perk_contribution(&combatant.perks, to, ruleset);
    combatant.stats.speed += new.speed - old.speed;
    combatant.stats.attack += new.attack - old.attack;
    combatant.stats.defense += new.defense - old.defense;
    combatant.context = to;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rules() -> Ruleset {
        Ruleset::default()
    }

    #[test]
    fn test_plain_adult() {
        let c = Combatant::new("Aldric", 30);
        let working = resolve(&c, CombatContext::Melee, &rules());
        assert_eq!(
            working.stats,
            StatLine { speed: 0, attack: 0, defense: 0, morale: 50 }
        );
        assert_eq!(working.capacity, 3);
        assert_eq!(working.immunity, 0);
    }

    #[test]
    fn test_age_malus_applies_to_all_stats() {
        let c = Combatant::new("Old Tom", 75);
        let working = resolve(&c, CombatContext::Melee, &rules());
        assert_eq!((working.stats.speed, working.stats.attack, working.stats.defense), (-6, -6, -6));
    }

    #[test]
    fn test_duelist_reduces_age_malus() {
        let perks: PerkSet = [crate::perk::Perk::new(PerkKind::Duelist, 2)].into_iter().collect();
        assert_eq!(age_malus(75, &perks, &rules()), 2);
        assert_eq!(age_malus(55, &perks, &rules()), 0);
        assert_eq!(age_malus(30, &perks, &rules()), 0);
    }

    #[test]
    fn test_indomitable_morale_and_capacity() {
        let c = Combatant::new("Brom", 30).with_perk(PerkKind::Indomitable, 3);
        let working = resolve(&c, CombatContext::Melee, &rules());
        assert_eq!(working.stats.morale, 95);
        assert_eq!(working.immunity, 3);
        assert_eq!(working.capacity, 6);
    }

    #[test]
    fn test_items_and_injuries() {
        let c = Combatant::new("Cass", 30)
            .with_item("Greatsword")
            .with_item("plate armour")
            .with_item("Lute")
            .with_injury_malus(1, 1, 1);
        let working = resolve(&c, CombatContext::Melee, &rules());
        assert_eq!(
            working.stats,
            StatLine { speed: -1, attack: 1, defense: 2, morale: 50 }
        );
    }

    #[test]
    fn test_context_specific_perks() {
        let c = Combatant::new("Dara", 30)
            .with_perk(PerkKind::BowSpecialist, 2)
            .with_perk(PerkKind::BattlefieldChampion, 1);
        let ranged = resolve(&c, CombatContext::Ranged, &rules()).stats;
        let melee = resolve(&c, CombatContext::Melee, &rules()).stats;
        assert_eq!((ranged.speed, ranged.attack), (4, 3));
        assert_eq!((melee.speed, melee.attack), (1, 1));
    }

    #[test]
    fn test_marksman_extends_volleys() {
        let c = Combatant::new("Eda", 30).with_perk(PerkKind::Marksman, 3);
        assert_eq!(resolve(&c, CombatContext::Ranged, &rules()).extra_volleys, 1);
        let c = Combatant::new("Eda", 30).with_perk(PerkKind::Marksman, 2);
        assert_eq!(resolve(&c, CombatContext::Ranged, &rules()).extra_volleys, 0);
    }

    #[test]
    fn test_switch_context_matches_fresh_resolve() {
        let ruleset = rules();
        let mut c = Combatant::new("Fen", 62)
            .with_perk(PerkKind::ShieldSpecialist, 2)
            .with_perk(PerkKind::BowSpecialist, 3)
            .with_item("Shield");
        prepare(&mut c, CombatContext::Ranged, &ruleset);
        switch_context(&mut c, CombatContext::Melee, &ruleset);
        let fresh = resolve(&c, CombatContext::Melee, &ruleset).stats;
        assert_eq!(c.stats, fresh);
        assert_eq!(c.context, CombatContext::Melee);
    }

    #[test]
    fn test_switch_context_keeps_battle_damage() {
        let ruleset = rules();
        let mut c = Combatant::new("Gil", 30).with_perk(PerkKind::BowSpecialist, 1);
        prepare(&mut c, CombatContext::Ranged, &ruleset);
        c.stats.defense -= 2;
        c.stats.morale = 31;
        switch_context(&mut c, CombatContext::Melee, &ruleset);
        assert_eq!(c.stats.defense, -2);
        assert_eq!(c.stats.morale, 31);
        assert_eq!((c.stats.speed, c.stats.attack), (0, 0));
    }

    #[test]
    fn test_switch_to_same_context_is_noop() {
        let ruleset = rules();
        let mut c = Combatant::new("Hal", 30).with_perk(PerkKind::Duelist, 1);
        prepare(&mut c, CombatContext::Melee, &ruleset);
        let before = c.stats;
        switch_context(&mut c, CombatContext::Melee, &ruleset);
        assert_eq!(c.stats, before);
    }

    proptest! {
        #[test]
        fn prop_age_malus_zero_in_prime(age in 16u32..=50) {
            prop_assert_eq!(age_malus(age, &PerkSet::new(), &rules()), 0);
        }

        #[test]
        fn prop_age_malus_capped_for_elders(age in 91u32..200) {
            prop_assert_eq!(age_malus(age, &PerkSet::new(), &rules()), 10);
        }

        #[test]
        fn prop_age_malus_monotonic_past_prime(age in 16u32..150) {
            let ruleset = rules();
            let none = PerkSet::new();
            prop_assert!(age_malus(age + 1, &none, &ruleset) >= age_malus(age, &none, &ruleset));
        }

        #[test]
        fn prop_age_malus_monotonic_for_youths(age in 1u32..=16) {
            let ruleset = rules();
            let none = PerkSet::new();
            prop_assert!(age_malus(age - 1, &none, &ruleset) >= age_malus(age, &none, &ruleset));
        }

        #[test]
        fn prop_resolve_is_idempotent(age in 0u32..120, tier in 1u8..=3) {
            let ruleset = rules();
            let c = Combatant::new("X", age)
                .with_perk(PerkKind::SpearSpecialist, tier)
                .with_perk(PerkKind::Duelist, tier);
            prop_assert_eq!(
                resolve(&c, CombatContext::Melee, &ruleset),
                resolve(&c, CombatContext::Melee, &ruleset)
            );
        }
    }
}
