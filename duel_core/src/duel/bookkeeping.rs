//! Per-round perk triggers, volleys and end-of-round cleanup

use crate::combatant::{CombatantId, DefeatCause};
use crate::config::Ruleset;
use crate::dice::DiceSource;
use crate::duel::{AttackKind, DuelEvent};
use crate::engagement::{weakest_opponent, Battlefield, Resolver};
use crate::perk::PerkKind;
use crate::stats;
use crate::types::{CombatContext, SideId};

/// Yield-threshold increase per Terrifying Presence tier
const PRESENCE_BONUS_PER_TIER: i32 = 5;

/// Toggle Heroic Stand buffs as headcount ratios change
pub fn heroic_stand(field: &mut Battlefield, ruleset: &Ruleset, events: &mut Vec<DuelEvent>) {
    let counts = [field.a.active_count(), field.b.active_count()];
    for side in [SideId::A, SideId::B] {
        let (allies, enemies) = match side {
            SideId::A => (counts[0], counts[1]),
            SideId::B => (counts[1], counts[0]),
        };
        let outnumbered = allies > 0 && enemies >= ruleset.heroic_stand_ratio as usize * allies;

        for c in field.side_mut(side).members.iter_mut() {
            if !c.is_active() || !c.perks.has(PerkKind::HeroicStand) {
                continue;
            }
            if outnumbered != c.duel.heroic_stand_active {
                let delta = if outnumbered {
                    ruleset.heroic_stand_bonus
                } else {
                    -ruleset.heroic_stand_bonus
                };
                c.stats.shift_all(delta);
                c.duel.heroic_stand_active = outnumbered;
                events.push(DuelEvent::HeroicStand {
                    who: c.actor(),
                    active: outnumbered,
                });
            }
        }
    }
}

/// A lone Terrifying Presence holder facing a group raises every
/// opponent's yield threshold, once per duel
pub fn terrifying_presence(field: &mut Battlefield, events: &mut Vec<DuelEvent>) {
    for side in [SideId::A, SideId::B] {
        let opponent = side.opponent();
        if field.side(side).active_count() != 1 || field.side(opponent).active_count() < 2 {
            continue;
        }

        let Some(holder) = field.side_mut(side).members.iter_mut().find(|c| {
            c.is_active()
                && c.perks.has(PerkKind::TerrifyingPresence)
                && !c.duel.terrifying_presence_applied
        }) else {
            continue;
        };
        holder.duel.terrifying_presence_applied = true;
        let tier = holder.perks.tier(PerkKind::TerrifyingPresence).unwrap_or(1);
        let bonus = PRESENCE_BONUS_PER_TIER * i32::from(tier);
        events.push(DuelEvent::TerrifyingPresence {
            who: holder.actor(),
            bonus,
        });

        for c in field.side_mut(opponent).members.iter_mut() {
            if !c.is_active() {
                continue;
            }
            c.duel.yield_threshold_bonus += bonus;
            if c.stats.morale <= c.yield_threshold() && !c.is_raging() {
                c.defeat(DefeatCause::Yielded);
                events.push(DuelEvent::Defeated {
                    who: c.actor(),
                    cause: DefeatCause::Yielded,
                });
            }
        }
    }
}

impl<D: DiceSource> Resolver<'_, D> {
    /// One round of opening volleys from the ranged side
    ///
    /// Shots need an initiative total at the ranged threshold and ignore
    /// criticals and attacker caps. On the final volley, melee fighters
    /// with Thrown Projectile Specialist T2+ may answer.
    pub fn volley_round(&mut self, field: &mut Battlefield, ranged: SideId, last: bool) {
        let threshold = self.ruleset.ranged_hit_threshold;

        for id in field.active_ids(ranged) {
            self.volley_shot(field, id, AttackKind::Volley, threshold);
        }

        if last {
            let throwers: Vec<_> = field
                .active_ids(ranged.opponent())
                .into_iter()
                .filter(|id| {
                    field.get(*id).is_some_and(|c| {
                        c.perks.has_tier(PerkKind::ThrownProjectileSpecialist, 2)
                    })
                })
                .collect();
            for id in throwers {
                self.volley_shot(field, id, AttackKind::ThrownCounter, threshold);
            }
        }
    }

    fn volley_shot(
        &mut self,
        field: &mut Battlefield,
        id: CombatantId,
        kind: AttackKind,
        threshold: i32,
    ) {
        let Some(shooter) = field.get_mut(id).filter(|c| c.is_active()) else {
            return;
        };
        let roll = self.roll_initiative(shooter, false);
        if roll.total < threshold {
            let who = shooter.actor();
            self.events.push(DuelEvent::Missed {
                kind,
                who,
                total: roll.total,
            });
            return;
        }

        let Some(target) = weakest_opponent(field, id.side) else {
            return;
        };
        if let Some((shooter, target)) = field.pair_mut(id, target) {
            shooter.round.engaged = true;
            self.strike(kind, shooter, target, false);
        }
    }
}

/// Close the ranged side to melee once the volleys are spent
pub fn close_to_melee(
    field: &mut Battlefield,
    side: SideId,
    ruleset: &Ruleset,
    events: &mut Vec<DuelEvent>,
) {
    for c in field.side_mut(side).members.iter_mut() {
        if !c.is_active() || c.context == CombatContext::Melee {
            continue;
        }
        stats::switch_context(c, CombatContext::Melee, ruleset);
        events.push(DuelEvent::ContextSwitch {
            who: c.actor(),
            context: CombatContext::Melee,
        });
    }
}

/// Tick rampages, drop the fallen and clear round-scoped state
///
/// A rampage that began this round is not ticked, so every rolled round is
/// fought in full.
pub fn end_of_round(field: &mut Battlefield, events: &mut Vec<DuelEvent>) {
    for c in field.combatants_mut() {
        if !c.is_active() || !c.is_raging() || c.round.rampage_started {
            continue;
        }
        c.duel.rampage_rounds_remaining -= 1;
        if c.duel.rampage_rounds_remaining == 0 && c.stats.morale <= c.yield_threshold() {
            c.defeat(DefeatCause::Collapsed);
            events.push(DuelEvent::Defeated {
                who: c.actor(),
                cause: DefeatCause::Collapsed,
            });
        }
    }

    for side in [SideId::A, SideId::B] {
        field.side_mut(side).remove_defeated();
    }
    for c in field.combatants_mut() {
        c.reset_round();
    }
}
