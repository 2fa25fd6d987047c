//! Critical consequences and the injury pipeline

use super::Resolver;
use crate::combatant::{Actor, Combatant, DefeatCause};
use crate::dice::DiceSource;
use crate::duel::{DuelEvent, InjuryOutcome};
use crate::injury::{InjuryEffect, Severity};
use crate::perk::PerkKind;
use tracing::debug;

const MAJOR_INJURY_MALUS: i32 = 2;
const BLOODLUST_BONUS: i32 = 2;

impl<D: DiceSource> Resolver<'_, D> {
    /// Attacker rolled a critical success: the defender's best stat takes the
    /// crit malus, then the defender rolls a secondary injury
    pub fn critical_success(&mut self, attacker: &Actor, defender: &mut Combatant) {
        let mut malus = self.ruleset.crit_malus;
        if defender.perks.has_tier(PerkKind::FavoredByFortune, 2) {
            malus /= 2;
        }
        let stat = defender.stats.highest_stat();
        *defender.stats.get_mut(stat) -= malus;
        self.events.push(DuelEvent::CriticalSuccess {
            attacker: attacker.clone(),
            defender: defender.actor(),
            stat,
            malus,
        });
        self.secondary_injury(defender);
    }

    /// A fumble turns the crit pipeline on the roller, unmitigated
    pub fn critical_failure(&mut self, combatant: &mut Combatant) {
        let malus = self.ruleset.crit_malus;
        let stat = combatant.stats.highest_stat();
        *combatant.stats.get_mut(stat) -= malus;
        self.events.push(DuelEvent::CriticalFailure {
            who: combatant.actor(),
            stat,
            malus,
        });
        self.secondary_injury(combatant);
    }

    /// Roll on the secondary table, allowing one Shield Specialist T3 reroll
    /// per round on a Major or Critical result
    pub fn secondary_injury(&mut self, target: &mut Combatant) {
        let mut injury = self.ruleset.injuries.secondary_injury(self.mode, self.dice);
        let serious = matches!(injury.severity, Severity::Major | Severity::Critical);
        if serious
            && target.perks.has_tier(PerkKind::ShieldSpecialist, 3)
            && !target.round.shield_reroll_used
        {
            target.round.shield_reroll_used = true;
            self.events.push(DuelEvent::ShieldReroll {
                who: target.actor(),
                discarded: injury.severity,
            });
            injury = self.ruleset.injuries.secondary_injury(self.mode, self.dice);
        }
        self.apply_injury(target, injury.severity, injury.roll);
    }

    /// Apply an injury severity to a combatant
    pub fn apply_injury(&mut self, target: &mut Combatant, severity: Severity, roll: u32) {
        let graceful = target.perks.has(PerkKind::AgeingWithGrace);

        let outcome = match severity {
            Severity::Death => {
                target.stats = InjuryEffect::Death.apply(target.stats);
                target.defeat(DefeatCause::Killed);
                InjuryOutcome::Death
            }
            Severity::Critical => {
                target.injuries_taken += 1;
                let detail = self.ruleset.critical_injuries.roll_detail(self.dice);
                target.stats = detail.effect.apply(target.stats);
                if detail.effect == InjuryEffect::Death {
                    target.defeat(DefeatCause::Killed);
                } else {
                    target.defeat(DefeatCause::CriticalInjury {
                        injury: detail.name.clone(),
                    });
                }
                InjuryOutcome::Critical {
                    injury: detail.name,
                }
            }
            Severity::Major => {
                target.injuries_taken += 1;
                target.duel.major_injuries_taken += 1;
                if target.duel.immunity_remaining > 0 {
                    target.duel.immunity_remaining -= 1;
                    InjuryOutcome::Immune {
                        remaining: target.duel.immunity_remaining,
                    }
                } else {
                    let amount = if graceful {
                        MAJOR_INJURY_MALUS / 2
                    } else {
                        MAJOR_INJURY_MALUS
                    };
                    target.stats.shift_all(-amount);
                    InjuryOutcome::AllStatsMalus { amount }
                }
            }
            Severity::Minor => {
                target.injuries_taken += 1;
                if target.perks.has(PerkKind::Bloodlust) && !target.duel.bloodlust_triggered {
                    target.duel.bloodlust_triggered = true;
                    target.stats.speed += BLOODLUST_BONUS;
                    target.stats.attack += BLOODLUST_BONUS;
                    InjuryOutcome::Bloodlust
                } else if graceful {
                    InjuryOutcome::ShruggedOff
                } else {
                    let stat = target.stats.highest_stat();
                    *target.stats.get_mut(stat) -= 1;
                    InjuryOutcome::StatMalus { stat, amount: 1 }
                }
            }
        };

        debug!(combatant = %target.name, %severity, roll, "injury applied");
        self.events.push(DuelEvent::Injury {
            who: target.actor(),
            severity,
            roll,
            outcome,
        });

        if let Some(cause) = target.defeat.clone() {
            self.events.push(DuelEvent::Defeated {
                who: target.actor(),
                cause,
            });
        } else {
            self.check_injury_limit(target);
        }
    }

    /// Withdraw a combatant who has taken as many injuries as they can bear
    pub fn check_injury_limit(&mut self, target: &mut Combatant) -> bool {
        if target.is_active() && target.injuries_taken >= target.injury_threshold {
            target.defeat(DefeatCause::Overwhelmed);
            self.events.push(DuelEvent::Defeated {
                who: target.actor(),
                cause: DefeatCause::Overwhelmed,
            });
            return true;
        }
        false
    }

    /// Primary injury rolled for the record when Morale hits zero
    pub fn record_primary_injury(&mut self, target: &Combatant) -> Severity {
        let injury = self.ruleset.injuries.primary_injury(self.mode, self.dice);
        self.events.push(DuelEvent::Injury {
            who: target.actor(),
            severity: injury.severity,
            roll: injury.roll,
            outcome: InjuryOutcome::Recorded,
        });
        injury.severity
    }
}
