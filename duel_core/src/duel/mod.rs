//! Round Orchestrator - drives a duel from setup to a result
//!
//! A [`Duel`] moves through `Init -> RangedVolley* -> Engagement* -> Resolved`.
//! Volley rounds only exist for mixed duels. Every round, volley or not,
//! counts against the round cap.

mod bookkeeping;
mod report;

pub use bookkeeping::{close_to_melee, end_of_round, heroic_stand, terrifying_presence};
pub use report::{
    AttackKind, Critical, DuelEvent, DuelOutcome, DuelReport, InjuryOutcome, Phase,
    StalemateReason,
};

use crate::combatant::{Combatant, RosterRecord, Side};
use crate::config::{ConfigError, Ruleset};
use crate::dice::DiceSource;
use crate::engagement::{Battlefield, Pairing, Resolver, TieRule};
use crate::stats;
use crate::types::{DuelType, SideId, WeaponMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Round cap used when none is given
pub const DEFAULT_MAX_ROUNDS: u32 = 50;

/// Errors raised while setting up a duel
///
/// Nothing can fail once the first round starts.
#[derive(Debug, Error)]
pub enum DuelError {
    #[error("{0} has no combatants")]
    EmptyRoster(SideId),

    #[error("Round cap must be at least 1 (got {0})")]
    InvalidRoundCap(u32),

    #[error("Unsupported duel type: {0}")]
    UnsupportedDuelType(String),

    #[error("Unsupported weapon mode: {0}")]
    UnsupportedWeaponMode(String),

    #[error("{side} combatant {index}: {reason}")]
    InvalidRoster {
        side: SideId,
        index: usize,
        reason: String,
    },

    #[error("Invalid ruleset: {0}")]
    Ruleset(#[from] ConfigError),
}

/// Settings for a single duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelConfig {
    pub weapon_mode: WeaponMode,
    pub duel_type: DuelType,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default)]
    pub tie_rule: TieRule,
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

impl Default for DuelConfig {
    fn default() -> Self {
        DuelConfig {
            weapon_mode: WeaponMode::Live,
            duel_type: DuelType::Melee,
            max_rounds: DEFAULT_MAX_ROUNDS,
            tie_rule: TieRule::default(),
        }
    }
}

impl DuelConfig {
    pub fn new(weapon_mode: WeaponMode, duel_type: DuelType) -> Self {
        DuelConfig {
            weapon_mode,
            duel_type,
            ..Default::default()
        }
    }

    /// Parse the weapon mode and duel type from their names
    pub fn parse(weapon_mode: &str, duel_type: &str) -> Result<Self, DuelError> {
        let weapon_mode = weapon_mode
            .parse::<WeaponMode>()
            .map_err(DuelError::UnsupportedWeaponMode)?;
        let duel_type = duel_type
            .parse::<DuelType>()
            .map_err(DuelError::UnsupportedDuelType)?;
        Ok(DuelConfig::new(weapon_mode, duel_type))
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_tie_rule(mut self, tie_rule: TieRule) -> Self {
        self.tie_rule = tie_rule;
        self
    }
}

/// Where a duel currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelPhase {
    Init,
    /// Opening volleys of a mixed duel; `remaining` includes the next one
    RangedVolley { remaining: u32 },
    Engagement,
    Resolved(DuelOutcome),
}

/// A duel in progress
#[derive(Debug, Clone)]
pub struct Duel {
    config: DuelConfig,
    ruleset: Ruleset,
    field: Battlefield,
    phase: DuelPhase,
    round: u32,
    events: Vec<DuelEvent>,
}

impl Duel {
    /// Validate the setup and resolve every combatant's opening stats
    pub fn new(
        side_a: Vec<Combatant>,
        side_b: Vec<Combatant>,
        config: DuelConfig,
        ruleset: Ruleset,
    ) -> Result<Self, DuelError> {
        ruleset.validate()?;
        if config.max_rounds == 0 {
            return Err(DuelError::InvalidRoundCap(config.max_rounds));
        }

        let mut field = Battlefield::new(Side::new(side_a), Side::new(side_b));
        for side in [SideId::A, SideId::B] {
            let roster = field.side_mut(side);
            if roster.is_empty() {
                return Err(DuelError::EmptyRoster(side));
            }
            roster.assign(side);
            for (index, combatant) in roster.members.iter_mut().enumerate() {
                check_combatant(combatant).map_err(|reason| DuelError::InvalidRoster {
                    side,
                    index,
                    reason,
                })?;
                stats::prepare(combatant, config.duel_type.opening_context(side), &ruleset);
            }
        }

        Ok(Duel {
            config,
            ruleset,
            field,
            phase: DuelPhase::Init,
            round: 0,
            events: Vec::new(),
        })
    }

    /// Build both sides from roster records
    pub fn from_records(
        side_a: &[RosterRecord],
        side_b: &[RosterRecord],
        config: DuelConfig,
        ruleset: Ruleset,
    ) -> Result<Self, DuelError> {
        let a = side_a.iter().map(|r| r.to_combatant(&ruleset)).collect();
        let b = side_b.iter().map(|r| r.to_combatant(&ruleset)).collect();
        Duel::new(a, b, config, ruleset)
    }

    pub fn config(&self) -> &DuelConfig {
        &self.config
    }

    pub fn phase(&self) -> DuelPhase {
        self.phase
    }

    /// Rounds played so far
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn field(&self) -> &Battlefield {
        &self.field
    }

    pub fn events(&self) -> &[DuelEvent] {
        &self.events
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, DuelPhase::Resolved(_))
    }

    /// Advance one phase transition or one round
    pub fn step<D: DiceSource>(&mut self, dice: &mut D) -> DuelPhase {
        match self.phase {
            DuelPhase::Init => self.start(),
            DuelPhase::RangedVolley { remaining } => self.volley(dice, remaining),
            DuelPhase::Engagement => self.engagement(dice),
            DuelPhase::Resolved(_) => {}
        }
        self.phase
    }

    /// Play the duel to the end
    pub fn run<D: DiceSource>(mut self, dice: &mut D) -> DuelReport {
        loop {
            if let DuelPhase::Resolved(outcome) = self.step(dice) {
                return DuelReport::new(self.events, outcome, self.round);
            }
        }
    }

    fn start(&mut self) {
        info!(
            weapons = %self.config.weapon_mode,
            duel = %self.config.duel_type,
            side_a = self.field.a.len(),
            side_b = self.field.b.len(),
            "duel started"
        );
        self.events.push(DuelEvent::DuelStarted {
            weapon_mode: self.config.weapon_mode,
            duel_type: self.config.duel_type,
            side_a: self.field.a.len(),
            side_b: self.field.b.len(),
        });

        self.phase = match self.config.duel_type {
            DuelType::Mixed => DuelPhase::RangedVolley {
                remaining: self.volley_count(),
            },
            DuelType::Melee | DuelType::Ranged => DuelPhase::Engagement,
        };
    }

    /// Base volley rounds plus any extension from Side A's marksmen
    fn volley_count(&self) -> u32 {
        let extra = self
            .field
            .a
            .members
            .iter()
            .map(|c| stats::resolve(c, c.context, &self.ruleset).extra_volleys)
            .max()
            .unwrap_or(0);
        self.ruleset.volley_rounds + extra
    }

    fn begin_round(&mut self, phase: Phase) {
        self.round += 1;
        debug!(round = self.round, ?phase, "round started");
        self.events.push(DuelEvent::RoundStarted {
            round: self.round,
            phase,
        });
        heroic_stand(&mut self.field, &self.ruleset, &mut self.events);
        terrifying_presence(&mut self.field, &mut self.events);
    }

    fn volley<D: DiceSource>(&mut self, dice: &mut D, remaining: u32) {
        self.begin_round(Phase::RangedVolley);
        let last = remaining <= 1;

        let mut resolver = Resolver::new(
            &self.ruleset,
            self.config.weapon_mode,
            dice,
            &mut self.events,
        );
        resolver.volley_round(&mut self.field, SideId::A, last);
        end_of_round(&mut self.field, &mut self.events);

        if self.check_victory() {
            return;
        }
        if last {
            close_to_melee(&mut self.field, SideId::A, &self.ruleset, &mut self.events);
            self.phase = DuelPhase::Engagement;
        } else {
            self.phase = DuelPhase::RangedVolley {
                remaining: remaining - 1,
            };
        }
    }

    fn engagement<D: DiceSource>(&mut self, dice: &mut D) {
        self.begin_round(Phase::Engagement);
        let pairing = match self.config.duel_type {
            DuelType::Ranged => Pairing::Threshold(self.ruleset.ranged_hit_threshold),
            DuelType::Melee | DuelType::Mixed => Pairing::Initiative(self.config.tie_rule),
        };

        let mut resolver = Resolver::new(
            &self.ruleset,
            self.config.weapon_mode,
            dice,
            &mut self.events,
        );
        resolver.engagement_round(&mut self.field, self.round, pairing);
        end_of_round(&mut self.field, &mut self.events);
        self.check_victory();
    }

    /// Resolve the duel if a side is wiped out or the cap is hit
    fn check_victory(&mut self) -> bool {
        let a_alive = self.field.a.active_count() > 0;
        let b_alive = self.field.b.active_count() > 0;
        let outcome = match (a_alive, b_alive) {
            (false, false) => DuelOutcome::Draw,
            (true, false) => DuelOutcome::SideAWins,
            (false, true) => DuelOutcome::SideBWins,
            (true, true) if self.round >= self.config.max_rounds => DuelOutcome::Draw,
            (true, true) => return false,
        };

        info!(%outcome, rounds = self.round, "duel resolved");
        self.events.push(DuelEvent::DuelEnded {
            outcome,
            rounds: self.round,
        });
        self.phase = DuelPhase::Resolved(outcome);
        true
    }
}

fn check_combatant(combatant: &Combatant) -> Result<(), String> {
    if combatant.injury_threshold == 0 {
        return Err("injury threshold must be at least 1".to_string());
    }
    if combatant.morale_threshold < 0 {
        return Err(format!(
            "morale threshold cannot be negative (got {})",
            combatant.morale_threshold
        ));
    }
    Ok(())
}

/// Run one duel between two rosters with the canonical ruleset
///
/// Weapon mode and duel type are given by name and rejected before any
/// combatant acts if they are not recognised.
pub fn run_duel<D: DiceSource>(
    roster_a: &[RosterRecord],
    roster_b: &[RosterRecord],
    weapon_mode: &str,
    duel_type: &str,
    max_rounds: u32,
    dice: &mut D,
) -> Result<DuelReport, DuelError> {
    let config = DuelConfig::parse(weapon_mode, duel_type)?.with_max_rounds(max_rounds);
    let duel = Duel::from_records(roster_a, roster_b, config, Ruleset::default())?;
    Ok(duel.run(dice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::perk::PerkKind;
    use crate::types::CombatContext;

    fn fighter(name: &str) -> Combatant {
        Combatant::new(name, 30)
    }

    fn duel(a: Vec<Combatant>, b: Vec<Combatant>, config: DuelConfig) -> Duel {
        Duel::new(a, b, config, Ruleset::default()).unwrap()
    }

    #[test]
    fn test_rejects_empty_roster() {
        let err = Duel::new(vec![], vec![fighter("b")], DuelConfig::default(), Ruleset::default())
            .unwrap_err();
        assert!(matches!(err, DuelError::EmptyRoster(SideId::A)));
        assert_eq!(err.to_string(), "Side A has no combatants");
    }

    #[test]
    fn test_rejects_zero_round_cap() {
        let config = DuelConfig::default().with_max_rounds(0);
        let err = Duel::new(vec![fighter("a")], vec![fighter("b")], config, Ruleset::default())
            .unwrap_err();
        assert!(matches!(err, DuelError::InvalidRoundCap(0)));
    }

    #[test]
    fn test_rejects_unknown_names() {
        assert!(matches!(
            DuelConfig::parse("wooden", "melee"),
            Err(DuelError::UnsupportedWeaponMode(_))
        ));
        assert!(matches!(
            DuelConfig::parse("live", "joust"),
            Err(DuelError::UnsupportedDuelType(_))
        ));
        let config = DuelConfig::parse(" Blunted ", "MIXED").unwrap();
        assert_eq!(config.weapon_mode, WeaponMode::Blunted);
        assert_eq!(config.duel_type, DuelType::Mixed);
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let b = fighter("b").with_thresholds(0, 15);
        let err = Duel::new(vec![fighter("a")], vec![b], DuelConfig::default(), Ruleset::default())
            .unwrap_err();
        assert!(matches!(err, DuelError::InvalidRoster { side: SideId::B, index: 0, .. }));
    }

    #[test]
    fn test_rejects_broken_ruleset() {
        let mut ruleset = Ruleset::default();
        ruleset.base_morale = 0;
        let err = Duel::new(vec![fighter("a")], vec![fighter("b")], DuelConfig::default(), ruleset)
            .unwrap_err();
        assert!(matches!(err, DuelError::Ruleset(_)));
    }

    #[test]
    fn test_opening_contexts() {
        let config = DuelConfig::new(WeaponMode::Live, DuelType::Mixed);
        let d = duel(vec![fighter("a")], vec![fighter("b")], config);
        assert_eq!(d.field().a.members[0].context, CombatContext::Ranged);
        assert_eq!(d.field().b.members[0].context, CombatContext::Melee);
        assert_eq!(d.phase(), DuelPhase::Init);
    }

    #[test]
    fn test_mixed_duel_phases() {
        let config = DuelConfig::new(WeaponMode::Live, DuelType::Mixed);
        let mut d = duel(vec![fighter("a")], vec![fighter("b")], config);
        // volley shots of 2+2 always miss
        let mut dice = ScriptedDice::from_faces([2, 2, 2, 2]);

        assert_eq!(d.step(&mut dice), DuelPhase::RangedVolley { remaining: 2 });
        assert_eq!(d.step(&mut dice), DuelPhase::RangedVolley { remaining: 1 });
        assert_eq!(d.step(&mut dice), DuelPhase::Engagement);
        assert_eq!(d.round(), 2);
        assert_eq!(d.field().a.members[0].context, CombatContext::Melee);
        assert!(d
            .events()
            .iter()
            .any(|e| matches!(e, DuelEvent::ContextSwitch { .. })));
    }

    #[test]
    fn test_marksman_adds_volley() {
        let config = DuelConfig::new(WeaponMode::Live, DuelType::Mixed);
        let archer = fighter("a").with_perk(PerkKind::Marksman, 3);
        let mut d = duel(vec![archer], vec![fighter("b")], config);
        let mut dice = ScriptedDice::max_rolls();
        assert_eq!(d.step(&mut dice), DuelPhase::RangedVolley { remaining: 3 });
    }

    #[test]
    fn test_round_cap_forces_draw() {
        let config = DuelConfig::default().with_max_rounds(3);
        // equal totals every round: all stalemates
        let report = duel(vec![fighter("a")], vec![fighter("b")], config)
            .run(&mut ScriptedDice::from_faces(std::iter::repeat(10).take(12)));
        assert_eq!(report.outcome, DuelOutcome::Draw);
        assert_eq!(report.rounds, 3);
        let stalemates = report.count(|e| matches!(e, DuelEvent::Stalemate { .. }));
        assert_eq!(stalemates, 3);
    }

    #[test]
    fn test_resolved_duel_stays_put() {
        let config = DuelConfig::default().with_max_rounds(1);
        let mut d = duel(vec![fighter("a")], vec![fighter("b")], config);
        let mut dice = ScriptedDice::from_faces([10, 10, 10, 10]);
        d.step(&mut dice);
        let phase = d.step(&mut dice);
        assert_eq!(phase, DuelPhase::Resolved(DuelOutcome::Draw));
        let events = d.events().len();
        assert_eq!(d.step(&mut dice), phase);
        assert_eq!(d.events().len(), events);
    }

    #[test]
    fn test_run_duel_reports_winner() {
        let a = [RosterRecord::new("Aldric")];
        let mut strong = RosterRecord::new("Brom");
        strong.items = vec!["Greatsword".to_string(), "Plate Armour".to_string()];
        let b = [strong];
        // b wins initiative every round and hits for 17; a never outranks b.
        // In round three a drops to -1 and the primary injury roll falls back to 100
        let round = [2, 3, 18, 19, 5, 5, 5];
        let faces: Vec<u32> = round.iter().cycle().take(3 * round.len()).copied().collect();
        let mut dice = ScriptedDice::from_faces(faces);

        let report = run_duel(&a, &b, "live", "melee", 10, &mut dice).unwrap();
        assert_eq!(report.outcome, DuelOutcome::SideBWins);
        assert_eq!(report.rounds, 3);
        assert_eq!(
            report.lines.last().map(String::as_str),
            Some("Result after 3 round(s): Side B wins")
        );
    }

    #[test]
    fn test_run_duel_rejects_bad_mode() {
        let a = [RosterRecord::new("Aldric")];
        let b = [RosterRecord::new("Brom")];
        let mut dice = ScriptedDice::max_rolls();
        assert!(matches!(
            run_duel(&a, &b, "sharp", "melee", 10, &mut dice),
            Err(DuelError::UnsupportedWeaponMode(_))
        ));
    }
}
