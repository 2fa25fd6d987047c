//! End-to-end duels through the public API

use duel_core::duel::AttackKind;
use duel_core::engagement::Resolver;
use duel_core::prelude::*;
use duel_core::stats;
use duel_core::Severity;
use std::collections::HashMap;

fn fighter(name: &str) -> Combatant {
    Combatant::new(name, 30)
}

fn new_duel(a: Vec<Combatant>, b: Vec<Combatant>, config: DuelConfig) -> Duel {
    Duel::new(a, b, config, Ruleset::default()).unwrap()
}

fn speed_ties() -> DuelConfig {
    DuelConfig::new(WeaponMode::Live, DuelType::Melee).with_tie_rule(TieRule::SpeedThenSide)
}

#[test]
fn test_max_dice_plain_duel() {
    let report = new_duel(vec![fighter("Aldric")], vec![fighter("Brom")], speed_ties())
        .run(&mut ScriptedDice::max_rolls());

    // first blow is the full 15 from 3d5
    let first = report.events.iter().find_map(|e| match e {
        DuelEvent::Attack { damage, .. } => Some(*damage),
        _ => None,
    });
    assert_eq!(first, Some(15));

    // the loser of each initiative roll never strikes back
    let attackers: Vec<SideId> = report
        .events
        .iter()
        .filter_map(|e| match e {
            DuelEvent::Attack { attacker, .. } => Some(attacker.side),
            _ => None,
        })
        .collect();
    assert_eq!(attackers, vec![SideId::A; 3]);

    assert_eq!(report.outcome, DuelOutcome::SideAWins);
    assert!(report.rounds <= 4);
    assert!(report.events.iter().any(|e| matches!(
        e,
        DuelEvent::Defeated { cause: DefeatCause::Yielded, .. }
    )));
}

#[test]
fn test_max_dice_with_stalemate_ties_draws() {
    let config = DuelConfig::new(WeaponMode::Live, DuelType::Melee).with_max_rounds(8);
    let report = new_duel(vec![fighter("Aldric")], vec![fighter("Brom")], config)
        .run(&mut ScriptedDice::max_rolls());
    assert_eq!(report.outcome, DuelOutcome::Draw);
    assert_eq!(report.rounds, 8);
    assert_eq!(report.count(|e| matches!(e, DuelEvent::Attack { .. })), 0);
}

#[test]
fn test_indomitable_immunity_budget() {
    let ruleset = Ruleset::default();
    let mut c = Combatant::new("Brom", 30)
        .with_perk(PerkKind::Indomitable, 3)
        .with_thresholds(10, 15);
    stats::prepare(&mut c, CombatContext::Melee, &ruleset);
    assert_eq!(c.stats.morale, 95);
    assert_eq!(c.duel.immunity_remaining, 3);
    let fresh = c.stats;

    let mut dice = ScriptedDice::max_rolls();
    let mut events = Vec::new();
    let mut resolver = Resolver::new(&ruleset, WeaponMode::Live, &mut dice, &mut events);
    for _ in 0..3 {
        resolver.apply_injury(&mut c, Severity::Major, 25);
    }
    assert_eq!(c.stats, fresh);

    resolver.apply_injury(&mut c, Severity::Major, 25);
    assert_eq!(c.stats.speed, fresh.speed - 2);
    assert_eq!(c.stats.attack, fresh.attack - 2);
    assert_eq!(c.stats.defense, fresh.defense - 2);
    assert!(c.is_active());
}

#[test]
fn test_mixed_duel_volleys_then_melee() {
    let archer = fighter("Ysolde").with_perk(PerkKind::BowSpecialist, 1);
    let config = DuelConfig::new(WeaponMode::Live, DuelType::Mixed).with_tie_rule(TieRule::SpeedThenSide);
    let mut duel = new_duel(vec![archer], vec![fighter("Brom")], config);
    let mut dice = ScriptedDice::max_rolls();

    let ranged_defense = duel.field().a.members[0].stats.defense;
    duel.step(&mut dice);
    duel.step(&mut dice);
    let phase = duel.step(&mut dice);
    assert_eq!(phase, DuelPhase::Engagement);

    let volleys = duel
        .events()
        .iter()
        .filter(|e| matches!(e, DuelEvent::Attack { kind: AttackKind::Volley, .. }))
        .count();
    assert_eq!(volleys, 2);
    // 15 + 1 Attack, twice
    assert_eq!(duel.field().b.members[0].stats.morale, 18);

    let archer = &duel.field().a.members[0];
    assert_eq!(archer.context, CombatContext::Melee);
    assert_eq!(archer.stats.defense, ranged_defense);
    assert_eq!((archer.stats.speed, archer.stats.attack), (0, 0));

    let report = duel.run(&mut dice);
    assert_eq!(report.outcome, DuelOutcome::SideAWins);
    assert_eq!(report.rounds, 3);
}

#[test]
fn test_lone_fighter_takes_free_attacks() {
    let lone = fighter("Brom")
        .with_perk(PerkKind::Indomitable, 3)
        .with_item("Plate Armour");
    let crowd = (1..=4).map(|i| fighter(&format!("Raider {i}"))).collect();
    let mut duel = new_duel(vec![lone], crowd, speed_ties());
    let mut dice = ScriptedDice::max_rolls();

    duel.step(&mut dice);
    duel.step(&mut dice);
    assert_eq!(duel.round(), 1);

    let free = duel
        .events()
        .iter()
        .filter(|e| matches!(e, DuelEvent::Attack { kind: AttackKind::Free, .. }))
        .count();
    assert_eq!(free, 3);
    assert!(duel.field().a.members[0].is_active());
}

#[test]
fn test_free_attacks_ignore_criticals() {
    let crowd = (1..=4).map(|i| fighter(&format!("Raider {i}"))).collect();
    let mut duel = new_duel(vec![fighter("Brom")], crowd, DuelConfig::default());
    // Brom 2+2; Raider 1 19+19; Raiders 2-4 roll a natural 20 and attack freely.
    // Every later die is a 1: one pick per free attack, 3d5 per blow
    let mut faces = vec![2, 2, 19, 19, 20, 2, 20, 2, 20, 2];
    faces.extend([1; 15]);
    let mut dice = ScriptedDice::from_faces(faces);

    duel.step(&mut dice);
    duel.step(&mut dice);

    let events = duel.events();
    let free = events
        .iter()
        .filter(|e| matches!(e, DuelEvent::Attack { kind: AttackKind::Free, .. }))
        .count();
    assert_eq!(free, 3);
    assert!(!events.iter().any(|e| matches!(e, DuelEvent::CriticalSuccess { .. })));
    assert!(!events.iter().any(|e| matches!(e, DuelEvent::Attack { doubled: true, .. })));

    let brom = &duel.field().a.members[0];
    assert_eq!(brom.stats.morale, 50 - 4 * 3);
    assert_eq!((brom.stats.speed, brom.stats.attack, brom.stats.defense), (0, 0, 0));
    assert_eq!(brom.injuries_taken, 0);
}

#[test]
fn test_both_sides_emptied_is_draw() {
    let raging = fighter("Aldric")
        .with_perk(PerkKind::Berserker, 2)
        .with_thresholds(4, 49);
    let brittle = fighter("Brom").with_thresholds(4, 49);
    let duel = new_duel(vec![raging], vec![brittle], DuelConfig::default());
    // round 1: Brom outranks and breaks Aldric, who rampages for a d3 of 1.
    // Round 2: Aldric outranks and Brom yields; Aldric's rampage then runs out
    let mut dice = ScriptedDice::from_faces([
        2, 2, 10, 10, 1, 1, 1, 1, 10, 10, 2, 2, 1, 1, 1,
    ]);
    let report = duel.run(&mut dice);

    assert_eq!(report.outcome, DuelOutcome::Draw);
    assert_eq!(report.rounds, 2);
    assert_eq!(report.count(|e| matches!(e, DuelEvent::Rampage { .. })), 1);
    let causes: Vec<DefeatCause> = report
        .events
        .iter()
        .filter_map(|e| match e {
            DuelEvent::Defeated { cause, .. } => Some(cause.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(causes, vec![DefeatCause::Yielded, DefeatCause::Collapsed]);
}

#[test]
fn test_seeded_duels_reproduce() {
    let side_a = || {
        vec![
            fighter("Aldric").with_perk(PerkKind::BladeSpecialist, 2),
            fighter("Cass").with_item("Shield"),
        ]
    };
    let side_b = || {
        vec![
            fighter("Brom").with_perk(PerkKind::Berserker, 1),
            fighter("Dara").with_perk(PerkKind::FavoredByFortune, 2),
        ]
    };
    let run = |seed| {
        new_duel(side_a(), side_b(), DuelConfig::default()).run(&mut RngDice::seeded(seed))
    };

    let first = run(42);
    let second = run(42);
    assert_eq!(first, second);
    assert_eq!(first.lines, second.lines);
}

#[test]
fn test_berserker_fires_at_most_once() {
    for seed in 0..40 {
        let a = vec![fighter("Aldric").with_perk(PerkKind::Berserker, 1)];
        let b = vec![
            fighter("Brom").with_perk(PerkKind::Berserker, 1),
            fighter("Cass"),
        ];
        let report = new_duel(a, b, DuelConfig::default()).run(&mut RngDice::seeded(seed));

        let mut fired: HashMap<String, usize> = HashMap::new();
        for event in &report.events {
            if let DuelEvent::SecondWind { who, .. } = event {
                *fired.entry(who.to_string()).or_default() += 1;
            }
        }
        assert!(fired.values().all(|&n| n <= 1), "seed {seed}: {fired:?}");
    }
}

#[test]
fn test_every_duel_terminates_within_cap() {
    for seed in 0..25 {
        let config = DuelConfig::new(WeaponMode::Blunted, DuelType::Ranged).with_max_rounds(30);
        let report = new_duel(
            vec![fighter("Aldric").with_perk(PerkKind::CrossbowSpecialist, 3)],
            vec![fighter("Brom"), fighter("Cass")],
            config,
        )
        .run(&mut RngDice::seeded(seed));
        assert!(report.rounds <= 30);
        assert!(!report
            .events
            .iter()
            .any(|e| matches!(e, DuelEvent::Defeated { cause: DefeatCause::Killed, .. })));
    }
}

#[test]
fn test_roster_file_round_trip_into_duel() {
    let roster = duel_core::Roster::from_toml(
        r#"
[[combatant]]
name = "Aldric"
age = 34
perks = ["Blade Specialist T2", "Born Lucky", "Juggling"]
items = ["Longsword", "Lute"]

[[combatant]]
name = "Cass"
"#,
    )
    .unwrap();
    let foes = [RosterRecord::new("Brom")];
    let report = run_duel(&roster.combatants, &foes, "blunted", "melee", 20, &mut RngDice::seeded(3))
        .unwrap();
    assert!(report.rounds >= 1);
    assert!(matches!(report.events.first(), Some(DuelEvent::DuelStarted { side_a: 2, side_b: 1, .. })));
}
