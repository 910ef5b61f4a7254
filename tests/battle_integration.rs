//! Battle system integration tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;

use grid_battle::battle::*;
use grid_battle::board::{Position, Team};
use grid_battle::core::{BattleConfig, StartError, UnitId};
use grid_battle::unit::{CombatUnit, SharedUnit, SkillId, UnitRecord, UnitStats};

type Handle = Rc<RefCell<UnitRecord>>;

fn unit(name: &str, hp: i32, stats: UnitStats) -> Handle {
    Rc::new(RefCell::new(UnitRecord::new(name, hp, stats)))
}

fn shared(handle: &Handle) -> SharedUnit {
    handle.clone()
}

fn config(fixed_step: f32) -> BattleConfig {
    BattleConfig {
        fixed_step,
        ..BattleConfig::default()
    }
}

/// Runs the simulator until it goes idle, returning the emitted result
fn run_to_end(sim: &mut BattleSimulator, frame_dt: f32, max_frames: usize) -> Option<BattleResult> {
    for _ in 0..max_frames {
        let log = sim.advance(frame_dt);
        if let Some(result) = log.battle_result() {
            return Some(result.clone());
        }
    }
    None
}

#[test]
fn test_full_battle_on_default_board() {
    let mut sim = BattleSimulator::new(config(0.25)).unwrap();

    let knight = unit("Knight", 40, UnitStats::default());
    sim.place_unit(shared(&knight), Position::new(3, 1), Team::Home)
        .unwrap();

    let goblin = unit("Goblin", 9, UnitStats::default());
    let setup = BattleSetup::new("Forest Road", 60.0).with_enemy(shared(&goblin), Position::new(3, 6));
    sim.start_battle(setup).unwrap();

    let result = run_to_end(&mut sim, 0.25, 1000).unwrap();
    assert_eq!(result.outcome, BattleOutcome::Victory);
    assert_eq!(result.battle_name, "Forest Road");
    assert_eq!(result.stats.enemies_defeated, 1);
    // 9 hp at 3 damage per hit
    assert_eq!(result.stats.damage_dealt, 9);
    assert_eq!(result.reward, Reward { gold: 100, experience: 50 });
    assert_eq!(knight.borrow().experience, 50);

    // Goblin is gone, knight stays where the fight ended
    assert!(!sim.board().contains(goblin.borrow().id));
    assert!(sim.board().contains(knight.borrow().id));
    assert_eq!(sim.state(), BattleState::Idle);
}

#[test]
fn test_units_meet_in_the_middle() {
    let mut sim = BattleSimulator::new(config(0.25)).unwrap();
    let knight = unit("Knight", 100, UnitStats::default());
    let orc = unit("Orc", 100, UnitStats::default());
    sim.place_unit(shared(&knight), Position::new(3, 0), Team::Home)
        .unwrap();
    sim.start_battle(BattleSetup::new("March", 60.0).with_enemy(shared(&orc), Position::new(3, 7)))
        .unwrap();

    // Both close one cell per tick; after three ticks they stand adjacent
    let log = sim.advance(0.75);
    let moves = log
        .iter()
        .filter(|e| matches!(e.event_type, BattleEventType::UnitMoved { .. }))
        .count();
    assert_eq!(moves, 6);
    assert_eq!(log.damage_events().count(), 0);

    let home = &sim.home_roster()[0];
    let away = &sim.away_roster()[0];
    assert_eq!(home.position.manhattan(&away.position), 1);

    // Next tick both are in range and swing
    let log = sim.advance(0.25);
    assert_eq!(log.damage_events().count(), 2);
}

#[test]
fn test_ranged_unit_attacks_without_moving() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let archer = unit(
        "Archer",
        20,
        UnitStats {
            attack_range: 4.0,
            ..UnitStats::default()
        },
    );
    let dummy = unit(
        "Dummy",
        100,
        UnitStats {
            attack_range: 0.0,
            ..UnitStats::default()
        },
    );
    sim.place_unit(shared(&archer), Position::new(3, 2), Team::Home)
        .unwrap();
    sim.start_battle(BattleSetup::new("Range", 60.0).with_enemy(shared(&dummy), Position::new(3, 6)))
        .unwrap();

    let log = sim.advance(0.5);
    let archer_id = archer.borrow().id;
    assert!(log
        .damage_events()
        .any(|(attacker, _, amount)| attacker == archer_id && amount == 3));
    assert_eq!(sim.board().position_of(archer_id), Some(Position::new(3, 2)));
}

#[test]
fn test_stalemate_ends_at_time_limit() {
    // Neither side can chew through the other's hp in five seconds
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let tank = unit("Tank", 10_000, UnitStats::default());
    let brute = unit("Brute", 10_000, UnitStats::default());
    sim.place_unit(shared(&tank), Position::new(3, 3), Team::Home)
        .unwrap();
    let setup = BattleSetup::new("Standoff", 5.0)
        .with_enemy(shared(&brute), Position::new(3, 4))
        .with_rewards(RewardSettings {
            base_gold: 40,
            base_experience: 10,
            multiplier: 1.0,
        });
    sim.start_battle(setup).unwrap();

    let mut result = None;
    let mut frames = 0;
    while result.is_none() && frames < 100 {
        result = sim.advance(0.5).battle_result().cloned();
        frames += 1;
    }

    let result = result.unwrap();
    assert_eq!(frames, 10);
    assert_eq!(result.outcome, BattleOutcome::Draw);
    assert_eq!(result.end_reason, EndReason::TimeLimit);
    assert!(!result.was_force_ended);
    assert_eq!(result.reward, Reward { gold: 20, experience: 5 });
    assert_eq!(result.stats.ticks, 10);
}

/// A unit already at zero hp: it keeps its cell but never acts
fn fallen(name: &str) -> Handle {
    let handle = unit(name, 10, UnitStats::default());
    handle.borrow_mut().hp = 0;
    handle
}

#[test]
fn test_walled_in_units_draw_at_time_limit() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();

    // Each living unit sits in a corner behind two fallen comrades
    let sentry = unit("Sentry", 30, UnitStats::default());
    sim.place_unit(shared(&sentry), Position::new(0, 0), Team::Home)
        .unwrap();
    for (i, pos) in [Position::new(1, 0), Position::new(0, 1)].into_iter().enumerate() {
        sim.place_unit(shared(&fallen(&format!("Fallen {}", i))), pos, Team::Home)
            .unwrap();
    }

    let raider = unit("Raider", 30, UnitStats::default());
    let setup = BattleSetup::new("Rubble", 5.0)
        .with_enemy(shared(&raider), Position::new(6, 7))
        .with_enemy(shared(&fallen("Wreck A")), Position::new(5, 7))
        .with_enemy(shared(&fallen("Wreck B")), Position::new(6, 6));
    sim.start_battle(setup).unwrap();

    let mut moves = 0;
    let mut hits = 0;
    let mut result = None;
    for _ in 0..100 {
        let log = sim.advance(0.5);
        moves += log
            .iter()
            .filter(|e| matches!(e.event_type, BattleEventType::UnitMoved { .. }))
            .count();
        hits += log.damage_events().count();
        result = log.battle_result().cloned();
        if result.is_some() {
            break;
        }
    }

    let result = result.unwrap();
    assert_eq!(result.outcome, BattleOutcome::Draw);
    assert_eq!(result.end_reason, EndReason::TimeLimit);
    assert_eq!(result.duration, 5.0);
    assert_eq!(moves, 0);
    assert_eq!(hits, 0);
    assert_eq!(sentry.borrow().hp, 30);
    assert_eq!(raider.borrow().hp, 30);
    assert_eq!(
        sim.board().position_of(sentry.borrow().id),
        Some(Position::new(0, 0))
    );
}

#[test]
fn test_single_long_frame_cannot_outrun_time_limit() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let knight = unit("Knight", 10_000, UnitStats::default());
    let orc = unit("Orc", 30, UnitStats::default());
    sim.place_unit(shared(&knight), Position::new(3, 3), Team::Home)
        .unwrap();
    sim.start_battle(BattleSetup::new("Hurried", 5.0).with_enemy(shared(&orc), Position::new(3, 4)))
        .unwrap();

    // The orc would fall around ten seconds in
    let result = sim.advance(20.0).battle_result().cloned().unwrap();
    assert_eq!(result.outcome, BattleOutcome::Draw);
    assert_eq!(result.end_reason, EndReason::TimeLimit);
    assert_eq!(result.duration, 5.0);
    assert_eq!(result.stats.ticks, 10);
    assert!(orc.borrow().hp > 0);
    assert_eq!(result.stats.enemies_defeated, 0);
}

#[test]
fn test_escalation_events_fire_once_per_level() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let a = unit("A", 10_000, UnitStats::default());
    let b = unit("B", 10_000, UnitStats::default());
    sim.place_unit(shared(&a), Position::new(0, 3), Team::Home)
        .unwrap();
    let setup = BattleSetup::new("Long", 100.0)
        .with_enemy(shared(&b), Position::new(0, 4))
        .with_escalation(EscalationSettings {
            enabled: true,
            start_time: 2.0,
            interval: 1.0,
            percent_per_level: 50.0,
        });
    sim.start_battle(setup).unwrap();

    let mut levels = Vec::new();
    for _ in 0..10 {
        let log = sim.advance(0.5);
        for event in log.iter() {
            if let BattleEventType::EscalationRaised { level } = event.event_type {
                levels.push(level);
            }
        }
    }
    // Elapsed reaches 5.0: levels 1, 2 and 3 at 3s, 4s and 5s
    assert_eq!(levels, vec![1, 2, 3]);
    assert_eq!(sim.escalation_level(), 3);
}

#[test]
fn test_start_after_finish_runs_a_new_battle() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let hero = unit("Hero", 100, UnitStats { attack: 50.0, ..UnitStats::default() });
    sim.place_unit(shared(&hero), Position::new(3, 3), Team::Home)
        .unwrap();

    for round in 0..3 {
        let rat = unit("Rat", 5, UnitStats::default());
        let setup = BattleSetup::new(format!("Cellar {}", round), 30.0)
            .with_enemy(shared(&rat), Position::new(3, 4));
        sim.start_battle(setup).unwrap();
        let result = run_to_end(&mut sim, 0.5, 100).unwrap();
        assert_eq!(result.outcome, BattleOutcome::Victory);
        assert_eq!(result.battle_name, format!("Cellar {}", round));
    }
    // 150 experience: one level at 100, 50 carried over
    assert_eq!(hero.borrow().level, 2);
    assert_eq!(hero.borrow().experience, 50);
}

#[test]
fn test_no_combatants_keeps_board_untouched() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let wolf = unit("Wolf", 10, UnitStats::default());
    let result = sim.start_battle(BattleSetup::new("Empty camp", 30.0).with_enemy(shared(&wolf), Position::new(2, 5)));

    assert_eq!(result, Err(StartError::NoCombatants { home: 0, away: 1 }));
    assert!(sim.board().is_empty());
    assert_eq!(sim.state(), BattleState::Idle);
}

#[test]
fn test_every_enemy_misplaced_means_no_battle() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let guard = unit("Guard", 10, UnitStats::default());
    sim.place_unit(shared(&guard), Position::new(0, 0), Team::Home)
        .unwrap();

    // Off the board, and on the guard's own cell
    let setup = BattleSetup::new("Phantoms", 30.0)
        .with_enemy(shared(&unit("Ghost", 10, UnitStats::default())), Position::new(9, 9))
        .with_enemy(shared(&unit("Shade", 10, UnitStats::default())), Position::new(0, 0));
    assert_eq!(
        sim.start_battle(setup),
        Err(StartError::NoCombatants { home: 1, away: 0 })
    );
    assert_eq!(sim.board().len(), 1);
}

/// Counts skill cooldown updates per tick
#[derive(Clone, Default)]
struct SkillSpy {
    calls: Rc<Cell<u32>>,
}

impl SkillSystem for SkillSpy {
    fn update_cooldowns(&mut self, unit: &mut CombatUnit, dt: f32) {
        self.calls.set(self.calls.get() + 1);
        CooldownTicker.update_cooldowns(unit, dt);
    }
}

#[test]
fn test_skill_system_ticks_every_combatant() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let spy = SkillSpy::default();
    sim.set_skill_system(spy.clone());

    let a = unit("A", 1000, UnitStats::default());
    let b = unit("B", 1000, UnitStats::default());
    let c = unit("C", 1000, UnitStats::default());
    sim.place_unit(shared(&a), Position::new(0, 0), Team::Home)
        .unwrap();
    sim.place_unit(shared(&b), Position::new(6, 0), Team::Home)
        .unwrap();
    sim.start_battle(BattleSetup::new("Cooldowns", 60.0).with_enemy(shared(&c), Position::new(3, 7)))
        .unwrap();

    sim.advance(1.0);
    // Two ticks, three combatants
    assert_eq!(spy.calls.get(), 6);
}

#[test]
fn test_skill_cooldowns_count_down() {
    let handle: SharedUnit = unit("Mage", 10, UnitStats::default());
    let id = handle.borrow().id();
    let mut combatant = CombatUnit::new(id, handle, Team::Home, Position::new(0, 0));
    let fireball: SkillId = 1;
    combatant.set_skill_cooldown(fireball, 1.0);

    let mut ticker = CooldownTicker;
    ticker.update_cooldowns(&mut combatant, 0.75);
    assert_eq!(combatant.skill_cooldown(fireball), 0.25);
    ticker.update_cooldowns(&mut combatant, 0.75);
    assert_eq!(combatant.skill_cooldown(fireball), 0.0);
}

#[test]
fn test_subscriber_and_returned_log_agree() {
    let mut sim = BattleSimulator::new(config(0.5)).unwrap();
    let heard = Rc::new(RefCell::new(Vec::new()));
    let sink = heard.clone();
    let sub = sim.subscribe(move |event: &BattleEvent| sink.borrow_mut().push(event.clone()));

    let a = unit("A", 20, UnitStats::default());
    let b = unit("B", 20, UnitStats::default());
    sim.place_unit(shared(&a), Position::new(2, 3), Team::Home)
        .unwrap();
    sim.start_battle(BattleSetup::new("Echo", 60.0).with_enemy(shared(&b), Position::new(2, 4)))
        .unwrap();

    let mut collected = sim.drain_events().events;
    collected.extend(sim.advance(2.0).events);
    assert_eq!(heard.borrow().as_slice(), collected.as_slice());

    assert!(sim.unsubscribe(sub));
    let before = heard.borrow().len();
    sim.advance(1.0);
    assert_eq!(heard.borrow().len(), before);
}

fn team_strategy(max: usize) -> impl Strategy<Value = Vec<(i32, u8, u8)>> {
    // (hp, attack, range) per unit
    prop::collection::vec((5i32..60, 1u8..12, 1u8..4), 1..=max)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Battles always terminate, and never put two units in one cell
    #[test]
    fn prop_battle_terminates_consistently(
        home in team_strategy(6),
        away in team_strategy(6),
        frame in prop::sample::select(vec![0.05f32, 0.1, 0.25, 0.5, 1.0]),
    ) {
        let mut sim = BattleSimulator::new(BattleConfig::default()).unwrap();
        let mut ids: Vec<UnitId> = Vec::new();

        for (i, (hp, attack, range)) in home.iter().enumerate() {
            let stats = UnitStats { attack: *attack as f32, attack_range: *range as f32, ..UnitStats::default() };
            let handle = unit("H", *hp, stats);
            ids.push(handle.borrow().id);
            sim.place_unit(shared(&handle), Position::new(i as i32, 0), Team::Home).unwrap();
        }

        let mut setup = BattleSetup::new("Random", 20.0);
        for (i, (hp, attack, range)) in away.iter().enumerate() {
            let stats = UnitStats { attack: *attack as f32, attack_range: *range as f32, ..UnitStats::default() };
            let handle = unit("A", *hp, stats);
            ids.push(handle.borrow().id);
            setup = setup.with_enemy(shared(&handle), Position::new(i as i32, 7));
        }
        sim.start_battle(setup).unwrap();

        let mut finished = None;
        for _ in 0..((25.0 / frame) as usize) {
            let log = sim.advance(frame);

            let board = sim.board();
            let positions: Vec<Position> = ids.iter().filter_map(|id| board.position_of(*id)).collect();
            for (i, a) in positions.iter().enumerate() {
                prop_assert!(!positions[i + 1..].contains(a));
                prop_assert_eq!(board.unit_at(*a).and_then(|id| board.position_of(id)), Some(*a));
            }

            if let Some(result) = log.battle_result() {
                finished = Some(result.clone());
                break;
            }
        }

        let result = finished.expect("battle should end by its time limit");
        prop_assert!(result.duration <= 20.0 + frame);
        prop_assert_eq!(sim.state(), BattleState::Idle);
        if result.end_reason == EndReason::TimeLimit {
            prop_assert_eq!(result.outcome, BattleOutcome::Draw);
        }
    }

    /// Escalation never goes down, whatever the frame sizes
    #[test]
    fn prop_escalation_is_monotonic(
        frames in prop::collection::vec(0.0f32..3.0, 1..80),
        start in 0.0f32..10.0,
        interval in 0.5f32..5.0,
    ) {
        let mut escalation = Escalation::new(EscalationSettings {
            enabled: true,
            start_time: start,
            interval,
            percent_per_level: 5.0,
        });

        let mut elapsed = 0.0f32;
        let mut last = 0;
        for dt in frames {
            elapsed += dt;
            if let Some(level) = escalation.update(elapsed) {
                prop_assert!(level > last);
            }
            prop_assert!(escalation.level() >= last);
            last = escalation.level();
            prop_assert!(escalation.multiplier() >= 1.0);
        }
    }
}
