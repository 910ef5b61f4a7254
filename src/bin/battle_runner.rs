//! Headless Battle Runner
//!
//! Loads a scenario (or rolls a seeded skirmish), runs the battle with a
//! fixed frame delta and prints the result.

use std::path::{Path, PathBuf};

use clap::Parser;
use grid_battle::battle::{
    BattleResult, BattleSetup, BattleSimulator, BattleState, CooldownTicker, EscalationSettings,
    RewardLedger, RewardSettings,
};
use grid_battle::board::{Position, Team};
use grid_battle::core::{BattleConfig, ConfigError};
use grid_battle::unit::{share, StatKind, UnitRecord, UnitStats};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Headless Battle Runner - run one auto-battle to completion
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run a grid auto-battle and print the result")]
struct Args {
    /// Scenario file (TOML). Without one a random skirmish is generated
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Seconds fed to the simulator per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_dt: f32,

    /// Wall-clock seconds before the run is force-ended
    #[arg(long, default_value_t = 300.0)]
    max_seconds: f32,

    /// Random seed for generated skirmishes
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every battle event to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// One unit and the cell it starts on
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Deployment {
    x: i32,
    y: i32,
    unit: UnitRecord,
}

/// The encounter half of a scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Encounter {
    name: String,
    time_limit: f32,
    #[serde(default)]
    escalation: EscalationSettings,
    #[serde(default)]
    rewards: RewardSettings,
}

/// Scenario file layout
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scenario {
    #[serde(default)]
    config: BattleConfig,
    battle: Encounter,
    #[serde(default)]
    home: Vec<Deployment>,
    #[serde(default)]
    enemies: Vec<Deployment>,
}

impl Scenario {
    fn parse(content: &str) -> Result<Self, ConfigError> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Random skirmish: a few units per side, anywhere in their own zone
    fn skirmish(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let config = BattleConfig::default();
        let board = config.board;

        let mut deploy = |team: Team, prefix: &str| -> Vec<Deployment> {
            let rows = match team {
                Team::Home => 0..board.home_rows,
                Team::Away => board.home_rows..board.height,
            };
            let mut cells: Vec<(i32, i32)> = rows
                .flat_map(|y| (0..board.width).map(move |x| (x, y)))
                .collect();
            cells.shuffle(&mut rng);

            let count = rng.gen_range(2..=5);
            cells
                .into_iter()
                .take(count)
                .enumerate()
                .map(|(i, (x, y))| {
                    let stats = UnitStats {
                        attack: rng.gen_range(4..=9) as f32,
                        defense: rng.gen_range(1..=4) as f32,
                        attack_speed: rng.gen_range(0.6..1.6),
                        attack_range: if rng.gen_bool(0.25) { 3.0 } else { 1.0 },
                    };
                    let hp = rng.gen_range(20..=40);
                    Deployment {
                        x,
                        y,
                        unit: UnitRecord::new(format!("{} {}", prefix, i + 1), hp, stats),
                    }
                })
                .collect()
        };

        let home = deploy(Team::Home, "Guard");
        let enemies = deploy(Team::Away, "Raider");

        Self {
            config,
            battle: Encounter {
                name: format!("Skirmish #{}", seed),
                time_limit: 90.0,
                escalation: EscalationSettings {
                    enabled: true,
                    ..EscalationSettings::default()
                },
                rewards: RewardSettings::default(),
            },
            home,
            enemies,
        }
    }
}

/// Ledger that just keeps a running total
#[derive(Debug, Default)]
struct Treasury {
    gold: u32,
}

impl RewardLedger for Treasury {
    fn add_currency(&mut self, amount: u32, reason: &str) {
        self.gold = self.gold.saturating_add(amount);
        tracing::info!(amount, reason, total = self.gold, "gold credited");
    }
}

/// Surviving unit summary for the report
#[derive(Debug, Serialize)]
struct Survivor {
    name: String,
    team: Team,
    hp: i32,
    max_hp: i32,
    position: Position,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct Report {
    scenario: String,
    seed: Option<u64>,
    frames: u64,
    events: usize,
    result: Option<BattleResult>,
    survivors: Vec<Survivor>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let (scenario, seed) = match &args.scenario {
        Some(path) => (Scenario::load(path)?, None),
        None => {
            let seed = args.seed.unwrap_or_else(rand::random);
            (Scenario::skirmish(seed), Some(seed))
        }
    };

    let mut sim = BattleSimulator::new(scenario.config.clone())?;
    sim.set_reward_ledger(Treasury::default());
    sim.set_skill_system(CooldownTicker);

    for deployment in &scenario.home {
        let unit = deployment.unit.clone().normalized();
        let name = unit.name.clone();
        let position = Position::new(deployment.x, deployment.y);
        if let Err(err) = sim.place_unit(share(unit), position, Team::Home) {
            tracing::warn!(unit = %name, "home unit not placed at {}: {}", position, err);
        }
    }

    let mut setup = BattleSetup::new(scenario.battle.name.clone(), scenario.battle.time_limit)
        .with_escalation(scenario.battle.escalation)
        .with_rewards(scenario.battle.rewards);
    for deployment in &scenario.enemies {
        let unit = deployment.unit.clone().normalized();
        setup = setup.with_enemy(share(unit), Position::new(deployment.x, deployment.y));
    }

    sim.start_battle(setup)?;
    if args.verbose {
        eprintln!("=== Battle Started: {} ===", scenario.battle.name);
        print_roster(&sim);
        print_events(&sim.drain_events());
    }

    let frame_dt = if args.frame_dt > 0.0 { args.frame_dt } else { 1.0 / 60.0 };
    let mut frames = 0u64;
    let mut events = 0usize;
    let mut result = None;

    // Run battle loop
    while sim.state() == BattleState::InProgress {
        if frames as f32 * frame_dt >= args.max_seconds {
            tracing::warn!(frames, "run exceeded max_seconds; forcing the battle to end");
            result = sim.force_end_battle();
            events += sim.drain_events().len();
            break;
        }

        let log = sim.advance(frame_dt);
        frames += 1;
        events += log.len();
        if args.verbose {
            print_events(&log);
        }
        if let Some(r) = log.battle_result() {
            result = Some(r.clone());
        }
    }

    let survivors = survivors(&sim);
    let report = Report {
        scenario: scenario.battle.name.clone(),
        seed,
        frames,
        events,
        result,
        survivors,
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_text(&report),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Living units left on the board once the battle is over
fn survivors(sim: &BattleSimulator) -> Vec<Survivor> {
    let board = sim.board();
    board
        .occupants()
        .filter_map(|(id, position, team)| {
            let handle = board.unit_handle(id)?;
            let unit = handle.try_borrow().ok()?;
            if !unit.is_alive() {
                return None;
            }
            Some(Survivor {
                name: unit.name().to_string(),
                team,
                hp: unit.hp(),
                max_hp: unit.max_hp(),
                position,
            })
        })
        .collect()
}

fn print_roster(sim: &BattleSimulator) {
    for unit in sim.home_roster().iter().chain(sim.away_roster()) {
        let attack = unit.stat(StatKind::Attack).unwrap_or_default();
        eprintln!(
            "  {:?} {} at {} attack={:.0}",
            unit.team,
            unit.display_name(),
            unit.position,
            attack
        );
    }
}

fn print_events(log: &grid_battle::battle::BattleEventLog) {
    for event in log.iter() {
        eprintln!("  [{}] {}", event.tick, event.description);
    }
}

fn print_text(report: &Report) {
    println!("Battle Result");
    println!("=============");
    println!("Scenario: {}", report.scenario);
    if let Some(seed) = report.seed {
        println!("Seed: {}", seed);
    }
    match &report.result {
        Some(result) => {
            println!("Outcome: {:?} ({:?})", result.outcome, result.end_reason);
            println!("Duration: {:.1}s over {} ticks", result.duration, result.stats.ticks);
            println!("Damage dealt: {}", result.stats.damage_dealt);
            println!("Damage taken: {}", result.stats.damage_taken);
            println!("Enemies defeated: {}", result.stats.enemies_defeated);
            println!("Allies lost: {}", result.stats.allies_lost);
            println!(
                "Reward: {} gold, {} experience",
                result.reward.gold, result.reward.experience
            );
        }
        None => println!("Outcome: none"),
    }
    println!();
    println!("Frames: {}, events: {}", report.frames, report.events);
    for survivor in &report.survivors {
        println!(
            "  {:?} {} at {} ({}/{} hp)",
            survivor.team, survivor.name, survivor.position, survivor.hp, survivor.max_hp
        );
    }
}
