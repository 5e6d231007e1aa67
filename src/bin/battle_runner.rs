//! Headless Battle Runner
//!
//! Loads a scenario, resolves its duel (forecast, Monte Carlo and one
//! replay-checked exchange) and optionally runs the attack search for one
//! side. Prints JSON or text.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tactica::battle::ai::{analyze_targets, load_personality, AiPersonality, AttackAnalysis, AttackContext};
use tactica::battle::TerrainPathfinder;
use tactica::combat::{
    evaluate_battle_stats, forecast, resolve_attack, run_trials, BattleStats, BattleStatsStrings,
    CombatEnv, CombatEventLog, ExchangeReport, ExchangeSummary, Forecast, SeededRolls, Vitals,
};
use tactica::core::types::Side;
use tactica::scenario::Scenario;

/// Headless Battle Runner - combat numbers and AI attack plans for a scenario
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Resolve a scenario's duel and search for attack plans")]
struct Args {
    /// Scenario file (TOML)
    #[arg(long, default_value = "data/scenarios/duel.toml")]
    scenario: PathBuf,

    /// Monte Carlo exchanges for the duel summary
    #[arg(long, default_value_t = 10_000)]
    trials: u32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// AI personality name (loaded from data/ai_personalities/)
    #[arg(long, default_value = "default")]
    personality: String,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Run the attack search
    #[arg(long)]
    search: bool,

    /// Side the search plays; defaults to the scenario's AI side, then 1
    #[arg(long)]
    side: Option<u8>,

    /// Plans to print per search
    #[arg(long, default_value_t = 5)]
    top: usize,
}

#[derive(Serialize)]
struct DuelReport {
    stats: BattleStats,
    strings: BattleStatsStrings,
    forecast: Forecast,
    summary: ExchangeSummary,
    exchange: ExchangeReport,
    events: Vec<String>,
    /// A follower fed the recorded swings reached the same hitpoints
    replay_matches: bool,
}

#[derive(Serialize)]
struct RunReport {
    scenario: String,
    seed: u64,
    duel: Option<DuelReport>,
    plans: Vec<AttackAnalysis>,
}

fn run_duel(scenario: &Scenario, trials: u32, seed: u64) -> Option<DuelReport> {
    let (attacker, defender, weapon) = scenario.duel?;
    let field = &scenario.field;

    let mut strings = BattleStatsStrings::default();
    let stats = evaluate_battle_stats(field, attacker, defender, weapon, Some(&mut strings));
    let a = field.unit(attacker);
    let d = field.unit(defender);
    let forecast = forecast(&stats, a.hitpoints, d.hitpoints);
    let summary = run_trials(
        &stats,
        Vitals {
            hitpoints: a.hitpoints,
            max_hitpoints: a.max_hitpoints,
        },
        Vitals {
            hitpoints: d.hitpoints,
            max_hitpoints: d.max_hitpoints,
        },
        trials,
        &mut SeededRolls::new(seed),
    );

    // Authoritative run
    let mut leader_field = field.clone();
    let mut log = CombatEventLog::new();
    let mut rolls = SeededRolls::new(seed);
    let exchange = {
        let mut env = CombatEnv {
            rolls: &mut rolls,
            hooks: &mut log,
            catalog: &scenario.catalog,
        };
        match resolve_attack(&mut leader_field, attacker, defender, weapon, &mut env, None) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "duel could not start");
                return None;
            }
        }
    };

    // Follower with different local rolls, fed the published results
    let mut follower_field = field.clone();
    let mut follower_rolls = SeededRolls::new(seed.wrapping_add(1));
    let mut follower_hooks = CombatEventLog::new();
    let mut env = CombatEnv {
        rolls: &mut follower_rolls,
        hooks: &mut follower_hooks,
        catalog: &scenario.catalog,
    };
    let results = exchange.results();
    let replay_matches = match resolve_attack(
        &mut follower_field,
        attacker,
        defender,
        weapon,
        &mut env,
        Some(&results),
    ) {
        Ok(replayed) => {
            let hp = |f: &tactica::battle::Battlefield, id| f.units.get(id).map(|u| u.hitpoints);
            info!(desyncs = replayed.desyncs, "follower replay finished");
            hp(&leader_field, attacker) == hp(&follower_field, attacker)
                && hp(&leader_field, defender) == hp(&follower_field, defender)
        }
        Err(_) => false,
    };

    Some(DuelReport {
        stats,
        strings,
        forecast,
        summary,
        exchange,
        events: log.events.iter().map(|e| e.description.clone()).collect(),
        replay_matches,
    })
}

fn run_search(scenario: &mut Scenario, side: Side, personality: &AiPersonality, top: usize) -> Vec<AttackAnalysis> {
    let mut ctx = AttackContext::new(&mut scenario.field, side, personality, &TerrainPathfinder);
    let mut plans = analyze_targets(&mut ctx);
    info!(side = side.0, plans = plans.len(), "attack search done");
    plans.truncate(top);
    plans
}

fn print_text(report: &RunReport) {
    println!("=== {} (seed {}) ===", report.scenario, report.seed);
    if let Some(duel) = &report.duel {
        println!("Attacker:");
        for (label, value) in &duel.strings.attacker {
            println!("  {:<14} {}", label, value);
        }
        println!("Defender:");
        for (label, value) in &duel.strings.defender {
            println!("  {:<14} {}", label, value);
        }
        println!(
            "Forecast: attacker kills {:.1}%, defender kills {:.1}%",
            duel.forecast.attacker_kills * 100.0,
            duel.forecast.defender_kills * 100.0
        );
        println!(
            "Monte Carlo ({} trials): defender takes {:.2}, attacker takes {:.2}, kill rate {:.1}%",
            duel.summary.trials,
            duel.summary.avg_damage_to_defender,
            duel.summary.avg_damage_to_attacker,
            duel.summary.defender_killed * 100.0
        );
        println!("Exchange ended {:?} after {} swings", duel.exchange.end, duel.exchange.swings.len());
        for event in &duel.events {
            println!("  {}", event);
        }
        println!("Replay matches: {}", duel.replay_matches);
    }
    for (i, plan) in report.plans.iter().enumerate() {
        println!(
            "Plan {}: target {} with {} attacker(s), rating {:.3}, kill chance {:.0}%",
            i + 1,
            plan.target,
            plan.movements.len(),
            plan.rating,
            plan.chance_to_kill * 100.0
        );
        for (unit, hex) in &plan.movements {
            println!("    {} -> ({}, {})", unit, hex.q, hex.r);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tactica=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut scenario = match Scenario::load_from_file(&args.scenario) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scenario {:?}: {}", args.scenario, e);
            std::process::exit(1);
        }
    };
    info!(scenario = %scenario.name, units = scenario.field.units.len(), seed, "scenario loaded");

    let duel = run_duel(&scenario, args.trials, seed);

    let plans = if args.search {
        let mut personality = load_personality(&args.personality).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load personality '{}': {}", args.personality, e);
            eprintln!("Using default personality");
            AiPersonality::default()
        });
        if args.seed.is_some() {
            personality.search.seed = seed;
        }
        let side = args
            .side
            .map(Side)
            .or(scenario.ai_side)
            .unwrap_or(Side(1));
        run_search(&mut scenario, side, &personality, args.top)
    } else {
        Vec::new()
    };

    let report = RunReport {
        scenario: scenario.name.clone(),
        seed,
        duel,
        plans,
    };

    match args.format.as_str() {
        "text" => print_text(&report),
        _ => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        },
    }
}
