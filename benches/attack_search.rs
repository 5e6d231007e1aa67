//! Benchmarks for the combat kernel and the attack search.
//!
//! The search is the hot path: every candidate plan runs battle stats and a
//! Monte Carlo exchange per attacker.

use std::hint::black_box;
use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion};
use tactica::battle::ai::{analyze_targets, AiPersonality, AttackContext};
use tactica::battle::TerrainPathfinder;
use tactica::combat::{evaluate_battle_stats, forecast, run_trials, SeededRolls, Vitals};
use tactica::scenario::Scenario;

fn load(name: &str) -> Scenario {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data/scenarios")
        .join(name);
    Scenario::load_from_file(&path).expect("scenario should load")
}

fn bench_battle_stats(c: &mut Criterion) {
    let scenario = load("duel.toml");
    let (attacker, defender, weapon) = scenario.duel.expect("duel scenario");

    c.bench_function("evaluate_battle_stats", |b| {
        b.iter(|| {
            black_box(evaluate_battle_stats(
                black_box(&scenario.field),
                attacker,
                defender,
                weapon,
                None,
            ))
        });
    });

    let stats = evaluate_battle_stats(&scenario.field, attacker, defender, weapon, None);
    c.bench_function("forecast", |b| {
        b.iter(|| black_box(forecast(black_box(&stats), 20, 20)));
    });
}

fn bench_monte_carlo(c: &mut Criterion) {
    let scenario = load("duel.toml");
    let (attacker, defender, weapon) = scenario.duel.expect("duel scenario");
    let stats = evaluate_battle_stats(&scenario.field, attacker, defender, weapon, None);
    let vitals = Vitals {
        hitpoints: 20,
        max_hitpoints: 20,
    };

    c.bench_function("run_trials_1000", |b| {
        let mut rolls = SeededRolls::new(42);
        b.iter(|| black_box(run_trials(&stats, vitals, vitals, 1000, &mut rolls)));
    });
}

fn bench_attack_search(c: &mut Criterion) {
    let scenario = load("ambush.toml");
    let side = scenario.ai_side.expect("ambush has an AI side");
    let personality = AiPersonality::default();

    let mut group = c.benchmark_group("attack_search");
    group.sample_size(20);
    group.bench_function("ambush", |b| {
        b.iter(|| {
            let mut field = scenario.field.clone();
            let mut ctx = AttackContext::new(&mut field, side, &personality, &TerrainPathfinder);
            black_box(analyze_targets(&mut ctx))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_battle_stats, bench_monte_carlo, bench_attack_search);
criterion_main!(benches);
