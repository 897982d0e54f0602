//! GridSim Headless Simulation Harness
//!
//! Runs every scenario in `data/scenarios.json` to completion (or its tick
//! budget) and validates the run-time invariants of the engine.
//! Runs entirely in-process, with no rendering.
//!
//! Usage:
//!   cargo run -p gridsim-simtest
//!   cargo run -p gridsim-simtest -- --verbose
//!   cargo run -p gridsim-simtest -- --ticks 200 --seed 9 --json
//!
//! `--verbose` also prints each metrics stream; `--json` prints each
//! scenario's final metrics record as JSON. Set `RUST_LOG=debug` for
//! per-tick engine logging.

use std::collections::HashMap;

use gridsim_core::config::{ModelConfig, RunConfig};
use gridsim_core::metrics::MetricsRecord;
use gridsim_core::prelude::*;
use gridsim_logic::preference::closing_time;
use gridsim_logic::stats::MateStats;
use serde::Deserialize;

// ── Scenarios ───────────────────────────────────────────────────────────
const SCENARIOS_JSON: &str = include_str!("../../../data/scenarios.json");

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    ticks: u64,
    config: RunConfig,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Options {
    verbose: bool,
    json: bool,
    ticks: Option<u64>,
    seed: Option<u64>,
}

impl Options {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            verbose: args.iter().any(|a| a == "--verbose"),
            json: args.iter().any(|a| a == "--json"),
            ticks: flag_value(&args, "--ticks"),
            seed: flag_value(&args, "--seed"),
        }
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<u64> {
    let i = args.iter().position(|a| a == flag)?;
    match args.get(i + 1).map(|v| v.parse()) {
        Some(Ok(value)) => Some(value),
        _ => {
            log::warn!("ignoring {} without a numeric value", flag);
            None
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::from_args();
    println!("=== GridSim Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Statistics and preference arithmetic
    results.extend(validate_statistics(options.verbose));

    // 2. Scenario runs
    let scenarios: Vec<Scenario> = match serde_json::from_str(SCENARIOS_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "scenarios_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            Vec::new()
        }
    };
    for mut scenario in scenarios {
        if let Some(ticks) = options.ticks {
            scenario.ticks = ticks;
        }
        if let Some(seed) = options.seed {
            scenario.config.seed = seed;
        }
        results.extend(validate_scenario(&scenario, &options));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || options.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Statistics ───────────────────────────────────────────────────────

fn validate_statistics(verbose: bool) -> Vec<TestResult> {
    println!("--- Statistics ---");
    let mut results = Vec::new();

    let mut stats = MateStats::new();
    results.push(TestResult {
        name: "correlation_undefined_without_pairs".into(),
        passed: stats.correlation().is_none(),
        detail: "no pairs → undefined".into(),
    });

    let pairs = [(5.0, 5.0), (3.0, 7.0), (8.0, 2.0), (6.0, 6.0)];
    for (f, m) in pairs {
        stats.record(f, m);
    }
    let reference = reference_pearson(&pairs);
    let reported = stats.correlation();
    results.push(TestResult {
        name: "correlation_matches_reference".into(),
        passed: reported.is_some_and(|r| (r - reference).abs() < 1e-9),
        detail: format!("reported {:?}, reference {:.9}", reported, reference),
    });

    let max_dates = 50;
    let adjusted: Vec<f64> = (0..=max_dates + 1)
        .map(|d| closing_time(0.2, d, max_dates))
        .collect();
    if verbose {
        println!("  correlation {:?} over {} pairs", reported, stats.pairs());
        for (dates, p) in adjusted.iter().enumerate().step_by(10) {
            println!("  closing time p=0.2 after {:>2} dates: {:.4}", dates, p);
        }
    }
    let monotonic = adjusted.windows(2).all(|w| w[1] >= w[0]);
    results.push(TestResult {
        name: "closing_time_monotonic".into(),
        passed: monotonic && adjusted.last() == Some(&1.0),
        detail: format!(
            "p=0.2: {:.4} at 0 dates, {:.4} at {} dates",
            adjusted[0], adjusted[max_dates as usize], max_dates
        ),
    });

    results
}

fn reference_pearson(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len() as f64;
    let mean_f = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_m = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let cov: f64 = pairs.iter().map(|p| (p.0 - mean_f) * (p.1 - mean_m)).sum();
    let var_f: f64 = pairs.iter().map(|p| (p.0 - mean_f).powi(2)).sum();
    let var_m: f64 = pairs.iter().map(|p| (p.1 - mean_m).powi(2)).sum();
    cov / (var_f * var_m).sqrt()
}

// ── 2. Scenario Runs ────────────────────────────────────────────────────

/// Per-tick observations gathered while a scenario runs.
#[derive(Default)]
struct RunLog {
    ticks: u64,
    audit_failures: Vec<String>,
    frozen_counts: Vec<usize>,
    frozen_moved: usize,
    accounting_errors: usize,
}

fn validate_scenario(scenario: &Scenario, options: &Options) -> Vec<TestResult> {
    println!("--- Scenario: {} ---", scenario.name);
    let mut results = Vec::new();
    let name = &scenario.name;

    let errors = scenario.config.validate();
    results.push(TestResult {
        name: format!("{}_config_valid", name),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!("{} agents", scenario.config.model.population())
        } else {
            errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
        },
    });

    let (engine, run_log) = match run_scenario(scenario) {
        Ok(run) => run,
        Err(e) => {
            results.push(TestResult {
                name: format!("{}_run", name),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: format!("{}_grid_schedule_consistent", name),
        passed: run_log.audit_failures.is_empty(),
        detail: match run_log.audit_failures.first() {
            None => format!("audited {} ticks", run_log.ticks),
            Some(first) => format!("{} bad ticks, first: {}", run_log.audit_failures.len(), first),
        },
    });

    let contiguous = engine
        .metrics()
        .iter()
        .enumerate()
        .all(|(i, record)| record.step() == i as u64);
    results.push(TestResult {
        name: format!("{}_metrics_contiguous", name),
        passed: contiguous && engine.metrics().len() as u64 == run_log.ticks,
        detail: format!("{} records for {} ticks", engine.metrics().len(), run_log.ticks),
    });

    let rerun = run_scenario(scenario).map(|(e, _)| e.metrics_tsv());
    results.push(TestResult {
        name: format!("{}_deterministic", name),
        passed: rerun.as_ref().is_ok_and(|tsv| *tsv == engine.metrics_tsv()),
        detail: format!("{} metrics lines compared", engine.metrics().len()),
    });

    match scenario.config.model {
        ModelConfig::Aggregation(_) => {
            let grows = run_log.frozen_counts.windows(2).all(|w| w[1] >= w[0]);
            let last = run_log.frozen_counts.last().copied().unwrap_or(0);
            results.push(TestResult {
                name: format!("{}_frozen_monotonic", name),
                passed: grows && last <= scenario.config.model.population() as usize,
                detail: format!("{} frozen after {} ticks", last, run_log.ticks),
            });
            results.push(TestResult {
                name: format!("{}_frozen_stationary", name),
                passed: run_log.frozen_moved == 0,
                detail: format!("{} frozen agents moved", run_log.frozen_moved),
            });
        }
        ModelConfig::Mating(_) => {
            let stats = engine.mate_stats();
            results.push(TestResult {
                name: format!("{}_pair_accounting", name),
                passed: run_log.accounting_errors == 0,
                detail: format!(
                    "{} pairs, {} agents left, finished={}",
                    stats.pairs(),
                    engine.population(),
                    engine.is_finished()
                ),
            });
            let correlation = stats.correlation();
            results.push(TestResult {
                name: format!("{}_correlation_in_range", name),
                passed: correlation.map_or(stats.pairs() < 2, |r| (-1.0..=1.0).contains(&r)),
                detail: format!("r = {:?}", correlation),
            });
        }
    }

    if options.verbose {
        print!("{}", engine.metrics_tsv());
    }
    if options.json {
        if let Some(record) = engine.metrics().last() {
            match serde_json::to_string(record) {
                Ok(json) => println!("{}", json),
                Err(e) => log::warn!("could not serialize final record: {}", e),
            }
        }
    }

    results
}

fn run_scenario(scenario: &Scenario) -> SimResult<(SimulationEngine, RunLog)> {
    let mut engine = SimulationEngine::start(scenario.config)?;
    let initial = engine.population();
    let mut run_log = RunLog::default();
    let mut frozen_at: HashMap<AgentId, (i32, i32)> = HashMap::new();

    while run_log.ticks < scenario.ticks && !engine.is_finished() {
        engine.tick()?;
        run_log.ticks += 1;

        let violations = engine.context().audit();
        if !violations.is_empty() {
            run_log.audit_failures
                .push(format!("tick {}: {:?}", engine.current_step(), violations));
        }

        match engine.metrics().last() {
            Some(MetricsRecord::Aggregation(a)) => {
                run_log.frozen_counts.push(a.frozen as usize);
                for agent in engine.agents()? {
                    if agent.portrayal == (Portrayal::Aggregate { frozen: true }) {
                        let cell = *frozen_at.entry(agent.id).or_insert((agent.x, agent.y));
                        if cell != (agent.x, agent.y) {
                            run_log.frozen_moved += 1;
                        }
                    }
                }
            }
            Some(MetricsRecord::Mating(m)) => {
                if engine.population() + 2 * m.pairs as usize != initial {
                    run_log.accounting_errors += 1;
                }
            }
            None => {}
        }
    }
    Ok((engine, run_log))
}
