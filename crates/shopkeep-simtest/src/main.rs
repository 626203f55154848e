//! Shopkeep Headless Simulation Harness
//!
//! Validates the embedded catalog, the default tuning and the order/economy
//! rules, then plays seeded trading days with a greedy shopkeeper.
//! Runs entirely in-process, no rendering and no saved state.
//!
//! Usage:
//!   cargo run -p shopkeep-simtest
//!   cargo run -p shopkeep-simtest -- --verbose --days 5 --seed 7
//!
//! Log output follows `RUST_LOG`; `--verbose` defaults it to `debug`.

use serde::Serialize;
use shopkeep_core::prelude::*;
use shopkeep_logic::catalog::{Category, Item};
use shopkeep_logic::compatibility::{failed_categories, is_compatible};
use shopkeep_logic::constants::BOARD_CAPACITY;
use shopkeep_logic::ledger::{DebtLevel, EconomyLedger, LedgerConfig};
use shopkeep_logic::order::OrderRequirements;
use shopkeep_logic::outcome::{FailRateTable, Odds, Outcome};
use shopkeep_logic::urgency::{UrgencyClock, UrgencyConfig, UrgencyLevel};
use tracing_subscriber::EnvFilter;

/// Simulated frame length for autoplay.
const FRAME: f32 = 0.1;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Args {
    verbose: bool,
    days: u32,
    seed: u64,
}

impl Args {
    fn parse() -> Self {
        let mut args = Args {
            verbose: false,
            days: 3,
            seed: 42,
        };
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--verbose" => args.verbose = true,
                "--days" => match iter.next().and_then(|v| v.parse().ok()) {
                    Some(days) => args.days = days,
                    None => eprintln!("--days expects a number, keeping {}", args.days),
                },
                "--seed" => match iter.next().and_then(|v| v.parse().ok()) {
                    Some(seed) => args.seed = seed,
                    None => eprintln!("--seed expects a number, keeping {}", args.seed),
                },
                other => eprintln!("ignoring unknown argument {}", other),
            }
        }
        args
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    println!("=== Shopkeep Simulation Harness ===\n");

    let catalog = match Catalog::embedded() {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ catalog_parse: {}", e);
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Catalog consistency
    results.extend(validate_catalog(&catalog, args.verbose));

    // 2. Default tuning
    results.extend(validate_config(args.verbose));

    // 3. Fail table and odds
    results.extend(validate_outcomes(args.verbose));

    // 4. Urgency clock
    results.extend(validate_urgency(args.verbose));

    // 5. Ledger settlement
    results.extend(validate_ledger(args.verbose));

    // 6. Autoplay
    results.extend(run_autoplay(&catalog, args.days, args.seed, args.verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
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

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &Catalog, verbose: bool) -> Vec<TestResult> {
    println!("--- Catalog ---");
    let mut results = Vec::new();

    let monsters = catalog.requirements.in_category(Category::Monster).count();
    let conditions = catalog.requirements.in_category(Category::Condition).count();
    let environments = catalog
        .requirements
        .in_category(Category::Environment)
        .count();
    results.push(TestResult {
        name: "catalog_categories_populated".into(),
        passed: monsters > 0 && conditions > 0 && environments > 0,
        detail: format!(
            "{} monsters, {} conditions, {} environments, {} items",
            monsters,
            conditions,
            environments,
            catalog.items.len()
        ),
    });

    // Every monster/condition order can be fully served
    let mut untreatable = Vec::new();
    for monster in catalog.requirements.in_category(Category::Monster) {
        for condition in catalog.requirements.in_category(Category::Condition) {
            let reqs = OrderRequirements::new(monster.id, condition.id, None);
            if !catalog.items.iter().any(|i| is_compatible(i, &reqs)) {
                untreatable.push(format!("{}+{}", monster.name, condition.name));
            }
        }
    }
    results.push(TestResult {
        name: "catalog_pairs_treatable".into(),
        passed: untreatable.is_empty(),
        detail: if untreatable.is_empty() {
            format!("all {} pairs have a correct item", monsters * conditions)
        } else {
            format!("no correct item for {}", untreatable.join(", "))
        },
    });

    // Derived item compatibility agrees with requirement tiers
    let mut mismatches = 0;
    for requirement in catalog.requirements.iter() {
        for item in catalog.items.iter() {
            let listed = item.compatible(requirement.category).contains(&requirement.id);
            if listed != requirement.is_satisfied_by(item.item_type) {
                mismatches += 1;
            }
        }
    }
    results.push(TestResult {
        name: "catalog_compatibility_derived".into(),
        passed: mismatches == 0,
        detail: format!("{} item/requirement mismatches", mismatches),
    });

    let bad_prices: Vec<_> = catalog
        .items
        .iter()
        .filter(|i| !i.price.is_finite() || i.price <= 0.0)
        .map(|i| i.name.as_str())
        .collect();
    results.push(TestResult {
        name: "catalog_positive_prices".into(),
        passed: bad_prices.is_empty(),
        detail: if bad_prices.is_empty() {
            "every item has a positive price".into()
        } else {
            format!("non-positive price: {}", bad_prices.join(", "))
        },
    });

    if verbose {
        for item in catalog.items.iter() {
            println!(
                "  {:>18} ${:>5.2}  monsters {} conditions {} environments {}",
                item.name,
                item.price,
                item.compatible_monsters.len(),
                item.compatible_conditions.len(),
                item.compatible_environments.len()
            );
        }
    }

    results
}

// ── 2. Config ───────────────────────────────────────────────────────────

fn validate_config(_verbose: bool) -> Vec<TestResult> {
    println!("--- Config ---");
    let mut results = Vec::new();
    let config = ShopConfig::default();

    results.push(TestResult {
        name: "config_default_valid".into(),
        passed: config.validate().is_ok(),
        detail: "stock tuning passes validation".into(),
    });

    let roundtrip = config
        .to_json()
        .and_then(|json| ShopConfig::from_json(&json));
    results.push(TestResult {
        name: "config_json_roundtrip".into(),
        passed: matches!(&roundtrip, Ok(c) if *c == config),
        detail: match &roundtrip {
            Ok(_) => "defaults survive JSON".into(),
            Err(e) => format!("roundtrip failed: {}", e),
        },
    });

    let rejected = ShopConfig::from_json(r#"{ "ledger": { "debt_payment_rate": 1.5 } }"#);
    results.push(TestResult {
        name: "config_rejects_bad_rate".into(),
        passed: rejected.is_err(),
        detail: "debt_payment_rate 1.5 is rejected".into(),
    });

    results
}

// ── 3. Outcomes ─────────────────────────────────────────────────────────

fn validate_outcomes(verbose: bool) -> Vec<TestResult> {
    println!("--- Outcomes ---");
    let mut results = Vec::new();
    let table = FailRateTable::default();

    // More correct items never raise the fail rate
    let monotonic = [2usize, 3].iter().all(|&needed| {
        (0..needed).all(|correct| {
            table.base_fail_rate(needed, correct + 1) <= table.base_fail_rate(needed, correct)
        })
    });
    results.push(TestResult {
        name: "outcome_fail_rate_monotonic".into(),
        passed: monotonic,
        detail: "fail rate falls as correct items rise".into(),
    });

    results.push(TestResult {
        name: "outcome_perfect_orders_equal".into(),
        passed: table.base_fail_rate(2, 2) == table.base_fail_rate(3, 3),
        detail: format!(
            "2/2 → {}%, 3/3 → {}%",
            table.base_fail_rate(2, 2),
            table.base_fail_rate(3, 3)
        ),
    });

    // 2 of 3 correct while nervous: 50 + 5
    let odds = Odds::new(table.base_fail_rate(3, 2), 5.0);
    results.push(TestResult {
        name: "outcome_nervous_two_of_three".into(),
        passed: odds.total_fail_rate == 55.0
            && odds.survival_rate == 45.0
            && odds.decide(40.0) == Outcome::Survived
            && odds.decide(50.0) == Outcome::Died,
        detail: format!(
            "fail {}%, survive {}%; roll 40 → {:?}, roll 50 → {:?}",
            odds.total_fail_rate,
            odds.survival_rate,
            odds.decide(40.0),
            odds.decide(50.0)
        ),
    });

    let hopeless = Odds::new(table.base_fail_rate(2, 0), 95.0);
    results.push(TestResult {
        name: "outcome_clamped".into(),
        passed: hopeless.total_fail_rate == 100.0 && hopeless.survival_rate == 0.0,
        detail: format!("100 + 95 clamps to {}%", hopeless.total_fail_rate),
    });

    if verbose {
        for e in &table.entries {
            println!(
                "  {} of {} correct → {}% base fail",
                e.correct, e.items_needed, e.fail_rate
            );
        }
    }

    results
}

// ── 4. Urgency ──────────────────────────────────────────────────────────

fn validate_urgency(verbose: bool) -> Vec<TestResult> {
    println!("--- Urgency ---");
    let mut results = Vec::new();
    let config = UrgencyConfig::default();

    let mut clock = match UrgencyClock::new(50.0) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "urgency_clock".into(),
                passed: false,
                detail: format!("clock rejected 50s: {}", e),
            });
            return results;
        }
    };

    let mut levels = vec![clock.level()];
    let mut ordered = true;
    for _ in 0..120 {
        let level = clock.advance(0.5, &config);
        ordered &= level >= *levels.last().unwrap_or(&UrgencyLevel::Calm);
        if levels.last() != Some(&level) {
            levels.push(level);
        }
    }
    results.push(TestResult {
        name: "urgency_never_decreases".into(),
        passed: ordered,
        detail: format!("{:?}", levels),
    });

    results.push(TestResult {
        name: "urgency_visits_every_level".into(),
        passed: levels == UrgencyLevel::ALL,
        detail: format!("{} distinct levels", levels.len()),
    });

    let penalties: Vec<f32> = UrgencyLevel::ALL.iter().map(|&l| config.penalty(l)).collect();
    results.push(TestResult {
        name: "urgency_penalties_increase".into(),
        passed: penalties.windows(2).all(|w| w[0] <= w[1]),
        detail: format!("{:?}", penalties),
    });

    if verbose {
        println!(
            "  50s clock: {:.1}s elapsed, {:.1}s left",
            clock.elapsed(),
            clock.remaining_seconds()
        );
    }

    results
}

// ── 5. Ledger ───────────────────────────────────────────────────────────

fn validate_ledger(_verbose: bool) -> Vec<TestResult> {
    println!("--- Ledger ---");
    let mut results = Vec::new();

    // 100 earned, 10 items sold: balance 80, pay 20, debt 230, carry 60
    let mut ledger = EconomyLedger::new(LedgerConfig::default());
    ledger.record_delivery(100.0);
    for _ in 0..9 {
        ledger.record_delivery(0.0);
    }
    let summary = ledger.close_day();
    results.push(TestResult {
        name: "ledger_settlement".into(),
        passed: summary.daily_balance == 80.0
            && summary.debt_payment == 20.0
            && summary.debt == 230.0
            && summary.total_money == 60.0
            && summary.result == DayResult::Continue,
        detail: format!(
            "balance {}, paid {}, debt {}, carried {}",
            summary.daily_balance, summary.debt_payment, summary.debt, summary.total_money
        ),
    });

    let tiers = [0.0, 30.0, 90.0, 150.0, 250.0].map(DebtLevel::from_debt);
    results.push(TestResult {
        name: "ledger_debt_tiers".into(),
        passed: tiers
            == [
                DebtLevel::None,
                DebtLevel::LowLow,
                DebtLevel::Low,
                DebtLevel::Medium,
                DebtLevel::High,
            ],
        detail: format!("{:?}", tiers),
    });

    let mut losing = EconomyLedger::new(LedgerConfig::default());
    losing.record_died();
    let lost = losing.close_day();
    results.push(TestResult {
        name: "ledger_negative_total_loses".into(),
        passed: lost.result == DayResult::Lose,
        detail: format!("total {} → {:?}", lost.total_money, lost.result),
    });

    results
}

// ── 6. Autoplay ─────────────────────────────────────────────────────────

/// End-of-run report, printed as JSON in verbose mode.
#[derive(Debug, Serialize)]
struct AutoplayReport {
    seed: u64,
    days: Vec<DaySummary>,
    final_result: Option<DayResult>,
}

/// Item with the fewest failed categories for these requirements.
fn best_item<'a>(items: impl Iterator<Item = &'a Item>, reqs: &OrderRequirements) -> Option<ItemType> {
    items
        .min_by_key(|item| failed_categories(item, reqs).len())
        .map(|item| item.item_type)
}

fn run_autoplay(catalog: &Catalog, days: u32, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Autoplay ({} days, seed {}) ---", days, seed);
    let mut results = Vec::new();
    let mut engine = ShopEngine::new(ShopConfig::default(), catalog.clone(), seed);

    let mut report = AutoplayReport {
        seed,
        days: Vec::new(),
        final_result: None,
    };
    let mut max_occupied = 0;
    let mut engine_errors = Vec::new();

    'days: for _ in 0..days {
        loop {
            engine.update(FRAME);
            max_occupied = max_occupied.max(engine.board().occupied_count());

            for slot in 0..BOARD_CAPACITY {
                let Some(order) = engine.board().get(slot) else {
                    continue;
                };
                if !order.is_active() {
                    continue;
                }
                let reqs = *order.requirements();
                let Some(item) = best_item(engine.catalog().items.iter(), &reqs) else {
                    continue;
                };
                if let Err(e) = engine.deliver(slot, item) {
                    engine_errors.push(e.to_string());
                }
            }

            let day_over = engine
                .drain_events()
                .iter()
                .any(|e| matches!(e, ShopEvent::DayOver { .. }));
            if !day_over {
                continue;
            }

            match engine.close_day() {
                Ok(summary) => {
                    println!(
                        "  day {}: {} saved, {} lost, balance {:.2}, debt {:.2} ({:?})",
                        summary.day,
                        summary.success_count,
                        summary.death_count,
                        summary.daily_balance,
                        summary.debt,
                        summary.result
                    );
                    let result = summary.result;
                    report.days.push(summary);
                    if result != DayResult::Continue {
                        report.final_result = Some(result);
                        break 'days;
                    }
                }
                Err(e) => {
                    engine_errors.push(e.to_string());
                    break 'days;
                }
            }
            if let Err(e) = engine.start_day() {
                engine_errors.push(e.to_string());
                break 'days;
            }
            break;
        }
    }

    results.push(TestResult {
        name: "autoplay_capacity".into(),
        passed: max_occupied <= BOARD_CAPACITY,
        detail: format!("at most {} clients at once", max_occupied),
    });

    results.push(TestResult {
        name: "autoplay_no_engine_errors".into(),
        passed: engine_errors.is_empty(),
        detail: if engine_errors.is_empty() {
            "no rejected actions".into()
        } else {
            engine_errors.join("; ")
        },
    });

    let served: u32 = report.days.iter().map(|d| d.success_count).sum();
    results.push(TestResult {
        name: "autoplay_clients_served".into(),
        passed: served > 0 || days == 0,
        detail: format!("{} clients saved over {} days", served, report.days.len()),
    });

    let debt_ok = report
        .days
        .windows(2)
        .all(|w| w[1].debt <= w[0].debt || w[1].debt_payment == 0.0);
    results.push(TestResult {
        name: "autoplay_debt_only_paid_down".into(),
        passed: debt_ok,
        detail: format!("final debt {:.2}", engine.ledger().debt()),
    });

    if verbose {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => log::warn!("could not encode autoplay report: {}", e),
        }
    }

    results
}
