use crossbeam_channel::unbounded;
use std::collections::HashSet;

use mo_optimizer::{
    EventKind, ModuleOptimizer, OptimizeRequest, OptimizerConfig, PlanKind, StrategyKind,
};
use mo_types::{
    canonical_score, tier_power, total_power, AttrId, AttributeKind, AttributePart, Category,
    Module, ModuleId, Solution, BASIC_POWER,
};

const ATTRIBUTES: [(AttrId, &str); 8] = [
    (1110, "Strength Boost"),
    (1111, "Agility Boost"),
    (1112, "Intelligence Boost"),
    (1409, "Critical Focus"),
    (1410, "Luck Focus"),
    (1408, "Attack Speed Focus"),
    (2104, "Extreme Life Wave"),
    (2105, "Extreme Damage Stack"),
];

fn module(id: u64, config_id: i32, parts: &[(AttrId, &str, i32)]) -> Module {
    Module::new(
        format!("Module {id}"),
        config_id,
        ModuleId(id),
        4,
        parts
            .iter()
            .map(|(attr, name, value)| AttributePart::new(*attr, *name, *value))
            .collect(),
    )
}

/// Deterministic mixed catalog; each module carries two or three attributes.
fn catalog(n: u64, kinds: usize) -> Vec<Module> {
    (0..n)
        .map(|i| {
            let a = ATTRIBUTES[(i as usize) % kinds];
            let b = ATTRIBUTES[(i as usize * 3 + 1) % kinds];
            let mut parts = vec![(a.0, a.1, 1 + (i * 7 % 10) as i32)];
            if b.0 != a.0 {
                parts.push((b.0, b.1, 1 + (i * 5 % 6) as i32));
            }
            if i % 4 == 0 {
                let c = ATTRIBUTES[(i as usize / 4 + 2) % kinds];
                if c.0 != a.0 && c.0 != b.0 {
                    parts.push((c.0, c.1, 1 + (i % 3) as i32));
                }
            }
            let config_id = [5500101, 5500102, 5500201][(i % 3) as usize];
            module(1000 + i * 7 % 211, config_id, &parts)
        })
        .collect()
}

fn optimizer(config: OptimizerConfig) -> ModuleOptimizer {
    ModuleOptimizer::new(config.with_seed(2024).with_worker_threads(4)).unwrap()
}

fn assert_well_formed(solutions: &[Solution]) {
    let mut keys = HashSet::new();
    for s in solutions {
        let ids: HashSet<ModuleId> = s.modules.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 4, "modules must be distinct: {:?}", s.key());

        for (name, total) in &s.attr_breakdown {
            let expected: i32 = s.modules.iter().map(|m| m.value_named(name)).sum();
            assert_eq!(*total, expected, "breakdown for {name}");
        }

        assert!(keys.insert(s.key()), "duplicate combination {:?}", s.key());
    }
    for pair in solutions.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

fn brute_force_best(modules: &[Module]) -> f64 {
    let n = modules.len();
    let mut best = f64::MIN;
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    let s = Solution::canonical([
                        modules[a].clone(),
                        modules[b].clone(),
                        modules[c].clone(),
                        modules[d].clone(),
                    ]);
                    best = best.max(s.score);
                }
            }
        }
    }
    best
}

#[test]
fn four_strength_fives_score_top_basic_tier() {
    let modules: Vec<Module> = (1..=4)
        .map(|i| module(i, 5500101, &[(1110, "Strength Boost", 5)]))
        .collect();
    let solutions = optimizer(OptimizerConfig::new())
        .optimize(&modules, &OptimizeRequest::new(Category::Attack))
        .unwrap();

    assert_eq!(solutions.len(), 1);
    let best = &solutions[0];
    assert_eq!(best.attr_breakdown.len(), 1);
    assert_eq!(best.attr_breakdown.get("Strength Boost"), Some(&20));
    assert_eq!(best.score, f64::from(BASIC_POWER[6] + total_power(20)));
}

#[test]
fn guardian_catalog_of_three_yields_nothing() {
    let mut modules = catalog(20, 6);
    modules.extend([
        module(9001, 5500301, &[(1307, "Magic Resistance", 6)]),
        module(9002, 5500302, &[(1308, "Physical Resistance", 5)]),
        module(9003, 5500301, &[(1307, "Magic Resistance", 2)]),
    ]);
    let solutions = optimizer(OptimizerConfig::new())
        .optimize_for(&modules, Category::Guardian, Vec::new(), Vec::new(), 10)
        .unwrap();
    assert!(solutions.is_empty());
}

#[test]
fn pool_at_enumeration_cap_skips_greedy() {
    let mut modules: Vec<Module> = (0..20)
        .map(|i| module(i + 1, 5500101, &[(1110, "Strength Boost", 1 + (i % 8) as i32)]))
        .collect();
    modules.extend((20..25).map(|i| module(i + 1, 5500101, &[(1110, "Strength Boost", 0)])));

    let config = OptimizerConfig::new()
        .with_enumeration_cap(20)
        .with_max_solutions(30);
    let report = optimizer(config)
        .optimize_with_report(&modules, &OptimizeRequest::default().with_top_n(100))
        .unwrap();

    assert_eq!(report.plan, Some(PlanKind::EnumeratePool));
    assert_eq!(report.strategies.len(), 1);
    assert_eq!(report.strategies[0].strategy, StrategyKind::Enumeration);
    assert_eq!(report.strategies[0].candidates, 20);
    assert!(!report.solutions.is_empty());
    assert!(report.solutions.len() <= 30);
    assert_well_formed(&report.solutions);
}

#[test]
fn biased_search_returns_canonical_scores() {
    let modules = catalog(14, 6);
    let luck = 1410;
    let optimizer = optimizer(OptimizerConfig::new());

    let biased = optimizer
        .optimize_for(&modules, Category::All, [luck], Vec::new(), 25)
        .unwrap();
    let plain = optimizer
        .optimize_for(&modules, Category::All, Vec::new(), Vec::new(), 25)
        .unwrap();
    assert!(!biased.is_empty());
    assert_well_formed(&biased);

    for s in &biased {
        assert_eq!(s.score, f64::from(canonical_score(&s.attr_breakdown)));
    }

    let luck_power = |s: &Solution| {
        let total: i32 = s.modules.iter().map(|m| m.value_of(luck)).sum();
        tier_power(AttributeKind::Basic, total)
    };
    let biased_best = biased.iter().map(luck_power).max().unwrap();
    assert!(biased_best >= luck_power(&plain[0]));
}

#[test]
fn small_catalog_matches_brute_force() {
    let modules = catalog(12, 5);
    let solutions = optimizer(OptimizerConfig::new())
        .optimize(&modules, &OptimizeRequest::default().with_top_n(10))
        .unwrap();
    assert_eq!(solutions[0].score, brute_force_best(&modules));
    assert_well_formed(&solutions);
}

#[test]
fn concurrent_plan_produces_well_formed_results() {
    let modules = catalog(120, 8);
    let config = OptimizerConfig::new()
        .with_enumeration_cap(16)
        .with_max_solutions(40)
        .with_max_attempts(12)
        .with_local_search(20, 10);

    let (tx, rx) = unbounded();
    let report = optimizer(config)
        .with_event_sink(tx)
        .optimize_with_report(&modules, &OptimizeRequest::default().with_top_n(30))
        .unwrap();

    assert_eq!(report.plan, Some(PlanKind::Concurrent));
    assert_eq!(report.solutions.len(), 30);
    assert_well_formed(&report.solutions);

    let strategies: HashSet<StrategyKind> = report.strategies.iter().map(|s| s.strategy).collect();
    assert!(strategies.contains(&StrategyKind::Enumeration));
    assert!(strategies.contains(&StrategyKind::Greedy));

    let events: Vec<_> = rx.try_iter().collect();
    assert!(events.iter().all(|e| e.run_id == report.run_id));
    assert!(matches!(events.first().map(|e| &e.kind), Some(EventKind::CatalogFiltered { .. })));
    assert!(matches!(
        events.last().map(|e| &e.kind),
        Some(EventKind::Completed { solutions: 30 })
    ));
    let finished = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::StrategyFinished { .. }))
        .count();
    assert_eq!(finished, 2);
}

#[test]
fn seeded_runs_are_reproducible() {
    let modules = catalog(90, 8);
    let config = OptimizerConfig::new()
        .with_enumeration_cap(12)
        .with_max_attempts(8);
    let request = OptimizeRequest::default().with_top_n(20);
    let first = optimizer(config.clone()).optimize(&modules, &request).unwrap();
    let second = optimizer(config).optimize(&modules, &request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn enumerate_only_is_capped_and_exhaustive() {
    let modules = catalog(40, 6);
    let config = OptimizerConfig::new().with_enumerate_only_cap(10);
    let optimizer = optimizer(config);

    let report = optimizer
        .optimize_with_report(
            &modules,
            &OptimizeRequest::new(Category::All).with_top_n(5).enumeration_only(),
        )
        .unwrap();
    assert_eq!(report.plan, Some(PlanKind::EnumerateCapped));
    assert_eq!(report.strategies.len(), 1);
    assert_eq!(report.strategies[0].candidates, 10);

    let solutions = optimizer.enumerate_only(&modules, Category::All, 5).unwrap();
    assert_eq!(solutions.len(), 5);
    assert_eq!(solutions, report.solutions);
    assert_well_formed(&solutions);
}

#[test]
fn category_filter_only_admits_matching_modules() {
    let modules = catalog(30, 6);
    let solutions = optimizer(OptimizerConfig::new())
        .optimize(&modules, &OptimizeRequest::new(Category::Support).with_top_n(15))
        .unwrap();
    assert!(!solutions.is_empty());
    for s in &solutions {
        assert!(s.modules.iter().all(|m| m.category == Category::Support));
    }
}

#[test]
fn match_filter_requires_target_attributes() {
    let modules = catalog(30, 6);
    let targets = [1110, 1409];
    let request = OptimizeRequest::default()
        .with_targets(targets)
        .with_min_target_matches(1)
        .with_top_n(10);
    let solutions = optimizer(OptimizerConfig::new()).optimize(&modules, &request).unwrap();
    assert!(!solutions.is_empty());
    for s in &solutions {
        for m in &s.modules {
            assert!(m.parts.iter().any(|p| targets.contains(&p.id)));
        }
    }
}

#[test]
fn catalog_round_trips_through_json() {
    let modules = catalog(6, 4);
    let json = serde_json::to_string(&modules).unwrap();
    let parsed: Vec<Module> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, modules);
    assert_eq!(parsed[0].category, Category::Attack);
}
