//! Coordinator: filters the catalog, plans and runs the strategies, and
//! merges their output into a final ranking.

use chrono::Utc;
use crossbeam_channel::Sender;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mo_types::{
    AttrId, AttributeWeights, Category, Module, OptError, OptResult, Solution, COMBINATION_SIZE,
};

use crate::backend::{CpuBackend, EnumerationBackend};
use crate::candidates::CandidateSet;
use crate::config::OptimizerConfig;
use crate::events::{EventKind, EventSink, OptimizerEvent};
use crate::greedy::{self, GreedySettings};
use crate::prefilter::{enumeration_only_plan, filter_by_target_matches, plan, SearchPlan};
use crate::run::{OptimizationReport, OptimizeRequest, StrategyKind, StrategyStats};
use crate::topk::ScoredCombo;

/// Finds the best 4-module combinations in a catalog.
///
/// An optimizer is immutable once built and can serve any number of
/// requests, including concurrently.
pub struct ModuleOptimizer {
    config: OptimizerConfig,
    cpu: CpuBackend,
    accelerator: Option<Arc<dyn EnumerationBackend>>,
    pool: Option<Arc<ThreadPool>>,
    events: EventSink,
}

impl ModuleOptimizer {
    pub fn new(config: OptimizerConfig) -> OptResult<Self> {
        config.validate()?;
        let pool = match config.worker_threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("mo-worker-{i}"))
                    .build()
                    .map_err(|e| OptError::Internal(format!("failed to build worker pool: {e}")))?;
                Some(Arc::new(pool))
            }
            None => None,
        };
        info!(
            "Creating module optimizer (enumeration cap {}, top-K {}, threads {})",
            config.enumeration_cap,
            config.max_solutions,
            config
                .worker_threads
                .map_or_else(|| "auto".to_string(), |t| t.to_string())
        );
        Ok(Self {
            config,
            cpu: CpuBackend,
            accelerator: None,
            pool,
            events: EventSink::default(),
        })
    }

    /// Emit progress events on `tx`.
    pub fn with_event_sink(mut self, tx: Sender<OptimizerEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    /// Try `backend` first for enumeration, falling back to the CPU on error.
    ///
    /// Backends must report failures as `Err`; a panic is not caught and
    /// aborts release builds.
    pub fn with_accelerator(mut self, backend: Arc<dyn EnumerationBackend>) -> Self {
        self.accelerator = Some(backend);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn optimize(&self, modules: &[Module], request: &OptimizeRequest) -> OptResult<Vec<Solution>> {
        Ok(self.optimize_with_report(modules, request)?.solutions)
    }

    pub fn optimize_for(
        &self,
        modules: &[Module],
        category: Category,
        targets: impl IntoIterator<Item = AttrId>,
        excludes: impl IntoIterator<Item = AttrId>,
        top_n: usize,
    ) -> OptResult<Vec<Solution>> {
        let request = OptimizeRequest::new(category)
            .with_targets(targets)
            .with_excludes(excludes)
            .with_top_n(top_n);
        self.optimize(modules, &request)
    }

    /// Exhaustive search only. Catalogs above `enumerate_only_cap` are cut
    /// down to their highest-value modules first.
    pub fn enumerate_only(
        &self,
        modules: &[Module],
        category: Category,
        top_n: usize,
    ) -> OptResult<Vec<Solution>> {
        let request = OptimizeRequest::new(category)
            .with_top_n(top_n)
            .enumeration_only();
        self.optimize(modules, &request)
    }

    pub fn optimize_with_report(
        &self,
        modules: &[Module],
        request: &OptimizeRequest,
    ) -> OptResult<OptimizationReport> {
        request.validate()?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let filtered: Vec<Module> = modules
            .iter()
            .filter(|m| request.category.admits(m.category))
            .cloned()
            .collect();
        info!(
            "Optimizing {} of {} modules for category {}",
            filtered.len(),
            modules.len(),
            request.category
        );
        self.events.emit(
            run_id,
            EventKind::CatalogFiltered {
                category: request.category,
                catalog_size: modules.len(),
                filtered_size: filtered.len(),
            },
        );

        let filtered = match request.min_target_matches {
            Some(min_matches) => {
                let kept = filter_by_target_matches(filtered, &request.weights.target, min_matches);
                debug!("{} modules carry at least {} target attributes", kept.len(), min_matches);
                kept
            }
            None => filtered,
        };

        let mut report = OptimizationReport {
            run_id,
            category: request.category,
            plan: None,
            started_at,
            finished_at: started_at,
            catalog_size: modules.len(),
            filtered_size: filtered.len(),
            strategies: Vec::new(),
            solutions: Vec::new(),
        };

        if filtered.len() < COMBINATION_SIZE {
            warn!(
                "Only {} modules available for category {}, need {}",
                filtered.len(),
                request.category,
                COMBINATION_SIZE
            );
            self.events.emit(
                run_id,
                EventKind::InsufficientModules {
                    category: request.category,
                    available: filtered.len(),
                },
            );
            return Ok(self.complete(report));
        }

        log_unknown_ids(&filtered, &request.weights);

        let search_plan = if request.enumeration_only {
            enumeration_only_plan(filtered, self.config.enumerate_only_cap, &request.weights.target)
        } else {
            plan(filtered, &self.config, &request.weights.target)
        };
        let (enumeration_size, pool_size) = search_plan.sizes();
        info!(
            "Search plan {:?}: {} enumeration candidates, {} greedy candidates",
            search_plan.kind(),
            enumeration_size,
            pool_size
        );
        report.plan = Some(search_plan.kind());
        self.events.emit(
            run_id,
            EventKind::Prefiltered {
                plan: search_plan.kind(),
                enumeration_size,
                pool_size,
            },
        );

        let (solutions, strategies) = self.install(|| self.execute(run_id, search_plan, request))?;
        report.strategies = strategies;
        report.solutions = finalize(solutions, request);
        Ok(self.complete(report))
    }

    fn complete(&self, mut report: OptimizationReport) -> OptimizationReport {
        report.finished_at = Utc::now();
        info!(
            "Optimization finished with {} solutions in {} ms",
            report.solutions.len(),
            report.elapsed_ms()
        );
        self.events.emit(
            report.run_id,
            EventKind::Completed {
                solutions: report.solutions.len(),
            },
        );
        report
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn execute(
        &self,
        run_id: Uuid,
        search_plan: SearchPlan,
        request: &OptimizeRequest,
    ) -> OptResult<(Vec<Solution>, Vec<StrategyStats>)> {
        match search_plan {
            SearchPlan::EnumerationOnly { candidates, .. } => {
                let (solutions, stats) = self.run_enumeration(run_id, candidates, request)?;
                Ok((solutions, vec![stats]))
            }
            SearchPlan::Concurrent { enumeration, pool } => {
                let (enumerated, searched) = rayon::join(
                    || self.run_enumeration(run_id, enumeration, request),
                    || self.run_greedy(run_id, pool, request),
                );
                let (mut solutions, enumeration_stats) = enumerated?;
                let (greedy_solutions, greedy_stats) = searched;
                solutions.extend(greedy_solutions);
                Ok((solutions, vec![enumeration_stats, greedy_stats]))
            }
        }
    }

    fn run_enumeration(
        &self,
        run_id: Uuid,
        candidates: Vec<Module>,
        request: &OptimizeRequest,
    ) -> OptResult<(Vec<Solution>, StrategyStats)> {
        let started = Instant::now();
        let set = CandidateSet::new(candidates, &request.weights, &request.min_attr_sums);
        let (combos, backend) = self.enumerate(run_id, &set)?;
        let solutions: Vec<Solution> = combos.iter().map(|c| set.to_solution(c)).collect();

        let stats = StrategyStats {
            strategy: StrategyKind::Enumeration,
            candidates: set.len(),
            solutions: solutions.len(),
            backend: Some(backend),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.finished(run_id, &stats);
        Ok((solutions, stats))
    }

    fn enumerate(&self, run_id: Uuid, set: &CandidateSet) -> OptResult<(Vec<ScoredCombo>, String)> {
        if let Some(accelerator) = &self.accelerator {
            match accelerator.enumerate(set, self.config.max_solutions) {
                Ok(combos) => return Ok((combos, accelerator.name().to_string())),
                Err(e) => {
                    warn!(
                        "Enumeration backend {} failed, falling back to {}: {}",
                        accelerator.name(),
                        self.cpu.name(),
                        e
                    );
                    self.events.emit(
                        run_id,
                        EventKind::BackendFallback {
                            backend: accelerator.name().to_string(),
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }
        let combos = self.cpu.enumerate(set, self.config.max_solutions)?;
        Ok((combos, self.cpu.name().to_string()))
    }

    fn run_greedy(
        &self,
        run_id: Uuid,
        pool: Vec<Module>,
        request: &OptimizeRequest,
    ) -> (Vec<Solution>, StrategyStats) {
        let started = Instant::now();
        let set = CandidateSet::new(pool, &request.weights, &request.min_attr_sums);
        let settings = GreedySettings::from_config(&self.config);
        let solutions: Vec<Solution> = greedy::search(&set, &settings)
            .iter()
            .map(|c| set.to_solution(c))
            .collect();

        let stats = StrategyStats {
            strategy: StrategyKind::Greedy,
            candidates: set.len(),
            solutions: solutions.len(),
            backend: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.finished(run_id, &stats);
        (solutions, stats)
    }

    fn finished(&self, run_id: Uuid, stats: &StrategyStats) {
        debug!(
            "{:?} strategy produced {} solutions from {} candidates in {} ms",
            stats.strategy, stats.solutions, stats.candidates, stats.elapsed_ms
        );
        self.events.emit(
            run_id,
            EventKind::StrategyFinished {
                strategy: stats.strategy,
                solutions: stats.solutions,
                elapsed_ms: stats.elapsed_ms,
            },
        );
    }
}

fn log_unknown_ids(modules: &[Module], weights: &AttributeWeights) {
    let present: BTreeSet<AttrId> = modules
        .iter()
        .flat_map(|m| m.parts.iter().map(|p| p.id))
        .collect();
    for id in weights.target.iter().chain(&weights.exclude) {
        if !present.contains(id) {
            debug!("Attribute {} matches no candidate module and is ignored", id);
        }
    }
}

fn meets_min_sums(solution: &Solution, min_attr_sums: &BTreeMap<AttrId, i32>) -> bool {
    min_attr_sums.iter().all(|(attr, need)| {
        let sum: i32 = solution.modules.iter().map(|m| m.value_of(*attr)).sum();
        sum >= *need
    })
}

/// Descending score, ascending identity key on ties.
fn rank(solutions: &mut [Solution]) {
    solutions.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.key().cmp(&b.key()))
    });
}

fn finalize(mut solutions: Vec<Solution>, request: &OptimizeRequest) -> Vec<Solution> {
    if !request.min_attr_sums.is_empty() {
        solutions.retain(|s| meets_min_sums(s, &request.min_attr_sums));
    }

    rank(&mut solutions);
    let mut seen = HashSet::new();
    solutions.retain(|s| seen.insert(s.key()));
    solutions.truncate(request.top_n);

    // Search scores group parts by attribute id and may carry weighting;
    // reported scores always come from the name-keyed breakdown.
    let mut solutions: Vec<Solution> = solutions
        .into_iter()
        .map(Solution::with_canonical_score)
        .collect();
    rank(&mut solutions);
    solutions
}
