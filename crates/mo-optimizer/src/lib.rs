//! # mo-optimizer
//!
//! Search for the best 4-module combinations in a module catalog.
//!
//! A catalog is filtered by category, reduced by a value prefilter, and then
//! searched by an exhaustive bounded enumeration, a randomized greedy search
//! with local improvement, or both concurrently. Results are deduplicated,
//! ranked by canonical score, and returned as [`mo_types::Solution`]s.

mod backend;
mod candidates;
mod config;
mod enumeration;
mod events;
mod greedy;
mod optimizer;
mod prefilter;
mod run;
mod topk;

pub use backend::{CpuBackend, EnumerationBackend, SequentialBackend};
pub use candidates::CandidateSet;
pub use config::OptimizerConfig;
pub use events::{EventKind, EventSink, OptimizerEvent};
pub use greedy::{GreedySettings, TrialOutcome};
pub use optimizer::ModuleOptimizer;
pub use prefilter::{candidate_pool, top_by_value, PlanKind, SearchPlan};
pub use run::{OptimizationReport, OptimizeRequest, StrategyKind, StrategyStats, DEFAULT_TOP_N};
pub use topk::{ScoredCombo, TopK};
