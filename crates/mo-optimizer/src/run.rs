//! Request and report types for a single optimization run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use mo_types::{validation_error, AttrId, AttributeWeights, Category, OptResult, Solution};

use crate::prefilter::PlanKind;

/// Default number of solutions returned when a request does not say.
pub const DEFAULT_TOP_N: usize = 40;

/// Everything one optimization call needs besides the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub category: Category,
    pub weights: AttributeWeights,
    /// Drop modules carrying fewer distinct target attributes than this.
    pub min_target_matches: Option<usize>,
    /// Required attribute totals a combination must reach.
    pub min_attr_sums: BTreeMap<AttrId, i32>,
    pub top_n: usize,
    /// Skip the greedy strategy and enumerate the hard-capped catalog.
    pub enumeration_only: bool,
}

impl Default for OptimizeRequest {
    fn default() -> Self {
        Self {
            category: Category::All,
            weights: AttributeWeights::default(),
            min_target_matches: None,
            min_attr_sums: BTreeMap::new(),
            top_n: DEFAULT_TOP_N,
            enumeration_only: false,
        }
    }
}

impl OptimizeRequest {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = AttrId>) -> Self {
        self.weights.target = targets.into_iter().collect();
        self
    }

    pub fn with_excludes(mut self, excludes: impl IntoIterator<Item = AttrId>) -> Self {
        self.weights.exclude = excludes.into_iter().collect();
        self
    }

    pub fn with_min_target_matches(mut self, matches: usize) -> Self {
        self.min_target_matches = Some(matches);
        self
    }

    pub fn with_min_attr_sum(mut self, attr: AttrId, sum: i32) -> Self {
        self.min_attr_sums.insert(attr, sum);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn enumeration_only(mut self) -> Self {
        self.enumeration_only = true;
        self
    }

    pub fn validate(&self) -> OptResult<()> {
        if let Some((attr, sum)) = self.min_attr_sums.iter().find(|(_, sum)| **sum < 0) {
            return Err(validation_error!(
                "minimum sum for attribute {} must not be negative, got {}",
                attr,
                sum
            ));
        }
        Ok(())
    }
}

/// Search strategy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    Enumeration,
    Greedy,
}

/// Timing and yield of one strategy within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub strategy: StrategyKind,
    pub candidates: usize,
    pub solutions: usize,
    /// Backend that produced the result, for enumeration.
    pub backend: Option<String>,
    pub elapsed_ms: u64,
}

/// Full record of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub run_id: Uuid,
    pub category: Category,
    pub plan: Option<PlanKind>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub catalog_size: usize,
    pub filtered_size: usize,
    pub strategies: Vec<StrategyStats>,
    pub solutions: Vec<Solution>,
}

impl OptimizationReport {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn best(&self) -> Option<&Solution> {
        self.solutions.first()
    }
}
