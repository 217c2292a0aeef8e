use serde::{Deserialize, Serialize};
use std::fmt;

use crate::module::{Module, ModuleId};
use crate::scoring::{attr_breakdown, canonical_score, AttrBreakdown};

/// Number of modules in a combination.
pub const COMBINATION_SIZE: usize = 4;

/// Sorted identity tuple of a combination; the deduplication key.
pub type CombinationKey = [ModuleId; COMBINATION_SIZE];

/// A scored 4-module combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub modules: [Module; COMBINATION_SIZE],
    pub score: f64,
    pub attr_breakdown: AttrBreakdown,
}

impl Solution {
    /// Build a solution, deriving the breakdown from the modules.
    pub fn new(modules: [Module; COMBINATION_SIZE], score: f64) -> Self {
        let attr_breakdown = attr_breakdown(&modules);
        Self {
            modules,
            score,
            attr_breakdown,
        }
    }

    /// Build a solution scored canonically.
    pub fn canonical(modules: [Module; COMBINATION_SIZE]) -> Self {
        let attr_breakdown = attr_breakdown(&modules);
        let score = canonical_score(&attr_breakdown) as f64;
        Self {
            modules,
            score,
            attr_breakdown,
        }
    }

    pub fn key(&self) -> CombinationKey {
        let mut key = [
            self.modules[0].id,
            self.modules[1].id,
            self.modules[2].id,
            self.modules[3].id,
        ];
        key.sort_unstable();
        key
    }

    pub fn total_attr_value(&self) -> i32 {
        self.attr_breakdown.values().sum()
    }

    pub fn canonical_score(&self) -> f64 {
        canonical_score(&self.attr_breakdown) as f64
    }

    /// The same combination with its score recomputed from the raw breakdown.
    pub fn with_canonical_score(self) -> Self {
        let score = self.canonical_score();
        Self { score, ..self }
    }

    /// Renders a ranked report block for display or logging.
    pub fn report(&self, rank: usize) -> SolutionReport<'_> {
        SolutionReport {
            solution: self,
            rank,
        }
    }
}

/// Display adapter produced by [`Solution::report`].
pub struct SolutionReport<'a> {
    solution: &'a Solution,
    rank: usize,
}

impl fmt::Display for SolutionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let solution = self.solution;
        writeln!(f, "=== Rank {} ===", self.rank)?;
        writeln!(f, "Total attribute value: {}", solution.total_attr_value())?;
        writeln!(f, "Score: {:.1}", solution.score)?;
        writeln!(f, "Modules:")?;
        for (i, module) in solution.modules.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, module)?;
        }
        writeln!(f, "Attributes:")?;
        for (name, value) in &solution.attr_breakdown {
            writeln!(f, "  {name}: +{value}")?;
        }
        Ok(())
    }
}
