//! Search breadth and depth knobs.

use serde::{Deserialize, Serialize};

use mo_types::{config_error, OptResult, COMBINATION_SIZE};

/// Configuration shared by every optimization request an optimizer serves.
///
/// None of these settings change how a combination is scored; they only
/// bound how much of the combination space is searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Size of the top-K retained by the enumeration strategy.
    pub max_solutions: usize,

    /// Number of independent greedy construction trials.
    pub max_attempts: usize,

    /// Rounds of first-improvement local search per trial.
    pub local_search_iterations: usize,

    /// Replacement candidates sampled per slot in a local search round.
    pub local_search_samples: usize,

    /// Largest candidate set the enumeration strategy is handed during a
    /// regular optimization.
    pub enumeration_cap: usize,

    /// Hard cap applied before a forced enumeration-only run.
    pub enumerate_only_cap: usize,

    /// Worker threads for the CPU backend. `None` uses one per core.
    pub worker_threads: Option<usize>,

    /// Base seed for the randomized strategy. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_solutions: 100,
            max_attempts: 20,
            local_search_iterations: 50,
            local_search_samples: 20,
            enumeration_cap: 150,
            enumerate_only_cap: 500,
            worker_threads: None,
            seed: None,
        }
    }
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_solutions(mut self, n: usize) -> Self {
        self.max_solutions = n;
        self
    }

    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn with_local_search(mut self, iterations: usize, samples: usize) -> Self {
        self.local_search_iterations = iterations;
        self.local_search_samples = samples;
        self
    }

    pub fn with_enumeration_cap(mut self, cap: usize) -> Self {
        self.enumeration_cap = cap;
        self
    }

    pub fn with_enumerate_only_cap(mut self, cap: usize) -> Self {
        self.enumerate_only_cap = cap;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> OptResult<()> {
        if self.max_solutions == 0 {
            return Err(config_error!("max_solutions must be at least 1"));
        }
        if self.enumeration_cap < COMBINATION_SIZE {
            return Err(config_error!(
                "enumeration_cap must be at least {}, got {}",
                COMBINATION_SIZE,
                self.enumeration_cap
            ));
        }
        if self.enumerate_only_cap < COMBINATION_SIZE {
            return Err(config_error!(
                "enumerate_only_cap must be at least {}, got {}",
                COMBINATION_SIZE,
                self.enumerate_only_cap
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(config_error!("worker_threads must be positive when set"));
        }
        Ok(())
    }
}
