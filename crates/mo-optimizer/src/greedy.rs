//! Randomized greedy construction followed by first-improvement local search.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashSet;

use mo_types::COMBINATION_SIZE;

use crate::candidates::CandidateSet;
use crate::config::OptimizerConfig;
use crate::topk::ScoredCombo;

/// Probability of taking the single best extension during construction.
pub const GREEDY_BEST_PROBABILITY: f64 = 0.8;
/// Width of the shortlist sampled from otherwise.
pub const GREEDY_SHORTLIST: usize = 3;

/// Settings for one run of the greedy strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreedySettings {
    pub attempts: usize,
    pub local_search_iterations: usize,
    pub local_search_samples: usize,
    pub seed: u64,
}

impl GreedySettings {
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            attempts: config.max_attempts,
            local_search_iterations: config.local_search_iterations,
            local_search_samples: config.local_search_samples,
            seed: config.seed.unwrap_or_else(rand::random),
        }
    }

    fn trial_rng(&self, trial: usize) -> ChaCha8Rng {
        let stream = (trial as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(stream))
    }
}

/// Scores of one trial before and after local search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOutcome {
    pub constructed: ScoredCombo,
    pub improved: ScoredCombo,
}

/// Build one combination: a random seed module, then three greedy extensions.
///
/// Returns `None` when the set holds fewer than four modules.
pub fn construct<R: Rng>(
    set: &CandidateSet,
    rng: &mut R,
    scratch: &mut [i32],
) -> Option<[usize; COMBINATION_SIZE]> {
    let n = set.len();
    if n < COMBINATION_SIZE {
        return None;
    }

    let mut picks = [0usize; COMBINATION_SIZE];
    picks[0] = rng.random_range(0..n);
    let mut scored: Vec<(i32, usize)> = Vec::with_capacity(n);

    for filled in 1..COMBINATION_SIZE {
        scored.clear();
        for candidate in 0..n {
            if picks[..filled].contains(&candidate) {
                continue;
            }
            picks[filled] = candidate;
            scored.push((set.score_picks(&picks[..=filled], scratch), candidate));
        }

        let chosen = if rng.random::<f64>() < GREEDY_BEST_PROBABILITY {
            let mut best = scored[0];
            for entry in &scored[1..] {
                if entry.0 > best.0 {
                    best = *entry;
                }
            }
            best.1
        } else {
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            let shortlist = &scored[..GREEDY_SHORTLIST.min(scored.len())];
            shortlist.choose(rng).map(|entry| entry.1).unwrap_or(scored[0].1)
        };
        picks[filled] = chosen;
    }

    Some(picks)
}

/// Improve a combination by single-slot replacement.
///
/// Each round walks the four slots, testing a random sample of replacements
/// per slot, and takes the first strict improvement. A round without one ends
/// the search once more than half the iterations have run.
pub fn local_search<R: Rng>(
    set: &CandidateSet,
    start: [usize; COMBINATION_SIZE],
    iterations: usize,
    samples: usize,
    rng: &mut R,
    scratch: &mut [i32],
) -> ScoredCombo {
    let n = set.len();
    let mut best = start;
    let mut best_score = set.score_picks(&best, scratch);
    let samples = samples.min(n);

    for iteration in 0..iterations {
        let mut improved = false;

        'slots: for slot in 0..COMBINATION_SIZE {
            for _ in 0..samples {
                let candidate = rng.random_range(0..n);
                if best.contains(&candidate) {
                    continue;
                }
                let mut trial = best;
                trial[slot] = candidate;
                let score = set.score_picks(&trial, scratch);
                if score > best_score {
                    best = trial;
                    best_score = score;
                    improved = true;
                    break 'slots;
                }
            }
        }

        if !improved && iteration > iterations / 2 {
            break;
        }
    }

    ScoredCombo::new(best_score, best)
}

/// Run a single seeded trial.
pub fn run_trial(set: &CandidateSet, settings: &GreedySettings, trial: usize) -> Option<TrialOutcome> {
    let mut rng = settings.trial_rng(trial);
    let mut scratch = set.scratch();
    let picks = construct(set, &mut rng, &mut scratch)?;
    let constructed = ScoredCombo::new(set.score_picks(&picks, &mut scratch), picks);
    let improved = local_search(
        set,
        picks,
        settings.local_search_iterations,
        settings.local_search_samples,
        &mut rng,
        &mut scratch,
    );
    Some(TrialOutcome {
        constructed,
        improved,
    })
}

/// Run every trial in parallel and keep the first result for each distinct
/// module set, in trial order.
pub fn search(set: &CandidateSet, settings: &GreedySettings) -> Vec<ScoredCombo> {
    let outcomes: Vec<Option<TrialOutcome>> = (0..settings.attempts)
        .into_par_iter()
        .map(|trial| run_trial(set, settings, trial))
        .collect();

    let mut seen = HashSet::new();
    outcomes
        .into_iter()
        .flatten()
        .map(|outcome| outcome.improved)
        .filter(|combo| seen.insert(combo.indices))
        .collect()
}
