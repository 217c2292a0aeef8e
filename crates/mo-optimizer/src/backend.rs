//! Execution backends for the enumeration strategy.
//!
//! Every backend must return the same retained set for the same candidate
//! set; they differ only in how the outer index range is executed. An
//! accelerated backend (GPU or otherwise) plugs in through the same trait and
//! is never required for a correct result.

use rayon::prelude::*;
use tracing::debug;

use mo_types::OptResult;

use crate::candidates::CandidateSet;
use crate::enumeration::{enumerate_range_with_stats, outer_len, scan_outer, ScanStats, Workspace};
use crate::topk::{ScoredCombo, TopK};

/// Common trait for enumeration executors.
pub trait EnumerationBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Best `max_solutions` combinations of the set, best first.
    fn enumerate(&self, set: &CandidateSet, max_solutions: usize) -> OptResult<Vec<ScoredCombo>>;
}

/// Multi-core backend on the current rayon pool.
///
/// Each worker folds outer indices into a private top-K; the partial
/// results are merged once all workers finish.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl EnumerationBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn enumerate(&self, set: &CandidateSet, max_solutions: usize) -> OptResult<Vec<ScoredCombo>> {
        let slots = set.slot_count();
        let (top, stats) = (0..outer_len(set))
            .into_par_iter()
            .fold(
                || (TopK::new(max_solutions), Workspace::new(slots)),
                |(mut top, mut ws), first| {
                    scan_outer(set, first, &mut top, &mut ws);
                    (top, ws)
                },
            )
            .map(|(top, ws)| (top, ws.stats()))
            .reduce(
                || (TopK::new(max_solutions), ScanStats::default()),
                |(a, a_stats), (b, b_stats)| (a.merge(b), a_stats.merge(b_stats)),
            );
        debug!(
            "Scored {} combinations of {} candidates, pruned {} partial combinations",
            stats.scored,
            set.len(),
            stats.pruned
        );
        Ok(top.into_ranked())
    }
}

/// Single-threaded backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialBackend;

impl EnumerationBackend for SequentialBackend {
    fn name(&self) -> &str {
        "sequential"
    }

    fn enumerate(&self, set: &CandidateSet, max_solutions: usize) -> OptResult<Vec<ScoredCombo>> {
        let (top, stats) = enumerate_range_with_stats(set, 0..outer_len(set), max_solutions);
        debug!(
            "Scored {} combinations of {} candidates, pruned {} partial combinations",
            stats.scored,
            set.len(),
            stats.pruned
        );
        Ok(top.into_ranked())
    }
}
