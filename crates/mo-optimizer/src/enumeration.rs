//! Exhaustive enumeration of 4-combinations with bounded top-K retention.
//!
//! The space is split on the first combination slot: every outer index is an
//! independent unit of work scanning all combinations that start with it.
//! Within a unit, slot sums are accumulated level by level in reusable
//! buffers and whole subtrees are skipped once their upper bound falls below
//! the worst combination already retained.

use std::ops::Range;

use crate::candidates::CandidateSet;
use crate::topk::{ScoredCombo, TopK};

/// Work done by a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Complete combinations scored.
    pub scored: u64,
    /// Partial combinations abandoned on their upper bound.
    pub pruned: u64,
}

impl ScanStats {
    pub fn merge(self, other: ScanStats) -> ScanStats {
        ScanStats {
            scored: self.scored + other.scored,
            pruned: self.pruned + other.pruned,
        }
    }
}

/// Per-worker accumulators, allocated once and reused for every combination.
#[derive(Debug, Clone)]
pub struct Workspace {
    first: Vec<i32>,
    second: Vec<i32>,
    third: Vec<i32>,
    gains: Vec<i32>,
    stats: ScanStats,
}

impl Workspace {
    pub fn new(slots: usize) -> Self {
        Self {
            first: vec![0; slots],
            second: vec![0; slots],
            third: vec![0; slots],
            gains: vec![0; slots],
            stats: ScanStats::default(),
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}

#[inline]
fn accumulate(out: &mut [i32], base: &[i32], row: &[i32]) {
    for ((o, b), r) in out.iter_mut().zip(base).zip(row) {
        *o = *b + *r;
    }
}

/// Number of outer indices that start at least one combination.
pub fn outer_len(set: &CandidateSet) -> usize {
    set.len().saturating_sub(3)
}

/// Scan every combination whose smallest index is `first`.
pub fn scan_outer(set: &CandidateSet, first: usize, top: &mut TopK, ws: &mut Workspace) {
    let n = set.len();
    if set.is_infeasible() || first + 3 >= n {
        return;
    }

    ws.first.copy_from_slice(set.row(first));
    let total1 = set.total(first);
    if !top.admits(set.upper_bound(&ws.first, total1, first + 1, 3, &mut ws.gains)) {
        ws.stats.pruned += 1;
        return;
    }

    for second in first + 1..n - 2 {
        accumulate(&mut ws.second, &ws.first, set.row(second));
        let total2 = total1 + set.total(second);
        if !top.admits(set.upper_bound(&ws.second, total2, second + 1, 2, &mut ws.gains)) {
            ws.stats.pruned += 1;
            continue;
        }

        for third in second + 1..n - 1 {
            accumulate(&mut ws.third, &ws.second, set.row(third));
            let total3 = total2 + set.total(third);
            if !top.admits(set.upper_bound(&ws.third, total3, third + 1, 1, &mut ws.gains)) {
                ws.stats.pruned += 1;
                continue;
            }

            for fourth in third + 1..n {
                if !set.meets_requirements_with(&ws.third, fourth) {
                    continue;
                }
                ws.stats.scored += 1;
                let score = set.score_with(&ws.third, total3, fourth);
                if top.admits(score) {
                    top.offer(ScoredCombo {
                        score,
                        indices: [first, second, third, fourth],
                    });
                }
            }
        }
    }
}

/// Enumerate every combination whose first index falls in `outer`.
pub fn enumerate_range(set: &CandidateSet, outer: Range<usize>, max_solutions: usize) -> TopK {
    enumerate_range_with_stats(set, outer, max_solutions).0
}

pub fn enumerate_range_with_stats(
    set: &CandidateSet,
    outer: Range<usize>,
    max_solutions: usize,
) -> (TopK, ScanStats) {
    let mut top = TopK::new(max_solutions);
    let mut ws = Workspace::new(set.slot_count());
    for first in outer {
        scan_outer(set, first, &mut top, &mut ws);
    }
    (top, ws.stats())
}
