//! Bounded best-K retention for scored combinations.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use mo_types::COMBINATION_SIZE;

/// A combination as indices into a candidate set, with its search score.
///
/// Indices are kept ascending. Ordering ranks better combinations greater:
/// higher score first, then the lexicographically smaller index tuple, which
/// is the smaller identity tuple because candidate sets are identity-ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScoredCombo {
    pub score: i32,
    pub indices: [usize; COMBINATION_SIZE],
}

impl ScoredCombo {
    pub fn new(score: i32, mut indices: [usize; COMBINATION_SIZE]) -> Self {
        indices.sort_unstable();
        Self { score, indices }
    }
}

impl Ord for ScoredCombo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.indices.cmp(&self.indices))
    }
}

impl PartialOrd for ScoredCombo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap holding at most `capacity` of the best combinations offered.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<ScoredCombo>>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Worst retained combination, once the heap is full.
    pub fn floor(&self) -> Option<&ScoredCombo> {
        if self.is_full() {
            self.heap.peek().map(|Reverse(worst)| worst)
        } else {
            None
        }
    }

    /// Whether a combination scoring `bound` could still be retained.
    #[inline]
    pub fn admits(&self, bound: i32) -> bool {
        match self.floor() {
            Some(worst) => bound >= worst.score,
            None => self.capacity > 0,
        }
    }

    /// Offer a combination; returns true if it was retained.
    #[inline]
    pub fn offer(&mut self, combo: ScoredCombo) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(combo));
            return true;
        }
        let beats_floor = matches!(self.heap.peek(), Some(Reverse(worst)) if combo > *worst);
        if beats_floor {
            self.heap.pop();
            self.heap.push(Reverse(combo));
        }
        beats_floor
    }

    pub fn merge(mut self, other: TopK) -> TopK {
        for Reverse(combo) in other.heap {
            self.offer(combo);
        }
        self
    }

    /// Retained combinations, best first.
    pub fn into_ranked(self) -> Vec<ScoredCombo> {
        let mut ranked: Vec<ScoredCombo> = self.heap.into_iter().map(|Reverse(c)| c).collect();
        ranked.sort_unstable_by(|a, b| b.cmp(a));
        ranked
    }
}
