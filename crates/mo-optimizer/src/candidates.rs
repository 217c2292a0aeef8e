//! Dense, read-only view of a candidate module list used by the search loops.
//!
//! Each distinct attribute id in the set is assigned a slot. Every module is
//! stored as a row of per-slot values, and each slot carries a precomputed
//! weighted power lookup, so scoring a combination is a handful of additions
//! and table reads with no allocation.

use std::collections::{BTreeMap, HashMap};

use mo_types::{
    total_power, total_power_upper_bound, tier_power, AttrId, AttributeKind, AttributeWeights,
    Module, Solution, COMBINATION_SIZE, THRESHOLDS,
};

use crate::topk::ScoredCombo;

/// Attribute totals at or above this value all sit in the top tier.
const VALUE_CAP: i32 = THRESHOLDS[THRESHOLDS.len() - 1];
const LUT_STRIDE: usize = VALUE_CAP as usize + 1;

/// Immutable candidate list plus its dense scoring tables.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    modules: Vec<Module>,
    slot_ids: Vec<AttrId>,
    rows: Vec<i32>,
    totals: Vec<i32>,
    power: Vec<i32>,
    suffix_caps: Vec<i32>,
    suffix_total_caps: Vec<i32>,
    suffix_parts: Vec<usize>,
    requirements: Vec<(usize, i32)>,
    infeasible: bool,
}

impl CandidateSet {
    /// Build a candidate set. Modules are ordered by identity and duplicate
    /// identities are dropped, so ascending index tuples are ascending
    /// identity tuples.
    pub fn new(
        mut modules: Vec<Module>,
        weights: &AttributeWeights,
        min_attr_sums: &BTreeMap<AttrId, i32>,
    ) -> Self {
        modules.sort_by_key(|m| m.id);
        modules.dedup_by_key(|m| m.id);

        let mut slot_of: HashMap<AttrId, usize> = HashMap::new();
        let mut slot_ids = Vec::new();
        let mut slot_kinds = Vec::new();
        for module in &modules {
            for part in &module.parts {
                slot_of.entry(part.id).or_insert_with(|| {
                    slot_ids.push(part.id);
                    slot_kinds.push(AttributeKind::of_name(&part.name));
                    slot_ids.len() - 1
                });
            }
        }

        let slots = slot_ids.len();
        let n = modules.len();
        let mut rows = vec![0; n * slots];
        let mut totals = vec![0; n];
        for (i, module) in modules.iter().enumerate() {
            for part in &module.parts {
                rows[i * slots + slot_of[&part.id]] += part.value;
                totals[i] += part.value;
            }
        }

        let mut power = vec![0; slots * LUT_STRIDE];
        for slot in 0..slots {
            let multiplier = weights.multiplier(slot_ids[slot]);
            for value in 0..LUT_STRIDE {
                power[slot * LUT_STRIDE + value] =
                    tier_power(slot_kinds[slot], value as i32) * multiplier;
            }
        }

        let mut suffix_caps = vec![0; (n + 1) * slots];
        let mut suffix_total_caps = vec![0; n + 1];
        let mut suffix_parts = vec![0; n + 1];
        for i in (0..n).rev() {
            let mut parts = 0;
            for slot in 0..slots {
                let value = rows[i * slots + slot];
                if value != 0 {
                    parts += 1;
                }
                suffix_caps[i * slots + slot] = value.max(suffix_caps[(i + 1) * slots + slot]);
            }
            suffix_total_caps[i] = totals[i].max(suffix_total_caps[i + 1]);
            suffix_parts[i] = parts.max(suffix_parts[i + 1]);
        }

        let mut requirements = Vec::new();
        let mut infeasible = false;
        for (attr, need) in min_attr_sums {
            if *need <= 0 {
                continue;
            }
            match slot_of.get(attr) {
                Some(slot) => requirements.push((*slot, *need)),
                None => infeasible = true,
            }
        }

        Self {
            modules,
            slot_ids,
            rows,
            totals,
            power,
            suffix_caps,
            suffix_total_caps,
            suffix_parts,
            requirements,
            infeasible,
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.slot_ids.len()
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, index: usize) -> &Module {
        &self.modules[index]
    }

    /// True when a minimum-sum requirement names an attribute no candidate carries.
    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    pub fn has_slot_for(&self, attr: AttrId) -> bool {
        self.slot_ids.contains(&attr)
    }

    pub fn row(&self, index: usize) -> &[i32] {
        let slots = self.slot_count();
        &self.rows[index * slots..(index + 1) * slots]
    }

    pub fn total(&self, index: usize) -> i32 {
        self.totals[index]
    }

    #[inline]
    fn weighted_power(&self, slot: usize, value: i32) -> i32 {
        self.power[slot * LUT_STRIDE + value.clamp(0, VALUE_CAP) as usize]
    }

    /// Weighted score of accumulated slot sums.
    pub fn score_sums(&self, sums: &[i32], total: i32) -> i32 {
        let threshold: i32 = sums
            .iter()
            .enumerate()
            .map(|(slot, value)| self.weighted_power(slot, *value))
            .sum();
        threshold + total_power(total)
    }

    /// Weighted score of accumulated sums with one more module added.
    #[inline]
    pub fn score_with(&self, sums: &[i32], total: i32, extra: usize) -> i32 {
        let row = self.row(extra);
        let mut threshold = 0;
        for slot in 0..sums.len() {
            threshold += self.weighted_power(slot, sums[slot] + row[slot]);
        }
        threshold + total_power(total + self.totals[extra])
    }

    /// Upper bound on the score reachable by adding `remaining` more modules
    /// taken from indices `from..`.
    ///
    /// Each slot can gain at most what `remaining` copies of its suffix
    /// maximum would add, and the added modules touch at most `remaining`
    /// times the widest suffix module's slot count. The bound is the current
    /// weighted power plus that many of the largest per-slot gains. `gains`
    /// is scratch space of at least `slot_count()` entries.
    #[inline]
    pub fn upper_bound(
        &self,
        sums: &[i32],
        total: i32,
        from: usize,
        remaining: i32,
        gains: &mut [i32],
    ) -> i32 {
        let slots = self.slot_count();
        let caps = &self.suffix_caps[from * slots..(from + 1) * slots];
        let mut threshold = 0;
        for slot in 0..slots {
            let now = self.weighted_power(slot, sums[slot]);
            threshold += now;
            gains[slot] = self.weighted_power(slot, sums[slot] + remaining * caps[slot]) - now;
        }

        let touched = remaining as usize * self.suffix_parts[from];
        let gains = &mut gains[..slots];
        let gain: i32 = if touched >= slots {
            gains.iter().sum()
        } else if touched == 0 {
            0
        } else {
            gains.select_nth_unstable_by(touched - 1, |a, b| b.cmp(a));
            gains[..touched].iter().sum()
        };

        threshold + gain + total_power_upper_bound(total + remaining * self.suffix_total_caps[from])
    }

    /// Whether sums plus one more module satisfy every minimum-sum requirement.
    #[inline]
    pub fn meets_requirements_with(&self, sums: &[i32], extra: usize) -> bool {
        if self.requirements.is_empty() {
            return true;
        }
        let row = self.row(extra);
        self.requirements
            .iter()
            .all(|(slot, need)| sums[*slot] + row[*slot] >= *need)
    }

    /// A zeroed accumulator sized for this set.
    pub fn scratch(&self) -> Vec<i32> {
        vec![0; self.slot_count()]
    }

    /// Weighted score of an arbitrary pick of modules.
    pub fn score_picks(&self, picks: &[usize], scratch: &mut [i32]) -> i32 {
        scratch.fill(0);
        let mut total = 0;
        for &index in picks {
            for (acc, value) in scratch.iter_mut().zip(self.row(index)) {
                *acc += *value;
            }
            total += self.totals[index];
        }
        self.score_sums(scratch, total)
    }

    /// Materialize a scored combination into a full solution.
    pub fn to_solution(&self, combo: &ScoredCombo) -> Solution {
        let modules: [Module; COMBINATION_SIZE] =
            combo.indices.map(|index| self.modules[index].clone());
        Solution::new(modules, f64::from(combo.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mo_types::{attr_breakdown, canonical_score, AttributePart, ModuleId};

    fn module(id: u64, parts: &[(AttrId, &str, i32)]) -> Module {
        Module::new(
            format!("m{id}"),
            5500101,
            ModuleId(id),
            1,
            parts
                .iter()
                .map(|(attr, name, value)| AttributePart::new(*attr, *name, *value))
                .collect(),
        )
    }

    fn sample_modules() -> Vec<Module> {
        vec![
            module(40, &[(1110, "Strength Boost", 6), (1409, "Critical Focus", 3)]),
            module(10, &[(1110, "Strength Boost", 4), (1410, "Luck Focus", 5)]),
            module(30, &[(2104, "Extreme Life Wave", 7), (1409, "Critical Focus", 2)]),
            module(20, &[(1410, "Luck Focus", 9)]),
            module(50, &[(1110, "Strength Boost", 10), (1410, "Luck Focus", 1)]),
        ]
    }

    #[test]
    fn orders_by_identity_and_drops_duplicates() {
        let mut modules = sample_modules();
        modules.push(module(20, &[(1111, "Agility Boost", 9)]));
        let set = CandidateSet::new(modules, &AttributeWeights::default(), &BTreeMap::new());
        let ids: Vec<u64> = set.modules().iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn dense_score_matches_canonical() {
        let set = CandidateSet::new(
            sample_modules(),
            &AttributeWeights::default(),
            &BTreeMap::new(),
        );
        let mut scratch = set.scratch();
        let picks = [0, 2, 3, 4];
        let picked: Vec<&Module> = picks.iter().map(|i| set.module(*i)).collect();
        let expected = canonical_score(&attr_breakdown(picked.iter().copied()));
        assert_eq!(set.score_picks(&picks, &mut scratch), expected);
    }

    #[test]
    fn dense_score_matches_weighted_reference() {
        let weights = AttributeWeights::new([1410], [1110]);
        let set = CandidateSet::new(sample_modules(), &weights, &BTreeMap::new());
        let mut scratch = set.scratch();
        let picks = [0, 1, 3, 4];
        let picked: Vec<&Module> = picks.iter().map(|i| set.module(*i)).collect();
        assert_eq!(
            set.score_picks(&picks, &mut scratch),
            weights.score(picked.iter().copied())
        );
    }

    #[test]
    fn incremental_score_matches_full_score() {
        let set = CandidateSet::new(
            sample_modules(),
            &AttributeWeights::default(),
            &BTreeMap::new(),
        );
        let mut scratch = set.scratch();
        let mut sums = set.scratch();
        let mut total = 0;
        for index in [0, 1, 2] {
            for (acc, value) in sums.iter_mut().zip(set.row(index)) {
                *acc += *value;
            }
            total += set.total(index);
        }
        assert_eq!(
            set.score_with(&sums, total, 4),
            set.score_picks(&[0, 1, 2, 4], &mut scratch)
        );
    }

    #[test]
    fn upper_bound_dominates_every_completion() {
        let set = CandidateSet::new(
            sample_modules(),
            &AttributeWeights::new([1409], []),
            &BTreeMap::new(),
        );
        let mut scratch = set.scratch();
        let mut gains = set.scratch();
        let sums = set.row(0).to_vec();
        let bound = set.upper_bound(&sums, set.total(0), 1, 3, &mut gains);
        for j in 1..set.len() {
            for k in j + 1..set.len() {
                for l in k + 1..set.len() {
                    assert!(set.score_picks(&[0, j, k, l], &mut scratch) <= bound);
                }
            }
        }
    }

    #[test]
    fn upper_bound_only_counts_slots_a_module_can_touch() {
        // Single-part modules: one more pick can raise only one slot.
        let modules = vec![
            module(1, &[(1110, "Strength Boost", 10)]),
            module(2, &[(1111, "Agility Boost", 10)]),
            module(3, &[(1112, "Intelligence Boost", 10)]),
            module(4, &[(1409, "Critical Focus", 10)]),
            module(5, &[(1410, "Luck Focus", 10)]),
        ];
        let set = CandidateSet::new(modules, &AttributeWeights::default(), &BTreeMap::new());
        let mut gains = set.scratch();
        let mut scratch = set.scratch();

        let mut sums = set.scratch();
        for index in [0, 1, 2] {
            for (acc, value) in sums.iter_mut().zip(set.row(index)) {
                *acc += *value;
            }
        }
        let total = 30;
        let bound = set.upper_bound(&sums, total, 3, 1, &mut gains);

        // Three tier-4 slots plus one more: the bound admits one new slot only.
        let best = set
            .score_picks(&[0, 1, 2, 3], &mut scratch)
            .max(set.score_picks(&[0, 1, 2, 4], &mut scratch));
        let threshold = 4 * mo_types::BASIC_POWER[mo_types::tier(10)];
        assert_eq!(bound, threshold + mo_types::total_power_upper_bound(40));
        assert!(best <= bound);
    }

    #[test]
    fn requirements_and_infeasibility() {
        let mut needs = BTreeMap::new();
        needs.insert(1410, 10);
        let set = CandidateSet::new(sample_modules(), &AttributeWeights::default(), &needs);
        assert!(!set.is_infeasible());
        let mut sums = set.scratch();
        for (acc, value) in sums.iter_mut().zip(set.row(0)) {
            *acc += *value;
        }
        // module 10 has Luck Focus 5, module 20 has 9
        assert!(set.meets_requirements_with(&sums, 1));
        assert!(!set.meets_requirements_with(&sums, 2));

        let mut missing = BTreeMap::new();
        missing.insert(4242, 1);
        let set = CandidateSet::new(sample_modules(), &AttributeWeights::default(), &missing);
        assert!(set.is_infeasible());
    }

    #[test]
    fn solution_carries_breakdown() {
        let set = CandidateSet::new(
            sample_modules(),
            &AttributeWeights::default(),
            &BTreeMap::new(),
        );
        let combo = ScoredCombo::new(123, [0, 1, 2, 3]);
        let solution = set.to_solution(&combo);
        assert_eq!(solution.score, 123.0);
        assert_eq!(solution.attr_breakdown.get("Luck Focus"), Some(&14));
        assert_eq!(solution.attr_breakdown.get("Strength Boost"), Some(&10));
    }
}
