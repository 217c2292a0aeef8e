//! Tier thresholds, power tables and the canonical combination score.
//!
//! A combination's score is the sum of each attribute's tier power plus a
//! bonus looked up from the grand total of all attribute values. The total
//! table is sparse on purpose: sums that fall in a gap (9..=17, 107..=112) or
//! outside 0..=120 contribute nothing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::attributes::{AttrId, AttributeKind};
use crate::module::Module;

/// Attribute totals reaching these values unlock tiers 1 through 6.
pub const THRESHOLDS: [i32; 6] = [1, 4, 8, 12, 16, 20];

/// Highest tier an attribute can reach.
pub const MAX_TIER: usize = THRESHOLDS.len();

/// Power per tier for basic attributes (index 0 is tier 0).
pub const BASIC_POWER: [i32; MAX_TIER + 1] = [0, 7, 14, 29, 44, 167, 254];

/// Power per tier for special attributes (index 0 is tier 0).
pub const SPECIAL_POWER: [i32; MAX_TIER + 1] = [0, 14, 29, 59, 89, 298, 448];

/// Number of keys covered by the total-value table.
pub const TOTAL_POWER_LEN: usize = 121;

/// Present keys of the total-value table.
pub const TOTAL_POWER_ENTRIES: &[(usize, i32)] = &[
    (0, 0), (1, 5), (2, 11), (3, 17), (4, 23), (5, 29), (6, 34), (7, 40), (8, 46), (18, 104),
    (19, 110), (20, 116), (21, 122), (22, 128), (23, 133), (24, 139), (25, 145), (26, 151),
    (27, 157), (28, 163), (29, 168), (30, 174), (31, 180), (32, 186), (33, 192), (34, 198),
    (35, 203), (36, 209), (37, 215), (38, 221), (39, 227), (40, 233), (41, 238), (42, 244),
    (43, 250), (44, 256), (45, 262), (46, 267), (47, 273), (48, 279), (49, 285), (50, 291),
    (51, 297), (52, 302), (53, 308), (54, 314), (55, 320), (56, 326), (57, 332), (58, 337),
    (59, 343), (60, 349), (61, 355), (62, 361), (63, 366), (64, 372), (65, 378), (66, 384),
    (67, 390), (68, 396), (69, 401), (70, 407), (71, 413), (72, 419), (73, 425), (74, 431),
    (75, 436), (76, 442), (77, 448), (78, 454), (79, 460), (80, 466), (81, 471), (82, 477),
    (83, 483), (84, 489), (85, 495), (86, 500), (87, 506), (88, 512), (89, 518), (90, 524),
    (91, 530), (92, 535), (93, 541), (94, 547), (95, 553), (96, 559), (97, 565), (98, 570),
    (99, 576), (100, 582), (101, 588), (102, 594), (103, 599), (104, 605), (105, 611),
    (106, 617), (113, 658), (114, 664), (115, 669), (116, 675), (117, 681), (118, 687),
    (119, 693), (120, 699),
];

/// Total-value table indexed by sum. `None` marks a gap and reads as zero.
pub static TOTAL_POWER: [Option<i32>; TOTAL_POWER_LEN] = build_total_power();

/// Best total-value power reachable at or below each sum.
pub static TOTAL_POWER_PREFIX_MAX: [i32; TOTAL_POWER_LEN] = build_prefix_max();

const fn build_total_power() -> [Option<i32>; TOTAL_POWER_LEN] {
    let mut table = [None; TOTAL_POWER_LEN];
    let mut i = 0;
    while i < TOTAL_POWER_ENTRIES.len() {
        let (key, power) = TOTAL_POWER_ENTRIES[i];
        table[key] = Some(power);
        i += 1;
    }
    table
}

const fn build_prefix_max() -> [i32; TOTAL_POWER_LEN] {
    let table = build_total_power();
    let mut prefix = [0; TOTAL_POWER_LEN];
    let mut best = 0;
    let mut i = 0;
    while i < TOTAL_POWER_LEN {
        if let Some(power) = table[i] {
            if power > best {
                best = power;
            }
        }
        prefix[i] = best;
        i += 1;
    }
    prefix
}

/// Number of thresholds at or below `value`.
pub fn tier(value: i32) -> usize {
    THRESHOLDS.iter().take_while(|t| value >= **t).count()
}

/// Power contributed by one attribute total.
pub fn tier_power(kind: AttributeKind, value: i32) -> i32 {
    let tier = tier(value);
    match kind {
        AttributeKind::Basic => BASIC_POWER[tier],
        AttributeKind::Special => SPECIAL_POWER[tier],
    }
}

/// Bonus power for the grand total of attribute values.
pub fn total_power(sum: i32) -> i32 {
    usize::try_from(sum)
        .ok()
        .and_then(|key| TOTAL_POWER.get(key).copied().flatten())
        .unwrap_or(0)
}

/// Upper bound of `total_power(s)` over every `s <= sum`.
pub fn total_power_upper_bound(sum: i32) -> i32 {
    match usize::try_from(sum) {
        Ok(key) => TOTAL_POWER_PREFIX_MAX[key.min(TOTAL_POWER_LEN - 1)],
        Err(_) => 0,
    }
}

/// Attribute name to summed value.
pub type AttrBreakdown = BTreeMap<String, i32>;

/// Sum part values by attribute name across the given modules.
pub fn attr_breakdown<'a, I>(modules: I) -> AttrBreakdown
where
    I: IntoIterator<Item = &'a Module>,
{
    let mut breakdown = AttrBreakdown::new();
    for module in modules {
        for part in &module.parts {
            *breakdown.entry(part.name.clone()).or_insert(0) += part.value;
        }
    }
    breakdown
}

/// Sum of tier powers over a breakdown.
pub fn threshold_power(breakdown: &AttrBreakdown) -> i32 {
    breakdown
        .iter()
        .map(|(name, value)| tier_power(AttributeKind::of_name(name), *value))
        .sum()
}

/// Unbiased score of a breakdown: threshold power plus total-value power.
pub fn canonical_score(breakdown: &AttrBreakdown) -> i32 {
    let total: i32 = breakdown.values().sum();
    threshold_power(breakdown) + total_power(total)
}

/// Search-time weighting toward target attributes.
///
/// A target attribute's tier power counts twice, an excluded attribute's tier
/// power counts zero. Ids that match no part simply never apply. The total
/// value bonus is not weighted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeWeights {
    pub target: BTreeSet<AttrId>,
    pub exclude: BTreeSet<AttrId>,
}

impl AttributeWeights {
    pub const TARGET_MULTIPLIER: i32 = 2;

    pub fn new(
        target: impl IntoIterator<Item = AttrId>,
        exclude: impl IntoIterator<Item = AttrId>,
    ) -> Self {
        Self {
            target: target.into_iter().collect(),
            exclude: exclude.into_iter().collect(),
        }
    }

    /// True when no weighting applies and search scores are canonical.
    pub fn is_neutral(&self) -> bool {
        self.target.is_empty() && self.exclude.is_empty()
    }

    pub fn multiplier(&self, attr: AttrId) -> i32 {
        if self.target.contains(&attr) {
            Self::TARGET_MULTIPLIER
        } else if self.exclude.contains(&attr) {
            0
        } else {
            1
        }
    }

    /// Weighted score of a set of modules, keyed by attribute id.
    ///
    /// This is the slow reference form of what the optimizer's dense scorer
    /// computes in its inner loops.
    pub fn score<'a, I>(&self, modules: I) -> i32
    where
        I: IntoIterator<Item = &'a Module>,
    {
        let mut sums: HashMap<AttrId, (AttributeKind, i32)> = HashMap::new();
        let mut total = 0;
        for module in modules {
            for part in &module.parts {
                let entry = sums
                    .entry(part.id)
                    .or_insert((AttributeKind::of_name(&part.name), 0));
                entry.1 += part.value;
                total += part.value;
            }
        }
        let threshold: i32 = sums
            .iter()
            .map(|(id, (kind, value))| tier_power(*kind, *value) * self.multiplier(*id))
            .sum();
        threshold + total_power(total)
    }
}
