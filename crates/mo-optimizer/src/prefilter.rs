//! Catalog reduction ahead of the search strategies.
//!
//! Two pools come out of a filtered catalog: the modules with the highest
//! total value, which the exhaustive strategy can afford to enumerate, and a
//! wider pool that also keeps the leaders of every individual attribute so a
//! module that excels in one rare attribute is not lost for having an
//! unremarkable total.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};

use mo_types::{AttrId, Module, ModuleId};

use crate::config::OptimizerConfig;

/// Attribute leaders kept per attribute in catalogs with few distinct attributes.
pub const NARROW_CATALOG_LEADERS: usize = 90;
/// Attribute leaders kept per attribute otherwise.
pub const WIDE_CATALOG_LEADERS: usize = 30;
/// Distinct attribute count at or below which a catalog counts as narrow.
pub const NARROW_CATALOG_ATTRIBUTES: usize = 5;

/// Which strategies a plan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanKind {
    /// The filtered catalog fits the enumeration cap and is enumerated whole.
    EnumerateAll,
    /// The candidate pool fits the enumeration cap and is enumerated alone.
    EnumeratePool,
    /// A forced enumeration-only run over the catalog reduced to the hard cap.
    EnumerateCapped,
    /// Enumeration over the top-by-value set and greedy search over the pool.
    Concurrent,
}

/// Candidate lists handed to the strategies.
#[derive(Debug, Clone)]
pub enum SearchPlan {
    EnumerationOnly {
        kind: PlanKind,
        candidates: Vec<Module>,
    },
    Concurrent {
        enumeration: Vec<Module>,
        pool: Vec<Module>,
    },
}

impl SearchPlan {
    pub fn kind(&self) -> PlanKind {
        match self {
            Self::EnumerationOnly { kind, .. } => *kind,
            Self::Concurrent { .. } => PlanKind::Concurrent,
        }
    }

    /// Sizes of the enumeration set and the greedy pool (0 when not run).
    pub fn sizes(&self) -> (usize, usize) {
        match self {
            Self::EnumerationOnly { candidates, .. } => (candidates.len(), 0),
            Self::Concurrent { enumeration, pool } => (enumeration.len(), pool.len()),
        }
    }
}

/// Value a module is ranked by: its total, or only its target attributes.
fn ranking_value(module: &Module, targets: &BTreeSet<AttrId>) -> i32 {
    if targets.is_empty() {
        module.total_value()
    } else {
        module
            .parts
            .iter()
            .filter(|p| targets.contains(&p.id))
            .map(|p| p.value)
            .sum()
    }
}

/// The `cap` best modules by ranking value, ties by ascending identity.
pub fn top_by_value(modules: &[Module], cap: usize, targets: &BTreeSet<AttrId>) -> Vec<Module> {
    let mut ranked: Vec<&Module> = modules.iter().collect();
    ranked.sort_by_key(|m| (Reverse(ranking_value(m, targets)), m.id));
    ranked.into_iter().take(cap).cloned().collect()
}

/// How many leaders to keep per attribute for a catalog.
pub fn leaders_per_attribute(distinct_attributes: usize) -> usize {
    if distinct_attributes <= NARROW_CATALOG_ATTRIBUTES {
        NARROW_CATALOG_LEADERS
    } else {
        WIDE_CATALOG_LEADERS
    }
}

/// `top` unioned with the leaders of every observed attribute, deduplicated by identity.
pub fn candidate_pool(modules: &[Module], top: &[Module]) -> Vec<Module> {
    let names: BTreeSet<&str> = modules
        .iter()
        .flat_map(|m| m.parts.iter().map(|p| p.name.as_str()))
        .collect();
    let per_attribute = leaders_per_attribute(names.len());

    let mut seen: HashSet<ModuleId> = top.iter().map(|m| m.id).collect();
    let mut pool: Vec<Module> = top.to_vec();

    for name in names {
        let mut leaders: Vec<(&Module, i32)> = modules
            .iter()
            .map(|m| (m, m.value_named(name)))
            .filter(|(_, value)| *value > 0)
            .collect();
        leaders.sort_by_key(|(m, value)| (Reverse(*value), m.id));
        for (module, _) in leaders.into_iter().take(per_attribute) {
            if seen.insert(module.id) {
                pool.push(module.clone());
            }
        }
    }

    pool
}

/// Drop modules carrying fewer than `min_matches` distinct target attributes.
pub fn filter_by_target_matches(
    modules: Vec<Module>,
    targets: &BTreeSet<AttrId>,
    min_matches: usize,
) -> Vec<Module> {
    if targets.is_empty() || min_matches == 0 {
        return modules;
    }
    modules
        .into_iter()
        .filter(|m| {
            let matched: BTreeSet<AttrId> = m
                .parts
                .iter()
                .map(|p| p.id)
                .filter(|id| targets.contains(id))
                .collect();
            matched.len() >= min_matches
        })
        .collect()
}

/// Decide which strategies run over which candidates.
pub fn plan(filtered: Vec<Module>, config: &OptimizerConfig, targets: &BTreeSet<AttrId>) -> SearchPlan {
    if filtered.len() <= config.enumeration_cap {
        return SearchPlan::EnumerationOnly {
            kind: PlanKind::EnumerateAll,
            candidates: filtered,
        };
    }

    let top = top_by_value(&filtered, config.enumeration_cap, targets);
    let pool = candidate_pool(&filtered, &top);

    if pool.len() <= config.enumeration_cap {
        SearchPlan::EnumerationOnly {
            kind: PlanKind::EnumeratePool,
            candidates: pool,
        }
    } else {
        SearchPlan::Concurrent {
            enumeration: top,
            pool,
        }
    }
}

/// Plan for a forced enumeration run, reducing to the hard cap when needed.
pub fn enumeration_only_plan(
    filtered: Vec<Module>,
    hard_cap: usize,
    targets: &BTreeSet<AttrId>,
) -> SearchPlan {
    if filtered.len() <= hard_cap {
        SearchPlan::EnumerationOnly {
            kind: PlanKind::EnumerateAll,
            candidates: filtered,
        }
    } else {
        SearchPlan::EnumerationOnly {
            kind: PlanKind::EnumerateCapped,
            candidates: top_by_value(&filtered, hard_cap, targets),
        }
    }
}
