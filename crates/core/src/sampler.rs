//! Stratified, weight-aware sampling.
//!
//! Given flattened items grouped by (year, classification) and a global
//! weight target, selects a bounded subset that honors per-stratum quotas.
//! All randomness comes through the caller's [`rand::Rng`], so a seeded
//! generator reproduces a selection exactly.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::flatten::FlattenedItem;
use crate::model::ClassificationId;

//
// ─── STRATA ────────────────────────────────────────────────────────────────────
//

/// Grouping key for sampling: one stratum per (year, classification) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StratumKey {
    pub year: u16,
    pub classification_id: ClassificationId,
}

impl StratumKey {
    #[must_use]
    pub fn new(year: u16, classification_id: ClassificationId) -> Self {
        Self {
            year,
            classification_id,
        }
    }

    /// The stratum an item belongs to.
    #[must_use]
    pub fn of(item: &FlattenedItem) -> Self {
        Self::new(item.year(), item.classification_id())
    }
}

/// The indivisible unit of selection: every flattened item derived from one
/// source question.
///
/// Accepting half a composite question would strand subparts without their
/// shared passage and siblings, so quota arithmetic always moves whole
/// units; a composite of weight *w* costs *w*, never 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleUnit {
    items: Vec<FlattenedItem>,
}

impl SampleUnit {
    #[must_use]
    pub fn weight(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn items(&self) -> &[FlattenedItem] {
        &self.items
    }

    fn into_items(self) -> Vec<FlattenedItem> {
        self.items
    }

    fn key(&self) -> StratumKey {
        // Units are built non-empty and all items share one source question.
        StratumKey::of(&self.items[0])
    }
}

/// Groups flattened items into selection units and buckets them by stratum.
///
/// Items sharing a backing question arrive consecutively from the flattener;
/// each such run becomes one [`SampleUnit`]. The `BTreeMap` keeps stratum
/// iteration in key order, which makes sampling deterministic for a fixed
/// RNG.
#[must_use]
pub fn build_strata(items: Vec<FlattenedItem>) -> BTreeMap<StratumKey, Vec<SampleUnit>> {
    let mut strata: BTreeMap<StratumKey, Vec<SampleUnit>> = BTreeMap::new();
    let mut run: Vec<FlattenedItem> = Vec::new();

    for item in items {
        if run
            .first()
            .is_some_and(|first| first.question_id() != item.question_id())
        {
            let unit = SampleUnit {
                items: std::mem::take(&mut run),
            };
            strata.entry(unit.key()).or_default().push(unit);
        }
        run.push(item);
    }
    if !run.is_empty() {
        let unit = SampleUnit { items: run };
        strata.entry(unit.key()).or_default().push(unit);
    }

    strata
}

//
// ─── SAMPLE OUTCOME ────────────────────────────────────────────────────────────
//

/// The sampler's selection plus the bookkeeping callers need to report the
/// soft underflow condition.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    items: Vec<FlattenedItem>,
    target_weight: u32,
    selected_weight: u32,
    base_quota: Option<u32>,
}

impl SampleOutcome {
    /// Selected items: stratum passes in key order, then leftover picks.
    #[must_use]
    pub fn items(&self) -> &[FlattenedItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<FlattenedItem> {
        self.items
    }

    #[must_use]
    pub fn target_weight(&self) -> u32 {
        self.target_weight
    }

    #[must_use]
    pub fn selected_weight(&self) -> u32 {
        self.selected_weight
    }

    /// The per-stratum weight budget of the first pass, or `None` when the
    /// whole pool fit under the target and no reduction ran.
    #[must_use]
    pub fn base_quota(&self) -> Option<u32> {
        self.base_quota
    }

    /// Weight the selection ended up below the target. With a reduction
    /// pass this is the accepted approximation (only overweight units
    /// remained); without one it simply means the pool was smaller than
    /// the target. Never an error either way.
    #[must_use]
    pub fn shortfall(&self) -> u32 {
        self.target_weight.saturating_sub(self.selected_weight)
    }

    #[must_use]
    pub fn is_short(&self) -> bool {
        self.shortfall() > 0
    }
}

//
// ─── SAMPLING ──────────────────────────────────────────────────────────────────
//

/// Selects a bounded subset of the strata honoring the global weight target.
///
/// If the total available weight already fits under the target, every
/// stratum is shuffled independently and returned whole. Otherwise each
/// non-empty stratum gets a `target / n` (floor) weight budget and is
/// greedy-filled in shuffled order; units that would overflow their stratum
/// budget go to a shared leftover pool, and a second greedy pass over the
/// shuffled leftovers tops the selection up while the grand total stays
/// under the target. Ties are broken by shuffle order only, and the result
/// may legitimately fall short of the target when only overweight units
/// remain — see [`SampleOutcome::shortfall`].
pub fn sample<R: Rng + ?Sized>(
    strata: BTreeMap<StratumKey, Vec<SampleUnit>>,
    target_weight: u32,
    rng: &mut R,
) -> SampleOutcome {
    let total_available: u32 = strata
        .values()
        .flatten()
        .map(SampleUnit::weight)
        .sum();

    if total_available <= target_weight {
        let mut items = Vec::new();
        for mut units in strata.into_values() {
            units.shuffle(rng);
            for unit in units {
                items.extend(unit.into_items());
            }
        }
        return SampleOutcome {
            items,
            target_weight,
            selected_weight: total_available,
            base_quota: None,
        };
    }

    let occupied = strata.values().filter(|units| !units.is_empty()).count();
    let occupied = u32::try_from(occupied).unwrap_or(u32::MAX).max(1);
    let base_quota = target_weight / occupied;

    let mut selected: Vec<SampleUnit> = Vec::new();
    let mut selected_weight: u32 = 0;
    let mut leftovers: Vec<SampleUnit> = Vec::new();

    for mut units in strata.into_values() {
        units.shuffle(rng);
        let mut stratum_weight = 0u32;
        for unit in units {
            if stratum_weight + unit.weight() <= base_quota {
                stratum_weight += unit.weight();
                selected.push(unit);
            } else {
                leftovers.push(unit);
            }
        }
        selected_weight += stratum_weight;
    }

    if selected_weight < target_weight {
        leftovers.shuffle(rng);
        for unit in leftovers {
            if selected_weight + unit.weight() <= target_weight {
                selected_weight += unit.weight();
                selected.push(unit);
            }
        }
    }

    let items = selected
        .into_iter()
        .flat_map(SampleUnit::into_items)
        .collect();
    SampleOutcome {
        items,
        target_weight,
        selected_weight,
        base_quota: Some(base_quota),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
