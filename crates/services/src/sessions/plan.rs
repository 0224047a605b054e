use rand::Rng;
use rand::rng;
use tracing::warn;

use exam_core::flatten::{FlattenedItem, flatten_pool};
use exam_core::model::PoolQuestion;
use exam_core::sampler::{build_strata, sample};

/// Selection result for an assembled attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub items: Vec<FlattenedItem>,
    pub target_weight: u32,
    pub selected_weight: u32,
    pub shortfall: u32,
}

impl SessionPlan {
    /// Total number of answerable units in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Returns true when no units were selected for this attempt.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Assembles an attempt by flattening the fetched pool and sampling it down
/// to the global weight target.
pub struct SessionBuilder {
    target_weight: u32,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(target_weight: u32) -> Self {
        Self { target_weight }
    }

    /// Build a plan from the fetched pool using a fresh thread RNG.
    #[must_use]
    pub fn build(self, pool: &[PoolQuestion]) -> SessionPlan {
        let mut rng = rng();
        self.build_with_rng(pool, &mut rng)
    }

    /// Build a plan with an injected RNG, for reproducible selections.
    ///
    /// Falling short of the target is not an error: when the quota pass ran
    /// and still could not reach the target, only overweight question
    /// groups remained, and the plan reports the shortfall instead of
    /// splitting a group.
    #[must_use]
    pub fn build_with_rng<R: Rng + ?Sized>(
        self,
        pool: &[PoolQuestion],
        rng: &mut R,
    ) -> SessionPlan {
        let strata = build_strata(flatten_pool(pool));
        let outcome = sample(strata, self.target_weight, rng);

        if outcome.base_quota().is_some() && outcome.is_short() {
            warn!(
                target = outcome.target_weight(),
                selected = outcome.selected_weight(),
                shortfall = outcome.shortfall(),
                "attempt assembled under its weight target"
            );
        }

        let target_weight = outcome.target_weight();
        let selected_weight = outcome.selected_weight();
        let shortfall = outcome.shortfall();
        SessionPlan {
            items: outcome.into_items(),
            target_weight,
            selected_weight,
            shortfall,
        }
    }
}
