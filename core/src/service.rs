//! Reputation service: the store and the evaluator wired together.
//!
//! RULES:
//!   - Reads go through the store; the evaluator never sees SQL.
//!   - Summaries are recomputed on every call, never cached or persisted.

use crate::{
    config::ReputationConfig,
    error::MarketResult,
    reputation::{ReputationEvaluator, ReputationSummary, Tier},
    store::ProfileStore,
};
use std::collections::BTreeMap;

pub struct ReputationService {
    pub store: ProfileStore,
    evaluator: ReputationEvaluator,
}

impl ReputationService {
    pub fn new(store: ProfileStore, config: ReputationConfig) -> Self {
        Self {
            store,
            evaluator: ReputationEvaluator::new(config),
        }
    }

    /// In-memory store, migrated, with default thresholds.
    pub fn build_test() -> MarketResult<Self> {
        let store = ProfileStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(store, ReputationConfig::default()))
    }

    pub fn evaluator(&self) -> &ReputationEvaluator {
        &self.evaluator
    }

    /// Look up `user_id` and derive its summary.
    pub fn summary(&self, user_id: &str) -> MarketResult<ReputationSummary> {
        let profile = self.store.get_profile(user_id)?;
        if self.evaluator.config().validate_on_evaluate {
            self.evaluator.evaluate_checked(&profile)
        } else {
            Ok(self.evaluator.evaluate(&profile))
        }
    }

    /// Summaries for every stored profile, ordered by user id.
    pub fn all_summaries(&self) -> MarketResult<Vec<ReputationSummary>> {
        self.store
            .profile_ids()?
            .iter()
            .map(|id| self.summary(id))
            .collect()
    }

    /// Number of profiles in each tier.
    pub fn tier_distribution(&self) -> MarketResult<BTreeMap<Tier, usize>> {
        let mut counts = BTreeMap::new();
        for summary in self.all_summaries()? {
            *counts.entry(summary.tier).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
