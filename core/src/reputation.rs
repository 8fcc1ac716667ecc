//! Reputation evaluator.
//!
//! Turns a profile snapshot into a display-ready summary:
//!   - Tier: Gold, then Silver, then Bronze (first match wins).
//!   - Success rate: successful / total * 100, zero with no transactions.
//!   - Response-time bucket: Slow above 24h, Good above 2h, else Excellent.
//!   - Member-since year, UTC.
//!
//! Evaluation is pure. The summary is never persisted; callers recompute
//! it on every read.

use crate::{
    config::ReputationConfig,
    error::MarketResult,
    profile::Profile,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold   => "Gold",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTimeCategory {
    Excellent,
    Good,
    Slow,
}

impl fmt::Display for ResponseTimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponseTimeCategory::Excellent => "Excellent",
            ResponseTimeCategory::Good      => "Good",
            ResponseTimeCategory::Slow      => "Slow",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarSlot {
    Full,
    Half,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSummary {
    pub user_id:                String,
    pub tier:                   Tier,
    pub success_rate:           f64,
    pub response_time_category: ResponseTimeCategory,
    pub member_since_year:      i32,
    pub rating:                 f64,
    pub total_ratings:          u32,
    pub verified:               bool,
}

impl fmt::Display for ReputationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.1} ({} ratings) | {:.0}% success | {} response | since {}",
            self.tier,
            self.rating,
            self.total_ratings,
            self.success_rate,
            self.response_time_category,
            self.member_since_year,
        )
    }
}

/// Percentage of transactions that completed successfully.
/// Zero when there are no transactions; otherwise unclamped.
pub fn success_rate(successful: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    successful as f64 / total as f64 * 100.0
}

#[derive(Debug, Clone, Default)]
pub struct ReputationEvaluator {
    config: ReputationConfig,
}

impl ReputationEvaluator {
    /// Takes the thresholds as given. `ReputationConfig::load` has already
    /// checked file-sourced configs; use `try_new` for ones built in code.
    pub fn new(config: ReputationConfig) -> Self {
        Self { config }
    }

    /// Like `new`, but refuses NaN or inverted thresholds.
    pub fn try_new(config: ReputationConfig) -> MarketResult<Self> {
        config.check()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReputationConfig {
        &self.config
    }

    /// Derive the summary without validating the input. Out-of-range
    /// values flow straight through the threshold rules.
    pub fn evaluate(&self, profile: &Profile) -> ReputationSummary {
        let tier = self.tier(profile.successful_transactions, profile.rating);
        let rate = success_rate(profile.successful_transactions, profile.total_transactions);
        let category = self.response_time_category(profile.response_time);

        log::debug!(
            "user={} tier={tier} success_rate={rate:.1} response={category}",
            profile.user_id
        );

        ReputationSummary {
            user_id:                profile.user_id.clone(),
            tier,
            success_rate:           rate,
            response_time_category: category,
            member_since_year:      profile.member_since.year(),
            rating:                 profile.rating,
            total_ratings:          profile.total_ratings,
            verified:               profile.verified,
        }
    }

    /// Validate the profile, then evaluate it.
    pub fn evaluate_checked(&self, profile: &Profile) -> MarketResult<ReputationSummary> {
        if let Err(e) = profile.validate() {
            log::warn!("refusing to evaluate user={}: {e}", profile.user_id);
            return Err(e);
        }
        Ok(self.evaluate(profile))
    }

    pub fn tier(&self, successful: u32, rating: f64) -> Tier {
        let c = &self.config;
        if successful >= c.gold_min_successful && rating >= c.gold_min_rating {
            Tier::Gold
        } else if successful >= c.silver_min_successful && rating >= c.silver_min_rating {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    pub fn response_time_category(&self, hours: f64) -> ResponseTimeCategory {
        if hours > self.config.good_max_hours {
            ResponseTimeCategory::Slow
        } else if hours > self.config.excellent_max_hours {
            ResponseTimeCategory::Good
        } else {
            ResponseTimeCategory::Excellent
        }
    }

    /// Fill state of each star slot for `rating`.
    pub fn star_slots(&self, rating: f64) -> Vec<StarSlot> {
        star_slots(rating, self.config.star_slots)
    }
}

/// Slot `i` is Full below floor(rating), Half between floor(rating) and
/// rating, Empty otherwise.
pub fn star_slots(rating: f64, slots: usize) -> Vec<StarSlot> {
    let whole = rating.floor();
    (0..slots)
        .map(|i| {
            let i = i as f64;
            if i < whole {
                StarSlot::Full
            } else if i < rating {
                StarSlot::Half
            } else {
                StarSlot::Empty
            }
        })
        .collect()
}
