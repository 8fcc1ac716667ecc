//! The seller profile record and its invariants.
//!
//! A profile is created at registration with every counter at zero and
//! `member_since` pinned to the creation instant. Rating and transaction
//! flows mutate it afterwards through `ProfileUpdate`; nothing in this
//! crate deletes a profile.

use crate::{
    error::{MarketError, MarketResult},
    types::{Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

pub const MAX_RATING: f64 = 5.0;
pub const MAX_RESPONSE_RATE: f64 = 100.0;

/// Which channels a user wants to be notified on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub email:     bool,
    pub sms:       bool,
    pub push:      bool,
    pub marketing: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email:     true,
            sms:       false,
            push:      true,
            marketing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    /// Average of all ratings received, [0, 5].
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub total_ratings: u32,
    #[serde(default)]
    pub successful_transactions: u32,
    #[serde(default)]
    pub total_transactions: u32,
    /// Percentage of messages answered, [0, 100].
    #[serde(default)]
    pub response_rate: f64,
    /// Average reply latency in hours.
    #[serde(default)]
    pub response_time: f64,
    pub member_since: Timestamp,
    /// Display flag. Settable on its own; not derived from the three below.
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub id_verified: bool,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl Profile {
    /// A freshly registered profile: zero counters, no verification.
    pub fn new(user_id: impl Into<UserId>, member_since: Timestamp) -> Self {
        Self {
            user_id: user_id.into(),
            rating: 0.0,
            total_ratings: 0,
            successful_transactions: 0,
            total_transactions: 0,
            response_rate: 0.0,
            response_time: 0.0,
            member_since,
            verified: false,
            phone_verified: false,
            email_verified: false,
            id_verified: false,
            notifications: NotificationSettings::default(),
        }
    }

    /// Check every range and ordering invariant of the record.
    pub fn validate(&self) -> MarketResult<()> {
        let invalid = |reason: String| MarketError::InvalidProfile {
            user_id: self.user_id.clone(),
            reason,
        };

        if self.user_id.is_empty() {
            return Err(invalid("empty user id".into()));
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(invalid(format!("rating {} outside [0, 5]", self.rating)));
        }
        if !self.response_rate.is_finite()
            || !(0.0..=MAX_RESPONSE_RATE).contains(&self.response_rate)
        {
            return Err(invalid(format!(
                "response rate {} outside [0, 100]",
                self.response_rate
            )));
        }
        if !self.response_time.is_finite() || self.response_time < 0.0 {
            return Err(invalid(format!(
                "response time {} is negative or not finite",
                self.response_time
            )));
        }
        if self.successful_transactions > self.total_transactions {
            return Err(invalid(format!(
                "successful transactions {} exceed total {}",
                self.successful_transactions, self.total_transactions
            )));
        }
        Ok(())
    }

    /// Merge a partial update into this profile. Does not validate.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(v) = update.rating                  { self.rating = v; }
        if let Some(v) = update.total_ratings           { self.total_ratings = v; }
        if let Some(v) = update.successful_transactions { self.successful_transactions = v; }
        if let Some(v) = update.total_transactions      { self.total_transactions = v; }
        if let Some(v) = update.response_rate           { self.response_rate = v; }
        if let Some(v) = update.response_time           { self.response_time = v; }
        if let Some(v) = update.verified                { self.verified = v; }
        if let Some(v) = update.phone_verified          { self.phone_verified = v; }
        if let Some(v) = update.email_verified          { self.email_verified = v; }
        if let Some(v) = update.id_verified             { self.id_verified = v; }
        if let Some(v) = update.notifications           { self.notifications = v; }
    }
}

/// Partial profile update. `user_id` and `member_since` are immutable and
/// have no counterpart here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub rating:                  Option<f64>,
    pub total_ratings:           Option<u32>,
    pub successful_transactions: Option<u32>,
    pub total_transactions:      Option<u32>,
    pub response_rate:           Option<f64>,
    pub response_time:           Option<f64>,
    pub verified:                Option<bool>,
    pub phone_verified:          Option<bool>,
    pub email_verified:          Option<bool>,
    pub id_verified:             Option<bool>,
    pub notifications:           Option<NotificationSettings>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn base() -> Profile {
        Profile::new("seller-1", Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn fresh_profile_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn rating_above_five_is_rejected() {
        let mut p = base();
        p.rating = 5.1;
        assert!(matches!(p.validate(), Err(MarketError::InvalidProfile { .. })));
    }

    #[test]
    fn nan_rating_is_rejected() {
        let mut p = base();
        p.rating = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn more_successes_than_transactions_is_rejected() {
        let mut p = base();
        p.successful_transactions = 3;
        p.total_transactions = 2;
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("exceed total"), "unexpected error: {err}");
    }

    #[test]
    fn negative_response_time_is_rejected() {
        let mut p = base();
        p.response_time = -0.5;
        assert!(p.validate().is_err());
    }

    #[test]
    fn apply_touches_only_given_fields() {
        let mut p = base();
        p.verified = true;
        p.apply(&ProfileUpdate {
            rating: Some(4.2),
            total_ratings: Some(3),
            ..Default::default()
        });
        assert_eq!(p.rating, 4.2);
        assert_eq!(p.total_ratings, 3);
        assert!(p.verified, "untouched flag must survive the update");
        assert_eq!(p.member_since, base().member_since);
    }

    #[test]
    fn empty_update_reports_empty() {
        assert!(ProfileUpdate::default().is_empty());
        assert!(!ProfileUpdate { verified: Some(false), ..Default::default() }.is_empty());
    }
}
