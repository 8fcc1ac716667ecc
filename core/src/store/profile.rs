//! Store methods for seller profiles.

use super::ProfileStore;
use crate::{
    error::{MarketError, MarketResult},
    profile::{NotificationSettings, Profile, ProfileUpdate, MAX_RATING},
    types::Timestamp,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};

const PROFILE_COLUMNS: &str = "user_id, rating, total_ratings, successful_transactions,
    total_transactions, response_rate, response_time, member_since,
    verified, phone_verified, email_verified, id_verified,
    notify_email, notify_sms, notify_push, notify_marketing";

/// A profile row as SQLite hands it back, before range checks.
struct ProfileRow {
    user_id:                 String,
    rating:                  f64,
    total_ratings:           i64,
    successful_transactions: i64,
    total_transactions:      i64,
    response_rate:           f64,
    response_time:           f64,
    member_since:            String,
    verified:                bool,
    phone_verified:          bool,
    email_verified:          bool,
    id_verified:             bool,
    notifications:           NotificationSettings,
}

impl ProfileRow {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id:                 r.get(0)?,
            rating:                  r.get(1)?,
            total_ratings:           r.get(2)?,
            successful_transactions: r.get(3)?,
            total_transactions:      r.get(4)?,
            response_rate:           r.get(5)?,
            response_time:           r.get(6)?,
            member_since:            r.get(7)?,
            verified:                r.get(8)?,
            phone_verified:          r.get(9)?,
            email_verified:          r.get(10)?,
            id_verified:             r.get(11)?,
            notifications: NotificationSettings {
                email:     r.get(12)?,
                sms:       r.get(13)?,
                push:      r.get(14)?,
                marketing: r.get(15)?,
            },
        })
    }

    fn into_profile(self) -> MarketResult<Profile> {
        let user_id = self.user_id;
        let counter = |name: &str, v: i64| {
            u32::try_from(v).map_err(|_| MarketError::InvalidProfile {
                user_id: user_id.clone(),
                reason:  format!("stored {name} {v} is out of range"),
            })
        };
        let total_ratings = counter("total_ratings", self.total_ratings)?;
        let successful_transactions =
            counter("successful_transactions", self.successful_transactions)?;
        let total_transactions = counter("total_transactions", self.total_transactions)?;
        let member_since = parse_timestamp(&self.member_since)?;

        Ok(Profile {
            user_id,
            rating: self.rating,
            total_ratings,
            successful_transactions,
            total_transactions,
            response_rate: self.response_rate,
            response_time: self.response_time,
            member_since,
            verified: self.verified,
            phone_verified: self.phone_verified,
            email_verified: self.email_verified,
            id_verified: self.id_verified,
            notifications: self.notifications,
        })
    }
}

fn parse_timestamp(s: &str) -> MarketResult<Timestamp> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

impl ProfileStore {
    /// Write transaction holding the database lock from BEGIN.
    /// Dropping it without `commit` rolls back.
    fn begin_write(&self) -> MarketResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?)
    }

    // ── Create ─────────────────────────────────────────────────

    /// Insert a fully populated profile after validating it.
    pub fn insert_profile(&self, profile: &Profile) -> MarketResult<()> {
        profile.validate()?;
        let tx = self.begin_write()?;
        if self.profile_exists(&profile.user_id)? {
            return Err(MarketError::DuplicateProfile {
                user_id: profile.user_id.clone(),
            });
        }
        let n = &profile.notifications;
        tx.execute(
            &format!("INSERT INTO profile ({PROFILE_COLUMNS})
                      VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)"),
            params![
                profile.user_id,
                profile.rating,
                profile.total_ratings as i64,
                profile.successful_transactions as i64,
                profile.total_transactions as i64,
                profile.response_rate,
                profile.response_time,
                profile.member_since.to_rfc3339(),
                profile.verified,
                profile.phone_verified,
                profile.email_verified,
                profile.id_verified,
                n.email,
                n.sms,
                n.push,
                n.marketing,
            ],
        )?;
        tx.commit()?;
        log::info!("profile {} stored", profile.user_id);
        Ok(())
    }

    /// Create a zeroed profile for `user_id`, as at account registration.
    pub fn create_profile(&self, user_id: &str, member_since: Timestamp) -> MarketResult<Profile> {
        let profile = Profile::new(user_id, member_since);
        self.insert_profile(&profile)?;
        Ok(profile)
    }

    /// Create a zeroed profile under a freshly generated id.
    pub fn register_profile(&self, now: Timestamp) -> MarketResult<Profile> {
        let user_id = uuid::Uuid::new_v4().to_string();
        self.create_profile(&user_id, now)
    }

    // ── Read ───────────────────────────────────────────────────

    pub fn find_profile(&self, user_id: &str) -> MarketResult<Option<Profile>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profile WHERE user_id = ?1"
        ))?;
        let row = stmt
            .query_row(params![user_id], ProfileRow::from_row)
            .optional()?;
        row.map(ProfileRow::into_profile).transpose()
    }

    /// Fetch a profile; fails with `NotFound` if absent.
    pub fn get_profile(&self, user_id: &str) -> MarketResult<Profile> {
        self.find_profile(user_id)?.ok_or_else(|| MarketError::NotFound {
            user_id: user_id.to_string(),
        })
    }

    pub fn profile_exists(&self, user_id: &str) -> MarketResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM profile WHERE user_id = ?1",
            params![user_id],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn profile_count(&self) -> MarketResult<i64> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM profile", [], |r| r.get(0))?;
        Ok(n)
    }

    /// Every stored user id, ascending.
    pub fn profile_ids(&self) -> MarketResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id FROM profile ORDER BY user_id ASC")?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    // ── Update ─────────────────────────────────────────────────

    /// Apply a partial update. The merged profile must still be valid,
    /// otherwise nothing is written.
    pub fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> MarketResult<Profile> {
        let tx = self.begin_write()?;
        let profile = self.get_profile(user_id)?;
        let profile = self.write_update(profile, update)?;
        tx.commit()?;
        Ok(profile)
    }

    /// Fold one 1–5 star rating into the running average.
    pub fn record_rating(&self, user_id: &str, stars: u8) -> MarketResult<Profile> {
        if !(1..=5).contains(&stars) {
            return Err(MarketError::InvalidRating { stars });
        }
        let tx = self.begin_write()?;
        let profile = self.get_profile(user_id)?;
        let n = profile.total_ratings;
        let next = n.checked_add(1).ok_or_else(|| MarketError::InvalidProfile {
            user_id: user_id.to_string(),
            reason:  "rating count overflow".into(),
        })?;
        let rating = (profile.rating * n as f64 + stars as f64) / next as f64;

        let update = ProfileUpdate {
            rating: Some(rating.min(MAX_RATING)),
            total_ratings: Some(next),
            ..Default::default()
        };
        let profile = self.write_update(profile, &update)?;
        tx.commit()?;
        Ok(profile)
    }

    /// Count one completed transaction, successful or not.
    pub fn record_transaction(&self, user_id: &str, successful: bool) -> MarketResult<Profile> {
        let tx = self.begin_write()?;
        let profile = self.get_profile(user_id)?;
        let overflow = || MarketError::InvalidProfile {
            user_id: user_id.to_string(),
            reason:  "transaction count overflow".into(),
        };
        let total = profile.total_transactions.checked_add(1).ok_or_else(overflow)?;
        let ok = if successful {
            profile.successful_transactions.checked_add(1).ok_or_else(overflow)?
        } else {
            profile.successful_transactions
        };

        let update = ProfileUpdate {
            successful_transactions: Some(ok),
            total_transactions: Some(total),
            ..Default::default()
        };
        let profile = self.write_update(profile, &update)?;
        tx.commit()?;
        Ok(profile)
    }

    /// Merge, validate and write back. Callers hold the write transaction.
    fn write_update(&self, mut profile: Profile, update: &ProfileUpdate) -> MarketResult<Profile> {
        if update.is_empty() {
            return Ok(profile);
        }
        profile.apply(update);
        if let Err(e) = profile.validate() {
            log::warn!("rejected update for {}: {e}", profile.user_id);
            return Err(e);
        }

        let n = &profile.notifications;
        self.conn.execute(
            "UPDATE profile SET
                 rating = ?2, total_ratings = ?3, successful_transactions = ?4,
                 total_transactions = ?5, response_rate = ?6, response_time = ?7,
                 verified = ?8, phone_verified = ?9, email_verified = ?10, id_verified = ?11,
                 notify_email = ?12, notify_sms = ?13, notify_push = ?14, notify_marketing = ?15
             WHERE user_id = ?1",
            params![
                profile.user_id,
                profile.rating,
                profile.total_ratings as i64,
                profile.successful_transactions as i64,
                profile.total_transactions as i64,
                profile.response_rate,
                profile.response_time,
                profile.verified,
                profile.phone_verified,
                profile.email_verified,
                profile.id_verified,
                n.email,
                n.sms,
                n.push,
                n.marketing,
            ],
        )?;
        log::debug!("profile {} updated", profile.user_id);
        Ok(profile)
    }
}
