//! Profile store and reputation service integration tests.
//!
//! Verifies against an in-memory SQLite store:
//!   - Registration creates zeroed profiles
//!   - Missing ids surface as NotFound
//!   - Updates are validated and never touch member_since
//!   - Rating and transaction events keep the counters consistent
//!   - Several stores on one file never lose each other's increments
//!   - The service derives summaries from stored rows

use chrono::{TimeZone, Utc};
use marketplace_core::{
    MarketError, NotificationSettings, Profile, ProfileStore, ProfileUpdate, ReputationConfig,
    ReputationService, ResponseTimeCategory, Tier,
};
use std::path::PathBuf;
use uuid::Uuid;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store() -> ProfileStore {
    init_logging();
    let store = ProfileStore::in_memory().expect("open in-memory store");
    store.migrate().expect("migrate");
    store
}

/// A database file under the system temp dir, removed on drop.
struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new(tag: &str) -> Self {
        init_logging();
        let path = std::env::temp_dir().join(format!("profiles-{tag}-{}.db", Uuid::new_v4()));
        let db = Self { path };
        db.open().migrate().expect("migrate");
        db
    }

    fn open(&self) -> ProfileStore {
        ProfileStore::open(self.path.to_str().expect("utf-8 temp path")).expect("open file store")
    }

    /// Run SQL on a bare connection, skipping every store check.
    fn raw_execute(&self, sql: &str) {
        let conn = rusqlite::Connection::open(&self.path).expect("raw connection");
        conn.execute_batch(sql).expect("raw sql");
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut p = self.path.clone().into_os_string();
            p.push(suffix);
            let _ = std::fs::remove_file(p);
        }
    }
}

fn seeded_service() -> ReputationService {
    init_logging();
    let service = ReputationService::build_test().expect("build test service");
    let mut gold = Profile::new("gold-seller", Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap());
    gold.rating = 4.8;
    gold.total_ratings = 60;
    gold.successful_transactions = 55;
    gold.total_transactions = 58;
    gold.response_time = 1.5;
    service.store.insert_profile(&gold).unwrap();

    let mut bronze = Profile::new("bronze-seller", Utc.with_ymd_and_hms(2023, 8, 20, 9, 30, 0).unwrap());
    bronze.rating = 3.2;
    bronze.successful_transactions = 5;
    bronze.total_transactions = 10;
    bronze.response_time = 30.0;
    service.store.insert_profile(&bronze).unwrap();
    service
}

#[test]
fn created_profile_reads_back_identically() {
    let store = store();
    let since = Utc.with_ymd_and_hms(2021, 5, 4, 10, 11, 12).unwrap();
    let created = store.create_profile("alice", since).unwrap();

    let fetched = store.get_profile("alice").unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.total_ratings, 0);
    assert_eq!(fetched.successful_transactions, 0);
    assert_eq!(fetched.total_transactions, 0);
    assert_eq!(fetched.member_since, since);
    assert_eq!(fetched.notifications, NotificationSettings::default());
}

#[test]
fn registered_profiles_get_distinct_ids() {
    let store = store();
    let now = Utc::now();
    let a = store.register_profile(now).unwrap();
    let b = store.register_profile(now).unwrap();

    assert_ne!(a.user_id, b.user_id);
    assert_eq!(store.profile_count().unwrap(), 2);
}

#[test]
fn missing_profile_is_not_found() {
    let store = store();
    let err = store.get_profile("ghost").unwrap_err();
    assert!(
        matches!(&err, MarketError::NotFound { user_id } if user_id == "ghost"),
        "expected NotFound, got {err}"
    );
    assert!(store.find_profile("ghost").unwrap().is_none());

    let err = store.update_profile("ghost", &ProfileUpdate::default()).unwrap_err();
    assert!(matches!(err, MarketError::NotFound { .. }), "got {err}");
}

#[test]
fn duplicate_create_is_rejected() {
    let store = store();
    let since = Utc::now();
    store.create_profile("bob", since).unwrap();
    let err = store.create_profile("bob", since).unwrap_err();
    assert!(matches!(err, MarketError::DuplicateProfile { .. }), "got {err}");
}

#[test]
fn invalid_profile_cannot_be_inserted() {
    let store = store();
    let mut p = Profile::new("carol", Utc::now());
    p.rating = 6.0;
    let err = store.insert_profile(&p).unwrap_err();
    assert!(matches!(err, MarketError::InvalidProfile { .. }), "got {err}");
    assert!(!store.profile_exists("carol").unwrap());
}

#[test]
fn update_applies_partial_fields_and_keeps_member_since() {
    let store = store();
    let since = Utc.with_ymd_and_hms(2018, 11, 2, 0, 0, 0).unwrap();
    store.create_profile("dave", since).unwrap();

    let updated = store
        .update_profile(
            "dave",
            &ProfileUpdate {
                response_rate: Some(87.5),
                response_time: Some(3.0),
                phone_verified: Some(true),
                notifications: Some(NotificationSettings {
                    sms: true,
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .unwrap();

    let fetched = store.get_profile("dave").unwrap();
    assert_eq!(fetched, updated);
    assert_eq!(fetched.response_rate, 87.5);
    assert!(fetched.phone_verified);
    assert!(!fetched.verified, "verified is not derived from phone_verified");
    assert!(fetched.notifications.sms);
    assert_eq!(fetched.member_since, since);
}

#[test]
fn invalid_update_is_not_persisted() {
    let store = store();
    store.create_profile("erin", Utc::now()).unwrap();

    let err = store
        .update_profile(
            "erin",
            &ProfileUpdate {
                successful_transactions: Some(3),
                total_transactions: Some(1),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidProfile { .. }), "got {err}");

    let fetched = store.get_profile("erin").unwrap();
    assert_eq!(fetched.successful_transactions, 0);
    assert_eq!(fetched.total_transactions, 0);
}

#[test]
fn ratings_fold_into_running_average() {
    let store = store();
    store.create_profile("frank", Utc::now()).unwrap();

    store.record_rating("frank", 5).unwrap();
    store.record_rating("frank", 4).unwrap();
    let p = store.record_rating("frank", 3).unwrap();

    assert_eq!(p.total_ratings, 3);
    assert!((p.rating - 4.0).abs() < 1e-9, "average was {}", p.rating);
    assert_eq!(store.get_profile("frank").unwrap(), p);
}

#[test]
fn out_of_range_stars_are_rejected() {
    let store = store();
    store.create_profile("gina", Utc::now()).unwrap();
    for stars in [0u8, 6] {
        let err = store.record_rating("gina", stars).unwrap_err();
        assert!(matches!(err, MarketError::InvalidRating { .. }), "got {err}");
    }
    assert_eq!(store.get_profile("gina").unwrap().total_ratings, 0);
}

#[test]
fn transactions_keep_success_within_total() {
    let store = store();
    store.create_profile("hank", Utc::now()).unwrap();

    store.record_transaction("hank", true).unwrap();
    store.record_transaction("hank", false).unwrap();
    let p = store.record_transaction("hank", true).unwrap();

    assert_eq!(p.successful_transactions, 2);
    assert_eq!(p.total_transactions, 3);
}

#[test]
fn negative_stored_counter_reads_as_invalid() {
    let db = TempDb::new("corrupt");
    let store = db.open();
    store.create_profile("ivy", Utc::now()).unwrap();

    // Another writer outside this crate breaks the row.
    db.raw_execute("UPDATE profile SET total_transactions = -4 WHERE user_id = 'ivy'");

    let err = store.get_profile("ivy").unwrap_err();
    assert!(matches!(err, MarketError::InvalidProfile { .. }), "got {err}");
}

#[test]
fn concurrent_stores_on_one_file_keep_every_increment() {
    const WRITERS: usize = 4;
    const PER_WRITER: u32 = 50;

    let db = TempDb::new("shared");
    db.open().create_profile("busy-seller", Utc::now()).unwrap();

    std::thread::scope(|s| {
        for w in 0..WRITERS {
            let db = &db;
            s.spawn(move || {
                let store = db.open();
                for i in 0..PER_WRITER {
                    store
                        .record_transaction("busy-seller", (i + w as u32) % 2 == 0)
                        .expect("record transaction");
                    store.record_rating("busy-seller", 4).expect("record rating");
                }
            });
        }
    });

    let p = db.open().get_profile("busy-seller").unwrap();
    let expected = WRITERS as u32 * PER_WRITER;
    assert_eq!(p.total_transactions, expected, "lost transaction increments");
    assert_eq!(p.successful_transactions, expected / 2, "lost success increments");
    assert_eq!(p.total_ratings, expected, "lost rating increments");
    assert!((p.rating - 4.0).abs() < 1e-9, "average drifted to {}", p.rating);
}

#[test]
fn rating_count_overflow_is_refused() {
    let store = store();
    let mut p = Profile::new("saturated", Utc::now());
    p.rating = 4.0;
    p.total_ratings = u32::MAX;
    store.insert_profile(&p).unwrap();

    let err = store.record_rating("saturated", 5).unwrap_err();
    assert!(matches!(err, MarketError::InvalidProfile { .. }), "got {err}");
    assert_eq!(store.get_profile("saturated").unwrap(), p, "row changed after refusal");
}

#[test]
fn transaction_count_overflow_is_refused() {
    let store = store();
    let mut p = Profile::new("maxed", Utc::now());
    p.successful_transactions = u32::MAX - 1;
    p.total_transactions = u32::MAX;
    store.insert_profile(&p).unwrap();

    for successful in [true, false] {
        let err = store.record_transaction("maxed", successful).unwrap_err();
        assert!(matches!(err, MarketError::InvalidProfile { .. }), "got {err}");
    }
    assert_eq!(store.get_profile("maxed").unwrap(), p);
}

#[test]
fn perfect_average_never_exceeds_five() {
    let store = store();
    let mut p = Profile::new("flawless", Utc::now());
    p.rating = 5.0;
    p.total_ratings = 7;
    store.insert_profile(&p).unwrap();

    for _ in 0..25 {
        let p = store.record_rating("flawless", 5).unwrap();
        assert!(p.rating <= 5.0, "average rose to {}", p.rating);
    }
    let p = store.get_profile("flawless").unwrap();
    assert_eq!(p.total_ratings, 32);
    assert!(p.validate().is_ok());
}

#[test]
fn profile_ids_are_sorted() {
    let store = store();
    for id in ["zed", "amy", "mo"] {
        store.create_profile(id, Utc::now()).unwrap();
    }
    assert_eq!(store.profile_ids().unwrap(), vec!["amy", "mo", "zed"]);
}

#[test]
fn service_summarises_stored_profiles() {
    let service = seeded_service();

    let gold = service.summary("gold-seller").unwrap();
    assert_eq!(gold.tier, Tier::Gold);
    assert_eq!(gold.member_since_year, 2019);
    assert_eq!(gold.response_time_category, ResponseTimeCategory::Excellent);

    let bronze = service.summary("bronze-seller").unwrap();
    assert_eq!(bronze.tier, Tier::Bronze);
    assert_eq!(bronze.success_rate, 50.0);
    assert_eq!(bronze.response_time_category, ResponseTimeCategory::Slow);

    let err = service.summary("nobody").unwrap_err();
    assert!(matches!(err, MarketError::NotFound { .. }), "got {err}");
}

#[test]
fn summary_tracks_store_updates() {
    let service = seeded_service();
    let before = service.summary("bronze-seller").unwrap();

    service
        .store
        .update_profile(
            "bronze-seller",
            &ProfileUpdate {
                rating: Some(4.2),
                successful_transactions: Some(25),
                total_transactions: Some(30),
                response_time: Some(1.0),
                ..Default::default()
            },
        )
        .unwrap();

    let after = service.summary("bronze-seller").unwrap();
    assert_eq!(before.tier, Tier::Bronze);
    assert_eq!(after.tier, Tier::Silver);
    assert_eq!(after.response_time_category, ResponseTimeCategory::Excellent);
    assert_eq!(after.member_since_year, before.member_since_year);
}

#[test]
fn tier_distribution_counts_every_profile() {
    let service = seeded_service();
    let dist = service.tier_distribution().unwrap();

    assert_eq!(dist.get(&Tier::Gold), Some(&1));
    assert_eq!(dist.get(&Tier::Bronze), Some(&1));
    assert_eq!(dist.get(&Tier::Silver), None);
    assert_eq!(service.all_summaries().unwrap().len(), 2);
}

#[test]
fn shipped_config_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/reputation.json");
    let loaded = ReputationConfig::load(path).expect("load shipped config");
    assert_eq!(loaded, ReputationConfig::default());
}

#[test]
fn inverted_thresholds_are_refused() {
    let config = ReputationConfig {
        silver_min_rating: 4.9,
        ..Default::default()
    };
    assert!(config.check().is_err());
}

#[test]
fn non_finite_thresholds_are_refused() {
    for bad in [f64::NAN, f64::INFINITY] {
        let config = ReputationConfig {
            good_max_hours: bad,
            ..Default::default()
        };
        assert!(config.check().is_err(), "accepted good_max_hours={bad}");
    }
}
