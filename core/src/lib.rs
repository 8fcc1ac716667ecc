//! Seller reputation core for the classifieds marketplace.
//!
//! ```text
//! core/src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── config.rs      - Tier and response-time thresholds
//! ├── error.rs       - MarketError / MarketResult
//! ├── types.rs       - Shared primitive types
//! ├── profile.rs     - Profile record, partial updates, invariants
//! ├── reputation.rs  - Pure evaluator: tier, success rate, stars
//! ├── service.rs     - Store + evaluator facade
//! └── store/         - SQLite persistence
//! ```

pub mod config;
pub mod error;
pub mod profile;
pub mod reputation;
pub mod service;
pub mod store;
pub mod types;

pub use config::ReputationConfig;
pub use error::{MarketError, MarketResult};
pub use profile::{NotificationSettings, Profile, ProfileUpdate};
pub use reputation::{
    star_slots, success_rate, ReputationEvaluator, ReputationSummary, ResponseTimeCategory,
    StarSlot, Tier,
};
pub use service::ReputationService;
pub use store::ProfileStore;
