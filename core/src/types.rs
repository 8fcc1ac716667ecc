//! Shared primitive types used across the marketplace core.

use chrono::{DateTime, Utc};

/// A stable, unique identifier for a marketplace user.
pub type UserId = String;

/// Every persisted timestamp is UTC.
pub type Timestamp = DateTime<Utc>;
