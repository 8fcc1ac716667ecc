//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The evaluator and the service call store methods; they never execute SQL.
//! Every read-modify-write runs inside a BEGIN IMMEDIATE transaction, so
//! several stores may share one database file.

use crate::error::MarketResult;
use rusqlite::Connection;
use std::time::Duration;

mod profile;

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ProfileStore {
    conn: Connection,
}

impl ProfileStore {
    pub fn open(path: &str) -> MarketResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        log::debug!("opened profile store at {path}");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> MarketResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> MarketResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_profiles.sql"))?;
        Ok(())
    }
}
