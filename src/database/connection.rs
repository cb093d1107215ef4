//! SQLite database connection management for Handymarks.
//!
//! Provides the [`Database`] struct that wraps a `rusqlite::Connection`
//! behind a mutex and automatically runs schema migrations on open.
//! The mutex (rather than a pool) is enough here: SQLite in WAL mode
//! serializes writers anyway, and enrichment backfill tasks only hold
//! the lock for a single statement at a time.

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::migrations;
use crate::types::errors::StoreError;

/// Core database wrapper providing shared SQLite connection access.
///
/// Cloning a `Database` is cheap and yields a handle to the same
/// underlying connection, so the store and background enrichment tasks
/// can all write through it.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) a SQLite database at the given file path and runs migrations.
    ///
    /// # Errors
    /// Returns `StoreError` if the connection cannot be established or migrations fail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        info!(path = %path.as_ref().display(), "opening bookmark database");
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory SQLite database and runs migrations.
    ///
    /// Useful for testing — the database is discarded when the last
    /// `Database` handle is dropped.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Executes a closure with exclusive access to the connection.
    ///
    /// The lock is never held across an await point; every record
    /// read-modify-write happens inside one call, which is what gives the
    /// store its per-record atomicity.
    pub fn with_connection<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }
}
