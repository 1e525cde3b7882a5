//! Database abstraction layer
//!
//! This module provides the persistence capability used by the engine:
//! monitors, append-only check results, incidents and alert channels,
//! backed by a pooled LibSQL (SQLite) database.

pub mod migrations;
pub mod models;
pub mod repository;

pub use repository::{ActiveMonitors, Database, DatabaseImpl, IncidentChange, RecordedCheck};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
