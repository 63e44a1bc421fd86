//! Entity store — connection pool and schema.
//!
//! The pool is the only long-lived shared mutable resource in the system:
//! many independent sessions acquire connections concurrently. Every
//! pooled connection gets the `similarity` SQL function registered by the
//! init hook before it is handed out.

use std::sync::atomic::{AtomicU64, Ordering};

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags, params};
use serde_json::Value;
use tracing::info;

use crate::errors::Result;
use crate::trigram::register_similarity;

/// Pool of SQLite connections to the entity store.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// A connection checked out of the pool.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    register_similarity(conn)
}

/// Create a pool backed by a shared in-memory database.
///
/// Each call gets its own database (named shared-cache URI), so parallel
/// tests never observe each other's rows.
pub fn new_in_memory() -> Result<ConnectionPool> {
    static NEXT_DB: AtomicU64 = AtomicU64::new(0);
    let uri = format!(
        "file:marquee_entities_{}?mode=memory&cache=shared",
        NEXT_DB.fetch_add(1, Ordering::Relaxed)
    );
    let manager = SqliteConnectionManager::file(uri)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )
        .with_init(init_connection);
    Ok(r2d2::Pool::builder().max_size(10).build(manager)?)
}

/// Create a pool backed by a database file on disk.
pub fn new_on_disk(path: &str) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        init_connection(conn)
    });
    Ok(r2d2::Pool::builder().max_size(10).build(manager)?)
}

/// Apply the entity store schema. Idempotent.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS entities (
            tenant_id   TEXT NOT NULL,
            id          TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            name        TEXT NOT NULL,
            data        TEXT,
            PRIMARY KEY (tenant_id, id)
        );
        CREATE INDEX IF NOT EXISTS idx_entities_tenant_type
            ON entities (tenant_id, entity_type);",
    )?;
    info!("entity store migrations applied");
    Ok(())
}

/// Insert or replace one catalog record.
///
/// Catalog population proper happens out-of-band; this write path exists
/// for seeding and tests.
pub fn upsert_entity(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    entity_type: &str,
    name: &str,
    data: &Value,
) -> Result<()> {
    let data_text = if data.is_null() {
        None
    } else {
        Some(serde_json::to_string(data).unwrap_or_default())
    };
    let _ = conn.execute(
        "INSERT OR REPLACE INTO entities (tenant_id, id, entity_type, name, data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![tenant_id, id, entity_type, name, data_text],
    )?;
    Ok(())
}
