//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &mut Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        let tx = conn.transaction()?;
        migrate_v1(&tx)?;
        tx.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tx.commit()?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- STOCK ITEMS
        -- Product identities, created on first reference
        -- ============================================
        CREATE TABLE stock_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,           -- exact, case-sensitive
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- STOCK BATCHES
        -- One row per stock-in, each with its own unit and expiration
        -- ============================================
        CREATE TABLE stock_batches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL REFERENCES stock_items(id) ON DELETE RESTRICT,
            quantity TEXT NOT NULL,              -- exact decimal, e.g. "1.5"
            unit TEXT NOT NULL,                  -- normalized unit symbol
            expiration_date TEXT NOT NULL,       -- ISO date: "2025-06-01"
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_stock_batches_item_expiration ON stock_batches(item_id, expiration_date, id);
        CREATE INDEX idx_stock_batches_expiration ON stock_batches(expiration_date);

        -- ============================================
        -- GROCERY LIST
        -- Names of items to purchase
        -- ============================================
        CREATE TABLE grocery_list (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
