//! Pantry Status Tool
//!
//! Provides runtime status information about the pantry service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::migrations::get_schema_version;
use crate::db::Database;
use crate::models::{StockBatch, StockItem};

/// Pantry usage instructions for AI assistants
pub const PANTRY_INSTRUCTIONS: &str = r#"
# Pantry Stock Ledger Instructions

The pantry keeps one batch per purchase. Each batch has its own quantity,
unit and expiration date. Items are matched by exact, case-sensitive name.

## Adding stock

**Tool:** `insert_stock`
- `name`: item name, e.g. "Leite"
- `quantity`: decimal as a string, e.g. "1.5"
- `unit`: e.g. "l", "ml", "kg", "g", "lata", "pacote" (plurals are accepted: "latas")
- `expiration_date`: YYYY-MM-DD

Every call creates a new batch. Batches are never merged.

## Using stock

**Tool:** `remove_stock`
- Removes from the batch that expires first.
- If the amount is larger than that batch, the batch is deleted and the rest is
  taken from the next batch, converting units as needed.
- Removals are not rolled back. If the pantry runs out part way through, the
  batches already consumed stay consumed and the error says how much was left.

## Checking stock

- `query_stock`: total for one item, in the unit of its first batch
- `list_stock`: every batch, by name then expiration
- `expiring_stock`: batches expiring within `within_days` (default 7) or on or
  before a `before` date

## Units

- `convert_units`: convert a quantity between two units
- `list_units`: every known unit and its direct conversions

Units with no conversions (e.g. "dúzia") can still be stored, but can only be
removed in that same unit.

## Grocery list

`add_grocery`, `remove_grocery`, `list_grocery`, `clear_grocery`. Adding a name
also registers it as a pantry item. Adding a name twice is reported, not an
error.

## Clearing

- `remove_all_stock`: every batch of one item (the item itself is kept)
- `clear_stock`: every batch of every item
"#;

/// Runtime status of the pantry service
#[derive(Debug, Clone, Serialize)]
pub struct PantryStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,
    pub item_count: Option<i64>,
    pub batch_count: Option<i64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    ///
    /// Database figures are left empty if the database cannot be read.
    pub fn get_status(&self, database: &Database) -> PantryStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let counts = database.with_conn(|conn| {
            Ok((
                get_schema_version(conn)?,
                StockItem::count(conn)?,
                StockBatch::count(conn)?,
            ))
        });
        let (schema_version, item_count, batch_count) = match counts {
            Ok((version, items, batches)) => (Some(version), Some(items), Some(batches)),
            Err(e) => {
                tracing::warn!(error = %e, "could not read database status");
                (None, None, None)
            }
        };

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        PantryStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            item_count,
            batch_count,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::{run_migrations, SCHEMA_VERSION};

    #[test]
    fn test_status_reports_database() {
        let database = Database::open_in_memory().unwrap();
        database.with_conn_mut(run_migrations).unwrap();

        let tracker = StatusTracker::new(PathBuf::from(":memory:"));
        let status = tracker.get_status(&database);

        assert_eq!(status.schema_version, Some(SCHEMA_VERSION));
        assert_eq!(status.item_count, Some(0));
        assert_eq!(status.batch_count, Some(0));
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_status_without_schema() {
        let database = Database::open_in_memory().unwrap();
        let status = StatusTracker::new(PathBuf::from(":memory:")).get_status(&database);
        assert_eq!(status.schema_version, None);
    }
}
