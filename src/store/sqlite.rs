use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::PantryStore;
use crate::db::{Database, DbResult};
use crate::models::{GroceryEntry, StockBatch, StockBatchCreate, StockDetail, StockItem};

/// [`PantryStore`] backed by the pooled SQLite database
///
/// Each call checks a connection out of the pool and runs in autocommit mode.
#[derive(Clone)]
pub struct SqliteStore {
    database: Database,
}

impl SqliteStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl PantryStore for SqliteStore {
    fn find_item(&self, name: &str) -> DbResult<Option<StockItem>> {
        self.database.with_conn(|conn| StockItem::get_by_name(conn, name))
    }

    fn create_item(&self, name: &str) -> DbResult<StockItem> {
        self.database.with_conn(|conn| StockItem::create(conn, name))
    }

    fn insert_batch(&self, data: &StockBatchCreate) -> DbResult<StockBatch> {
        self.database.with_conn(|conn| StockBatch::create(conn, data))
    }

    fn earliest_batch(&self, item_id: i64) -> DbResult<Option<StockBatch>> {
        self.database.with_conn(|conn| StockBatch::earliest_for_item(conn, item_id))
    }

    fn batches_for_item(&self, item_id: i64) -> DbResult<Vec<StockBatch>> {
        self.database.with_conn(|conn| StockBatch::list_for_item(conn, item_id))
    }

    fn update_batch_quantity(&self, batch_id: i64, quantity: Decimal) -> DbResult<()> {
        self.database.with_conn(|conn| {
            StockBatch::update_quantity(conn, batch_id, quantity)?;
            Ok(())
        })
    }

    fn delete_batch(&self, batch_id: i64) -> DbResult<()> {
        self.database.with_conn(|conn| {
            StockBatch::delete(conn, batch_id)?;
            Ok(())
        })
    }

    fn delete_batches_for_item(&self, item_id: i64) -> DbResult<usize> {
        self.database.with_conn(|conn| StockBatch::delete_for_item(conn, item_id))
    }

    fn delete_all_batches(&self) -> DbResult<usize> {
        self.database.with_conn(StockBatch::delete_all)
    }

    fn stock_details(&self) -> DbResult<Vec<StockDetail>> {
        self.database.with_conn(StockDetail::list_all)
    }

    fn expiring_before(&self, cutoff: NaiveDate) -> DbResult<Vec<StockDetail>> {
        self.database.with_conn(|conn| StockDetail::expiring_before(conn, cutoff))
    }

    fn grocery_entry(&self, name: &str) -> DbResult<Option<GroceryEntry>> {
        self.database.with_conn(|conn| GroceryEntry::get_by_name(conn, name))
    }

    fn add_grocery(&self, name: &str) -> DbResult<GroceryEntry> {
        self.database.with_conn(|conn| GroceryEntry::create(conn, name))
    }

    fn remove_grocery(&self, name: &str) -> DbResult<bool> {
        self.database.with_conn(|conn| GroceryEntry::delete_by_name(conn, name))
    }

    fn grocery_list(&self) -> DbResult<Vec<GroceryEntry>> {
        self.database.with_conn(GroceryEntry::list)
    }

    fn clear_grocery(&self) -> DbResult<usize> {
        self.database.with_conn(GroceryEntry::delete_all)
    }
}
