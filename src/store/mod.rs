//! Storage handle for the stock ledger
//!
//! The ledger only talks to storage through [`PantryStore`]. Every call is a
//! single committed unit of work; the ledger never spans a transaction across
//! calls.

mod memory;
mod sqlite;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::db::DbResult;
use crate::models::{GroceryEntry, StockBatch, StockBatchCreate, StockDetail, StockItem};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub trait PantryStore: Send + Sync {
    fn find_item(&self, name: &str) -> DbResult<Option<StockItem>>;
    fn create_item(&self, name: &str) -> DbResult<StockItem>;

    fn insert_batch(&self, data: &StockBatchCreate) -> DbResult<StockBatch>;
    /// Earliest expiration first, insertion order breaking ties
    fn earliest_batch(&self, item_id: i64) -> DbResult<Option<StockBatch>>;
    /// Insertion order
    fn batches_for_item(&self, item_id: i64) -> DbResult<Vec<StockBatch>>;
    fn update_batch_quantity(&self, batch_id: i64, quantity: Decimal) -> DbResult<()>;
    fn delete_batch(&self, batch_id: i64) -> DbResult<()>;
    fn delete_batches_for_item(&self, item_id: i64) -> DbResult<usize>;
    fn delete_all_batches(&self) -> DbResult<usize>;

    fn stock_details(&self) -> DbResult<Vec<StockDetail>>;
    fn expiring_before(&self, cutoff: NaiveDate) -> DbResult<Vec<StockDetail>>;

    fn grocery_entry(&self, name: &str) -> DbResult<Option<GroceryEntry>>;
    fn add_grocery(&self, name: &str) -> DbResult<GroceryEntry>;
    fn remove_grocery(&self, name: &str) -> DbResult<bool>;
    fn grocery_list(&self) -> DbResult<Vec<GroceryEntry>>;
    fn clear_grocery(&self) -> DbResult<usize>;

    /// Look an item up by name, creating it when absent. The flag is true if created
    fn get_or_create_item(&self, name: &str) -> DbResult<(StockItem, bool)> {
        match self.find_item(name)? {
            Some(item) => Ok((item, false)),
            None => Ok((self.create_item(name)?, true)),
        }
    }
}
