//! Data models
//!
//! Rust structs representing database entities.

mod grocery_entry;
mod stock_batch;
mod stock_item;

pub use grocery_entry::GroceryEntry;
pub use stock_batch::{StockBatch, StockBatchCreate, StockDetail};
pub use stock_item::StockItem;
