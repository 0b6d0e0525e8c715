use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::PantryStore;
use crate::db::DbResult;
use crate::models::{GroceryEntry, StockBatch, StockBatchCreate, StockDetail, StockItem};

#[derive(Debug, Default)]
struct MemoryState {
    items: Vec<StockItem>,
    batches: Vec<StockBatch>,
    grocery: Vec<GroceryEntry>,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn item_name(&self, item_id: i64) -> String {
        self.items
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.name.clone())
            .unwrap_or_default()
    }

    fn detail(&self, batch: &StockBatch) -> StockDetail {
        StockDetail {
            batch_id: batch.id,
            item_name: self.item_name(batch.item_id),
            quantity: batch.quantity,
            unit: batch.unit.clone(),
            expiration_date: batch.expiration_date,
        }
    }
}

/// In-process [`PantryStore`], for tests and embedding without SQLite
///
/// Rows are kept in insertion order, ids are never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl PantryStore for MemoryStore {
    fn find_item(&self, name: &str) -> DbResult<Option<StockItem>> {
        Ok(self.state().items.iter().find(|item| item.name == name).cloned())
    }

    fn create_item(&self, name: &str) -> DbResult<StockItem> {
        let mut state = self.state();
        let item = StockItem {
            id: state.next_id(),
            name: name.to_string(),
            created_at: now(),
        };
        state.items.push(item.clone());
        Ok(item)
    }

    fn insert_batch(&self, data: &StockBatchCreate) -> DbResult<StockBatch> {
        let mut state = self.state();
        let batch = StockBatch {
            id: state.next_id(),
            item_id: data.item_id,
            quantity: data.quantity.normalize(),
            unit: data.unit.clone(),
            expiration_date: data.expiration_date,
            created_at: now(),
        };
        state.batches.push(batch.clone());
        Ok(batch)
    }

    fn earliest_batch(&self, item_id: i64) -> DbResult<Option<StockBatch>> {
        Ok(self
            .state()
            .batches
            .iter()
            .filter(|batch| batch.item_id == item_id)
            .min_by_key(|batch| (batch.expiration_date, batch.id))
            .cloned())
    }

    fn batches_for_item(&self, item_id: i64) -> DbResult<Vec<StockBatch>> {
        Ok(self
            .state()
            .batches
            .iter()
            .filter(|batch| batch.item_id == item_id)
            .cloned()
            .collect())
    }

    fn update_batch_quantity(&self, batch_id: i64, quantity: Decimal) -> DbResult<()> {
        if let Some(batch) = self.state().batches.iter_mut().find(|b| b.id == batch_id) {
            batch.quantity = quantity.normalize();
        }
        Ok(())
    }

    fn delete_batch(&self, batch_id: i64) -> DbResult<()> {
        self.state().batches.retain(|batch| batch.id != batch_id);
        Ok(())
    }

    fn delete_batches_for_item(&self, item_id: i64) -> DbResult<usize> {
        let mut state = self.state();
        let before = state.batches.len();
        state.batches.retain(|batch| batch.item_id != item_id);
        Ok(before - state.batches.len())
    }

    fn delete_all_batches(&self) -> DbResult<usize> {
        let mut state = self.state();
        let removed = state.batches.len();
        state.batches.clear();
        Ok(removed)
    }

    fn stock_details(&self) -> DbResult<Vec<StockDetail>> {
        let state = self.state();
        let mut details: Vec<StockDetail> = state.batches.iter().map(|b| state.detail(b)).collect();
        details.sort_by(|a, b| {
            (&a.item_name, a.expiration_date, a.batch_id).cmp(&(&b.item_name, b.expiration_date, b.batch_id))
        });
        Ok(details)
    }

    fn expiring_before(&self, cutoff: NaiveDate) -> DbResult<Vec<StockDetail>> {
        let state = self.state();
        let mut details: Vec<StockDetail> = state
            .batches
            .iter()
            .filter(|batch| batch.expiration_date <= cutoff)
            .map(|b| state.detail(b))
            .collect();
        details.sort_by(|a, b| {
            (a.expiration_date, &a.item_name, a.batch_id).cmp(&(b.expiration_date, &b.item_name, b.batch_id))
        });
        Ok(details)
    }

    fn grocery_entry(&self, name: &str) -> DbResult<Option<GroceryEntry>> {
        Ok(self.state().grocery.iter().find(|entry| entry.name == name).cloned())
    }

    fn add_grocery(&self, name: &str) -> DbResult<GroceryEntry> {
        let mut state = self.state();
        let entry = GroceryEntry {
            id: state.next_id(),
            name: name.to_string(),
            created_at: now(),
        };
        state.grocery.push(entry.clone());
        Ok(entry)
    }

    fn remove_grocery(&self, name: &str) -> DbResult<bool> {
        let mut state = self.state();
        let before = state.grocery.len();
        state.grocery.retain(|entry| entry.name != name);
        Ok(state.grocery.len() < before)
    }

    fn grocery_list(&self) -> DbResult<Vec<GroceryEntry>> {
        Ok(self.state().grocery.clone())
    }

    fn clear_grocery(&self) -> DbResult<usize> {
        let mut state = self.state();
        let removed = state.grocery.len();
        state.grocery.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_earliest_batch_ties_break_on_insertion() {
        let store = MemoryStore::new();
        let (item, _) = store.get_or_create_item("Massa").unwrap();
        let expires = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let first = store
            .insert_batch(&StockBatchCreate {
                item_id: item.id,
                quantity: dec!(1),
                unit: "pacote".to_string(),
                expiration_date: expires,
            })
            .unwrap();
        store
            .insert_batch(&StockBatchCreate {
                item_id: item.id,
                quantity: dec!(2),
                unit: "pacote".to_string(),
                expiration_date: expires,
            })
            .unwrap();

        assert_eq!(store.earliest_batch(item.id).unwrap().unwrap().id, first.id);
    }
}
