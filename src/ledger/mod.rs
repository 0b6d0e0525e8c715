//! Stock ledger
//!
//! Applies additions and removals to the per-item batch ledger, reconciling
//! units through the conversion graph.
//!
//! Removal consumes batches earliest expiration first. When the requested
//! amount exceeds a batch, the batch is deleted and the remainder carries on to
//! the next batch in that batch's unit. Each hop is committed before the next
//! one starts and nothing is rolled back: if batches run out mid-cascade the
//! hops already applied stay applied and [`LedgerError::NoBatches`] reports
//! what was left over.

mod error;
mod locks;

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{StockBatch, StockBatchCreate, StockDetail, StockItem};
use crate::store::PantryStore;
use crate::units::{self, normalize_unit, ConversionGraph, Quantity};

pub use error::{LedgerError, LedgerResult};
use locks::ItemLocks;

/// What a removal hop did to a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HopAction {
    Deleted,
    Decremented,
}

/// One committed step of a removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalHop {
    pub batch_id: i64,
    pub action: HopAction,
    /// Amount taken from the batch, in the batch's unit
    pub removed: Decimal,
    pub unit: String,
    /// Quantity left in the batch after this hop
    pub remaining_in_batch: Decimal,
    pub expiration_date: NaiveDate,
}

/// Outcome of a successful removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    pub item: StockItem,
    pub hops: Vec<RemovalHop>,
}

/// Aggregated stock of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockTotal {
    pub item: StockItem,
    pub total: Decimal,
    /// Unit of the first batch, all other batches converted into it
    pub unit: String,
    pub batch_count: usize,
}

/// Result of a successful insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub item: StockItem,
    pub item_created: bool,
    pub batch: StockBatch,
}

/// Result of adding a name to the grocery list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroceryAddOutcome {
    Added { item_created: bool },
    AlreadyListed,
}

/// The stock ledger over an injected store and a read-only conversion graph
pub struct StockLedger<S> {
    store: S,
    graph: Arc<ConversionGraph>,
    locks: ItemLocks,
}

impl<S: PantryStore> StockLedger<S> {
    pub fn new(store: S, graph: Arc<ConversionGraph>) -> Self {
        Self {
            store,
            graph,
            locks: ItemLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn graph(&self) -> &ConversionGraph {
        &self.graph
    }

    /// Record a new batch, creating the item on first reference
    ///
    /// Every insert is its own row; batches are never merged.
    pub fn insert_batch(
        &self,
        item_name: &str,
        quantity: Decimal,
        unit: &str,
        expiration_date: NaiveDate,
    ) -> LedgerResult<InsertOutcome> {
        let item_name = validate_name(item_name)?;
        validate_quantity(quantity)?;
        let unit = normalize_unit(unit);
        if unit.is_empty() {
            return Err(LedgerError::InvalidInput("unit cannot be empty".to_string()));
        }
        if !self.graph.contains(&unit) {
            tracing::warn!(item = item_name, unit = %unit, "unit has no conversions; batch can only be removed in the same unit");
        }

        self.locks.with_item_write(item_name, || {
            let (item, item_created) = self.store.get_or_create_item(item_name)?;
            if item_created {
                tracing::info!(item = item_name, item_id = item.id, "created stock item");
            }

            let batch = self.store.insert_batch(&StockBatchCreate {
                item_id: item.id,
                quantity,
                unit,
                expiration_date,
            })?;
            tracing::info!(
                item = item_name,
                batch_id = batch.id,
                quantity = %batch.quantity,
                unit = %batch.unit,
                expiration = %batch.expiration_date,
                "inserted stock batch"
            );

            Ok(InsertOutcome {
                item,
                item_created,
                batch,
            })
        })
    }

    /// Remove `quantity` of `unit` from an item, earliest-expiring batches first
    pub fn remove_quantity(
        &self,
        item_name: &str,
        quantity: Decimal,
        unit: &str,
    ) -> LedgerResult<RemovalReport> {
        validate_quantity(quantity)?;

        self.locks.with_item_write(item_name, || {
            let item = self
                .store
                .find_item(item_name)?
                .ok_or_else(|| LedgerError::ItemNotFound(item_name.to_string()))?;

            let hops = self.cascade_removal(&item, quantity, normalize_unit(unit))?;
            Ok(RemovalReport { item, hops })
        })
    }

    /// The removal loop. Caller holds the item's write lock.
    fn cascade_removal(
        &self,
        item: &StockItem,
        quantity: Decimal,
        unit: String,
    ) -> LedgerResult<Vec<RemovalHop>> {
        let mut hops = Vec::new();
        let mut pending = Quantity::new(quantity, unit);

        loop {
            let Some(batch) = self.store.earliest_batch(item.id)? else {
                if !hops.is_empty() {
                    tracing::warn!(
                        item = %item.name,
                        remaining = %pending,
                        hops = hops.len(),
                        "stock ran out mid-removal; earlier hops stay committed"
                    );
                }
                return Err(LedgerError::NoBatches {
                    item: item.name.clone(),
                    remaining: pending.amount,
                    unit: pending.unit,
                });
            };

            let requested = if batch.unit == pending.unit {
                pending.amount
            } else {
                units::convert(pending.amount, &pending.unit, &batch.unit, &self.graph)?.amount
            };

            // Rounding residue from earlier converted removals counts as an exact match
            let ordering = if units::approx_eq(requested, batch.quantity) {
                Ordering::Equal
            } else {
                requested.cmp(&batch.quantity)
            };

            match ordering {
                Ordering::Equal => {
                    self.store.delete_batch(batch.id)?;
                    hops.push(hop(&batch, HopAction::Deleted, batch.quantity, Decimal::ZERO));
                    break;
                }
                Ordering::Less => {
                    let left = (batch.quantity - requested).normalize();
                    self.store.update_batch_quantity(batch.id, left)?;
                    hops.push(hop(&batch, HopAction::Decremented, requested, left));
                    break;
                }
                Ordering::Greater => {
                    self.store.delete_batch(batch.id)?;
                    hops.push(hop(&batch, HopAction::Deleted, batch.quantity, Decimal::ZERO));
                    pending = Quantity::new((requested - batch.quantity).normalize(), batch.unit.clone());
                    tracing::debug!(item = %item.name, batch_id = batch.id, remaining = %pending, "batch consumed, continuing");
                }
            }
        }

        for h in &hops {
            tracing::info!(
                item = %item.name,
                batch_id = h.batch_id,
                action = ?h.action,
                removed = %h.removed,
                unit = %h.unit,
                "removed stock"
            );
        }
        Ok(hops)
    }

    /// Total stock of an item in the unit of its first batch
    ///
    /// Returns `None` when the item is unknown or has no batches. A batch whose
    /// unit cannot be converted to the base unit fails the whole query.
    pub fn query_total(&self, item_name: &str) -> LedgerResult<Option<StockTotal>> {
        self.locks.with_item_read(item_name, || {
            let Some(item) = self.store.find_item(item_name)? else {
                return Ok(None);
            };
            let batches = self.store.batches_for_item(item.id)?;
            let Some(first) = batches.first() else {
                return Ok(None);
            };

            let base_unit = first.unit.clone();
            let mut total = Decimal::ZERO;
            for batch in &batches {
                let amount = if batch.unit == base_unit {
                    batch.quantity
                } else {
                    units::convert(batch.quantity, &batch.unit, &base_unit, &self.graph)?.amount
                };
                total = total
                    .checked_add(amount)
                    .ok_or_else(|| LedgerError::Overflow(item.name.clone()))?;
            }

            Ok(Some(StockTotal {
                item,
                total: total.normalize(),
                unit: base_unit,
                batch_count: batches.len(),
            }))
        })
    }

    /// Delete every batch of an item, keeping the item itself
    ///
    /// Returns `None` when the item does not exist.
    pub fn remove_all_batches(&self, item_name: &str) -> LedgerResult<Option<usize>> {
        self.locks.with_item_write(item_name, || {
            let Some(item) = self.store.find_item(item_name)? else {
                return Ok(None);
            };
            let removed = self.store.delete_batches_for_item(item.id)?;
            tracing::info!(item = item_name, removed, "removed all batches of item");
            Ok(Some(removed))
        })
    }

    /// Delete every batch of every item
    pub fn clear_all(&self) -> LedgerResult<usize> {
        self.locks.with_all_write(|| {
            let removed = self.store.delete_all_batches()?;
            tracing::info!(removed, "cleared pantry");
            Ok(removed)
        })
    }

    /// Every batch in the pantry, by item name then expiration
    pub fn list_stock(&self) -> LedgerResult<Vec<StockDetail>> {
        Ok(self.store.stock_details()?)
    }

    /// Batches expiring on or before `cutoff`, earliest first
    pub fn expiring_before(&self, cutoff: NaiveDate) -> LedgerResult<Vec<StockDetail>> {
        Ok(self.store.expiring_before(cutoff)?)
    }

    /// Convert with this ledger's graph
    pub fn convert(&self, quantity: Decimal, from_unit: &str, to_unit: &str) -> LedgerResult<Quantity> {
        Ok(units::convert(quantity, from_unit, to_unit, &self.graph)?)
    }

    // --- Grocery list ---

    /// Put a name on the grocery list, creating the stock item if needed
    pub fn add_to_list(&self, name: &str) -> LedgerResult<GroceryAddOutcome> {
        let name = validate_name(name)?;
        self.locks.with_item_write(name, || {
            let (_, item_created) = self.store.get_or_create_item(name)?;
            if self.store.grocery_entry(name)?.is_some() {
                return Ok(GroceryAddOutcome::AlreadyListed);
            }
            self.store.add_grocery(name)?;
            tracing::info!(item = name, item_created, "added to grocery list");
            Ok(GroceryAddOutcome::Added { item_created })
        })
    }

    /// Returns false if the name was not on the list
    pub fn remove_from_list(&self, name: &str) -> LedgerResult<bool> {
        let removed = self.store.remove_grocery(name)?;
        if removed {
            tracing::info!(item = name, "removed from grocery list");
        }
        Ok(removed)
    }

    pub fn list_all(&self) -> LedgerResult<Vec<String>> {
        Ok(self
            .store
            .grocery_list()?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    pub fn clear_list(&self) -> LedgerResult<usize> {
        let removed = self.store.clear_grocery()?;
        tracing::info!(removed, "cleared grocery list");
        Ok(removed)
    }
}

fn hop(batch: &StockBatch, action: HopAction, removed: Decimal, remaining_in_batch: Decimal) -> RemovalHop {
    RemovalHop {
        batch_id: batch.id,
        action,
        removed,
        unit: batch.unit.clone(),
        remaining_in_batch,
        expiration_date: batch.expiration_date,
    }
}

/// Names are matched exactly, so only blank names are rejected
fn validate_name(name: &str) -> LedgerResult<&str> {
    if name.trim().is_empty() {
        return Err(LedgerError::InvalidInput("item name cannot be empty".to_string()));
    }
    Ok(name)
}

fn validate_quantity(quantity: Decimal) -> LedgerResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    Ok(())
}
