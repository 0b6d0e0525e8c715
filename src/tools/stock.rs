//! Stock MCP Tools
//!
//! Tools for adding, removing and inspecting pantry stock.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{parse_date, parse_quantity};
use crate::ledger::{RemovalHop, StockLedger};
use crate::models::StockDetail;
use crate::store::PantryStore;

/// Response for insert_stock
#[derive(Debug, Serialize)]
pub struct InsertStockResponse {
    pub success: bool,
    pub item_id: i64,
    pub item_name: String,
    pub item_created: bool,
    pub batch_id: i64,
    pub quantity: Decimal,
    pub unit: String,
    pub expiration_date: NaiveDate,
}

/// Response for remove_stock
#[derive(Debug, Serialize)]
pub struct RemoveStockResponse {
    pub success: bool,
    pub item_name: String,
    pub hops: Vec<RemovalHop>,
}

/// Response for query_stock
#[derive(Debug, Serialize)]
pub struct QueryStockResponse {
    pub found: bool,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for bulk deletions
#[derive(Debug, Serialize)]
pub struct ClearStockResponse {
    pub success: bool,
    pub removed: usize,
    pub message: String,
}

/// Response for list_stock and expiring_stock
#[derive(Debug, Serialize)]
pub struct StockListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<NaiveDate>,
    pub batches: Vec<StockDetail>,
    pub count: usize,
}

/// Add a batch of an item
pub fn insert_stock<S: PantryStore>(
    ledger: &StockLedger<S>,
    name: &str,
    quantity: &str,
    unit: &str,
    expiration_date: &str,
) -> Result<InsertStockResponse, String> {
    let quantity = parse_quantity(quantity)?;
    let expiration_date = parse_date(expiration_date)?;

    let outcome = ledger
        .insert_batch(name, quantity, unit, expiration_date)
        .map_err(|e| format!("Failed to insert stock: {}", e))?;

    Ok(InsertStockResponse {
        success: true,
        item_id: outcome.item.id,
        item_name: outcome.item.name,
        item_created: outcome.item_created,
        batch_id: outcome.batch.id,
        quantity: outcome.batch.quantity,
        unit: outcome.batch.unit,
        expiration_date: outcome.batch.expiration_date,
    })
}

/// Remove a quantity of an item, earliest-expiring batches first
pub fn remove_stock<S: PantryStore>(
    ledger: &StockLedger<S>,
    name: &str,
    quantity: &str,
    unit: &str,
) -> Result<RemoveStockResponse, String> {
    let quantity = parse_quantity(quantity)?;

    let report = ledger
        .remove_quantity(name, quantity, unit)
        .map_err(|e| format!("Failed to remove stock: {}", e))?;

    Ok(RemoveStockResponse {
        success: true,
        item_name: report.item.name,
        hops: report.hops,
    })
}

/// Total stock of an item
pub fn query_stock<S: PantryStore>(ledger: &StockLedger<S>, name: &str) -> Result<QueryStockResponse, String> {
    let total = ledger
        .query_total(name)
        .map_err(|e| format!("Failed to query stock: {}", e))?;

    Ok(match total {
        Some(total) => QueryStockResponse {
            found: true,
            item_name: total.item.name,
            total: Some(total.total),
            unit: Some(total.unit),
            batch_count: Some(total.batch_count),
            message: None,
        },
        None => QueryStockResponse {
            found: false,
            item_name: name.to_string(),
            total: None,
            unit: None,
            batch_count: None,
            message: Some(format!("No stock found for '{}'", name)),
        },
    })
}

/// Remove every batch of an item
pub fn remove_all_stock<S: PantryStore>(ledger: &StockLedger<S>, name: &str) -> Result<ClearStockResponse, String> {
    let removed = ledger
        .remove_all_batches(name)
        .map_err(|e| format!("Failed to remove stock: {}", e))?;

    Ok(match removed {
        Some(removed) => ClearStockResponse {
            success: true,
            removed,
            message: format!("Removed {} batch(es) of '{}'", removed, name),
        },
        None => ClearStockResponse {
            success: false,
            removed: 0,
            message: format!("Item '{}' does not exist in the pantry", name),
        },
    })
}

/// Remove every batch of every item
pub fn clear_stock<S: PantryStore>(ledger: &StockLedger<S>) -> Result<ClearStockResponse, String> {
    let removed = ledger
        .clear_all()
        .map_err(|e| format!("Failed to clear stock: {}", e))?;

    Ok(ClearStockResponse {
        success: true,
        removed,
        message: format!("Removed {} batch(es) from the pantry", removed),
    })
}

/// Every batch in the pantry
pub fn list_stock<S: PantryStore>(ledger: &StockLedger<S>) -> Result<StockListResponse, String> {
    let batches = ledger
        .list_stock()
        .map_err(|e| format!("Failed to list stock: {}", e))?;

    Ok(StockListResponse {
        cutoff: None,
        count: batches.len(),
        batches,
    })
}

/// Batches expiring on or before a cutoff
///
/// The cutoff is `before` when given, otherwise `today + within_days`
/// (default 7 days).
pub fn expiring_stock<S: PantryStore>(
    ledger: &StockLedger<S>,
    within_days: Option<i64>,
    before: Option<&str>,
    today: NaiveDate,
) -> Result<StockListResponse, String> {
    let cutoff = match before {
        Some(before) => parse_date(before)?,
        None => {
            let days = within_days.unwrap_or(7);
            if days < 0 {
                return Err("within_days cannot be negative".to_string());
            }
            today
                .checked_add_signed(Duration::days(days))
                .ok_or_else(|| format!("within_days is too large: {}", days))?
        }
    };

    let batches = ledger
        .expiring_before(cutoff)
        .map_err(|e| format!("Failed to list expiring stock: {}", e))?;

    Ok(StockListResponse {
        cutoff: Some(cutoff),
        count: batches.len(),
        batches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::units::ConversionGraph;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn ledger() -> StockLedger<MemoryStore> {
        StockLedger::new(MemoryStore::new(), Arc::new(ConversionGraph::builtin()))
    }

    #[test]
    fn test_insert_and_query() {
        let ledger = ledger();
        let inserted = insert_stock(&ledger, "Leite", "1", "l", "2025-02-01").unwrap();
        assert!(inserted.item_created);
        insert_stock(&ledger, "Leite", "500", "ml", "2025-02-03").unwrap();

        let query = query_stock(&ledger, "Leite").unwrap();
        assert!(query.found);
        assert_eq!(query.total, Some(dec!(1.5)));
        assert_eq!(query.unit.as_deref(), Some("l"));
        assert_eq!(query.batch_count, Some(2));
    }

    #[test]
    fn test_insert_rejects_malformed_arguments() {
        let ledger = ledger();
        assert!(insert_stock(&ledger, "Leite", "a lot", "l", "2025-02-01").is_err());
        assert!(insert_stock(&ledger, "Leite", "1", "l", "tomorrow").is_err());
        assert!(insert_stock(&ledger, "Leite", "0", "l", "2025-02-01").is_err());
    }

    #[test]
    fn test_query_missing_item_is_not_an_error() {
        let query = query_stock(&ledger(), "Nada").unwrap();
        assert!(!query.found);
        assert!(query.message.unwrap().contains("No stock found"));

        let json = serde_json::to_value(query_stock(&ledger(), "Nada").unwrap()).unwrap();
        assert!(json.get("total").is_none());
    }

    #[test]
    fn test_remove_reports_hops() {
        let ledger = ledger();
        insert_stock(&ledger, "Arroz", "2", "kg", "2025-01-01").unwrap();
        insert_stock(&ledger, "Arroz", "5", "kg", "2025-06-01").unwrap();

        let removed = remove_stock(&ledger, "Arroz", "4", "kg").unwrap();
        assert_eq!(removed.hops.len(), 2);

        let err = remove_stock(&ledger, "Feijão", "1", "kg").unwrap_err();
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn test_remove_all_and_clear_messages() {
        let ledger = ledger();
        insert_stock(&ledger, "Arroz", "2", "kg", "2025-01-01").unwrap();

        let missing = remove_all_stock(&ledger, "Nada").unwrap();
        assert!(!missing.success);
        assert!(missing.message.contains("does not exist"));

        assert_eq!(remove_all_stock(&ledger, "Arroz").unwrap().removed, 1);
        assert_eq!(clear_stock(&ledger).unwrap().removed, 0);
    }

    #[test]
    fn test_expiring_stock_cutoffs() {
        let ledger = ledger();
        insert_stock(&ledger, "Iogurte", "4", "uni", "2025-01-03").unwrap();
        insert_stock(&ledger, "Arroz", "1", "kg", "2025-12-01").unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let week = expiring_stock(&ledger, None, None, today).unwrap();
        assert_eq!(week.count, 1);
        assert_eq!(week.cutoff, NaiveDate::from_ymd_opt(2025, 1, 8));

        let explicit = expiring_stock(&ledger, Some(1), Some("2025-12-31"), today).unwrap();
        assert_eq!(explicit.count, 2);

        assert!(expiring_stock(&ledger, Some(-1), None, today).is_err());
        assert_eq!(list_stock(&ledger).unwrap().count, 2);
    }
}
