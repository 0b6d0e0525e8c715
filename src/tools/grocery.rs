//! Grocery List MCP Tools

use serde::Serialize;

use crate::ledger::{GroceryAddOutcome, StockLedger};
use crate::store::PantryStore;

/// Response for add_grocery and remove_grocery
#[derive(Debug, Serialize)]
pub struct GroceryChangeResponse {
    pub success: bool,
    pub name: String,
    pub message: String,
}

/// Response for list_grocery
#[derive(Debug, Serialize)]
pub struct GroceryListResponse {
    pub items: Vec<String>,
    pub count: usize,
}

/// Response for clear_grocery
#[derive(Debug, Serialize)]
pub struct ClearGroceryResponse {
    pub success: bool,
    pub removed: usize,
}

/// Add a name to the grocery list
///
/// A name already on the list is reported, not treated as an error.
pub fn add_grocery<S: PantryStore>(ledger: &StockLedger<S>, name: &str) -> Result<GroceryChangeResponse, String> {
    let outcome = ledger
        .add_to_list(name)
        .map_err(|e| format!("Failed to add to grocery list: {}", e))?;

    Ok(match outcome {
        GroceryAddOutcome::Added { item_created } => GroceryChangeResponse {
            success: true,
            name: name.to_string(),
            message: if item_created {
                format!("'{}' added to the grocery list and registered as a new pantry item", name)
            } else {
                format!("'{}' added to the grocery list", name)
            },
        },
        GroceryAddOutcome::AlreadyListed => GroceryChangeResponse {
            success: false,
            name: name.to_string(),
            message: format!("'{}' already exists in the grocery list", name),
        },
    })
}

/// Remove a name from the grocery list
pub fn remove_grocery<S: PantryStore>(ledger: &StockLedger<S>, name: &str) -> Result<GroceryChangeResponse, String> {
    let removed = ledger
        .remove_from_list(name)
        .map_err(|e| format!("Failed to remove from grocery list: {}", e))?;

    let message = if removed {
        format!("'{}' removed from the grocery list", name)
    } else {
        format!("'{}' is not on the grocery list", name)
    };

    Ok(GroceryChangeResponse {
        success: removed,
        name: name.to_string(),
        message,
    })
}

pub fn list_grocery<S: PantryStore>(ledger: &StockLedger<S>) -> Result<GroceryListResponse, String> {
    let items = ledger
        .list_all()
        .map_err(|e| format!("Failed to read grocery list: {}", e))?;

    Ok(GroceryListResponse {
        count: items.len(),
        items,
    })
}

pub fn clear_grocery<S: PantryStore>(ledger: &StockLedger<S>) -> Result<ClearGroceryResponse, String> {
    let removed = ledger
        .clear_list()
        .map_err(|e| format!("Failed to clear grocery list: {}", e))?;

    Ok(ClearGroceryResponse { success: true, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::units::ConversionGraph;
    use std::sync::Arc;

    #[test]
    fn test_grocery_round() {
        let ledger = StockLedger::new(MemoryStore::new(), Arc::new(ConversionGraph::builtin()));

        assert!(add_grocery(&ledger, "Tomate").unwrap().success);
        let duplicate = add_grocery(&ledger, "Tomate").unwrap();
        assert!(!duplicate.success);
        assert!(duplicate.message.contains("already exists"));

        add_grocery(&ledger, "Cebola").unwrap();
        assert_eq!(list_grocery(&ledger).unwrap().items, vec!["Tomate", "Cebola"]);

        assert!(remove_grocery(&ledger, "Tomate").unwrap().success);
        assert!(!remove_grocery(&ledger, "Tomate").unwrap().success);
        assert_eq!(clear_grocery(&ledger).unwrap().removed, 1);
        assert_eq!(list_grocery(&ledger).unwrap().count, 0);
    }
}
