//! Unit Conversion MCP Tools

use rust_decimal::Decimal;
use serde::Serialize;

use super::parse_quantity;
use crate::ledger::StockLedger;
use crate::store::PantryStore;

/// Response for convert_units
#[derive(Debug, Serialize)]
pub struct ConvertUnitsResponse {
    pub quantity: Decimal,
    pub from_unit: String,
    pub amount: Decimal,
    pub unit: String,
}

/// One unit and the units it converts to directly
#[derive(Debug, Serialize)]
pub struct UnitSummary {
    pub unit: String,
    pub converts_to: Vec<String>,
}

/// Response for list_units
#[derive(Debug, Serialize)]
pub struct ListUnitsResponse {
    pub units: Vec<UnitSummary>,
    pub count: usize,
}

pub fn convert_units<S: PantryStore>(
    ledger: &StockLedger<S>,
    quantity: &str,
    from_unit: &str,
    to_unit: &str,
) -> Result<ConvertUnitsResponse, String> {
    let quantity = parse_quantity(quantity)?;
    let converted = ledger
        .convert(quantity, from_unit, to_unit)
        .map_err(|e| e.to_string())?;

    Ok(ConvertUnitsResponse {
        quantity,
        from_unit: crate::units::normalize_unit(from_unit),
        amount: converted.amount,
        unit: converted.unit,
    })
}

/// Every unit with outgoing conversions, alphabetically
pub fn list_units<S: PantryStore>(ledger: &StockLedger<S>) -> ListUnitsResponse {
    let graph = ledger.graph();
    let units: Vec<UnitSummary> = graph
        .units()
        .map(|unit| UnitSummary {
            unit: unit.to_string(),
            converts_to: graph
                .neighbors(unit)
                .map(|targets| {
                    targets
                        .keys()
                        .filter(|target| target.as_str() != unit)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();

    ListUnitsResponse {
        count: units.len(),
        units,
    }
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
    fn test_convert_units() {
        let response = convert_units(&ledger(), "2", "Latas", "ml").unwrap();
        assert_eq!(response.from_unit, "lata");
        assert_eq!(response.amount, dec!(660));

        let err = convert_units(&ledger(), "1", "kg", "undefined_unit").unwrap_err();
        assert!(err.contains("No valid conversion path"));
    }

    #[test]
    fn test_list_units_skips_self_edges() {
        let response = list_units(&ledger());
        let kg = response.units.iter().find(|u| u.unit == "kg").unwrap();
        assert!(kg.converts_to.contains(&"g".to_string()));
        assert!(!kg.converts_to.contains(&"kg".to_string()));
        assert_eq!(response.count, ConversionGraph::builtin().len());
    }
}
