//! Unit conversion
//!
//! Converts quantities between units by walking the conversion graph. A direct
//! edge always wins; otherwise the first path found by a depth-first search is
//! used. No shortest-path search is performed.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::graph::{normalize_unit, ConversionGraph};

/// Decimal places kept on converted quantities
pub const CONVERSION_SCALE: u32 = 12;

/// Decimal places below which two quantities count as equal
///
/// Each converted amount carries up to half a unit of rounding at
/// [`CONVERSION_SCALE`], and repeated partial removals accumulate it.
pub const TOLERANCE_SCALE: u32 = 9;

/// Whether `a` and `b` differ only by accumulated conversion rounding
pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    match a.checked_sub(b) {
        Some(diff) => diff.abs() <= Decimal::new(1, TOLERANCE_SCALE),
        None => false,
    }
}

/// No route exists between two units in the graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No valid conversion path found from {from} to {to}")]
pub struct NoConversionPath {
    pub from: String,
    pub to: String,
}

/// A decimal amount tagged with its unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quantity {
    pub amount: Decimal,
    pub unit: String,
}

impl Quantity {
    pub fn new(amount: Decimal, unit: impl Into<String>) -> Self {
        Self {
            amount,
            unit: unit.into(),
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

/// Convert `quantity` from `from_unit` to `to_unit`
///
/// Both units are normalized before lookup. The result is expressed in the
/// normalized target unit.
pub fn convert(
    quantity: Decimal,
    from_unit: &str,
    to_unit: &str,
    graph: &ConversionGraph,
) -> Result<Quantity, NoConversionPath> {
    let from = normalize_unit(from_unit);
    let to = normalize_unit(to_unit);

    if from == to {
        return Ok(Quantity::new(quantity, to));
    }

    let mut visited = HashSet::new();
    visited.insert(from.as_str());

    match find_path(quantity, &from, &to, graph, &mut visited) {
        Some(amount) => {
            let amount = amount.round_dp(CONVERSION_SCALE).normalize();
            tracing::debug!(%quantity, from = %from, to = %to, %amount, "converted quantity");
            Ok(Quantity::new(amount, to))
        }
        None => {
            tracing::debug!(from = %from, to = %to, "no conversion path");
            Err(NoConversionPath { from, to })
        }
    }
}

/// Depth-first search; `visited` is shared by every branch of the search
fn find_path<'g>(
    amount: Decimal,
    current: &str,
    target: &str,
    graph: &'g ConversionGraph,
    visited: &mut HashSet<&'g str>,
) -> Option<Decimal> {
    let neighbors = graph.neighbors(current)?;

    if let Some(factor) = neighbors.get(target) {
        return amount.checked_mul(*factor);
    }

    for (next, factor) in neighbors {
        if !visited.insert(next.as_str()) {
            continue;
        }
        let Some(next_amount) = amount.checked_mul(*factor) else {
            tracing::warn!(from = %current, to = %next, "conversion overflow, abandoning branch");
            continue;
        };
        if let Some(found) = find_path(next_amount, next, target, graph, visited) {
            return Some(found);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn builtin() -> ConversionGraph {
        ConversionGraph::builtin()
    }

    #[test]
    fn test_direct_conversion() {
        let result = convert(dec!(2), "kg", "g", &builtin()).unwrap();
        assert_eq!(result, Quantity::new(dec!(2000), "g"));
    }

    #[test]
    fn test_units_are_normalized() {
        let result = convert(dec!(2), "Latas", "ML", &builtin()).unwrap();
        assert_eq!(result.amount, dec!(660));
        assert_eq!(result.unit, "ml");
    }

    #[test]
    fn test_identity_conversion() {
        let result = convert(dec!(3), "latas", "lata", &builtin()).unwrap();
        assert_eq!(result.amount, dec!(3));
        assert_eq!(result.unit, "lata");
    }

    #[test]
    fn test_approx_eq_absorbs_rounding() {
        assert!(approx_eq(dec!(0.045454545455), dec!(0.045454545445)));
        assert!(approx_eq(dec!(1), dec!(1)));
        assert!(!approx_eq(dec!(1), dec!(1.00001)));
        assert!(!approx_eq(Decimal::MAX, Decimal::MIN));
    }

    #[test]
    fn test_multi_hop_conversion() {
        // caixa -> saqueta -> g -> kg
        let result = convert(dec!(1), "caixa", "kg", &builtin()).unwrap();
        assert_eq!(result.amount, dec!(0.1));

        let result = convert(dec!(2), "garrafa", "ml", &builtin()).unwrap();
        assert_eq!(result.amount, dec!(3000));
    }

    #[test]
    fn test_metric_to_kitchen_unit_through_inverse() {
        let result = convert(dec!(0.33), "l", "lata", &builtin()).unwrap();
        assert_eq!(result.amount, dec!(1));

        let result = convert(dec!(45), "ml", "colher de sopa", &builtin()).unwrap();
        assert_eq!(result.amount, dec!(3));
    }

    #[test]
    fn test_round_trip() {
        let graph = builtin();
        for (x, a, b) in [
            (dec!(1.25), "l", "ml"),
            (dec!(3), "lata", "copo"),
            (dec!(0.5), "kg", "tablete"),
            (dec!(7), "saqueta", "g"),
        ] {
            let there = convert(x, a, b, &graph).unwrap();
            let back = convert(there.amount, b, a, &graph).unwrap();
            assert!((back.amount - x).abs() < dec!(0.000001), "{} {} -> {} -> {}", x, a, b, back);
        }
    }

    #[test]
    fn test_no_path_to_unknown_unit() {
        let err = convert(dec!(1), "kg", "undefined_unit", &builtin()).unwrap_err();
        assert_eq!(
            err,
            NoConversionPath {
                from: "kg".to_string(),
                to: "undefined_unit".to_string()
            }
        );
    }

    #[test]
    fn test_no_path_from_isolated_unit() {
        let mut graph = ConversionGraph::new();
        graph.insert("g", "kg", dec!(0.001)).unwrap();
        assert!(convert(dec!(1), "kg", "g", &graph).is_err());
        assert!(convert(dec!(1), "pitada", "g", &graph).is_err());
    }

    #[test]
    fn test_direct_edge_beats_multi_hop_path() {
        // The direct factor disagrees with the a -> b -> c path on purpose
        let mut graph = ConversionGraph::new();
        graph.insert("a", "b", dec!(2)).unwrap();
        graph.insert("b", "c", dec!(3)).unwrap();
        graph.insert("a", "c", dec!(5)).unwrap();

        let result = convert(dec!(1), "a", "c", &graph).unwrap();
        assert_eq!(result.amount, dec!(5));
    }

    #[test]
    fn test_first_path_found_not_shortest() {
        // From "a", neighbor "b" is explored before "z" and leads to "t" the long way
        let mut graph = ConversionGraph::new();
        graph.insert("a", "b", dec!(2)).unwrap();
        graph.insert("b", "c", dec!(2)).unwrap();
        graph.insert("c", "t", dec!(2)).unwrap();
        graph.insert("a", "z", dec!(10)).unwrap();
        graph.insert("z", "t", dec!(10)).unwrap();

        let result = convert(dec!(1), "a", "t", &graph).unwrap();
        assert_eq!(result.amount, dec!(8));
    }

    #[test]
    fn test_cycles_terminate() {
        let mut graph = ConversionGraph::new();
        graph.insert("a", "b", dec!(2)).unwrap();
        graph.insert("b", "a", dec!(0.5)).unwrap();
        graph.insert("b", "c", dec!(3)).unwrap();
        graph.insert("c", "a", dec!(1)).unwrap();

        assert!(convert(dec!(1), "a", "missing", &graph).is_err());
    }
}
