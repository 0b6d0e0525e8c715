//! Conversion graph
//!
//! A directed, weighted graph over unit symbols. Each edge `from -> to` carries
//! the factor a quantity in `from` is multiplied by to express it in `to`.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while building a conversion graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Conversion factor from {from} to {to} must be positive, got {factor}")]
    NonPositiveFactor {
        from: String,
        to: String,
        factor: Decimal,
    },

    #[error("Empty unit symbol in conversion table")]
    EmptyUnit,

    #[error("Failed to read unit table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed unit table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Normalize a unit symbol: trimmed, lowercased, one trailing plural "s" removed
///
/// "Latas" -> "lata", " ML " -> "ml", "kg" -> "kg"
pub fn normalize_unit(unit: &str) -> String {
    let lower = unit.trim().to_lowercase();
    match lower.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.trim_end().to_string(),
        _ => lower,
    }
}

/// Directed graph of conversion factors, read-only once built
#[derive(Debug, Clone, Default)]
pub struct ConversionGraph {
    edges: BTreeMap<String, BTreeMap<String, Decimal>>,
}

/// On-disk unit table (JSON)
#[derive(Debug, Deserialize)]
struct UnitTable {
    #[serde(default = "default_true")]
    extend_builtin: bool,
    #[serde(default = "default_true")]
    derive_inverses: bool,
    factors: BTreeMap<String, BTreeMap<String, Decimal>>,
}

fn default_true() -> bool {
    true
}

/// Kitchen conversion table. Volume and weight are bridged with the density of water.
const BUILTIN_FACTORS: &[(&str, &[(&str, &str)])] = &[
    ("l", &[("ml", "1000"), ("cl", "100"), ("dl", "10"), ("l", "1"), ("g", "1000"), ("kg", "1")]),
    ("ml", &[("l", "0.001"), ("cl", "0.1"), ("dl", "0.01"), ("ml", "1"), ("g", "1"), ("mg", "1000")]),
    ("cl", &[("ml", "10"), ("l", "0.01"), ("dl", "0.1"), ("cl", "1"), ("g", "10"), ("mg", "10000")]),
    ("dl", &[("ml", "100"), ("l", "0.1"), ("cl", "10"), ("dl", "1"), ("g", "100"), ("kg", "0.1")]),
    ("g", &[("kg", "0.001"), ("mg", "1000"), ("g", "1"), ("ml", "1"), ("l", "0.001")]),
    ("kg", &[("g", "1000"), ("mg", "1000000"), ("kg", "1"), ("l", "1"), ("ml", "1000")]),
    ("mg", &[("g", "0.001"), ("kg", "0.000001"), ("mg", "1"), ("ml", "0.001")]),
    ("lata", &[("ml", "330")]),
    ("colher de sopa", &[("ml", "15")]),
    ("colher de chá", &[("ml", "5")]),
    ("copo", &[("ml", "200")]),
    ("garrafa", &[("l", "1.5")]),
    ("tablete", &[("g", "200")]),
    ("pacote", &[("kg", "1")]),
    ("saqueta", &[("g", "5")]),
    ("uni", &[("g", "200")]),
    ("caixa", &[("saqueta", "20")]),
];

impl ConversionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in kitchen table, closed under inverse edges
    pub fn builtin() -> Self {
        let mut graph = Self::new();
        for (from, targets) in BUILTIN_FACTORS {
            for (to, factor) in *targets {
                // Table literals are valid positive decimals
                if let Ok(factor) = factor.parse::<Decimal>() {
                    graph.edges
                        .entry(normalize_unit(from))
                        .or_default()
                        .insert(normalize_unit(to), factor);
                }
            }
        }
        graph.with_inverse_edges()
    }

    /// Load a unit table from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Parse a unit table:
    /// `{"extend_builtin": true, "derive_inverses": true, "factors": {"lata": {"ml": "330"}}}`
    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        let table: UnitTable = serde_json::from_str(json)?;

        let mut graph = if table.extend_builtin {
            Self::builtin()
        } else {
            Self::new()
        };

        for (from, targets) in &table.factors {
            for (to, factor) in targets {
                graph.insert(from, to, *factor)?;
            }
        }

        if table.derive_inverses {
            graph = graph.with_inverse_edges();
        }
        Ok(graph)
    }

    /// Add or replace the edge `from -> to`
    pub fn insert(&mut self, from: &str, to: &str, factor: Decimal) -> Result<(), GraphError> {
        let from = normalize_unit(from);
        let to = normalize_unit(to);
        if from.is_empty() || to.is_empty() {
            return Err(GraphError::EmptyUnit);
        }
        if factor <= Decimal::ZERO {
            return Err(GraphError::NonPositiveFactor { from, to, factor });
        }
        self.edges.entry(from).or_default().insert(to, factor);
        Ok(())
    }

    /// Add `to -> from = 1/factor` for every edge lacking an explicit reverse
    pub fn with_inverse_edges(mut self) -> Self {
        let mut derived = Vec::new();
        for (from, targets) in &self.edges {
            for (to, factor) in targets {
                let has_reverse = self
                    .edges
                    .get(to)
                    .is_some_and(|reverse| reverse.contains_key(from));
                if !has_reverse {
                    if let Some(inverse) = Decimal::ONE.checked_div(*factor) {
                        derived.push((to.clone(), from.clone(), inverse));
                    }
                }
            }
        }
        for (from, to, factor) in derived {
            self.edges.entry(from).or_default().entry(to).or_insert(factor);
        }
        self
    }

    /// Outgoing edges of a (normalized) unit, ordered by target symbol
    pub fn neighbors(&self, unit: &str) -> Option<&BTreeMap<String, Decimal>> {
        self.edges.get(unit)
    }

    /// Direct factor for `from -> to`, if the edge exists
    pub fn factor(&self, from: &str, to: &str) -> Option<Decimal> {
        self.edges.get(from).and_then(|targets| targets.get(to)).copied()
    }

    /// Whether a unit appears anywhere in the graph
    pub fn contains(&self, unit: &str) -> bool {
        let unit = normalize_unit(unit);
        self.edges.contains_key(&unit)
            || self.edges.values().any(|targets| targets.contains_key(&unit))
    }

    /// All unit symbols with outgoing edges
    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_unit() {
        assert_eq!(normalize_unit("Latas"), "lata");
        assert_eq!(normalize_unit(" ML "), "ml");
        assert_eq!(normalize_unit("kg"), "kg");
        assert_eq!(normalize_unit("saquetas"), "saqueta");
        assert_eq!(normalize_unit("s"), "s");
    }

    #[test]
    fn test_builtin_has_kitchen_units() {
        let graph = ConversionGraph::builtin();
        assert_eq!(graph.factor("lata", "ml"), Some(dec!(330)));
        assert_eq!(graph.factor("caixa", "saqueta"), Some(dec!(20)));
        assert_eq!(graph.factor("colher de chá", "ml"), Some(dec!(5)));
    }

    #[test]
    fn test_inverse_edges_are_derived() {
        let graph = ConversionGraph::builtin();
        assert_eq!(graph.factor("l", "garrafa"), Some(Decimal::ONE / dec!(1.5)));
        assert!(graph.factor("ml", "lata").is_some());
    }

    #[test]
    fn test_explicit_reverse_edge_wins() {
        let graph = ConversionGraph::builtin();
        // kg -> l is explicit; deriving from l -> kg must not replace it
        assert_eq!(graph.factor("kg", "l"), Some(dec!(1)));
        assert_eq!(graph.factor("g", "mg"), Some(dec!(1000)));
    }

    #[test]
    fn test_insert_rejects_non_positive_factor() {
        let mut graph = ConversionGraph::new();
        let err = graph.insert("copo", "ml", dec!(0)).unwrap_err();
        assert!(matches!(err, GraphError::NonPositiveFactor { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_insert_normalizes_symbols() {
        let mut graph = ConversionGraph::new();
        graph.insert("Chávenas", "ML", dec!(250)).unwrap();
        assert_eq!(graph.factor("chávena", "ml"), Some(dec!(250)));
    }

    #[test]
    fn test_contains_target_only_unit() {
        let mut graph = ConversionGraph::new();
        graph.insert("lata", "ml", dec!(330)).unwrap();
        assert!(graph.contains("ml"));
        assert!(graph.contains("Latas"));
        assert!(!graph.contains("kg"));
    }

    #[test]
    fn test_from_json_extends_builtin() {
        let graph = ConversionGraph::from_json_str(
            r#"{"factors": {"chávena": {"ml": "250"}, "frasco": {"g": 400}}}"#,
        )
        .unwrap();
        assert_eq!(graph.factor("chávena", "ml"), Some(dec!(250)));
        assert_eq!(graph.factor("frasco", "g"), Some(dec!(400)));
        assert!(graph.factor("ml", "chávena").is_some());
        assert!(graph.contains("lata"));
    }

    #[test]
    fn test_from_json_standalone_without_inverses() {
        let graph = ConversionGraph::from_json_str(
            r#"{"extend_builtin": false, "derive_inverses": false, "factors": {"a": {"b": "2"}}}"#,
        )
        .unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.factor("b", "a"), None);
        assert!(!graph.contains("lata"));
    }

    #[test]
    fn test_from_json_rejects_negative_factor() {
        let err = ConversionGraph::from_json_str(r#"{"factors": {"a": {"b": "-2"}}}"#).unwrap_err();
        assert!(matches!(err, GraphError::NonPositiveFactor { .. }));
    }

    #[test]
    fn test_from_json_rejects_malformed_table() {
        let err = ConversionGraph::from_json_str(r#"{"factor": {}}"#).unwrap_err();
        assert!(matches!(err, GraphError::Parse(_)));
    }
}
