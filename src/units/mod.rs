//! Unit conversion module
//!
//! Conversion factor graph and the path-search converter built on it.

pub mod converter;
pub mod graph;

pub use converter::{approx_eq, convert, NoConversionPath, Quantity, CONVERSION_SCALE, TOLERANCE_SCALE};
pub use graph::{normalize_unit, ConversionGraph, GraphError};
