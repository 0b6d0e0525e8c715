//! Pantry Tools module
//!
//! Request-layer functions behind the MCP tools. Each takes the ledger, parses
//! string arguments and returns a serializable response or an error message.

pub mod grocery;
pub mod status;
pub mod stock;
pub mod units;

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Parse a decimal quantity such as "1.5"
pub(crate) fn parse_quantity(value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim())
        .map_err(|e| format!("Invalid quantity '{}': {}", value, e))
}

/// Parse an ISO date (YYYY-MM-DD)
pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format: {}. Expected YYYY-MM-DD", value))
}
