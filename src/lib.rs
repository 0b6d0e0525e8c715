//! Pantry Stock Ledger Library
//!
//! Multi-unit perishable inventory: a unit conversion graph and a batch ledger
//! that consumes stock earliest expiration first.

pub mod build_info;
pub mod config;
pub mod db;
pub mod ledger;
pub mod mcp;
pub mod models;
pub mod store;
pub mod tools;
pub mod units;
