use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::DbError;
use crate::units::NoConversionPath;

/// Ledger operation errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    NoConversionPath(#[from] NoConversionPath),

    #[error("Stock item '{0}' does not exist")]
    ItemNotFound(String),

    #[error("No stock left for '{item}': {remaining} {unit} could not be removed")]
    NoBatches {
        item: String,
        remaining: Decimal,
        unit: String,
    },

    #[error("Quantity must be greater than zero, got {0}")]
    InvalidQuantity(Decimal),

    #[error("Total stock of '{0}' is too large to represent")]
    Overflow(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] DbError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
