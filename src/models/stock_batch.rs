//! Stock Batch model
//!
//! One stock-in of an item: quantity, unit and expiration date. Batches of the
//! same item are consumed earliest expiration first, insertion order breaking ties.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Exact decimal stored as TEXT
struct SqlDecimal(Decimal);

impl FromSql for SqlDecimal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<Decimal>()
            .map(SqlDecimal)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}

/// A stock batch row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockBatch {
    pub id: i64,
    pub item_id: i64,
    pub quantity: Decimal,
    pub unit: String,
    pub expiration_date: NaiveDate,
    pub created_at: String,
}

/// Data for creating a new stock batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBatchCreate {
    pub item_id: i64,
    pub quantity: Decimal,
    pub unit: String,
    pub expiration_date: NaiveDate,
}

/// A batch joined with its item name, for pantry-wide listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDetail {
    pub batch_id: i64,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub expiration_date: NaiveDate,
}

const EARLIEST_FIRST: &str = "ORDER BY expiration_date ASC, id ASC";

impl StockBatch {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            item_id: row.get("item_id")?,
            quantity: row.get::<_, SqlDecimal>("quantity")?.0,
            unit: row.get("unit")?,
            expiration_date: row.get("expiration_date")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a new batch
    pub fn create(conn: &Connection, data: &StockBatchCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO stock_batches (item_id, quantity, unit, expiration_date)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.item_id,
                decimal_text(data.quantity),
                data.unit,
                data.expiration_date,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a batch by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let batch = conn
            .query_row("SELECT * FROM stock_batches WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(batch)
    }

    /// The batch of an item that expires first
    pub fn earliest_for_item(conn: &Connection, item_id: i64) -> DbResult<Option<Self>> {
        let sql = format!(
            "SELECT * FROM stock_batches WHERE item_id = ?1 {} LIMIT 1",
            EARLIEST_FIRST
        );
        let batch = conn.query_row(&sql, [item_id], Self::from_row).optional()?;
        Ok(batch)
    }

    /// All batches of an item in insertion order
    pub fn list_for_item(conn: &Connection, item_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM stock_batches WHERE item_id = ?1 ORDER BY id ASC")?;

        let batches = stmt
            .query_map([item_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }

    /// Set the remaining quantity of a batch
    pub fn update_quantity(conn: &Connection, id: i64, quantity: Decimal) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE stock_batches SET quantity = ?1 WHERE id = ?2",
            params![decimal_text(quantity), id],
        )?;
        Ok(rows > 0)
    }

    /// Delete one batch. Returns false if it did not exist
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM stock_batches WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Delete every batch of an item
    pub fn delete_for_item(conn: &Connection, item_id: i64) -> DbResult<usize> {
        let rows = conn.execute("DELETE FROM stock_batches WHERE item_id = ?1", [item_id])?;
        Ok(rows)
    }

    /// Delete every batch of every item
    pub fn delete_all(conn: &Connection) -> DbResult<usize> {
        let rows = conn.execute("DELETE FROM stock_batches", [])?;
        Ok(rows)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM stock_batches", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl StockDetail {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            batch_id: row.get("batch_id")?,
            item_name: row.get("item_name")?,
            quantity: row.get::<_, SqlDecimal>("quantity")?.0,
            unit: row.get("unit")?,
            expiration_date: row.get("expiration_date")?,
        })
    }

    /// Every batch in the pantry, by item name then expiration
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT b.id AS batch_id, i.name AS item_name, b.quantity, b.unit, b.expiration_date
            FROM stock_batches b
            INNER JOIN stock_items i ON i.id = b.item_id
            ORDER BY i.name ASC, b.expiration_date ASC, b.id ASC
            "#,
        )?;

        let details = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    /// Batches expiring on or before `cutoff`, earliest first
    pub fn expiring_before(conn: &Connection, cutoff: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT b.id AS batch_id, i.name AS item_name, b.quantity, b.unit, b.expiration_date
            FROM stock_batches b
            INNER JOIN stock_items i ON i.id = b.item_id
            WHERE b.expiration_date <= ?1
            ORDER BY b.expiration_date ASC, i.name ASC, b.id ASC
            "#,
        )?;

        let details = stmt
            .query_map([cutoff], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::StockItem;
    use rust_decimal_macros::dec;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn batch(conn: &Connection, item_id: i64, quantity: Decimal, unit: &str, expires: &str) -> StockBatch {
        StockBatch::create(
            conn,
            &StockBatchCreate {
                item_id,
                quantity,
                unit: unit.to_string(),
                expiration_date: date(expires),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_quantity_round_trips_exactly() {
        let conn = conn();
        let item = StockItem::create(&conn, "Leite").unwrap();
        let created = batch(&conn, item.id, dec!(0.1), "l", "2025-03-01");

        assert_eq!(created.quantity, dec!(0.1));
        assert_eq!(created.expiration_date, date("2025-03-01"));

        StockBatch::update_quantity(&conn, created.id, dec!(0.3) - dec!(0.2)).unwrap();
        let loaded = StockBatch::get_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(loaded.quantity, dec!(0.1));
    }

    #[test]
    fn test_earliest_for_item_orders_by_expiration_then_insertion() {
        let conn = conn();
        let item = StockItem::create(&conn, "Arroz").unwrap();
        batch(&conn, item.id, dec!(1), "kg", "2025-06-01");
        let first_tie = batch(&conn, item.id, dec!(2), "kg", "2025-01-01");
        batch(&conn, item.id, dec!(3), "kg", "2025-01-01");

        let earliest = StockBatch::earliest_for_item(&conn, item.id).unwrap().unwrap();
        assert_eq!(earliest.id, first_tie.id);

        let in_insertion_order: Vec<Decimal> = StockBatch::list_for_item(&conn, item.id)
            .unwrap()
            .into_iter()
            .map(|b| b.quantity)
            .collect();
        assert_eq!(in_insertion_order, vec![dec!(1), dec!(2), dec!(3)]);
    }

    #[test]
    fn test_delete_variants() {
        let conn = conn();
        let rice = StockItem::create(&conn, "Arroz").unwrap();
        let milk = StockItem::create(&conn, "Leite").unwrap();
        let b = batch(&conn, rice.id, dec!(1), "kg", "2025-06-01");
        batch(&conn, rice.id, dec!(1), "kg", "2025-07-01");
        batch(&conn, milk.id, dec!(1), "l", "2025-02-01");

        assert!(StockBatch::delete(&conn, b.id).unwrap());
        assert!(!StockBatch::delete(&conn, b.id).unwrap());
        assert_eq!(StockBatch::delete_for_item(&conn, rice.id).unwrap(), 1);
        assert_eq!(StockBatch::delete_all(&conn).unwrap(), 1);
        assert_eq!(StockBatch::count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_stock_details_listing_and_expiry_filter() {
        let conn = conn();
        let rice = StockItem::create(&conn, "Arroz").unwrap();
        let milk = StockItem::create(&conn, "Leite").unwrap();
        batch(&conn, milk.id, dec!(1), "l", "2025-02-01");
        batch(&conn, rice.id, dec!(2), "kg", "2025-08-07");
        batch(&conn, rice.id, dec!(1), "kg", "2025-01-15");

        let names: Vec<(String, NaiveDate)> = StockDetail::list_all(&conn)
            .unwrap()
            .into_iter()
            .map(|d| (d.item_name, d.expiration_date))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Arroz".to_string(), date("2025-01-15")),
                ("Arroz".to_string(), date("2025-08-07")),
                ("Leite".to_string(), date("2025-02-01")),
            ]
        );

        let expiring = StockDetail::expiring_before(&conn, date("2025-02-01")).unwrap();
        assert_eq!(expiring.len(), 2);
        assert_eq!(expiring[0].item_name, "Arroz");
        assert_eq!(expiring[1].item_name, "Leite");
    }
}
