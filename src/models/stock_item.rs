//! Stock Item model
//!
//! A product identity. Created on first reference, never deleted automatically.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// A distinct product, matched by exact (case-sensitive) name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

impl StockItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a new stock item
    pub fn create(conn: &Connection, name: &str) -> DbResult<Self> {
        conn.execute("INSERT INTO stock_items (name) VALUES (?1)", [name])?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a stock item by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let item = conn
            .query_row("SELECT * FROM stock_items WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(item)
    }

    /// Get a stock item by its exact name
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let item = conn
            .query_row("SELECT * FROM stock_items WHERE name = ?1", [name], Self::from_row)
            .optional()?;
        Ok(item)
    }

    /// Count all known stock items
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM stock_items", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_create_and_lookup() {
        let conn = conn();
        let item = StockItem::create(&conn, "Azeite").unwrap();

        assert_eq!(StockItem::get_by_name(&conn, "Azeite").unwrap(), Some(item.clone()));
        assert_eq!(StockItem::get_by_id(&conn, item.id).unwrap(), Some(item));
        assert_eq!(StockItem::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_name_match_is_case_sensitive() {
        let conn = conn();
        StockItem::create(&conn, "Azeite").unwrap();
        assert_eq!(StockItem::get_by_name(&conn, "azeite").unwrap(), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let conn = conn();
        StockItem::create(&conn, "Arroz").unwrap();
        assert!(StockItem::create(&conn, "Arroz").is_err());
    }
}
