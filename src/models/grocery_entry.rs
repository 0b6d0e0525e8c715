//! Grocery list model

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// A name on the grocery list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryEntry {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

impl GroceryEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn create(conn: &Connection, name: &str) -> DbResult<Self> {
        conn.execute("INSERT INTO grocery_list (name) VALUES (?1)", [name])?;

        let id = conn.last_insert_rowid();
        conn.query_row("SELECT * FROM grocery_list WHERE id = ?1", [id], Self::from_row)
            .optional()?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let entry = conn
            .query_row("SELECT * FROM grocery_list WHERE name = ?1", [name], Self::from_row)
            .optional()?;
        Ok(entry)
    }

    /// Entries in the order they were added
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM grocery_list ORDER BY id ASC")?;
        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Returns false if the name was not on the list
    pub fn delete_by_name(conn: &Connection, name: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM grocery_list WHERE name = ?1", [name])?;
        Ok(rows > 0)
    }

    pub fn delete_all(conn: &Connection) -> DbResult<usize> {
        let rows = conn.execute("DELETE FROM grocery_list", [])?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_grocery_list_crud() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        GroceryEntry::create(&conn, "Ovos").unwrap();
        GroceryEntry::create(&conn, "Azeite").unwrap();
        assert!(GroceryEntry::create(&conn, "Ovos").is_err());

        let names: Vec<String> = GroceryEntry::list(&conn).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Ovos", "Azeite"]);

        assert!(GroceryEntry::delete_by_name(&conn, "Ovos").unwrap());
        assert!(!GroceryEntry::delete_by_name(&conn, "Ovos").unwrap());
        assert!(GroceryEntry::get_by_name(&conn, "Ovos").unwrap().is_none());
        assert_eq!(GroceryEntry::delete_all(&conn).unwrap(), 1);
    }
}
