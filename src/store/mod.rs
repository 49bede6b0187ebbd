//! SQLite storage target.
//!
//! All writes go through [`Store`]: generic upserts keyed by a table's
//! natural key, wholesale pivot syncs, and the import progress row.

mod cache;
mod progress;
pub mod schema_gen;
pub mod value;

pub use cache::NameCache;
pub use value::{RowValues, SqlValue};

use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::schema::{DependencyResolver, TableSchema};
use schema_gen::{generate_create_table, generate_indexes, quote};

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `db_path` and create missing tables.
    /// Existing data is kept.
    pub fn open(db_path: &Path) -> ImportResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ImportError::InvalidConfig(format!(
                        "cannot create database directory {:?}: {}",
                        parent, e
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> ImportResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> ImportResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Create all tables and indexes that do not exist yet
    pub fn migrate(&self) -> ImportResult<()> {
        let tables = DependencyResolver::new()
            .all_tables_ordered()
            .map_err(ImportError::InvalidConfig)?;

        for schema in tables {
            self.conn.execute(&generate_create_table(schema), [])?;
            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, [])?;
            }
        }

        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction; any error rolls the whole unit back
    pub fn transaction<T>(&self, f: impl FnOnce(&Store) -> ImportResult<T>) -> ImportResult<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Insert or update a row keyed by the table's natural key, returning its id
    pub fn upsert(&self, schema: &TableSchema, row: &RowValues) -> ImportResult<i64> {
        let key = schema.natural_key().ok_or_else(|| {
            ImportError::InvalidConfig(format!("table {} has no natural key", schema.name))
        })?;

        let mut columns: Vec<&str> = row.columns().collect();
        let mut values: Vec<SqlValue> = row.values().cloned().collect();
        if schema.timestamps {
            let now = now_rfc3339();
            columns.push("created_at");
            values.push(SqlValue::Text(now.clone()));
            columns.push("updated_at");
            values.push(SqlValue::Text(now));
        }

        let mut updates: Vec<String> = columns
            .iter()
            .filter(|c| !key.iter().any(|k| k == *c) && **c != "created_at")
            .map(|c| format!("{0} = excluded.{0}", quote(c)))
            .collect();
        if updates.is_empty() {
            updates.push(format!("{0} = excluded.{0}", quote(key[0])));
        }

        let quoted: Vec<String> = columns.iter().map(|c| quote(c)).collect();
        let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
        let key_cols: Vec<String> = key.iter().map(|c| quote(c)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {} RETURNING \"id\"",
            quote(schema.name),
            quoted.join(", "),
            placeholders.join(", "),
            key_cols.join(", "),
            updates.join(", ")
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let id = stmt.query_row(params_from_iter(values.iter()), |r| r.get(0))?;
        Ok(id)
    }

    /// Plain insert for tables without a natural key
    pub fn insert(&self, schema: &TableSchema, row: &RowValues) -> ImportResult<i64> {
        let mut columns: Vec<&str> = row.columns().collect();
        let mut values: Vec<SqlValue> = row.values().cloned().collect();
        if schema.timestamps {
            let now = now_rfc3339();
            columns.push("created_at");
            values.push(SqlValue::Text(now.clone()));
            columns.push("updated_at");
            values.push(SqlValue::Text(now));
        }

        let quoted: Vec<String> = columns.iter().map(|c| quote(c)).collect();
        let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(schema.name),
            quoted.join(", "),
            placeholders.join(", ")
        );

        self.conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(values.iter()))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Delete every row of `schema` whose `column` equals `id`
    pub fn delete_where(&self, schema: &TableSchema, column: &str, id: i64) -> ImportResult<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(schema.name),
            quote(column)
        );
        Ok(self.conn.prepare_cached(&sql)?.execute([id])?)
    }

    /// Replace the pivot rows owned by `owner_id` with `rows`.
    /// Each row must already carry the owner and related id columns.
    pub fn sync_pivot(
        &self,
        pivot: &TableSchema,
        owner_column: &str,
        owner_id: i64,
        rows: &[RowValues],
    ) -> ImportResult<()> {
        let removed = self.delete_where(pivot, owner_column, owner_id)?;
        for row in rows {
            self.upsert(pivot, row)?;
        }
        debug!(
            table = pivot.name,
            owner_id,
            removed,
            inserted = rows.len(),
            "synced pivot"
        );
        Ok(())
    }

    pub fn set_column(
        &self,
        schema: &TableSchema,
        id: i64,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> ImportResult<()> {
        let value = value.into();
        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE \"id\" = ?2",
            quote(schema.name),
            quote(column)
        );
        self.conn
            .prepare_cached(&sql)?
            .execute(rusqlite::params![value, id])?;
        Ok(())
    }

    pub fn find_id_by_name(&self, table: &str, name: &str) -> ImportResult<Option<i64>> {
        let sql = format!(
            "SELECT \"id\" FROM {} WHERE \"name\" = ?1 ORDER BY \"id\" LIMIT 1",
            quote(table)
        );
        let id = self
            .conn
            .prepare_cached(&sql)?
            .query_row([name], |r| r.get(0))
            .optional()?;
        Ok(id)
    }

    pub fn find_id_by_api_id(&self, table: &str, api_id: i64) -> ImportResult<Option<i64>> {
        let sql = format!("SELECT \"id\" FROM {} WHERE \"api_id\" = ?1", quote(table));
        let id = self
            .conn
            .prepare_cached(&sql)?
            .query_row([api_id], |r| r.get(0))
            .optional()?;
        Ok(id)
    }

    pub fn count(&self, table: &str) -> ImportResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(table));
        let count: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(count as u64)
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{POKEMON, POKEMON_TYPE, TYPES};

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrate_is_repeatable() {
        let store = store();
        store.migrate().unwrap();
        assert_eq!(store.count("types").unwrap(), 0);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let store = store();
        let first = store
            .upsert(&TYPES, &RowValues::new().with("api_id", 10_i64).with("name", "fire"))
            .unwrap();
        let second = store
            .upsert(&TYPES, &RowValues::new().with("api_id", 10_i64).with("name", "fuego"))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count("types").unwrap(), 1);
        assert_eq!(store.find_id_by_name("types", "fuego").unwrap(), Some(first));
        assert_eq!(store.find_id_by_name("types", "fire").unwrap(), None);
    }

    #[test]
    fn test_sync_pivot_removes_stale_rows() {
        let store = store();
        let fire = store
            .upsert(&TYPES, &RowValues::new().with("api_id", 10_i64).with("name", "fire"))
            .unwrap();
        let flying = store
            .upsert(&TYPES, &RowValues::new().with("api_id", 3_i64).with("name", "flying"))
            .unwrap();
        let pokemon = store
            .upsert(&POKEMON, &RowValues::new().with("api_id", 6_i64).with("name", "charizard"))
            .unwrap();

        let pivot = |type_id: i64, slot: i64| {
            RowValues::new()
                .with("pokemon_id", pokemon)
                .with("type_id", type_id)
                .with("slot", slot)
        };

        store
            .sync_pivot(&POKEMON_TYPE, "pokemon_id", pokemon, &[pivot(fire, 1), pivot(flying, 2)])
            .unwrap();
        assert_eq!(store.count("pokemon_type").unwrap(), 2);

        store
            .sync_pivot(&POKEMON_TYPE, "pokemon_id", pokemon, &[pivot(fire, 1)])
            .unwrap();
        assert_eq!(store.count("pokemon_type").unwrap(), 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = store();
        let result: ImportResult<()> = store.transaction(|s| {
            s.upsert(&TYPES, &RowValues::new().with("api_id", 1_i64).with("name", "normal"))?;
            Err(ImportError::format("boom"))
        });

        assert!(result.is_err());
        assert_eq!(store.count("types").unwrap(), 0);
    }
}
