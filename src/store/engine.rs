//! DuckDB-backed tabular store

use std::time::Instant;

use duckdb::Connection;
use tracing::{debug, trace};

use super::error::{StoreError, StoreResult};
use super::value::{ColumnType, to_json};
use super::{QueryOutput, TABLE_NAME, TabularStore};
use crate::dataset::Dataset;

/// In-memory DuckDB store holding a single table
///
/// One instance belongs to one run; nothing is shared between stores.
pub struct DuckDbStore {
    conn: Connection,
    schema: Vec<(String, ColumnType)>,
    row_count: usize,
}

impl DuckDbStore {
    /// Open an empty in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self {
            conn,
            schema: Vec::new(),
            row_count: 0,
        })
    }

    /// Column names and storage types of the loaded table
    pub fn schema(&self) -> &[(String, ColumnType)] {
        &self.schema
    }

    /// Number of rows in the loaded table
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    fn create_table_sql(schema: &[(String, ColumnType)]) -> String {
        let columns = schema
            .iter()
            .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql_name()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({columns});",
            table = quote_ident(TABLE_NAME)
        )
    }

    fn insert_sql(column_count: usize) -> String {
        let placeholders = (1..=column_count)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(TABLE_NAME),
            placeholders
        )
    }
}

impl TabularStore for DuckDbStore {
    fn load(&mut self, dataset: &Dataset) -> StoreResult<()> {
        if dataset.columns().is_empty() {
            return Err(StoreError::Load("dataset has no columns".to_string()));
        }

        let start = Instant::now();
        let types = ColumnType::infer_all(dataset);
        let schema: Vec<(String, ColumnType)> = dataset
            .columns()
            .iter()
            .cloned()
            .zip(types.iter().copied())
            .collect();

        let load_err = |e: duckdb::Error| StoreError::Load(e.to_string());

        let tx = self.conn.transaction().map_err(load_err)?;
        tx.execute_batch(&Self::create_table_sql(&schema))
            .map_err(load_err)?;
        {
            let mut stmt = tx
                .prepare(&Self::insert_sql(schema.len()))
                .map_err(load_err)?;
            for row in dataset.rows() {
                let values = row
                    .iter()
                    .zip(types.iter())
                    .map(|(cell, ty)| ty.to_value(cell));
                stmt.execute(duckdb::params_from_iter(values))
                    .map_err(load_err)?;
            }
        }
        tx.commit().map_err(load_err)?;

        self.schema = schema;
        self.row_count = dataset.len();

        debug!(
            table = TABLE_NAME,
            rows = self.row_count,
            columns = ?self
                .schema
                .iter()
                .map(|(name, ty)| format!("{name}:{}", ty.sql_name()))
                .collect::<Vec<_>>(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset into store"
        );

        Ok(())
    }

    fn execute(&self, statement: &str) -> StoreResult<QueryOutput> {
        if statement.trim().is_empty() {
            return Err(StoreError::EmptyStatement);
        }

        let mut stmt = self.conn.prepare(statement)?;
        let mut rows = stmt.query([])?;

        // Column names are only known once the statement has run
        let column_count = rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                rows.as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut output = QueryOutput {
            columns,
            rows: Vec::new(),
        };

        while let Some(row) = rows.next()? {
            let mut obj = serde_json::Map::new();
            for (i, name) in output.columns.iter().enumerate() {
                let value: duckdb::types::Value = row.get(i)?;
                obj.insert(name.clone(), to_json(value));
            }
            output.rows.push(obj);
        }

        trace!(statement, rows = output.rows.len(), "Statement executed");
        Ok(output)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> Dataset {
        Dataset::new(
            vec!["id".into(), "name".into(), "amount".into()],
            vec![
                vec!["1".into(), "ada".into(), "10.5".into()],
                vec!["2".into(), "bob".into(), "4".into()],
                vec!["3".into(), "cy".into(), "".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_load_and_query() {
        let mut store = DuckDbStore::open_in_memory().unwrap();
        store.load(&sales()).unwrap();

        assert_eq!(store.row_count(), 3);
        assert_eq!(
            store.schema(),
            &[
                ("id".to_string(), ColumnType::BigInt),
                ("name".to_string(), ColumnType::Varchar),
                ("amount".to_string(), ColumnType::Double),
            ][..]
        );

        let output = store
            .execute("SELECT name, amount FROM data ORDER BY id")
            .unwrap();
        assert_eq!(output.columns, vec!["name", "amount"]);
        assert_eq!(output.row_count(), 3);
        assert_eq!(output.rows[0]["name"], serde_json::json!("ada"));
        assert_eq!(output.rows[0]["amount"], serde_json::json!(10.5));
        assert_eq!(output.rows[2]["amount"], serde_json::Value::Null);
    }

    #[test]
    fn test_aggregate_over_numeric_column() {
        let mut store = DuckDbStore::open_in_memory().unwrap();
        store.load(&sales()).unwrap();

        let output = store
            .execute("SELECT SUM(id) AS total, COUNT(*) AS n FROM data")
            .unwrap();
        assert_eq!(output.rows[0]["total"], serde_json::json!(6));
        assert_eq!(output.rows[0]["n"], serde_json::json!(3));
    }

    #[test]
    fn test_unknown_column_is_error_value() {
        let mut store = DuckDbStore::open_in_memory().unwrap();
        store.load(&sales()).unwrap();

        let err = store.execute("SELECT missing FROM data").unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_reload_replaces_table() {
        let mut store = DuckDbStore::open_in_memory().unwrap();
        store.load(&sales()).unwrap();

        let other = Dataset::new(vec!["x".into()], vec![vec!["a".into()]]).unwrap();
        store.load(&other).unwrap();

        let output = store.execute("SELECT COUNT(*) AS n FROM data").unwrap();
        assert_eq!(output.rows[0]["n"], serde_json::json!(1));
        assert!(store.execute("SELECT id FROM data").is_err());
    }

    #[test]
    fn test_quoted_column_names() {
        let dataset = Dataset::new(
            vec!["order \"id\"".into(), "unit price".into()],
            vec![vec!["1".into(), "2.5".into()]],
        )
        .unwrap();
        let mut store = DuckDbStore::open_in_memory().unwrap();
        store.load(&dataset).unwrap();

        let output = store
            .execute("SELECT \"unit price\" FROM data")
            .unwrap();
        assert_eq!(output.rows[0]["unit price"], serde_json::json!(2.5));
    }

    #[test]
    fn test_empty_statement() {
        let store = DuckDbStore::open_in_memory().unwrap();
        assert_eq!(store.execute("  ").unwrap_err(), StoreError::EmptyStatement);
    }

    #[test]
    fn test_load_without_columns() {
        let dataset = Dataset::new(Vec::new(), vec![Vec::new()]).unwrap();
        let mut store = DuckDbStore::open_in_memory().unwrap();
        assert!(matches!(
            store.load(&dataset).unwrap_err(),
            StoreError::Load(_)
        ));
    }
}
