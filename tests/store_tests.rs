//! Integration tests for the embedded store and the read-only guard

use serde_json::json;

use tabular_report::dataset::read_csv_str;
use tabular_report::store::{
    ColumnType, DuckDbStore, StoreError, TABLE_NAME, TabularStore, ensure_read_only,
    split_statements,
};

const ORDERS: &str = "order_id,customer,total,placed_on,zip\n\
1,ada,19.99,2024-03-01,01234\n\
2,bob,5,2024-03-02,10115\n\
3,ada,,2024-03-02,80331\n\
4,cy,42.5,2024-03-04,20095\n";

fn loaded_store() -> DuckDbStore {
    let dataset = read_csv_str(ORDERS).unwrap();
    let mut store = DuckDbStore::open_in_memory().unwrap();
    store.load(&dataset).unwrap();
    store
}

#[test]
fn test_schema_inference_from_csv() {
    let store = loaded_store();
    let types: Vec<ColumnType> = store.schema().iter().map(|(_, t)| *t).collect();

    assert_eq!(
        types,
        vec![
            ColumnType::BigInt,
            ColumnType::Varchar,
            ColumnType::Double,
            ColumnType::Varchar,
            ColumnType::Varchar,
        ]
    );
    assert_eq!(store.row_count(), 4);
}

#[test]
fn test_blank_numeric_cell_is_null() {
    let store = loaded_store();
    let output = store
        .execute(&format!(
            "SELECT order_id FROM {TABLE_NAME} WHERE total IS NULL"
        ))
        .unwrap();

    assert_eq!(output.row_count(), 1);
    assert_eq!(output.rows[0]["order_id"], json!(3));
}

#[test]
fn test_leading_zero_identifier_kept_as_text() {
    let store = loaded_store();
    let output = store
        .execute("SELECT zip FROM data WHERE order_id = 1")
        .unwrap();

    assert_eq!(output.rows[0]["zip"], json!("01234"));
}

#[test]
fn test_group_by_over_every_row() {
    let store = loaded_store();
    let output = store
        .execute(
            "SELECT customer, COUNT(*) AS orders FROM data GROUP BY customer ORDER BY customer",
        )
        .unwrap();

    assert_eq!(output.columns, vec!["customer", "orders"]);
    assert_eq!(output.rows.len(), 3);
    assert_eq!(output.rows[0]["customer"], json!("ada"));
    assert_eq!(output.rows[0]["orders"], json!(2));
}

#[test]
fn test_syntax_error_is_query_error() {
    let store = loaded_store();
    let err = store.execute("SELEC * FROM data").unwrap_err();
    assert!(matches!(err, StoreError::Query(_)));
}

#[test]
fn test_split_then_guard_a_planned_block() {
    let block = "-- headline\nSELECT COUNT(*) FROM data;\n\
                 UPDATE data SET total = 0;\n\
                 SELECT 'a;b' AS label FROM data LIMIT 1;";
    let statements = split_statements(block);

    assert_eq!(statements.len(), 3);
    assert!(ensure_read_only(&statements[0]).is_ok());
    assert!(matches!(
        ensure_read_only(&statements[1]),
        Err(StoreError::NotReadOnly(_))
    ));
    assert!(ensure_read_only(&statements[2]).is_ok());

    let store = loaded_store();
    let output = store.execute(&statements[2]).unwrap();
    assert_eq!(output.rows[0]["label"], json!("a;b"));
}

#[test]
fn test_loading_same_dataset_twice_gives_same_result() {
    let dataset = read_csv_str(ORDERS).unwrap();
    let statement = "SELECT customer, SUM(total) AS spent, COUNT(*) AS orders \
                     FROM data GROUP BY customer ORDER BY customer";
    let mut store = DuckDbStore::open_in_memory().unwrap();

    store.load(&dataset).unwrap();
    let first = store.execute(statement).unwrap();

    store.load(&dataset).unwrap();
    let second = store.execute(statement).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.row_count(), 4);
    assert_eq!(second.rows[0]["orders"], json!(2));
}
