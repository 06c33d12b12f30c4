//! Integration tests for reading CSV files and sampling datasets

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use tabular_report::dataset::{DatasetError, SAMPLE_SIZE, project, read_csv_path};

/// Helper to write a CSV file into a temp directory
fn write_csv_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_read_csv_file_with_quoted_cells() {
    let dir = TempDir::new().unwrap();
    let path = write_csv_file(
        &dir,
        "customers.csv",
        "id,name,city\n1,\"Doe, Jane\",Berlin\n2,Sam,\"New\nYork\"\n",
    );

    let dataset = read_csv_path(&path).unwrap();

    assert_eq!(dataset.columns(), &["id", "name", "city"]);
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.row(0).unwrap().get("name"), Some("Doe, Jane"));
    assert_eq!(dataset.row(1).unwrap().get("city"), Some("New\nYork"));
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.csv");

    match read_csv_path(&path).unwrap_err() {
        DatasetError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn test_ragged_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_csv_file(&dir, "ragged.csv", "a,b\n1,2\n3\n");

    assert!(read_csv_path(&path).is_err());
}

#[test]
fn test_header_only_file_is_empty_dataset() {
    let dir = TempDir::new().unwrap();
    let path = write_csv_file(&dir, "empty.csv", "a,b\n");

    let dataset = read_csv_path(&path).unwrap();
    assert!(dataset.is_empty());
    assert_eq!(dataset.columns().len(), 2);
}

#[test]
fn test_sample_of_large_file() {
    let dir = TempDir::new().unwrap();
    let mut content = String::from("n,square\n");
    for i in 0..100 {
        content.push_str(&format!("{},{}\n", i, i * i));
    }
    let path = write_csv_file(&dir, "squares.csv", &content);

    let dataset = read_csv_path(&path).unwrap();
    let sample = project(&dataset);

    assert_eq!(sample.total_rows, 100);
    assert_eq!(sample.rows.len(), SAMPLE_SIZE);
    assert_eq!(sample.rows[4], vec!["4".to_string(), "16".to_string()]);
    assert_eq!(sample.metadata(), "Total rows: 100\nColumns: n, square");
    assert_eq!(
        sample.to_csv().unwrap(),
        "n,square\n0,0\n1,1\n2,4\n3,9\n4,16"
    );
}

#[test]
fn test_sample_of_small_file_keeps_every_row() {
    let dir = TempDir::new().unwrap();
    let path = write_csv_file(&dir, "tiny.csv", "k\nx\ny\n");

    let sample = project(&read_csv_path(&path).unwrap());
    assert_eq!(sample.total_rows, 2);
    assert_eq!(sample.rows.len(), 2);
}
