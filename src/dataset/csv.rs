//! CSV input and delimited-text rendering

use std::path::Path;

use tracing::debug;

use super::Dataset;
use super::error::{DatasetError, DatasetResult};

/// Read a CSV file with a header row into a dataset
pub fn read_csv_path(path: &Path) -> DatasetResult<Dataset> {
    let text = std::fs::read_to_string(path).map_err(|e| DatasetError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let dataset = read_csv_str(&text)?;
    debug!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Loaded CSV"
    );
    Ok(dataset)
}

/// Parse CSV text with a header row into a dataset
///
/// Records with a different field count than the header are rejected.
/// Fully empty lines are skipped.
pub fn read_csv_str(text: &str) -> DatasetResult<Dataset> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(::csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Dataset::new(columns, rows)
}

/// Render a header and rows as CSV text without a trailing newline
pub fn write_csv(columns: &[String], rows: &[Vec<String>]) -> DatasetResult<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DatasetError::Csv(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| DatasetError::Csv(e.to_string()))?;
    Ok(text.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_str() {
        let dataset = read_csv_str("id,name\n1,ada\n2,\"bob, jr\"\n").unwrap();
        assert_eq!(dataset.columns(), &["id".to_string(), "name".to_string()][..]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.row(1).unwrap().get("name"), Some("bob, jr"));
    }

    #[test]
    fn test_read_csv_rejects_ragged_record() {
        let err = read_csv_str("a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, DatasetError::Csv(_)));
    }

    #[test]
    fn test_read_csv_header_only() {
        let dataset = read_csv_str("a,b\n").unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.columns().len(), 2);
    }

    #[test]
    fn test_write_csv_quotes_delimiters() {
        let text = write_csv(
            &["id".to_string(), "note".to_string()],
            &[vec!["1".to_string(), "a, b".to_string()]],
        )
        .unwrap();
        assert_eq!(text, "id,note\n1,\"a, b\"");
    }
}
