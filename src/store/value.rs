//! Column typing on load and engine value conversion

use chrono::DateTime;
use duckdb::types::{TimeUnit, Value};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Storage type chosen for a column when the dataset is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every non-empty cell is an integer
    BigInt,
    /// Every non-empty cell is a finite number
    Double,
    /// Anything else
    Varchar,
}

impl ColumnType {
    /// Infer one type per column from all cells of the dataset
    ///
    /// Empty cells are ignored; a column with no non-empty cells is text.
    pub fn infer_all(dataset: &Dataset) -> Vec<ColumnType> {
        (0..dataset.columns().len())
            .map(|i| Self::infer(dataset.rows().iter().map(|row| row[i].as_str())))
            .collect()
    }

    /// Infer the type of a single column
    pub fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
        let mut seen = false;
        let mut all_int = true;

        for cell in cells {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            seen = true;
            if !looks_numeric(cell) {
                return ColumnType::Varchar;
            }
            if all_int && cell.parse::<i64>().is_err() {
                all_int = false;
            }
        }

        match (seen, all_int) {
            (false, _) => ColumnType::Varchar,
            (true, true) => ColumnType::BigInt,
            (true, false) => ColumnType::Double,
        }
    }

    /// SQL type name used in the table definition
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Varchar => "VARCHAR",
        }
    }

    /// Convert a cell to an engine value of this type
    pub fn to_value(&self, cell: &str) -> Value {
        let trimmed = cell.trim();
        match self {
            ColumnType::Varchar => Value::Text(cell.to_string()),
            _ if trimmed.is_empty() => Value::Null,
            ColumnType::BigInt => trimmed
                .parse::<i64>()
                .map(Value::BigInt)
                .unwrap_or(Value::Null),
            ColumnType::Double => trimmed
                .parse::<f64>()
                .map(Value::Double)
                .unwrap_or(Value::Null),
        }
    }
}

/// Numeric text that keeps its meaning when stored as a number
///
/// Identifiers with leading zeros ("007") stay text.
fn looks_numeric(cell: &str) -> bool {
    let digits = cell.trim_start_matches(['-', '+']);
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return false;
    }
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    cell.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// Convert an engine value to JSON
pub(crate) fn to_json(value: Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(b),
        Value::TinyInt(n) => Json::Number(n.into()),
        Value::SmallInt(n) => Json::Number(n.into()),
        Value::Int(n) => Json::Number(n.into()),
        Value::BigInt(n) => Json::Number(n.into()),
        Value::UTinyInt(n) => Json::Number(n.into()),
        Value::USmallInt(n) => Json::Number(n.into()),
        Value::UInt(n) => Json::Number(n.into()),
        Value::UBigInt(n) => Json::Number(n.into()),
        Value::HugeInt(n) => match i64::try_from(n) {
            Ok(n) => Json::Number(n.into()),
            Err(_) => float(n as f64),
        },
        Value::Float(f) => float(f as f64),
        Value::Double(f) => float(f),
        Value::Decimal(d) => {
            let text = d.to_string();
            match text.parse::<f64>() {
                Ok(f) => float(f),
                Err(_) => Json::String(text),
            }
        }
        Value::Text(s) => Json::String(s),
        Value::Date32(days) => DateTime::from_timestamp(i64::from(days) * 86_400, 0)
            .map(|dt| Json::String(dt.date_naive().to_string()))
            .unwrap_or(Json::Null),
        Value::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|dt| Json::String(dt.naive_utc().to_string()))
                .unwrap_or(Json::Null)
        }
        other => Json::String(format!("{:?}", other)),
    }
}

fn float(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_integer_column() {
        assert_eq!(
            ColumnType::infer(["1", "22", "", "-3"].into_iter()),
            ColumnType::BigInt
        );
    }

    #[test]
    fn test_infer_double_column() {
        assert_eq!(
            ColumnType::infer(["1", "2.5", "0.75"].into_iter()),
            ColumnType::Double
        );
    }

    #[test]
    fn test_infer_text_column() {
        assert_eq!(
            ColumnType::infer(["1", "two"].into_iter()),
            ColumnType::Varchar
        );
        assert_eq!(
            ColumnType::infer(["2024-01-05"].into_iter()),
            ColumnType::Varchar
        );
        assert_eq!(ColumnType::infer(["", " "].into_iter()), ColumnType::Varchar);
    }

    #[test]
    fn test_leading_zero_identifiers_stay_text() {
        assert_eq!(
            ColumnType::infer(["007", "012"].into_iter()),
            ColumnType::Varchar
        );
        assert_eq!(ColumnType::infer(["0", "0.5"].into_iter()), ColumnType::Double);
    }

    #[test]
    fn test_non_finite_is_text() {
        assert_eq!(
            ColumnType::infer(["inf", "NaN"].into_iter()),
            ColumnType::Varchar
        );
    }

    #[test]
    fn test_to_value() {
        assert_eq!(ColumnType::BigInt.to_value(" 42 "), Value::BigInt(42));
        assert_eq!(ColumnType::BigInt.to_value(""), Value::Null);
        assert_eq!(ColumnType::Double.to_value("1.5"), Value::Double(1.5));
        assert_eq!(
            ColumnType::Varchar.to_value(""),
            Value::Text(String::new())
        );
    }

    #[test]
    fn test_to_json() {
        assert_eq!(to_json(Value::HugeInt(1234)), serde_json::json!(1234));
        assert_eq!(to_json(Value::Double(2.5)), serde_json::json!(2.5));
        assert_eq!(to_json(Value::Double(f64::NAN)), serde_json::Value::Null);
        assert_eq!(to_json(Value::Date32(0)), serde_json::json!("1970-01-01"));
        assert_eq!(
            to_json(Value::Text("x".to_string())),
            serde_json::json!("x")
        );
    }
}
