//! CSV-backed tables: the raw client table and the model feature matrix.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// Cell spellings read as missing, matched case-sensitively.
const NA_SPELLINGS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single cell of the raw client table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw CSV field. Empty fields and the usual NA spellings
    /// (`NA`, `N/A`, `NULL`, `None`, `NaN`, ...) are missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_SPELLINGS.contains(&trimmed) {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_nan() => Self::Missing,
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    /// Numeric view of the cell, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view of the cell, if it holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Missing => write!(f, "NaN"),
        }
    }
}

/// Parse a client identifier cell. Accepts integral floats such as `100002.0`.
fn parse_id(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<u32>() {
        return Some(id);
    }
    let f = trimmed.parse::<f64>().ok()?;
    (f.fract() == 0.0 && f >= 0.0 && f <= f64::from(u32::MAX)).then_some(f as u32)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>> {
    Ok(reader
        .headers()
        .context("failed to read CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect())
}

fn find_column(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .with_context(|| format!("column '{name}' not found in CSV header"))
}

// ---------------------------------------------------------------------------
// Client table
// ---------------------------------------------------------------------------

/// The raw client table: identifier, outcome label and display features.
#[derive(Debug, Clone)]
pub struct ClientTable {
    columns: Vec<String>,
    id_col: usize,
    label_col: usize,
    ids: Vec<u32>,
    rows: Vec<Vec<Value>>,
}

impl ClientTable {
    /// Read the table from a CSV file.
    pub fn load(path: &Path, id_column: &str, label_column: &str) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open client table {}", path.display()))?;
        Self::from_reader(file, id_column, label_column)
            .with_context(|| format!("failed to load client table {}", path.display()))
    }

    /// Read the table from any CSV source.
    pub fn from_reader<R: Read>(source: R, id_column: &str, label_column: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(source);
        let columns = read_headers(&mut reader)?;
        let id_col = find_column(&columns, id_column)?;
        let label_col = find_column(&columns, label_column)?;

        let mut ids = Vec::new();
        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("malformed CSV record {}", line + 1))?;
            let id = parse_id(record.get(id_col).unwrap_or_default()).with_context(|| {
                format!("record {} has an invalid {id_column} value", line + 1)
            })?;
            ids.push(id);
            rows.push(record.iter().map(Value::parse).collect());
        }

        Ok(Self {
            columns,
            id_col,
            label_col,
            ids,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Client identifiers in row order.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// All column names, including the identifier and label.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row index of the client with `id`, if present.
    pub fn position(&self, id: u32) -> Option<usize> {
        self.ids.iter().position(|&candidate| candidate == id)
    }

    /// Full raw row at `index`.
    pub fn row(&self, index: usize) -> &[Value] {
        &self.rows[index]
    }

    /// Outcome label of the row at `index`.
    pub fn label(&self, index: usize) -> &Value {
        &self.rows[index][self.label_col]
    }

    /// Column names shown to the operator (identifier and label removed).
    pub fn display_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.id_col && *i != self.label_col)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// `(column, value)` pairs of the row at `index`, identifier and label removed.
    pub fn display_record(&self, index: usize) -> Vec<(&str, &Value)> {
        self.columns
            .iter()
            .zip(&self.rows[index])
            .enumerate()
            .filter(|(i, _)| *i != self.id_col && *i != self.label_col)
            .map(|(_, (name, value))| (name.as_str(), value))
            .collect()
    }

    /// Every client's value for one display column.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.columns.iter().position(|c| c == name)?;
        if index == self.id_col || index == self.label_col {
            return None;
        }
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}

// ---------------------------------------------------------------------------
// Feature matrix
// ---------------------------------------------------------------------------

/// Numeric features consumed by the model, identifier column dropped.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    ids: Vec<u32>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Read the matrix from a CSV file.
    pub fn load(path: &Path, id_column: &str) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open feature table {}", path.display()))?;
        Self::from_reader(file, id_column)
            .with_context(|| format!("failed to load feature table {}", path.display()))
    }

    /// Read the matrix from any CSV source. Missing cells become `NaN`.
    pub fn from_reader<R: Read>(source: R, id_column: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(source);
        let headers = read_headers(&mut reader)?;
        let id_col = find_column(&headers, id_column)?;
        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != id_col)
            .map(|(_, name)| name.clone())
            .collect();

        let mut ids = Vec::new();
        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("malformed CSV record {}", line + 1))?;
            let id = parse_id(record.get(id_col).unwrap_or_default()).with_context(|| {
                format!("record {} has an invalid {id_column} value", line + 1)
            })?;

            let mut row = Vec::with_capacity(columns.len());
            for (i, field) in record.iter().enumerate() {
                if i == id_col {
                    continue;
                }
                let value = match Value::parse(field) {
                    Value::Number(n) => n,
                    Value::Missing => f64::NAN,
                    Value::Text(text) => anyhow::bail!(
                        "record {} column '{}' is not numeric: {text}",
                        line + 1,
                        headers[i]
                    ),
                };
                row.push(value);
            }
            ids.push(id);
            rows.push(row);
        }

        Ok(Self { columns, ids, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature names in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Client identifiers in row order, kept only for alignment checks.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "SK_ID_CURR,TARGET,CODE_GENDER,AMT_INCOME_TOTAL\n\
                       100002,1,M,202500.0\n\
                       100003,0,F,\n";

    #[test]
    fn value_parse_distinguishes_kinds() {
        assert_eq!(Value::parse("3.5"), Value::Number(3.5));
        assert_eq!(Value::parse(" M "), Value::Text("M".to_string()));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("nan"), Value::Missing);
        assert_eq!(Value::parse("NaN"), Value::Missing);
    }

    #[test]
    fn value_parse_treats_na_spellings_as_missing() {
        for raw in ["NA", "N/A", "NULL", "null", "None", "-nan", "<NA>", " NA "] {
            assert_eq!(Value::parse(raw), Value::Missing, "{raw:?}");
        }
        assert_eq!(Value::parse("Nancy"), Value::Text("Nancy".to_string()));
        assert_eq!(Value::parse("none"), Value::Text("none".to_string()));
    }

    #[test]
    fn value_display_drops_integral_fraction() {
        assert_eq!(Value::Number(202500.0).to_string(), "202500");
        assert_eq!(Value::Missing.to_string(), "NaN");
    }

    #[test]
    fn value_display_keeps_shortest_fraction() {
        assert_eq!(Value::Number(0.2629).to_string(), "0.2629");
        assert_eq!(Value::Number(406597.5).to_string(), "406597.5");
        assert_eq!(Value::Number(1e-7).to_string(), "0.0000001");
        assert_eq!(Value::Number(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn parse_id_accepts_integral_floats() {
        assert_eq!(parse_id("100002"), Some(100002));
        assert_eq!(parse_id("100002.0"), Some(100002));
        assert_eq!(parse_id("100002.5"), None);
        assert_eq!(parse_id("abc"), None);
    }

    #[test]
    fn client_table_hides_id_and_label() {
        let table = ClientTable::from_reader(RAW.as_bytes(), "SK_ID_CURR", "TARGET").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.ids(), &[100002, 100003]);
        assert_eq!(table.display_columns(), vec!["CODE_GENDER", "AMT_INCOME_TOTAL"]);

        let record = table.display_record(1);
        assert_eq!(record[0], ("CODE_GENDER", &Value::Text("F".to_string())));
        assert_eq!(record[1], ("AMT_INCOME_TOTAL", &Value::Missing));
        assert_eq!(table.label(0), &Value::Number(1.0));
        assert!(table.column("TARGET").is_none());
    }

    #[test]
    fn client_table_requires_id_column() {
        let err = ClientTable::from_reader(RAW.as_bytes(), "ID", "TARGET").unwrap_err();
        assert!(err.to_string().contains("column 'ID' not found"));
    }

    #[test]
    fn feature_matrix_drops_id_and_maps_missing_to_nan() {
        let csv = "SK_ID_CURR,EXT_SOURCE_2,EXT_SOURCE_3\n100002,0.26,\n100003,0.62,0.5\n";
        let matrix = FeatureMatrix::from_reader(csv.as_bytes(), "SK_ID_CURR").unwrap();
        assert_eq!(matrix.columns(), &["EXT_SOURCE_2", "EXT_SOURCE_3"]);
        assert!(matrix.row(0)[1].is_nan());
        assert_eq!(matrix.row(1), &[0.62, 0.5]);
    }

    #[test]
    fn feature_matrix_rejects_text() {
        let csv = "SK_ID_CURR,FLAG\n100002,yes\n";
        assert!(FeatureMatrix::from_reader(csv.as_bytes(), "SK_ID_CURR").is_err());
    }
}
