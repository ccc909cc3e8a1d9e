use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a DataFrame reader infers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` label or feature.
    ///
    /// `Null` maps to NaN, booleans to 0/1. Strings are parsed if they hold a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Null => Some(f64::NAN),
            CellValue::String(s) => s.trim().parse().ok(),
        }
    }

    /// Text content of the cell, `None` for nulls.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded file
// ---------------------------------------------------------------------------

/// One row of the source table, cells in column order.
pub type Record = Vec<CellValue>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("column '{name}' not found (available: {available:?})")]
pub struct MissingColumn {
    pub name: String,
    pub available: Vec<String>,
}

/// The full parsed table: ordered header names plus row records.
///
/// Every record holds exactly `columns().len()` cells. [`Table::new`] is the
/// only way in, and it pads short rows with [`CellValue::Null`] and truncates
/// long ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        let width = columns.len();
        let records = records
            .into_iter()
            .map(|mut r| {
                r.resize(width, CellValue::Null);
                r
            })
            .collect();
        Table { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Resolve a column name to its positional index.
    pub fn column_index(&self, name: &str) -> Result<usize, MissingColumn> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| MissingColumn {
                name: name.to_string(),
                available: self.columns.clone(),
            })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the cells of one column; empty when `index` is out of range.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.records.iter().filter_map(move |r| r.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_records_are_padded() {
        let t = Table::new(
            vec!["smiles".into(), "y".into()],
            vec![vec![CellValue::String("CCO".into())]],
        );
        assert_eq!(t.records()[0], vec![CellValue::String("CCO".into()), CellValue::Null]);
    }

    #[test]
    fn long_records_are_truncated() {
        let t = Table::new(
            vec!["smiles".into()],
            vec![vec![CellValue::String("C".into()), CellValue::Integer(3)]],
        );
        assert_eq!(t.records()[0].len(), 1);
        assert_eq!(t.column(0).count(), 1);
        assert_eq!(t.column(5).count(), 0);
    }

    #[test]
    fn column_lookup_reports_available_names() {
        let t = Table::new(vec!["a".into(), "b".into()], vec![]);
        assert_eq!(t.column_index("b"), Ok(1));
        let err = t.column_index("smiles").unwrap_err();
        assert_eq!(err.available, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn numeric_interpretation() {
        assert_eq!(CellValue::Integer(1).as_f64(), Some(1.0));
        assert_eq!(CellValue::String(" 2.5 ".into()).as_f64(), Some(2.5));
        assert_eq!(CellValue::String("active".into()).as_f64(), None);
        assert!(CellValue::Null.as_f64().unwrap().is_nan());
    }
}
