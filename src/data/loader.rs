use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use log::warn;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Record, Table};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-delimited with a header row
/// * `.tsv` / `.tab` – tab-delimited with a header row
/// * `.json`         – `[{ "smiles": "CCO", "activity": 1, ... }, ...]`
/// * `.parquet`      – flat columns of strings, ints, floats or bools
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_delimited(path, b','),
        "tsv" | "tab" => load_delimited(path, b'\t'),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Delimited loader
// ---------------------------------------------------------------------------

/// Strict read first. A file with ragged rows is re-read in flexible mode,
/// padding short rows with nulls so the table keeps its header width.
fn load_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    match read_delimited(file, delimiter, false) {
        Ok(table) => Ok(table),
        Err(e) if is_unequal_lengths(&e) => {
            warn!(
                "{}: rows have unequal lengths ({e:#}), falling back to flexible reader",
                path.display()
            );
            let file = File::open(path).with_context(|| format!("reopening {}", path.display()))?;
            read_delimited(file, delimiter, true)
        }
        Err(e) => Err(e),
    }
}

/// Read a delimited table from any reader (useful for tests and in-memory data).
pub fn read_delimited(reader: impl Read, delimiter: u8, flexible: bool) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(flexible)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row: Record = record.iter().map(guess_cell_type).collect();
        records.push(row);
    }

    Ok(Table::new(headers, records))
}

fn is_unequal_lengths(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|c| c.downcast_ref::<csv::Error>())
        .any(|e| matches!(e.kind(), csv::ErrorKind::UnequalLengths { .. }))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "smiles": "CCO", "activity": 1 },
///   { "smiles": "c1ccccc1", "activity": 0 }
/// ]
/// ```
///
/// Columns are the union of keys in order of first appearance.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in rows.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let records = rows
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(Table::new(columns, records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Unsupported column types are read as
/// their type name so the column still resolves by name.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let record: Record = batch
                .columns()
                .iter()
                .map(|col| extract_cell_value(col, row))
                .collect();
            records.push(record);
        }
    }

    Ok(Table::new(columns, records))
}

// -- Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        other => Some(CellValue::String(format!("{other:?}"))),
    };
    value.unwrap_or(CellValue::Null)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn csv_cells_are_typed() {
        let data = "smiles,activity,score\nCCO,1,0.5\nc1ccccc1,,x\n";
        let t = read_delimited(data.as_bytes(), b',', false).unwrap();
        assert_eq!(t.columns(), vec!["smiles", "activity", "score"]);
        assert_eq!(t.records()[0][0], CellValue::String("CCO".into()));
        assert_eq!(t.records()[0][1], CellValue::Integer(1));
        assert_eq!(t.records()[0][2], CellValue::Float(0.5));
        assert_eq!(t.records()[1][1], CellValue::Null);
        assert_eq!(t.records()[1][2], CellValue::String("x".into()));
    }

    #[test]
    fn ragged_csv_falls_back_to_flexible_reader() {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(f, "smiles,y\nCCO,1\nCC\nCCC,0\n").unwrap();
        let t = load_table(f.path()).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.records()[1], vec![CellValue::String("CC".into()), CellValue::Null]);
    }

    #[test]
    fn tsv_and_json_load() {
        let mut tsv = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        write!(tsv, "smiles\tlabel\nCCO\t1\n").unwrap();
        let t = load_table(tsv.path()).unwrap();
        assert_eq!(t.column_index("label"), Ok(1));

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"[{{"smiles":"CCO","y":1}},{{"smiles":"CC","z":true}}]"#).unwrap();
        let t = load_table(json.path()).unwrap();
        assert_eq!(t.columns(), vec!["smiles", "y", "z"]);
        assert_eq!(t.records()[1], vec![
            CellValue::String("CC".into()),
            CellValue::Null,
            CellValue::Bool(true),
        ]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let f = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        assert!(load_table(f.path()).is_err());
    }
}
