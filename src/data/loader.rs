use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Cell, RawColumn, RawRecord, RawTable};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the accident snapshot.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – the snapshot written by the conversion step (recommended)
/// * `.json`    – `[{ "發生日期": "...", ... }, ...]`
/// * `.csv`     – header row with the snapshot column names
///
/// A missing file is [`DashboardError::MissingArtifact`]; every other
/// failure is [`DashboardError::Unreadable`].
pub fn load_file(path: &Path) -> Result<RawTable, DashboardError> {
    if !path.exists() {
        return Err(DashboardError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loaded = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => Err(anyhow::anyhow!("Unsupported file extension: .{other}")),
    };

    loaded.map_err(|source| DashboardError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "發生日期": "2024-03-15", "發生時間": 1430, "緯度": 25.03, ... },
///   ...
/// ]
/// ```
///
/// Keys absent from an object read as null.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        records.push(RawRecord::from_cells(|col| {
            obj.get(col.name()).map(json_to_cell).unwrap_or(Cell::Null)
        }));
    }

    Ok(RawTable { records })
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the snapshot column names; every required
/// column must be present. Empty fields read as null.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let positions = locate_columns(|name| headers.iter().position(|h| h == name))?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(RawRecord::from_cells(|col| {
            row.get(positions[&col])
                .map(guess_cell_type)
                .unwrap_or(Cell::Null)
        }));
    }

    Ok(RawTable { records })
}

fn guess_cell_type(s: &str) -> Cell {
    if s.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Cell::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Cell::Float(f);
    }
    Cell::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load the Parquet snapshot.
///
/// Every [`RawColumn`] must be present; extra columns are ignored. Works
/// with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let positions = locate_columns(|name| schema.index_of(name).ok())?;
        let columns: BTreeMap<RawColumn, ArrayRef> = positions
            .iter()
            .map(|(col, idx)| -> Result<(RawColumn, ArrayRef)> {
                Ok((*col, text_compatible(batch.column(*idx))?))
            })
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            records.push(RawRecord::from_cells(|col| {
                extract_cell(&columns[&col], row)
            }));
        }
    }

    Ok(RawTable { records })
}

/// Map every required column to its position, failing on the first gap.
fn locate_columns(
    mut position_of: impl FnMut(&str) -> Option<usize>,
) -> Result<BTreeMap<RawColumn, usize>> {
    let mut positions = BTreeMap::new();
    for col in RawColumn::ALL {
        match position_of(col.name()) {
            Some(idx) => {
                positions.insert(col, idx);
            }
            None => bail!("snapshot missing '{}' column", col.name()),
        }
    }
    Ok(positions)
}

// -- Arrow helpers --

fn is_direct(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Cast anything we do not read natively (dictionaries, dates,
/// timestamps, ...) to Utf8 once per batch.
fn text_compatible(col: &ArrayRef) -> Result<ArrayRef> {
    if is_direct(col.data_type()) {
        return Ok(col.clone());
    }
    arrow::compute::cast(col, &DataType::Utf8)
        .with_context(|| format!("cannot read {:?} column as text", col.data_type()))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Cell {
    if col.is_null(row) {
        return Cell::Null;
    }
    match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => Cell::Text(col.as_string_view().value(row).to_string()),
        DataType::Boolean => Cell::Bool(col.as_boolean().value(row)),
        DataType::Int8 => Cell::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => Cell::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => Cell::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Cell::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Cell::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => Cell::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => Cell::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(Cell::Float(v as f64), Cell::Integer)
        }
        DataType::Float32 => Cell::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Float(col.as_primitive::<Float64Type>().value(row)),
        other => Cell::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_parquet(path: &Path) {
        let mut fields = Vec::new();
        let mut arrays: Vec<ArrayRef> = Vec::new();
        for col in RawColumn::ALL {
            match col {
                RawColumn::Time | RawColumn::Age => {
                    fields.push(Field::new(col.name(), DataType::Int64, true));
                    let values = if col == RawColumn::Time { [1430, 905] } else { [30, 71] };
                    arrays.push(Arc::new(Int64Array::from(vec![Some(values[0]), Some(values[1])])));
                }
                RawColumn::Latitude | RawColumn::Longitude => {
                    fields.push(Field::new(col.name(), DataType::Float64, true));
                    arrays.push(Arc::new(Float64Array::from(vec![Some(25.03), None])));
                }
                RawColumn::Cause => {
                    fields.push(Field::new(col.name(), DataType::Utf8, true));
                    arrays.push(Arc::new(StringArray::from(vec![None, Some("酒後駕駛")])));
                }
                RawColumn::Date => {
                    fields.push(Field::new(col.name(), DataType::Utf8, true));
                    arrays.push(Arc::new(StringArray::from(vec!["2024-03-15", "2024-03-16"])));
                }
                other => {
                    fields.push(Field::new(other.name(), DataType::Utf8, true));
                    arrays.push(Arc::new(StringArray::from(vec!["機車", "機車"])));
                }
            }
        }
        // An unrelated extra column must be ignored.
        fields.push(Field::new("備註", DataType::Utf8, true));
        arrays.push(Arc::new(StringArray::from(vec!["x", "y"])));

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn missing_file_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("all_accidents_data.parquet")).unwrap_err();
        assert!(matches!(err, DashboardError::MissingArtifact { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn unsupported_extension_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.xlsx");
        std::fs::write(&path, b"whatever").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DashboardError::Unreadable { .. }));
    }

    #[test]
    fn parquet_snapshot_reads_typed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.parquet");
        write_parquet(&path);

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.records[0];
        assert_eq!(first.time, Cell::Integer(1430));
        assert_eq!(first.cause, Cell::Null);
        assert_eq!(first.latitude, Cell::Float(25.03));
        assert_eq!(table.records[1].longitude, Cell::Null);
        assert_eq!(table.records[1].cause, Cell::Text("酒後駕駛".into()));
    }

    #[test]
    fn csv_matches_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let parquet_path = dir.path().join("snapshot.parquet");
        write_parquet(&parquet_path);

        let csv_path = dir.path().join("snapshot.csv");
        let mut rows = vec![RawColumn::csv_header()];
        rows.push("機車,2024-03-15,1430,30,,機車,機車,機車,機車,機車,機車,機車,機車,機車,25.03,25.03".into());
        rows.push("機車,2024-03-16,905,71,酒後駕駛,機車,機車,機車,機車,機車,機車,機車,機車,機車,,".into());
        std::fs::write(&csv_path, rows.join("\n")).unwrap();

        assert_eq!(load_file(&csv_path).unwrap(), load_file(&parquet_path).unwrap());
    }

    #[test]
    fn csv_missing_column_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        std::fs::write(&path, "發生日期,發生時間\n2024-03-15,1430\n").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("當事者區分-類別-大類別名稱-車種"));
    }

    #[test]
    fn json_records_with_absent_keys_read_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, r#"[{ "發生時間": 1430, "緯度": 25.5, "發生地點": "中山路" }]"#).unwrap();

        let table = load_file(&path).unwrap();
        let rec = &table.records[0];
        assert_eq!(rec.time, Cell::Integer(1430));
        assert_eq!(rec.latitude, Cell::Float(25.5));
        assert_eq!(rec.location, Cell::Text("中山路".into()));
        assert_eq!(rec.age, Cell::Null);
    }
}
