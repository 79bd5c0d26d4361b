use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{DataSourceError, LoadResult, SchemaError};
use super::model::{columns, FieldValue, StudentDataset, StudentRecord};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a student records table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat scalar columns (recommended)
/// * `.json`    – `[{ "Gender": ..., "Target": 0, ... }, ...]`
/// * `.csv`     – header row with column names, one record per row
///
/// All formats funnel through the same schema check and Target remapping, so
/// a dataset is either fully normalized or the load fails as a whole.
pub fn load_file(path: &Path) -> LoadResult<StudentDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => Err(DataSourceError::UnsupportedFormat(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// Shared finalization: schema check + Target remapping
// ---------------------------------------------------------------------------

/// Validate the observed columns against the required schema, then replace
/// every Target code with its outcome label.  `observed` comes from the file
/// header / schema so the check also works for zero-row files.
fn build_dataset(
    observed: &BTreeSet<String>,
    mut records: Vec<StudentRecord>,
) -> LoadResult<StudentDataset> {
    for col in columns::REQUIRED {
        if !observed.contains(*col) {
            return Err(SchemaError::MissingColumn(col.to_string()).into());
        }
    }

    for (row, rec) in records.iter_mut().enumerate() {
        let outcome = rec.decode_target(row)?;
        rec.set_target_label(outcome);
    }

    Ok(StudentDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Gender": "Female", "Scholarship holder": 1, "Target": 0, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> LoadResult<StudentDataset> {
    let text = std::fs::read_to_string(path).map_err(DataSourceError::Io)?;
    let root: JsonValue = serde_json::from_str(&text)
        .map_err(|e| DataSourceError::Malformed(format!("JSON: {e}")))?;

    let rows = root
        .as_array()
        .ok_or_else(|| DataSourceError::Malformed("expected top-level JSON array".into()))?;

    let mut observed = BTreeSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| DataSourceError::Malformed(format!("row {i} is not a JSON object")))?;

        let mut fields = BTreeMap::new();
        for (key, val) in obj {
            observed.insert(key.clone());
            fields.insert(key.clone(), json_to_field(val));
        }
        records.push(StudentRecord::new(fields));
    }

    build_dataset(&observed, records)
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one record per row.
/// Cell types are inferred per value (integer, float, bool, text).
fn load_csv(path: &Path) -> LoadResult<StudentDataset> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_source_error)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_source_error)?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let observed: BTreeSet<String> = headers.iter().cloned().collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(csv_source_error)?;
        if record.len() != headers.len() {
            return Err(DataSourceError::Malformed(format!(
                "CSV row {row_no}: {} cells for {} columns",
                record.len(),
                headers.len()
            ))
            .into());
        }

        let fields: BTreeMap<String, FieldValue> = headers
            .iter()
            .zip(record.iter())
            .map(|(col, cell)| (col.clone(), guess_field_type(cell)))
            .collect();
        records.push(StudentRecord::new(fields));
    }

    build_dataset(&observed, records)
}

fn csv_source_error(err: csv::Error) -> DataSourceError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => DataSourceError::Io(io),
        other => DataSourceError::Malformed(format!("CSV: {other:?}")),
    }
}

fn guess_field_type(s: &str) -> FieldValue {
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if s == "true" || s == "false" {
        return FieldValue::Bool(s == "true");
    }
    FieldValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of student records.
///
/// Every column must hold scalar values (strings, ints, floats, bools).
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> LoadResult<StudentDataset> {
    let file = std::fs::File::open(path).map_err(DataSourceError::Io)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DataSourceError::Malformed(format!("parquet metadata: {e}")))?;
    let reader = builder
        .build()
        .map_err(|e| DataSourceError::Malformed(format!("parquet reader: {e}")))?;

    let mut observed = BTreeSet::new();
    let mut records = Vec::new();

    for batch_result in reader {
        let batch =
            batch_result.map_err(|e| DataSourceError::Malformed(format!("record batch: {e}")))?;
        let schema = batch.schema();

        let col_names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        observed.extend(col_names.iter().cloned());

        for row in 0..batch.num_rows() {
            let mut fields = BTreeMap::new();
            for (col_idx, col_name) in col_names.iter().enumerate() {
                let value = extract_field_value(batch.column(col_idx), row);
                fields.insert(col_name.clone(), value);
            }
            records.push(StudentRecord::new(fields));
        }
    }

    build_dataset(&observed, records)
}

/// Extract a single scalar value from an Arrow column at a given row.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                FieldValue::String(s.value(row).to_string())
            } else {
                // LargeStringArray
                let s = col.as_string::<i64>();
                FieldValue::String(s.value(row).to_string())
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            FieldValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            FieldValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            FieldValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            FieldValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            FieldValue::Bool(arr.value(row))
        }
        _ => FieldValue::String(format!("{:?}", col.data_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::LoadError;
    use std::io::Write;

    const HEADER: &str = "Gender,Scholarship holder,Marital status,Nacionality,International,\
Age at enrollment,Curricular units 2nd sem (grade),Curricular units 2nd sem (credited),\
Mother's occupation,Father's occupation,Target";

    fn write_csv(rows: &[&str]) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.into_temp_path()
    }

    #[test]
    fn csv_round_trip_remaps_target() {
        let path = write_csv(&[
            "Female,1,1,1,0,19,13.5,2,5,7,0",
            "Male,0,2,1,1,24,11.0,0,9,9,1",
            "Female,0,1,2,0,21,12.2,1,4,4,2",
        ]);
        let ds = load_file(&path).unwrap();

        assert_eq!(ds.len(), 3);
        let targets: Vec<FieldValue> =
            ds.records().iter().map(|r| r.value(columns::TARGET)).collect();
        assert_eq!(
            targets,
            vec![
                FieldValue::String("Dropout".into()),
                FieldValue::String("Graduate".into()),
                FieldValue::String("Enrolled".into()),
            ]
        );
        // Other fields come through untouched.
        assert_eq!(
            ds.record(0).value(columns::GENDER),
            FieldValue::String("Female".into())
        );
        assert_eq!(
            ds.record(1).value(columns::AGE_AT_ENROLLMENT),
            FieldValue::Integer(24)
        );
    }

    #[test]
    fn unknown_target_code_is_a_schema_error() {
        let path = write_csv(&["Female,1,1,1,0,19,13.5,2,5,7,4"]);
        match load_file(&path) {
            Err(LoadError::Schema(SchemaError::UnknownTargetCode { row: 0, code: 4 })) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "Gender,Target").unwrap();
        writeln!(file, "Female,0").unwrap();
        let path = file.into_temp_path();

        match load_file(&path) {
            Err(LoadError::Schema(SchemaError::MissingColumn(col))) => {
                assert_eq!(col, "Scholarship holder");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unreadable_source_is_a_data_source_error() {
        let missing = Path::new("/no/such/records.csv");
        assert!(matches!(
            load_file(missing),
            Err(LoadError::Source(DataSourceError::Io(_)))
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert!(matches!(
            load_file(Path::new("records.xlsx")),
            Err(LoadError::Source(DataSourceError::UnsupportedFormat(ext))) if ext == "xlsx"
        ));
    }

    #[test]
    fn json_records_load_with_inferred_types() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"[{{"Gender": "Female", "Scholarship holder": 1, "Marital status": 1,
                 "Nacionality": 1, "International": 0, "Age at enrollment": 19,
                 "Curricular units 2nd sem (grade)": 13.5,
                 "Curricular units 2nd sem (credited)": 2,
                 "Mother's occupation": 5, "Father's occupation": 7, "Target": 1}}]"#
        )
        .unwrap();
        let path = file.into_temp_path();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(
            ds.record(0).value(columns::TARGET),
            FieldValue::String("Graduate".into())
        );
        assert_eq!(
            ds.record(0).value(columns::SECOND_SEM_GRADE),
            FieldValue::Float(13.5)
        );
    }

    #[test]
    fn zero_row_csv_still_checks_the_header() {
        let path = write_csv(&[]);
        let ds = load_file(&path).unwrap();
        assert!(ds.is_empty());
    }
}
