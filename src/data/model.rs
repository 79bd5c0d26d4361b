use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::SchemaError;

// ---------------------------------------------------------------------------
// Canonical column names of the student records table
// ---------------------------------------------------------------------------

/// Column names as they appear in the source file.
pub mod columns {
    pub const GENDER: &str = "Gender";
    pub const SCHOLARSHIP: &str = "Scholarship holder";
    pub const MARITAL_STATUS: &str = "Marital status";
    pub const NATIONALITY: &str = "Nacionality";
    pub const INTERNATIONAL: &str = "International";
    pub const AGE_AT_ENROLLMENT: &str = "Age at enrollment";
    pub const SECOND_SEM_GRADE: &str = "Curricular units 2nd sem (grade)";
    pub const SECOND_SEM_CREDITED: &str = "Curricular units 2nd sem (credited)";
    pub const SECOND_SEM_EVALUATED: &str = "Curricular units 2nd sem (2)";
    pub const MOTHERS_OCCUPATION: &str = "Mother's occupation";
    pub const FATHERS_OCCUPATION: &str = "Father's occupation";
    pub const TARGET: &str = "Target";

    /// Columns every source file must carry. `SECOND_SEM_EVALUATED` is charted
    /// when present but its absence is not a load error.
    pub const REQUIRED: &[&str] = &[
        GENDER,
        SCHOLARSHIP,
        MARITAL_STATUS,
        NATIONALITY,
        INTERNATIONAL,
        AGE_AT_ENROLLMENT,
        SECOND_SEM_GRADE,
        SECOND_SEM_CREDITED,
        MOTHERS_OCCUPATION,
        FATHERS_OCCUPATION,
        TARGET,
    ];
}

// ---------------------------------------------------------------------------
// Outcome – the three-valued academic result held in the Target column
// ---------------------------------------------------------------------------

/// Academic outcome of a student. The source file stores it as a small
/// integer code; [`Outcome::from_code`] is the only place that mapping lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Dropout,
    Graduate,
    Enrolled,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Dropout, Outcome::Graduate, Outcome::Enrolled];

    /// Decode the source integer. Codes outside {0, 1, 2} are a schema error,
    /// decided at load time by the caller.
    pub fn from_code(code: i64) -> Option<Outcome> {
        match code {
            0 => Some(Outcome::Dropout),
            1 => Some(Outcome::Graduate),
            2 => Some(Outcome::Enrolled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Dropout => "Dropout",
            Outcome::Graduate => "Graduate",
            Outcome::Enrolled => "Enrolled",
        }
    }
}

// ---------------------------------------------------------------------------
// FieldValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `FieldValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put FieldValue in BTreeSet --

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::String(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v:.2}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Try to interpret the value as an `f64` for numeric aggregation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The integer code form, used when decoding the Target column.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// StudentRecord – one row of the table
// ---------------------------------------------------------------------------

/// A single student record (one row of the source table). Fields are
/// read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl StudentRecord {
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        StudentRecord { fields }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// The cell value, with absent columns flattened to `Null`.
    pub fn value(&self, column: &str) -> FieldValue {
        self.fields.get(column).cloned().unwrap_or(FieldValue::Null)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Replace the Target code with its decoded label. Only called by the
    /// loader before the record becomes visible to the rest of the crate.
    pub(super) fn set_target_label(&mut self, outcome: Outcome) {
        self.fields.insert(
            columns::TARGET.to_string(),
            FieldValue::String(outcome.label().to_string()),
        );
    }

    /// Decode this record's Target cell, failing on missing, non-integer or
    /// out-of-domain codes.
    pub(super) fn decode_target(&self, row: usize) -> Result<Outcome, SchemaError> {
        let raw = self
            .get(columns::TARGET)
            .ok_or_else(|| SchemaError::MissingColumn(columns::TARGET.to_string()))?;
        let code = raw.as_i64().ok_or_else(|| SchemaError::InvalidTarget {
            row,
            value: raw.to_string(),
        })?;
        Outcome::from_code(code).ok_or(SchemaError::UnknownTargetCode { row, code })
    }
}

// ---------------------------------------------------------------------------
// StudentDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices. Immutable after
/// load: no field is added, removed or rewritten afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDataset {
    /// All records (rows), in source order.
    records: Vec<StudentRecord>,
    /// Ordered list of column names.
    column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    unique_values: BTreeMap<String, BTreeSet<FieldValue>>,
    /// Columns whose every non-null value is numeric.
    numeric_columns: Vec<String>,
}

impl StudentDataset {
    /// Build column indices from the loaded records.
    pub fn from_records(records: Vec<StudentRecord>) -> Self {
        let mut column_names_set: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<FieldValue>> = BTreeMap::new();

        for rec in &records {
            for col in rec.columns() {
                column_names_set.insert(col.to_string());
                unique_values
                    .entry(col.to_string())
                    .or_default()
                    .insert(rec.value(col));
            }
        }
        let column_names: Vec<String> = column_names_set.into_iter().collect();

        let numeric_columns = column_names
            .iter()
            .filter(|col| {
                let vals = &unique_values[*col];
                let mut any_number = false;
                for v in vals {
                    match v {
                        FieldValue::Null => {}
                        other if other.as_f64().is_some() => any_number = true,
                        _ => return false,
                    }
                }
                any_number
            })
            .cloned()
            .collect();

        StudentDataset {
            records,
            column_names,
            unique_values,
            numeric_columns,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn record(&self, row: usize) -> &StudentRecord {
        &self.records[row]
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Sorted unique values of a column (empty set for unknown columns).
    pub fn distinct(&self, column: &str) -> BTreeSet<FieldValue> {
        self.unique_values.get(column).cloned().unwrap_or_default()
    }

    /// Columns eligible for correlation and other numeric aggregates.
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, FieldValue)]) -> StudentRecord {
        StudentRecord::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn target_codes_map_onto_exactly_three_labels() {
        let labels: Vec<&str> = (0..3)
            .map(|c| Outcome::from_code(c).unwrap().label())
            .collect();
        assert_eq!(labels, vec!["Dropout", "Graduate", "Enrolled"]);

        // Bijection: no two codes share a label.
        let unique: std::collections::BTreeSet<&str> = labels.into_iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn out_of_domain_codes_are_rejected() {
        assert!(Outcome::from_code(3).is_none());
        assert!(Outcome::from_code(-1).is_none());
    }

    #[test]
    fn decode_target_reports_bad_cells() {
        let rec = record(&[(columns::TARGET, FieldValue::Integer(5))]);
        match rec.decode_target(3) {
            Err(SchemaError::UnknownTargetCode { row: 3, code: 5 }) => {}
            other => panic!("unexpected: {other:?}"),
        }

        let rec = record(&[(columns::TARGET, FieldValue::String("Dropout".into()))]);
        assert!(matches!(
            rec.decode_target(0),
            Err(SchemaError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn dataset_indexes_columns_and_unique_values() {
        let ds = StudentDataset::from_records(vec![
            record(&[
                ("Gender", FieldValue::String("Female".into())),
                ("Age at enrollment", FieldValue::Integer(19)),
            ]),
            record(&[
                ("Gender", FieldValue::String("Male".into())),
                ("Age at enrollment", FieldValue::Integer(23)),
            ]),
        ]);

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names(), &["Age at enrollment", "Gender"]);
        assert_eq!(ds.distinct("Gender").len(), 2);
        assert_eq!(ds.numeric_columns(), &["Age at enrollment"]);
    }

    #[test]
    fn mixed_type_columns_are_not_numeric() {
        let ds = StudentDataset::from_records(vec![
            record(&[("x", FieldValue::Integer(1))]),
            record(&[("x", FieldValue::String("two".into()))]),
        ]);
        assert!(ds.numeric_columns().is_empty());
    }

    #[test]
    fn field_value_ordering_is_total() {
        let mut vals = vec![
            FieldValue::String("b".into()),
            FieldValue::Null,
            FieldValue::Float(1.5),
            FieldValue::Integer(2),
            FieldValue::String("a".into()),
        ];
        vals.sort();
        assert_eq!(vals[0], FieldValue::Null);
        assert_eq!(vals[4], FieldValue::String("b".into()));
    }
}
