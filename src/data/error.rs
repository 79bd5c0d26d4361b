use thiserror::Error;

// ---------------------------------------------------------------------------
// Load-time errors (fatal: no partial dashboard is shown)
// ---------------------------------------------------------------------------

/// The source file could not be read at all.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("failed to read data source: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    /// The file was readable but not parseable as its claimed format.
    #[error("malformed data source: {0}")]
    Malformed(String),
}

/// The source was readable but its contents violate the expected schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    /// A Target code outside {0, 1, 2}. Unknown codes are never silently
    /// defaulted to a label.
    #[error("row {row}: Target code {code} is outside the known domain {{0, 1, 2}}")]
    UnknownTargetCode { row: usize, code: i64 },

    #[error("row {row}: Target value '{value}' is not an integer code")]
    InvalidTarget { row: usize, value: String },
}

/// Top-level loader error.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] DataSourceError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type LoadResult<T> = Result<T, LoadError>;

// ---------------------------------------------------------------------------
// Pipeline-time errors (recovered locally, never fatal to the session)
// ---------------------------------------------------------------------------

/// A filter value not observed in the dataset. Filtering itself tolerates
/// these (the affected predicate simply matches nothing); this type exists so
/// callers can report the condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterDomainError {
    #[error("gender value '{0}' does not occur in the dataset")]
    UnknownGender(String),

    #[error("scholarship value '{0}' does not occur in the dataset")]
    UnknownScholarship(String),
}

/// A correlation cell with no defined value. Carried per cell so one
/// degenerate column cannot poison the rest of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UndefinedCorrelation {
    #[error("correlation undefined: only {0} usable rows (need at least 2)")]
    TooFewRows(usize),

    #[error("correlation undefined: '{0}' has zero variance")]
    ZeroVariance(String),
}
