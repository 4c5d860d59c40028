use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

/// Crate-wide result alias.
pub type Result<T, E = SqlMapperError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SqlMapperError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "sqlite")]
    #[error("Connection pool error: {0}")]
    PoolError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    /// The destination has the wrong shape for the operation (not a record, empty list, ...).
    #[error("Destination shape mismatch: {0}")]
    ShapeError(String),

    /// A driver value or column count disagrees with what the destination expects.
    #[error("Column mismatch: {0}")]
    ColumnMismatch(String),

    #[error("Unsupported destination kind: {0}")]
    UnsupportedKind(String),

    #[error("cannot convert negative value {value} to unsigned type {type_name}")]
    UnsignedUnderflow {
        value: i64,
        type_name: &'static str,
    },

    #[error("field '{0}' not found in query results")]
    MissingField(String),

    #[error("too many result sets, expected {0}")]
    TooManyResultSets(usize),

    #[error(transparent)]
    SerializationError(#[from] serde_json::Error),
}

#[cfg(feature = "sqlite")]
impl From<bb8::RunError<SqlMapperError>> for SqlMapperError {
    fn from(err: bb8::RunError<SqlMapperError>) -> Self {
        match err {
            bb8::RunError::User(inner) => inner,
            bb8::RunError::TimedOut => {
                SqlMapperError::PoolError("timed out waiting for a SQLite connection".into())
            }
        }
    }
}
