//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::engine::{
    CoercionPolicy, Engine, EngineOptions, JsonShape, MapKey, MapValue, ResultTarget, SqlElement,
};
pub use crate::error::{Result, SqlMapperError};
pub use crate::executor::{
    BufferedCursor, ExecOutcome, Executor, FailurePoint, MemoryExecutor, PreparedStatement,
    QueryText, RowCursor,
};
pub use crate::mapping::{ColumnValue, FieldDescriptor, Record};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::scan::ScanTarget;
pub use crate::trace::{TraceSink, TracingSink};
pub use crate::types::{FieldKind, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::client::Client;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{ClientOptions, ClientOptionsBuilder, SqliteExecutor};
