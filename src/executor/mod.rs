//! The narrow interface the engine consumes from a database driver.
//!
//! An [`Executor`] prepares statements; a [`PreparedStatement`] either runs a row-returning
//! query, producing a [`RowCursor`], or executes a statement for its side effects. Closing is
//! scoped: dropping the boxed statement or cursor releases it, and the engine drops both before
//! any operation returns.

mod buffered;
mod memory;
mod statement;

use std::sync::Arc;

pub use buffered::BufferedCursor;
pub use memory::{FailurePoint, MemoryExecutor};
pub use statement::{QueryText, call_statement};

use crate::error::Result;
use crate::scan::ScanTarget;
use crate::types::RowValues;

/// Outcome of a statement executed for its side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

/// Something that can prepare SQL text.
pub trait Executor {
    /// Prepare `sql` verbatim.
    ///
    /// # Errors
    /// Returns the driver's error if the statement cannot be prepared.
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedStatement + 'c>>;
}

/// A prepared statement handle. Dropping it closes the statement.
pub trait PreparedStatement {
    /// Run the statement with positional arguments and open a cursor over its rows.
    ///
    /// # Errors
    /// Returns the driver's error if binding or execution fails.
    fn query<'s>(&'s mut self, args: &[RowValues]) -> Result<Box<dyn RowCursor + 's>>;

    /// Run the statement for its side effects.
    ///
    /// # Errors
    /// Returns the driver's error if binding or execution fails.
    fn execute(&mut self, args: &[RowValues]) -> Result<ExecOutcome>;
}

/// Row iteration over one or more consecutive result sets. Dropping it closes the cursor.
pub trait RowCursor {
    /// Column names of the current result set.
    fn columns(&self) -> Arc<Vec<String>>;

    /// Advance to the next row of the current result set.
    ///
    /// # Errors
    /// Returns the driver's error if fetching fails.
    fn next_row(&mut self) -> Result<bool>;

    /// Copy the current row into `targets`, one target per column.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if the target count or a value kind disagrees with the row.
    fn scan(&mut self, targets: &mut [ScanTarget]) -> Result<()>;

    /// Advance to the next result set. Drivers with a single result set per statement
    /// return `false`.
    ///
    /// # Errors
    /// Returns the driver's error if advancing fails.
    fn next_result_set(&mut self) -> Result<bool>;
}
