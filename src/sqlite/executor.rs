use std::sync::Arc;

use rusqlite::{Connection, Rows, Statement, params_from_iter};

use super::params::Params;
use super::query::{column_names, sqlite_extract_value_sync};
use crate::error::{Result, SqlMapperError};
use crate::executor::{ExecOutcome, Executor, PreparedStatement, RowCursor};
use crate::scan::{ScanTarget, scan_values};
use crate::types::RowValues;

/// [`Executor`] over a borrowed `rusqlite` connection.
///
/// Rows are streamed from the driver one at a time. `SQLite` yields one result set per
/// statement and has no stored procedures, so procedure calls fail at prepare.
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let conn = rusqlite::Connection::open_in_memory()?;
/// conn.execute_batch("CREATE TABLE t (n INTEGER); INSERT INTO t VALUES (4), (NULL), (6);")?;
///
/// let db = SqliteExecutor::new(&conn);
/// let engine = Engine::new();
/// let ns: Option<Vec<i64>> = engine.find_array(&db, "SELECT n FROM t ORDER BY rowid", &[], "n")?;
/// assert_eq!(ns, Some(vec![4, 6]));
/// # Ok::<(), SqlMapperError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SqliteExecutor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExecutor<'conn> {
    #[must_use]
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl Executor for SqliteExecutor<'_> {
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedStatement + 'c>> {
        let stmt = self.conn.prepare(sql)?;
        let columns = column_names(&stmt);
        Ok(Box::new(SqliteStatement {
            conn: self.conn,
            stmt,
            columns,
        }))
    }
}

struct SqliteStatement<'conn> {
    conn: &'conn Connection,
    stmt: Statement<'conn>,
    columns: Arc<Vec<String>>,
}

impl PreparedStatement for SqliteStatement<'_> {
    fn query<'s>(&'s mut self, args: &[RowValues]) -> Result<Box<dyn RowCursor + 's>> {
        let params = Params::convert(args);
        let rows = self.stmt.query(params_from_iter(params.0))?;
        Ok(Box::new(SqliteCursor {
            rows,
            columns: Arc::clone(&self.columns),
            current: None,
        }))
    }

    fn execute(&mut self, args: &[RowValues]) -> Result<ExecOutcome> {
        let params = Params::convert(args);
        let affected = self.stmt.execute(params_from_iter(params.0))?;
        Ok(ExecOutcome {
            rows_affected: affected as u64,
            last_insert_id: self.conn.last_insert_rowid(),
        })
    }
}

struct SqliteCursor<'s> {
    rows: Rows<'s>,
    columns: Arc<Vec<String>>,
    current: Option<Vec<RowValues>>,
}

impl RowCursor for SqliteCursor<'_> {
    fn columns(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.columns)
    }

    fn next_row(&mut self) -> Result<bool> {
        let width = self.columns.len();
        match self.rows.next()? {
            Some(row) => {
                let mut values = Vec::with_capacity(width);
                for idx in 0..width {
                    values.push(sqlite_extract_value_sync(row, idx)?);
                }
                self.current = Some(values);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn scan(&mut self, targets: &mut [ScanTarget]) -> Result<()> {
        let values = self.current.as_deref().ok_or_else(|| {
            SqlMapperError::ExecutionError("scan called without a current row".into())
        })?;
        scan_values(values, targets)
    }

    fn next_result_set(&mut self) -> Result<bool> {
        Ok(false)
    }
}
