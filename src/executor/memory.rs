use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{BufferedCursor, ExecOutcome, Executor, PreparedStatement, RowCursor};
use crate::error::{Result, SqlMapperError};
use crate::results::ResultSet;
use crate::scan::ScanTarget;
use crate::types::RowValues;

/// Where a scripted query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Prepare,
    Execute,
    /// Fetching fails once this many rows have been handed out.
    Fetch { after_rows: usize },
}

#[derive(Debug, Clone, Default)]
struct Script {
    sets: Vec<ResultSet>,
    outcome: ExecOutcome,
    failure: Option<FailurePoint>,
}

#[derive(Debug, Default)]
struct Counters {
    open_statements: AtomicUsize,
    open_cursors: AtomicUsize,
    prepared: AtomicUsize,
}

struct OpenGuard<'a>(&'a AtomicUsize);

impl<'a> OpenGuard<'a> {
    fn acquire(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for OpenGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory executor answering from a script keyed by exact SQL text.
///
/// Each scripted query can return several result sets, report an [`ExecOutcome`], or fail at
/// a chosen [`FailurePoint`]. Open statements and cursors are counted so callers can check that
/// every handle was released.
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let db = MemoryExecutor::new().with_rows(
///     "SELECT n FROM t",
///     ResultSet::from_rows(&["n"], vec![vec![RowValues::Int(7)]]),
/// );
/// let engine = Engine::new();
/// let n: Option<i64> = engine.first_col_any(&db, "SELECT n FROM t", &[])?;
/// assert_eq!(n, Some(7));
/// assert_eq!(db.open_cursors(), 0);
/// # Ok::<(), SqlMapperError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    scripts: HashMap<String, Script>,
    counters: Counters,
    log: Mutex<Vec<(String, Vec<RowValues>)>>,
}

impl MemoryExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` with a single result set.
    #[must_use]
    pub fn with_rows(self, sql: impl Into<String>, rows: ResultSet) -> Self {
        self.with_result_sets(sql, vec![rows])
    }

    /// Answer `sql` with consecutive result sets, as a stored procedure would.
    #[must_use]
    pub fn with_result_sets(mut self, sql: impl Into<String>, sets: Vec<ResultSet>) -> Self {
        self.scripts.entry(sql.into()).or_default().sets = sets;
        self
    }

    /// Answer `sql` executed for side effects.
    #[must_use]
    pub fn with_outcome(mut self, sql: impl Into<String>, outcome: ExecOutcome) -> Self {
        self.scripts.entry(sql.into()).or_default().outcome = outcome;
        self
    }

    /// Make `sql` fail at `point`.
    #[must_use]
    pub fn with_failure(mut self, sql: impl Into<String>, point: FailurePoint) -> Self {
        self.scripts.entry(sql.into()).or_default().failure = Some(point);
        self
    }

    /// Statements prepared and not yet dropped.
    #[must_use]
    pub fn open_statements(&self) -> usize {
        self.counters.open_statements.load(Ordering::SeqCst)
    }

    /// Cursors opened and not yet dropped.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.counters.open_cursors.load(Ordering::SeqCst)
    }

    /// Statements prepared over the executor's lifetime.
    #[must_use]
    pub fn prepared_count(&self) -> usize {
        self.counters.prepared.load(Ordering::SeqCst)
    }

    /// Every SQL text run so far with its arguments, oldest first.
    #[must_use]
    pub fn executed(&self) -> Vec<(String, Vec<RowValues>)> {
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, sql: &str, args: &[RowValues]) {
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((sql.to_string(), args.to_vec()));
    }
}

impl Executor for MemoryExecutor {
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedStatement + 'c>> {
        let script = self.scripts.get(sql).ok_or_else(|| {
            SqlMapperError::ExecutionError(format!("no scripted response for query: {sql}"))
        })?;
        if script.failure == Some(FailurePoint::Prepare) {
            return Err(SqlMapperError::ExecutionError(format!(
                "prepare failed for query: {sql}"
            )));
        }
        self.counters.prepared.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStatement {
            owner: self,
            sql: sql.to_string(),
            script,
            _open: OpenGuard::acquire(&self.counters.open_statements),
        }))
    }
}

struct MemoryStatement<'c> {
    owner: &'c MemoryExecutor,
    sql: String,
    script: &'c Script,
    _open: OpenGuard<'c>,
}

impl MemoryStatement<'_> {
    fn start(&self, args: &[RowValues]) -> Result<()> {
        self.owner.record(&self.sql, args);
        if self.script.failure == Some(FailurePoint::Execute) {
            return Err(SqlMapperError::ExecutionError(format!(
                "execute failed for query: {}",
                self.sql
            )));
        }
        Ok(())
    }
}

impl PreparedStatement for MemoryStatement<'_> {
    fn query<'s>(&'s mut self, args: &[RowValues]) -> Result<Box<dyn RowCursor + 's>> {
        self.start(args)?;
        let fail_after = match self.script.failure {
            Some(FailurePoint::Fetch { after_rows }) => Some(after_rows),
            _ => None,
        };
        Ok(Box::new(MemoryCursor {
            inner: BufferedCursor::new(self.script.sets.clone()),
            fail_after,
            fetched: 0,
            _open: OpenGuard::acquire(&self.owner.counters.open_cursors),
        }))
    }

    fn execute(&mut self, args: &[RowValues]) -> Result<ExecOutcome> {
        self.start(args)?;
        Ok(self.script.outcome)
    }
}

struct MemoryCursor<'s> {
    inner: BufferedCursor,
    fail_after: Option<usize>,
    fetched: usize,
    _open: OpenGuard<'s>,
}

impl RowCursor for MemoryCursor<'_> {
    fn columns(&self) -> Arc<Vec<String>> {
        self.inner.columns()
    }

    fn next_row(&mut self) -> Result<bool> {
        if self.fail_after.is_some_and(|limit| self.fetched >= limit) {
            return Err(SqlMapperError::ExecutionError(format!(
                "row fetch failed after {} rows",
                self.fetched
            )));
        }
        let more = self.inner.next_row()?;
        if more {
            self.fetched += 1;
        }
        Ok(more)
    }

    fn scan(&mut self, targets: &mut [ScanTarget]) -> Result<()> {
        self.inner.scan(targets)
    }

    fn next_result_set(&mut self) -> Result<bool> {
        self.inner.next_result_set()
    }
}
