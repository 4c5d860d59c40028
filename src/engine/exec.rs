use std::collections::HashMap;

use crate::error::Result;
use crate::executor::{ExecOutcome, Executor, QueryText, RowCursor};
use crate::mapping::{ColumnValue, Record};
use crate::types::RowValues;

use super::{
    Engine, JsonShape, MapKey, MapValue, ResultTarget, SqlElement, require_targets,
};

impl Engine {
    /// Render, trace, prepare and query; run `op` on the cursor; release cursor then
    /// statement whatever `op` returned.
    fn with_cursor<T>(
        &self,
        executor: &dyn Executor,
        query: QueryText<'_>,
        args: &[RowValues],
        op: impl FnOnce(&mut dyn RowCursor) -> Result<T>,
    ) -> Result<T> {
        let sql = query.render(args.len());
        self.trace_query(&sql, args);
        let mut statement = executor.prepare(&sql)?;
        let mut cursor = statement.query(args)?;
        let out = op(cursor.as_mut());
        drop(cursor);
        drop(statement);
        out
    }

    fn run_statement(
        &self,
        executor: &dyn Executor,
        query: QueryText<'_>,
        args: &[RowValues],
    ) -> Result<ExecOutcome> {
        let sql = query.render(args.len());
        self.trace_query(&sql, args);
        let mut statement = executor.prepare(&sql)?;
        let outcome = statement.execute(args);
        drop(statement);
        outcome
    }

    /// All rows as records.
    ///
    /// # Errors
    /// Returns driver and conversion errors.
    pub fn find<'q, R: Record>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
    ) -> Result<Vec<R>> {
        self.with_cursor(executor, query.into(), args, |c| self.materialize_many(c))
    }

    /// All rows as records, replacing `dest` only on success.
    ///
    /// # Errors
    /// Returns driver and conversion errors; `dest` is untouched then.
    pub fn find_into<'q, R: Record>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        dest: &mut Vec<R>,
    ) -> Result<()> {
        *dest = self.find(executor, query, args)?;
        Ok(())
    }

    /// First row into `dest`; `false` and `dest` untouched when there is no row.
    ///
    /// # Errors
    /// Returns driver and conversion errors.
    pub fn first<'q, R: Record>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        dest: &mut R,
    ) -> Result<bool> {
        self.with_cursor(executor, query.into(), args, |c| {
            self.materialize_one(c, dest)
        })
    }

    /// Single column of the first row into a primitive.
    ///
    /// # Errors
    /// See [`Engine::materialize_scalar`].
    pub fn first_col<'q, T: ColumnValue>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        dest: &mut T,
    ) -> Result<bool> {
        self.with_cursor(executor, query.into(), args, |c| {
            self.materialize_scalar(c, dest)
        })
    }

    /// Single column of the first row as `i64` or `String`.
    ///
    /// # Errors
    /// See [`Engine::scalar_any`].
    pub fn first_col_any<'q, T: SqlElement>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
    ) -> Result<Option<T>> {
        self.with_cursor(executor, query.into(), args, |c| self.scalar_any(c))
    }

    /// Non-NULL values of one named column.
    ///
    /// # Errors
    /// See [`Engine::column_array`].
    pub fn find_array<'q, T: SqlElement>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        field: &str,
    ) -> Result<Option<Vec<T>>> {
        self.with_cursor(executor, query.into(), args, |c| {
            self.column_array(c, field)
        })
    }

    /// Rows keyed by one column.
    ///
    /// # Errors
    /// See [`Engine::column_map`].
    pub fn find_map<'q, K: MapKey, V: MapValue>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        key_field: &str,
        value_field: &str,
    ) -> Result<Option<HashMap<K, V>>> {
        self.with_cursor(executor, query.into(), args, |c| {
            self.column_map(c, key_field, value_field)
        })
    }

    /// Consecutive result sets into `targets`.
    ///
    /// # Errors
    /// See [`Engine::dispatch`]. The empty-target check happens before anything runs.
    pub fn find_multiple<'q>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        targets: &mut [ResultTarget<'_>],
    ) -> Result<()> {
        require_targets(targets)?;
        self.with_cursor(executor, query.into(), args, |c| self.dispatch(c, targets))
    }

    /// Execute for side effects; `true` when at least one row was affected.
    ///
    /// # Errors
    /// Returns driver errors.
    pub fn exec<'q>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
    ) -> Result<bool> {
        Ok(self.run_statement(executor, query.into(), args)?.rows_affected > 0)
    }

    /// Execute an insert and return the generated id.
    ///
    /// # Errors
    /// Returns driver errors.
    pub fn exec_last_id<'q>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
    ) -> Result<i64> {
        Ok(self.run_statement(executor, query.into(), args)?.last_insert_id)
    }

    /// Query and serialize the rows as JSON.
    ///
    /// # Errors
    /// See [`Engine::project_json`].
    pub fn exec_json<'q>(
        &self,
        executor: &dyn Executor,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        shape: JsonShape,
    ) -> Result<Vec<u8>> {
        self.with_cursor(executor, query.into(), args, |c| self.project_json(c, shape))
    }
}
