use std::sync::Arc;

use super::RowCursor;
use crate::error::{Result, SqlMapperError};
use crate::results::ResultSet;
use crate::scan::{ScanTarget, scan_values};
use crate::types::RowValues;

/// A cursor over result sets that were already fetched.
///
/// The async client drains the live driver cursor into one of these on the blocking pool and
/// runs the engine over it afterwards.
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    sets: Vec<ResultSet>,
    set: usize,
    row: Option<usize>,
}

impl BufferedCursor {
    #[must_use]
    pub fn new(sets: Vec<ResultSet>) -> Self {
        Self {
            sets,
            set: 0,
            row: None,
        }
    }

    /// Copy every remaining row of every remaining result set out of `cursor`.
    ///
    /// # Errors
    /// Returns whatever the source cursor reports while iterating.
    pub fn drain(cursor: &mut dyn RowCursor) -> Result<Self> {
        let mut sets = Vec::new();
        loop {
            let columns = cursor.columns();
            let mut targets = vec![ScanTarget::Raw(RowValues::Null); columns.len()];
            let mut rs = ResultSet::with_capacity(10);
            rs.set_column_names(columns);
            while cursor.next_row()? {
                cursor.scan(&mut targets)?;
                rs.add_row_values(targets.iter().map(ScanTarget::to_row_value).collect());
            }
            sets.push(rs);
            if !cursor.next_result_set()? {
                break;
            }
        }
        Ok(Self::new(sets))
    }

    #[must_use]
    pub fn into_result_sets(self) -> Vec<ResultSet> {
        self.sets
    }
}

impl RowCursor for BufferedCursor {
    fn columns(&self) -> Arc<Vec<String>> {
        self.sets
            .get(self.set)
            .and_then(ResultSet::get_column_names)
            .map_or_else(|| Arc::new(Vec::new()), Arc::clone)
    }

    fn next_row(&mut self) -> Result<bool> {
        let Some(rs) = self.sets.get(self.set) else {
            return Ok(false);
        };
        let next = self.row.map_or(0, |r| r + 1);
        if next < rs.results.len() {
            self.row = Some(next);
            Ok(true)
        } else {
            self.row = Some(rs.results.len());
            Ok(false)
        }
    }

    fn scan(&mut self, targets: &mut [ScanTarget]) -> Result<()> {
        let row = self
            .row
            .and_then(|r| self.sets.get(self.set)?.results.get(r))
            .ok_or_else(|| {
                SqlMapperError::ExecutionError("scan called without a current row".into())
            })?;
        scan_values(&row.rows, targets)
    }

    fn next_result_set(&mut self) -> Result<bool> {
        if self.set + 1 < self.sets.len() {
            self.set += 1;
            self.row = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
