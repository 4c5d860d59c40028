use crate::error::{Result, SqlMapperError};
use crate::executor::RowCursor;
use crate::mapping::{ColumnValue, FieldMap, Record};
use crate::scan::ScanTarget;
use crate::types::{FieldKind, RowValues};

use super::Engine;

/// Scan targets for one query, built once from the column list and overwritten on every row.
pub(crate) struct ScanPlan {
    targets: Vec<ScanTarget>,
    bindings: Vec<Option<usize>>,
}

impl ScanPlan {
    /// Columns without a matching field are still consumed through a discard target so
    /// positions stay aligned.
    pub(crate) fn new(columns: &[String], map: &FieldMap) -> Self {
        let (targets, bindings) = columns
            .iter()
            .map(|column| match map.get(column) {
                Some(slot) => (ScanTarget::for_kind(slot.kind), Some(slot.ordinal)),
                None => (ScanTarget::Discard, None),
            })
            .unzip();
        Self { targets, bindings }
    }

    /// Read column `index` as a raw value if no field claimed it.
    pub(crate) fn ensure_readable(&mut self, index: usize) {
        if matches!(self.targets.get(index), Some(ScanTarget::Discard)) {
            self.targets[index] = ScanTarget::Raw(RowValues::Null);
        }
    }

    pub(crate) fn scan_row(&mut self, cursor: &mut dyn RowCursor) -> Result<()> {
        cursor.scan(&mut self.targets)
    }

    pub(crate) fn target(&self, index: usize) -> Option<&ScanTarget> {
        self.targets.get(index)
    }

    pub(crate) fn apply<R: Record>(&self, dest: &mut R) -> Result<()> {
        for (target, binding) in self.targets.iter().zip(&self.bindings) {
            if let Some(ordinal) = binding {
                dest.set_field(*ordinal, target)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn build_record<R: Record>(plan: &ScanPlan) -> Result<R> {
    let mut record = R::default();
    plan.apply(&mut record)?;
    Ok(record)
}

pub(crate) fn require_single_column(cursor: &dyn RowCursor) -> Result<()> {
    let count = cursor.columns().len();
    if count == 1 {
        Ok(())
    } else {
        Err(SqlMapperError::ColumnMismatch(format!(
            "expected exactly one column, query returned {count}"
        )))
    }
}

impl Engine {
    pub(crate) fn plan_for<R: Record>(&self, cursor: &dyn RowCursor) -> ScanPlan {
        let map = self.cache.mapping_for::<R>();
        ScanPlan::new(&cursor.columns(), &map)
    }

    /// Every remaining row of the current result set, one record per row.
    ///
    /// Rows are collected locally; on error nothing is returned.
    ///
    /// # Errors
    /// Returns cursor errors and field conversion errors.
    pub fn materialize_many<R: Record>(&self, cursor: &mut dyn RowCursor) -> Result<Vec<R>> {
        let mut plan = self.plan_for::<R>(cursor);
        let mut out = Vec::new();
        while cursor.next_row()? {
            plan.scan_row(cursor)?;
            out.push(build_record::<R>(&plan)?);
        }
        Ok(out)
    }

    /// Fetch one row into `dest`. With no row, `dest` is left exactly as it was and `false`
    /// is returned.
    ///
    /// # Errors
    /// Returns cursor errors and field conversion errors.
    pub fn materialize_one<R: Record>(
        &self,
        cursor: &mut dyn RowCursor,
        dest: &mut R,
    ) -> Result<bool> {
        let mut plan = self.plan_for::<R>(cursor);
        if !cursor.next_row()? {
            return Ok(false);
        }
        plan.scan_row(cursor)?;
        plan.apply(dest)?;
        Ok(true)
    }

    /// Fetch the single column of the first row into a primitive.
    ///
    /// Strings, integers of any width and floats are accepted; NULL becomes the zero value.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` unless the result has exactly one column, and
    /// `UnsupportedKind` for bool and custom destinations.
    pub fn materialize_scalar<T: ColumnValue>(
        &self,
        cursor: &mut dyn RowCursor,
        dest: &mut T,
    ) -> Result<bool> {
        require_single_column(cursor)?;
        if matches!(T::KIND, FieldKind::Bool | FieldKind::Custom) {
            return Err(SqlMapperError::UnsupportedKind(format!(
                "{} ({})",
                T::KIND,
                std::any::type_name::<T>()
            )));
        }
        let mut targets = [ScanTarget::for_kind(T::KIND)];
        if !cursor.next_row()? {
            return Ok(false);
        }
        cursor.scan(&mut targets)?;
        *dest = T::from_scan(&targets[0])?;
        Ok(true)
    }
}
