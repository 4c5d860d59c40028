use crate::error::{Result, SqlMapperError};
use crate::executor::RowCursor;
use crate::mapping::Record;

use super::Engine;

trait FillResultSet: Send {
    fn fill(&mut self, engine: &Engine, cursor: &mut dyn RowCursor) -> Result<()>;
}

struct Many<'a, R>(&'a mut Vec<R>);
struct One<'a, R>(&'a mut R);

impl<R: Record + Send> FillResultSet for Many<'_, R> {
    fn fill(&mut self, engine: &Engine, cursor: &mut dyn RowCursor) -> Result<()> {
        *self.0 = engine.materialize_many(cursor)?;
        Ok(())
    }
}

impl<R: Record + Send> FillResultSet for One<'_, R> {
    fn fill(&mut self, engine: &Engine, cursor: &mut dyn RowCursor) -> Result<()> {
        engine.materialize_one(cursor, self.0)?;
        Ok(())
    }
}

/// One destination in a multi-result-set call: a list of records or a single record.
///
/// Targets are `Send`, so async multi-result-set calls can run on any runtime thread.
pub struct ResultTarget<'a> {
    inner: Box<dyn FillResultSet + 'a>,
}

impl<'a> ResultTarget<'a> {
    /// Replace `dest` with every row of the matching result set.
    pub fn many<R: Record + Send>(dest: &'a mut Vec<R>) -> Self {
        Self {
            inner: Box::new(Many(dest)),
        }
    }

    /// Fill `dest` from the first row of the matching result set, if it has one.
    pub fn one<R: Record + Send>(dest: &'a mut R) -> Self {
        Self {
            inner: Box::new(One(dest)),
        }
    }
}

impl std::fmt::Debug for ResultTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResultTarget")
    }
}

pub(crate) fn require_targets(targets: &[ResultTarget<'_>]) -> Result<()> {
    if targets.is_empty() {
        return Err(SqlMapperError::ShapeError(
            "at least one result destination is required".into(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Route consecutive result sets into `targets` in order.
    ///
    /// Targets beyond the last result set are left untouched. More result sets than targets
    /// is an error; result sets already routed keep their contents.
    ///
    /// # Errors
    /// Returns `ShapeError` for an empty target list, `TooManyResultSets` when the cursor
    /// yields more sets than there are targets, and any materialization error.
    pub fn dispatch(
        &self,
        cursor: &mut dyn RowCursor,
        targets: &mut [ResultTarget<'_>],
    ) -> Result<()> {
        require_targets(targets)?;
        let expected = targets.len();
        let mut index = 0;
        loop {
            let Some(target) = targets.get_mut(index) else {
                tracing::debug!(expected, "procedure returned more result sets than destinations");
                return Err(SqlMapperError::TooManyResultSets(expected));
            };
            target.inner.fill(self, cursor)?;
            if !cursor.next_result_set()? {
                return Ok(());
            }
            index += 1;
        }
    }
}
