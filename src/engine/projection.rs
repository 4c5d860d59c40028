use std::collections::BTreeMap;

use crate::error::Result;
use crate::executor::RowCursor;
use crate::scan::ScanTarget;
use crate::types::RowValues;

use super::Engine;

/// Output shape of a JSON projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonShape {
    /// The first row as an object; an array (empty) when there is no row.
    One,
    /// An array of row objects.
    #[default]
    List,
}

impl Engine {
    /// Serialize the current result set as JSON, keyed by raw column names.
    ///
    /// Values pass through as the driver reported them: blobs become byte arrays, timestamps
    /// ISO-8601 strings, NULL `null`. No record mapping is involved.
    ///
    /// # Errors
    /// Returns cursor errors or a `SerializationError`.
    pub fn project_json(&self, cursor: &mut dyn RowCursor, shape: JsonShape) -> Result<Vec<u8>> {
        let columns = cursor.columns();
        let mut targets = vec![ScanTarget::Raw(RowValues::Null); columns.len()];
        let mut rows: Vec<BTreeMap<&str, RowValues>> = Vec::new();

        while cursor.next_row()? {
            cursor.scan(&mut targets)?;
            let row: BTreeMap<&str, RowValues> = columns
                .iter()
                .map(String::as_str)
                .zip(targets.iter().map(ScanTarget::to_row_value))
                .collect();
            if shape == JsonShape::One {
                return Ok(serde_json::to_vec(&row)?);
            }
            rows.push(row);
        }
        Ok(serde_json::to_vec(&rows)?)
    }
}
