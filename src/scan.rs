//! Null-safe scan targets.
//!
//! A [`ScanTarget`] is the transient per-column holder a cursor writes each row into. The
//! null-safe kinds (text, integer, float, bool) record "NULL or a value of that kind" and are
//! turned into the destination field by [`ColumnValue`](crate::ColumnValue), which applies the
//! NULL-to-zero policy. [`ScanTarget::Raw`] keeps the driver value untouched: destination types
//! with [`FieldKind::Custom`] receive it as-is and decide for themselves what NULL means.

use chrono::NaiveDateTime;

use crate::error::{Result, SqlMapperError};
use crate::types::{FieldKind, RowValues};

/// Per-column scan target, allocated once per query and overwritten on every row.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanTarget {
    Text(Option<String>),
    Int(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    /// Raw driver value, no NULL handling.
    Raw(RowValues),
    /// Consumes a column that nothing is mapped to.
    Discard,
}

impl ScanTarget {
    /// Pick the intermediate target for a destination field kind.
    #[must_use]
    pub fn for_kind(kind: FieldKind) -> Self {
        match kind {
            FieldKind::String => ScanTarget::Text(None),
            FieldKind::Signed | FieldKind::Unsigned => ScanTarget::Int(None),
            FieldKind::Float => ScanTarget::Float(None),
            FieldKind::Bool => ScanTarget::Bool(None),
            FieldKind::Custom => ScanTarget::Raw(RowValues::Null),
        }
    }

    /// True when the last scanned value was SQL NULL. A discard target is never null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            ScanTarget::Text(v) => v.is_none(),
            ScanTarget::Int(v) => v.is_none(),
            ScanTarget::Float(v) => v.is_none(),
            ScanTarget::Bool(v) => v.is_none(),
            ScanTarget::Raw(v) => v.is_null(),
            ScanTarget::Discard => false,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ScanTarget::Text(_) => "nullable string",
            ScanTarget::Int(_) => "nullable int64",
            ScanTarget::Float(_) => "nullable float64",
            ScanTarget::Bool(_) => "nullable bool",
            ScanTarget::Raw(_) => "raw value",
            ScanTarget::Discard => "discard",
        }
    }

    fn mismatch(&self, wanted: &str) -> SqlMapperError {
        SqlMapperError::ColumnMismatch(format!("cannot convert {} to {wanted}", self.label()))
    }

    /// Text payload of a string target.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if this is not a string target.
    pub fn text_value(&self) -> Result<Option<&str>> {
        match self {
            ScanTarget::Text(v) => Ok(v.as_deref()),
            other => Err(other.mismatch("string")),
        }
    }

    /// Integer payload of an integer target.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if this is not an integer target.
    pub fn int_value(&self) -> Result<Option<i64>> {
        match self {
            ScanTarget::Int(v) => Ok(*v),
            other => Err(other.mismatch("integer")),
        }
    }

    /// Float payload of a float target.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if this is not a float target.
    pub fn float_value(&self) -> Result<Option<f64>> {
        match self {
            ScanTarget::Float(v) => Ok(*v),
            other => Err(other.mismatch("float")),
        }
    }

    /// Bool payload of a bool target.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if this is not a bool target.
    pub fn bool_value(&self) -> Result<Option<bool>> {
        match self {
            ScanTarget::Bool(v) => Ok(*v),
            other => Err(other.mismatch("bool")),
        }
    }

    /// Driver value of a raw target.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if this is not a raw target.
    pub fn raw_value(&self) -> Result<&RowValues> {
        match self {
            ScanTarget::Raw(v) => Ok(v),
            other => Err(other.mismatch("raw value")),
        }
    }

    /// Re-express whatever was scanned as a driver value; discard targets read as NULL.
    #[must_use]
    pub fn to_row_value(&self) -> RowValues {
        match self {
            ScanTarget::Text(v) => v.clone().map_or(RowValues::Null, RowValues::Text),
            ScanTarget::Int(v) => v.map_or(RowValues::Null, RowValues::Int),
            ScanTarget::Float(v) => v.map_or(RowValues::Null, RowValues::Float),
            ScanTarget::Bool(v) => v.map_or(RowValues::Null, RowValues::Bool),
            ScanTarget::Raw(v) => v.clone(),
            ScanTarget::Discard => RowValues::Null,
        }
    }

    /// Overwrite this target with one driver value, converting it to the target's kind.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` when the value cannot be represented in the target kind.
    pub fn assign(&mut self, value: &RowValues) -> Result<()> {
        match self {
            ScanTarget::Text(slot) => *slot = text_from(value)?,
            ScanTarget::Int(slot) => *slot = int_from(value)?,
            ScanTarget::Float(slot) => *slot = float_from(value)?,
            ScanTarget::Bool(slot) => *slot = bool_from(value)?,
            ScanTarget::Raw(slot) => slot.clone_from(value),
            ScanTarget::Discard => {}
        }
        Ok(())
    }
}

/// Assign one row of driver values to the scan targets, position by position.
///
/// Cursor implementations call this from [`RowCursor::scan`](crate::executor::RowCursor::scan).
///
/// # Errors
/// Returns `ColumnMismatch` if the target count differs from the column count or a value
/// cannot be converted.
pub fn scan_values(values: &[RowValues], targets: &mut [ScanTarget]) -> Result<()> {
    if values.len() != targets.len() {
        return Err(SqlMapperError::ColumnMismatch(format!(
            "expected {} destination arguments in scan, not {}",
            values.len(),
            targets.len()
        )));
    }
    for (index, (value, target)) in values.iter().zip(targets.iter_mut()).enumerate() {
        target.assign(value).map_err(|e| match e {
            SqlMapperError::ColumnMismatch(msg) => {
                SqlMapperError::ColumnMismatch(format!("scan error on column index {index}: {msg}"))
            }
            other => other,
        })?;
    }
    Ok(())
}

fn conversion_error(value: &RowValues, wanted: &str) -> SqlMapperError {
    SqlMapperError::ColumnMismatch(format!(
        "converting driver value of type {} to {wanted}",
        value.type_name()
    ))
}

fn utf8(bytes: &[u8], value: &RowValues, wanted: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| conversion_error(value, wanted))
}

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

fn text_from(value: &RowValues) -> Result<Option<String>> {
    Ok(Some(match value {
        RowValues::Null => return Ok(None),
        RowValues::Text(s) => s.clone(),
        RowValues::Int(i) => i.to_string(),
        RowValues::Float(f) => f.to_string(),
        RowValues::Bool(b) => b.to_string(),
        RowValues::Timestamp(ts) => format_timestamp(ts),
        RowValues::JSON(j) => j.to_string(),
        RowValues::Blob(b) => utf8(b, value, "string")?,
    }))
}

fn parse_int(text: &str, value: &RowValues) -> Result<i64> {
    text.trim().parse::<i64>().map_err(|_| {
        SqlMapperError::ColumnMismatch(format!(
            "converting driver value of type {} ({text:?}) to int64: invalid syntax",
            value.type_name()
        ))
    })
}

fn int_from(value: &RowValues) -> Result<Option<i64>> {
    Ok(Some(match value {
        RowValues::Null => return Ok(None),
        RowValues::Int(i) => *i,
        RowValues::Bool(b) => i64::from(*b),
        RowValues::Text(s) => parse_int(s, value)?,
        RowValues::Blob(b) => parse_int(&utf8(b, value, "int64")?, value)?,
        #[allow(clippy::cast_possible_truncation)]
        RowValues::Float(f)
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
        {
            *f as i64
        }
        RowValues::JSON(j) => j.as_i64().ok_or_else(|| conversion_error(value, "int64"))?,
        _ => return Err(conversion_error(value, "int64")),
    }))
}

fn parse_float(text: &str, value: &RowValues) -> Result<f64> {
    text.trim().parse::<f64>().map_err(|_| {
        SqlMapperError::ColumnMismatch(format!(
            "converting driver value of type {} ({text:?}) to float64: invalid syntax",
            value.type_name()
        ))
    })
}

fn float_from(value: &RowValues) -> Result<Option<f64>> {
    Ok(Some(match value {
        RowValues::Null => return Ok(None),
        RowValues::Float(f) => *f,
        #[allow(clippy::cast_precision_loss)]
        RowValues::Int(i) => *i as f64,
        RowValues::Text(s) => parse_float(s, value)?,
        RowValues::Blob(b) => parse_float(&utf8(b, value, "float64")?, value)?,
        RowValues::JSON(j) => j.as_f64().ok_or_else(|| conversion_error(value, "float64"))?,
        _ => return Err(conversion_error(value, "float64")),
    }))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn bool_from(value: &RowValues) -> Result<Option<bool>> {
    let parsed = match value {
        RowValues::Null => return Ok(None),
        RowValues::Bool(b) => Some(*b),
        RowValues::Int(0) => Some(false),
        RowValues::Int(1) => Some(true),
        RowValues::Text(s) => parse_bool(s),
        RowValues::Blob(b) => std::str::from_utf8(b).ok().and_then(parse_bool),
        RowValues::JSON(j) => j.as_bool(),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| conversion_error(value, "bool"))
}
