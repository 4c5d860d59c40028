use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::{Result, SqlMapperError};
use crate::scan::ScanTarget;
use crate::types::{FieldKind, RowValues};

/// A type that can be the destination of one column.
///
/// The null-safe kinds (`String`, integers, floats, `bool`) turn SQL NULL into their zero
/// value. Types with [`FieldKind::Custom`] are handed the raw driver value and decide on their
/// own what NULL means; wrap them in `Option` to accept NULL as `None`.
pub trait ColumnValue: Sized {
    const KIND: FieldKind;

    /// Convert the scanned column into the field value.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` or `UnsignedUnderflow` when the value does not fit.
    fn from_scan(target: &ScanTarget) -> Result<Self>;
}

impl ColumnValue for String {
    const KIND: FieldKind = FieldKind::String;

    fn from_scan(target: &ScanTarget) -> Result<Self> {
        Ok(target.text_value()?.map(str::to_owned).unwrap_or_default())
    }
}

macro_rules! signed_column {
    ($($t:ty),*) => {$(
        impl ColumnValue for $t {
            const KIND: FieldKind = FieldKind::Signed;

            fn from_scan(target: &ScanTarget) -> Result<Self> {
                let value = target.int_value()?.unwrap_or(0);
                <$t>::try_from(value).map_err(|_| {
                    SqlMapperError::ColumnMismatch(format!(
                        "value {value} out of range for {}",
                        stringify!($t)
                    ))
                })
            }
        }
    )*};
}

macro_rules! unsigned_column {
    ($($t:ty),*) => {$(
        impl ColumnValue for $t {
            const KIND: FieldKind = FieldKind::Unsigned;

            fn from_scan(target: &ScanTarget) -> Result<Self> {
                let value = target.int_value()?.unwrap_or(0);
                if value < 0 {
                    return Err(SqlMapperError::UnsignedUnderflow {
                        value,
                        type_name: stringify!($t),
                    });
                }
                <$t>::try_from(value).map_err(|_| {
                    SqlMapperError::ColumnMismatch(format!(
                        "value {value} out of range for {}",
                        stringify!($t)
                    ))
                })
            }
        }
    )*};
}

signed_column!(i8, i16, i32, i64, isize);
unsigned_column!(u8, u16, u32, u64, usize);

impl ColumnValue for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn from_scan(target: &ScanTarget) -> Result<Self> {
        Ok(target.float_value()?.unwrap_or(0.0))
    }
}

impl ColumnValue for f32 {
    const KIND: FieldKind = FieldKind::Float;

    #[allow(clippy::cast_possible_truncation)]
    fn from_scan(target: &ScanTarget) -> Result<Self> {
        Ok(target.float_value()?.unwrap_or(0.0) as f32)
    }
}

impl ColumnValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn from_scan(target: &ScanTarget) -> Result<Self> {
        Ok(target.bool_value()?.unwrap_or(false))
    }
}

impl ColumnValue for NaiveDateTime {
    const KIND: FieldKind = FieldKind::Custom;

    fn from_scan(target: &ScanTarget) -> Result<Self> {
        let raw = target.raw_value()?;
        raw.as_timestamp().ok_or_else(|| {
            SqlMapperError::ColumnMismatch(format!(
                "cannot scan {} value into a timestamp",
                raw.type_name()
            ))
        })
    }
}

impl ColumnValue for Vec<u8> {
    const KIND: FieldKind = FieldKind::Custom;

    fn from_scan(target: &ScanTarget) -> Result<Self> {
        match target.raw_value()? {
            RowValues::Null => Ok(Vec::new()),
            RowValues::Blob(bytes) => Ok(bytes.clone()),
            RowValues::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(SqlMapperError::ColumnMismatch(format!(
                "cannot scan {} value into bytes",
                other.type_name()
            ))),
        }
    }
}

impl ColumnValue for JsonValue {
    const KIND: FieldKind = FieldKind::Custom;

    fn from_scan(target: &ScanTarget) -> Result<Self> {
        match target.raw_value()? {
            RowValues::JSON(v) => Ok(v.clone()),
            RowValues::Text(s) => Ok(serde_json::from_str(s)?),
            RowValues::Blob(b) => Ok(serde_json::from_slice(b)?),
            other => Ok(serde_json::to_value(other)?),
        }
    }
}

impl ColumnValue for RowValues {
    const KIND: FieldKind = FieldKind::Custom;

    fn from_scan(target: &ScanTarget) -> Result<Self> {
        Ok(target.raw_value()?.clone())
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn from_scan(target: &ScanTarget) -> Result<Self> {
        if target.is_null() {
            Ok(None)
        } else {
            T::from_scan(target).map(Some)
        }
    }
}
