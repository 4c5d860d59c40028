use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::{Result, SqlMapperError};
use crate::executor::RowCursor;
use crate::mapping::{FieldMap, Record, TypeMappingCache};
use crate::scan::{ScanTarget, format_timestamp};
use crate::types::{FieldKind, RowValues};

use super::materialize::{ScanPlan, build_record, require_single_column};
use super::{CoercionPolicy, Engine};

mod sealed {
    pub trait Sealed {}
    impl Sealed for i64 {}
    impl Sealed for String {}
}

/// Result of coercing a driver value into an element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coerced<T> {
    Null,
    Value(T),
    /// Present but not representable as `T`.
    Invalid,
}

/// Element types for generic scalar, array and map retrieval: `i64` and `String` only.
pub trait SqlElement: sealed::Sealed + Default + Sized + 'static {
    const KIND: FieldKind;

    /// Value of a target scanned with [`ScanTarget::for_kind`]`(Self::KIND)`; `None` for NULL.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if the target has the wrong kind.
    fn from_target(target: &ScanTarget) -> Result<Option<Self>>;

    /// Best-effort conversion of a raw driver value, parsing text where needed.
    fn coerce(value: &RowValues) -> Coerced<Self>;
}

impl SqlElement for i64 {
    const KIND: FieldKind = FieldKind::Signed;

    fn from_target(target: &ScanTarget) -> Result<Option<Self>> {
        target.int_value()
    }

    fn coerce(value: &RowValues) -> Coerced<Self> {
        let parsed = match value {
            RowValues::Null => return Coerced::Null,
            RowValues::Int(i) => Some(*i),
            RowValues::Bool(b) => Some(i64::from(*b)),
            RowValues::Text(s) => s.trim().parse().ok(),
            RowValues::Blob(b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.trim().parse().ok()),
            #[allow(clippy::cast_possible_truncation)]
            RowValues::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            RowValues::JSON(j) => j.as_i64(),
            _ => None,
        };
        parsed.map_or(Coerced::Invalid, Coerced::Value)
    }
}

impl SqlElement for String {
    const KIND: FieldKind = FieldKind::String;

    fn from_target(target: &ScanTarget) -> Result<Option<Self>> {
        Ok(target.text_value()?.map(str::to_owned))
    }

    fn coerce(value: &RowValues) -> Coerced<Self> {
        match value {
            RowValues::Null => Coerced::Null,
            RowValues::Text(s) => Coerced::Value(s.clone()),
            RowValues::Int(i) => Coerced::Value(i.to_string()),
            RowValues::Float(f) => Coerced::Value(f.to_string()),
            RowValues::Bool(b) => Coerced::Value(b.to_string()),
            RowValues::Timestamp(ts) => Coerced::Value(format_timestamp(ts)),
            RowValues::JSON(j) => Coerced::Value(j.to_string()),
            RowValues::Blob(b) => {
                String::from_utf8(b.clone()).map_or(Coerced::Invalid, Coerced::Value)
            }
        }
    }
}

/// Map key types.
pub trait MapKey: SqlElement + Eq + Hash {}

impl MapKey for i64 {}
impl MapKey for String {}

/// Map value types: a scalar read from one named column, or a whole record.
pub trait MapValue: Default + Sized + 'static {
    fn map_strategy() -> MapStrategy<Self>;
}

impl MapValue for i64 {
    fn map_strategy() -> MapStrategy<Self> {
        MapStrategy::scalar()
    }
}

impl MapValue for String {
    fn map_strategy() -> MapStrategy<Self> {
        MapStrategy::scalar()
    }
}

/// How a map value is produced from a row.
pub struct MapStrategy<V> {
    mode: Mode<V>,
}

enum Mode<V> {
    Scalar(fn(&RowValues) -> Coerced<V>),
    Record {
        mapping: fn(&TypeMappingCache) -> Arc<FieldMap>,
        build: fn(&ScanPlan) -> Result<V>,
    },
}

impl<V: SqlElement> MapStrategy<V> {
    /// Read the value from the named value column.
    #[must_use]
    pub fn scalar() -> Self {
        Self {
            mode: Mode::Scalar(V::coerce),
        }
    }
}

impl<V: Record> MapStrategy<V> {
    /// Build the value from the whole row through the record's column tags.
    #[must_use]
    pub fn record() -> Self {
        Self {
            mode: Mode::Record {
                mapping: TypeMappingCache::mapping_for::<V>,
                build: build_record::<V>,
            },
        }
    }
}

impl<V> std::fmt::Debug for MapStrategy<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.mode {
            Mode::Scalar(_) => "scalar",
            Mode::Record { .. } => "record",
        };
        f.debug_struct("MapStrategy").field("mode", &mode).finish()
    }
}

fn column_position(columns: &[String], field: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == field)
        .ok_or_else(|| SqlMapperError::MissingField(field.to_string()))
}

impl Engine {
    /// First column of the first row as `T`.
    ///
    /// `None` means no row; a NULL in the row gives `Some` of the zero value.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` unless the result has exactly one column or the value does not
    /// convert.
    pub fn scalar_any<T: SqlElement>(&self, cursor: &mut dyn RowCursor) -> Result<Option<T>> {
        require_single_column(cursor)?;
        let mut targets = [ScanTarget::for_kind(T::KIND)];
        if !cursor.next_row()? {
            return Ok(None);
        }
        cursor.scan(&mut targets)?;
        Ok(Some(T::from_target(&targets[0])?.unwrap_or_default()))
    }

    /// Every non-NULL value of column `field`.
    ///
    /// NULLs are dropped rather than turned into zero values. `None` is returned when nothing
    /// is left, whether the query had no rows or only NULLs.
    ///
    /// # Errors
    /// Returns `MissingField` if `field` is not a result column, even for an empty result.
    pub fn column_array<T: SqlElement>(
        &self,
        cursor: &mut dyn RowCursor,
        field: &str,
    ) -> Result<Option<Vec<T>>> {
        let columns = cursor.columns();
        let index = column_position(&columns, field)?;
        let mut targets = vec![ScanTarget::Discard; columns.len()];
        targets[index] = ScanTarget::for_kind(T::KIND);

        let mut out = Vec::new();
        while cursor.next_row()? {
            cursor.scan(&mut targets)?;
            if let Some(value) = T::from_target(&targets[index])? {
                out.push(value);
            }
        }
        Ok((!out.is_empty()).then_some(out))
    }

    /// Rows keyed by column `key_field`.
    ///
    /// With a non-empty `value_field`, `V` must be `i64` or `String` and is read from that
    /// column; NULL values become the zero value. With an empty `value_field`, `V` must be a
    /// record and is built from the whole row. Rows with a NULL key are dropped. Later rows
    /// overwrite earlier ones with the same key. `None` is returned when no row was kept.
    ///
    /// # Errors
    /// Returns `ParameterError` for an empty `key_field`, `MissingField` for unknown columns,
    /// `ShapeError` when `V` does not match the requested mode, and `ColumnMismatch` for
    /// unparseable keys or values under [`CoercionPolicy::Strict`].
    pub fn column_map<K: MapKey, V: MapValue>(
        &self,
        cursor: &mut dyn RowCursor,
        key_field: &str,
        value_field: &str,
    ) -> Result<Option<HashMap<K, V>>> {
        if key_field.is_empty() {
            return Err(SqlMapperError::ParameterError(
                "map retrieval requires a key field".into(),
            ));
        }
        let columns = cursor.columns();
        let key_index = column_position(&columns, key_field)?;

        let mut out = HashMap::new();
        match V::map_strategy().mode {
            Mode::Scalar(convert) => {
                if value_field.is_empty() {
                    return Err(SqlMapperError::ShapeError(format!(
                        "an empty value field needs a record value type, not {}",
                        std::any::type_name::<V>()
                    )));
                }
                let value_index = column_position(&columns, value_field)?;
                let mut targets = vec![ScanTarget::Discard; columns.len()];
                targets[key_index] = ScanTarget::Raw(RowValues::Null);
                targets[value_index] = ScanTarget::Raw(RowValues::Null);

                while cursor.next_row()? {
                    cursor.scan(&mut targets)?;
                    let Some(key) = self.map_key::<K>(key_field, &targets[key_index])? else {
                        continue;
                    };
                    let raw = targets[value_index].to_row_value();
                    let value = match convert(&raw) {
                        Coerced::Value(v) => v,
                        Coerced::Null => V::default(),
                        Coerced::Invalid => self.invalid_value(value_field, &raw)?,
                    };
                    out.insert(key, value);
                }
            }
            Mode::Record { mapping, build } => {
                if !value_field.is_empty() {
                    return Err(SqlMapperError::ShapeError(format!(
                        "value field '{value_field}' needs an i64 or String value type, not {}",
                        std::any::type_name::<V>()
                    )));
                }
                let map = mapping(&self.cache);
                let mut plan = ScanPlan::new(&columns, &map);
                plan.ensure_readable(key_index);

                while cursor.next_row()? {
                    plan.scan_row(cursor)?;
                    let Some(key_target) = plan.target(key_index) else {
                        continue;
                    };
                    let Some(key) = self.map_key::<K>(key_field, key_target)? else {
                        continue;
                    };
                    out.insert(key, build(&plan)?);
                }
            }
        }
        Ok((!out.is_empty()).then_some(out))
    }

    fn map_key<K: MapKey>(&self, key_field: &str, target: &ScanTarget) -> Result<Option<K>> {
        let raw = target.to_row_value();
        match K::coerce(&raw) {
            Coerced::Value(key) => Ok(Some(key)),
            Coerced::Null => Ok(None),
            Coerced::Invalid => match self.options.coercion {
                CoercionPolicy::Skip => {
                    tracing::warn!(
                        key_field,
                        value = ?raw,
                        "dropping row with unparseable map key"
                    );
                    Ok(None)
                }
                CoercionPolicy::Strict => Err(SqlMapperError::ColumnMismatch(format!(
                    "map key '{key_field}' value {raw:?} cannot be converted to {}",
                    std::any::type_name::<K>()
                ))),
            },
        }
    }

    fn invalid_value<V: Default>(&self, value_field: &str, raw: &RowValues) -> Result<V> {
        match self.options.coercion {
            CoercionPolicy::Skip => {
                tracing::warn!(
                    value_field,
                    value = ?raw,
                    "storing zero value for unparseable map value"
                );
                Ok(V::default())
            }
            CoercionPolicy::Strict => Err(SqlMapperError::ColumnMismatch(format!(
                "map value '{value_field}' value {raw:?} cannot be converted to {}",
                std::any::type_name::<V>()
            ))),
        }
    }
}
