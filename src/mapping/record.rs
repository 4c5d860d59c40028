use crate::error::Result;
use crate::mapping::ColumnValue;
use crate::scan::ScanTarget;
use crate::types::FieldKind;

/// One field of a record type as seen by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub name: &'static str,
    /// Column tag; empty means the field is never populated from a query.
    pub tag: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn new(name: &'static str, tag: &'static str, kind: FieldKind) -> Self {
        Self { name, tag, kind }
    }

    #[must_use]
    pub fn is_mapped(&self) -> bool {
        !self.tag.is_empty()
    }
}

/// A structured destination with tagged fields.
///
/// Field ordinals are positions in [`Record::fields`]. Implement this through
/// [`impl_record!`](crate::impl_record) rather than by hand:
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     name: String,
///     nickname: Option<String>,
///     scratch: u32,
/// }
///
/// sql_mapper::impl_record!(User {
///     id => "id",
///     name => "user_name",
///     nickname => "nickname",
///     scratch => "",
/// });
///
/// let fields = User::fields();
/// assert_eq!(fields[1].tag, "user_name");
/// assert_eq!(fields[2].kind, FieldKind::String);
/// assert!(!fields[3].is_mapped());
/// ```
pub trait Record: Default + 'static {
    /// Every field in declaration order, tagged or not.
    fn fields() -> Vec<FieldDescriptor>;

    /// Store one scanned column into the field at `ordinal`.
    ///
    /// # Errors
    /// Returns the field type's conversion error, or `ShapeError` for an unknown ordinal.
    fn set_field(&mut self, ordinal: usize, target: &ScanTarget) -> Result<()>;
}

/// Kind of a field, inferred from its type. Used by [`impl_record!`](crate::impl_record).
#[must_use]
pub fn kind_of<T: ColumnValue>(_field: &T) -> FieldKind {
    T::KIND
}

/// Generate [`Record`] and record-mode [`MapValue`](crate::MapValue) for a struct.
///
/// Each entry is `field => "column_tag"`; an empty tag keeps the field out of the mapping. Every
/// field listed must implement [`ColumnValue`](crate::ColumnValue) and the struct must implement
/// `Default`.
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:ident => $tag:expr),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn fields() -> ::std::vec::Vec<$crate::FieldDescriptor> {
                let probe = <$ty as ::std::default::Default>::default();
                let _ = &probe;
                ::std::vec![
                    $($crate::FieldDescriptor::new(
                        stringify!($field),
                        $tag,
                        $crate::mapping::kind_of(&probe.$field),
                    )),*
                ]
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn set_field(
                &mut self,
                ordinal: usize,
                target: &$crate::ScanTarget,
            ) -> $crate::Result<()> {
                let mut position = 0usize;
                $(
                    if position == ordinal {
                        self.$field = $crate::ColumnValue::from_scan(target)?;
                        return Ok(());
                    }
                    position += 1;
                )*
                Err($crate::SqlMapperError::ShapeError(format!(
                    "{} has no field at position {}",
                    stringify!($ty),
                    ordinal
                )))
            }
        }

        impl $crate::MapValue for $ty {
            fn map_strategy() -> $crate::MapStrategy<Self> {
                $crate::MapStrategy::record()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlMapperError;

    #[derive(Debug, Default)]
    struct Probe {
        count: u16,
        label: String,
    }

    crate::impl_record!(Probe {
        count => "count",
        label => "label",
    });

    #[test]
    fn set_field_routes_by_position() {
        let mut p = Probe::default();
        p.set_field(0, &ScanTarget::Int(Some(9))).unwrap();
        p.set_field(1, &ScanTarget::Text(None)).unwrap();
        assert_eq!(p.count, 9);
        assert_eq!(p.label, "");

        let err = p.set_field(2, &ScanTarget::Int(Some(1))).unwrap_err();
        assert!(matches!(err, SqlMapperError::ShapeError(_)));
    }

    #[test]
    fn kinds_follow_field_types() {
        let kinds: Vec<_> = Probe::fields().iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FieldKind::Unsigned, FieldKind::String]);
    }
}
