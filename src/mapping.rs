//! Declarative column-to-field binding.
//!
//! A destination type opts in with [`impl_record!`](crate::impl_record), which lists each field
//! with its column tag. The resulting binding table is read once per type and memoized by
//! [`TypeMappingCache`].

mod cache;
mod column;
mod record;

pub use cache::{FieldMap, FieldSlot, TypeMappingCache};
pub use column::ColumnValue;
pub use record::{FieldDescriptor, Record, kind_of};
