use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::mapping::{FieldDescriptor, Record};
use crate::types::FieldKind;

/// Where a column lands in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub ordinal: usize,
    pub kind: FieldKind,
}

/// Column tag to field slot mapping for one record type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    slots: HashMap<String, FieldSlot>,
}

impl FieldMap {
    /// Index the tagged fields. Untagged fields are skipped; for a repeated tag the later
    /// field wins.
    #[must_use]
    pub fn from_fields(fields: &[FieldDescriptor]) -> Self {
        let slots = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_mapped())
            .map(|(ordinal, f)| {
                (
                    f.tag.to_string(),
                    FieldSlot {
                        ordinal,
                        kind: f.kind,
                    },
                )
            })
            .collect();
        Self { slots }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&FieldSlot> {
        self.slots.get(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Per-type memo of [`FieldMap`]s, shared by every call on one engine.
///
/// Lookups take the read lock; the first lookup for a type takes the write lock and re-checks
/// before computing, so each type is indexed once.
#[derive(Debug, Default)]
pub struct TypeMappingCache {
    entries: RwLock<HashMap<TypeId, Arc<FieldMap>>>,
}

impl TypeMappingCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping for `R`, computed on first use.
    pub fn mapping_for<R: Record>(&self) -> Arc<FieldMap> {
        let key = TypeId::of::<R>();
        {
            let entries = self
                .entries
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(map) = entries.get(&key) {
                return Arc::clone(map);
            }
        }

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(FieldMap::from_fields(&R::fields()))),
        )
    }

    /// Number of record types indexed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
