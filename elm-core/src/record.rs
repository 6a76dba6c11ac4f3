//! Where record fields were observed in source.
//!
//! Inference records, per field, every source position that contributed the field's
//! type. While a pass runs the positions accumulate in a [`FieldReferenceTable`];
//! records in finished results carry an immutable [`FieldReferences`].

use crate::Name;
use std::sync::Arc;

/// Frozen field references. Cheap to clone; cannot be modified.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct FieldReferences(Arc<[(Name, Vec<usize>)]>);

impl FieldReferences {
    pub fn get(&self, field: &str) -> &[usize] {
        self.0
            .iter()
            .find(|(name, _)| name.as_ref() == field)
            .map_or(&[], |(_, positions)| positions.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &[usize])> {
        self.0
            .iter()
            .map(|(name, positions)| (name, positions.as_slice()))
    }

    /// A new table with the references of `self` followed by those of `other`.
    pub fn merge(&self, other: &FieldReferences) -> FieldReferences {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut table = FieldReferenceTable::from(self);
        table.extend(other);
        table.freeze()
    }
}

/// Field references that are still being collected.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct FieldReferenceTable {
    entries: Vec<(Name, Vec<usize>)>,
}

impl FieldReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &Name, pos: usize) {
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, positions)) => {
                if !positions.contains(&pos) {
                    positions.push(pos)
                }
            }
            None => self.entries.push((field.clone(), vec![pos])),
        }
    }

    pub fn extend(&mut self, references: &FieldReferences) {
        for (field, positions) in references.iter() {
            for pos in positions {
                self.add(field, *pos)
            }
        }
    }

    pub fn freeze(self) -> FieldReferences {
        FieldReferences(Arc::from(self.entries))
    }
}

impl From<&FieldReferences> for FieldReferenceTable {
    fn from(references: &FieldReferences) -> Self {
        FieldReferenceTable {
            entries: references.0.to_vec(),
        }
    }
}
