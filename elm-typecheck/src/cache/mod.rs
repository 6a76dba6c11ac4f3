//! Inference result caching and invalidation.
//!
//! Each top-level value declaration has at most one entry, keyed by its file, its name, and
//! the structural hash of its annotation. Entries move from computed to stale when the
//! host reports a change, and are recomputed the next time they're requested.


use crate::{debug, type_expression::DeclarationType, FileId, InferenceResult};
use dashmap::DashMap;
use elm_core::Name;
use elm_syntax::ValueDeclaration;
use fnv::{FnvBuildHasher, FnvHashMap};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct DeclKey {
    pub file: FileId,
    pub name: Name,
    /// `None` for unannotated declarations.
    pub annotation: Option<u64>,
}

impl DeclKey {
    pub fn new(file: FileId, declaration: &ValueDeclaration) -> Self {
        DeclKey {
            file,
            name: declaration_name(declaration),
            annotation: declaration
                .annotation()
                .map(|annotation| annotation.structural_hash()),
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.annotation.is_some()
    }
}

/// A function's name, or the names a pattern declaration binds, like `(x,y)`.
pub fn declaration_name(declaration: &ValueDeclaration) -> Name {
    match declaration.name() {
        Some(name) => name.clone(),
        None => {
            let names: Vec<String> = declaration
                .bound_names()
                .into_iter()
                .map(|(_, name)| name.to_string())
                .collect();
            Name::from(format!("({})", names.join(",")))
        }
    }
}

/// A source edit, as reported by the host.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Change {
    /// An edit inside a value declaration's body.
    Value { file: FileId, name: Name },
    /// An edit to a value declaration's annotation, including adding or removing it.
    Annotation { file: FileId, name: Name },
    /// An edit to a type, type alias, or infix declaration.
    Type { file: FileId },
    /// Anything else, such as imports changing.
    File { file: FileId },
}

#[derive(Debug, Clone)]
enum Entry {
    Computed(Arc<InferenceResult>),
    Stale,
}

/// Type aliases and union types are keyed by module and type name.
pub type TypeKey = (Name, Name);

/**
Inference results shared between engines.

Map operations lock one shard at a time. No lock is held while a result is being computed,
so computing one entry can request others.
*/
#[derive(Debug, Default)]
pub struct InferenceCache {
    values: DashMap<DeclKey, Entry, FnvBuildHasher>,
    types: DashMap<TypeKey, Arc<DeclarationType>, FnvBuildHasher>,
    /// Counted per declaration, across annotation versions.
    computations: DashMap<(FileId, Name), usize, FnvBuildHasher>,
}

impl InferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A computed entry. Stale entries are treated as missing.
    pub fn get(&self, key: &DeclKey) -> Option<Arc<InferenceResult>> {
        self.values.get(key).and_then(|entry| match entry.value() {
            Entry::Computed(result) => Some(result.clone()),
            Entry::Stale => None,
        })
    }

    pub fn is_stale(&self, key: &DeclKey) -> bool {
        self.values
            .get(key)
            .map_or(false, |entry| matches!(entry.value(), Entry::Stale))
    }

    /// Store a result, replacing entries for other annotations of the same declaration.
    pub fn insert(&self, key: DeclKey, result: Arc<InferenceResult>) {
        *self
            .computations
            .entry((key.file, key.name.clone()))
            .or_insert(0) += 1;
        self.values.retain(|other, _| {
            other.file != key.file || other.name != key.name || other.annotation == key.annotation
        });
        self.values.insert(key, Entry::Computed(result));
    }

    /// How many entries are held, stale or not.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_type(&self, key: &TypeKey) -> Option<Arc<DeclarationType>> {
        self.types.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert_type(&self, key: TypeKey, declaration_type: Arc<DeclarationType>) {
        self.types.insert(key, declaration_type);
    }

    fn mark_stale(&self, predicate: impl Fn(&DeclKey) -> bool) -> usize {
        let mut count = 0;
        for mut entry in self.values.iter_mut() {
            if predicate(entry.key()) && !matches!(entry.value(), Entry::Stale) {
                *entry.value_mut() = Entry::Stale;
                count += 1;
            }
        }
        count
    }

    pub fn invalidate(&self, change: Change) {
        let count = match &change {
            Change::Value { file, name } => {
                let unannotated = self.values.iter().any(|entry| {
                    let key = entry.key();
                    key.file == *file && key.name == *name && !key.is_annotated()
                });
                self.mark_stale(|key| {
                    key.file == *file
                        && (key.name == *name || (unannotated && !key.is_annotated()))
                })
            }
            // annotated callers read the callee's annotation too
            Change::Annotation { file, .. } => self.mark_stale(|key| key.file == *file),
            Change::Type { file } | Change::File { file } => {
                self.types.clear();
                self.mark_stale(|key| key.file == *file)
            }
        };
        debug!(?change, stale = count, "invalidated inference cache");
    }

    /// How many times each declaration has been computed.
    pub fn computations(&self) -> FnvHashMap<(FileId, Name), usize> {
        self.computations
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// How many times any version of a declaration has been computed.
    pub fn computations_of(&self, file: FileId, name: &str) -> usize {
        self.computations
            .get(&(file, Name::from(name)))
            .map_or(0, |entry| *entry.value())
    }
}
