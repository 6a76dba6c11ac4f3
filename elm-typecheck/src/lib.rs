#![deny(unused_crate_dependencies)]

#[cfg(test)]
mod test;

mod macros;

pub mod cache;
pub mod diagnostic;
pub mod generalization;
pub mod inference;
pub mod metavariables;
pub mod operator;
pub mod resolve;
pub mod type_expression;
pub mod unification;

use cache::{declaration_name, DeclKey, InferenceCache};
use diagnostic::Diagnostic;
use elm_core::{Name, Ty};
use elm_syntax::{NodeId, Ref, ValueDeclaration};
use fnv::{FnvHashMap, FnvHashSet};
use inference::Inference;
use resolve::{Resolve, ValueTarget};
use std::{
    cell::RefCell,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use type_expression::TypeEnv;

/// Identifies a source file. Assigned by the host.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct FileId(pub u32);

/// Which name shadowing is reported as [`ConflictingNameDeclaration`](diagnostic::DiagnosticKind::ConflictingNameDeclaration).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Shadowing {
    /// Only names bound twice by the same pattern, parameter list, or `let` block.
    #[default]
    SameScope,
    /// Also names that shadow a local or top-level name from an enclosing scope.
    AllScopes,
}

#[derive(Debug, Clone, Default)]
pub struct InferenceConfig {
    pub shadowing: Shadowing,
    /// Inference stops at the next expression once this is set.
    pub cancellation: Option<Arc<AtomicBool>>,
}

#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum Error {
    #[error("inference was cancelled")]
    Cancelled,
    #[error("{name} is not a top-level declaration of this module")]
    NotTopLevel { name: Name },
}

/**
The inferred type of a declaration, the type of each of its expressions and patterns, and the
problems found along the way.

Every type is frozen: no solved variables and no mutable records remain.
*/
#[derive(Debug, PartialEq, Clone)]
pub struct InferenceResult {
    pub ty: Ty,
    pub expression_types: FnvHashMap<NodeId, Ty>,
    pub diagnostics: Vec<Diagnostic>,
}

impl InferenceResult {
    pub fn ty_of(&self, node: NodeId) -> Option<&Ty> {
        self.expression_types.get(&node)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/**
Infers the value declarations of one file.

Results are stored in the shared [`InferenceCache`]. Declarations referenced by the one being
inferred are inferred (or fetched from the cache) on demand.
*/
pub struct Engine<'a, R: Resolve + ?Sized> {
    file: FileId,
    resolve: &'a R,
    cache: &'a InferenceCache,
    config: InferenceConfig,
    /// Top-level declarations whose inference is in progress.
    active: RefCell<FnvHashSet<Name>>,
    /// Type aliases whose definitions are being converted.
    aliases: RefCell<FnvHashSet<(Name, Name)>>,
}

/// A result, and the in-progress declarations it was inferred against.
pub(crate) type Inferred = (Arc<InferenceResult>, FnvHashSet<Name>);

impl<'a, R: Resolve + ?Sized> Engine<'a, R> {
    pub fn new(
        file: FileId,
        resolve: &'a R,
        cache: &'a InferenceCache,
        config: InferenceConfig,
    ) -> Self {
        Engine {
            file,
            resolve,
            cache,
            config,
            active: RefCell::new(FnvHashSet::default()),
            aliases: RefCell::new(FnvHashSet::default()),
        }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn cache(&self) -> &'a InferenceCache {
        self.cache
    }

    pub(crate) fn resolve(&self) -> &'a R {
        self.resolve
    }

    pub(crate) fn type_env(&self) -> TypeEnv<'_, R> {
        TypeEnv {
            resolve: self.resolve,
            cache: self.cache,
            in_progress: &self.aliases,
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.config
            .cancellation
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    pub(crate) fn is_active(&self, name: &Name) -> bool {
        self.active.borrow().contains(name)
    }

    /**
    Infer a top-level value declaration.

    `declaration` must be one of the declarations that the engine's [`Resolve`] sees; otherwise
    the result is [`Error::NotTopLevel`].
    */
    pub fn infer(&self, declaration: &ValueDeclaration) -> Result<Arc<InferenceResult>, Error> {
        let not_top_level = || Error::NotTopLevel {
            name: declaration_name(declaration),
        };
        let (_, name) = declaration
            .bound_names()
            .into_iter()
            .next()
            .ok_or_else(not_top_level)?;
        let resolve: &'a R = self.resolve;
        let target = resolve
            .resolve_value(&Ref {
                module: None,
                name,
            })
            .into_iter()
            .find_map(|target| match target {
                ValueTarget::Value(candidate) if std::ptr::eq(candidate, declaration) => {
                    Some(candidate)
                }
                _ => None,
            })
            .ok_or_else(not_top_level)?;
        self.infer_top_level(target).map(|(result, _)| result)
    }

    /*
    Results that were inferred against another in-progress declaration depend on the order
    declarations were requested in, so they aren't cached.
    */
    pub(crate) fn infer_top_level(
        &self,
        declaration: &'a ValueDeclaration,
    ) -> Result<Inferred, Error> {
        let key = DeclKey::new(self.file, declaration);
        if let Some(result) = self.cache.get(&key) {
            trace!(name = %key.name, "inference cache hit");
            return Ok((result, FnvHashSet::default()));
        }
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!(name = %key.name, stale = self.cache.is_stale(&key), "inferring declaration");
        self.active.borrow_mut().insert(key.name.clone());
        let inferred = Inference::new(self).infer_declaration(declaration);
        self.active.borrow_mut().remove(&key.name);

        let (result, mut recursive) = inferred?;
        recursive.remove(&key.name);
        let result = Arc::new(result);
        debug!(
            name = %key.name,
            diagnostics = result.diagnostics.len(),
            cached = recursive.is_empty(),
            "inferred declaration"
        );
        if recursive.is_empty() {
            self.cache.insert(key, result.clone());
        }
        Ok((result, recursive))
    }
}
