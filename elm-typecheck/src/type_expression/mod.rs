//! Type expression inference.
//!
//! Turns annotations, union variants and alias bodies into [`Ty`]s.

#[cfg(test)]
mod test;

use crate::{
    cache::InferenceCache,
    diagnostic::{Diagnostic, DiagnosticKind},
    resolve::{Resolve, TypeTarget},
    trace,
    unification::Store,
};
use elm_core::{AliasInfo, FieldReferenceTable, Name, Ty, TyVar, VarId};
use elm_syntax::{Ref, TypeAliasDeclaration, TypeDeclaration, TypeExpr, TypeExprKind};
use fnv::{FnvHashMap, FnvHashSet};
use std::{cell::RefCell, sync::Arc};

/**
The type a union or alias declaration defines, in terms of its parameters.

Variable ids are local to the declaration, so every use goes through
[`DeclarationType::instantiate`] or [`DeclarationType::variant`].
*/
#[derive(Debug, PartialEq)]
pub enum DeclarationType {
    Union {
        parameters: Vec<TyVar>,
        ty: Ty,
        variants: Vec<Vec<Ty>>,
    },
    Alias {
        parameters: Vec<TyVar>,
        ty: Ty,
    },
}

impl DeclarationType {
    pub fn parameters(&self) -> &[TyVar] {
        match self {
            DeclarationType::Union { parameters, .. } | DeclarationType::Alias { parameters, .. } => {
                parameters
            }
        }
    }

    fn ty(&self) -> &Ty {
        match self {
            DeclarationType::Union { ty, .. } | DeclarationType::Alias { ty, .. } => ty,
        }
    }

    /*
    Parameters map to `arguments` when given, and every other variable to a fresh one.
    */
    fn substitution(&self, store: &mut Store, arguments: Option<&[Ty]>) -> FnvHashMap<VarId, Ty> {
        let mut substitution = FnvHashMap::default();
        for (ix, parameter) in self.parameters().iter().enumerate() {
            let ty = match arguments.and_then(|arguments| arguments.get(ix)) {
                Some(argument) => argument.clone(),
                None => store.fresh_var(&parameter.name),
            };
            substitution.insert(parameter.id, ty);
        }
        let mut others: Vec<TyVar> = self.ty().vars();
        if let DeclarationType::Union { variants, .. } = self {
            others.extend(variants.iter().flatten().flat_map(|ty| ty.vars()));
        }
        for var in others {
            substitution
                .entry(var.id)
                .or_insert_with(|| store.fresh_var(&var.name));
        }
        substitution
    }

    /// The declared type applied to `arguments`.
    pub fn instantiate(&self, arguments: &[Ty], store: &mut Store) -> Ty {
        let substitution = self.substitution(store, Some(arguments));
        self.ty()
            .subst(&|var| substitution.get(&var.id).cloned())
    }

    /// A variant's argument types and the union type, for fresh type arguments.
    pub fn variant(&self, index: usize, store: &mut Store) -> Option<(Vec<Ty>, Ty)> {
        match self {
            DeclarationType::Union { ty, variants, .. } => {
                let arguments = variants.get(index)?;
                let substitution = self.substitution(store, None);
                let f = |var: &TyVar| substitution.get(&var.id).cloned();
                Some((
                    arguments.iter().map(|argument| argument.subst(&f)).collect(),
                    ty.subst(&f),
                ))
            }
            DeclarationType::Alias { .. } => None,
        }
    }
}

/// What type expression inference needs from the engine.
pub struct TypeEnv<'a, R: Resolve + ?Sized> {
    pub resolve: &'a R,
    pub cache: &'a InferenceCache,
    /// Aliases whose definitions are being converted.
    pub in_progress: &'a RefCell<FnvHashSet<(Name, Name)>>,
}

impl<'a, R: Resolve + ?Sized> Clone for TypeEnv<'a, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, R: Resolve + ?Sized> Copy for TypeEnv<'a, R> {}

fn single<T>(mut candidates: Vec<T>) -> Option<T> {
    if candidates.len() == 1 {
        candidates.pop()
    } else {
        None
    }
}

impl<'a, R: Resolve + ?Sized> TypeEnv<'a, R> {
    /// Resolve a type name to exactly one declaration.
    pub fn resolve_type(&self, name: &Ref) -> Option<TypeTarget<'a>> {
        match single(self.resolve.resolve_type(name)) {
            Some(target) => Some(target),
            None if name.module.is_none() && name.name.as_ref() == "List" => {
                Some(TypeTarget::External {
                    module: Name::from("List"),
                    name: Name::from("List"),
                    arity: 1,
                })
            }
            None => None,
        }
    }

    pub fn union(&self, module: &Name, declaration: &TypeDeclaration) -> Arc<DeclarationType> {
        let key = (module.clone(), declaration.name.clone());
        if let Some(cached) = self.cache.get_type(&key) {
            return cached;
        }
        trace!(module = %module, name = %declaration.name, "converting union type");

        let mut store = Store::new();
        let mut vars = FnvHashMap::default();
        let parameters = parameter_vars(&mut store, &mut vars, &declaration.parameters);
        let mut diagnostics = Vec::new();
        let mut converter = Converter {
            env: *self,
            store: &mut store,
            vars: &mut vars,
            rigid: false,
            diagnostics: &mut diagnostics,
        };
        let variants = declaration
            .variants
            .iter()
            .map(|variant| {
                variant
                    .arguments
                    .iter()
                    .map(|argument| converter.convert(argument))
                    .collect()
            })
            .collect();
        let ty = Ty::union(
            module,
            &declaration.name,
            parameters.iter().cloned().map(Ty::Var).collect(),
        );

        let declaration_type = Arc::new(DeclarationType::Union {
            parameters,
            ty,
            variants,
        });
        self.cache.insert_type(key, declaration_type.clone());
        declaration_type
    }

    /// `None` when the alias is defined in terms of itself.
    pub fn alias(
        &self,
        module: &Name,
        declaration: &TypeAliasDeclaration,
    ) -> Option<Arc<DeclarationType>> {
        let key = (module.clone(), declaration.name.clone());
        if let Some(cached) = self.cache.get_type(&key) {
            return Some(cached);
        }
        if !self.in_progress.borrow_mut().insert(key.clone()) {
            return None;
        }
        trace!(module = %module, name = %declaration.name, "converting type alias");

        let mut store = Store::new();
        let mut vars = FnvHashMap::default();
        let parameters = parameter_vars(&mut store, &mut vars, &declaration.parameters);
        let mut diagnostics = Vec::new();
        let aliased = Converter {
            env: *self,
            store: &mut store,
            vars: &mut vars,
            rigid: false,
            diagnostics: &mut diagnostics,
        }
        .convert(&declaration.aliased);
        self.in_progress.borrow_mut().remove(&key);

        let has_recursion = diagnostics
            .iter()
            .any(|diagnostic| diagnostic.kind == DiagnosticKind::InfiniteRecursion);
        if has_recursion {
            return None;
        }

        let ty = aliased.with_alias(AliasInfo {
            module: module.clone(),
            name: declaration.name.clone(),
            parameters: parameters.iter().cloned().map(Ty::Var).collect(),
        });
        let declaration_type = Arc::new(DeclarationType::Alias { parameters, ty });
        self.cache.insert_type(key, declaration_type.clone());
        Some(declaration_type)
    }
}

fn parameter_vars(
    store: &mut Store,
    vars: &mut FnvHashMap<Name, Ty>,
    names: &[Name],
) -> Vec<TyVar> {
    names
        .iter()
        .map(|name| {
            let var = store.fresh(name, false);
            vars.insert(name.clone(), Ty::Var(var.clone()));
            var
        })
        .collect()
}

/**
Converts type expressions in one scope.

Type variables are memoized by name in `vars`, so every occurrence of `a` in an annotation is
the same variable. Variables first seen by this converter are rigid when `rigid` is set.
*/
pub struct Converter<'a, 'b, R: Resolve + ?Sized> {
    pub env: TypeEnv<'a, R>,
    pub store: &'b mut Store,
    pub vars: &'b mut FnvHashMap<Name, Ty>,
    pub rigid: bool,
    pub diagnostics: &'b mut Vec<Diagnostic>,
}

impl<'a, 'b, R: Resolve + ?Sized> Converter<'a, 'b, R> {
    fn var(&mut self, name: &Name) -> Ty {
        match self.vars.get(name) {
            Some(ty) => ty.clone(),
            None => {
                let ty = Ty::Var(self.store.fresh(name, self.rigid));
                self.vars.insert(name.clone(), ty.clone());
                ty
            }
        }
    }

    fn report(&mut self, pos: usize, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic { pos, kind })
    }

    pub fn convert(&mut self, expr: &TypeExpr) -> Ty {
        match &expr.kind {
            TypeExprKind::Var(name) => self.var(name),
            TypeExprKind::Unit => Ty::Unit,
            TypeExprKind::Tuple(items) => {
                Ty::tuple(items.iter().map(|item| self.convert(item)).collect())
            }
            TypeExprKind::Record { base, fields } => {
                let base = base.as_ref().map(|base| self.var(base));
                let mut references = FieldReferenceTable::new();
                let fields = fields
                    .iter()
                    .map(|field| {
                        references.add(&field.name, field.pos);
                        (field.name.clone(), self.convert(&field.ty))
                    })
                    .collect();
                Ty::record_with(fields, base, references.freeze())
            }
            TypeExprKind::Function(segments) => match segments.split_last() {
                None => Ty::Unknown,
                Some((ret, parameters)) => {
                    let parameters = parameters
                        .iter()
                        .map(|parameter| self.convert(parameter))
                        .collect();
                    let ret = self.convert(ret);
                    Ty::function(parameters, ret)
                }
            },
            TypeExprKind::Ref { name, arguments } => {
                let arguments: Vec<Ty> = arguments
                    .iter()
                    .map(|argument| self.convert(argument))
                    .collect();
                self.reference(expr.pos, name, arguments)
            }
        }
    }

    fn check_arity(&mut self, pos: usize, actual: usize, expected: usize) -> bool {
        if actual == expected {
            true
        } else {
            self.report(pos, DiagnosticKind::TypeArgumentCount { actual, expected });
            false
        }
    }

    fn reference(&mut self, pos: usize, name: &Ref, arguments: Vec<Ty>) -> Ty {
        let target = match self.env.resolve_type(name) {
            Some(target) => target,
            None => return Ty::Unknown,
        };
        match target {
            TypeTarget::External {
                module,
                name,
                arity,
            } => {
                if self.check_arity(pos, arguments.len(), arity) {
                    Ty::union(&module, &name, arguments)
                } else {
                    Ty::Unknown
                }
            }
            TypeTarget::Union {
                module,
                declaration,
            } => {
                if self.check_arity(pos, arguments.len(), declaration.parameters.len()) {
                    Ty::union(&module, &declaration.name, arguments)
                } else {
                    Ty::Unknown
                }
            }
            TypeTarget::Alias {
                module,
                declaration,
            } => {
                if !self.check_arity(pos, arguments.len(), declaration.parameters.len()) {
                    return Ty::Unknown;
                }
                match self.env.alias(&module, declaration) {
                    Some(alias) => alias.instantiate(&arguments, self.store),
                    None => {
                        self.report(pos, DiagnosticKind::InfiniteRecursion);
                        Ty::Unknown
                    }
                }
            }
        }
    }
}
