//! Type inference for value declarations.
//!
//! One [`Inference`] infers one top-level declaration, including every `let` declaration nested
//! inside it. Other top-level declarations are inferred through the [`Engine`] and used at a
//! closed, instantiated type.


mod pattern;
mod recursion;

use crate::{
    cache::declaration_name,
    diagnostic::{Diagnostic, DiagnosticKind},
    generalization::{free_vars, generalize, Scheme},
    operator::{self, BinaryTree, Precedence},
    resolve::{Resolve, ValueTarget},
    trace,
    type_expression::Converter,
    unification::{self, Bindings, Store, Tail},
    Engine, Error, InferenceResult, Shadowing,
};
use elm_core::{FieldReferenceTable, Name, Ty, VarId};
use elm_syntax::{
    CaseBranch, DeclarationHead, Expr, ExprKind, FieldAssignment, Literal, NodeId, Pattern, Ref,
    Spanned, TypeExpr, ValueDeclaration,
};
use fnv::{FnvHashMap, FnvHashSet};
use pattern::{bound_type, Bound, PatternContext};
use std::{iter, mem};

#[derive(Debug, Clone)]
enum Binding<'a> {
    Mono(Ty),
    Poly(Scheme),
    /// An unannotated `let` declaration that hasn't been inferred yet.
    Pending {
        declaration: &'a ValueDeclaration,
        lambda_depth: usize,
    },
    /// An annotated function whose body is being inferred.
    Checking {
        scheme: Scheme,
        has_parameters: bool,
        lambda_depth: usize,
    },
    /// An unannotated function whose body is being inferred.
    Active {
        ty: Ty,
        has_parameters: bool,
        lambda_depth: usize,
    },
}

#[derive(Debug, Default)]
struct Scope<'a> {
    bindings: FnvHashMap<Name, Binding<'a>>,
}

enum FieldError {
    NotARecord,
    Missing,
}

pub(crate) struct Inference<'e, 'a, R: Resolve + ?Sized> {
    engine: &'e Engine<'a, R>,
    /// The top-level declaration being inferred.
    declaration: Option<&'a ValueDeclaration>,
    store: Store,
    expression_types: FnvHashMap<NodeId, Ty>,
    diagnostics: Vec<Diagnostic>,
    scopes: Vec<Scope<'a>>,
    /// Variables of the annotations enclosing the current expression.
    type_vars: FnvHashMap<Name, Ty>,
    /// How many lambdas and function bodies enclose the current expression.
    lambda_depth: usize,
    /// In-progress top-level declarations that this declaration referenced.
    recursive: FnvHashSet<Name>,
    cancelled: bool,
}

impl<'e, 'a, R: Resolve + ?Sized> Inference<'e, 'a, R> {
    pub(crate) fn new(engine: &'e Engine<'a, R>) -> Self {
        Inference {
            engine,
            declaration: None,
            store: Store::new(),
            expression_types: FnvHashMap::default(),
            diagnostics: Vec::new(),
            scopes: Vec::new(),
            type_vars: FnvHashMap::default(),
            lambda_depth: 0,
            recursive: FnvHashSet::default(),
            cancelled: false,
        }
    }

    /**
    Infer a top-level declaration.

    Returns the frozen result and the names of the in-progress declarations it was inferred
    against.
    */
    pub(crate) fn infer_declaration(
        mut self,
        declaration: &'a ValueDeclaration,
    ) -> Result<(InferenceResult, FnvHashSet<Name>), Error> {
        self.declaration = Some(declaration);
        let ty = match &declaration.head {
            DeclarationHead::Function { name, parameters } => {
                let annotation = declaration.annotation().map(|annotation| {
                    let mut vars = FnvHashMap::default();
                    let ty = self.convert_annotation(annotation, &mut vars);
                    self.type_vars = vars;
                    ty
                });

                let mut scope = Scope::default();
                let self_ty = match &annotation {
                    Some(annotation) => {
                        scope.bindings.insert(
                            name.item.clone(),
                            Binding::Checking {
                                scheme: Scheme::closed(annotation.clone()),
                                has_parameters: !parameters.is_empty(),
                                lambda_depth: 0,
                            },
                        );
                        None
                    }
                    None => {
                        let ty = self.store.fresh_var("a");
                        scope.bindings.insert(
                            name.item.clone(),
                            Binding::Active {
                                ty: ty.clone(),
                                has_parameters: !parameters.is_empty(),
                                lambda_depth: 0,
                            },
                        );
                        Some(ty)
                    }
                };
                self.scopes.push(scope);
                let ty = self.infer_function(name, parameters, &declaration.body, annotation.as_ref());
                self.scopes.pop();
                if let Some(self_ty) = self_ty {
                    self.check(name.pos, &ty, &self_ty);
                }
                ty
            }
            DeclarationHead::Pattern(pattern) => {
                self.scopes.push(Scope::default());
                let mut bound = Vec::new();
                let ty = self.infer_destructuring(pattern, &declaration.body, &mut bound);
                self.bind_all(bound, &mut FnvHashSet::default());
                self.scopes.pop();
                ty
            }
        };

        if self.cancelled {
            return Err(Error::Cancelled);
        }
        Ok(self.finish(&ty))
    }

    fn finish(self, ty: &Ty) -> (InferenceResult, FnvHashSet<Name>) {
        let store = self.store.freeze();
        let zonk = |ty: &Ty| store.zonk(ty);
        let mut diagnostics: Vec<Diagnostic> = self
            .diagnostics
            .iter()
            .map(|diagnostic| Diagnostic {
                pos: diagnostic.pos,
                kind: diagnostic.kind.map_types(&zonk),
            })
            .collect();
        diagnostics.sort_by_key(|diagnostic| diagnostic.pos);
        let result = InferenceResult {
            ty: store.zonk(ty),
            expression_types: self
                .expression_types
                .iter()
                .map(|(id, ty)| (*id, store.zonk(ty)))
                .collect(),
            diagnostics,
        };
        (result, self.recursive)
    }

    fn is_cancelled(&mut self) -> bool {
        if !self.cancelled && self.engine.is_cancelled() {
            trace!("inference cancelled");
            self.cancelled = true;
        }
        self.cancelled
    }

    fn report(&mut self, pos: usize, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic { pos, kind })
    }

    /**
    Require `actual` to be `expected`, reporting a diagnostic at `pos` when it isn't.

    Returns whether unification succeeded.
    */
    fn check(&mut self, pos: usize, actual: &Ty, expected: &Ty) -> bool {
        match self.store.unify(actual, expected) {
            Ok(()) => true,
            Err(error) => {
                trace!(?error, pos, "unification failed");
                let kind = match error {
                    unification::Error::InfiniteType => DiagnosticKind::InfiniteType,
                    unification::Error::Mismatch => DiagnosticKind::TypeMismatch {
                        found: self.store.zonk(actual),
                        required: self.store.zonk(expected),
                        record_diff: None,
                    },
                    unification::Error::Record(diff) => DiagnosticKind::TypeMismatch {
                        found: self.store.zonk(actual),
                        required: self.store.zonk(expected),
                        record_diff: Some(diff.map_types(&|ty| self.store.zonk(ty))),
                    },
                };
                self.report(pos, kind);
                false
            }
        }
    }

    /// Annotation variables first seen here are rigid.
    fn convert_annotation(&mut self, annotation: &TypeExpr, vars: &mut FnvHashMap<Name, Ty>) -> Ty {
        let engine = self.engine;
        Converter {
            env: engine.type_env(),
            store: &mut self.store,
            vars,
            rigid: true,
            diagnostics: &mut self.diagnostics,
        }
        .convert(annotation)
    }

    /// Another declaration's annotation. Its problems are reported where it's declared.
    fn convert_foreign(&mut self, annotation: &TypeExpr) -> Ty {
        let engine = self.engine;
        let mut vars = FnvHashMap::default();
        let mut diagnostics = Vec::new();
        Converter {
            env: engine.type_env(),
            store: &mut self.store,
            vars: &mut vars,
            rigid: false,
            diagnostics: &mut diagnostics,
        }
        .convert(annotation)
    }

    // Scopes

    fn bind(&mut self, name: Name, binding: Binding<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name, binding);
        }
    }

    fn lookup(&self, name: &Name) -> Option<Binding<'a>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
            .cloned()
    }

    fn is_current(&self, declaration: &ValueDeclaration) -> bool {
        self.declaration
            .map_or(false, |current| std::ptr::eq(current, declaration))
    }

    fn shadows(&self, name: &Name) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.bindings.contains_key(name))
            || self
                .engine
                .resolve()
                .resolve_value(&Ref {
                    module: None,
                    name: name.clone(),
                })
                .iter()
                .any(|target| {
                    matches!(target, ValueTarget::Value(declaration) if !self.is_current(declaration))
                })
    }

    /// Add `name` to the names declared by one pattern, parameter list or `let` block.
    fn declare(&mut self, names: &mut FnvHashSet<Name>, pos: usize, name: &Name) {
        let shadows = match self.engine.config().shadowing {
            Shadowing::SameScope => false,
            Shadowing::AllScopes => self.shadows(name),
        };
        if !names.insert(name.clone()) || shadows {
            self.report(pos, DiagnosticKind::ConflictingNameDeclaration);
        }
    }

    fn bind_all(&mut self, bound: Bound, names: &mut FnvHashSet<Name>) {
        for (pos, name, ty) in bound {
            self.declare(names, pos, &name);
            self.bind(name, Binding::Mono(ty));
        }
    }

    /// Variables that can't be generalized because the enclosing scopes mention them.
    fn environment_vars(&self) -> FnvHashSet<VarId> {
        let mut vars = free_vars(&self.store, self.type_vars.values());
        for binding in self.scopes.iter().flat_map(|scope| scope.bindings.values()) {
            match binding {
                Binding::Mono(ty) | Binding::Active { ty, .. } => {
                    vars.extend(free_vars(&self.store, iter::once(ty)))
                }
                Binding::Poly(scheme) | Binding::Checking { scheme, .. } => vars.extend(
                    free_vars(&self.store, iter::once(&scheme.ty))
                        .into_iter()
                        .filter(|var| !scheme.vars.iter().any(|quantified| quantified.id == *var)),
                ),
                Binding::Pending { .. } => {}
            }
        }
        vars
    }

    fn generalize(&self, ty: &Ty) -> Scheme {
        generalize(&self.store, ty, &self.environment_vars())
    }

    // Declarations

    fn infer_function(
        &mut self,
        name: &Spanned<Name>,
        parameters: &'a [Pattern],
        body: &'a Expr,
        annotation: Option<&Ty>,
    ) -> Ty {
        let mut names = FnvHashSet::default();
        names.insert(name.item.clone());

        let expected = match annotation {
            None => None,
            Some(annotation) => {
                let annotated = function_parameters(annotation);
                if parameters.len() > annotated.len() {
                    self.report(
                        name.pos,
                        DiagnosticKind::ParameterCount {
                            actual: parameters.len(),
                            expected: annotated.len(),
                        },
                    );
                    None
                } else {
                    Some(annotated[..parameters.len()].to_vec())
                }
            }
        };
        let parameter_types: Vec<Ty> = match &expected {
            Some(types) => types.clone(),
            None => parameters
                .iter()
                .map(|_| self.store.fresh_var("a"))
                .collect(),
        };

        self.scopes.push(Scope::default());
        let mut bound = Vec::new();
        for (parameter, ty) in parameters.iter().zip(&parameter_types) {
            self.infer_pattern(parameter, ty, PatternContext::Parameter, &mut bound);
        }
        self.bind_all(bound, &mut names);
        let depth = usize::from(!parameters.is_empty());
        self.lambda_depth += depth;
        let body_ty = self.infer_expr(body);
        self.lambda_depth -= depth;
        self.scopes.pop();

        match (annotation, expected) {
            (Some(annotation), Some(_)) => {
                let ret = apply_parameters(annotation, parameters.len());
                self.check(body.pos, &body_ty, &ret);
                annotation.clone()
            }
            (Some(annotation), None) => annotation.clone(),
            (None, _) => Ty::function(parameter_types, body_ty),
        }
    }

    fn infer_destructuring(&mut self, pattern: &'a Pattern, body: &'a Expr, bound: &mut Bound) -> Ty {
        let ty = self.infer_expr(body);
        self.infer_pattern(pattern, &ty, PatternContext::Declaration, bound);
        ty
    }

    fn infer_let(&mut self, declarations: &'a [ValueDeclaration], body: &'a Expr) -> Ty {
        let mut names = FnvHashSet::default();
        let mut scope = Scope::default();
        let mut annotated = Vec::new();
        for declaration in declarations {
            for (pos, name) in declaration.bound_names() {
                self.declare(&mut names, pos, &name);
            }
            match (&declaration.head, declaration.annotation()) {
                (DeclarationHead::Function { name, parameters }, Some(annotation)) => {
                    let outer: FnvHashSet<VarId> = self
                        .type_vars
                        .values()
                        .filter_map(|ty| ty.var().map(|var| var.id))
                        .collect();
                    let mut vars = self.type_vars.clone();
                    let ty = self.convert_annotation(annotation, &mut vars);
                    let quantified = ty
                        .vars()
                        .into_iter()
                        .filter(|var| !outer.contains(&var.id))
                        .collect();
                    let scheme = Scheme {
                        vars: quantified,
                        ty: ty.clone(),
                    };
                    scope
                        .bindings
                        .insert(name.item.clone(), Binding::Poly(scheme.clone()));
                    annotated.push((name, parameters, &declaration.body, scheme, vars));
                }
                _ => {
                    for (_, name) in declaration.bound_names() {
                        scope.bindings.insert(
                            name,
                            Binding::Pending {
                                declaration,
                                lambda_depth: self.lambda_depth,
                            },
                        );
                    }
                }
            }
        }

        self.scopes.push(scope);
        for declaration in declarations {
            if self.is_pending(declaration) {
                self.infer_pending(declaration, self.lambda_depth);
            }
        }
        for (name, parameters, body, scheme, vars) in annotated {
            let ty = scheme.ty.clone();
            self.bind(
                name.item.clone(),
                Binding::Checking {
                    scheme: scheme.clone(),
                    has_parameters: !parameters.is_empty(),
                    lambda_depth: self.lambda_depth,
                },
            );
            let outer = mem::replace(&mut self.type_vars, vars);
            self.infer_function(name, parameters, body, Some(&ty));
            self.type_vars = outer;
            self.bind(name.item.clone(), Binding::Poly(scheme));
        }
        let ty = self.infer_expr(body);
        self.scopes.pop();
        ty
    }

    fn is_pending(&self, declaration: &ValueDeclaration) -> bool {
        self.scopes.last().map_or(false, |scope| {
            scope.bindings.values().any(|binding| {
                matches!(binding, Binding::Pending { declaration: pending, .. } if std::ptr::eq(*pending, declaration))
            })
        })
    }

    /**
    Infer and generalize an unannotated `let` declaration.

    The declaration is inferred in the scope it was written in, so bindings introduced between
    its `let` and the reference that triggered it are hidden.
    */
    fn infer_pending(&mut self, declaration: &'a ValueDeclaration, lambda_depth: usize) {
        let index = match self.scopes.iter().rposition(|scope| {
            scope.bindings.values().any(|binding| {
                matches!(binding, Binding::Pending { declaration: pending, .. } if std::ptr::eq(*pending, declaration))
            })
        }) {
            Some(index) => index,
            None => return,
        };
        let inner = self.scopes.split_off(index + 1);
        let outer_depth = mem::replace(&mut self.lambda_depth, lambda_depth);

        match &declaration.head {
            DeclarationHead::Function { name, parameters } => {
                let self_ty = self.store.fresh_var("a");
                self.scopes[index].bindings.insert(
                    name.item.clone(),
                    Binding::Active {
                        ty: self_ty.clone(),
                        has_parameters: !parameters.is_empty(),
                        lambda_depth,
                    },
                );
                let ty = self.infer_function(name, parameters, &declaration.body, None);
                self.check(name.pos, &ty, &self_ty);

                self.scopes[index].bindings.remove(&name.item);
                let scheme = self.generalize(&ty);
                self.scopes[index]
                    .bindings
                    .insert(name.item.clone(), Binding::Poly(scheme));
            }
            DeclarationHead::Pattern(pattern) => {
                let names = pattern.bound_names();
                for (_, name) in &names {
                    self.scopes[index]
                        .bindings
                        .insert(name.clone(), Binding::Mono(Ty::InProgressBinding));
                }
                let mut bound = Vec::new();
                self.infer_destructuring(pattern, &declaration.body, &mut bound);

                for (_, name) in &names {
                    self.scopes[index].bindings.remove(name);
                }
                for (_, name, ty) in bound {
                    let scheme = self.generalize(&ty);
                    self.scopes[index]
                        .bindings
                        .insert(name, Binding::Poly(scheme));
                }
            }
        }

        self.lambda_depth = outer_depth;
        self.scopes.extend(inner);
    }

    // References

    fn use_binding(&mut self, pos: usize, binding: Binding<'a>) -> Ty {
        match binding {
            Binding::Mono(Ty::InProgressBinding) => {
                self.report(pos, DiagnosticKind::CyclicDefinition);
                Ty::Unknown
            }
            Binding::Mono(ty) => ty,
            Binding::Poly(scheme) => scheme.instantiate(&mut self.store),
            Binding::Checking {
                scheme,
                has_parameters,
                lambda_depth,
            } => {
                if !has_parameters && self.lambda_depth == lambda_depth {
                    self.report(pos, DiagnosticKind::InfiniteRecursion);
                    Ty::Unknown
                } else {
                    scheme.instantiate(&mut self.store)
                }
            }
            Binding::Active {
                ty,
                has_parameters,
                lambda_depth,
            } => {
                if !has_parameters && self.lambda_depth == lambda_depth {
                    self.report(pos, DiagnosticKind::InfiniteRecursion);
                    Ty::Unknown
                } else {
                    ty
                }
            }
            Binding::Pending { .. } => Ty::Unknown,
        }
    }

    fn reference(&mut self, pos: usize, name: &Ref) -> Ty {
        if name.module.is_none() {
            match self.lookup(&name.name) {
                Some(Binding::Pending {
                    declaration,
                    lambda_depth,
                }) => {
                    self.infer_pending(declaration, lambda_depth);
                    return match self.lookup(&name.name) {
                        Some(binding) => self.use_binding(pos, binding),
                        None => Ty::Unknown,
                    };
                }
                Some(binding) => return self.use_binding(pos, binding),
                None => {}
            }
        }

        let resolve = self.engine.resolve();
        match resolve.resolve_value(name).as_slice() {
            [target] => self.target_type(pos, &name.name, target.clone()),
            targets => {
                trace!(name = %name.name, candidates = targets.len(), "unresolved reference");
                Ty::Unknown
            }
        }
    }

    fn target_type(&mut self, pos: usize, name: &Name, target: ValueTarget<'a>) -> Ty {
        let engine = self.engine;
        match target {
            ValueTarget::Value(declaration) => self.declaration_type(pos, name, declaration),
            ValueTarget::Variant {
                module,
                declaration,
                index,
            } => match engine
                .type_env()
                .union(&module, declaration)
                .variant(index, &mut self.store)
            {
                Some((arguments, ty)) => Ty::function(arguments, ty),
                None => Ty::Unknown,
            },
            ValueTarget::RecordConstructor {
                module,
                declaration,
            } => match engine.type_env().alias(&module, declaration) {
                Some(alias) => {
                    let record = alias.instantiate(&[], &mut self.store);
                    match &record {
                        Ty::Record(fields) => Ty::function(
                            fields.fields.iter().map(|(_, ty)| ty.clone()).collect(),
                            record.clone(),
                        ),
                        _ => Ty::Unknown,
                    }
                }
                None => Ty::Unknown,
            },
            ValueTarget::Port(port) => self.convert_foreign(&port.annotation),
            ValueTarget::External(ty) => Scheme::closed(ty).instantiate(&mut self.store),
        }
    }

    /// The instantiated type of another top-level declaration, or of this one.
    fn declaration_type(&mut self, pos: usize, name: &Name, declaration: &'a ValueDeclaration) -> Ty {
        if self.is_current(declaration) {
            match &declaration.head {
                DeclarationHead::Pattern(_) => self.report(pos, DiagnosticKind::CyclicDefinition),
                DeclarationHead::Function { parameters, .. }
                    if parameters.is_empty() && self.lambda_depth == 0 =>
                {
                    self.report(pos, DiagnosticKind::InfiniteRecursion)
                }
                DeclarationHead::Function { .. } => {}
            }
        } else if self.is_evaluated_cycle(declaration) {
            self.report(pos, DiagnosticKind::InfiniteRecursion);
        }

        if let (Some(annotation), DeclarationHead::Function { .. }) =
            (declaration.annotation(), &declaration.head)
        {
            return self.convert_foreign(annotation);
        }

        let key = declaration_name(declaration);
        if self.engine.is_active(&key) {
            self.recursive.insert(key);
            return Ty::Unknown;
        }

        match self.engine.infer_top_level(declaration) {
            Ok((result, recursive)) => {
                self.recursive.extend(recursive);
                let ty = match &declaration.head {
                    DeclarationHead::Function { .. } => result.ty.clone(),
                    DeclarationHead::Pattern(pattern) => {
                        bound_type(&result, pattern, name).unwrap_or(Ty::Unknown)
                    }
                };
                Scheme::closed(ty).instantiate(&mut self.store)
            }
            Err(error) => {
                trace!(%error, name = %key, "referenced declaration not inferred");
                if error == Error::Cancelled {
                    self.cancelled = true;
                }
                Ty::Unknown
            }
        }
    }

    /// Whether a value reference here makes the current declaration evaluate itself.
    fn is_evaluated_cycle(&self, declaration: &'a ValueDeclaration) -> bool {
        match self.declaration {
            Some(current) if self.lambda_depth == 0 && declaration.parameters().is_empty() => {
                recursion::reaches(self.engine.resolve(), declaration, current)
            }
            _ => false,
        }
    }

    // Expressions

    fn literal_type(&mut self, literal: &Literal) -> Ty {
        match literal {
            Literal::Int(_) => self.store.fresh_var("number"),
            Literal::Float(_) => Ty::float(),
            Literal::Char(_) => Ty::char(),
            Literal::String(_) => Ty::string(),
        }
    }

    pub(crate) fn infer_expr(&mut self, expr: &'a Expr) -> Ty {
        if self.is_cancelled() {
            return Ty::Unknown;
        }
        let ty = match &expr.kind {
            ExprKind::Unit => Ty::Unit,
            ExprKind::Literal(literal) => self.literal_type(literal),
            ExprKind::Var(name) => self.reference(expr.pos, name),
            ExprKind::Operator(operator) => self
                .operator(expr.pos, operator)
                .map_or(Ty::Unknown, |(_, ty)| ty),
            ExprKind::Call { target, arguments } => {
                let target_ty = self.infer_expr(target);
                let arguments: Vec<(usize, Ty)> = arguments
                    .iter()
                    .map(|argument| (argument.pos, self.infer_expr(argument)))
                    .collect();
                self.apply(expr.pos, target_ty, &arguments)
            }
            ExprKind::Binary {
                operands,
                operators,
            } => self.infer_binary(operands, operators),
            ExprKind::Negate(operand) => {
                let ty = self.infer_expr(operand);
                let number = self.store.fresh_var("number");
                self.check(operand.pos, &ty, &number);
                ty
            }
            ExprKind::Tuple(items) => {
                Ty::tuple(items.iter().map(|item| self.infer_expr(item)).collect())
            }
            ExprKind::List(items) => {
                let mut element = None;
                for item in items {
                    self.join(&mut element, item);
                }
                Ty::list(element.unwrap_or_else(|| self.store.fresh_var("a")))
            }
            ExprKind::Record { base: None, fields } => self.infer_record(fields),
            ExprKind::Record {
                base: Some(base),
                fields,
            } => self.infer_update(base, fields),
            ExprKind::FieldAccess { target, field } => {
                let target_ty = self.infer_expr(target);
                match self.field_type(&target_ty, field) {
                    Ok(ty) => ty,
                    Err(FieldError::Missing) => {
                        self.report(
                            field.pos,
                            DiagnosticKind::UnknownField {
                                name: field.item.clone(),
                            },
                        );
                        Ty::Unknown
                    }
                    Err(FieldError::NotARecord) => {
                        let found = self.store.zonk(&target_ty);
                        self.report(target.pos, DiagnosticKind::FieldAccessOnNonRecord { found });
                        Ty::Unknown
                    }
                }
            }
            ExprKind::FieldAccessor(field) => {
                let ty = self.store.fresh_var("a");
                let base = self.store.fresh_var("b");
                let record = Ty::extension(base, vec![(field.clone(), ty.clone())]);
                Ty::function(vec![record], ty)
            }
            ExprKind::If {
                branches,
                otherwise,
            } => {
                let mut result = None;
                for (condition, then) in branches {
                    let condition_ty = self.infer_expr(condition);
                    self.check(condition.pos, &condition_ty, &Ty::bool());
                    self.join(&mut result, then);
                }
                self.join(&mut result, otherwise);
                result.unwrap_or(Ty::Unknown)
            }
            ExprKind::Case {
                scrutinee,
                branches,
            } => self.infer_case(scrutinee, branches),
            ExprKind::Lambda { parameters, body } => self.infer_lambda(parameters, body),
            ExprKind::Let { declarations, body } => self.infer_let(declarations, body),
        };
        self.expression_types.insert(expr.id, ty.clone());
        ty
    }

    /// Infer one of several expressions that must all have the type of the first.
    fn join(&mut self, result: &mut Option<Ty>, expr: &'a Expr) {
        let ty = self.infer_expr(expr);
        match result {
            None => *result = Some(ty),
            Some(first) => {
                let first = first.clone();
                self.check(expr.pos, &ty, &first);
            }
        }
    }

    /**
    Apply a function to already-inferred arguments.

    Arguments are consumed through as many nested function types as it takes. A flexible
    variable in function position becomes a function of the remaining arguments.
    */
    fn apply(&mut self, pos: usize, target: Ty, arguments: &[(usize, Ty)]) -> Ty {
        let mut current = target;
        let mut applied = 0;
        while applied < arguments.len() {
            match self.store.resolve(&current) {
                Ty::Function(function) => {
                    let count = function.parameters.len().min(arguments.len() - applied);
                    for ((argument_pos, argument), parameter) in arguments
                        [applied..applied + count]
                        .iter()
                        .zip(function.parameters.iter())
                    {
                        self.check(*argument_pos, argument, parameter);
                    }
                    applied += count;
                    current = function.partially_apply(count);
                }
                Ty::Var(var) if !var.rigid => {
                    let parameters = arguments[applied..]
                        .iter()
                        .map(|_| self.store.fresh_var("a"))
                        .collect();
                    let ret = self.store.fresh_var("b");
                    let function = Ty::function(parameters, ret);
                    if !self.check(pos, &current, &function) {
                        return Ty::Unknown;
                    }
                }
                Ty::Unknown | Ty::InProgressBinding => return Ty::Unknown,
                _ => {
                    self.report(
                        pos,
                        DiagnosticKind::ArgumentCount {
                            actual: arguments.len(),
                            expected: applied,
                        },
                    );
                    return Ty::Unknown;
                }
            }
        }
        current
    }

    fn operator(&mut self, pos: usize, operator: &Name) -> Option<(Precedence, Ty)> {
        let resolve = self.engine.resolve();
        match resolve.resolve_operator(operator).as_slice() {
            [target] => Some((
                target.precedence,
                self.target_type(pos, operator, target.function.clone()),
            )),
            targets => {
                trace!(%operator, candidates = targets.len(), "unresolved operator");
                None
            }
        }
    }

    fn infer_binary(&mut self, operands: &'a [Expr], operators: &'a [Spanned<Name>]) -> Ty {
        let operands: Vec<(usize, Ty)> = operands
            .iter()
            .map(|operand| (operand.pos, self.infer_expr(operand)))
            .collect();
        let mut precedences = Vec::with_capacity(operators.len());
        let mut functions = Vec::with_capacity(operators.len());
        for operator in operators {
            match self.operator(operator.pos, &operator.item) {
                Some((precedence, ty)) => {
                    precedences.push(precedence);
                    functions.push(ty);
                }
                None => return Ty::Unknown,
            }
        }

        match operator::parse(&precedences) {
            Ok(tree) => self.apply_tree(&tree, &operands, &functions).1,
            Err(operator::Error::NonAssociative { operator }) => {
                self.report(
                    operators[operator].pos,
                    DiagnosticKind::NonAssociativeOperator {
                        operator: operators[operator].item.clone(),
                    },
                );
                Ty::Unknown
            }
            Err(operator::Error::MixedAssociativity { left, right }) => {
                self.report(
                    operators[right].pos,
                    DiagnosticKind::MixedAssociativity {
                        left: operators[left].item.clone(),
                        right: operators[right].item.clone(),
                    },
                );
                Ty::Unknown
            }
        }
    }

    fn apply_tree(
        &mut self,
        tree: &BinaryTree,
        operands: &[(usize, Ty)],
        functions: &[Ty],
    ) -> (usize, Ty) {
        match tree {
            BinaryTree::Operand(index) => operands[*index].clone(),
            BinaryTree::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.apply_tree(left, operands, functions);
                let right = self.apply_tree(right, operands, functions);
                let pos = left.0;
                let ty = self.apply(pos, functions[*operator].clone(), &[left, right]);
                (pos, ty)
            }
        }
    }

    fn infer_record(&mut self, fields: &'a [FieldAssignment]) -> Ty {
        let mut references = FieldReferenceTable::new();
        let fields = fields
            .iter()
            .map(|field| {
                references.add(&field.name.item, field.name.pos);
                (field.name.item.clone(), self.infer_expr(&field.value))
            })
            .collect();
        Ty::record_with(fields, None, references.freeze())
    }

    fn infer_update(&mut self, base: &Spanned<Name>, fields: &'a [FieldAssignment]) -> Ty {
        let base_ty = self.reference(
            base.pos,
            &Ref {
                module: None,
                name: base.item.clone(),
            },
        );
        let mut is_record = true;
        for field in fields {
            let value = self.infer_expr(&field.value);
            if !is_record {
                continue;
            }
            match self.field_type(&base_ty, &field.name) {
                Ok(field_ty) => {
                    self.check(field.value.pos, &value, &field_ty);
                }
                Err(FieldError::Missing) => self.report(
                    field.name.pos,
                    DiagnosticKind::UnknownField {
                        name: field.name.item.clone(),
                    },
                ),
                Err(FieldError::NotARecord) => {
                    let found = self.store.zonk(&base_ty);
                    self.report(base.pos, DiagnosticKind::TypeMustBeRecord { found });
                    is_record = false;
                }
            }
        }
        base_ty
    }

    /// A new mutable record `{ b | field : a }`, and `a`.
    fn open_record(&mut self, field: &Spanned<Name>) -> (Ty, Ty) {
        let ty = self.store.fresh_var("a");
        let base = self.store.fresh_var("b");
        let record = self
            .store
            .new_record(vec![(field.item.clone(), ty.clone())], base);
        if let Ty::MutableRecord(id) = record {
            self.store.add_reference(id, &field.item, field.pos);
        }
        (record, ty)
    }

    /**
    The type of a record's field.

    Records that end in a flexible variable gain the field when they don't have it yet.
    */
    fn field_type(&mut self, record: &Ty, field: &Spanned<Name>) -> Result<Ty, FieldError> {
        let resolved = self.store.resolve(record);
        match &resolved {
            Ty::Unknown | Ty::InProgressBinding => Ok(Ty::Unknown),
            Ty::Var(var) if !var.rigid && var.typeclass().is_none() => {
                let (grown, ty) = self.open_record(field);
                self.store.bind(var, grown);
                Ok(ty)
            }
            Ty::Record(_) | Ty::MutableRecord(_) => {
                let flattened = self.store.flatten(&resolved);
                if let Some(ty) = flattened.field(&field.item) {
                    let ty = ty.clone();
                    if let Ty::MutableRecord(id) = resolved {
                        self.store.add_reference(id, &field.item, field.pos);
                    }
                    return Ok(ty);
                }
                match flattened.tail {
                    Tail::Unknown => Ok(Ty::Unknown),
                    Tail::Open(var) if !var.rigid => match resolved {
                        Ty::MutableRecord(id)
                            if self.store.open_base(id).map(|base| base.id) == Some(var.id) =>
                        {
                            let ty = self.store.fresh_var("a");
                            match self
                                .store
                                .insert_field(id, &field.item, ty.clone(), Some(field.pos))
                            {
                                Ok(()) => Ok(ty),
                                Err(_) => Ok(Ty::Unknown),
                            }
                        }
                        _ => {
                            let (grown, ty) = self.open_record(field);
                            self.store.bind(&var, grown);
                            Ok(ty)
                        }
                    },
                    Tail::Open(_) | Tail::Closed => Err(FieldError::Missing),
                }
            }
            _ => Err(FieldError::NotARecord),
        }
    }

    fn infer_case(&mut self, scrutinee: &'a Expr, branches: &'a [CaseBranch]) -> Ty {
        let scrutinee_ty = self.infer_expr(scrutinee);
        let mut result = None;
        for branch in branches {
            self.scopes.push(Scope::default());
            let mut bound = Vec::new();
            self.infer_pattern(&branch.pattern, &scrutinee_ty, PatternContext::Case, &mut bound);
            self.bind_all(bound, &mut FnvHashSet::default());
            self.join(&mut result, &branch.body);
            self.scopes.pop();
        }
        result.unwrap_or(Ty::Unknown)
    }

    fn infer_lambda(&mut self, parameters: &'a [Pattern], body: &'a Expr) -> Ty {
        let parameter_types: Vec<Ty> = parameters
            .iter()
            .map(|_| self.store.fresh_var("a"))
            .collect();
        self.scopes.push(Scope::default());
        let mut bound = Vec::new();
        for (parameter, ty) in parameters.iter().zip(&parameter_types) {
            self.infer_pattern(parameter, ty, PatternContext::Parameter, &mut bound);
        }
        self.bind_all(bound, &mut FnvHashSet::default());

        self.lambda_depth += 1;
        let body_ty = self.infer_expr(body);
        self.lambda_depth -= 1;
        self.scopes.pop();
        Ty::function(parameter_types, body_ty)
    }
}

/// The parameters of a function type, including those of the functions it returns.
fn function_parameters(ty: &Ty) -> Vec<Ty> {
    let mut parameters = Vec::new();
    let mut current = ty;
    while let Ty::Function(function) = current {
        parameters.extend(function.parameters.iter().cloned());
        current = &function.ret;
    }
    parameters
}

/// The type left after applying `count` arguments to `ty`.
fn apply_parameters(ty: &Ty, mut count: usize) -> Ty {
    let mut current = ty.clone();
    while count > 0 {
        let applied = match &current {
            Ty::Function(function) if !function.parameters.is_empty() => {
                let applied = function.parameters.len().min(count);
                count -= applied;
                function.partially_apply(applied)
            }
            _ => break,
        };
        current = applied;
    }
    current
}
