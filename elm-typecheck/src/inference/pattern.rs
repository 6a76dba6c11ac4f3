use super::Inference;
use crate::{
    diagnostic::DiagnosticKind,
    generalization::Scheme,
    resolve::{Resolve, ValueTarget},
    unification::{self, Bindings},
    InferenceResult,
};
use elm_core::{FieldReferenceTable, Name, Ty};
use elm_syntax::{Pattern, PatternKind, Ref};

/// Where a pattern appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PatternContext {
    /// Function and lambda parameters.
    Parameter,
    /// The left-hand side of a destructuring declaration.
    Declaration,
    Case,
}

impl PatternContext {
    /// Patterns outside of `case` can't fall through to another branch.
    fn must_be_total(self) -> bool {
        match self {
            PatternContext::Parameter | PatternContext::Declaration => true,
            PatternContext::Case => false,
        }
    }
}

/// Names bound by a pattern, with their positions and types.
pub(super) type Bound = Vec<(usize, Name, Ty)>;

/**
The type a destructuring declaration gave to one of its names.

Works on a frozen result: every pattern node's type was recorded when it was checked.
*/
pub(super) fn bound_type(result: &InferenceResult, pattern: &Pattern, name: &Name) -> Option<Ty> {
    match &pattern.kind {
        PatternKind::Var(var) if var == name => result.ty_of(pattern.id).cloned(),
        PatternKind::Record(fields) => {
            let record = result.ty_of(pattern.id)?;
            if !fields.iter().any(|field| field.item == *name) {
                return None;
            }
            match record {
                Ty::Record(record) => record.field(name).cloned(),
                _ => Some(Ty::Unknown),
            }
        }
        PatternKind::Alias {
            pattern: inner,
            name: alias,
        } => {
            if alias.item == *name {
                result.ty_of(pattern.id).cloned()
            } else {
                bound_type(result, inner, name)
            }
        }
        PatternKind::Tuple(items) | PatternKind::List(items) | PatternKind::Cons(items) => items
            .iter()
            .find_map(|item| bound_type(result, item, name)),
        PatternKind::Constructor { arguments, .. } => arguments
            .iter()
            .find_map(|argument| bound_type(result, argument, name)),
        PatternKind::Anything | PatternKind::Var(_) | PatternKind::Unit | PatternKind::Literal(_) => {
            None
        }
    }
}

impl<'e, 'a, R: Resolve + ?Sized> Inference<'e, 'a, R> {
    fn check_pattern(&mut self, pos: usize, pattern_type: &Ty, expected: &Ty) -> bool {
        match self.store.unify(pattern_type, expected) {
            Ok(()) => true,
            Err(unification::Error::InfiniteType) => {
                self.report(pos, DiagnosticKind::InfiniteType);
                false
            }
            Err(error) => {
                let record_diff = match error {
                    unification::Error::Record(diff) => {
                        Some(diff.map_types(&|ty| self.store.zonk(ty)))
                    }
                    _ => None,
                };
                let kind = DiagnosticKind::InvalidPattern {
                    pattern_type: self.store.zonk(pattern_type),
                    required_type: self.store.zonk(expected),
                    record_diff,
                };
                self.report(pos, kind);
                false
            }
        }
    }

    fn partial(&mut self, pattern: &Pattern, context: PatternContext) {
        if context.must_be_total() {
            self.report(pattern.pos, DiagnosticKind::PartialPattern);
        }
    }

    /// A constructor's argument types and the type it constructs.
    fn constructor(&mut self, name: &Ref) -> Option<(Vec<Ty>, Ty)> {
        let engine = self.engine;
        match engine.resolve().resolve_value(name).as_slice() {
            [ValueTarget::Variant {
                module,
                declaration,
                index,
            }] => engine
                .type_env()
                .union(module, declaration)
                .variant(*index, &mut self.store),
            [ValueTarget::External(ty)] => match Scheme::closed(ty.clone()).instantiate(&mut self.store) {
                Ty::Function(function) => Some((function.parameters.clone(), function.ret.clone())),
                ty => Some((Vec::new(), ty)),
            },
            _ => None,
        }
    }

    fn infer_patterns(
        &mut self,
        patterns: &'a [Pattern],
        types: Option<&[Ty]>,
        context: PatternContext,
        bound: &mut Bound,
    ) {
        for (ix, pattern) in patterns.iter().enumerate() {
            let ty = types
                .and_then(|types| types.get(ix))
                .cloned()
                .unwrap_or(Ty::Unknown);
            self.infer_pattern(pattern, &ty, context, bound);
        }
    }

    /**
    Check a pattern against the type of the value it matches, and collect the names it binds.

    Subpatterns of a pattern that doesn't fit are checked against [`Ty::Unknown`], so one
    mistake is reported once.
    */
    pub(super) fn infer_pattern(
        &mut self,
        pattern: &'a Pattern,
        expected: &Ty,
        context: PatternContext,
        bound: &mut Bound,
    ) {
        match &pattern.kind {
            PatternKind::Anything => {}
            PatternKind::Var(name) => bound.push((pattern.pos, name.clone(), expected.clone())),
            PatternKind::Unit => {
                self.check_pattern(pattern.pos, &Ty::Unit, expected);
            }
            PatternKind::Literal(literal) => {
                self.partial(pattern, context);
                let ty = self.literal_type(literal);
                self.check_pattern(pattern.pos, &ty, expected);
            }
            PatternKind::Tuple(items) => {
                let types: Vec<Ty> = items.iter().map(|_| self.store.fresh_var("a")).collect();
                let fits = self.check_pattern(pattern.pos, &Ty::tuple(types.clone()), expected);
                self.infer_patterns(items, fits.then_some(types.as_slice()), context, bound);
            }
            PatternKind::List(items) => {
                self.partial(pattern, context);
                let element = self.store.fresh_var("a");
                let fits = self.check_pattern(pattern.pos, &Ty::list(element.clone()), expected);
                let types = vec![element; items.len()];
                self.infer_patterns(items, fits.then_some(types.as_slice()), context, bound);
            }
            PatternKind::Cons(parts) => {
                self.partial(pattern, context);
                let element = self.store.fresh_var("a");
                let list = Ty::list(element.clone());
                let fits = self.check_pattern(pattern.pos, &list, expected);
                let mut types = vec![element; parts.len().saturating_sub(1)];
                types.push(list);
                self.infer_patterns(parts, fits.then_some(types.as_slice()), context, bound);
            }
            PatternKind::Record(fields) => {
                let mut references = FieldReferenceTable::new();
                let types: Vec<(Name, Ty)> = fields
                    .iter()
                    .map(|field| {
                        references.add(&field.item, field.pos);
                        (field.item.clone(), self.store.fresh_var("a"))
                    })
                    .collect();
                let base = self.store.fresh_var("b");
                let record = Ty::record_with(types.clone(), Some(base), references.freeze());
                let fits = self.check_pattern(pattern.pos, &record, expected);
                for (field, (_, ty)) in fields.iter().zip(types) {
                    let ty = if fits { ty } else { Ty::Unknown };
                    bound.push((field.pos, field.item.clone(), ty));
                }
            }
            PatternKind::Constructor { name, arguments } => match self.constructor(name) {
                None => self.infer_patterns(arguments, None, context, bound),
                Some((parameters, ty)) => {
                    if parameters.len() != arguments.len() {
                        self.report(
                            pattern.pos,
                            DiagnosticKind::TypeArgumentCount {
                                actual: arguments.len(),
                                expected: parameters.len(),
                            },
                        );
                        self.infer_patterns(arguments, None, context, bound);
                    } else {
                        let fits = self.check_pattern(pattern.pos, &ty, expected);
                        let types = fits.then_some(parameters.as_slice());
                        self.infer_patterns(arguments, types, context, bound);
                    }
                }
            },
            PatternKind::Alias {
                pattern: inner,
                name,
            } => {
                self.infer_pattern(inner, expected, context, bound);
                bound.push((name.pos, name.item.clone(), expected.clone()));
            }
        }
        self.expression_types.insert(pattern.id, expected.clone());
    }
}
