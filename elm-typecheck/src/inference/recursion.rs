//! Top-level values that are evaluated while they are being defined.

use crate::resolve::{Resolve, ValueTarget};
use elm_core::Name;
use elm_syntax::{Expr, ExprKind, Ref, ValueDeclaration};
use fnv::FnvHashSet;

/**
Whether evaluating `start` evaluates `target`.

Only references outside lambdas and function bodies count, and only to top-level declarations
without parameters.
*/
pub(crate) fn reaches<'a, R: Resolve + ?Sized>(
    resolve: &'a R,
    start: &'a ValueDeclaration,
    target: &ValueDeclaration,
) -> bool {
    let mut visited: FnvHashSet<*const ValueDeclaration> = FnvHashSet::default();
    let mut stack = vec![start];
    while let Some(declaration) = stack.pop() {
        if std::ptr::eq(declaration, target) {
            return true;
        }
        if !declaration.parameters().is_empty() || !visited.insert(declaration as *const _) {
            continue;
        }
        let mut walker = Walker {
            resolve,
            locals: Vec::new(),
            found: Vec::new(),
        };
        walker.expr(&declaration.body);
        stack.extend(walker.found);
    }
    false
}

struct Walker<'a, R: Resolve + ?Sized> {
    resolve: &'a R,
    locals: Vec<Name>,
    found: Vec<&'a ValueDeclaration>,
}

impl<'a, R: Resolve + ?Sized> Walker<'a, R> {
    fn reference(&mut self, name: &Ref) {
        if name.module.is_none() && self.locals.contains(&name.name) {
            return;
        }
        let resolve: &'a R = self.resolve;
        if let [ValueTarget::Value(declaration)] = resolve.resolve_value(name).as_slice() {
            if declaration.parameters().is_empty() {
                self.found.push(*declaration);
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Unit
            | ExprKind::Literal(_)
            | ExprKind::Operator(_)
            | ExprKind::FieldAccessor(_)
            | ExprKind::Lambda { .. } => {}
            ExprKind::Var(name) => self.reference(name),
            ExprKind::Call { target, arguments } => {
                self.expr(target);
                arguments.iter().for_each(|argument| self.expr(argument));
            }
            ExprKind::Binary { operands, .. } => {
                operands.iter().for_each(|operand| self.expr(operand))
            }
            ExprKind::Negate(inner) => self.expr(inner),
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                items.iter().for_each(|item| self.expr(item))
            }
            ExprKind::Record { base, fields } => {
                if let Some(base) = base {
                    self.reference(&Ref {
                        module: None,
                        name: base.item.clone(),
                    });
                }
                fields.iter().for_each(|field| self.expr(&field.value));
            }
            ExprKind::FieldAccess { target, .. } => self.expr(target),
            ExprKind::If {
                branches,
                otherwise,
            } => {
                for (condition, then) in branches {
                    self.expr(condition);
                    self.expr(then);
                }
                self.expr(otherwise);
            }
            ExprKind::Case {
                scrutinee,
                branches,
            } => {
                self.expr(scrutinee);
                for branch in branches {
                    let outer = self.locals.len();
                    self.locals
                        .extend(branch.pattern.bound_names().into_iter().map(|(_, name)| name));
                    self.expr(&branch.body);
                    self.locals.truncate(outer);
                }
            }
            ExprKind::Let { declarations, body } => {
                let outer = self.locals.len();
                for declaration in declarations {
                    self.locals
                        .extend(declaration.bound_names().into_iter().map(|(_, name)| name));
                }
                for declaration in declarations {
                    if declaration.parameters().is_empty() {
                        self.expr(&declaration.body);
                    }
                }
                self.expr(body);
                self.locals.truncate(outer);
            }
        }
    }
}
