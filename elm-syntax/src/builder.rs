//! Programmatic construction of syntax trees.
//!
//! Every node gets a fresh [`NodeId`] and a strictly increasing position, so
//! diagnostics produced for a built tree sort in construction order.

use crate::{
    Associativity, CaseBranch, Declaration, DeclarationHead, Expr, ExprKind, FieldAssignment,
    FieldType, InfixDeclaration, Literal, Module, Name, NodeId, Pattern, PatternKind,
    PortAnnotation, Ref, Spanned, TypeAliasDeclaration, TypeDeclaration, TypeExpr, TypeExprKind,
    ValueDeclaration, Variant,
};

#[derive(Debug, Default)]
pub struct Builder {
    next_id: u32,
    next_pos: usize,
}

fn reference(name: &str) -> Ref {
    match name.rsplit_once('.') {
        Some((module, name)) if !module.is_empty() && !name.is_empty() => {
            Ref::qualified(module, name)
        }
        _ => Ref::unqualified(name),
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    fn pos(&mut self) -> usize {
        let pos = self.next_pos;
        self.next_pos += 1;
        pos
    }

    fn id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn spanned(&mut self, name: &str) -> Spanned<Name> {
        Spanned {
            pos: self.pos(),
            item: Name::from(name),
        }
    }

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.id(),
            pos: self.pos(),
            kind,
        }
    }

    pub fn pattern(&mut self, kind: PatternKind) -> Pattern {
        Pattern {
            id: self.id(),
            pos: self.pos(),
            kind,
        }
    }

    pub fn type_expr(&mut self, kind: TypeExprKind) -> TypeExpr {
        TypeExpr {
            pos: self.pos(),
            kind,
        }
    }

    // Expressions

    pub fn unit(&mut self) -> Expr {
        self.expr(ExprKind::Unit)
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Float(value)))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::Literal(Literal::String(String::from(value))))
    }

    pub fn char(&mut self, value: char) -> Expr {
        self.expr(ExprKind::Literal(Literal::Char(value)))
    }

    /// A value reference. `"Maybe.Just"` produces a qualified reference.
    pub fn var(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Var(reference(name)))
    }

    pub fn operator(&mut self, op: &str) -> Expr {
        self.expr(ExprKind::Operator(Name::from(op)))
    }

    pub fn call(&mut self, target: Expr, arguments: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            target: Box::new(target),
            arguments,
        })
    }

    /// `first op1 e1 op2 e2 ...`
    pub fn binary(&mut self, first: Expr, rest: Vec<(&str, Expr)>) -> Expr {
        let mut operands = vec![first];
        let mut operators = Vec::with_capacity(rest.len());
        for (op, operand) in rest {
            operators.push(self.spanned(op));
            operands.push(operand);
        }
        self.expr(ExprKind::Binary {
            operands,
            operators,
        })
    }

    pub fn negate(&mut self, expr: Expr) -> Expr {
        self.expr(ExprKind::Negate(Box::new(expr)))
    }

    pub fn tuple(&mut self, items: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Tuple(items))
    }

    pub fn list(&mut self, items: Vec<Expr>) -> Expr {
        self.expr(ExprKind::List(items))
    }

    pub fn record(&mut self, fields: Vec<(&str, Expr)>) -> Expr {
        let fields = self.field_assignments(fields);
        self.expr(ExprKind::Record { base: None, fields })
    }

    /// `{ base | field = value, ... }`
    pub fn update(&mut self, base: &str, fields: Vec<(&str, Expr)>) -> Expr {
        let base = Some(self.spanned(base));
        let fields = self.field_assignments(fields);
        self.expr(ExprKind::Record { base, fields })
    }

    fn field_assignments(&mut self, fields: Vec<(&str, Expr)>) -> Vec<FieldAssignment> {
        fields
            .into_iter()
            .map(|(name, value)| FieldAssignment {
                name: self.spanned(name),
                value,
            })
            .collect()
    }

    pub fn access(&mut self, target: Expr, field: &str) -> Expr {
        let field = self.spanned(field);
        self.expr(ExprKind::FieldAccess {
            target: Box::new(target),
            field,
        })
    }

    pub fn accessor(&mut self, field: &str) -> Expr {
        self.expr(ExprKind::FieldAccessor(Name::from(field)))
    }

    pub fn if_(&mut self, condition: Expr, then: Expr, otherwise: Expr) -> Expr {
        self.expr(ExprKind::If {
            branches: vec![(condition, then)],
            otherwise: Box::new(otherwise),
        })
    }

    pub fn case(&mut self, scrutinee: Expr, branches: Vec<(Pattern, Expr)>) -> Expr {
        self.expr(ExprKind::Case {
            scrutinee: Box::new(scrutinee),
            branches: branches
                .into_iter()
                .map(|(pattern, body)| CaseBranch { pattern, body })
                .collect(),
        })
    }

    pub fn lambda(&mut self, parameters: Vec<Pattern>, body: Expr) -> Expr {
        self.expr(ExprKind::Lambda {
            parameters,
            body: Box::new(body),
        })
    }

    pub fn let_(&mut self, declarations: Vec<ValueDeclaration>, body: Expr) -> Expr {
        self.expr(ExprKind::Let {
            declarations,
            body: Box::new(body),
        })
    }

    // Patterns

    pub fn p_any(&mut self) -> Pattern {
        self.pattern(PatternKind::Anything)
    }

    pub fn p_var(&mut self, name: &str) -> Pattern {
        self.pattern(PatternKind::Var(Name::from(name)))
    }

    pub fn p_unit(&mut self) -> Pattern {
        self.pattern(PatternKind::Unit)
    }

    pub fn p_int(&mut self, value: i64) -> Pattern {
        self.pattern(PatternKind::Literal(Literal::Int(value)))
    }

    pub fn p_string(&mut self, value: &str) -> Pattern {
        self.pattern(PatternKind::Literal(Literal::String(String::from(value))))
    }

    pub fn p_tuple(&mut self, items: Vec<Pattern>) -> Pattern {
        self.pattern(PatternKind::Tuple(items))
    }

    pub fn p_list(&mut self, items: Vec<Pattern>) -> Pattern {
        self.pattern(PatternKind::List(items))
    }

    pub fn p_cons(&mut self, parts: Vec<Pattern>) -> Pattern {
        self.pattern(PatternKind::Cons(parts))
    }

    pub fn p_record(&mut self, fields: &[&str]) -> Pattern {
        let fields = fields.iter().map(|field| self.spanned(field)).collect();
        self.pattern(PatternKind::Record(fields))
    }

    pub fn p_ctor(&mut self, name: &str, arguments: Vec<Pattern>) -> Pattern {
        self.pattern(PatternKind::Constructor {
            name: reference(name),
            arguments,
        })
    }

    pub fn p_as(&mut self, pattern: Pattern, name: &str) -> Pattern {
        let name = self.spanned(name);
        self.pattern(PatternKind::Alias {
            pattern: Box::new(pattern),
            name,
        })
    }

    // Type expressions

    pub fn t_var(&mut self, name: &str) -> TypeExpr {
        self.type_expr(TypeExprKind::Var(Name::from(name)))
    }

    pub fn t_ref(&mut self, name: &str, arguments: Vec<TypeExpr>) -> TypeExpr {
        self.type_expr(TypeExprKind::Ref {
            name: reference(name),
            arguments,
        })
    }

    pub fn t_unit(&mut self) -> TypeExpr {
        self.type_expr(TypeExprKind::Unit)
    }

    pub fn t_tuple(&mut self, items: Vec<TypeExpr>) -> TypeExpr {
        self.type_expr(TypeExprKind::Tuple(items))
    }

    pub fn t_record(&mut self, fields: Vec<(&str, TypeExpr)>) -> TypeExpr {
        let fields = self.field_types(fields);
        self.type_expr(TypeExprKind::Record { base: None, fields })
    }

    /// `{ base | field : ty, ... }`
    pub fn t_extension(&mut self, base: &str, fields: Vec<(&str, TypeExpr)>) -> TypeExpr {
        let fields = self.field_types(fields);
        self.type_expr(TypeExprKind::Record {
            base: Some(Name::from(base)),
            fields,
        })
    }

    fn field_types(&mut self, fields: Vec<(&str, TypeExpr)>) -> Vec<FieldType> {
        fields
            .into_iter()
            .map(|(name, ty)| FieldType {
                pos: self.pos(),
                name: Name::from(name),
                ty,
            })
            .collect()
    }

    /// `a -> b -> c`
    pub fn t_fn(&mut self, segments: Vec<TypeExpr>) -> TypeExpr {
        self.type_expr(TypeExprKind::Function(segments))
    }

    // Declarations

    pub fn function(&mut self, name: &str, parameters: Vec<Pattern>, body: Expr) -> ValueDeclaration {
        ValueDeclaration {
            pos: self.pos(),
            annotation: None,
            head: DeclarationHead::Function {
                name: self.spanned(name),
                parameters,
            },
            body,
        }
    }

    pub fn annotated(
        &mut self,
        name: &str,
        annotation: TypeExpr,
        parameters: Vec<Pattern>,
        body: Expr,
    ) -> ValueDeclaration {
        let mut decl = self.function(name, parameters, body);
        decl.annotation = Some(annotation);
        decl
    }

    pub fn destructure(&mut self, pattern: Pattern, body: Expr) -> ValueDeclaration {
        ValueDeclaration {
            pos: self.pos(),
            annotation: None,
            head: DeclarationHead::Pattern(pattern),
            body,
        }
    }

    pub fn type_decl(
        &mut self,
        name: &str,
        parameters: &[&str],
        variants: Vec<(&str, Vec<TypeExpr>)>,
    ) -> TypeDeclaration {
        TypeDeclaration {
            pos: self.pos(),
            name: Name::from(name),
            parameters: parameters.iter().map(|param| Name::from(*param)).collect(),
            variants: variants
                .into_iter()
                .map(|(name, arguments)| Variant {
                    pos: self.pos(),
                    name: Name::from(name),
                    arguments,
                })
                .collect(),
        }
    }

    pub fn alias(&mut self, name: &str, parameters: &[&str], aliased: TypeExpr) -> TypeAliasDeclaration {
        TypeAliasDeclaration {
            pos: self.pos(),
            name: Name::from(name),
            parameters: parameters.iter().map(|param| Name::from(*param)).collect(),
            aliased,
        }
    }

    pub fn infix(
        &mut self,
        operator: &str,
        associativity: Associativity,
        precedence: u8,
        function: &str,
    ) -> InfixDeclaration {
        InfixDeclaration {
            pos: self.pos(),
            operator: Name::from(operator),
            associativity,
            precedence,
            function: reference(function),
        }
    }

    pub fn port(&mut self, name: &str, annotation: TypeExpr) -> PortAnnotation {
        PortAnnotation {
            pos: self.pos(),
            name: Name::from(name),
            annotation,
        }
    }
}

pub fn module(name: &str, declarations: Vec<Declaration>) -> Module {
    Module {
        name: Name::from(name),
        declarations,
    }
}
