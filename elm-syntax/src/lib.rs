#![deny(unused_crate_dependencies)]


pub mod builder;

use fnv::FnvHasher;
use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

pub type Name = Arc<str>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Spanned<A> {
    pub pos: usize,
    pub item: A,
}

impl<A> Spanned<A> {
    pub fn map<B>(&self, f: impl FnOnce(&A) -> B) -> Spanned<B> {
        Spanned {
            pos: self.pos,
            item: f(&self.item),
        }
    }
}

/// Identity of an expression or pattern node within a module.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct NodeId(pub u32);

/// A possibly-qualified reference, e.g. `Maybe.Just` or `x`.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Ref {
    pub module: Option<Name>,
    pub name: Name,
}

impl Ref {
    pub fn unqualified(name: &str) -> Self {
        Ref {
            module: None,
            name: Name::from(name),
        }
    }

    pub fn qualified(module: &str, name: &str) -> Self {
        Ref {
            module: Some(Name::from(module)),
            name: Name::from(name),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Char(char),
    String(String),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Associativity {
    Left,
    Right,
    Non,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Module {
    pub name: Name,
    pub declarations: Vec<Declaration>,
}

impl Module {
    pub fn value_declarations(&self) -> impl Iterator<Item = &ValueDeclaration> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Value(value) => Some(value),
            _ => None,
        })
    }

    /// Find a top-level function or value declaration by name.
    pub fn value(&self, name: &str) -> Option<&ValueDeclaration> {
        self.value_declarations()
            .find(|decl| decl.name().map_or(false, |decl_name| decl_name.as_ref() == name))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Declaration {
    Value(ValueDeclaration),
    Type(TypeDeclaration),
    TypeAlias(TypeAliasDeclaration),
    Infix(InfixDeclaration),
    Port(PortAnnotation),
}

/**
A function, value, or pattern declaration, at the top level or inside a `let`.

```text
name : annotation
name p1 p2 = body

( x, y ) = body
```
*/
#[derive(Debug, PartialEq, Clone)]
pub struct ValueDeclaration {
    pub pos: usize,
    pub annotation: Option<TypeExpr>,
    pub head: DeclarationHead,
    pub body: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub enum DeclarationHead {
    Function {
        name: Spanned<Name>,
        parameters: Vec<Pattern>,
    },
    Pattern(Pattern),
}

impl ValueDeclaration {
    pub fn name(&self) -> Option<&Name> {
        match &self.head {
            DeclarationHead::Function { name, .. } => Some(&name.item),
            DeclarationHead::Pattern(_) => None,
        }
    }

    pub fn parameters(&self) -> &[Pattern] {
        match &self.head {
            DeclarationHead::Function { parameters, .. } => parameters,
            DeclarationHead::Pattern(_) => &[],
        }
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    pub fn annotation(&self) -> Option<&TypeExpr> {
        self.annotation.as_ref()
    }

    /// Names bound by this declaration: its own name, or every name in its pattern.
    pub fn bound_names(&self) -> Vec<(usize, Name)> {
        match &self.head {
            DeclarationHead::Function { name, .. } => vec![(name.pos, name.item.clone())],
            DeclarationHead::Pattern(pattern) => pattern.bound_names(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct TypeDeclaration {
    pub pos: usize,
    pub name: Name,
    pub parameters: Vec<Name>,
    pub variants: Vec<Variant>,
}

impl TypeDeclaration {
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Variant {
    pub pos: usize,
    pub name: Name,
    pub arguments: Vec<TypeExpr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TypeAliasDeclaration {
    pub pos: usize,
    pub name: Name,
    pub parameters: Vec<Name>,
    pub aliased: TypeExpr,
}

impl TypeAliasDeclaration {
    pub fn aliased_type(&self) -> &TypeExpr {
        &self.aliased
    }
}

/// `infix left 6 (+) = add`
#[derive(Debug, PartialEq, Clone)]
pub struct InfixDeclaration {
    pub pos: usize,
    pub operator: Name,
    pub associativity: Associativity,
    pub precedence: u8,
    pub function: Ref,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PortAnnotation {
    pub pos: usize,
    pub name: Name,
    pub annotation: TypeExpr,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub pos: usize,
    pub kind: ExprKind,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExprKind {
    Unit,
    Literal(Literal),
    /// A lower- or upper-case value reference.
    Var(Ref),
    /// An operator used as a function, `(+)`.
    Operator(Name),
    Call {
        target: Box<Expr>,
        arguments: Vec<Expr>,
    },
    /// An un-associated operator chain; `operands.len() == operators.len() + 1`.
    Binary {
        operands: Vec<Expr>,
        operators: Vec<Spanned<Name>>,
    },
    Negate(Box<Expr>),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Record {
        base: Option<Spanned<Name>>,
        fields: Vec<FieldAssignment>,
    },
    FieldAccess {
        target: Box<Expr>,
        field: Spanned<Name>,
    },
    /// `.field`
    FieldAccessor(Name),
    If {
        branches: Vec<(Expr, Expr)>,
        otherwise: Box<Expr>,
    },
    Case {
        scrutinee: Box<Expr>,
        branches: Vec<CaseBranch>,
    },
    Lambda {
        parameters: Vec<Pattern>,
        body: Box<Expr>,
    },
    Let {
        declarations: Vec<ValueDeclaration>,
        body: Box<Expr>,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct FieldAssignment {
    pub name: Spanned<Name>,
    pub value: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CaseBranch {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Pattern {
    pub id: NodeId,
    pub pos: usize,
    pub kind: PatternKind,
}

#[derive(Debug, PartialEq, Clone)]
pub enum PatternKind {
    Anything,
    Var(Name),
    Unit,
    Literal(Literal),
    Tuple(Vec<Pattern>),
    List(Vec<Pattern>),
    /// `a :: b :: rest`
    Cons(Vec<Pattern>),
    Record(Vec<Spanned<Name>>),
    Constructor {
        name: Ref,
        arguments: Vec<Pattern>,
    },
    Alias {
        pattern: Box<Pattern>,
        name: Spanned<Name>,
    },
}

impl Pattern {
    /// Every name this pattern binds, with its position, in source order.
    pub fn bound_names(&self) -> Vec<(usize, Name)> {
        fn go(pattern: &Pattern, names: &mut Vec<(usize, Name)>) {
            match &pattern.kind {
                PatternKind::Anything | PatternKind::Unit | PatternKind::Literal(_) => {}
                PatternKind::Var(name) => names.push((pattern.pos, name.clone())),
                PatternKind::Tuple(items) | PatternKind::List(items) | PatternKind::Cons(items) => {
                    items.iter().for_each(|item| go(item, names))
                }
                PatternKind::Record(fields) => names.extend(
                    fields
                        .iter()
                        .map(|field| (field.pos, field.item.clone())),
                ),
                PatternKind::Constructor { arguments, .. } => {
                    arguments.iter().for_each(|argument| go(argument, names))
                }
                PatternKind::Alias { pattern, name } => {
                    go(pattern, names);
                    names.push((name.pos, name.item.clone()));
                }
            }
        }

        let mut names = Vec::new();
        go(self, &mut names);
        names
    }
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub pos: usize,
    pub kind: TypeExprKind,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum TypeExprKind {
    Var(Name),
    Ref { name: Ref, arguments: Vec<TypeExpr> },
    Unit,
    Tuple(Vec<TypeExpr>),
    Record {
        base: Option<Name>,
        fields: Vec<FieldType>,
    },
    /// `a -> b -> c`, at least two segments.
    Function(Vec<TypeExpr>),
}

#[derive(Debug, Clone)]
pub struct FieldType {
    pub pos: usize,
    pub name: Name,
    pub ty: TypeExpr,
}

// Type expressions compare and hash by structure; positions are ignored.

impl PartialEq for TypeExpr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for TypeExpr {}

impl Hash for TypeExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state)
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty
    }
}

impl Eq for FieldType {}

impl Hash for FieldType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.ty.hash(state)
    }
}

impl TypeExpr {
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
