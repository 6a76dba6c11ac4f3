//! Name resolution.
//!
//! Inference only needs to know what a name refers to. [`Resolve`] answers that question;
//! [`ModuleScope`] answers it for a single module and a small prelude of builtins.


use crate::operator::Precedence;
use elm_core::{Name, Ty, TyVar, VarId};
use elm_syntax::{
    Associativity, Declaration, Module, PortAnnotation, Ref, TypeAliasDeclaration,
    TypeDeclaration, TypeExprKind, ValueDeclaration,
};

#[derive(Debug, Clone)]
pub enum ValueTarget<'a> {
    /// A top-level value, function, or pattern declaration of the module being checked.
    Value(&'a ValueDeclaration),
    /// A union type variant.
    Variant {
        module: Name,
        declaration: &'a TypeDeclaration,
        index: usize,
    },
    /// A record type alias, used as a constructor function.
    RecordConstructor {
        module: Name,
        declaration: &'a TypeAliasDeclaration,
    },
    Port(&'a PortAnnotation),
    /// A value whose type is already known, such as a builtin or an import. All of its type
    /// variables are quantified.
    External(Ty),
}

#[derive(Debug, Clone)]
pub enum TypeTarget<'a> {
    Union {
        module: Name,
        declaration: &'a TypeDeclaration,
    },
    Alias {
        module: Name,
        declaration: &'a TypeAliasDeclaration,
    },
    /// A union type without a visible declaration, such as `Int` or `List`.
    External {
        module: Name,
        name: Name,
        arity: usize,
    },
}

#[derive(Debug, Clone)]
pub struct OperatorTarget<'a> {
    pub precedence: Precedence,
    pub function: ValueTarget<'a>,
}

/**
Find the declarations a name can refer to.

An empty result means the name is unresolved. More than one candidate means the name is
ambiguous; inference treats both cases the same way.
*/
pub trait Resolve {
    fn resolve_value(&self, name: &Ref) -> Vec<ValueTarget<'_>>;

    fn resolve_type(&self, name: &Ref) -> Vec<TypeTarget<'_>>;

    fn resolve_operator(&self, operator: &str) -> Vec<OperatorTarget<'_>>;
}

#[derive(Debug, Clone)]
struct ExternalValue {
    module: Name,
    name: Name,
    ty: Ty,
}

#[derive(Debug, Clone)]
struct ExternalType {
    module: Name,
    name: Name,
    arity: usize,
}

#[derive(Debug, Clone)]
struct ExternalOperator {
    operator: Name,
    precedence: Precedence,
    ty: Ty,
}

/**
Resolves names against one module's declarations, then against externally known values and
types.

[`ModuleScope::new`] starts with the prelude: `Int`, `Float`, `Bool`, `String`, `Char`,
`List`, `Maybe`, their constructors, and the operators of `Basics` and `List`.
*/
#[derive(Debug)]
pub struct ModuleScope<'a> {
    module: &'a Module,
    values: Vec<ExternalValue>,
    types: Vec<ExternalType>,
    operators: Vec<ExternalOperator>,
}

fn var(id: usize, name: &str) -> Ty {
    Ty::Var(TyVar {
        id: VarId(id),
        name: Name::from(name),
        rigid: false,
    })
}

fn maybe(ty: Ty) -> Ty {
    Ty::union("Maybe", "Maybe", vec![ty])
}

fn binary(left: Ty, right: Ty, ret: Ty) -> Ty {
    Ty::function(vec![left, right], ret)
}

fn is_named(name: &Ref, module: &Name, candidate: &Name) -> bool {
    name.name == *candidate
        && name
            .module
            .as_ref()
            .map_or(true, |qualifier| qualifier == module)
}

impl<'a> ModuleScope<'a> {
    pub fn new(module: &'a Module) -> Self {
        let mut scope = ModuleScope {
            module,
            values: Vec::new(),
            types: Vec::new(),
            operators: Vec::new(),
        };

        for (module, name, arity) in [
            ("Basics", "Int", 0),
            ("Basics", "Float", 0),
            ("Basics", "Bool", 0),
            ("String", "String", 0),
            ("Char", "Char", 0),
            ("List", "List", 1),
            ("Maybe", "Maybe", 1),
        ] {
            scope = scope.with_type(module, name, arity);
        }

        let a = var(0, "a");
        let b = var(1, "b");
        let c = var(2, "c");
        let number = var(0, "number");
        let comparable = var(0, "comparable");
        let appendable = var(0, "appendable");

        scope = scope
            .with_value("Basics", "True", Ty::bool())
            .with_value("Basics", "False", Ty::bool())
            .with_value("Maybe", "Just", Ty::function(vec![a.clone()], maybe(a.clone())))
            .with_value("Maybe", "Nothing", maybe(a.clone()))
            .with_value("Basics", "identity", Ty::function(vec![a.clone()], a.clone()))
            .with_value("Basics", "not", Ty::function(vec![Ty::bool()], Ty::bool()))
            .with_value("Basics", "toFloat", Ty::function(vec![Ty::int()], Ty::float()))
            .with_value("Basics", "round", Ty::function(vec![Ty::float()], Ty::int()))
            .with_value(
                "Basics",
                "max",
                binary(comparable.clone(), comparable.clone(), comparable.clone()),
            )
            .with_value(
                "List",
                "map",
                binary(
                    Ty::function(vec![a.clone()], b.clone()),
                    Ty::list(a.clone()),
                    Ty::list(b.clone()),
                ),
            )
            .with_value(
                "List",
                "length",
                Ty::function(vec![Ty::list(a.clone())], Ty::int()),
            )
            .with_value(
                "String",
                "length",
                Ty::function(vec![Ty::string()], Ty::int()),
            );

        use Associativity::*;
        let operators = [
            (
                "|>",
                0,
                Left,
                binary(a.clone(), Ty::function(vec![a.clone()], b.clone()), b.clone()),
            ),
            (
                "<|",
                0,
                Right,
                binary(Ty::function(vec![a.clone()], b.clone()), a.clone(), b.clone()),
            ),
            ("||", 2, Right, binary(Ty::bool(), Ty::bool(), Ty::bool())),
            ("&&", 3, Right, binary(Ty::bool(), Ty::bool(), Ty::bool())),
            ("==", 4, Non, binary(a.clone(), a.clone(), Ty::bool())),
            ("/=", 4, Non, binary(a.clone(), a.clone(), Ty::bool())),
            (
                "<",
                4,
                Non,
                binary(comparable.clone(), comparable.clone(), Ty::bool()),
            ),
            (
                ">",
                4,
                Non,
                binary(comparable.clone(), comparable.clone(), Ty::bool()),
            ),
            (
                "<=",
                4,
                Non,
                binary(comparable.clone(), comparable.clone(), Ty::bool()),
            ),
            (
                ">=",
                4,
                Non,
                binary(comparable.clone(), comparable, Ty::bool()),
            ),
            (
                "++",
                5,
                Right,
                binary(appendable.clone(), appendable.clone(), appendable),
            ),
            (
                "::",
                5,
                Right,
                binary(a.clone(), Ty::list(a.clone()), Ty::list(a.clone())),
            ),
            ("+", 6, Left, binary(number.clone(), number.clone(), number.clone())),
            ("-", 6, Left, binary(number.clone(), number.clone(), number.clone())),
            ("*", 7, Left, binary(number.clone(), number.clone(), number.clone())),
            ("/", 7, Left, binary(Ty::float(), Ty::float(), Ty::float())),
            ("//", 7, Left, binary(Ty::int(), Ty::int(), Ty::int())),
            ("^", 8, Right, binary(number.clone(), number.clone(), number)),
            (
                "<<",
                9,
                Left,
                binary(
                    Ty::function(vec![b.clone()], c.clone()),
                    Ty::function(vec![a.clone()], b.clone()),
                    Ty::function(vec![a.clone()], c.clone()),
                ),
            ),
            (
                ">>",
                9,
                Right,
                binary(
                    Ty::function(vec![a.clone()], b.clone()),
                    Ty::function(vec![b], c.clone()),
                    Ty::function(vec![a], c),
                ),
            ),
        ];
        for (operator, precedence, associativity, ty) in operators {
            scope = scope.with_operator(operator, precedence, associativity, ty);
        }

        scope
    }

    /// Make a value from another module visible, both qualified and unqualified.
    pub fn with_value(mut self, module: &str, name: &str, ty: Ty) -> Self {
        self.values.push(ExternalValue {
            module: Name::from(module),
            name: Name::from(name),
            ty,
        });
        self
    }

    /// Make a union type from another module visible, both qualified and unqualified.
    pub fn with_type(mut self, module: &str, name: &str, arity: usize) -> Self {
        self.types.push(ExternalType {
            module: Name::from(module),
            name: Name::from(name),
            arity,
        });
        self
    }

    pub fn with_operator(
        mut self,
        operator: &str,
        precedence: u8,
        associativity: Associativity,
        ty: Ty,
    ) -> Self {
        self.operators.push(ExternalOperator {
            operator: Name::from(operator),
            precedence: Precedence {
                precedence,
                associativity,
            },
            ty,
        });
        self
    }

    pub fn module(&self) -> &'a Module {
        self.module
    }

    fn local_values(&self, name: &Name) -> Vec<ValueTarget<'a>> {
        let module_name = &self.module.name;
        let mut targets = Vec::new();
        for declaration in &self.module.declarations {
            match declaration {
                Declaration::Value(value) => {
                    if value
                        .bound_names()
                        .iter()
                        .any(|(_, bound)| bound == name)
                    {
                        targets.push(ValueTarget::Value(value))
                    }
                }
                Declaration::Type(ty) => {
                    if let Some(index) = ty
                        .variants
                        .iter()
                        .position(|variant| variant.name == *name)
                    {
                        targets.push(ValueTarget::Variant {
                            module: module_name.clone(),
                            declaration: ty,
                            index,
                        })
                    }
                }
                Declaration::TypeAlias(alias) => {
                    if alias.name == *name
                        && matches!(alias.aliased.kind, TypeExprKind::Record { base: None, .. })
                    {
                        targets.push(ValueTarget::RecordConstructor {
                            module: module_name.clone(),
                            declaration: alias,
                        })
                    }
                }
                Declaration::Port(port) => {
                    if port.name == *name {
                        targets.push(ValueTarget::Port(port))
                    }
                }
                Declaration::Infix(_) => {}
            }
        }
        targets
    }

    fn local_types(&self, name: &Name) -> Vec<TypeTarget<'a>> {
        let module_name = &self.module.name;
        self.module
            .declarations
            .iter()
            .filter_map(|declaration| match declaration {
                Declaration::Type(ty) if ty.name == *name => Some(TypeTarget::Union {
                    module: module_name.clone(),
                    declaration: ty,
                }),
                Declaration::TypeAlias(alias) if alias.name == *name => {
                    Some(TypeTarget::Alias {
                        module: module_name.clone(),
                        declaration: alias,
                    })
                }
                _ => None,
            })
            .collect()
    }

    fn is_local(&self, name: &Ref) -> bool {
        name.module
            .as_ref()
            .map_or(true, |module| *module == self.module.name)
    }
}

impl<'a> Resolve for ModuleScope<'a> {
    fn resolve_value(&self, name: &Ref) -> Vec<ValueTarget<'_>> {
        if self.is_local(name) {
            let local = self.local_values(&name.name);
            if !local.is_empty() {
                return local;
            }
        }
        self.values
            .iter()
            .filter(|value| is_named(name, &value.module, &value.name))
            .map(|value| ValueTarget::External(value.ty.clone()))
            .collect()
    }

    fn resolve_type(&self, name: &Ref) -> Vec<TypeTarget<'_>> {
        if self.is_local(name) {
            let local = self.local_types(&name.name);
            if !local.is_empty() {
                return local;
            }
        }
        self.types
            .iter()
            .filter(|ty| is_named(name, &ty.module, &ty.name))
            .map(|ty| TypeTarget::External {
                module: ty.module.clone(),
                name: ty.name.clone(),
                arity: ty.arity,
            })
            .collect()
    }

    fn resolve_operator(&self, operator: &str) -> Vec<OperatorTarget<'_>> {
        let local: Vec<OperatorTarget> = self
            .module
            .declarations
            .iter()
            .filter_map(|declaration| match declaration {
                Declaration::Infix(infix) if infix.operator.as_ref() == operator => {
                    Some(infix)
                }
                _ => None,
            })
            .filter_map(|infix| {
                let mut functions = self.resolve_value(&infix.function);
                if functions.len() == 1 {
                    functions.pop().map(|function| OperatorTarget {
                        precedence: Precedence {
                            precedence: infix.precedence,
                            associativity: infix.associativity,
                        },
                        function,
                    })
                } else {
                    None
                }
            })
            .collect();
        if !local.is_empty() {
            return local;
        }
        self.operators
            .iter()
            .filter(|external| external.operator.as_ref() == operator)
            .map(|external| OperatorTarget {
                precedence: external.precedence,
                function: ValueTarget::External(external.ty.clone()),
            })
            .collect()
    }
}
