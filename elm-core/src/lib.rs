#![deny(unused_crate_dependencies)]

#[cfg(test)]
mod test;

pub mod record;
mod render;

pub use elm_syntax::Name;
pub use record::{FieldReferenceTable, FieldReferences};
pub use render::nth_var_name;

use quickcheck::Arbitrary;
use std::sync::Arc;

/// Index of a type variable in an inference pass's variable store.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct VarId(pub usize);

/**
A type variable.

Two variables are the same variable when their ids are equal. The name is only used
for display and to carry [`Typeclass`] constraints. Rigid variables come from type
annotations and can't be unified with concrete types.
*/
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct TyVar {
    pub id: VarId,
    pub name: Name,
    pub rigid: bool,
}

impl TyVar {
    pub fn typeclass(&self) -> Option<Typeclass> {
        Typeclass::of(&self.name)
    }
}

/// Elm's built-in constraints, written as type variable name prefixes.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Typeclass {
    Number,
    Comparable,
    Appendable,
    CompAppend,
}

impl Typeclass {
    pub fn of(name: &str) -> Option<Self> {
        if name.starts_with("number") {
            Some(Typeclass::Number)
        } else if name.starts_with("comparable") {
            Some(Typeclass::Comparable)
        } else if name.starts_with("appendable") {
            Some(Typeclass::Appendable)
        } else if name.starts_with("compappend") {
            Some(Typeclass::CompAppend)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Typeclass::Number => "number",
            Typeclass::Comparable => "comparable",
            Typeclass::Appendable => "appendable",
            Typeclass::CompAppend => "compappend",
        }
    }
}

impl Arbitrary for Typeclass {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        *g.choose(&[
            Typeclass::Number,
            Typeclass::Comparable,
            Typeclass::Appendable,
            Typeclass::CompAppend,
        ])
        .unwrap()
    }
}

/// Handle to a growable record owned by one inference pass.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct RecordId(pub usize);

/// The alias a type was written with, kept for rendering.
#[derive(Debug, PartialEq, Clone)]
pub struct AliasInfo {
    pub module: Name,
    pub name: Name,
    pub parameters: Vec<Ty>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TyUnion {
    pub module: Name,
    pub name: Name,
    pub parameters: Vec<Ty>,
    pub alias: Option<AliasInfo>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TyFunction {
    pub parameters: Vec<Ty>,
    pub ret: Ty,
    pub alias: Option<AliasInfo>,
}

impl TyFunction {
    /// The type left after applying `count` arguments.
    pub fn partially_apply(&self, count: usize) -> Ty {
        if count < self.parameters.len() {
            Ty::function(self.parameters[count..].to_vec(), self.ret.clone())
        } else {
            self.ret.clone()
        }
    }
}

/**
An immutable record type.

`base` is `None` for closed records like `{ x : Int }`, and a variable (or, before
normalisation, another record) for extension records like `{ a | x : Int }`.
*/
#[derive(Debug, Clone)]
pub struct TyRecord {
    pub fields: Vec<(Name, Ty)>,
    pub base: Option<Ty>,
    pub alias: Option<AliasInfo>,
    pub references: FieldReferences,
}

impl PartialEq for TyRecord {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.base == other.base && self.alias == other.alias
    }
}

impl TyRecord {
    pub fn field(&self, name: &str) -> Option<&Ty> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_ref() == name)
            .map(|(_, ty)| ty)
    }

    pub fn is_extension(&self) -> bool {
        self.base.is_some()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Ty {
    Unit,
    Var(TyVar),
    Union(Arc<TyUnion>),
    Tuple(Arc<[Ty]>),
    Record(Arc<TyRecord>),
    MutableRecord(RecordId),
    Function(Arc<TyFunction>),
    Unknown,
    InProgressBinding,
}

impl Ty {
    pub fn union(module: &str, name: &str, parameters: Vec<Ty>) -> Ty {
        Ty::Union(Arc::new(TyUnion {
            module: Name::from(module),
            name: Name::from(name),
            parameters,
            alias: None,
        }))
    }

    pub fn int() -> Ty {
        Ty::union("Basics", "Int", vec![])
    }

    pub fn float() -> Ty {
        Ty::union("Basics", "Float", vec![])
    }

    pub fn bool() -> Ty {
        Ty::union("Basics", "Bool", vec![])
    }

    pub fn string() -> Ty {
        Ty::union("String", "String", vec![])
    }

    pub fn char() -> Ty {
        Ty::union("Char", "Char", vec![])
    }

    pub fn list(element: Ty) -> Ty {
        Ty::union("List", "List", vec![element])
    }

    /**
    Build a function type, keeping it uncurried: a function returning a function
    is flattened into one parameter list.

    An empty parameter list yields `ret` itself.
    */
    pub fn function(mut parameters: Vec<Ty>, ret: Ty) -> Ty {
        if parameters.is_empty() {
            return ret;
        }
        match ret {
            Ty::Function(inner) if inner.alias.is_none() => {
                parameters.extend(inner.parameters.iter().cloned());
                Ty::Function(Arc::new(TyFunction {
                    parameters,
                    ret: inner.ret.clone(),
                    alias: None,
                }))
            }
            ret => Ty::Function(Arc::new(TyFunction {
                parameters,
                ret,
                alias: None,
            })),
        }
    }

    pub fn tuple(items: Vec<Ty>) -> Ty {
        Ty::Tuple(Arc::from(items))
    }

    pub fn record(fields: Vec<(Name, Ty)>) -> Ty {
        Ty::record_with(fields, None, FieldReferences::default())
    }

    pub fn extension(base: Ty, fields: Vec<(Name, Ty)>) -> Ty {
        Ty::record_with(fields, Some(base), FieldReferences::default())
    }

    pub fn empty_record() -> Ty {
        Ty::record(Vec::new())
    }

    /**
    Build a record, merging `base` into it when `base` is itself a record.

    Fields declared directly take precedence over fields of the same name in the base.
    */
    pub fn record_with(
        mut fields: Vec<(Name, Ty)>,
        base: Option<Ty>,
        references: FieldReferences,
    ) -> Ty {
        match base {
            Some(Ty::Record(base)) => {
                for (name, ty) in base.fields.iter() {
                    if !fields.iter().any(|(field, _)| field == name) {
                        fields.push((name.clone(), ty.clone()));
                    }
                }
                Ty::Record(Arc::new(TyRecord {
                    fields,
                    base: base.base.clone(),
                    alias: None,
                    references: references.merge(&base.references),
                }))
            }
            base => Ty::Record(Arc::new(TyRecord {
                fields,
                base,
                alias: None,
                references,
            })),
        }
    }

    pub fn var(&self) -> Option<&TyVar> {
        match self {
            Ty::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Ty::Unknown)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Ty::Union(union) if union.module.as_ref() == "List" && union.name.as_ref() == "List")
    }

    pub fn alias(&self) -> Option<&AliasInfo> {
        match self {
            Ty::Union(union) => union.alias.as_ref(),
            Ty::Record(record) => record.alias.as_ref(),
            Ty::Function(function) => function.alias.as_ref(),
            _ => None,
        }
    }

    /// Attach the alias this type was written with. Other shapes are returned unchanged.
    pub fn with_alias(self, alias: AliasInfo) -> Ty {
        match self {
            Ty::Union(union) => Ty::Union(Arc::new(TyUnion {
                alias: Some(alias),
                ..(*union).clone()
            })),
            Ty::Record(record) => Ty::Record(Arc::new(TyRecord {
                alias: Some(alias),
                ..(*record).clone()
            })),
            Ty::Function(function) => Ty::Function(Arc::new(TyFunction {
                alias: Some(alias),
                ..(*function).clone()
            })),
            ty => ty,
        }
    }

    /// Every variable occurrence, in depth-first order, including duplicates.
    pub fn iter_vars(&self) -> impl Iterator<Item = &TyVar> {
        let mut stack = vec![self];
        std::iter::from_fn(move || loop {
            match stack.pop()? {
                Ty::Var(var) => return Some(var),
                Ty::Unit
                | Ty::Unknown
                | Ty::InProgressBinding
                | Ty::MutableRecord(_) => continue,
                Ty::Union(union) => stack.extend(union.parameters.iter().rev()),
                Ty::Tuple(items) => stack.extend(items.iter().rev()),
                Ty::Record(record) => {
                    if let Some(base) = &record.base {
                        stack.push(base);
                    }
                    stack.extend(record.fields.iter().rev().map(|(_, ty)| ty));
                }
                Ty::Function(function) => {
                    stack.push(&function.ret);
                    stack.extend(function.parameters.iter().rev());
                }
            }
        })
    }

    /// Distinct variables, in order of first occurrence.
    pub fn vars(&self) -> Vec<TyVar> {
        let mut seen = fnv::FnvHashSet::default();
        self.iter_vars()
            .filter(|var| seen.insert(var.id))
            .cloned()
            .collect()
    }

    /**
    Replace variables according to `f`. Variables for which `f` returns `None` are kept.

    Record bases that become records are merged into the enclosing record, and function
    returns that become functions are flattened.
    */
    pub fn subst(&self, f: &impl Fn(&TyVar) -> Option<Ty>) -> Ty {
        match self {
            Ty::Unit | Ty::Unknown | Ty::InProgressBinding | Ty::MutableRecord(_) => self.clone(),
            Ty::Var(var) => f(var).unwrap_or_else(|| self.clone()),
            Ty::Union(union) => Ty::Union(Arc::new(TyUnion {
                module: union.module.clone(),
                name: union.name.clone(),
                parameters: union.parameters.iter().map(|ty| ty.subst(f)).collect(),
                alias: union.alias.as_ref().map(|alias| alias.subst(f)),
            })),
            Ty::Tuple(items) => Ty::tuple(items.iter().map(|ty| ty.subst(f)).collect()),
            Ty::Record(record) => {
                let fields = record
                    .fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.subst(f)))
                    .collect();
                let base = record.base.as_ref().map(|base| base.subst(f));
                let ty = Ty::record_with(fields, base, record.references.clone());
                match &record.alias {
                    None => ty,
                    Some(alias) => ty.with_alias(alias.subst(f)),
                }
            }
            Ty::Function(function) => {
                let ty = Ty::function(
                    function.parameters.iter().map(|ty| ty.subst(f)).collect(),
                    function.ret.subst(f),
                );
                match &function.alias {
                    None => ty,
                    Some(alias) => ty.with_alias(alias.subst(f)),
                }
            }
        }
    }
}

impl AliasInfo {
    pub fn subst(&self, f: &impl Fn(&TyVar) -> Option<Ty>) -> AliasInfo {
        AliasInfo {
            module: self.module.clone(),
            name: self.name.clone(),
            parameters: self.parameters.iter().map(|ty| ty.subst(f)).collect(),
        }
    }
}
