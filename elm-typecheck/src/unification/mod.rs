//! Type unification.

#[cfg(test)]
mod test;

use crate::metavariables::{self, FrozenSolutions, Solution};
use elm_core::{
    AliasInfo, FieldReferenceTable, Name, RecordId, Ty, TyFunction, TyRecord, TyUnion, TyVar,
    Typeclass, VarId,
};
use std::sync::Arc;

/**
A record that can still gain fields.

Only exists while a declaration is being inferred. Freezing an inference result turns every
mutable record into a [`TyRecord`].
*/
#[derive(Debug, Clone)]
pub struct MutableRecord {
    pub fields: Vec<(Name, Ty)>,
    pub base: Ty,
    pub references: FieldReferenceTable,
}

/**
Read access to type variable solutions and mutable records.

# Preconditions

* [`Ty`] arguments must only contain variables and records allocated by `self`.

  Applies to: [`Bindings::resolve`], [`Bindings::zonk`], [`Bindings::occurs`]
*/
pub trait Bindings {
    fn solution(&self, var: VarId) -> Option<&Ty>;

    fn record(&self, record: RecordId) -> &MutableRecord;

    /**
    Follow variable solutions until reaching a type that isn't a solved variable.
    */
    fn resolve(&self, ty: &Ty) -> Ty {
        let mut current = ty;
        loop {
            match current {
                Ty::Var(var) => match self.solution(var.id) {
                    Some(solved) => current = solved,
                    None => return current.clone(),
                },
                _ => return current.clone(),
            }
        }
    }

    /**
    Substitute all solved variables in a type.

    Mutable records are copied into immutable ones, and record bases that were solved to records
    are merged into their parent.

    # Laws

    * All solved variables are substituted.

      ```text
      self.zonk(ty).iter_vars().all(|var| self.solution(var.id).is_none())
      ```
    */
    fn zonk(&self, ty: &Ty) -> Ty {
        match ty {
            Ty::Unit | Ty::Unknown | Ty::InProgressBinding => ty.clone(),
            Ty::Var(var) => match self.solution(var.id) {
                None => ty.clone(),
                Some(solved) => self.zonk(solved),
            },
            Ty::Union(union) => Ty::Union(Arc::new(TyUnion {
                module: union.module.clone(),
                name: union.name.clone(),
                parameters: union.parameters.iter().map(|ty| self.zonk(ty)).collect(),
                alias: union.alias.as_ref().map(|alias| self.zonk_alias(alias)),
            })),
            Ty::Tuple(items) => Ty::tuple(items.iter().map(|ty| self.zonk(ty)).collect()),
            Ty::Record(record) => {
                let fields = self.zonk_fields(&record.fields);
                let base = record.base.as_ref().map(|base| self.zonk(base));
                let ty = Ty::record_with(fields, base, record.references.clone());
                match &record.alias {
                    None => ty,
                    Some(alias) => ty.with_alias(self.zonk_alias(alias)),
                }
            }
            Ty::MutableRecord(id) => {
                let record = self.record(*id);
                let fields = self.zonk_fields(&record.fields);
                let base = match self.zonk(&record.base) {
                    Ty::Unknown => None,
                    base => Some(base),
                };
                Ty::record_with(fields, base, record.references.clone().freeze())
            }
            Ty::Function(function) => {
                let ty = Ty::function(
                    function.parameters.iter().map(|ty| self.zonk(ty)).collect(),
                    self.zonk(&function.ret),
                );
                match &function.alias {
                    None => ty,
                    Some(alias) => ty.with_alias(self.zonk_alias(alias)),
                }
            }
        }
    }

    fn zonk_fields(&self, fields: &[(Name, Ty)]) -> Vec<(Name, Ty)> {
        fields
            .iter()
            .map(|(name, ty)| (name.clone(), self.zonk(ty)))
            .collect()
    }

    fn zonk_alias(&self, alias: &AliasInfo) -> AliasInfo {
        AliasInfo {
            module: alias.module.clone(),
            name: alias.name.clone(),
            parameters: alias.parameters.iter().map(|ty| self.zonk(ty)).collect(),
        }
    }

    /**
    Check whether any node of a type satisfies `predicate`, looking through solved variables
    and mutable records.
    */
    fn any_node(&self, ty: &Ty, predicate: &dyn Fn(&Ty) -> bool) -> bool {
        if predicate(ty) {
            return true;
        }
        match ty {
            Ty::Unit | Ty::Unknown | Ty::InProgressBinding => false,
            Ty::Var(var) => self
                .solution(var.id)
                .map_or(false, |solved| self.any_node(solved, predicate)),
            Ty::Union(union) => union
                .parameters
                .iter()
                .any(|ty| self.any_node(ty, predicate)),
            Ty::Tuple(items) => items.iter().any(|ty| self.any_node(ty, predicate)),
            Ty::Record(record) => {
                record
                    .fields
                    .iter()
                    .any(|(_, ty)| self.any_node(ty, predicate))
                    || record
                        .base
                        .as_ref()
                        .map_or(false, |base| self.any_node(base, predicate))
            }
            Ty::MutableRecord(id) => {
                let record = self.record(*id);
                record
                    .fields
                    .iter()
                    .any(|(_, ty)| self.any_node(ty, predicate))
                    || self.any_node(&record.base, predicate)
            }
            Ty::Function(function) => {
                function
                    .parameters
                    .iter()
                    .any(|ty| self.any_node(ty, predicate))
                    || self.any_node(&function.ret, predicate)
            }
        }
    }

    /**
    Check whether a variable occurs in a type.
    */
    fn occurs(&self, var: VarId, ty: &Ty) -> bool {
        self.any_node(ty, &|node| matches!(node, Ty::Var(other) if other.id == var))
    }
}

/// Type unification errors.
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    Mismatch,
    InfiniteType,
    /// Both sides were records, and their fields disagree.
    Record(RecordDiff),
}

impl Error {
    /// The error to report when this one happened inside a larger type.
    fn nested(self) -> Self {
        match self {
            Error::Record(_) => Error::Mismatch,
            error => error,
        }
    }
}

/// How two record types differ. Types are `(found, required)` pairs.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct RecordDiff {
    pub extra: Vec<(Name, Ty)>,
    pub missing: Vec<(Name, Ty)>,
    pub mismatched: Vec<(Name, Ty, Ty)>,
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty() && self.mismatched.is_empty()
    }

    pub fn map_types(&self, f: &impl Fn(&Ty) -> Ty) -> RecordDiff {
        let map_fields = |fields: &[(Name, Ty)]| -> Vec<(Name, Ty)> {
            fields
                .iter()
                .map(|(name, ty)| (name.clone(), f(ty)))
                .collect()
        };
        RecordDiff {
            extra: map_fields(&self.extra),
            missing: map_fields(&self.missing),
            mismatched: self
                .mismatched
                .iter()
                .map(|(name, found, required)| (name.clone(), f(found), f(required)))
                .collect(),
        }
    }
}

/// The end of a flattened record.
#[derive(Debug, Clone)]
pub enum Tail {
    Closed,
    Open(TyVar),
    Unknown,
}

impl Tail {
    fn can_grow(&self) -> bool {
        match self {
            Tail::Closed => false,
            Tail::Open(var) => !var.rigid,
            Tail::Unknown => true,
        }
    }

    fn to_ty(&self) -> Ty {
        match self {
            Tail::Closed => Ty::empty_record(),
            Tail::Open(var) => Ty::Var(var.clone()),
            Tail::Unknown => Ty::Unknown,
        }
    }
}

/// All the currently known fields of a record, followed by what it ends in.
#[derive(Debug, Clone)]
pub struct Flattened {
    pub fields: Vec<(Name, Ty)>,
    pub tail: Tail,
}

impl Flattened {
    pub fn field(&self, name: &str) -> Option<&Ty> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_ref() == name)
            .map(|(_, ty)| ty)
    }
}

fn is_union(union: &TyUnion, module: &str, name: &str) -> bool {
    union.module.as_ref() == module && union.name.as_ref() == name
}

fn is_list(union: &TyUnion) -> bool {
    is_union(union, "List", "List") && union.parameters.len() == 1
}

/**
The constraint a variable ends up with when variables constrained by `a` and `b` are unified.
*/
fn join(a: Typeclass, b: Typeclass) -> Option<Typeclass> {
    use Typeclass::*;
    match (a, b) {
        _ if a == b => Some(a),
        (Comparable, Number) | (Number, Comparable) => Some(Number),
        (Comparable, Appendable)
        | (Appendable, Comparable)
        | (CompAppend, Comparable)
        | (Comparable, CompAppend)
        | (CompAppend, Appendable)
        | (Appendable, CompAppend) => Some(CompAppend),
        _ => None,
    }
}

fn push_fields(into: &mut Vec<(Name, Ty)>, fields: &[(Name, Ty)]) {
    for (name, ty) in fields {
        if !into.iter().any(|(field, _)| field == name) {
            into.push((name.clone(), ty.clone()));
        }
    }
}

/// Type variable solutions and mutable records for one inference pass.
#[derive(Debug, Default)]
pub struct Store {
    solutions: metavariables::Solutions<Ty>,
    records: Vec<MutableRecord>,
}

impl Bindings for Store {
    fn solution(&self, var: VarId) -> Option<&Ty> {
        match self.solutions.get(var) {
            Solution::Unsolved => None,
            Solution::Solved(ty) => Some(ty),
        }
    }

    fn record(&self, record: RecordId) -> &MutableRecord {
        self.records
            .get(record.0)
            .unwrap_or_else(|| panic!("record {:?} not found", record))
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`metavariables::Solutions::fresh`]
    pub fn fresh(&mut self, name: &str, rigid: bool) -> TyVar {
        TyVar {
            id: self.solutions.fresh(),
            name: Name::from(name),
            rigid,
        }
    }

    /// A fresh flexible variable.
    pub fn fresh_var(&mut self, name: &str) -> Ty {
        Ty::Var(self.fresh(name, false))
    }

    /**
    Solve a variable.

    # Preconditions

    * `self.solution(var.id).is_none()`
    */
    pub fn bind(&mut self, var: &TyVar, ty: Ty) {
        self.solutions.set(var.id, ty)
    }

    pub fn new_record(&mut self, fields: Vec<(Name, Ty)>, base: Ty) -> Ty {
        let id = RecordId(self.records.len());
        self.records.push(MutableRecord {
            fields,
            base,
            references: FieldReferenceTable::new(),
        });
        Ty::MutableRecord(id)
    }

    pub fn record_mut(&mut self, record: RecordId) -> &mut MutableRecord {
        self.records
            .get_mut(record.0)
            .unwrap_or_else(|| panic!("record {:?} not found", record))
    }

    /**
    The unsolved variable a mutable record ends in, if the record's own field list is the last
    one in its chain.
    */
    pub fn open_base(&self, record: RecordId) -> Option<TyVar> {
        match self.resolve(&self.record(record).base) {
            Ty::Var(var) if !var.rigid => Some(var),
            _ => None,
        }
    }

    /**
    Add a field to a mutable record.

    Fails with [`Error::InfiniteType`] when the field's type mentions the record itself.
    */
    pub fn insert_field(
        &mut self,
        record: RecordId,
        name: &Name,
        ty: Ty,
        pos: Option<usize>,
    ) -> Result<(), Error> {
        if self.any_node(&ty, &|node| matches!(node, Ty::MutableRecord(id) if *id == record)) {
            return Err(Error::InfiniteType);
        }
        let record = self.record_mut(record);
        if let Some(pos) = pos {
            record.references.add(name, pos);
        }
        if !record.fields.iter().any(|(field, _)| field == name) {
            record.fields.push((name.clone(), ty));
        }
        Ok(())
    }

    /// Record that a field of a mutable record was seen at `pos`.
    pub fn add_reference(&mut self, record: RecordId, name: &Name, pos: usize) {
        self.record_mut(record).references.add(name, pos)
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /**
    Stop accepting solutions.

    The [`FrozenStore`] can still resolve and zonk types, but has no way to solve variables.
    */
    pub fn freeze(self) -> FrozenStore {
        FrozenStore {
            solutions: self.solutions.freeze(),
            records: self.records,
        }
    }

    /**
    Collect a record's known fields, following its base through solved variables and
    mutable records.

    Fields closer to the outside take precedence over base fields of the same name.
    */
    pub fn flatten(&self, ty: &Ty) -> Flattened {
        let mut fields = Vec::new();
        let mut current = self.resolve(ty);
        loop {
            let next = match &current {
                Ty::Record(record) => {
                    push_fields(&mut fields, &record.fields);
                    match &record.base {
                        None => {
                            return Flattened {
                                fields,
                                tail: Tail::Closed,
                            }
                        }
                        Some(base) => self.resolve(base),
                    }
                }
                Ty::MutableRecord(id) => {
                    let record = self.record(*id);
                    push_fields(&mut fields, &record.fields);
                    self.resolve(&record.base)
                }
                Ty::Var(var) => {
                    return Flattened {
                        fields,
                        tail: Tail::Open(var.clone()),
                    }
                }
                Ty::Unknown => {
                    return Flattened {
                        fields,
                        tail: Tail::Unknown,
                    }
                }
                _ => {
                    return Flattened {
                        fields,
                        tail: Tail::Closed,
                    }
                }
            };
            current = next;
        }
    }

    /**
    Unify two types.

    `actual` is the type something has, and `expected` the type it's required to have. The
    direction only matters when two variables are unified: constrained variables win over
    unconstrained ones, and otherwise `actual` is solved to `expected`.

    Components of tuples, unions and functions are all unified even after one of them fails, so
    every solution that can be learned is applied.
    */
    pub fn unify(&mut self, actual: &Ty, expected: &Ty) -> Result<(), Error> {
        let actual = self.resolve(actual);
        let expected = self.resolve(expected);
        match (&actual, &expected) {
            (Ty::Unknown | Ty::InProgressBinding, _) | (_, Ty::Unknown | Ty::InProgressBinding) => {
                Ok(())
            }
            (Ty::Var(a), Ty::Var(b)) => {
                if a.id == b.id {
                    Ok(())
                } else {
                    self.unify_vars(a, b)
                }
            }
            (Ty::Var(var), other) | (other, Ty::Var(var)) => self.unify_var(var, other),
            (Ty::Unit, Ty::Unit) => Ok(()),
            (Ty::Tuple(a), Ty::Tuple(b)) if a.len() == b.len() => {
                self.unify_all(a.iter().zip(b.iter()))
            }
            (Ty::Union(a), Ty::Union(b))
                if a.module == b.module
                    && a.name == b.name
                    && a.parameters.len() == b.parameters.len() =>
            {
                self.unify_all(a.parameters.iter().zip(b.parameters.iter()))
            }
            (Ty::Function(a), Ty::Function(b)) => self.unify_functions(a, b),
            (
                Ty::Record(_) | Ty::MutableRecord(_),
                Ty::Record(_) | Ty::MutableRecord(_),
            ) => self.unify_records(&actual, &expected),
            _ => Err(Error::Mismatch),
        }
    }

    fn unify_all<'a>(
        &mut self,
        pairs: impl Iterator<Item = (&'a Ty, &'a Ty)>,
    ) -> Result<(), Error> {
        let mut result = Ok(());
        for (actual, expected) in pairs {
            // don't short-circuit: later components can still be solved
            let next = self.unify(actual, expected).map_err(Error::nested);
            if result.is_ok() {
                result = next;
            }
        }
        result
    }

    /*
    Functions are curried: when one side has fewer parameters, its return type is unified with
    the function made from the other side's remaining parameters.
    */
    fn unify_functions(&mut self, actual: &TyFunction, expected: &TyFunction) -> Result<(), Error> {
        let shared = actual.parameters.len().min(expected.parameters.len());
        let result = self.unify_all(
            actual.parameters[..shared]
                .iter()
                .zip(expected.parameters[..shared].iter()),
        );
        let tail = self
            .unify(
                &actual.partially_apply(shared),
                &expected.partially_apply(shared),
            )
            .map_err(Error::nested);
        result.and(tail)
    }

    /// Unify an unsolved variable with a type that isn't a variable.
    fn unify_var(&mut self, var: &TyVar, ty: &Ty) -> Result<(), Error> {
        if var.rigid {
            return Err(Error::Mismatch);
        }
        if let Some(typeclass) = var.typeclass() {
            self.satisfies(typeclass, ty)?;
        }
        if self.occurs(var.id, ty) {
            return Err(Error::InfiniteType);
        }
        let ty = match ty {
            Ty::Record(record) if record.is_extension() => self.thaw(record),
            _ => ty.clone(),
        };
        self.bind(var, ty);
        Ok(())
    }

    /// Copy an extension record into a mutable record, so later field accesses can extend it.
    fn thaw(&mut self, record: &TyRecord) -> Ty {
        let id = RecordId(self.records.len());
        self.records.push(MutableRecord {
            fields: record.fields.clone(),
            base: record.base.clone().unwrap_or(Ty::Unknown),
            references: FieldReferenceTable::from(&record.references),
        });
        Ty::MutableRecord(id)
    }

    /// Unify two distinct unsolved variables.
    fn unify_vars(&mut self, actual: &TyVar, expected: &TyVar) -> Result<(), Error> {
        match (actual.rigid, expected.rigid) {
            (true, true) => Err(Error::Mismatch),
            (false, true) => self.unify_flex_rigid(actual, expected),
            (true, false) => self.unify_flex_rigid(expected, actual),
            (false, false) => match (actual.typeclass(), expected.typeclass()) {
                (None, _) => {
                    self.bind(actual, Ty::Var(expected.clone()));
                    Ok(())
                }
                (_, None) => {
                    self.bind(expected, Ty::Var(actual.clone()));
                    Ok(())
                }
                (Some(a), Some(b)) => match join(a, b) {
                    None => Err(Error::Mismatch),
                    Some(joined) if joined == a => {
                        self.bind(expected, Ty::Var(actual.clone()));
                        Ok(())
                    }
                    Some(joined) if joined == b => {
                        self.bind(actual, Ty::Var(expected.clone()));
                        Ok(())
                    }
                    Some(joined) => {
                        let var = self.fresh_var(joined.name());
                        self.bind(actual, var.clone());
                        self.bind(expected, var);
                        Ok(())
                    }
                },
            },
        }
    }

    /*
    A rigid variable stands for any type, so a flexible variable can only become it when every
    type the rigid variable admits satisfies the flexible variable's constraint.
    */
    fn unify_flex_rigid(&mut self, flex: &TyVar, rigid: &TyVar) -> Result<(), Error> {
        if let Some(typeclass) = flex.typeclass() {
            let rigid_typeclass = rigid.typeclass().ok_or(Error::Mismatch)?;
            if join(typeclass, rigid_typeclass) != Some(rigid_typeclass) {
                return Err(Error::Mismatch);
            }
        }
        self.bind(flex, Ty::Var(rigid.clone()));
        Ok(())
    }

    /**
    Require `ty` to satisfy `typeclass`, constraining any variables it contains.
    */
    pub fn constrain(&mut self, typeclass: Typeclass, ty: &Ty) -> Result<(), Error> {
        match self.resolve(ty) {
            Ty::Unknown => Ok(()),
            ty @ Ty::Var(_) => {
                let constrained = self.fresh_var(typeclass.name());
                self.unify(&ty, &constrained)
            }
            ty => self.satisfies(typeclass, &ty),
        }
    }

    /// Check a type that isn't a variable against a constraint.
    fn satisfies(&mut self, typeclass: Typeclass, ty: &Ty) -> Result<(), Error> {
        let ok = match (typeclass, ty) {
            (Typeclass::Number, Ty::Union(union)) => {
                is_union(union, "Basics", "Int") || is_union(union, "Basics", "Float")
            }
            (Typeclass::Appendable, Ty::Union(union)) => {
                is_union(union, "String", "String") || is_list(union)
            }
            (Typeclass::Comparable, Ty::Tuple(items)) => {
                for item in items.iter() {
                    self.constrain(Typeclass::Comparable, item)
                        .map_err(|_| Error::Mismatch)?;
                }
                true
            }
            (Typeclass::Comparable | Typeclass::CompAppend, Ty::Union(union))
                if is_list(union) =>
            {
                self.constrain(Typeclass::Comparable, &union.parameters[0])
                    .map_err(|_| Error::Mismatch)?;
                true
            }
            (Typeclass::Comparable, Ty::Union(union)) => {
                is_union(union, "Basics", "Int")
                    || is_union(union, "Basics", "Float")
                    || is_union(union, "Char", "Char")
                    || is_union(union, "String", "String")
            }
            (Typeclass::CompAppend, Ty::Union(union)) => is_union(union, "String", "String"),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::Mismatch)
        }
    }

    fn unify_records(&mut self, actual: &Ty, expected: &Ty) -> Result<(), Error> {
        let actual = self.flatten(actual);
        let expected = self.flatten(expected);

        let mut diff = RecordDiff::default();
        let mut infinite = false;
        for (name, found) in &actual.fields {
            if let Some(required) = expected.field(name) {
                match self.unify(found, required) {
                    Ok(()) => {}
                    Err(Error::InfiniteType) => infinite = true,
                    Err(_) => {
                        diff.mismatched
                            .push((name.clone(), found.clone(), required.clone()))
                    }
                }
            }
        }

        let only_actual: Vec<(Name, Ty)> = actual
            .fields
            .iter()
            .filter(|(name, _)| expected.field(name).is_none())
            .cloned()
            .collect();
        let only_expected: Vec<(Name, Ty)> = expected
            .fields
            .iter()
            .filter(|(name, _)| actual.field(name).is_none())
            .cloned()
            .collect();

        if !only_actual.is_empty() && !expected.tail.can_grow() {
            diff.extra = only_actual.clone();
        }
        if !only_expected.is_empty() && !actual.tail.can_grow() {
            diff.missing = only_expected.clone();
        }
        if infinite {
            return Err(Error::InfiniteType);
        }
        if !diff.is_empty() {
            return Err(Error::Record(diff));
        }

        match (only_expected.is_empty(), only_actual.is_empty()) {
            (true, true) => self.unify_tails(&actual.tail, &expected.tail),
            (false, true) => self.grow(&actual.tail, only_expected, expected.tail.to_ty()),
            (true, false) => self.grow(&expected.tail, only_actual, actual.tail.to_ty()),
            (false, false) => {
                if let (Tail::Open(a), Tail::Open(b)) = (&actual.tail, &expected.tail) {
                    if a.id == b.id {
                        return Err(Error::Mismatch);
                    }
                }
                let shared = self.fresh_var("a");
                self.grow(&actual.tail, only_expected, shared.clone())?;
                self.grow(&expected.tail, only_actual, shared)
            }
        }
    }

    fn unify_tails(&mut self, actual: &Tail, expected: &Tail) -> Result<(), Error> {
        match (actual, expected) {
            (Tail::Closed, Tail::Closed) | (Tail::Unknown, _) | (_, Tail::Unknown) => Ok(()),
            (Tail::Open(a), Tail::Open(b)) => self.unify(&Ty::Var(a.clone()), &Ty::Var(b.clone())),
            (Tail::Open(var), Tail::Closed) | (Tail::Closed, Tail::Open(var)) => {
                if var.rigid {
                    Err(Error::Mismatch)
                } else {
                    self.bind(var, Ty::empty_record());
                    Ok(())
                }
            }
        }
    }

    /// Extend a record ending in `tail` with `fields`, after which it ends in `rest`.
    fn grow(&mut self, tail: &Tail, fields: Vec<(Name, Ty)>, rest: Ty) -> Result<(), Error> {
        match tail {
            Tail::Unknown => Ok(()),
            Tail::Closed => Err(Error::Mismatch),
            Tail::Open(var) if var.rigid => Err(Error::Mismatch),
            Tail::Open(var) => {
                let record = Ty::record_with(fields, Some(rest), Default::default());
                if self.occurs(var.id, &record) {
                    return Err(Error::InfiniteType);
                }
                self.bind(var, record);
                Ok(())
            }
        }
    }
}

/// A [`Store`] that no longer accepts solutions.
#[derive(Debug)]
pub struct FrozenStore {
    solutions: FrozenSolutions<Ty>,
    records: Vec<MutableRecord>,
}

impl Bindings for FrozenStore {
    fn solution(&self, var: VarId) -> Option<&Ty> {
        match self.solutions.get(var) {
            Solution::Unsolved => None,
            Solution::Solved(ty) => Some(ty),
        }
    }

    fn record(&self, record: RecordId) -> &MutableRecord {
        self.records
            .get(record.0)
            .unwrap_or_else(|| panic!("record {:?} not found", record))
    }
}
