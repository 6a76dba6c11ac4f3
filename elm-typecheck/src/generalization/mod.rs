//! Type schemes.


use crate::unification::{Bindings, Store};
use elm_core::{Ty, TyVar, VarId};
use fnv::{FnvHashMap, FnvHashSet};

/**
A type with some of its variables universally quantified.

```text
forall a b. (a -> b) -> List a -> List b
```
*/
#[derive(Debug, PartialEq, Clone)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub ty: Ty,
}

impl Scheme {
    /// A type with no quantified variables.
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
        }
    }

    /// Quantify every variable in `ty`.
    pub fn closed(ty: Ty) -> Self {
        Scheme {
            vars: ty.vars(),
            ty,
        }
    }

    /**
    Replace each quantified variable with a fresh flexible variable of the same name.

    Rigidity is dropped, so a rigid annotation variable becomes an ordinary unification
    variable at each use site.
    */
    pub fn instantiate(&self, store: &mut Store) -> Ty {
        if self.vars.is_empty() {
            return self.ty.clone();
        }
        let fresh: FnvHashMap<VarId, Ty> = self
            .vars
            .iter()
            .map(|var| (var.id, store.fresh_var(&var.name)))
            .collect();
        self.ty.subst(&|var| fresh.get(&var.id).cloned())
    }
}

/**
Quantify the variables of `ty` that aren't free in the enclosing environment.

`monomorphic` holds the variables that the enclosing environment mentions: parameters of
enclosing functions, their annotation variables, and declarations that are still being
inferred.
*/
pub fn generalize(store: &Store, ty: &Ty, monomorphic: &FnvHashSet<VarId>) -> Scheme {
    let zonked = store.zonk(ty);
    let vars: Vec<TyVar> = zonked
        .vars()
        .into_iter()
        .filter(|var| !monomorphic.contains(&var.id))
        .collect();
    if vars.is_empty() {
        // keep mutable records shared with the environment
        Scheme::mono(ty.clone())
    } else {
        Scheme { vars, ty: zonked }
    }
}

/// The unsolved variables mentioned by `types`, after zonking.
pub fn free_vars<'a>(store: &Store, types: impl Iterator<Item = &'a Ty>) -> FnvHashSet<VarId> {
    types
        .flat_map(|ty| store.zonk(ty).vars())
        .map(|var| var.id)
        .collect()
}
