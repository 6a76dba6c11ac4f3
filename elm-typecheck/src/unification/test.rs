use super::{Bindings, Error, RecordDiff, Store};
use elm_core::{Name, Ty, Typeclass};
use pretty_assertions::assert_eq;
use quickcheck_macros::quickcheck;

fn field(name: &str, ty: Ty) -> (Name, Ty) {
    (Name::from(name), ty)
}

fn field_names(store: &Store, ty: &Ty) -> Vec<String> {
    let mut names: Vec<String> = match store.zonk(ty) {
        Ty::Record(record) => record.fields.iter().map(|(name, _)| name.to_string()).collect(),
        ty => panic!("expected a record, got {:?}", ty),
    };
    names.sort();
    names
}

/// A record's fields sorted by name, and its base.
fn canonical(store: &Store, ty: &Ty) -> (Vec<(Name, Ty)>, Option<Ty>) {
    match store.zonk(ty) {
        Ty::Record(record) => {
            let mut fields = record.fields.clone();
            fields.sort_by(|(a, _), (b, _)| a.cmp(b));
            (fields, record.base.clone())
        }
        ty => panic!("expected a record, got {:?}", ty),
    }
}

#[test]
fn unify_var_with_concrete() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    assert_eq!(Ok(()), store.unify(&a, &Ty::int()));
    assert_eq!(Ty::int(), store.zonk(&a))
}

#[test]
fn unify_same_var() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    assert_eq!(Ok(()), store.unify(&a, &a));
    assert_eq!(a, store.zonk(&a))
}

#[test]
fn unify_unconstrained_vars_solves_actual() {
    let mut store = Store::new();
    let actual = store.fresh_var("a");
    let expected = store.fresh_var("b");
    assert_eq!(Ok(()), store.unify(&actual, &expected));
    assert_eq!(expected, store.zonk(&actual));
    assert_eq!(expected, store.zonk(&expected))
}

#[test]
fn unify_unknown_with_anything() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    assert_eq!(Ok(()), store.unify(&Ty::Unknown, &Ty::int()));
    assert_eq!(Ok(()), store.unify(&Ty::list(a.clone()), &Ty::Unknown));
    assert_eq!(Ok(()), store.unify(&Ty::InProgressBinding, &Ty::string()));
    assert_eq!(a, store.zonk(&a))
}

#[test]
fn unify_distinct_unions() {
    let mut store = Store::new();
    assert_eq!(Err(Error::Mismatch), store.unify(&Ty::int(), &Ty::float()));
    assert_eq!(
        Err(Error::Mismatch),
        store.unify(&Ty::union("Other", "Int", vec![]), &Ty::int())
    )
}

#[test]
fn unify_occurs_check() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    assert_eq!(
        Err(Error::InfiniteType),
        store.unify(&a, &Ty::list(a.clone()))
    );
    assert_eq!(
        Err(Error::InfiniteType),
        store.unify(&Ty::function(vec![a.clone()], Ty::int()), &a)
    )
}

#[test]
fn unify_tuple_keeps_going_after_failure() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    assert_eq!(
        Err(Error::Mismatch),
        store.unify(
            &Ty::tuple(vec![Ty::int(), a.clone()]),
            &Ty::tuple(vec![Ty::string(), Ty::char()])
        )
    );
    assert_eq!(Ty::char(), store.zonk(&a))
}

#[test]
fn unify_tuple_sizes() {
    let mut store = Store::new();
    assert_eq!(
        Err(Error::Mismatch),
        store.unify(
            &Ty::tuple(vec![Ty::int(), Ty::int()]),
            &Ty::tuple(vec![Ty::int(), Ty::int(), Ty::int()])
        )
    )
}

#[test]
fn unify_function_with_partial_application() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    assert_eq!(
        Ok(()),
        store.unify(
            &Ty::function(vec![Ty::int(), Ty::string()], Ty::bool()),
            &Ty::function(vec![Ty::int()], a.clone())
        )
    );
    assert_eq!(
        Ty::function(vec![Ty::string()], Ty::bool()),
        store.zonk(&a)
    )
}

#[test]
fn unify_function_with_non_function() {
    let mut store = Store::new();
    assert_eq!(
        Err(Error::Mismatch),
        store.unify(&Ty::function(vec![Ty::int()], Ty::int()), &Ty::int())
    )
}

#[test]
fn unify_rigid_var() {
    let mut store = Store::new();
    let a = Ty::Var(store.fresh("a", true));
    let b = Ty::Var(store.fresh("b", true));
    let c = store.fresh_var("c");
    assert_eq!(Err(Error::Mismatch), store.unify(&a, &Ty::int()));
    assert_eq!(Err(Error::Mismatch), store.unify(&a, &b));
    assert_eq!(Ok(()), store.unify(&c, &a));
    assert_eq!(a, store.zonk(&c))
}

#[test]
fn unify_number_constraint() {
    let mut store = Store::new();
    let n1 = store.fresh_var("number");
    let n2 = store.fresh_var("number");
    let n3 = store.fresh_var("number");
    assert_eq!(Ok(()), store.unify(&n1, &Ty::int()));
    assert_eq!(Ok(()), store.unify(&Ty::float(), &n2));
    assert_eq!(Err(Error::Mismatch), store.unify(&n3, &Ty::string()));
    assert_eq!(n3, store.zonk(&n3))
}

#[test]
fn unify_appendable_constraint() {
    let mut store = Store::new();
    let a1 = store.fresh_var("appendable");
    let a2 = store.fresh_var("appendable");
    let a3 = store.fresh_var("appendable");
    let elem = store.fresh_var("a");
    assert_eq!(Ok(()), store.unify(&a1, &Ty::string()));
    assert_eq!(Ok(()), store.unify(&a2, &Ty::list(elem)));
    assert_eq!(Err(Error::Mismatch), store.unify(&a3, &Ty::int()))
}

#[test]
fn unify_comparable_constraint() {
    let mut store = Store::new();
    for ty in [Ty::int(), Ty::float(), Ty::char(), Ty::string()] {
        let c = store.fresh_var("comparable");
        assert_eq!(Ok(()), store.unify(&c, &ty), "comparable ~ {:?}", ty);
    }

    let c = store.fresh_var("comparable");
    assert_eq!(
        Ok(()),
        store.unify(&c, &Ty::tuple(vec![Ty::int(), Ty::list(Ty::string())]))
    );

    let c = store.fresh_var("comparable");
    assert_eq!(
        Err(Error::Mismatch),
        store.unify(&c, &Ty::tuple(vec![Ty::int(), Ty::bool()]))
    );

    let c = store.fresh_var("comparable");
    assert_eq!(Err(Error::Mismatch), store.unify(&c, &Ty::Unit))
}

#[test]
fn unify_comparable_constrains_list_element() {
    let mut store = Store::new();
    let c = store.fresh_var("comparable");
    let elem = store.fresh_var("a");
    assert_eq!(Ok(()), store.unify(&c, &Ty::list(elem.clone())));
    match store.zonk(&elem) {
        Ty::Var(var) => assert_eq!(Some(Typeclass::Comparable), var.typeclass()),
        ty => panic!("expected a variable, got {:?}", ty),
    }
    assert_eq!(Err(Error::Mismatch), store.unify(&elem, &Ty::bool()))
}

#[test]
fn unify_compappend_constraint() {
    let mut store = Store::new();
    let c1 = store.fresh_var("compappend");
    let c2 = store.fresh_var("compappend");
    let c3 = store.fresh_var("compappend");
    assert_eq!(Ok(()), store.unify(&c1, &Ty::string()));
    assert_eq!(Ok(()), store.unify(&c2, &Ty::list(Ty::int())));
    assert_eq!(Err(Error::Mismatch), store.unify(&c3, &Ty::int()))
}

fn constrained_join(a: Typeclass, b: Typeclass) -> Option<Option<Typeclass>> {
    let mut store = Store::new();
    let va = store.fresh_var(a.name());
    let vb = store.fresh_var(b.name());
    match store.unify(&va, &vb) {
        Err(_) => None,
        Ok(()) => match (store.zonk(&va), store.zonk(&vb)) {
            (Ty::Var(x), Ty::Var(y)) => {
                assert_eq!(x.id, y.id);
                Some(x.typeclass())
            }
            (x, y) => panic!("expected variables, got {:?} and {:?}", x, y),
        },
    }
}

#[test]
fn typeclass_matrix() {
    use Typeclass::*;
    let cases = [
        (Number, Number, Some(Number)),
        (Number, Comparable, Some(Number)),
        (Number, Appendable, None),
        (Number, CompAppend, None),
        (Comparable, Comparable, Some(Comparable)),
        (Comparable, Appendable, Some(CompAppend)),
        (Comparable, CompAppend, Some(CompAppend)),
        (Appendable, Appendable, Some(Appendable)),
        (Appendable, CompAppend, Some(CompAppend)),
        (CompAppend, CompAppend, Some(CompAppend)),
    ];
    for (a, b, expected) in cases {
        assert_eq!(
            expected.map(Some),
            constrained_join(a, b),
            "{} ~ {}",
            a.name(),
            b.name()
        );
    }
}

#[quickcheck]
fn prop_typeclass_join_symmetric(a: Typeclass, b: Typeclass) -> bool {
    constrained_join(a, b) == constrained_join(b, a)
}

#[test]
fn unify_constrained_with_unconstrained() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    let n = store.fresh_var("number");
    assert_eq!(Ok(()), store.unify(&n, &a));
    assert_eq!(n, store.zonk(&a));

    let b = store.fresh_var("b");
    let c = store.fresh_var("comparable");
    assert_eq!(Ok(()), store.unify(&b, &c));
    assert_eq!(c, store.zonk(&b))
}

#[test]
fn unify_flex_constrained_with_rigid() {
    let mut store = Store::new();
    let rigid_number = Ty::Var(store.fresh("number", true));
    let rigid_a = Ty::Var(store.fresh("a", true));
    let comparable = store.fresh_var("comparable");
    let number = store.fresh_var("number");
    assert_eq!(Ok(()), store.unify(&comparable, &rigid_number));
    assert_eq!(rigid_number, store.zonk(&comparable));
    assert_eq!(Err(Error::Mismatch), store.unify(&number, &rigid_a));
    assert_eq!(Err(Error::Mismatch), store.unify(&rigid_number, &Ty::int()))
}

#[test]
fn unify_closed_records() {
    let mut store = Store::new();
    assert_eq!(
        Ok(()),
        store.unify(
            &Ty::record(vec![field("x", Ty::int()), field("y", Ty::string())]),
            &Ty::record(vec![field("y", Ty::string()), field("x", Ty::int())])
        )
    )
}

#[test]
fn unify_closed_records_diff() {
    let mut store = Store::new();
    assert_eq!(
        Err(Error::Record(RecordDiff {
            extra: vec![field("x", Ty::int())],
            missing: vec![field("z", Ty::char())],
            mismatched: vec![(Name::from("y"), Ty::string(), Ty::float())],
        })),
        store.unify(
            &Ty::record(vec![field("x", Ty::int()), field("y", Ty::string())]),
            &Ty::record(vec![field("y", Ty::float()), field("z", Ty::char())])
        )
    )
}

#[test]
fn unify_nested_record_mismatch() {
    let mut store = Store::new();
    assert_eq!(
        Err(Error::Mismatch),
        store.unify(
            &Ty::list(Ty::record(vec![field("x", Ty::int())])),
            &Ty::list(Ty::record(vec![field("y", Ty::int())]))
        )
    )
}

#[test]
fn unify_extension_with_closed() {
    let mut store = Store::new();
    let r = store.fresh_var("r");
    let extension = Ty::extension(r.clone(), vec![field("x", Ty::int())]);
    let closed = Ty::record(vec![field("x", Ty::int()), field("y", Ty::string())]);
    assert_eq!(Ok(()), store.unify(&extension, &closed));
    assert_eq!(
        Ty::record(vec![field("y", Ty::string())]),
        store.zonk(&r)
    );
    assert_eq!(vec!["x", "y"], field_names(&store, &extension))
}

#[test]
fn unify_extension_missing_in_closed() {
    let mut store = Store::new();
    let r = store.fresh_var("r");
    assert_eq!(
        Err(Error::Record(RecordDiff {
            missing: vec![field("z", Ty::int())],
            ..RecordDiff::default()
        })),
        store.unify(
            &Ty::record(vec![field("x", Ty::int())]),
            &Ty::extension(r, vec![field("z", Ty::int())])
        )
    )
}

#[test]
fn unify_rigid_extension_cannot_grow() {
    let mut store = Store::new();
    let r = Ty::Var(store.fresh("r", true));
    assert_eq!(
        Err(Error::Record(RecordDiff {
            extra: vec![field("y", Ty::int())],
            ..RecordDiff::default()
        })),
        store.unify(
            &Ty::record(vec![field("x", Ty::int()), field("y", Ty::int())]),
            &Ty::extension(r, vec![field("x", Ty::int())])
        )
    )
}

#[test]
fn unify_extensions_with_same_base() {
    let mut store = Store::new();
    let r = store.fresh_var("r");
    assert_eq!(
        Err(Error::Mismatch),
        store.unify(
            &Ty::extension(r.clone(), vec![field("x", Ty::int())]),
            &Ty::extension(r, vec![field("y", Ty::int())])
        )
    )
}

#[test]
fn unify_var_with_extension_is_mutable() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    let r = store.fresh_var("r");
    assert_eq!(
        Ok(()),
        store.unify(&a, &Ty::extension(r, vec![field("x", Ty::int())]))
    );
    match store.resolve(&a) {
        Ty::MutableRecord(id) => {
            assert_eq!(Ok(()), store.insert_field(id, &Name::from("y"), Ty::char(), None));
        }
        ty => panic!("expected a mutable record, got {:?}", ty),
    }
    assert_eq!(vec!["x", "y"], field_names(&store, &a))
}

#[test]
fn insert_field_occurs_check() {
    let mut store = Store::new();
    let r = store.fresh_var("r");
    let record = store.new_record(vec![], r);
    match &record {
        Ty::MutableRecord(id) => assert_eq!(
            Err(Error::InfiniteType),
            store.insert_field(*id, &Name::from("f"), Ty::list(record.clone()), None)
        ),
        ty => panic!("expected a mutable record, got {:?}", ty),
    }
}

#[test]
fn unify_record_field_infinite() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    let r = store.fresh_var("r");
    let record = Ty::extension(r, vec![field("f", a.clone())]);
    assert_eq!(
        Err(Error::InfiniteType),
        store.unify(
            &Ty::record(vec![field("f", Ty::function(vec![a.clone()], Ty::int()))]),
            &record
        )
    )
}

/**
Two open records with disjoint fields unify to a record with every field, and unifying them
again changes nothing.
*/
#[quickcheck]
fn prop_record_merge_open(left: Vec<u8>, right: Vec<u8>) -> bool {
    let mut left_names: Vec<String> = left.iter().map(|n| format!("f{}", n % 16)).collect();
    left_names.sort();
    left_names.dedup();
    let mut right_names: Vec<String> = right
        .iter()
        .map(|n| format!("f{}", n % 16))
        .filter(|name| !left_names.contains(name))
        .collect();
    right_names.sort();
    right_names.dedup();

    let mut store = Store::new();
    let r1 = store.fresh_var("r");
    let r2 = store.fresh_var("r");
    let a = Ty::extension(
        r1,
        left_names.iter().map(|name| field(name, Ty::int())).collect(),
    );
    let b = Ty::extension(
        r2,
        right_names.iter().map(|name| field(name, Ty::string())).collect(),
    );

    let mut all = left_names.clone();
    all.extend(right_names.iter().cloned());
    all.sort();

    store.unify(&a, &b).is_ok()
        && canonical(&store, &a) == canonical(&store, &b)
        && field_names(&store, &a) == all
        && store.unify(&a, &b).is_ok()
        && store.unify(&b, &a).is_ok()
}

/// A closed record with every field satisfies an open record with some of them.
#[quickcheck]
fn prop_record_merge_closed(fields: Vec<u8>, keep: Vec<bool>) -> bool {
    let mut names: Vec<String> = fields.iter().map(|n| format!("f{}", n % 16)).collect();
    names.sort();
    names.dedup();
    let some: Vec<String> = names
        .iter()
        .zip(keep.iter().chain(std::iter::repeat(&true)))
        .filter(|(_, keep)| **keep)
        .map(|(name, _)| name.clone())
        .collect();

    let mut store = Store::new();
    let r = store.fresh_var("r");
    let closed = Ty::record(names.iter().map(|name| field(name, Ty::int())).collect());
    let open = Ty::extension(r, some.iter().map(|name| field(name, Ty::int())).collect());

    store.unify(&closed, &open).is_ok()
        && canonical(&store, &open) == canonical(&store, &closed)
        && store.unify(&open, &closed).is_ok()
}

#[test]
fn frozen_store_zonks_the_same() {
    let mut store = Store::new();
    let a = store.fresh_var("a");
    let r = store.fresh_var("r");
    let record = store.new_record(vec![field("x", a.clone())], r);
    assert_eq!(Ok(()), store.unify(&a, &Ty::int()));
    let expected = store.zonk(&record);
    let frozen = store.freeze();
    assert_eq!(expected, frozen.zonk(&record));
    assert_eq!(Ty::int(), frozen.zonk(&a))
}
