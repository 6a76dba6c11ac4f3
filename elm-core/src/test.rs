use crate::{nth_var_name, AliasInfo, Name, Ty, TyVar, Typeclass, VarId};
use pretty_assertions::assert_eq;
use quickcheck_macros::quickcheck;

fn var(id: usize, name: &str) -> Ty {
    Ty::Var(TyVar {
        id: VarId(id),
        name: Name::from(name),
        rigid: false,
    })
}

fn field(name: &str, ty: Ty) -> (Name, Ty) {
    (Name::from(name), ty)
}

#[test]
fn nth_var_name_wraps_with_suffix() {
    assert_eq!("a", nth_var_name(0));
    assert_eq!("z", nth_var_name(25));
    assert_eq!("a1", nth_var_name(26));
    assert_eq!("b1", nth_var_name(27));
    assert_eq!("a2", nth_var_name(52))
}

#[quickcheck]
fn prop_nth_var_name_injective(n: u16, m: u16) -> bool {
    (n == m) == (nth_var_name(n as usize) == nth_var_name(m as usize))
}

#[test]
fn typeclass_of_suffixed_names() {
    assert_eq!(Some(Typeclass::Number), Typeclass::of("number"));
    assert_eq!(Some(Typeclass::Number), Typeclass::of("numberOne"));
    assert_eq!(Some(Typeclass::Comparable), Typeclass::of("comparable2"));
    assert_eq!(Some(Typeclass::Appendable), Typeclass::of("appendable"));
    assert_eq!(Some(Typeclass::CompAppend), Typeclass::of("compappend"));
    assert_eq!(None, Typeclass::of("a"));
    assert_eq!(None, Typeclass::of("num"))
}

#[test]
fn function_is_uncurried() {
    let inner = Ty::function(vec![Ty::string()], Ty::Unit);
    let ty = Ty::function(vec![Ty::int()], inner);
    match &ty {
        Ty::Function(function) => {
            assert_eq!(vec![Ty::int(), Ty::string()], function.parameters);
            assert_eq!(Ty::Unit, function.ret)
        }
        _ => panic!("expected a function, got {:?}", ty),
    }
    assert_eq!("Int -> String -> ()", ty.rendered_text(false))
}

#[test]
fn function_parameters_are_parenthesized() {
    let callback = Ty::function(vec![var(0, "a")], var(1, "b"));
    let ty = Ty::function(
        vec![callback, Ty::list(var(0, "a"))],
        Ty::list(var(1, "b")),
    );
    assert_eq!("(a -> b) -> List a -> List b", ty.rendered_text(false))
}

#[test]
fn partially_apply() {
    let ty = Ty::function(vec![Ty::int(), Ty::float()], Ty::string());
    let function = match &ty {
        Ty::Function(function) => function.clone(),
        _ => panic!("expected a function"),
    };
    assert_eq!(
        Ty::function(vec![Ty::float()], Ty::string()),
        function.partially_apply(1)
    );
    assert_eq!(Ty::string(), function.partially_apply(2));
    assert_eq!(Ty::string(), function.partially_apply(3))
}

#[test]
fn render_union_parameters() {
    let maybe = |ty| Ty::union("Maybe", "Maybe", vec![ty]);
    assert_eq!(
        "Maybe (List Int)",
        maybe(Ty::list(Ty::int())).rendered_text(false)
    );
    assert_eq!("Maybe Int", maybe(Ty::int()).rendered_text(false));
    assert_eq!(
        "Maybe.Maybe Basics.Int",
        maybe(Ty::int()).rendered_text(true)
    );
    assert_eq!(
        "Maybe (Int -> Int)",
        maybe(Ty::function(vec![Ty::int()], Ty::int())).rendered_text(false)
    )
}

#[test]
fn render_records() {
    assert_eq!("{}", Ty::empty_record().rendered_text(false));
    assert_eq!(
        "{ x : Int, y : Int }",
        Ty::record(vec![field("x", Ty::int()), field("y", Ty::int())]).rendered_text(false)
    );
    assert_eq!(
        "{ a | x : Int }",
        Ty::extension(var(0, "a"), vec![field("x", Ty::int())]).rendered_text(false)
    )
}

#[test]
fn render_tuple_and_unit() {
    assert_eq!(
        "( (), (), () )",
        Ty::tuple(vec![Ty::Unit, Ty::Unit, Ty::Unit]).rendered_text(false)
    );
    assert_eq!("unknown", Ty::Unknown.rendered_text(false))
}

#[test]
fn render_distinct_vars_with_same_name() {
    let ty = Ty::function(vec![var(0, "a")], var(1, "a"));
    assert_eq!("a -> b", ty.rendered_text(false));

    let ty = Ty::function(vec![var(0, "number")], var(1, "number"));
    assert_eq!("number -> number", ty.rendered_text(false))
}

#[test]
fn render_alias() {
    let record = Ty::record(vec![field("x", Ty::int())]).with_alias(AliasInfo {
        module: Name::from("Main"),
        name: Name::from("Point"),
        parameters: vec![],
    });
    assert_eq!("Point", record.rendered_text(false));
    assert_eq!("Main.Point", record.rendered_text(true));

    let wrapped = Ty::list(Ty::int()).with_alias(AliasInfo {
        module: Name::from("Main"),
        name: Name::from("Wrapped"),
        parameters: vec![Ty::int()],
    });
    assert_eq!(
        "Maybe (Wrapped Int)",
        Ty::union("Maybe", "Maybe", vec![wrapped]).rendered_text(false)
    )
}

#[test]
fn subst_merges_record_base() {
    let base = var(0, "a");
    let ty = Ty::extension(base, vec![field("x", Ty::int())]);
    let actual = ty.subst(&|var: &TyVar| {
        if var.id == VarId(0) {
            Some(Ty::record(vec![field("y", Ty::string())]))
        } else {
            None
        }
    });
    assert_eq!(
        Ty::record(vec![field("x", Ty::int()), field("y", Ty::string())]),
        actual
    )
}

#[test]
fn subst_flattens_function_return() {
    let ty = Ty::function(vec![Ty::int()], var(0, "a"));
    let actual = ty.subst(&|_: &TyVar| Some(Ty::function(vec![Ty::string()], Ty::Unit)));
    assert_eq!(
        Ty::function(vec![Ty::int(), Ty::string()], Ty::Unit),
        actual
    )
}

#[test]
fn vars_are_distinct_and_ordered() {
    let ty = Ty::function(
        vec![var(1, "b"), Ty::tuple(vec![var(0, "a"), var(1, "b")])],
        var(2, "c"),
    );
    assert_eq!(
        vec!["b", "a", "c"],
        ty.vars()
            .iter()
            .map(|var| var.name.to_string())
            .collect::<Vec<String>>()
    )
}
