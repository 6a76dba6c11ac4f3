use super::{Converter, TypeEnv};
use crate::{
    cache::InferenceCache,
    diagnostic::{Diagnostic, DiagnosticKind},
    resolve::{ModuleScope, Resolve, TypeTarget},
    unification::Store,
};
use elm_core::{Name, Ty};
use elm_syntax::{
    builder::{module, Builder},
    Declaration, Module, Ref, TypeExpr,
};
use fnv::{FnvHashMap, FnvHashSet};
use pretty_assertions::assert_eq;
use std::cell::RefCell;

fn convert(module: &Module, expr: &TypeExpr) -> (Ty, Vec<Diagnostic>) {
    let scope = ModuleScope::new(module);
    let cache = InferenceCache::new();
    let in_progress = RefCell::new(FnvHashSet::default());
    let mut store = Store::new();
    let mut vars = FnvHashMap::default();
    let mut diagnostics = Vec::new();
    let ty = Converter {
        env: TypeEnv {
            resolve: &scope,
            cache: &cache,
            in_progress: &in_progress,
        },
        store: &mut store,
        vars: &mut vars,
        rigid: true,
        diagnostics: &mut diagnostics,
    }
    .convert(expr);
    (ty, diagnostics)
}

fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|diagnostic| diagnostic.message()).collect()
}

#[test]
fn convert_builtin_types() {
    let mut builder = Builder::new();
    let expr = {
        let int = builder.t_ref("Int", vec![]);
        let list = builder.t_ref("List", vec![int]);
        let string = builder.t_ref("String", vec![]);
        let maybe = builder.t_ref("Maybe", vec![string]);
        builder.t_fn(vec![list, maybe])
    };
    let (ty, diagnostics) = convert(&module("Main", vec![]), &expr);
    assert_eq!("List Int -> Maybe String", ty.rendered_text(false));
    assert_eq!(Vec::<Diagnostic>::new(), diagnostics)
}

#[test]
fn type_variables_are_shared() {
    let mut builder = Builder::new();
    let expr = {
        let a1 = builder.t_var("a");
        let a2 = builder.t_var("a");
        let b = builder.t_var("b");
        builder.t_fn(vec![a1, a2, b])
    };
    let (ty, _) = convert(&module("Main", vec![]), &expr);
    match &ty {
        Ty::Function(function) => {
            assert_eq!(function.parameters[0], function.parameters[1]);
            assert!(function.parameters[0] != function.ret);
            assert!(ty.vars().iter().all(|var| var.rigid))
        }
        ty => panic!("expected a function, got {:?}", ty),
    }
}

#[test]
fn type_argument_counts() {
    let mut builder = Builder::new();
    let maybe = builder.t_ref("Maybe", vec![]);
    let int = {
        let arguments = vec![
            builder.t_ref("String", vec![]),
            builder.t_ref("String", vec![]),
            builder.t_ref("String", vec![]),
        ];
        builder.t_ref("Int", arguments)
    };
    let list = {
        let arguments = vec![builder.t_ref("Int", vec![])];
        builder.t_ref("List", arguments)
    };
    let module = module("Main", vec![]);

    let (ty, diagnostics) = convert(&module, &maybe);
    assert_eq!(Ty::Unknown, ty);
    assert_eq!(
        vec![String::from("The type expects 1 argument, but it got 0 instead.")],
        messages(&diagnostics)
    );

    let (ty, diagnostics) = convert(&module, &int);
    assert_eq!(Ty::Unknown, ty);
    assert_eq!(
        vec![String::from("The type expects 0 arguments, but it got 3 instead.")],
        messages(&diagnostics)
    );

    let (_, diagnostics) = convert(&module, &list);
    assert_eq!(Vec::<Diagnostic>::new(), diagnostics)
}

#[test]
fn unresolved_type_is_unknown() {
    let mut builder = Builder::new();
    let expr = builder.t_ref("Missing", vec![]);
    let (ty, diagnostics) = convert(&module("Main", vec![]), &expr);
    assert_eq!(Ty::Unknown, ty);
    assert!(diagnostics.is_empty())
}

#[test]
fn alias_is_expanded_and_remembered() {
    // type alias Point a = { x : a, y : a }
    let mut builder = Builder::new();
    let alias = {
        let x = builder.t_var("a");
        let y = builder.t_var("a");
        let record = builder.t_record(vec![("x", x), ("y", y)]);
        builder.alias("Point", &["a"], record)
    };
    let expr = {
        let int = builder.t_ref("Int", vec![]);
        builder.t_ref("Point", vec![int])
    };
    let module = module("Main", vec![Declaration::TypeAlias(alias)]);

    let (ty, diagnostics) = convert(&module, &expr);
    assert!(diagnostics.is_empty());
    assert_eq!("Point Int", ty.rendered_text(false));
    match &ty {
        Ty::Record(record) => {
            assert_eq!(Some(&Ty::int()), record.field("x"));
            assert_eq!(Some(&Ty::int()), record.field("y"));
            assert!(!record.is_extension())
        }
        ty => panic!("expected a record, got {:?}", ty),
    }
}

#[test]
fn recursive_alias() {
    // type alias Loop = { next : Loop }
    let mut builder = Builder::new();
    let alias = {
        let next = builder.t_ref("Loop", vec![]);
        let record = builder.t_record(vec![("next", next)]);
        builder.alias("Loop", &[], record)
    };
    let expr = builder.t_ref("Loop", vec![]);
    let module = module("Main", vec![Declaration::TypeAlias(alias)]);

    let (ty, diagnostics) = convert(&module, &expr);
    assert_eq!(Ty::Unknown, ty);
    assert_eq!(
        vec![DiagnosticKind::InfiniteRecursion],
        diagnostics
            .into_iter()
            .map(|diagnostic| diagnostic.kind)
            .collect::<Vec<_>>()
    )
}

#[test]
fn union_variants_instantiate_freshly() {
    // type Result e a = Err e | Ok a
    let mut builder = Builder::new();
    let declaration = {
        let e = builder.t_var("e");
        let a = builder.t_var("a");
        builder.type_decl("Result", &["e", "a"], vec![("Err", vec![e]), ("Ok", vec![a])])
    };
    let module = module("Main", vec![Declaration::Type(declaration)]);
    let scope = ModuleScope::new(&module);
    let cache = InferenceCache::new();
    let in_progress = RefCell::new(FnvHashSet::default());
    let env = TypeEnv {
        resolve: &scope,
        cache: &cache,
        in_progress: &in_progress,
    };

    let declaration = match scope.resolve_type(&Ref::unqualified("Result")).as_slice() {
        [TypeTarget::Union { declaration, .. }] => *declaration,
        targets => panic!("expected a union, got {:?}", targets),
    };
    let union = env.union(&Name::from("Main"), declaration);
    assert_eq!(2, union.parameters().len());

    let mut store = Store::new();
    let (first, first_ty) = union.variant(1, &mut store).unwrap();
    let (second, second_ty) = union.variant(1, &mut store).unwrap();
    assert_eq!("Result e a", first_ty.rendered_text(false));
    assert!(first != second);
    assert!(first_ty != second_ty);
    assert_eq!(None, union.variant(2, &mut store));

    // converted once, then served from the cache
    assert!(cache
        .get_type(&(Name::from("Main"), Name::from("Result")))
        .is_some())
}
