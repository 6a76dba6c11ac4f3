use crate::{
    cache::{Change, DeclKey, InferenceCache},
    resolve::ModuleScope,
    Engine, Error, FileId, InferenceConfig,
};
use elm_syntax::{
    builder::{module, Builder},
    Declaration, Module,
};
use pretty_assertions::assert_eq;
use std::sync::{atomic::AtomicBool, Arc};

const FILE: FileId = FileId(0);

/**
```elm
a : Int
a = 1

b = a

c = 2
```
*/
fn three_declarations() -> Module {
    let mut builder = Builder::new();
    let a = {
        let annotation = builder.t_ref("Int", vec![]);
        let body = builder.int(1);
        builder.annotated("a", annotation, vec![], body)
    };
    let b = {
        let body = builder.var("a");
        builder.function("b", vec![], body)
    };
    let c = {
        let body = builder.int(2);
        builder.function("c", vec![], body)
    };
    module(
        "Main",
        vec![
            Declaration::Value(a),
            Declaration::Value(b),
            Declaration::Value(c),
        ],
    )
}

fn infer_all(module: &Module, cache: &InferenceCache) {
    let scope = ModuleScope::new(module);
    let engine = Engine::new(FILE, &scope, cache, InferenceConfig::default());
    for declaration in module.value_declarations() {
        engine.infer(declaration).unwrap();
    }
}

fn computations(cache: &InferenceCache) -> Vec<usize> {
    ["a", "b", "c"]
        .iter()
        .map(|name| cache.computations_of(FILE, name))
        .collect()
}

#[test]
fn cached_results_are_reused() {
    let module = three_declarations();
    let cache = InferenceCache::new();
    infer_all(&module, &cache);
    infer_all(&module, &cache);
    assert_eq!(vec![1, 1, 1], computations(&cache))
}

#[test]
fn annotated_body_change_is_local() {
    let module = three_declarations();
    let cache = InferenceCache::new();
    infer_all(&module, &cache);

    cache.invalidate(Change::Value {
        file: FILE,
        name: "a".into(),
    });
    infer_all(&module, &cache);
    assert_eq!(vec![2, 1, 1], computations(&cache))
}

#[test]
fn unannotated_body_change_invalidates_unannotated() {
    let module = three_declarations();
    let cache = InferenceCache::new();
    infer_all(&module, &cache);

    cache.invalidate(Change::Value {
        file: FILE,
        name: "c".into(),
    });
    infer_all(&module, &cache);
    assert_eq!(vec![1, 2, 2], computations(&cache))
}

#[test]
fn annotation_change_invalidates_file() {
    let module = three_declarations();
    let cache = InferenceCache::new();
    infer_all(&module, &cache);

    cache.invalidate(Change::Annotation {
        file: FILE,
        name: "a".into(),
    });
    infer_all(&module, &cache);
    assert_eq!(vec![2, 2, 2], computations(&cache))
}

/**
```elm
a : <annotation>
a = <body>

d : Int
d = a
```
*/
fn annotated_caller(annotation: &str, body: fn(&mut Builder) -> elm_syntax::Expr) -> Module {
    let mut builder = Builder::new();
    let a = {
        let annotation = builder.t_ref(annotation, vec![]);
        let body = body(&mut builder);
        builder.annotated("a", annotation, vec![], body)
    };
    let d = {
        let annotation = builder.t_ref("Int", vec![]);
        let body = builder.var("a");
        builder.annotated("d", annotation, vec![], body)
    };
    module("Main", vec![Declaration::Value(a), Declaration::Value(d)])
}

#[test]
fn annotation_change_reaches_annotated_callers() {
    let cache = InferenceCache::new();
    let before = annotated_caller("Int", |builder| builder.int(1));
    {
        let scope = ModuleScope::new(&before);
        let engine = Engine::new(FILE, &scope, &cache, InferenceConfig::default());
        let result = engine.infer(before.value("d").unwrap()).unwrap();
        assert!(result.diagnostics.is_empty());
    }

    let after = annotated_caller("String", |builder| builder.string("one"));
    cache.invalidate(Change::Annotation {
        file: FILE,
        name: "a".into(),
    });
    let scope = ModuleScope::new(&after);
    let engine = Engine::new(FILE, &scope, &cache, InferenceConfig::default());
    let result = engine.infer(after.value("d").unwrap()).unwrap();
    assert_eq!(
        vec![String::from("Type mismatch.\nRequired: Int\nFound: String")],
        result
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.message())
            .collect::<Vec<_>>()
    );
    assert_eq!(2, cache.computations_of(FILE, "d"))
}

#[test]
fn other_files_are_untouched() {
    let module = three_declarations();
    let cache = InferenceCache::new();
    infer_all(&module, &cache);

    cache.invalidate(Change::File { file: FileId(1) });
    infer_all(&module, &cache);
    assert_eq!(vec![1, 1, 1], computations(&cache))
}

#[test]
fn referenced_declarations_are_inferred_once() {
    // double x = x + x
    // main = double 2
    let mut builder = Builder::new();
    let double = {
        let x = builder.p_var("x");
        let body = {
            let x1 = builder.var("x");
            let x2 = builder.var("x");
            builder.binary(x1, vec![("+", x2)])
        };
        builder.function("double", vec![x], body)
    };
    let main = {
        let double = builder.var("double");
        let two = builder.int(2);
        let body = builder.call(double, vec![two]);
        builder.function("main", vec![], body)
    };
    let module = module(
        "Main",
        vec![Declaration::Value(double), Declaration::Value(main)],
    );
    let cache = InferenceCache::new();
    let scope = ModuleScope::new(&module);
    let engine = Engine::new(FILE, &scope, &cache, InferenceConfig::default());

    engine.infer(module.value("main").unwrap()).unwrap();
    engine.infer(module.value("double").unwrap()).unwrap();
    assert_eq!(1, cache.computations_of(FILE, "double"));
    assert_eq!(1, cache.computations_of(FILE, "main"));

    let key = DeclKey::new(FILE, module.value("double").unwrap());
    assert_eq!(
        "number -> number",
        cache.get(&key).unwrap().ty.rendered_text(false)
    )
}

#[test]
fn mutual_recursion_caches_the_outer_declaration() {
    // isEven n = isOdd n
    // isOdd n = isEven n
    let mut builder = Builder::new();
    let is_even = {
        let n = builder.p_var("n");
        let is_odd = builder.var("isOdd");
        let n_ref = builder.var("n");
        let body = builder.call(is_odd, vec![n_ref]);
        builder.function("isEven", vec![n], body)
    };
    let is_odd = {
        let n = builder.p_var("n");
        let is_even = builder.var("isEven");
        let n_ref = builder.var("n");
        let body = builder.call(is_even, vec![n_ref]);
        builder.function("isOdd", vec![n], body)
    };
    let module = module(
        "Main",
        vec![Declaration::Value(is_even), Declaration::Value(is_odd)],
    );
    let cache = InferenceCache::new();
    let scope = ModuleScope::new(&module);
    let engine = Engine::new(FILE, &scope, &cache, InferenceConfig::default());

    let result = engine.infer(module.value("isEven").unwrap()).unwrap();
    assert!(result.diagnostics.is_empty());
    assert_eq!(1, cache.computations_of(FILE, "isEven"));
    assert_eq!(0, cache.computations_of(FILE, "isOdd"));

    engine.infer(module.value("isOdd").unwrap()).unwrap();
    assert_eq!(1, cache.computations_of(FILE, "isOdd"));
    assert_eq!(1, cache.computations_of(FILE, "isEven"))
}

#[test]
fn mutual_value_recursion_is_reported_from_both_sides() {
    // a = b
    // b = a
    let mut builder = Builder::new();
    let a = {
        let body = builder.var("b");
        builder.function("a", vec![], body)
    };
    let b = {
        let body = builder.var("a");
        builder.function("b", vec![], body)
    };
    let module = module("Main", vec![Declaration::Value(a), Declaration::Value(b)]);
    let cache = InferenceCache::new();
    let scope = ModuleScope::new(&module);
    let engine = Engine::new(FILE, &scope, &cache, InferenceConfig::default());

    for name in ["a", "b"] {
        let result = engine.infer(module.value(name).unwrap()).unwrap();
        assert_eq!(
            vec![String::from("Infinite recursion")],
            result
                .diagnostics
                .iter()
                .map(|diagnostic| diagnostic.message())
                .collect::<Vec<_>>()
        );
    }
}

#[test]
fn cancelled_inference() {
    let module = three_declarations();
    let cache = InferenceCache::new();
    let scope = ModuleScope::new(&module);
    let engine = Engine::new(
        FILE,
        &scope,
        &cache,
        InferenceConfig {
            cancellation: Some(Arc::new(AtomicBool::new(true))),
            ..InferenceConfig::default()
        },
    );

    assert_eq!(
        Err(Error::Cancelled),
        engine.infer(module.value("c").unwrap()).map(|_| ())
    );
    assert_eq!(0, cache.computations_of(FILE, "c"))
}

#[test]
fn not_top_level() {
    let module = three_declarations();
    let mut builder = Builder::new();
    let body = builder.int(1);
    let stray = builder.function("stray", vec![], body);
    let cache = InferenceCache::new();
    let scope = ModuleScope::new(&module);
    let engine = Engine::new(FILE, &scope, &cache, InferenceConfig::default());

    assert_eq!(
        Err(Error::NotTopLevel {
            name: "stray".into()
        }),
        engine.infer(&stray).map(|_| ())
    );

    // a copy of a declaration isn't the declaration
    let copy = module.value("c").unwrap().clone();
    assert_eq!(
        Err(Error::NotTopLevel { name: "c".into() }),
        engine.infer(&copy).map(|_| ())
    )
}
