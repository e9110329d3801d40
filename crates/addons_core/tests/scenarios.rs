//! End-to-end registration sessions over two namespaces.

mod common;

use addons_core::{AddonError, AddonKey, FinalizeArgs, NamespaceArgs};
use common::{Fixture, NS1, NS2, key, register, seeds, two_namespaces};
use serde_json::json;

fn args(value: serde_json::Value) -> FinalizeArgs {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn namespace_args() -> NamespaceArgs {
    let mut by_namespace = NamespaceArgs::new();
    by_namespace.insert(NS1.to_string(), args(json!({"a": 1})));
    by_namespace.insert(NS2.to_string(), args(json!({"b": 2})));
    by_namespace
}

fn keys(pairs: &[(&str, &str)]) -> Vec<AddonKey> {
    pairs.iter().map(|(ns, name)| key(ns, name)).collect()
}

fn position(order: &[AddonKey], key: &AddonKey) -> usize {
    order
        .iter()
        .position(|k| k == key)
        .unwrap_or_else(|| panic!("{key} missing from {order:?}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Import
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn import_follows_static_extras_breadth_first() {
    let mut register = register(&two_namespaces());
    register.add(seeds());

    assert!(register.import_fixpoint().unwrap());

    let known: Vec<AddonKey> = register.known().cloned().collect();
    assert_eq!(
        known,
        keys(&[
            (NS1, "a"),
            (NS1, "b"),
            (NS2, "c"),
            (NS2, "d"),
            (NS1, "e"),
            (NS2, "f"),
            (NS1, "g"),
            (NS2, "h"),
        ])
    );

    let imported: Vec<AddonKey> = register.imported_keys().cloned().collect();
    assert_eq!(
        imported,
        keys(&[
            (NS1, "a"),
            (NS1, "b"),
            (NS1, "e"),
            (NS1, "g"),
            (NS2, "c"),
            (NS2, "d"),
            (NS2, "f"),
            (NS2, "h"),
        ])
    );

    // Importing executes nothing.
    assert!(register.collector().calls.is_empty());
    assert!(!register.import_fixpoint().unwrap());
}

#[test]
fn static_layers_group_by_longest_path() {
    let mut register = register(&two_namespaces());
    register.add(seeds());
    register.import_fixpoint().unwrap();

    assert_eq!(
        register.layers(false).unwrap(),
        vec![
            keys(&[(NS1, "g"), (NS2, "f"), (NS2, "h")]),
            keys(&[(NS1, "e"), (NS2, "c"), (NS2, "d")]),
            keys(&[(NS1, "a"), (NS1, "b")]),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolve
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn resolve_imports_and_executes_revealed_addons() {
    let mut register = register(&two_namespaces());
    register.add(seeds());
    register.import_fixpoint().unwrap();

    // Round 1 reveals ns2.i, round 2 reveals ns1.j, round 3 reveals nothing.
    assert_eq!(register.resolve_fixpoint().unwrap(), 3);

    let executed = register.collector().executed();
    assert_eq!(
        executed,
        keys(&[
            (NS1, "g"),
            (NS2, "f"),
            (NS2, "h"),
            (NS1, "e"),
            (NS2, "c"),
            (NS2, "d"),
            (NS1, "a"),
            (NS1, "b"),
            (NS2, "i"),
            (NS1, "j"),
        ])
    );

    let resolved: Vec<AddonKey> = register.resolved_keys().cloned().collect();
    let imported: Vec<AddonKey> = register.imported_keys().cloned().collect();
    assert_eq!(resolved, imported);
    assert!(register.is_resolved(&key(NS2, "i")));
    assert!(register.is_resolved(&key(NS1, "j")));
}

#[test]
fn every_result_reaches_the_collector() {
    let mut register = register(&two_namespaces());
    register.add(seeds());
    register.import_fixpoint().unwrap();
    register.resolve_fixpoint().unwrap();

    let converters = &register.collector().converters;
    assert_eq!(converters.len(), 10);

    let (owner, spec, converter) = &converters[0];
    assert_eq!(owner, &key(NS1, "g"));
    assert_eq!(spec.to_string(), "0:g");
    assert_eq!(converter, "ns1.g");
}

#[test]
fn results_are_available_after_resolve() {
    let mut register = register(&two_namespaces());
    register.add(seeds());
    register.import_fixpoint().unwrap();

    assert!(register.results(&key(NS1, "b")).is_none());

    register.resolve_fixpoint().unwrap();

    let results = register.results(&key(NS1, "b")).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].dependencies(), vec![key(NS2, "i")]);

    let addon = register.addon(&key(NS1, "b")).unwrap();
    assert_eq!(addon.dependencies(), keys(&[(NS1, "e"), (NS2, "i")]));
}

#[test]
fn resolving_again_executes_nothing() {
    let mut register = register(&two_namespaces());
    register.add(seeds());
    register.import_fixpoint().unwrap();
    register.resolve_fixpoint().unwrap();
    let calls = register.collector().calls.len();

    assert_eq!(register.resolve_fixpoint().unwrap(), 1);
    assert_eq!(register.collector().calls.len(), calls);
}

#[test]
fn one_round_without_dynamic_extras() {
    let fixtures = vec![
        Fixture::new(NS1, "top").needs(NS1, "base"),
        Fixture::new(NS1, "base"),
    ];
    let mut register = register(&fixtures);
    register.add([(NS1, "top")]);
    register.import_fixpoint().unwrap();

    assert_eq!(register.resolve_fixpoint().unwrap(), 1);
    assert_eq!(register.collector().executed(), keys(&[(NS1, "base"), (NS1, "top")]));
}

// ─────────────────────────────────────────────────────────────────────────────
// Finalize
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn finalize_layers_include_dynamic_dependencies() {
    let mut register = register(&two_namespaces());
    register.add(seeds());
    register.import_fixpoint().unwrap();
    register.resolve_fixpoint().unwrap();

    assert_eq!(
        register.layers(true).unwrap(),
        vec![
            keys(&[(NS1, "g"), (NS1, "j"), (NS2, "f"), (NS2, "h")]),
            keys(&[(NS1, "e"), (NS2, "c")]),
            keys(&[(NS1, "a"), (NS2, "i")]),
            keys(&[(NS1, "b"), (NS2, "d")]),
        ]
    );
}

#[test]
fn register_finalizes_after_every_dependency() {
    let fixtures = two_namespaces();
    let mut register = register(&fixtures);
    register.register(seeds(), &namespace_args()).unwrap();

    let finalized = register.collector().finalized();
    assert_eq!(
        finalized,
        keys(&[
            (NS1, "g"),
            (NS1, "j"),
            (NS2, "f"),
            (NS2, "h"),
            (NS1, "e"),
            (NS2, "c"),
            (NS1, "a"),
            (NS2, "i"),
            (NS1, "b"),
            (NS2, "d"),
        ])
    );

    for fixture in &fixtures {
        let at = position(&finalized, &fixture.key);
        for dep in fixture.static_deps.iter().chain(&fixture.dynamic_deps) {
            assert!(
                position(&finalized, dep) < at,
                "{dep} must be finalized before {}",
                fixture.key
            );
        }
    }
}

#[test]
fn finalize_passes_namespace_args() {
    let mut register = register(&two_namespaces());
    register.register(seeds(), &namespace_args()).unwrap();

    let ns1 = args(json!({"a": 1}));
    let ns2 = args(json!({"b": 2}));
    for (key, received) in register.collector().finalize_calls() {
        let expected = if key.namespace() == NS1 { &ns1 } else { &ns2 };
        assert_eq!(&received, expected, "arguments for {key}");
    }
}

#[test]
fn namespace_without_args_gets_empty_args() {
    let mut register = register(&two_namespaces());
    let mut by_namespace = NamespaceArgs::new();
    by_namespace.insert(NS1.to_string(), args(json!({"a": 1})));
    register.register(seeds(), &by_namespace).unwrap();

    for (key, received) in register.collector().finalize_calls() {
        if key.namespace() == NS2 {
            assert!(received.is_empty(), "{key} received {received:?}");
        }
    }
}

#[test]
fn finalize_runs_once_per_addon() {
    let mut register = register(&two_namespaces());
    register.register(seeds(), &namespace_args()).unwrap();
    let calls = register.collector().calls.len();

    register.finalize(&namespace_args()).unwrap();

    assert_eq!(register.collector().calls.len(), calls);
    assert_eq!(register.finalized_keys().count(), 10);
}

#[test]
fn seed_order_does_not_change_call_order() {
    let mut forward = register(&two_namespaces());
    forward.register(seeds(), &namespace_args()).unwrap();

    let mut backward = register(&two_namespaces());
    backward
        .register(seeds().into_iter().rev(), &namespace_args())
        .unwrap();

    assert_eq!(forward.collector().executed(), backward.collector().executed());
    assert_eq!(forward.collector().finalized(), backward.collector().finalized());
}

#[test]
fn collector_is_returned_at_the_end() {
    let mut register = register(&two_namespaces());
    register.register(seeds(), &namespace_args()).unwrap();

    let recorder = register.into_collector();
    assert_eq!(recorder.calls.len(), 20);
}

// ─────────────────────────────────────────────────────────────────────────────
// Cycles
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn static_cycle_is_reported() {
    let fixtures = vec![
        Fixture::new(NS1, "a").needs(NS1, "b"),
        Fixture::new(NS1, "b").needs(NS1, "a"),
    ];
    let mut register = register(&fixtures);

    let err = register
        .register([(NS1, "a")], &NamespaceArgs::new())
        .unwrap_err();

    let AddonError::CyclicDependency(cycle) = &err else {
        panic!("expected a cycle, got {err}");
    };
    assert_eq!(cycle.nodes, keys(&[(NS1, "a"), (NS1, "b")]));
    assert!(register.collector().calls.is_empty());
}

#[test]
fn cycle_through_revealed_dependency_fails_finalize() {
    let fixtures = vec![
        Fixture::new(NS1, "a").needs(NS1, "b"),
        Fixture::new(NS1, "b").reveals(NS1, "a"),
    ];
    let mut register = register(&fixtures);
    register.add([(NS1, "a")]);
    register.import_fixpoint().unwrap();
    register.resolve_fixpoint().unwrap();

    let err = register.finalize(&NamespaceArgs::new()).unwrap_err();

    assert!(matches!(err, AddonError::CyclicDependency(_)), "{err}");
    assert!(register.collector().finalized().is_empty());
}
