//! Shared fixtures for `addons_core` integration tests.
//!
//! Addons are described with [`Fixture`] and turned into a
//! [`StaticDiscovery`] over a [`Recorder`] collector. Every execute and
//! finalize call is appended to the recorder, so tests can check call order
//! after a session.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not all items used in every test binary"
)]

use addons_core::{
    AddonKey, Catalog, Collector, ConverterSpecs, Extra, FinalizeArgs, Hook, ImportError, Module,
    Register, RegisterConfig, SpecKey, StaticDiscovery,
};

pub const NS1: &str = "ns1";
pub const NS2: &str = "ns2";

pub fn key(namespace: &str, name: &str) -> AddonKey {
    AddonKey::new(namespace, name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDING COLLECTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute(AddonKey),
    Finalize(AddonKey, FinalizeArgs),
}

/// Collects every hook call and every registered converter.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    pub converters: Vec<(AddonKey, SpecKey, String)>,
}

impl Collector for Recorder {
    type Converter = String;

    fn register_converters(&mut self, key: &AddonKey, specs: &ConverterSpecs<Self::Converter>) {
        for (spec, converter) in specs {
            self.converters
                .push((key.clone(), spec.clone(), converter.clone()));
        }
    }
}

impl Recorder {
    /// Keys in execute-call order.
    pub fn executed(&self) -> Vec<AddonKey> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Execute(key) => Some(key.clone()),
                Call::Finalize(..) => None,
            })
            .collect()
    }

    /// Keys in finalize-call order.
    pub fn finalized(&self) -> Vec<AddonKey> {
        self.finalize_calls().into_iter().map(|(key, _)| key).collect()
    }

    pub fn finalize_calls(&self) -> Vec<(AddonKey, FinalizeArgs)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Finalize(key, args) => Some((key.clone(), args.clone())),
                Call::Execute(_) => None,
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// Declarative description of one addon.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub key: AddonKey,
    /// Declared on the execute hook, known before execution.
    pub static_deps: Vec<AddonKey>,
    /// Reported by the execute hook's result.
    pub dynamic_deps: Vec<AddonKey>,
    pub fails: bool,
}

impl Fixture {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            key: key(namespace, name),
            static_deps: Vec::new(),
            dynamic_deps: Vec::new(),
            fails: false,
        }
    }

    pub fn needs(mut self, namespace: &str, name: &str) -> Self {
        self.static_deps.push(key(namespace, name));
        self
    }

    pub fn reveals(mut self, namespace: &str, name: &str) -> Self {
        self.dynamic_deps.push(key(namespace, name));
        self
    }

    pub fn failing(mut self) -> Self {
        self.fails = true;
        self
    }

    /// Builds the module: one execute hook and one finalize hook.
    pub fn module(&self) -> Module<Recorder> {
        let declared = extras(&self.static_deps);
        let dynamic = extras(&self.dynamic_deps);
        let fails = self.fails;
        let finalize_key = self.key.clone();

        Module::<Recorder>::new(format!("{}_{}", self.key.namespace(), self.key.name()))
            .with_hook(Hook::execute("setup", declared, move |recorder: &mut Recorder, maker| {
                recorder.calls.push(Call::Execute(maker.key().clone()));
                if fails {
                    return Err(format!("{} failed", maker.key()).into());
                }
                let result = maker
                    .result()
                    .with_spec(SpecKey::new(0, [maker.key().name()]), maker.key().to_string());
                Ok(Some(dynamic.iter().cloned().fold(result, |result, extra| {
                    result.with_extra(extra)
                })))
            }))
            .with_hook(Hook::finalize("teardown", move |recorder: &mut Recorder, args| {
                recorder
                    .calls
                    .push(Call::Finalize(finalize_key.clone(), args.clone()));
                Ok(())
            }))
    }
}

fn extras(keys: &[AddonKey]) -> Vec<Extra> {
    keys.iter()
        .map(|key| Extra::one(key.namespace(), key.name()))
        .collect()
}

pub fn discovery(fixtures: &[Fixture]) -> StaticDiscovery<Recorder> {
    fixtures
        .iter()
        .fold(StaticDiscovery::new(), |discovery, fixture| {
            discovery.with_module(fixture.key.namespace(), fixture.key.name(), fixture.module())
        })
}

pub type TestRegister = Register<Recorder, StaticDiscovery<Recorder>>;

/// A register over `fixtures` owning both test namespaces.
pub fn register(fixtures: &[Fixture]) -> TestRegister {
    register_with(fixtures, RegisterConfig::default())
}

pub fn register_with(fixtures: &[Fixture], config: RegisterConfig) -> TestRegister {
    let catalog = Catalog::new(discovery(fixtures))
        .with_namespace(NS1)
        .with_namespace(NS2);
    Register::new(catalog, Recorder::default()).with_config(config)
}

/// A discovery whose `name` entry point always fails to import.
pub fn broken(
    discovery: StaticDiscovery<Recorder>,
    namespace: &str,
    name: &str,
) -> StaticDiscovery<Recorder> {
    let module = format!("{namespace}_{name}");
    let message = format!("cannot load {module}");
    discovery.with_entry_point(namespace, name, module, move || {
        Err(ImportError::new(message.clone()))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════════

/// Four seeds across two namespaces with shared, cross-namespace and
/// execution-revealed dependencies.
///
/// ```text
/// ns1.a -> ns1.e, ns2.f        ns2.c -> ns2.f
/// ns1.b -> ns1.e  (reveals ns2.i)
/// ns2.d -> ns1.g  (reveals ns1.a)
/// ns1.e -> ns2.h
/// ns2.i -> ns1.e  (reveals ns1.j)
/// ```
pub fn two_namespaces() -> Vec<Fixture> {
    vec![
        Fixture::new(NS1, "a").needs(NS1, "e").needs(NS2, "f"),
        Fixture::new(NS1, "b").needs(NS1, "e").reveals(NS2, "i"),
        Fixture::new(NS2, "c").needs(NS2, "f"),
        Fixture::new(NS2, "d").needs(NS1, "g").reveals(NS1, "a"),
        Fixture::new(NS1, "e").needs(NS2, "h"),
        Fixture::new(NS2, "f"),
        Fixture::new(NS1, "g"),
        Fixture::new(NS2, "h"),
        Fixture::new(NS2, "i").needs(NS1, "e").reveals(NS1, "j"),
        Fixture::new(NS1, "j"),
    ]
}

pub fn seeds() -> Vec<AddonKey> {
    vec![key(NS1, "a"), key(NS1, "b"), key(NS2, "c"), key(NS2, "d")]
}
