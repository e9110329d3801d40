//! Dependency-ordered addon registration.
//!
//! The [`Register`] drives a session through three phases:
//!
//! 1. **Import** - Look up every known key. Each imported addon's static
//!    extras become known keys, until a pass imports nothing new.
//! 2. **Resolve** - Execute imported addons layer by layer. Results may name
//!    new keys (dynamic extras), so every resolve pass is followed by another
//!    import fixed point, until that import adds nothing.
//! 3. **Finalize** - Run finalize-phase hooks layer by layer, ordered by both
//!    static and dynamic dependencies.
//!
//! The layering is recomputed from scratch whenever it is needed. The graph
//! grows while the session runs, so nothing is cached between passes.
//!
//! # Example
//!
//! ```
//! use addons_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Host { finalized: Vec<String> }
//!
//! impl Collector for Host {
//!     type Converter = ();
//! }
//!
//! fn module(name: &str, deps: &[&str]) -> Module<Host> {
//!     let label = name.to_string();
//!     Module::<Host>::new(name)
//!         .with_hook(Hook::execute("run", [Extra::new("app", deps.to_vec())], |_, _| Ok(None)))
//!         .with_hook(Hook::finalize("done", move |host: &mut Host, _| {
//!             host.finalized.push(label.clone());
//!             Ok(())
//!         }))
//! }
//!
//! let discovery = StaticDiscovery::new()
//!     .with_module("app", "web", module("web", &["db"]))
//!     .with_module("app", "db", module("db", &["log"]))
//!     .with_module("app", "log", module("log", &[]));
//! let catalog = Catalog::new(discovery).with_namespace("app");
//!
//! let mut register = Register::new(catalog, Host::default());
//! register.register([("app", "web")], &NamespaceArgs::new()).unwrap();
//!
//! assert_eq!(register.collector().finalized, vec!["log", "db", "web"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use addons_layers::Layers;
use hashbrown::HashMap;
use indexmap::IndexSet;

use crate::addon::Addon;
use crate::catalog::Catalog;
use crate::config::{FailurePolicy, RegisterConfig};
use crate::discovery::Discovery;
use crate::error::AddonError;
use crate::hook::FinalizeArgs;
use crate::key::AddonKey;
use crate::result::{AddonResult, Collector};

/// Finalize arguments per namespace.
pub type NamespaceArgs = HashMap<String, FinalizeArgs>;

/// Which dependencies order a layering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Static dependencies only.
    Resolve,
    /// Static and dynamic dependencies.
    Finalize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Register
// ─────────────────────────────────────────────────────────────────────────────

/// Imports, resolves and finalizes addons in dependency order.
///
/// All state belongs to one session: create a register, drive it through
/// [`add`](Self::add), [`import_fixpoint`](Self::import_fixpoint),
/// [`resolve_fixpoint`](Self::resolve_fixpoint) and
/// [`finalize`](Self::finalize) (or [`register`](Self::register) for all four),
/// then drop it or take the collector back with
/// [`into_collector`](Self::into_collector).
///
/// Sets only grow during a session. The one exception is a key whose namespace
/// the catalog does not own: it is dropped from `known` when the import phase
/// reaches it.
pub struct Register<C: Collector, D> {
    /// Where addons come from.
    catalog: Catalog<D>,

    /// The host configuration passed to every hook.
    collector: C,

    config: RegisterConfig,

    /// Every key discovered so far, in discovery order.
    known: IndexSet<AddonKey>,

    /// Keys the catalog has imported.
    imported: BTreeMap<AddonKey, Addon<C>>,

    /// Keys whose execute-phase hooks have run.
    resolved: BTreeSet<AddonKey>,

    /// Keys whose finalize-phase hooks have run.
    finalized: BTreeSet<AddonKey>,

    /// Keys skipped under [`FailurePolicy::Isolate`].
    failed: BTreeSet<AddonKey>,

    /// Errors recorded under [`FailurePolicy::Isolate`].
    failures: Vec<AddonError>,
}

impl<C, D> Register<C, D>
where
    C: Collector,
    D: Discovery<C>,
{
    /// Creates a register with the default configuration.
    #[must_use]
    pub fn new(catalog: Catalog<D>, collector: C) -> Self {
        Self {
            catalog,
            collector,
            config: RegisterConfig::default(),
            known: IndexSet::new(),
            imported: BTreeMap::new(),
            resolved: BTreeSet::new(),
            finalized: BTreeSet::new(),
            failed: BTreeSet::new(),
            failures: Vec::new(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RegisterConfig) -> Self {
        self.config = config;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session API
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds keys to `known`. Keys already known are ignored.
    pub fn add<I, K>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = K>,
        K: Into<AddonKey>,
    {
        self.known.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Runs every phase: add, import, resolve and finalize.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any phase.
    pub fn register<I, K>(&mut self, keys: I, args_by_namespace: &NamespaceArgs) -> Result<(), AddonError>
    where
        I: IntoIterator<Item = K>,
        K: Into<AddonKey>,
    {
        self.add(keys);
        self.import_fixpoint()?;
        self.resolve_fixpoint()?;
        self.finalize(args_by_namespace)
    }

    /// Imports known keys until a pass imports nothing new.
    ///
    /// Returns true if anything was imported.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::NoSuchAddon`] or [`AddonError::BadImport`], or
    /// [`AddonError::Multiple`] when several keys of one pass fail. Keys of
    /// the failing pass that did import stay imported.
    pub fn import_fixpoint(&mut self) -> Result<bool, AddonError> {
        let mut added = false;
        let mut round = 0_usize;

        loop {
            round += 1;
            let progressed = self.import_pass()?;
            tracing::debug!(
                round,
                known = self.known.len(),
                imported = self.imported.len(),
                "import round complete"
            );
            if !progressed {
                break;
            }
            added = true;
        }

        Ok(added)
    }

    /// Executes imported addons in layer order, importing whatever they
    /// reveal, until a round imports nothing new.
    ///
    /// Returns the number of resolve rounds. That is 1 when no hook reports
    /// an extra that was not already imported.
    ///
    /// # Errors
    ///
    /// Any import error, [`AddonError::CyclicDependency`], and under
    /// [`FailurePolicy::Abort`] every [`AddonError::BadHook`] of the first
    /// failing layer.
    pub fn resolve_fixpoint(&mut self) -> Result<usize, AddonError> {
        let mut rounds = 0;

        loop {
            rounds += 1;
            self.resolve_pass()?;
            let imported_more = self.import_fixpoint()?;
            tracing::debug!(
                round = rounds,
                known = self.known.len(),
                imported = self.imported.len(),
                resolved = self.resolved.len(),
                "resolve round complete"
            );
            if !imported_more {
                break;
            }
        }

        Ok(rounds)
    }

    /// Runs finalize-phase hooks in layer order.
    ///
    /// Each addon receives `args_by_namespace[namespace]`, or empty arguments
    /// if its namespace has no entry. Addons already finalized by an earlier
    /// call are skipped.
    ///
    /// # Errors
    ///
    /// [`AddonError::CyclicDependency`], and under [`FailurePolicy::Abort`]
    /// every [`AddonError::BadHook`] of the first failing layer.
    pub fn finalize(&mut self, args_by_namespace: &NamespaceArgs) -> Result<(), AddonError> {
        let empty = FinalizeArgs::new();

        for layer in self.layered(Phase::Finalize)? {
            let mut errors = Vec::new();

            for key in layer {
                if self.finalized.contains(&key) || self.failed.contains(&key) {
                    continue;
                }
                if let Some(dependency) = self.failed_dependency(&key, Phase::Finalize) {
                    self.isolate(AddonError::DependencyFailed { key, dependency });
                    continue;
                }
                let Some(addon) = self.imported.get(&key) else {
                    continue;
                };

                let args = args_by_namespace.get(key.namespace()).unwrap_or(&empty);
                tracing::debug!(addon = %key, "finalizing addon");
                match addon.finalize(&mut self.collector, args) {
                    Ok(()) => {
                        self.finalized.insert(key);
                    }
                    Err(error) => self.fail(error, &mut errors),
                }
            }

            AddonError::check(errors)?;
        }

        Ok(())
    }

    /// Returns the current layering of imported keys.
    ///
    /// With `for_finalize` the layering follows static and dynamic
    /// dependencies, otherwise only static ones.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::CyclicDependency`] if no layering exists.
    pub fn layers(&self, for_finalize: bool) -> Result<Vec<Vec<AddonKey>>, AddonError> {
        let phase = if for_finalize {
            Phase::Finalize
        } else {
            Phase::Resolve
        };
        self.layered(phase)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Every known key, in discovery order.
    pub fn known(&self) -> impl Iterator<Item = &AddonKey> {
        self.known.iter()
    }

    /// Imported keys, sorted.
    pub fn imported_keys(&self) -> impl Iterator<Item = &AddonKey> {
        self.imported.keys()
    }

    /// Resolved keys, sorted.
    pub fn resolved_keys(&self) -> impl Iterator<Item = &AddonKey> {
        self.resolved.iter()
    }

    /// Finalized keys, sorted.
    pub fn finalized_keys(&self) -> impl Iterator<Item = &AddonKey> {
        self.finalized.iter()
    }

    /// Returns true if `key` is known.
    #[must_use]
    pub fn is_known(&self, key: &AddonKey) -> bool {
        self.known.contains(key)
    }

    /// Returns true if `key` has been resolved.
    #[must_use]
    pub fn is_resolved(&self, key: &AddonKey) -> bool {
        self.resolved.contains(key)
    }

    /// Returns the imported addon for `key`.
    #[must_use]
    pub fn addon(&self, key: &AddonKey) -> Option<&Addon<C>> {
        self.imported.get(key)
    }

    /// Returns the results of a resolved addon.
    #[must_use]
    pub fn results(&self, key: &AddonKey) -> Option<&[AddonResult<C::Converter>]> {
        if !self.resolved.contains(key) {
            return None;
        }
        self.imported.get(key).and_then(Addon::results)
    }

    /// Errors recorded under [`FailurePolicy::Isolate`].
    #[must_use]
    pub fn failures(&self) -> &[AddonError] {
        &self.failures
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog<D> {
        &self.catalog
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    /// Returns the collector.
    #[must_use]
    pub fn collector(&self) -> &C {
        &self.collector
    }

    /// Returns the collector mutably.
    #[must_use]
    pub fn collector_mut(&mut self) -> &mut C {
        &mut self.collector
    }

    /// Ends the session, returning the collector.
    #[must_use]
    pub fn into_collector(self) -> C {
        self.collector
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal: Passes
    // ─────────────────────────────────────────────────────────────────────────

    /// One lookup for every known key not imported yet.
    ///
    /// Keys added while the pass runs wait for the next pass, so addons are
    /// imported breadth-first.
    fn import_pass(&mut self) -> Result<bool, AddonError> {
        let pending: Vec<AddonKey> = self
            .known
            .iter()
            .filter(|key| !self.imported.contains_key(*key))
            .cloned()
            .collect();

        let mut added = false;
        let mut errors = Vec::new();

        for key in pending {
            match self.catalog.lookup(&key) {
                Ok(Some(addon)) => {
                    tracing::debug!(addon = %key, "imported addon");
                    let extras = addon.static_dependencies().to_vec();
                    self.imported.insert(key, addon);
                    self.known.extend(extras);
                    added = true;
                }
                Ok(None) => {
                    self.known.shift_remove(&key);
                }
                Err(error) => errors.push(error),
            }
        }

        AddonError::check(errors)?;
        Ok(added)
    }

    /// Executes every imported, unresolved addon in static layer order.
    fn resolve_pass(&mut self) -> Result<(), AddonError> {
        for layer in self.layered(Phase::Resolve)? {
            let mut errors = Vec::new();

            for key in layer {
                if self.resolved.contains(&key) || self.failed.contains(&key) {
                    continue;
                }
                if let Some(dependency) = self.failed_dependency(&key, Phase::Resolve) {
                    self.isolate(AddonError::DependencyFailed { key, dependency });
                    continue;
                }
                if let Err(error) = self.resolve(&key) {
                    self.fail(error, &mut errors);
                }
            }

            AddonError::check(errors)?;
        }

        Ok(())
    }

    /// Executes one addon, hands its converters to the collector and records
    /// what it revealed.
    fn resolve(&mut self, key: &AddonKey) -> Result<(), AddonError> {
        let Some(addon) = self.imported.get_mut(key) else {
            return Ok(());
        };

        tracing::debug!(addon = %key, "resolving addon");
        addon.execute(&mut self.collector)?;
        addon.process(&mut self.collector);
        let revealed = addon.dynamic_dependencies();

        self.resolved.insert(key.clone());
        self.known.extend(revealed);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal: Ordering and failures
    // ─────────────────────────────────────────────────────────────────────────

    fn layered(&self, phase: Phase) -> Result<Vec<Vec<AddonKey>>, AddonError> {
        let layers = Layers::from_fn(self.imported.keys().cloned(), |key| {
            self.dependencies_of(key, phase)
        });
        Ok(layers.layered()?)
    }

    fn dependencies_of(&self, key: &AddonKey, phase: Phase) -> Vec<AddonKey> {
        let Some(addon) = self.imported.get(key) else {
            return Vec::new();
        };
        match phase {
            Phase::Resolve => addon.static_dependencies().to_vec(),
            Phase::Finalize => addon.dependencies(),
        }
    }

    fn failed_dependency(&self, key: &AddonKey, phase: Phase) -> Option<AddonKey> {
        self.dependencies_of(key, phase)
            .into_iter()
            .find(|dep| self.failed.contains(dep))
    }

    /// Routes a hook failure according to the failure policy.
    fn fail(&mut self, error: AddonError, errors: &mut Vec<AddonError>) {
        match self.config.failure_policy {
            FailurePolicy::Abort => errors.push(error),
            FailurePolicy::Isolate => self.isolate(error),
        }
    }

    fn isolate(&mut self, error: AddonError) {
        tracing::error!(error = %error, "isolating failed addon");
        if let Some(key) = error.key() {
            self.failed.insert(key.clone());
        }
        self.failures.push(error);
    }
}
