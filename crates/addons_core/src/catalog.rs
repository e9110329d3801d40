//! Turning addon keys into imported [`Addon`]s.

use std::collections::BTreeSet;

use crate::addon::Addon;
use crate::discovery::{Discovery, Module};
use crate::error::{AddonError, ImportFailure};
use crate::key::AddonKey;
use crate::result::Collector;

/// Looks up addons in the namespaces it owns.
///
/// A lookup only imports code and reads hook metadata. No hook runs.
///
/// # Example
///
/// ```
/// use addons_core::{AddonKey, Catalog, Collector, Extra, Hook, Module, StaticDiscovery};
///
/// struct Host;
/// impl Collector for Host {
///     type Converter = ();
/// }
///
/// let discovery = StaticDiscovery::<Host>::new().with_module(
///     "black.addons",
///     "one",
///     Module::<Host>::new("black_one").with_hook(Hook::execute(
///         "hook",
///         [Extra::one("black.addons", "two")],
///         |_, _| Ok(None),
///     )),
/// );
/// let catalog = Catalog::new(discovery).with_namespace("black.addons");
///
/// let addon = catalog.lookup(&AddonKey::new("black.addons", "one")).unwrap().unwrap();
/// assert_eq!(addon.static_dependencies(), &[AddonKey::new("black.addons", "two")]);
///
/// // Namespaces the catalog does not own are skipped, not errors.
/// assert!(catalog.lookup(&AddonKey::new("white.addons", "one")).unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct Catalog<D> {
    discovery: D,
    namespaces: BTreeSet<String>,
}

impl<D> Catalog<D> {
    /// Creates a catalog that owns no namespace yet.
    #[must_use]
    pub fn new(discovery: D) -> Self {
        Self {
            discovery,
            namespaces: BTreeSet::new(),
        }
    }

    /// Takes ownership of `namespace`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.add_namespace(namespace);
        self
    }

    /// Takes ownership of `namespace`.
    pub fn add_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespaces.insert(namespace.into());
        self
    }

    /// Returns true if `namespace` is owned by this catalog.
    #[must_use]
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    /// Returns the owned namespaces, sorted.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }

    /// Returns the discovery collaborator.
    #[must_use]
    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    /// Imports the addon for `key`.
    ///
    /// Returns `Ok(None)` when the catalog does not own `key`'s namespace.
    ///
    /// # Errors
    ///
    /// - [`AddonError::NoSuchAddon`] if no entry point matches.
    /// - [`AddonError::BadImport`] if any entry point fails to import. All of
    ///   them are attempted first so the error lists every failure.
    pub fn lookup<C>(&self, key: &AddonKey) -> Result<Option<Addon<C>>, AddonError>
    where
        C: Collector,
        D: Discovery<C>,
    {
        if !self.has_namespace(key.namespace()) {
            tracing::warn!(
                namespace = key.namespace(),
                name = key.name(),
                available = ?self.namespaces,
                "unknown addon namespace"
            );
            return Ok(None);
        }

        let handles = self.discovery.find(key.namespace(), key.name());
        match handles.len() {
            0 => return Err(AddonError::NoSuchAddon { key: key.clone() }),
            1 => tracing::info!(addon = %key, "found addon"),
            count => tracing::warn!(addon = %key, count, "found multiple entry points"),
        }

        let mut modules = Vec::with_capacity(handles.len());
        let mut failures = Vec::new();
        for handle in &handles {
            match self.discovery.import(handle) {
                Ok(module) => {
                    tracing::debug!(addon = %key, module = module.name(), "imported entry point");
                    modules.push(module);
                }
                Err(error) => failures.push(ImportFailure {
                    handle: handle.to_string(),
                    error,
                }),
            }
        }

        if !failures.is_empty() {
            return Err(AddonError::BadImport {
                key: key.clone(),
                failures,
            });
        }

        let hooks = modules.into_iter().flat_map(Module::into_hooks);
        Ok(Some(Addon::new(key.clone(), hooks)))
    }
}
