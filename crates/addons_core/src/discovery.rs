//! Locating and importing addon code.
//!
//! The catalog does not know where addon code lives. It asks a [`Discovery`]
//! implementation for the entry points matching a `(namespace, name)` pair,
//! imports each one into a [`Module`], and reads the module's hook list.
//!
//! [`StaticDiscovery`] is an in-memory implementation for addons compiled into
//! the host binary, and for tests.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::hook::Hook;
use crate::key::AddonKey;
use crate::result::Collector;

/// Error raised while importing an entry point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ImportError {
    message: String,
}

impl ImportError {
    /// Creates an import error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Imported addon code: a named list of hooks.
pub struct Module<C: Collector> {
    name: String,
    hooks: Vec<Hook<C>>,
}

impl<C: Collector> Clone for Module<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<C: Collector> fmt::Debug for Module<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl<C: Collector> Module<C> {
    /// Creates a module without hooks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: Vec::new(),
        }
    }

    /// Adds a hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Hook<C>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the hooks in declaration order.
    #[must_use]
    pub fn hooks(&self) -> &[Hook<C>] {
        &self.hooks
    }

    /// Consumes the module, returning its hooks.
    #[must_use]
    pub fn into_hooks(self) -> Vec<Hook<C>> {
        self.hooks
    }
}

/// Finds and imports addon entry points.
pub trait Discovery<C: Collector> {
    /// An importable entry point. Displayed in import errors.
    type Handle: fmt::Display;

    /// Returns every entry point registered for `name` in `namespace`.
    fn find(&self, namespace: &str, name: &str) -> Vec<Self::Handle>;

    /// Imports an entry point.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] if the entry point cannot be loaded.
    fn import(&self, handle: &Self::Handle) -> Result<Module<C>, ImportError>;
}

type Loader<C> = Arc<dyn Fn() -> Result<Module<C>, ImportError> + Send + Sync>;

/// An entry point held by [`StaticDiscovery`].
pub struct EntryPoint<C: Collector> {
    module: String,
    loader: Loader<C>,
}

impl<C: Collector> Clone for EntryPoint<C> {
    fn clone(&self) -> Self {
        Self {
            module: self.module.clone(),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<C: Collector> fmt::Display for EntryPoint<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.module)
    }
}

/// In-memory entry point registry.
///
/// # Example
///
/// ```
/// use addons_core::{Collector, Discovery, Hook, ImportError, Module, StaticDiscovery};
///
/// struct Host;
/// impl Collector for Host {
///     type Converter = ();
/// }
///
/// let discovery = StaticDiscovery::<Host>::new()
///     .with_module("black.addons", "one", Module::new("black_one"))
///     .with_entry_point("black.addons", "two", "black_two", || {
///         Err(ImportError::new("missing symbol"))
///     });
///
/// let handles = discovery.find("black.addons", "one");
/// assert_eq!(handles.len(), 1);
/// assert_eq!(handles[0].to_string(), "black_one");
/// assert!(discovery.find("black.addons", "three").is_empty());
/// ```
pub struct StaticDiscovery<C: Collector> {
    entry_points: BTreeMap<AddonKey, Vec<EntryPoint<C>>>,
}

impl<C: Collector> Default for StaticDiscovery<C> {
    fn default() -> Self {
        Self {
            entry_points: BTreeMap::new(),
        }
    }
}

impl<C: Collector + 'static> StaticDiscovery<C> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already built module as an entry point.
    #[must_use]
    pub fn with_module(
        self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        module: Module<C>,
    ) -> Self {
        let module_name = module.name().to_string();
        self.with_entry_point(namespace, name, module_name, move || Ok(module.clone()))
    }

    /// Registers an entry point whose import runs `loader`.
    #[must_use]
    pub fn with_entry_point<F>(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        module: impl Into<String>,
        loader: F,
    ) -> Self
    where
        F: Fn() -> Result<Module<C>, ImportError> + Send + Sync + 'static,
    {
        self.entry_points
            .entry(AddonKey::new(namespace, name))
            .or_default()
            .push(EntryPoint {
                module: module.into(),
                loader: Arc::new(loader),
            });
        self
    }

    /// Returns the number of registered addon names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entry_points.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_points.is_empty()
    }
}

impl<C: Collector> Discovery<C> for StaticDiscovery<C> {
    type Handle = EntryPoint<C>;

    fn find(&self, namespace: &str, name: &str) -> Vec<Self::Handle> {
        self.entry_points
            .get(&AddonKey::new(namespace, name))
            .cloned()
            .unwrap_or_default()
    }

    fn import(&self, handle: &Self::Handle) -> Result<Module<C>, ImportError> {
        (handle.loader)()
    }
}
