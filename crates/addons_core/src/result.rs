//! Values produced by execute-phase hooks.

use core::fmt;
use std::collections::BTreeMap;

use crate::key::{AddonKey, Extra, unique_keys};

/// Key under which a converter is registered.
///
/// Normalised to a `(priority, path)` pair. Plain strings and string
/// sequences get priority `0`.
///
/// ```
/// use addons_core::SpecKey;
///
/// assert_eq!(SpecKey::from("port"), SpecKey::new(0, ["port"]));
/// assert_eq!(SpecKey::from(["server", "port"]), SpecKey::new(0, ["server", "port"]));
/// assert_eq!(SpecKey::from((5, ["server"])).priority(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecKey {
    priority: i64,
    path: Vec<String>,
}

impl SpecKey {
    /// Creates a key with an explicit priority.
    #[must_use]
    pub fn new<I, S>(priority: i64, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            priority,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the priority.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Returns the path segments.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl fmt::Display for SpecKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.priority, self.path.join("."))
    }
}

impl From<&str> for SpecKey {
    fn from(value: &str) -> Self {
        Self::new(0, [value])
    }
}

impl From<String> for SpecKey {
    fn from(value: String) -> Self {
        Self::new(0, [value])
    }
}

impl<S: Into<String>> From<Vec<S>> for SpecKey {
    fn from(value: Vec<S>) -> Self {
        Self::new(0, value)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for SpecKey {
    fn from(value: [S; N]) -> Self {
        Self::new(0, value)
    }
}

impl<S: Into<String>, const N: usize> From<(i64, [S; N])> for SpecKey {
    fn from((priority, path): (i64, [S; N])) -> Self {
        Self::new(priority, path)
    }
}

/// Converters keyed by [`SpecKey`].
pub type ConverterSpecs<V> = BTreeMap<SpecKey, V>;

/// What one execute-phase hook contributes.
///
/// `specs` are handed to the [`Collector`] once the owning addon has executed.
/// `extras` are dependencies only discovered by running the hook.
#[derive(Debug, Clone)]
pub struct AddonResult<V> {
    specs: ConverterSpecs<V>,
    extras: Vec<Extra>,
}

impl<V> Default for AddonResult<V> {
    fn default() -> Self {
        Self {
            specs: BTreeMap::new(),
            extras: Vec::new(),
        }
    }
}

impl<V> AddonResult<V> {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter under `key`.
    #[must_use]
    pub fn with_spec(mut self, key: impl Into<SpecKey>, converter: V) -> Self {
        self.specs.insert(key.into(), converter);
        self
    }

    /// Declares a dynamic dependency group.
    #[must_use]
    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extras.push(extra);
        self
    }

    /// Declares dynamic dependencies on `names` in `namespace`.
    #[must_use]
    pub fn with_extras<I, S>(self, namespace: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_extra(Extra::new(namespace, names))
    }

    /// Returns the registered converters.
    #[must_use]
    pub fn specs(&self) -> &ConverterSpecs<V> {
        &self.specs
    }

    /// Returns the declared dependency groups.
    #[must_use]
    pub fn extras(&self) -> &[Extra] {
        &self.extras
    }

    /// Returns the dependency keys, deduplicated.
    #[must_use]
    pub fn dependencies(&self) -> Vec<AddonKey> {
        unique_keys(&self.extras)
    }
}

/// Host configuration threaded through every hook invocation.
///
/// The scheduler never looks inside a collector. Its only interaction is
/// [`register_converters`](Self::register_converters), called once per executed
/// addon with the specs of each result. Hooks receive the collector mutably and
/// may change it however they like.
///
/// A collector must not be shared by two registers running at the same time;
/// nothing in this crate synchronises access to it.
pub trait Collector {
    /// Converter type carried in [`AddonResult::specs`].
    type Converter;

    /// Receives the converters of one result of an executed addon.
    ///
    /// The default implementation ignores them.
    fn register_converters(&mut self, _key: &AddonKey, _specs: &ConverterSpecs<Self::Converter>) {}
}
