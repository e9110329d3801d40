//! Addon identity.

use core::fmt;

/// Identifies an addon by `(namespace, name)`.
///
/// Keys order lexicographically by namespace, then name. The scheduler relies
/// on this ordering to break ties inside a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddonKey {
    namespace: String,
    name: String,
}

impl AddonKey {
    /// Creates a key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the addon name within its namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for AddonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl<N: Into<String>, M: Into<String>> From<(N, M)> for AddonKey {
    fn from((namespace, name): (N, M)) -> Self {
        Self::new(namespace, name)
    }
}

/// A group of dependencies declared in one namespace.
///
/// Names keep their declaration order and are deduplicated.
///
/// # Example
///
/// ```
/// use addons_core::{AddonKey, Extra};
///
/// let extra = Extra::new("green.addons", ["five", "nine", "five"]);
/// let keys: Vec<AddonKey> = extra.keys().collect();
/// assert_eq!(keys, vec![
///     AddonKey::new("green.addons", "five"),
///     AddonKey::new("green.addons", "nine"),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extra {
    namespace: String,
    names: Vec<String>,
}

impl Extra {
    /// Creates an extra for several names in `namespace`.
    #[must_use]
    pub fn new<I, S>(namespace: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !deduped.contains(&name) {
                deduped.push(name);
            }
        }
        Self {
            namespace: namespace.into(),
            names: deduped,
        }
    }

    /// Creates an extra for a single name.
    #[must_use]
    pub fn one(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, [name])
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the declared names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Expands into one key per name.
    pub fn keys(&self) -> impl Iterator<Item = AddonKey> + '_ {
        self.names
            .iter()
            .map(|name| AddonKey::new(self.namespace.clone(), name.clone()))
    }
}

/// Flattens extras into keys, dropping duplicates while keeping first-seen order.
pub(crate) fn unique_keys<'a>(extras: impl IntoIterator<Item = &'a Extra>) -> Vec<AddonKey> {
    let mut keys = Vec::new();
    for key in extras.into_iter().flat_map(Extra::keys) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
