//! Error types for addon resolution.

use addons_layers::CycleError;

use crate::discovery::ImportError;
use crate::hook::HookError;
use crate::key::AddonKey;

/// One entry point that failed to import.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{handle}: {error}")]
pub struct ImportFailure {
    /// The entry point, as displayed by the discovery collaborator.
    pub handle: String,
    /// Why the import failed.
    pub error: ImportError,
}

/// Errors raised while importing, resolving or finalizing addons.
///
/// Every variant is fatal to the session under the default
/// [`FailurePolicy::Abort`](crate::FailurePolicy::Abort).
#[derive(Debug, thiserror::Error)]
pub enum AddonError {
    /// The namespace is known but nothing is registered under this name.
    #[error("no such addon: {key}")]
    NoSuchAddon {
        /// The requested addon.
        key: AddonKey,
    },

    /// At least one entry point of the addon failed to import.
    #[error("failed to import addon {key}: {}", join(.failures))]
    BadImport {
        /// The addon being imported.
        key: AddonKey,
        /// Every failed entry point.
        failures: Vec<ImportFailure>,
    },

    /// A hook raised during execute or finalize.
    #[error("hook '{hook}' of addon {key} failed: {source}")]
    BadHook {
        /// The addon owning the hook.
        key: AddonKey,
        /// The hook's name.
        hook: String,
        /// The error raised by the hook.
        #[source]
        source: HookError,
    },

    /// The dependency graph has no valid layering.
    #[error("cyclic addon dependency among {}", join(.0.nodes.as_slice()))]
    CyclicDependency(#[from] CycleError<AddonKey>),

    /// Skipped because a dependency failed. Only produced under
    /// [`FailurePolicy::Isolate`](crate::FailurePolicy::Isolate).
    #[error("addon {key} skipped: dependency {dependency} failed")]
    DependencyFailed {
        /// The skipped addon.
        key: AddonKey,
        /// The failed dependency.
        dependency: AddonKey,
    },

    /// Several independent failures from the same pass.
    #[error("{} addon errors: {}", .0.len(), join(.0))]
    Multiple(Vec<AddonError>),
}

impl AddonError {
    /// Returns the addon the error is about, if it concerns a single addon.
    #[must_use]
    pub fn key(&self) -> Option<&AddonKey> {
        match self {
            Self::NoSuchAddon { key }
            | Self::BadImport { key, .. }
            | Self::BadHook { key, .. }
            | Self::DependencyFailed { key, .. } => Some(key),
            Self::CyclicDependency(_) | Self::Multiple(_) => None,
        }
    }

    /// Returns the individual errors: the aggregated ones for
    /// [`Multiple`](Self::Multiple), otherwise just `self`.
    #[must_use]
    pub fn causes(&self) -> &[AddonError] {
        match self {
            Self::Multiple(errors) => errors,
            other => core::slice::from_ref(other),
        }
    }

    /// Folds the failures of one pass into a single result.
    pub(crate) fn check(mut errors: Vec<AddonError>) -> Result<(), AddonError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Multiple(errors)),
        }
    }
}

fn join<T: core::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
