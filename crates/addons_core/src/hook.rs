//! Hooks: the callables an addon module exposes.
//!
//! A module does not get scanned for flagged functions. It lists its hooks
//! explicitly, each one built with [`Hook::execute`] or [`Hook::finalize`].
//!
//! - **Execute-phase** hooks run once per addon, in declaration order, and may
//!   return an [`AddonResult`]. Their declared extras are the addon's *static*
//!   dependencies, known without running anything.
//! - **Finalize-phase** hooks run after every addon has resolved and receive
//!   per-namespace arguments. They cannot declare extras.
//!
//! # Example
//!
//! ```
//! use addons_core::{AddonResult, Collector, Extra, Hook};
//!
//! #[derive(Default)]
//! struct Settings { finalized: Vec<String> }
//!
//! impl Collector for Settings {
//!     type Converter = u32;
//! }
//!
//! let register = Hook::<Settings>::execute(
//!     "register",
//!     [Extra::one("green.addons", "five")],
//!     |_settings, maker| Ok(Some(maker.result().with_spec("port", 8080))),
//! );
//! let finalize = Hook::<Settings>::finalize("finalize", |settings, args| {
//!     settings.finalized.push(format!("{args:?}"));
//!     Ok(())
//! });
//!
//! assert!(!register.is_finalize_phase());
//! assert!(finalize.is_finalize_phase());
//! ```

use core::fmt;
use std::sync::Arc;

use crate::key::{AddonKey, Extra};
use crate::result::{AddonResult, Collector};

/// Error raised by a hook.
pub type HookError = Box<dyn core::error::Error + Send + Sync>;

/// Arguments passed to finalize-phase hooks.
pub type FinalizeArgs = serde_json::Map<String, serde_json::Value>;

/// What an execute-phase hook returns. `None` means "nothing to contribute".
pub type HookOutput<V> = Result<Option<AddonResult<V>>, HookError>;

/// Execute-phase callable.
pub type ExecuteFn<C> = Arc<
    dyn Fn(&mut C, &ResultMaker<'_>) -> HookOutput<<C as Collector>::Converter> + Send + Sync,
>;

/// Finalize-phase callable.
pub type FinalizeFn<C> = Arc<dyn Fn(&mut C, &FinalizeArgs) -> Result<(), HookError> + Send + Sync>;

/// Rejected hook metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("finalize-phase hooks cannot declare extras")]
pub struct InvalidHook;

/// Static metadata of a hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookDescriptor {
    extras: Vec<Extra>,
    is_finalize_phase: bool,
}

impl HookDescriptor {
    /// Validates and creates a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHook`] if a finalize-phase descriptor declares extras.
    pub fn new(extras: Vec<Extra>, is_finalize_phase: bool) -> Result<Self, InvalidHook> {
        if is_finalize_phase && extras.iter().any(|extra| !extra.names().is_empty()) {
            return Err(InvalidHook);
        }
        Ok(Self {
            extras,
            is_finalize_phase,
        })
    }

    /// Descriptor of an execute-phase hook.
    #[must_use]
    pub fn execute(extras: impl IntoIterator<Item = Extra>) -> Self {
        Self {
            extras: extras.into_iter().collect(),
            is_finalize_phase: false,
        }
    }

    /// Descriptor of a finalize-phase hook.
    #[must_use]
    pub fn finalize() -> Self {
        Self {
            extras: Vec::new(),
            is_finalize_phase: true,
        }
    }

    /// Returns the declared extras.
    #[must_use]
    pub fn extras(&self) -> &[Extra] {
        &self.extras
    }

    /// Returns true for finalize-phase hooks.
    #[must_use]
    pub fn is_finalize_phase(&self) -> bool {
        self.is_finalize_phase
    }
}

/// The callable of a hook. Its variant decides the phase.
pub enum HookFn<C: Collector> {
    /// Runs while resolving.
    Execute(ExecuteFn<C>),
    /// Runs once everything has resolved.
    Finalize(FinalizeFn<C>),
}

impl<C: Collector> HookFn<C> {
    /// Returns true for [`HookFn::Finalize`].
    #[must_use]
    pub fn is_finalize_phase(&self) -> bool {
        matches!(self, Self::Finalize(_))
    }
}

impl<C: Collector> Clone for HookFn<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Execute(f) => Self::Execute(Arc::clone(f)),
            Self::Finalize(f) => Self::Finalize(Arc::clone(f)),
        }
    }
}

/// A named callable with its [`HookDescriptor`].
pub struct Hook<C: Collector> {
    name: String,
    descriptor: HookDescriptor,
    call: HookFn<C>,
}

impl<C: Collector> Clone for Hook<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
            call: self.call.clone(),
        }
    }
}

impl<C: Collector> fmt::Debug for Hook<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<C: Collector> Hook<C> {
    /// Creates a hook from declared extras and a callable.
    ///
    /// The phase follows the callable. [`execute`](Self::execute) and
    /// [`finalize`](Self::finalize) are the infallible shorthands.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHook`] if a finalize-phase callable declares extras.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use addons_core::{Collector, Extra, FinalizeArgs, Hook, HookError, HookFn, InvalidHook};
    ///
    /// struct Host;
    /// impl Collector for Host {
    ///     type Converter = ();
    /// }
    ///
    /// let finalize = HookFn::<Host>::Finalize(Arc::new(
    ///     |_: &mut Host, _: &FinalizeArgs| -> Result<(), HookError> { Ok(()) },
    /// ));
    /// let result = Hook::new("late", [Extra::one("ns", "a")], finalize);
    /// assert_eq!(result.unwrap_err(), InvalidHook);
    /// ```
    pub fn new(
        name: impl Into<String>,
        extras: impl IntoIterator<Item = Extra>,
        call: HookFn<C>,
    ) -> Result<Self, InvalidHook> {
        let descriptor =
            HookDescriptor::new(extras.into_iter().collect(), call.is_finalize_phase())?;
        Ok(Self {
            name: name.into(),
            descriptor,
            call,
        })
    }

    /// Creates an execute-phase hook declaring `extras`.
    pub fn execute<F>(name: impl Into<String>, extras: impl IntoIterator<Item = Extra>, f: F) -> Self
    where
        F: Fn(&mut C, &ResultMaker<'_>) -> HookOutput<C::Converter> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            descriptor: HookDescriptor::execute(extras),
            call: HookFn::Execute(Arc::new(f)),
        }
    }

    /// Creates a finalize-phase hook.
    pub fn finalize<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut C, &FinalizeArgs) -> Result<(), HookError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            descriptor: HookDescriptor::finalize(),
            call: HookFn::Finalize(Arc::new(f)),
        }
    }

    /// Returns the hook's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the hook's metadata.
    #[must_use]
    pub fn descriptor(&self) -> &HookDescriptor {
        &self.descriptor
    }

    /// Returns true for finalize-phase hooks.
    #[must_use]
    pub fn is_finalize_phase(&self) -> bool {
        self.descriptor.is_finalize_phase()
    }

    /// Returns the hook's callable.
    #[must_use]
    pub fn call(&self) -> &HookFn<C> {
        &self.call
    }
}

/// Result constructor handed to execute-phase hooks.
#[derive(Debug, Clone, Copy)]
pub struct ResultMaker<'a> {
    key: &'a AddonKey,
}

impl<'a> ResultMaker<'a> {
    pub(crate) fn new(key: &'a AddonKey) -> Self {
        Self { key }
    }

    /// Returns the key of the addon being executed.
    #[must_use]
    pub fn key(&self) -> &'a AddonKey {
        self.key
    }

    /// Creates an empty result.
    #[must_use]
    pub fn result<V>(&self) -> AddonResult<V> {
        AddonResult::new()
    }

    /// Builds an extra in the executing addon's own namespace.
    #[must_use]
    pub fn local_extra<I, S>(&self, names: I) -> Extra
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Extra::new(self.key.namespace(), names)
    }
}
