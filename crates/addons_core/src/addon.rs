//! A single imported addon.
//!
//! An [`Addon`] owns the hooks of every module imported for one
//! [`AddonKey`], split by phase. Static dependencies are read from hook
//! metadata when the addon is built. Execution is lazy and memoized: the
//! execute-phase hooks run on the first call to [`Addon::execute`] and never
//! again, however many dependents need the addon.

use core::fmt;

use crate::error::AddonError;
use crate::hook::{FinalizeArgs, Hook, HookFn, ResultMaker};
use crate::key::{AddonKey, unique_keys};
use crate::result::{AddonResult, Collector};

/// An imported addon and its cached execution results.
pub struct Addon<C: Collector> {
    key: AddonKey,
    execute_hooks: Vec<Hook<C>>,
    finalize_hooks: Vec<Hook<C>>,
    static_extras: Vec<AddonKey>,
    results: Option<Vec<AddonResult<C::Converter>>>,
}

impl<C: Collector> fmt::Debug for Addon<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Addon")
            .field("key", &self.key)
            .field("execute_hooks", &self.execute_hooks.len())
            .field("finalize_hooks", &self.finalize_hooks.len())
            .field("static_extras", &self.static_extras)
            .field("executed", &self.results.is_some())
            .finish()
    }
}

impl<C: Collector> Addon<C> {
    /// Builds an addon from its hooks, in declaration order.
    pub fn new(key: AddonKey, hooks: impl IntoIterator<Item = Hook<C>>) -> Self {
        let (finalize_hooks, execute_hooks): (Vec<_>, Vec<_>) =
            hooks.into_iter().partition(Hook::is_finalize_phase);

        let static_extras = unique_keys(
            execute_hooks
                .iter()
                .flat_map(|hook| hook.descriptor().extras()),
        );

        Self {
            key,
            execute_hooks,
            finalize_hooks,
            static_extras,
            results: None,
        }
    }

    /// Returns the addon's key.
    #[must_use]
    pub fn key(&self) -> &AddonKey {
        &self.key
    }

    /// Returns the execute-phase hooks.
    #[must_use]
    pub fn execute_hooks(&self) -> &[Hook<C>] {
        &self.execute_hooks
    }

    /// Returns the finalize-phase hooks.
    #[must_use]
    pub fn finalize_hooks(&self) -> &[Hook<C>] {
        &self.finalize_hooks
    }

    /// Dependencies declared on execute-phase hooks. Available without executing.
    #[must_use]
    pub fn static_dependencies(&self) -> &[AddonKey] {
        &self.static_extras
    }

    /// Returns true once [`execute`](Self::execute) has succeeded.
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.results.is_some()
    }

    /// Returns the cached results, if executed.
    #[must_use]
    pub fn results(&self) -> Option<&[AddonResult<C::Converter>]> {
        self.results.as_deref()
    }

    /// Runs every execute-phase hook once and caches the results.
    ///
    /// Later calls return the cached results without invoking anything.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::BadHook`] for the first hook that fails. Nothing is
    /// cached in that case.
    pub fn execute(&mut self, collector: &mut C) -> Result<&[AddonResult<C::Converter>], AddonError> {
        if self.results.is_none() {
            let maker = ResultMaker::new(&self.key);
            let mut results = Vec::new();

            for hook in &self.execute_hooks {
                let HookFn::Execute(run) = hook.call() else {
                    continue;
                };
                tracing::debug!(addon = %self.key, hook = hook.name(), "running execute hook");
                match run(collector, &maker) {
                    Ok(Some(result)) => results.push(result),
                    Ok(None) => {}
                    Err(source) => {
                        return Err(AddonError::BadHook {
                            key: self.key.clone(),
                            hook: hook.name().to_string(),
                            source,
                        });
                    }
                }
            }

            self.results = Some(results);
        }

        Ok(self.results.as_deref().unwrap_or_default())
    }

    /// Dependencies reported by execution results. Empty before execution.
    #[must_use]
    pub fn dynamic_dependencies(&self) -> Vec<AddonKey> {
        self.results
            .as_deref()
            .map(|results| unique_keys(results.iter().flat_map(AddonResult::extras)))
            .unwrap_or_default()
    }

    /// Static dependencies followed by dynamic ones, deduplicated.
    #[must_use]
    pub fn dependencies(&self) -> Vec<AddonKey> {
        let mut deps = self.static_extras.clone();
        for key in self.dynamic_dependencies() {
            if !deps.contains(&key) {
                deps.push(key);
            }
        }
        deps
    }

    /// Hands the converters of every cached result to the collector.
    pub fn process(&self, collector: &mut C) {
        for result in self.results.as_deref().unwrap_or_default() {
            collector.register_converters(&self.key, result.specs());
        }
    }

    /// Runs every finalize-phase hook with `args`.
    ///
    /// Not memoized. The register makes sure it happens once per session.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::BadHook`] for the first hook that fails.
    pub fn finalize(&self, collector: &mut C, args: &FinalizeArgs) -> Result<(), AddonError> {
        for hook in &self.finalize_hooks {
            let HookFn::Finalize(run) = hook.call() else {
                continue;
            };
            tracing::debug!(addon = %self.key, hook = hook.name(), "running finalize hook");
            run(collector, args).map_err(|source| AddonError::BadHook {
                key: self.key.clone(),
                hook: hook.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}
