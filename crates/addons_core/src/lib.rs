//! Addon discovery and dependency-ordered registration.
//!
//! `addons_core` loads addons named by `(namespace, name)` keys, runs their
//! hooks so that every addon sees the work of the addons it depends on, and
//! finalizes them in the same order:
//!
//! - [`key`] - Addon keys and extras (dependency declarations)
//! - [`hook`] - Hooks and the metadata that places them in a phase
//! - [`result`] - Execution results and the [`Collector`] they are handed to
//! - [`discovery`] - Finding and importing entry points
//! - [`catalog`] - Namespaced addon lookup
//! - [`addon`] - One imported addon and its memoized execution
//! - [`register`] - The session that imports, resolves and finalizes addons
//! - [`config`] - Register configuration
//! - [`error`] - Error types
//!
//! # Phases
//!
//! A [`Register`] imports every requested key and everything those addons
//! declare statically, then executes addons layer by layer. Results can name
//! further addons, which are imported and executed in turn until nothing new
//! appears. Finally, finalize-phase hooks run layer by layer over the complete
//! graph. Layers come from [`addons_layers`]: an addon sits one layer above
//! the deepest addon it depends on.
//!
//! # Example
//!
//! ```
//! use addons_core::{
//!     AddonKey, Catalog, Collector, ConverterSpecs, Extra, Hook, Module, NamespaceArgs, Register,
//!     StaticDiscovery,
//! };
//!
//! #[derive(Default)]
//! struct Host { converters: usize }
//!
//! impl Collector for Host {
//!     type Converter = &'static str;
//!
//!     fn register_converters(
//!         &mut self,
//!         _key: &AddonKey,
//!         specs: &ConverterSpecs<Self::Converter>,
//!     ) {
//!         self.converters += specs.len();
//!     }
//! }
//!
//! let black = Module::<Host>::new("black_addon").with_hook(Hook::execute(
//!     "convert",
//!     [Extra::one("json.addons", "schema")],
//!     |_, maker| Ok(Some(maker.result().with_spec("black", "converter"))),
//! ));
//! let schema = Module::<Host>::new("schema_addon");
//!
//! let discovery = StaticDiscovery::new()
//!     .with_module("black.addons", "core", black)
//!     .with_module("json.addons", "schema", schema);
//! let catalog = Catalog::new(discovery)
//!     .with_namespace("black.addons")
//!     .with_namespace("json.addons");
//!
//! let mut register = Register::new(catalog, Host::default());
//! register
//!     .register([("black.addons", "core")], &NamespaceArgs::new())
//!     .unwrap();
//!
//! assert_eq!(register.collector().converters, 1);
//! assert_eq!(register.layers(true).unwrap().len(), 2);
//! ```

/// Imported addons and their memoized execution.
pub mod addon;

/// Namespaced addon lookup.
pub mod catalog;

/// Register configuration.
pub mod config;

/// Finding and importing entry points.
pub mod discovery;

/// Error types.
pub mod error;

/// Hooks and hook metadata.
pub mod hook;

/// Addon keys and extras.
pub mod key;

/// Dependency-ordered registration sessions.
pub mod register;

/// Execution results and collectors.
pub mod result;

pub use addon::Addon;
pub use addons_layers::{CycleError, Layers};
pub use catalog::Catalog;
pub use config::{FailurePolicy, RegisterConfig};
pub use discovery::{Discovery, EntryPoint, ImportError, Module, StaticDiscovery};
pub use error::{AddonError, ImportFailure};
pub use hook::{
    ExecuteFn, FinalizeArgs, FinalizeFn, Hook, HookDescriptor, HookError, HookFn, HookOutput,
    InvalidHook, ResultMaker,
};
pub use key::{AddonKey, Extra};
pub use register::{NamespaceArgs, Register};
pub use result::{AddonResult, Collector, ConverterSpecs, SpecKey};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::addon::*;
    pub use crate::catalog::*;
    pub use crate::config::*;
    pub use crate::discovery::*;
    pub use crate::error::*;
    pub use crate::hook::*;
    pub use crate::key::*;
    pub use crate::register::*;
    pub use crate::result::*;
}
