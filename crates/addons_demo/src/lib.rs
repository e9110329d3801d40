//! In-memory addon set driven end to end.
//!
//! Two namespaces of addons build up a small service configuration:
//!
//! ```text
//! app.addons:server  -> app.addons:http, app.addons:logging  (reveals ext.addons:metrics)
//! app.addons:http    -> app.addons:logging
//! app.addons:db      -> app.addons:logging
//! ext.addons:metrics -> app.addons:http
//! ext.addons:report  -> ext.addons:audit                     (audit always fails)
//! ```
//!
//! Every execute hook contributes one converter to [`Settings`], and every
//! finalize hook records the arguments it was given.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use addons_core::{
    AddonError, AddonKey, Catalog, Collector, ConverterSpecs, Extra, FinalizeArgs, Hook, Module,
    NamespaceArgs, Register, RegisterConfig, SpecKey, StaticDiscovery,
};

/// Namespace of the core addons.
pub const APP: &str = "app.addons";

/// Namespace of the optional addons.
pub const EXT: &str = "ext.addons";

/// Errors raised while reading command-line input.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// A key was not written as `namespace:name`.
    #[error("invalid addon key '{0}', expected namespace:name")]
    Key(String),

    /// A finalize argument was not written as `namespace=<json object>`.
    #[error("invalid finalize argument '{0}', expected namespace=<json object>")]
    Arg(String),

    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Collector
// ─────────────────────────────────────────────────────────────────────────────

/// Collected service configuration.
#[derive(Debug, Default)]
pub struct Settings {
    /// Converters by spec key, with the addon that registered them.
    pub converters: BTreeMap<SpecKey, (AddonKey, String)>,
    /// One entry per finalized addon, in call order.
    pub finalized: Vec<(AddonKey, FinalizeArgs)>,
}

impl Collector for Settings {
    type Converter = String;

    fn register_converters(&mut self, key: &AddonKey, specs: &ConverterSpecs<Self::Converter>) {
        for (spec, converter) in specs {
            self.converters
                .insert(spec.clone(), (key.clone(), converter.clone()));
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Addons
// ─────────────────────────────────────────────────────────────────────────────

fn addon(
    namespace: &'static str,
    name: &'static str,
    priority: i64,
    needs: Vec<Extra>,
    reveals: Vec<Extra>,
) -> Module<Settings> {
    let key = AddonKey::new(namespace, name);
    Module::<Settings>::new(format!("{name}_addon"))
        .with_hook(Hook::execute("configure", needs, move |_, maker| {
            let result = maker
                .result()
                .with_spec(SpecKey::new(priority, [name]), format!("{name} converter"));
            Ok(Some(reveals.iter().cloned().fold(result, |result, extra| {
                result.with_extra(extra)
            })))
        }))
        .with_hook(Hook::finalize("finish", move |settings: &mut Settings, args| {
            tracing::info!(addon = %key, "finished");
            settings.finalized.push((key.clone(), args.clone()));
            Ok(())
        }))
}

fn failing(name: &'static str, message: &'static str) -> Module<Settings> {
    Module::<Settings>::new(format!("{name}_addon")).with_hook(Hook::execute(
        "configure",
        [],
        move |_, _| Err(message.into()),
    ))
}

/// The demo catalog over both namespaces.
#[must_use]
pub fn catalog() -> Catalog<StaticDiscovery<Settings>> {
    let discovery = StaticDiscovery::new()
        .with_module(
            APP,
            "server",
            addon(
                APP,
                "server",
                20,
                vec![Extra::new(APP, ["http", "logging"])],
                vec![Extra::one(EXT, "metrics")],
            ),
        )
        .with_module(
            APP,
            "http",
            addon(APP, "http", 10, vec![Extra::one(APP, "logging")], Vec::new()),
        )
        .with_module(
            APP,
            "db",
            addon(APP, "db", 10, vec![Extra::one(APP, "logging")], Vec::new()),
        )
        .with_module(APP, "logging", addon(APP, "logging", 0, Vec::new(), Vec::new()))
        .with_module(
            EXT,
            "metrics",
            addon(EXT, "metrics", 30, vec![Extra::one(APP, "http")], Vec::new()),
        )
        .with_module(
            EXT,
            "report",
            addon(EXT, "report", 40, vec![Extra::one(EXT, "audit")], Vec::new()),
        )
        .with_module(EXT, "audit", failing("audit", "audit sink unavailable"));

    Catalog::new(discovery).with_namespace(APP).with_namespace(EXT)
}

/// Keys registered when none are given.
#[must_use]
pub fn default_keys() -> Vec<AddonKey> {
    vec![AddonKey::new(APP, "server"), AddonKey::new(APP, "db")]
}

// ─────────────────────────────────────────────────────────────────────────────
// Input
// ─────────────────────────────────────────────────────────────────────────────

/// Parses `namespace:name`.
///
/// # Errors
///
/// Returns [`InputError::Key`] if either part is missing.
pub fn parse_key(input: &str) -> Result<AddonKey, InputError> {
    match input.rsplit_once(':') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok(AddonKey::new(namespace, name))
        }
        _ => Err(InputError::Key(input.to_string())),
    }
}

/// Parses `namespace=<json object>` arguments into per-namespace finalize arguments.
///
/// Later arguments for the same namespace are merged over earlier ones.
///
/// # Errors
///
/// Returns [`InputError::Arg`] if an argument is malformed or not a JSON object.
pub fn parse_args<'a>(inputs: impl IntoIterator<Item = &'a str>) -> Result<NamespaceArgs, InputError> {
    let mut by_namespace = NamespaceArgs::new();

    for input in inputs {
        let Some((namespace, json)) = input.split_once('=') else {
            return Err(InputError::Arg(input.to_string()));
        };
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str(json) else {
            return Err(InputError::Arg(input.to_string()));
        };
        by_namespace
            .entry(namespace.to_string())
            .or_default()
            .extend(map);
    }

    Ok(by_namespace)
}

/// Reads a JSON [`RegisterConfig`].
///
/// # Errors
///
/// Returns [`InputError::Io`] or [`InputError::Config`].
pub fn load_config(path: &Path) -> Result<RegisterConfig, InputError> {
    let raw = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Run
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a demo session.
#[derive(Debug)]
pub struct Report {
    /// Finalize layers of the complete graph.
    pub layers: Vec<Vec<AddonKey>>,
    /// The collected settings.
    pub settings: Settings,
    /// Failures recorded when isolating.
    pub failures: Vec<String>,
}

/// Registers `keys` against the demo catalog.
///
/// # Errors
///
/// Returns the first [`AddonError`] the session raises.
pub fn run(
    keys: Vec<AddonKey>,
    config: RegisterConfig,
    args: &NamespaceArgs,
) -> Result<Report, AddonError> {
    let mut register = Register::new(catalog(), Settings::default()).with_config(config);
    register.register(keys, args)?;

    let layers = register.layers(true)?;
    let failures = register.failures().iter().map(ToString::to_string).collect();

    Ok(Report {
        layers,
        settings: register.into_collector(),
        failures,
    })
}
