//! Registers demo addons and prints the resulting layers.
//!
//! # Usage
//!
//! ```bash
//! addons-demo [KEY]... [--isolate] [--arg NAMESPACE=JSON]... [--config FILE]
//! ```
//!
//! # Example
//!
//! ```bash
//! addons-demo app.addons:server ext.addons:report --isolate --arg 'app.addons={"port": 8080}'
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use addons_core::{AddonKey, FailurePolicy, RegisterConfig};
use addons_demo::{Report, default_keys, load_config, parse_args, parse_key, run};
use addons_tracing::{TracingConfig, TracingFormat};
use clap::{Parser, ValueEnum};
use tracing::Level;

/// Registers demo addons in dependency order.
#[derive(Parser, Debug)]
#[command(name = "addons-demo", version, about, long_about = None)]
struct Cli {
    /// Addons to register, as `namespace:name`. Defaults to the server and db addons.
    keys: Vec<String>,

    /// Finalize arguments for a namespace, as `namespace=<json object>`.
    #[arg(long = "arg", value_name = "NAMESPACE=JSON")]
    args: Vec<String>,

    /// Register configuration file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip addons whose dependencies failed instead of stopping.
    #[arg(long)]
    isolate: bool,

    /// Maximum log level.
    #[arg(long, default_value = "info")]
    level: Level,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    format: LogFormat,

    /// Log filter directives, e.g. `addons_core=debug`.
    #[arg(long)]
    log_filter: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormat> for TracingFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
            LogFormat::Json => Self::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging = TracingConfig::new()
        .with_level(cli.level)
        .with_format(cli.format.into());
    if let Some(filter) = &cli.log_filter {
        logging = logging.with_env_filter(filter);
    }
    logging.init();

    match execute(&cli) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(%error, "registration failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<Report, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RegisterConfig::default(),
    };
    if cli.isolate {
        config = config.with_failure_policy(FailurePolicy::Isolate);
    }

    let keys = if cli.keys.is_empty() {
        default_keys()
    } else {
        cli.keys
            .iter()
            .map(|key| parse_key(key))
            .collect::<Result<Vec<AddonKey>, _>>()?
    };
    let args = parse_args(cli.args.iter().map(String::as_str))?;

    Ok(run(keys, config, &args)?)
}

#[expect(clippy::print_stdout, reason = "the report is the program's output")]
fn print_report(report: &Report) {
    for (index, layer) in report.layers.iter().enumerate() {
        let keys: Vec<String> = layer.iter().map(ToString::to_string).collect();
        println!("layer {index}: {}", keys.join(", "));
    }

    for (spec, (key, converter)) in &report.settings.converters {
        println!("converter {spec} from {key}: {converter}");
    }

    for (key, args) in &report.settings.finalized {
        println!("finalized {key} with {}", serde_json::Value::Object(args.clone()));
    }

    for failure in &report.failures {
        println!("skipped: {failure}");
    }
}
