//! `rbac-atlas`'s CLI surface: `clap` subcommand wiring plus the output
//! renderer. `main.rs` is a thin driver that calls [`run`] and maps its
//! result to an exit code.

#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate serde_json;
extern crate serde_yaml;

#[macro_use]
extern crate log;

extern crate openssl_probe;

#[macro_use]
extern crate failure;

extern crate rbac_atlas_core;

pub use failure::Error;
pub type Result<T> = std::result::Result<T, Error>;

use std::env;
use std::path::PathBuf;

use clap::{App, Arg, ArgMatches, SubCommand};
use rbac_atlas_core::concurrency::CancellationToken;
use rbac_atlas_core::config::{RbacOpsConfig, CONFIG_PATH_ENV_VAR};
use rbac_atlas_core::orchestrator::{AnalyzeOptions, Orchestrator};

/// Renders shaped reports to table/JSON/YAML/markdown text.
pub mod output;

use output::OutputFormat;

/// Builds the `clap::App` (builder style rather than the derive API).
pub fn build_cli() -> App<'static, 'static> {
    App::new("rbac-atlas")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Analyze Kubernetes RBAC manifests and rank permission grants by risk")
        .subcommand(
            SubCommand::with_name("analyze")
                .about("Resolve, render and evaluate a manifest source")
                .arg(Arg::with_name("source").required(true).index(1))
                .arg(
                    Arg::with_name("concurrency")
                        .long("concurrency")
                        .takes_value(true)
                        .default_value("4"),
                )
                .arg(Arg::with_name("follow-symlinks").long("follow-symlinks"))
                .arg(
                    Arg::with_name("validate-yaml")
                        .long("validate-yaml")
                        .takes_value(true)
                        .possible_values(&["true", "false"])
                        .default_value("true"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .takes_value(true)
                        .possible_values(&["table", "json", "yaml", "markdown"])
                        .default_value("table"),
                )
                .arg(
                    Arg::with_name("include-metadata")
                        .long("include-metadata")
                        .takes_value(true)
                        .possible_values(&["true", "false"])
                        .default_value("true"),
                )
                .arg(Arg::with_name("values").long("values").takes_value(true))
                .arg(Arg::with_name("config").long("config").takes_value(true))
                .arg(Arg::with_name("debug").long("debug")),
        )
}

fn bool_flag(matches: &ArgMatches, name: &str, default: bool) -> bool {
    match matches.value_of(name) {
        Some(v) => v == "true",
        None => default,
    }
}

/// Prerequisite for the remote resolver's HTTPS client, mirroring
/// `shipcat_cli::lib::init`'s `openssl_probe::init_ssl_cert_env_vars` call.
fn init_ssl() {
    openssl_probe::init_ssl_cert_env_vars();
}

fn init_logger(debug: bool) {
    let verbosity = if debug { 2 } else { 0 };
    let _ = loggerv::Logger::new().verbosity(verbosity).level(true).init();
}

fn run_analyze(matches: &ArgMatches) -> Result<()> {
    let source = matches.value_of("source").expect("source is required").to_string();
    let debug = matches.is_present("debug");
    init_logger(debug);
    init_ssl();

    let config_path = matches
        .value_of("config")
        .map(PathBuf::from)
        .or_else(|| env::var(CONFIG_PATH_ENV_VAR).ok().map(PathBuf::from));
    let config = RbacOpsConfig::load(config_path.as_deref())?;

    let concurrency = matches
        .value_of("concurrency")
        .and_then(|v| v.parse::<usize>().ok())
        .or(config.default_concurrency)
        .unwrap_or(4);

    let follow_symlinks =
        matches.is_present("follow-symlinks") || config.follow_symlinks.unwrap_or(false);
    let validate_yaml = bool_flag(matches, "validate-yaml", true);
    let include_metadata = bool_flag(matches, "include-metadata", true);
    let values_override = matches.value_of("values").map(PathBuf::from);

    let output_format: OutputFormat = matches
        .value_of("output")
        .map(|s| s.to_string())
        .or_else(|| config.default_output.clone())
        .unwrap_or_else(|| "table".to_string())
        .parse()
        .map_err(|e: String| failure::err_msg(e))?;

    let opts = AnalyzeOptions {
        concurrency,
        follow_symlinks,
        validate_yaml,
        include_metadata,
        values_override,
    };
    let token = CancellationToken::new();

    info!("analyzing '{}'", source);
    let (result, warnings) = Orchestrator::run(&source, &opts, &token)?;

    let report = rbac_atlas_core::format::shape(&result);
    let rendered = output::render(&report, output_format)?;
    println!("{}", rendered);

    if !warnings.is_empty() {
        eprintln!("{} warning(s):", warnings.len());
        for warning in &warnings {
            eprintln!("  [{:?}] {}", warning.stage, warning.message);
        }
    }

    Ok(())
}

/// Parses `args` and dispatches to the matching subcommand.
///
/// On failure, returns the usage string alongside the error so `main.rs`
/// can print usage before the error message.
pub fn run<I, T>(args: I) -> std::result::Result<(), (String, Error)>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let app = build_cli();
    let matches = match app.clone().get_matches_from_safe(args) {
        Ok(m) => m,
        Err(e) => return Err((e.message.clone(), failure::err_msg(e.to_string()))),
    };

    match matches.subcommand() {
        ("analyze", Some(sub)) => run_analyze(sub).map_err(|e| (usage_string(&app), e)),
        _ => Err((usage_string(&app), failure::err_msg("no subcommand given"))),
    }
}

fn usage_string(app: &App) -> String {
    let mut buf = Vec::new();
    let _ = app.clone().write_long_help(&mut buf);
    String::from_utf8_lossy(&buf).to_string()
}
