//! cpu-loadgen - on-demand CPU load over HTTP
//!
//! Entry point. `serve` runs the HTTP server that autoscaling tests hit;
//! `burn` runs the same load in-process for quick local checks.

mod cli;
mod config;
mod error;
mod load;
mod logging;
mod server;
mod system;
mod version;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::config::LoadgenConfig;
use crate::error::{Error, Result};
use crate::system::SystemInfo;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            version::print_version();
            Ok(())
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)
        }
        Commands::Burn { duration, workers, output } => {
            logging::init_simple(simple_level(cli.verbose, cli.quiet))?;
            run_burn(duration, workers, output)
        }
        Commands::Serve { config, host, port } => {
            let mut config = LoadgenConfig::load(config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;
            run_server(config)
        }
    }
}

/// Level for commands that skip file-based logging
fn simple_level(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Run the HTTP server on a multi-threaded runtime
fn run_server(config: LoadgenConfig) -> Result<()> {
    let build = version::BUILD;
    info!(
        version = %build.full_version(),
        build_target = build.target,
        profile = build.profile,
        "Starting cpu-loadgen"
    );

    let system = SystemInfo::collect();
    info!(
        cpu_count = system.cpu_count,
        hostname = %system.hostname,
        os = %system.os_name,
        arch = %system.arch,
        "System info collected"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("loadgen-http")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    runtime.block_on(server::serve(&config, system))
}

/// Run the trigonometric load locally and print a summary
fn run_burn(duration_secs: u64, workers: Option<u64>, output: Option<String>) -> Result<()> {
    let workers = workers.map(|w| w as usize).unwrap_or_else(num_cpus::get);
    let duration = Duration::from_secs(duration_secs);

    info!(workers, duration_secs, "Burning CPU");
    let summary = load::run_trig_load(duration, workers)?;

    println!();
    println!("Burn Results:");
    println!("  Workers:          {}", summary.workers);
    println!("  Requested:        {}s", duration_secs);
    println!("  Actual:           {:.3}s", summary.elapsed.as_secs_f64());
    println!("  Total Iterations: {}", summary.total_iterations);
    for (worker_id, iterations) in summary.per_worker.iter().enumerate() {
        println!("    worker {:>3}:     {}", worker_id, iterations);
    }

    if let Some(ref path) = output {
        let path = PathBuf::from(path);
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json).map_err(|e| Error::IoWrite {
            path: path.clone(),
            source: e,
        })?;
        println!("  Summary saved to: {}", path.display());
    }

    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = LoadgenConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            LoadgenConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
