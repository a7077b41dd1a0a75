//! CLI argument parsing using clap v4

use clap::{Parser, Subcommand};

/// cpu-loadgen - on-demand CPU load over HTTP
///
/// Serves endpoints that burn CPU across a configurable number of workers
/// for a configurable time, for exercising autoscalers and load tests.
#[derive(Parser, Debug)]
#[command(name = "cpu-loadgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(short, long, env = "LOADGEN_CONFIG")]
        config: Option<String>,

        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Burn CPU locally without the HTTP server
    Burn {
        /// How long to run, in seconds
        #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        duration: u64,

        /// Number of workers (default: CPU count)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=1024))]
        workers: Option<u64>,

        /// Output file for the run summary (JSON)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["cpu-loadgen", "serve"]);
        match cli.command {
            Commands::Serve { config, host, port } => {
                assert!(config.is_none());
                assert!(host.is_none());
                assert!(port.is_none());
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::parse_from([
            "cpu-loadgen",
            "serve",
            "--config",
            "/etc/loadgen.toml",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
        ]);
        match cli.command {
            Commands::Serve { config, host, port } => {
                assert_eq!(config.as_deref(), Some("/etc/loadgen.toml"));
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_burn_defaults() {
        let cli = Cli::parse_from(["cpu-loadgen", "burn"]);
        match cli.command {
            Commands::Burn { duration, workers, output } => {
                assert_eq!(duration, 10);
                assert!(workers.is_none());
                assert!(output.is_none());
            }
            _ => panic!("Expected Burn command"),
        }
    }

    #[test]
    fn test_burn_rejects_zero() {
        assert!(Cli::try_parse_from(["cpu-loadgen", "burn", "--duration", "0"]).is_err());
        assert!(Cli::try_parse_from(["cpu-loadgen", "burn", "--workers", "0"]).is_err());
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["cpu-loadgen", "-vv", "version"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["cpu-loadgen", "config", "init", "--force"]);
        match cli.command {
            Commands::Config { subcommand: ConfigSubcommand::Init { path, force } } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
