use anyhow::Result;
use clap::{Parser, Subcommand};
use loadtrace_cli::OutputFormat;
use loadtrace_cli::commands;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "loadtrace")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Reconcile resource load logs into request timings and a performance report",
    long_about = "Loadtrace reads start/end markers and direct timings from JSON, HAR, \
                  telemetry-envelope or plain-text logs, pairs them into completed requests, \
                  and reports aggregate timing, duplicate loads, a score and recommendations."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a resource load log
    Analyze {
        /// Path to the log file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of slowest requests to report
        #[arg(long, env = "LOADTRACE_TOP_N")]
        top: Option<usize>,

        /// Only analyze requests to these hosts (supports wildcards, e.g. *.example.com)
        #[arg(long = "include-host", value_name = "PATTERN")]
        include_hosts: Vec<String>,

        /// Ignore requests to these hosts (supports wildcards)
        #[arg(long = "exclude-host", value_name = "PATTERN")]
        exclude_hosts: Vec<String>,

        /// JSON config file; command-line options take precedence
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            file,
            top,
            include_hosts,
            exclude_hosts,
            config,
        } => {
            let config = commands::analyze::resolve_config(
                config.as_deref(),
                top,
                include_hosts,
                exclude_hosts,
            )?;
            commands::analyze::execute(&file, &config, cli.format)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("loadtrace=debug,loadtrace_core=debug,loadtrace_cli=debug")
    } else {
        EnvFilter::new("loadtrace=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
