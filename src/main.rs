mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::ScanOptions;

#[derive(Parser)]
#[command(name = "depends", version, about = "Discover the transitive dependencies of source files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the rules a scan would use, in priority order
    Rules {
        /// Config file to read instead of ./.depends.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the dependency closure of each file
    Scan {
        /// Config file to read instead of ./.depends.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Additional search directory (repeatable)
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
        /// Exit with status 1 if any reference is unresolved or file unreadable
        #[arg(long)]
        strict: bool,
    },
    /// Scan every matching file under a directory
    Tree {
        /// Config file to read instead of ./.depends.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Additional search directory (repeatable)
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
        /// Directory to walk
        #[arg(default_value = ".")]
        root: PathBuf,
        /// Exit with status 1 if any reference is unresolved or file unreadable
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Rules { config } => commands::cmd_rules(config.as_deref()).map(|()| return ExitCode::SUCCESS),
        Commands::Scan { config, files, include, json, strict } => {
            let options = ScanOptions { config, include, json, strict };
            commands::cmd_scan(&files, &options)
        },
        Commands::Tree { config, include, json, root, strict } => {
            let options = ScanOptions { config, include, json, strict };
            commands::cmd_tree(&root, &options)
        },
    };

    return match outcome {
        Ok(code) => code,
        Err(e) => {
            depends::diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}

/// Install a stderr subscriber. `RUST_LOG` wins; `--verbose` means `debug`,
/// otherwise only warnings are shown.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "depends=debug" } else { "depends=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| return EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
