/*!

This is the command line interface for completing cluster specifications and inspecting the
registry they are stored in.

!*/

mod create_cluster;
mod get;

use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use model::clients::FileRegistry;
use std::path::PathBuf;

/// The command line interface for turning a minimal cluster description into a fully specified,
/// validated set of cluster objects.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info")]
    log_level: LevelFilter,
    /// Path to the registry directory where completed objects are stored.
    #[clap(long = "registry", default_value = ".clusterup")]
    registry: PathBuf,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Complete a cluster specification and store it in the registry.
    CreateCluster(create_cluster::CreateCluster),
    /// List objects from the registry.
    Get(get::Get),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    if let Err(e) = run(args).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let registry = FileRegistry::new(&args.registry);
    match args.command {
        Command::CreateCluster(create_cluster) => {
            create_cluster.run(registry, &args.registry).await
        }
        Command::Get(get) => get.run(registry).await,
    }
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use default log level for our crates only.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("clusterup_engine"), level)
                .filter(Some("clusterup_model"), level)
                .init();
        }
    }
}
