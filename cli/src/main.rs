/*!

This is the command line interface for suspending and resuming Panfactum EKS clusters.

!*/

mod cluster;
mod connection;
mod k8s;
mod resume;
mod suspend;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use pf_lifecycle::LifecycleError;
use pf_model::Settings;
use std::path::PathBuf;

/// The Panfactum command line interface.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info", global = true)]
    log_level: LevelFilter,
    /// The AWS profile to use. Also can be passed with the PF_AWS_PROFILE environment variable.
    /// When neither is given, the profile is read from the kube context's exec configuration.
    #[clap(long = "aws-profile", global = true)]
    aws_profile: Option<String>,
    /// The AWS region to use. Also can be passed with the PF_AWS_REGION environment variable.
    #[clap(long = "aws-region", global = true)]
    aws_region: Option<String>,
    /// The kube context of the cluster. Defaults to the cluster name.
    #[clap(long = "kube-context", global = true)]
    kube_context: Option<String>,
    /// Path to the kubeconfig file. Also can be passed with the KUBECONFIG environment variable.
    #[clap(long = "kubeconfig", global = true)]
    kubeconfig: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Manage Kubernetes clusters.
    K8s(k8s::K8s),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    let result = tokio::select! {
        result = run(args) => result,
        // Dropping `run` kills any running `aws` or `kubectl` child.
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted. The cluster may have been left partially changed.");
            std::process::exit(130);
        }
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        if let Some(lifecycle_error) = e.downcast_ref::<LifecycleError>() {
            eprintln!("{}", lifecycle_error.residue());
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut settings = Settings::from_env().context("Unable to read PF_ settings")?;
    settings.aws_profile = args.aws_profile.or(settings.aws_profile);
    settings.aws_region = args.aws_region.or(settings.aws_region);
    settings.kube_context = args.kube_context.or(settings.kube_context);
    settings.kubeconfig = args.kubeconfig.or(settings.kubeconfig);
    match args.command {
        Command::K8s(k8s) => k8s.run(settings).await,
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
            // RUST_LOG does not exist; use default log level for the pf crates only.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("pf_lifecycle"), level)
                .filter(Some("pf_model"), level)
                .init();
        }
    }
}
