use crate::{resume, suspend};
use anyhow::Result;
use clap::Parser;
use pf_model::Settings;

/// Suspend or resume an EKS cluster.
#[derive(Debug, Parser)]
pub(crate) struct Cluster {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Scale all compute, NAT gateways and load balancers of a cluster down to zero.
    Suspend(suspend::Suspend),
    /// Bring a suspended cluster back up.
    Resume(resume::Resume),
}

impl Cluster {
    pub(crate) async fn run(self, settings: Settings) -> Result<()> {
        match self.command {
            Command::Suspend(suspend) => suspend.run(settings).await,
            Command::Resume(resume) => resume.run(settings).await,
        }
    }
}
