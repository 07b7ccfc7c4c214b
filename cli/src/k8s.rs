use crate::cluster;
use anyhow::Result;
use clap::Parser;
use pf_model::Settings;

/// Manage Kubernetes clusters.
#[derive(Debug, Parser)]
pub(crate) struct K8s {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Manage the lifecycle of an EKS cluster.
    Cluster(cluster::Cluster),
}

impl K8s {
    pub(crate) async fn run(self, settings: Settings) -> Result<()> {
        match self.command {
            Command::Cluster(cluster) => cluster.run(settings).await,
        }
    }
}
