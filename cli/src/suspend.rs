use crate::connection::Connection;
use anyhow::{Context, Result};
use clap::Parser;
use pf_lifecycle::step::Outcome;
use pf_lifecycle::{SuspendPhase, Suspender};
use pf_model::Settings;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Suspend a cluster. All of its nodes are terminated, its NAT gateways are scaled to zero and its
/// load balancers are deleted, so the cluster is completely unavailable until it is resumed.
#[derive(Debug, Parser)]
pub(crate) struct Suspend {
    /// The name of the EKS cluster to suspend.
    #[clap(long)]
    cluster: String,
}

impl Suspend {
    pub(crate) async fn run(self, settings: Settings) -> Result<()> {
        if !confirm(&self.cluster).await? {
            println!("Operation cancelled");
            return Ok(());
        }

        let connection = Connection::new(&settings, &self.cluster);
        let summary = Suspender::new(connection.clients(), &self.cluster)
            .suspend()
            .await?;

        print!("{}", summary.report);
        println!();
        println!("✓ Successfully suspended cluster '{}'", self.cluster);
        println!(
            "  - All nodes have been terminated ({} node groups, {} instances)",
            summary.node_groups, summary.terminated_instances
        );
        println!(
            "  - NAT gateways have been scaled down ({} groups)",
            summary.nat_groups
        );
        if summary.report.outcome(SuspendPhase::DeletingLoadBalancers) == Some(&Outcome::Done) {
            println!(
                "  - Load balancers have been deleted ({})",
                summary.deleted_load_balancers
            );
        }
        for (phase, reason) in summary.report.skipped() {
            println!("  ! {} did not complete: {}", phase, reason);
        }
        println!();
        println!(
            "To resume the cluster, run: pf k8s cluster resume --cluster {}",
            self.cluster
        );
        Ok(())
    }
}

/// Asks the operator on stdin. Anything other than `y` or `yes` declines. Ctrl-C interrupts the
/// wait for an answer.
async fn confirm(cluster: &str) -> Result<bool> {
    let prompt = format!(
        "Are you sure you want to suspend the cluster \"{}\"? This will make it completely \
         unavailable! [y/N] ",
        cluster
    );
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(prompt.as_bytes())
        .await
        .context("Unable to write to stdout")?;
    stdout.flush().await.context("Unable to write to stdout")?;
    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("Unable to read the confirmation from stdin")?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
