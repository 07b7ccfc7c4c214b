use crate::connection::Connection;
use anyhow::Result;
use clap::Parser;
use pf_lifecycle::step::Outcome;
use pf_lifecycle::{ResumePhase, Resumer};
use pf_model::Settings;

/// Resume a suspended cluster.
#[derive(Debug, Parser)]
pub(crate) struct Resume {
    /// The name of the EKS cluster to resume.
    #[clap(long)]
    cluster: String,
}

impl Resume {
    pub(crate) async fn run(self, settings: Settings) -> Result<()> {
        let connection = Connection::new(&settings, &self.cluster);
        let summary = Resumer::new(connection.clients(), &self.cluster)
            .polling(connection.polling())
            .resume()
            .await?;

        print!("{}", summary.report);
        println!();
        println!("✓ Successfully resumed cluster '{}'", self.cluster);
        println!(
            "  - NAT gateways have been restored ({} groups)",
            summary.nat_groups.len()
        );
        println!(
            "  - Node groups have been restored ({})",
            summary.node_groups
        );
        let done = |phase| summary.report.outcome(phase) == Some(&Outcome::Done);
        if done(ResumePhase::RestoringNodePoolLimits) {
            println!("  - Karpenter limits have been removed");
        }
        if done(ResumePhase::UpdatingScheduler) && done(ResumePhase::RestoringScheduler) {
            println!("  - Schedulers have been restored");
        }
        for (phase, reason) in summary.report.skipped() {
            println!("  ! {} did not complete: {}", phase, reason);
        }
        println!();
        println!("The cluster may take a few minutes to become fully operational.");
        Ok(())
    }
}
