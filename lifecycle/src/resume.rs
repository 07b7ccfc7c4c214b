use crate::clients::Clients;
use crate::error::{IntoLifecycleError, LifecycleError, LifecycleResult, Residue};
use crate::readiness::{wait_for_nat_instances, wait_for_nodes, Polling};
use crate::step::{Phase, Policy, Report, Steps};
use log::{debug, info, warn};
use pf_model::constants::{
    CILIUM_OPERATOR_DEPLOYMENT, CILIUM_SCHEDULER_ENV, KARPENTER_NODE_POOL_CRD,
    RESUMED_NODE_GROUP_SIZE, SCHEDULER_DEPLOYMENT, SCHEDULER_REPLICAS, SYSTEM_NAMESPACE,
    TAG_SUSPENDED,
};
use pf_model::{AutoScalingGroupSizing, ClusterInfo, NodeGroupConfig};
use std::fmt::{Display, Formatter};

/// The steps of a resume, in the order they run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResumePhase {
    ValidatingAccess,
    ValidatingTag,
    RestoringNetwork,
    UpdatingScheduler,
    ClearingPendingPods,
    RestoringCompute,
    WaitingForNodes,
    RestoringNodePoolLimits,
    RestoringScheduler,
    Untagging,
}

pub const RESUME_POLICY: &[(ResumePhase, Policy)] = &[
    (ResumePhase::ValidatingAccess, Policy::Required),
    (ResumePhase::ValidatingTag, Policy::Required),
    (ResumePhase::RestoringNetwork, Policy::Required),
    (ResumePhase::UpdatingScheduler, Policy::BestEffort),
    (ResumePhase::ClearingPendingPods, Policy::BestEffort),
    (ResumePhase::RestoringCompute, Policy::Required),
    (ResumePhase::WaitingForNodes, Policy::BestEffort),
    (ResumePhase::RestoringNodePoolLimits, Policy::BestEffort),
    (ResumePhase::RestoringScheduler, Policy::BestEffort),
    (ResumePhase::Untagging, Policy::Required),
];

impl Phase for ResumePhase {
    fn mutating(&self) -> bool {
        !matches!(
            self,
            ResumePhase::ValidatingAccess
                | ResumePhase::ValidatingTag
                | ResumePhase::WaitingForNodes
        )
    }
}

impl Display for ResumePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let title = match self {
            ResumePhase::ValidatingAccess => "Validating AWS access",
            ResumePhase::ValidatingTag => "Verifying cluster is suspended",
            ResumePhase::RestoringNetwork => "Restoring NAT gateway Auto Scaling Groups",
            ResumePhase::UpdatingScheduler => "Updating Cilium operator scheduler",
            ResumePhase::ClearingPendingPods => "Clearing pending pods",
            ResumePhase::RestoringCompute => "Restoring EKS node groups",
            ResumePhase::WaitingForNodes => "Waiting for nodes to become ready",
            ResumePhase::RestoringNodePoolLimits => "Removing Karpenter node pool limits",
            ResumePhase::RestoringScheduler => "Restoring Panfactum scheduler",
            ResumePhase::Untagging => "Removing suspension tag",
        };
        Display::fmt(title, f)
    }
}

/// What a completed resume did.
#[derive(Clone, Debug)]
pub struct ResumeSummary {
    pub report: Report<ResumePhase>,
    pub nat_groups: Vec<AutoScalingGroupSizing>,
    pub node_groups: usize,
}

impl ResumeSummary {
    /// `true` if every step, including the best-effort ones, completed.
    pub fn complete(&self) -> bool {
        self.report.skipped().next().is_none()
    }
}

/// Resumes a suspended cluster: restores the NAT groups to their recorded size, brings the node
/// groups back, and removes the `panfactum.com/suspended` tag once compute is back.
pub struct Resumer<'a> {
    clients: Clients<'a>,
    cluster: String,
    polling: Polling,
}

impl<'a> Resumer<'a> {
    pub fn new<S: Into<String>>(clients: Clients<'a>, cluster: S) -> Self {
        Self {
            clients,
            cluster: cluster.into(),
            polling: Polling::default(),
        }
    }

    pub fn polling(mut self, polling: Polling) -> Self {
        self.polling = polling;
        self
    }

    pub async fn resume(&self) -> LifecycleResult<ResumeSummary> {
        let mut steps = Steps::new(RESUME_POLICY);
        steps
            .run_required(ResumePhase::ValidatingAccess, self.validate_access())
            .await?;
        let info = steps
            .run_required(ResumePhase::ValidatingTag, self.validate_tag())
            .await?;
        let nat_groups = steps
            .run_required(ResumePhase::RestoringNetwork, self.restore_network())
            .await?;
        steps
            .run(ResumePhase::UpdatingScheduler, self.update_scheduler())
            .await?;
        steps
            .run(ResumePhase::ClearingPendingPods, self.clear_pending_pods())
            .await?;
        let node_groups = steps
            .run_required(ResumePhase::RestoringCompute, self.restore_compute())
            .await?;
        let expected_nodes = node_groups * RESUMED_NODE_GROUP_SIZE as usize;
        steps
            .run(
                ResumePhase::WaitingForNodes,
                wait_for_nodes(self.clients.kube, expected_nodes, self.polling),
            )
            .await?;
        steps
            .run(
                ResumePhase::RestoringNodePoolLimits,
                self.restore_node_pool_limits(),
            )
            .await?;
        steps
            .run(ResumePhase::RestoringScheduler, self.restore_scheduler())
            .await?;
        steps
            .run_required(ResumePhase::Untagging, self.untag(&info))
            .await?;
        Ok(ResumeSummary {
            report: steps.finish(),
            nat_groups,
            node_groups,
        })
    }

    async fn validate_access(&self) -> LifecycleResult<()> {
        let identity = self
            .clients
            .cloud
            .caller_identity()
            .await
            .context(Residue::Untouched, "Unable to validate AWS access")?;
        info!(
            "Using AWS account '{}' as '{}'",
            identity.account, identity.arn
        );
        Ok(())
    }

    async fn validate_tag(&self) -> LifecycleResult<ClusterInfo> {
        let info = self
            .clients
            .cloud
            .describe_cluster(&self.cluster)
            .await
            .context(
                Residue::Untouched,
                format!("Unable to get information for cluster '{}'", self.cluster),
            )?;
        if !info.is_suspended() {
            return Err(LifecycleError::new_with_context(
                Residue::Untouched,
                format!("Cluster '{}' is not marked as suspended", self.cluster),
            ));
        }
        Ok(info)
    }

    async fn restore_network(&self) -> LifecycleResult<Vec<AutoScalingGroupSizing>> {
        let store = self.clients.store;
        let mut restored = Vec::new();
        for group in store.suspended_groups(&self.cluster).await? {
            let name = group.name();
            let sizing = store.load(name).await?.resolve(name);
            info!(
                "Restoring '{}' to min {}, max {}, desired {}",
                name, sizing.min_size, sizing.max_size, sizing.desired_capacity
            );
            self.clients
                .cloud
                .update_auto_scaling_group(&sizing)
                .await?;
            store.clear(name).await?;
            restored.push(sizing);
        }
        wait_for_nat_instances(self.clients.cloud, &restored, self.polling).await?;
        Ok(restored)
    }

    async fn update_scheduler(&self) -> LifecycleResult<()> {
        self.clients
            .kube
            .set_deployment_env(
                SYSTEM_NAMESPACE,
                CILIUM_OPERATOR_DEPLOYMENT,
                CILIUM_SCHEDULER_ENV,
            )
            .await?;
        Ok(())
    }

    async fn clear_pending_pods(&self) -> LifecycleResult<()> {
        self.clients.kube.delete_pending_pods().await?;
        Ok(())
    }

    async fn restore_compute(&self) -> LifecycleResult<usize> {
        let cloud = self.clients.cloud;
        let node_groups = cloud.list_node_groups(&self.cluster).await?;
        for name in &node_groups {
            let config = NodeGroupConfig::resumed(name.as_str());
            debug!(
                "Scaling node group '{}' to {}",
                name,
                config.scaling_config_arg()
            );
            cloud.update_node_group(&self.cluster, &config).await?;
        }
        Ok(node_groups.len())
    }

    async fn restore_node_pool_limits(&self) -> LifecycleResult<()> {
        let kube = self.clients.kube;
        if !kube.crd_exists(KARPENTER_NODE_POOL_CRD).await? {
            info!("Karpenter is not installed, skipping");
            return Ok(());
        }
        let pools = kube.node_pools().await?;
        let mut failed = 0;
        for pool in &pools {
            if !pool.has_limits() {
                debug!("Node pool '{}' has no limits", pool.name);
                continue;
            }
            // A pool that cannot be patched does not stop the others.
            if let Err(e) = kube.remove_node_pool_limits(pool).await {
                warn!("{}", e);
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(LifecycleError::new_with_context(
                Residue::Partial,
                format!(
                    "Unable to remove the limits of {} of {} node pools",
                    failed,
                    pools.len()
                ),
            ));
        }
        Ok(())
    }

    async fn restore_scheduler(&self) -> LifecycleResult<()> {
        self.clients
            .kube
            .scale_deployment(SYSTEM_NAMESPACE, SCHEDULER_DEPLOYMENT, SCHEDULER_REPLICAS)
            .await?;
        Ok(())
    }

    async fn untag(&self, info: &ClusterInfo) -> LifecycleResult<()> {
        self.clients
            .cloud
            .untag_cluster(&info.arn, TAG_SUSPENDED)
            .await
            .context(
                Residue::Partial,
                format!(
                    "Compute was restored but cluster '{}' is still marked as suspended",
                    self.cluster
                ),
            )
    }
}

#[test]
fn policy_table_covers_every_phase() {
    use crate::step::policy_of;
    assert_eq!(RESUME_POLICY.len(), 10);
    assert_eq!(
        policy_of(RESUME_POLICY, ResumePhase::WaitingForNodes),
        Policy::BestEffort
    );
    assert_eq!(
        policy_of(RESUME_POLICY, ResumePhase::Untagging),
        Policy::Required
    );
}
