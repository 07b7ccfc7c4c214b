use crate::clients::Clients;
use crate::error::{IntoLifecycleError, LifecycleError, LifecycleResult, Residue};
use crate::step::{Phase, Policy, Report, Steps};
use log::{debug, info, warn};
use pf_model::constants::{
    CERTIFICATE_CRD, EXTENDED_CERTIFICATE_DURATION, KARPENTER_NODE_POOL_CRD, SUSPENDED_VALUE,
    TAG_SUSPENDED,
};
use pf_model::{AutoScalingGroupSizing, ClusterInfo, NodeGroupConfig};
use std::fmt::{Display, Formatter};

/// The steps of a suspend, in the order they run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SuspendPhase {
    ValidatingAccess,
    Verifying,
    Tagging,
    ExtendingCertificates,
    ZeroingNodePools,
    ScalingDownNodeGroups,
    TerminatingInstances,
    ScalingDownNetwork,
    DeletingLoadBalancers,
}

pub const SUSPEND_POLICY: &[(SuspendPhase, Policy)] = &[
    (SuspendPhase::ValidatingAccess, Policy::Required),
    (SuspendPhase::Verifying, Policy::Required),
    (SuspendPhase::Tagging, Policy::Required),
    (SuspendPhase::ExtendingCertificates, Policy::BestEffort),
    (SuspendPhase::ZeroingNodePools, Policy::BestEffort),
    (SuspendPhase::ScalingDownNodeGroups, Policy::Required),
    (SuspendPhase::TerminatingInstances, Policy::Required),
    (SuspendPhase::ScalingDownNetwork, Policy::Required),
    (SuspendPhase::DeletingLoadBalancers, Policy::BestEffort),
];

impl Phase for SuspendPhase {
    fn mutating(&self) -> bool {
        !matches!(
            self,
            SuspendPhase::ValidatingAccess | SuspendPhase::Verifying
        )
    }
}

impl Display for SuspendPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let title = match self {
            SuspendPhase::ValidatingAccess => "Validating AWS access",
            SuspendPhase::Verifying => "Getting cluster information",
            SuspendPhase::Tagging => "Tagging cluster as suspended",
            SuspendPhase::ExtendingCertificates => "Extending certificate expiration",
            SuspendPhase::ZeroingNodePools => "Scaling down Karpenter node pools",
            SuspendPhase::ScalingDownNodeGroups => "Scaling down EKS node groups",
            SuspendPhase::TerminatingInstances => "Terminating EC2 instances",
            SuspendPhase::ScalingDownNetwork => "Scaling down NAT gateways",
            SuspendPhase::DeletingLoadBalancers => "Deleting load balancers",
        };
        Display::fmt(title, f)
    }
}

/// What a completed suspend did.
#[derive(Clone, Debug)]
pub struct SuspendSummary {
    pub report: Report<SuspendPhase>,
    pub node_groups: usize,
    pub terminated_instances: usize,
    pub nat_groups: usize,
    pub deleted_load_balancers: usize,
}

/// Suspends a running cluster: scales all of its compute and NAT capacity to zero and deletes its
/// load balancers. The cluster is tagged `panfactum.com/suspended=true` before anything is scaled
/// down.
pub struct Suspender<'a> {
    clients: Clients<'a>,
    cluster: String,
}

impl<'a> Suspender<'a> {
    pub fn new<S: Into<String>>(clients: Clients<'a>, cluster: S) -> Self {
        Self {
            clients,
            cluster: cluster.into(),
        }
    }

    pub async fn suspend(&self) -> LifecycleResult<SuspendSummary> {
        let mut steps = Steps::new(SUSPEND_POLICY);
        steps
            .run_required(SuspendPhase::ValidatingAccess, self.validate_access())
            .await?;
        let info = steps
            .run_required(SuspendPhase::Verifying, self.verify())
            .await?;
        steps
            .run_required(SuspendPhase::Tagging, self.tag(&info))
            .await?;
        steps
            .run(
                SuspendPhase::ExtendingCertificates,
                self.extend_certificates(),
            )
            .await?;
        steps
            .run(SuspendPhase::ZeroingNodePools, self.zero_node_pools())
            .await?;
        let node_groups = steps
            .run_required(
                SuspendPhase::ScalingDownNodeGroups,
                self.scale_down_node_groups(),
            )
            .await?;
        let terminated_instances = steps
            .run_required(
                SuspendPhase::TerminatingInstances,
                self.terminate_instances(),
            )
            .await?;
        let nat_groups = steps
            .run_required(SuspendPhase::ScalingDownNetwork, self.scale_down_network())
            .await?;
        let deleted_load_balancers = steps
            .run(
                SuspendPhase::DeletingLoadBalancers,
                self.delete_load_balancers(),
            )
            .await?
            .unwrap_or_default();
        Ok(SuspendSummary {
            report: steps.finish(),
            node_groups,
            terminated_instances,
            nat_groups,
            deleted_load_balancers,
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

    async fn verify(&self) -> LifecycleResult<ClusterInfo> {
        let info = self
            .clients
            .cloud
            .describe_cluster(&self.cluster)
            .await
            .context(
                Residue::Untouched,
                format!("Unable to get information for cluster '{}'", self.cluster),
            )?;
        if let Some(region) = info.region() {
            debug!("Cluster '{}' is in region '{}'", info.name, region);
        }
        if info.is_suspended() {
            return Err(LifecycleError::new_with_context(
                Residue::Untouched,
                format!(
                    "Cluster '{}' is already suspended. To resume the cluster, run: pf k8s \
                     cluster resume --cluster {}",
                    self.cluster, self.cluster
                ),
            ));
        }
        Ok(info)
    }

    async fn tag(&self, info: &ClusterInfo) -> LifecycleResult<()> {
        self.clients
            .cloud
            .tag_cluster(&info.arn, TAG_SUSPENDED, SUSPENDED_VALUE)
            .await?;
        Ok(())
    }

    async fn extend_certificates(&self) -> LifecycleResult<()> {
        let kube = self.clients.kube;
        if !kube.crd_exists(CERTIFICATE_CRD).await? {
            info!("cert-manager is not installed, skipping");
            return Ok(());
        }
        let certificates: Vec<_> = kube
            .certificates()
            .await?
            .into_iter()
            .filter(|certificate| certificate.is_internal())
            .collect();
        let mut failed = 0;
        for certificate in &certificates {
            debug!(
                "Extending certificate '{}/{}' to {}",
                certificate.namespace, certificate.name, EXTENDED_CERTIFICATE_DURATION
            );
            if let Err(e) = kube
                .extend_certificate(certificate, EXTENDED_CERTIFICATE_DURATION)
                .await
            {
                warn!("{}", e);
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(LifecycleError::new_with_context(
                Residue::Partial,
                format!(
                    "Unable to extend {} of {} certificates",
                    failed,
                    certificates.len()
                ),
            ));
        }
        info!("Extended {} certificates", certificates.len());
        Ok(())
    }

    async fn zero_node_pools(&self) -> LifecycleResult<()> {
        let kube = self.clients.kube;
        if !kube.crd_exists(KARPENTER_NODE_POOL_CRD).await? {
            info!("Karpenter is not installed, skipping");
            return Ok(());
        }
        let pools = kube.node_pools().await?;
        let mut failed = 0;
        for pool in &pools {
            debug!("Zeroing the limits of node pool '{}'", pool.name);
            if let Err(e) = kube.zero_node_pool_limits(&pool.name).await {
                warn!("{}", e);
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(LifecycleError::new_with_context(
                Residue::Partial,
                format!("Unable to zero {} of {} node pools", failed, pools.len()),
            ));
        }
        Ok(())
    }

    async fn scale_down_node_groups(&self) -> LifecycleResult<usize> {
        let cloud = self.clients.cloud;
        let node_groups = cloud.list_node_groups(&self.cluster).await?;
        for name in &node_groups {
            debug!("Scaling node group '{}' to zero", name);
            cloud
                .update_node_group(&self.cluster, &NodeGroupConfig::suspended(name.as_str()))
                .await?;
        }
        Ok(node_groups.len())
    }

    async fn terminate_instances(&self) -> LifecycleResult<usize> {
        let cloud = self.clients.cloud;
        let instances = cloud.cluster_instances(&self.cluster).await?;
        if instances.is_empty() {
            info!("No running instances found");
            return Ok(0);
        }
        cloud.terminate_instances(&instances).await?;
        Ok(instances.len())
    }

    async fn scale_down_network(&self) -> LifecycleResult<usize> {
        let cloud = self.clients.cloud;
        let groups: Vec<_> = cloud
            .auto_scaling_groups()
            .await?
            .into_iter()
            .filter(|group| group.is_nat() && group.is_owned_by(&self.cluster))
            .collect();
        for group in &groups {
            // The recorded size must exist before the group is zeroed.
            if group.is_suspended() {
                info!(
                    "'{}' already has a recorded size, keeping it",
                    group.name()
                );
            } else {
                self.clients.store.save(&group.sizing()).await?;
            }
            cloud
                .update_auto_scaling_group(&AutoScalingGroupSizing::zeroed(group.name()))
                .await?;
        }
        Ok(groups.len())
    }

    async fn delete_load_balancers(&self) -> LifecycleResult<usize> {
        let cloud = self.clients.cloud;
        let load_balancers: Vec<_> = cloud
            .load_balancers()
            .await?
            .into_iter()
            .filter(|lb| lb.matches_cluster(&self.cluster))
            .collect();
        let mut failed = 0;
        for lb in &load_balancers {
            debug!("Deleting load balancer '{}'", lb.arn);
            if let Err(e) = cloud.delete_load_balancer(&lb.arn).await {
                warn!("{}", e);
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(LifecycleError::new_with_context(
                Residue::Partial,
                format!(
                    "Unable to delete {} of {} load balancers",
                    failed,
                    load_balancers.len()
                ),
            ));
        }
        Ok(load_balancers.len())
    }
}

#[test]
fn policy_table_covers_every_phase() {
    use crate::step::policy_of;
    assert_eq!(SUSPEND_POLICY.len(), 9);
    assert_eq!(
        policy_of(SUSPEND_POLICY, SuspendPhase::DeletingLoadBalancers),
        Policy::BestEffort
    );
    assert_eq!(
        policy_of(SUSPEND_POLICY, SuspendPhase::ScalingDownNetwork),
        Policy::Required
    );
}
