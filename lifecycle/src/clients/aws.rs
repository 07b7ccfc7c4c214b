use super::error::{self, Result};
use crate::runner::{CommandRunner, Invocation};
use async_trait::async_trait;
use log::info;
use pf_model::constants::{cluster_ownership_tag, CLUSTER_OWNED_VALUE};
use pf_model::{
    parse_json, AutoScalingGroup, AutoScalingGroupSizing, CallerIdentity, ClusterInfo,
    DescribeAutoScalingGroupsOutput, DescribeClusterOutput, DescribeInstancesOutput,
    DescribeLoadBalancersOutput, ListNodegroupsOutput, LoadBalancer, NodeGroupConfig,
};
use serde::de::DeserializeOwned;
use snafu::ResultExt;

/// `ec2 terminate-instances` accepts at most this many instance ids per call.
const TERMINATE_BATCH_SIZE: usize = 1000;

/// The AWS control plane operations used to suspend and resume a cluster.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// The identity of the configured credentials. Used to validate access before anything else.
    async fn caller_identity(&self) -> Result<CallerIdentity>;

    async fn describe_cluster(&self, cluster: &str) -> Result<ClusterInfo>;

    async fn tag_cluster(&self, arn: &str, key: &str, value: &str) -> Result<()>;

    async fn untag_cluster(&self, arn: &str, key: &str) -> Result<()>;

    async fn list_node_groups(&self, cluster: &str) -> Result<Vec<String>>;

    async fn update_node_group(&self, cluster: &str, config: &NodeGroupConfig) -> Result<()>;

    /// The ids of running EC2 instances tagged `kubernetes.io/cluster/<cluster>=owned`.
    async fn cluster_instances(&self, cluster: &str) -> Result<Vec<String>>;

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()>;

    /// Every Auto Scaling Group in the account and region.
    async fn auto_scaling_groups(&self) -> Result<Vec<AutoScalingGroup>>;

    async fn update_auto_scaling_group(&self, sizing: &AutoScalingGroupSizing) -> Result<()>;

    /// Every Elastic Load Balancing v2 load balancer in the account and region.
    async fn load_balancers(&self) -> Result<Vec<LoadBalancer>>;

    async fn delete_load_balancer(&self, arn: &str) -> Result<()>;
}

/// A [`CloudApi`] that runs the `aws` CLI.
#[derive(Clone, Debug)]
pub struct AwsCli<R> {
    runner: R,
    bin: String,
    profile: Option<String>,
    region: Option<String>,
}

impl<R> AwsCli<R>
where
    R: CommandRunner,
{
    pub fn new<S: Into<String>>(runner: R, bin: S) -> Self {
        Self {
            runner,
            bin: bin.into(),
            profile: None,
            region: None,
        }
    }

    pub fn profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// An `aws` invocation for `service subcommand` with JSON output, the selected profile and
    /// region, and the pager disabled.
    pub(crate) fn invocation(&self, service: &str, subcommand: &str) -> Invocation {
        let mut invocation = Invocation::new(&self.bin)
            .args([service, subcommand])
            .args(["--output", "json"])
            .env("AWS_PAGER", "");
        if let Some(profile) = &self.profile {
            invocation = invocation.args(["--profile", profile.as_str()]);
        }
        if let Some(region) = &self.region {
            invocation = invocation.args(["--region", region.as_str()]);
        }
        invocation
    }

    pub(crate) async fn execute(&self, action: &str, invocation: Invocation) -> Result<String> {
        self.runner
            .run(&invocation)
            .await
            .context(error::CommandSnafu { action })
    }

    pub(crate) async fn execute_json<T>(&self, action: &str, invocation: Invocation) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let stdout = self.execute(action, invocation).await?;
        parse_json(&format!("{} output", action), &stdout).context(error::ParseSnafu)
    }
}

#[async_trait]
impl<R> CloudApi for AwsCli<R>
where
    R: CommandRunner,
{
    async fn caller_identity(&self) -> Result<CallerIdentity> {
        self.execute_json(
            "get the caller identity",
            self.invocation("sts", "get-caller-identity"),
        )
        .await
    }

    async fn describe_cluster(&self, cluster: &str) -> Result<ClusterInfo> {
        let output: DescribeClusterOutput = self
            .execute_json(
                &format!("describe cluster '{}'", cluster),
                self.invocation("eks", "describe-cluster")
                    .args(["--name", cluster]),
            )
            .await?;
        Ok(output.cluster)
    }

    async fn tag_cluster(&self, arn: &str, key: &str, value: &str) -> Result<()> {
        self.execute(
            &format!("tag cluster '{}'", arn),
            self.invocation("eks", "tag-resource")
                .args(["--resource-arn", arn])
                .arg("--tags")
                .arg(format!("{}={}", key, value)),
        )
        .await?;
        Ok(())
    }

    async fn untag_cluster(&self, arn: &str, key: &str) -> Result<()> {
        self.execute(
            &format!("untag cluster '{}'", arn),
            self.invocation("eks", "untag-resource")
                .args(["--resource-arn", arn])
                .args(["--tag-keys", key]),
        )
        .await?;
        Ok(())
    }

    async fn list_node_groups(&self, cluster: &str) -> Result<Vec<String>> {
        let output: ListNodegroupsOutput = self
            .execute_json(
                &format!("list node groups of cluster '{}'", cluster),
                self.invocation("eks", "list-nodegroups")
                    .args(["--cluster-name", cluster]),
            )
            .await?;
        Ok(output.nodegroups)
    }

    async fn update_node_group(&self, cluster: &str, config: &NodeGroupConfig) -> Result<()> {
        self.execute(
            &format!("update node group '{}'", config.name),
            self.invocation("eks", "update-nodegroup-config")
                .args(["--cluster-name", cluster])
                .args(["--nodegroup-name", config.name.as_str()])
                .arg("--scaling-config")
                .arg(config.scaling_config_arg()),
        )
        .await?;
        Ok(())
    }

    async fn cluster_instances(&self, cluster: &str) -> Result<Vec<String>> {
        let output: DescribeInstancesOutput = self
            .execute_json(
                &format!("describe instances of cluster '{}'", cluster),
                self.invocation("ec2", "describe-instances").args([
                    "--filters".to_string(),
                    format!(
                        "Name=tag:{},Values={}",
                        cluster_ownership_tag(cluster),
                        CLUSTER_OWNED_VALUE
                    ),
                    "Name=instance-state-name,Values=running".to_string(),
                ]),
            )
            .await?;
        Ok(output.instance_ids())
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()> {
        for batch in instance_ids.chunks(TERMINATE_BATCH_SIZE) {
            info!("Terminating {} instances", batch.len());
            self.execute(
                "terminate instances",
                self.invocation("ec2", "terminate-instances")
                    .arg("--instance-ids")
                    .args(batch.iter().cloned()),
            )
            .await?;
        }
        Ok(())
    }

    async fn auto_scaling_groups(&self) -> Result<Vec<AutoScalingGroup>> {
        let output: DescribeAutoScalingGroupsOutput = self
            .execute_json(
                "describe auto scaling groups",
                self.invocation("autoscaling", "describe-auto-scaling-groups"),
            )
            .await?;
        Ok(output.auto_scaling_groups)
    }

    async fn update_auto_scaling_group(&self, sizing: &AutoScalingGroupSizing) -> Result<()> {
        self.execute(
            &format!("update auto scaling group '{}'", sizing.name),
            self.invocation("autoscaling", "update-auto-scaling-group")
                .args(["--auto-scaling-group-name", sizing.name.as_str()])
                .arg("--min-size")
                .arg(sizing.min_size.to_string())
                .arg("--max-size")
                .arg(sizing.max_size.to_string())
                .arg("--desired-capacity")
                .arg(sizing.desired_capacity.to_string()),
        )
        .await?;
        Ok(())
    }

    async fn load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        let output: DescribeLoadBalancersOutput = self
            .execute_json(
                "describe load balancers",
                self.invocation("elbv2", "describe-load-balancers"),
            )
            .await?;
        Ok(output.load_balancers)
    }

    async fn delete_load_balancer(&self, arn: &str) -> Result<()> {
        self.execute(
            &format!("delete load balancer '{}'", arn),
            self.invocation("elbv2", "delete-load-balancer")
                .args(["--load-balancer-arn", arn]),
        )
        .await?;
        Ok(())
    }
}
