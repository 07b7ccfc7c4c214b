use super::error::{self, Result};
use crate::runner::{self, CommandRunner, Invocation};
use async_trait::async_trait;
use log::debug;
use pf_model::{
    parse_json, Certificate, CertificateResource, ItemList, KubeNode, NodePool, NodePoolLimits,
    NodeResource,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use snafu::ResultExt;
use std::path::PathBuf;
use std::time::Duration;

/// The Kubernetes operations used to suspend and resume a cluster.
#[async_trait]
pub trait KubeApi: Send + Sync {
    /// `true` if the custom resource definition `name` is installed. Used to detect optional
    /// components such as Karpenter and cert-manager.
    async fn crd_exists(&self, name: &str) -> Result<bool>;

    async fn node_pools(&self) -> Result<Vec<NodePoolLimits>>;

    /// Sets the cpu and memory limits of a node pool to zero so that it provisions no nodes.
    async fn zero_node_pool_limits(&self, pool: &str) -> Result<()>;

    /// Removes the cpu and memory limits that `pool` carries.
    async fn remove_node_pool_limits(&self, pool: &NodePoolLimits) -> Result<()>;

    async fn certificates(&self) -> Result<Vec<Certificate>>;

    async fn extend_certificate(&self, certificate: &Certificate, duration: &str) -> Result<()>;

    /// Deletes every pod in the `Pending` phase across all namespaces.
    async fn delete_pending_pods(&self) -> Result<()>;

    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: u32) -> Result<()>;

    /// Sets `env` (`NAME=value`) on every container of a deployment.
    async fn set_deployment_env(&self, namespace: &str, name: &str, env: &str) -> Result<()>;

    async fn nodes(&self) -> Result<Vec<KubeNode>>;
}

/// A [`KubeApi`] that runs `kubectl` against a named kube context.
#[derive(Clone, Debug)]
pub struct Kubectl<R> {
    runner: R,
    bin: String,
    context: String,
    kubeconfig: Option<PathBuf>,
    retries: u32,
    retry_delay: Duration,
}

impl<R> Kubectl<R>
where
    R: CommandRunner,
{
    pub fn new<S1, S2>(runner: R, bin: S1, context: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            runner,
            bin: bin.into(),
            context: context.into(),
            kubeconfig: None,
            retries: 0,
            retry_delay: Duration::default(),
        }
    }

    pub fn kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    /// The retry policy for commands that are expected to be flaky while the cluster is coming
    /// back up.
    pub fn retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    fn invocation(&self) -> Invocation {
        let mut invocation = Invocation::new(&self.bin);
        if let Some(kubeconfig) = &self.kubeconfig {
            invocation = invocation
                .arg("--kubeconfig")
                .arg(kubeconfig.display().to_string());
        }
        invocation.args(["--context", self.context.as_str()])
    }

    async fn execute(&self, action: &str, invocation: Invocation) -> Result<String> {
        self.runner
            .run(&invocation)
            .await
            .context(error::CommandSnafu { action })
    }

    async fn list<T>(&self, resource: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let action = format!("list {}", resource);
        let stdout = self
            .execute(
                &action,
                self.invocation()
                    .args(["get", resource])
                    .args(["-o", "json"]),
            )
            .await?;
        let list: ItemList<T> = parse_json(resource, &stdout).context(error::ParseSnafu)?;
        Ok(list.items)
    }

    async fn patch(
        &self,
        action: &str,
        invocation: Invocation,
        patch_type: &str,
        patch: serde_json::Value,
    ) -> Result<()> {
        let patch = serde_json::to_string(&patch).context(error::SerializeSnafu { what: action })?;
        self.execute(
            action,
            invocation
                .args(["--type", patch_type])
                .arg("-p")
                .arg(patch),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl<R> KubeApi for Kubectl<R>
where
    R: CommandRunner,
{
    async fn crd_exists(&self, name: &str) -> Result<bool> {
        let action = format!("look up custom resource definition '{}'", name);
        let invocation = self.invocation().args(["get", "crd", name]);
        let output = self
            .runner
            .run_unchecked(&invocation)
            .await
            .context(error::CommandSnafu {
                action: action.as_str(),
            })?;
        if output.success() {
            return Ok(true);
        }
        if output.stderr.contains("NotFound") || output.stderr.contains("not found") {
            debug!("Custom resource definition '{}' is not installed", name);
            return Ok(false);
        }
        Err(runner::Error::NonZeroExit {
            command: invocation.command_line(),
            exit_code: output.exit_code,
            stderr: output.stderr,
        })
        .context(error::CommandSnafu { action })
    }

    async fn node_pools(&self) -> Result<Vec<NodePoolLimits>> {
        let pools: Vec<NodePool> = self
            .list(pf_model::constants::KARPENTER_NODE_POOL_CRD)
            .await?;
        Ok(pools.into_iter().map(Into::into).collect())
    }

    async fn zero_node_pool_limits(&self, pool: &str) -> Result<()> {
        self.patch(
            &format!("zero the limits of node pool '{}'", pool),
            self.invocation().args(["patch", "nodepool", pool]),
            "merge",
            json!({"spec": {"limits": {"cpu": "0", "memory": "0"}}}),
        )
        .await
    }

    async fn remove_node_pool_limits(&self, pool: &NodePoolLimits) -> Result<()> {
        // A JSON patch `remove` of a path that does not exist fails the whole patch.
        let ops: Vec<serde_json::Value> = [("cpu", &pool.cpu), ("memory", &pool.memory)]
            .iter()
            .filter(|(_, limit)| limit.is_some())
            .map(|(name, _)| json!({"op": "remove", "path": format!("/spec/limits/{}", name)}))
            .collect();
        if ops.is_empty() {
            return Ok(());
        }
        self.patch(
            &format!("remove the limits of node pool '{}'", pool.name),
            self.invocation()
                .args(["patch", "nodepool", pool.name.as_str()]),
            "json",
            serde_json::Value::Array(ops),
        )
        .await
    }

    async fn certificates(&self) -> Result<Vec<Certificate>> {
        let action = "list certificates";
        let stdout = self
            .execute(
                action,
                self.invocation()
                    .args(["get", "certificate", "--all-namespaces"])
                    .args(["-o", "json"]),
            )
            .await?;
        let list: ItemList<CertificateResource> =
            parse_json("certificates", &stdout).context(error::ParseSnafu)?;
        Ok(list
            .items
            .into_iter()
            .filter_map(Certificate::from_resource)
            .collect())
    }

    async fn extend_certificate(&self, certificate: &Certificate, duration: &str) -> Result<()> {
        self.patch(
            &format!(
                "extend certificate '{}/{}'",
                certificate.namespace, certificate.name
            ),
            self.invocation()
                .args(["-n", certificate.namespace.as_str()])
                .args(["patch", "certificate", certificate.name.as_str()]),
            "merge",
            json!({"spec": {"duration": duration}}),
        )
        .await
    }

    async fn delete_pending_pods(&self) -> Result<()> {
        self.execute(
            "delete pending pods",
            self.invocation()
                .args(["delete", "pods", "--all-namespaces"])
                .arg("--field-selector=status.phase=Pending")
                .retries(self.retries, self.retry_delay),
        )
        .await?;
        Ok(())
    }

    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: u32) -> Result<()> {
        self.execute(
            &format!("scale deployment '{}/{}'", namespace, name),
            self.invocation()
                .args(["-n", namespace])
                .args(["scale", "deployment", name])
                .arg(format!("--replicas={}", replicas)),
        )
        .await?;
        Ok(())
    }

    async fn set_deployment_env(&self, namespace: &str, name: &str, env: &str) -> Result<()> {
        self.execute(
            &format!("set '{}' on deployment '{}/{}'", env, namespace, name),
            self.invocation()
                .args(["-n", namespace])
                .args(["set", "env"])
                .arg(format!("deployment/{}", name))
                .arg(env),
        )
        .await?;
        Ok(())
    }

    async fn nodes(&self) -> Result<Vec<KubeNode>> {
        let nodes: Vec<NodeResource> = self.list("nodes").await?;
        Ok(nodes.into_iter().map(Into::into).collect())
    }
}
