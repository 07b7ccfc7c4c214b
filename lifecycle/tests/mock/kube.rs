use super::FakeCluster;
use async_trait::async_trait;
use pf_lifecycle::clients::{self, KubeApi};
use pf_model::{Certificate, KubeNode, NodePoolLimits};

#[async_trait]
impl KubeApi for FakeCluster {
    async fn crd_exists(&self, name: &str) -> clients::Result<bool> {
        let state = self.call("crd_exists")?;
        Ok(state.crds.contains(name))
    }

    async fn node_pools(&self) -> clients::Result<Vec<NodePoolLimits>> {
        let state = self.call("node_pools")?;
        Ok(state.node_pools.clone())
    }

    async fn zero_node_pool_limits(&self, pool: &str) -> clients::Result<()> {
        let mut state = self.call_on("zero_node_pool_limits", pool)?;
        for limits in state.node_pools.iter_mut().filter(|p| p.name == pool) {
            limits.cpu = Some("0".to_string());
            limits.memory = Some("0".to_string());
        }
        Ok(())
    }

    async fn remove_node_pool_limits(&self, pool: &NodePoolLimits) -> clients::Result<()> {
        let mut state = self.call_on("remove_node_pool_limits", &pool.name)?;
        for limits in state.node_pools.iter_mut().filter(|p| p.name == pool.name) {
            limits.cpu = None;
            limits.memory = None;
        }
        Ok(())
    }

    async fn certificates(&self) -> clients::Result<Vec<Certificate>> {
        let state = self.call("certificates")?;
        Ok(state.certificates.clone())
    }

    async fn extend_certificate(
        &self,
        certificate: &Certificate,
        duration: &str,
    ) -> clients::Result<()> {
        let mut state = self.call("extend_certificate")?;
        for c in state
            .certificates
            .iter_mut()
            .filter(|c| c.name == certificate.name && c.namespace == certificate.namespace)
        {
            c.duration = Some(duration.to_string());
        }
        Ok(())
    }

    async fn delete_pending_pods(&self) -> clients::Result<()> {
        let mut state = self.call("delete_pending_pods")?;
        state.pending_pods = 0;
        Ok(())
    }

    async fn scale_deployment(
        &self,
        namespace: &str,
        name: &str,
        replicas: u32,
    ) -> clients::Result<()> {
        let mut state = self.call("scale_deployment")?;
        state
            .deployment_replicas
            .insert(format!("{}/{}", namespace, name), replicas);
        Ok(())
    }

    async fn set_deployment_env(
        &self,
        namespace: &str,
        name: &str,
        env: &str,
    ) -> clients::Result<()> {
        let mut state = self.call("set_deployment_env")?;
        state
            .deployment_env
            .entry(format!("{}/{}", namespace, name))
            .or_default()
            .push(env.to_string());
        Ok(())
    }

    /// One ready node for each unit of desired size across the node groups.
    async fn nodes(&self) -> clients::Result<Vec<KubeNode>> {
        let state = self.call("nodes")?;
        let ready = !state.nodes_never_ready;
        Ok(state
            .node_groups
            .values()
            .flat_map(|group| {
                (0..group.desired_size).map(move |i| KubeNode {
                    name: format!("{}-{}", group.name, i),
                    ready,
                })
            })
            .collect())
    }
}
