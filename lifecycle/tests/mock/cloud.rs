use super::{set_size, FakeCluster};
use async_trait::async_trait;
use pf_lifecycle::clients::{self, CloudApi};
use pf_model::{
    AutoScalingGroup, AutoScalingGroupSizing, CallerIdentity, ClusterInfo, LoadBalancer,
    NodeGroupConfig,
};

#[async_trait]
impl CloudApi for FakeCluster {
    async fn caller_identity(&self) -> clients::Result<CallerIdentity> {
        self.call("caller_identity")?;
        Ok(CallerIdentity {
            account: "123456789012".to_string(),
            arn: "arn:aws:iam::123456789012:user/operator".to_string(),
            user_id: None,
        })
    }

    async fn describe_cluster(&self, cluster: &str) -> clients::Result<ClusterInfo> {
        let state = self.call("describe_cluster")?;
        assert_eq!(cluster, state.cluster.name);
        Ok(state.cluster.clone())
    }

    async fn tag_cluster(&self, arn: &str, key: &str, value: &str) -> clients::Result<()> {
        let mut state = self.call("tag_cluster")?;
        assert_eq!(arn, state.cluster.arn);
        state.cluster.tags.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn untag_cluster(&self, arn: &str, key: &str) -> clients::Result<()> {
        let mut state = self.call("untag_cluster")?;
        assert_eq!(arn, state.cluster.arn);
        state.cluster.tags.remove(key);
        Ok(())
    }

    async fn list_node_groups(&self, _cluster: &str) -> clients::Result<Vec<String>> {
        let state = self.call("list_node_groups")?;
        Ok(state.node_groups.keys().cloned().collect())
    }

    async fn update_node_group(
        &self,
        _cluster: &str,
        config: &NodeGroupConfig,
    ) -> clients::Result<()> {
        let mut state = self.call("update_node_group")?;
        state.node_groups.insert(config.name.clone(), config.clone());
        Ok(())
    }

    async fn cluster_instances(&self, _cluster: &str) -> clients::Result<Vec<String>> {
        let state = self.call("cluster_instances")?;
        Ok(state.instances.iter().cloned().collect())
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> clients::Result<()> {
        let mut state = self.call("terminate_instances")?;
        for id in instance_ids {
            state.instances.remove(id);
        }
        Ok(())
    }

    async fn auto_scaling_groups(&self) -> clients::Result<Vec<AutoScalingGroup>> {
        let state = self.call("auto_scaling_groups")?;
        Ok(state.auto_scaling_groups.clone())
    }

    async fn update_auto_scaling_group(
        &self,
        sizing: &AutoScalingGroupSizing,
    ) -> clients::Result<()> {
        let mut state = self.call("update_auto_scaling_group")?;
        let group = state
            .auto_scaling_groups
            .iter_mut()
            .find(|group| group.name() == sizing.name)
            .unwrap();
        set_size(group, sizing);
        Ok(())
    }

    async fn load_balancers(&self) -> clients::Result<Vec<LoadBalancer>> {
        let state = self.call("load_balancers")?;
        Ok(state.load_balancers.clone())
    }

    async fn delete_load_balancer(&self, arn: &str) -> clients::Result<()> {
        let mut state = self.call_on("delete_load_balancer", arn)?;
        state.load_balancers.retain(|lb| lb.arn != arn);
        Ok(())
    }
}
