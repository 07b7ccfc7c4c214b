use super::{tag, FakeCluster};
use async_trait::async_trait;
use pf_lifecycle::clients::{self, RestorationStore};
use pf_model::{AutoScalingGroup, AutoScalingGroupSizing, RestorationTags};

/// Keeps the recorded sizes as tags on the in-memory groups, like the real store does on the Auto
/// Scaling Groups.
#[async_trait]
impl RestorationStore for FakeCluster {
    async fn save(&self, sizing: &AutoScalingGroupSizing) -> clients::Result<()> {
        let mut state = self.call("save")?;
        let group = state
            .auto_scaling_groups
            .iter_mut()
            .find(|group| group.name() == sizing.name)
            .unwrap();
        let tags = RestorationTags::from_sizing(sizing);
        for (key, value) in tags.entries() {
            group.tags.retain(|t| t.key != key);
            group.tags.push(tag(key, value));
        }
        Ok(())
    }

    async fn load(&self, group: &str) -> clients::Result<RestorationTags> {
        let state = self.call("load")?;
        Ok(state
            .auto_scaling_groups
            .iter()
            .find(|g| g.name() == group)
            .map(AutoScalingGroup::restoration_tags)
            .unwrap_or_default())
    }

    async fn clear(&self, group: &str) -> clients::Result<()> {
        let mut state = self.call("clear")?;
        if let Some(group) = state
            .auto_scaling_groups
            .iter_mut()
            .find(|g| g.name() == group)
        {
            group
                .tags
                .retain(|t| !RestorationTags::KEYS.iter().any(|key| *key == t.key));
        }
        Ok(())
    }

    async fn suspended_groups(&self, cluster: &str) -> clients::Result<Vec<AutoScalingGroup>> {
        let state = self.call("suspended_groups")?;
        Ok(state
            .auto_scaling_groups
            .iter()
            .filter(|g| g.is_nat() && g.is_owned_by(cluster) && g.is_suspended())
            .cloned()
            .collect())
    }
}
