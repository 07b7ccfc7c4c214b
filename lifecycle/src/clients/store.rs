use super::aws::{AwsCli, CloudApi};
use super::error::Result;
use crate::runner::CommandRunner;
use async_trait::async_trait;
use pf_model::{AutoScalingGroup, AutoScalingGroupSizing, RestorationTags};

/// Where the pre-suspend sizing of NAT Auto Scaling Groups is kept between a suspend and the
/// matching resume.
#[async_trait]
pub trait RestorationStore: Send + Sync {
    /// Records the sizing of `sizing.name` so that it can be restored later.
    async fn save(&self, sizing: &AutoScalingGroupSizing) -> Result<()>;

    /// The recorded sizing of `group`, empty if nothing was recorded.
    async fn load(&self, group: &str) -> Result<RestorationTags>;

    /// Forgets the recorded sizing of `group`.
    async fn clear(&self, group: &str) -> Result<()>;

    /// The NAT groups of `cluster` that have recorded sizing.
    async fn suspended_groups(&self, cluster: &str) -> Result<Vec<AutoScalingGroup>>;
}

/// A [`RestorationStore`] that keeps the sizing in `panfactum.com/original-*` tags on the Auto
/// Scaling Group itself.
#[derive(Clone, Debug)]
pub struct AsgTagStore<R> {
    aws: AwsCli<R>,
}

impl<R> AsgTagStore<R>
where
    R: CommandRunner,
{
    pub fn new(aws: AwsCli<R>) -> Self {
        Self { aws }
    }
}

fn tag_spec(group: &str, key: &str, value: Option<&str>) -> String {
    let mut spec = format!(
        "ResourceId={},ResourceType=auto-scaling-group,Key={}",
        group, key
    );
    if let Some(value) = value {
        spec.push_str(&format!(",Value={},PropagateAtLaunch=false", value));
    }
    spec
}

#[async_trait]
impl<R> RestorationStore for AsgTagStore<R>
where
    R: CommandRunner,
{
    async fn save(&self, sizing: &AutoScalingGroupSizing) -> Result<()> {
        let tags = RestorationTags::from_sizing(sizing);
        let specs = tags
            .entries()
            .into_iter()
            .map(|(key, value)| tag_spec(&sizing.name, key, Some(value)));
        self.aws
            .execute(
                &format!("record the size of auto scaling group '{}'", sizing.name),
                self.aws
                    .invocation("autoscaling", "create-or-update-tags")
                    .arg("--tags")
                    .args(specs),
            )
            .await?;
        Ok(())
    }

    async fn load(&self, group: &str) -> Result<RestorationTags> {
        let groups = self.aws.auto_scaling_groups().await?;
        Ok(groups
            .iter()
            .find(|g| g.name() == group)
            .map(AutoScalingGroup::restoration_tags)
            .unwrap_or_default())
    }

    async fn clear(&self, group: &str) -> Result<()> {
        let specs = RestorationTags::KEYS
            .iter()
            .map(|key| tag_spec(group, key, None));
        self.aws
            .execute(
                &format!("remove the recorded size of auto scaling group '{}'", group),
                self.aws
                    .invocation("autoscaling", "delete-tags")
                    .arg("--tags")
                    .args(specs),
            )
            .await?;
        Ok(())
    }

    async fn suspended_groups(&self, cluster: &str) -> Result<Vec<AutoScalingGroup>> {
        Ok(self
            .aws
            .auto_scaling_groups()
            .await?
            .into_iter()
            .filter(|group| group.is_nat() && group.is_owned_by(cluster) && group.is_suspended())
            .collect())
    }
}

#[test]
fn tag_specs() {
    assert_eq!(
        tag_spec("nat-1", "panfactum.com/original-min-size", Some("1")),
        "ResourceId=nat-1,ResourceType=auto-scaling-group,Key=panfactum.com/original-min-size,\
         Value=1,PropagateAtLaunch=false"
    );
    assert_eq!(
        tag_spec("nat-1", "panfactum.com/original-min-size", None),
        "ResourceId=nat-1,ResourceType=auto-scaling-group,Key=panfactum.com/original-min-size"
    );
}
