use crate::clients::{self, CloudApi, KubeApi};
use crate::error::{LifecycleError, LifecycleResult, Residue};
use log::{info, warn};
use pf_model::AutoScalingGroupSizing;
use std::future::Future;
use std::time::Duration;

/// How often, and how many times, a readiness condition is checked before giving up.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Polling {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            attempts: 10,
        }
    }
}

/// Checks `ready` until it returns `true` or `polling.attempts` checks have been made. A check
/// that fails is counted as not ready.
async fn poll<F, Fut>(what: &str, polling: Polling, mut ready: F) -> LifecycleResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = clients::Result<bool>>,
{
    for attempt in 1..=polling.attempts {
        match ready().await {
            Ok(true) => {
                info!("{} are ready", what);
                return Ok(());
            }
            Ok(false) => info!(
                "{} are not ready yet ({}/{})",
                what, attempt, polling.attempts
            ),
            Err(e) => warn!(
                "Unable to check whether {} are ready ({}/{}): {}",
                what, attempt, polling.attempts, e
            ),
        }
        if attempt < polling.attempts {
            tokio::time::sleep(polling.interval).await;
        }
    }
    Err(LifecycleError::new_with_context(
        Residue::Partial,
        format!(
            "Timed out waiting for {} after {} checks {:?} apart",
            what, polling.attempts, polling.interval
        ),
    ))
}

/// Waits until each of `groups` has at least its desired capacity of healthy, in-service
/// instances.
pub async fn wait_for_nat_instances(
    cloud: &dyn CloudApi,
    groups: &[AutoScalingGroupSizing],
    polling: Polling,
) -> LifecycleResult<()> {
    let wanted: Vec<&AutoScalingGroupSizing> = groups
        .iter()
        .filter(|group| group.desired_capacity > 0)
        .collect();
    if wanted.is_empty() {
        return Ok(());
    }
    let wanted = &wanted;
    poll("NAT instances", polling, move || async move {
        let current = cloud.auto_scaling_groups().await?;
        Ok::<_, clients::Error>(wanted.iter().all(|sizing| {
            current
                .iter()
                .find(|group| group.name() == sizing.name)
                .map(|group| group.in_service_count() >= sizing.desired_capacity as usize)
                .unwrap_or(false)
        }))
    })
    .await
}

/// Waits until at least `expected` nodes report `Ready`.
pub async fn wait_for_nodes(
    kube: &dyn KubeApi,
    expected: usize,
    polling: Polling,
) -> LifecycleResult<()> {
    if expected == 0 {
        return Ok(());
    }
    info!("Checking for {} ready nodes in the cluster", expected);
    poll("Nodes", polling, move || async move {
        let ready = kube.nodes().await?.iter().filter(|node| node.ready).count();
        info!("Found {} ready nodes", ready);
        Ok::<_, clients::Error>(ready >= expected)
    })
    .await
}
