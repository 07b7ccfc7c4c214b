/*!

An in-memory cluster that implements [`CloudApi`], [`KubeApi`] and [`RestorationStore`] so that
suspend and resume can be tested without AWS or Kubernetes.

Every call is recorded by name, and any call can be made to fail with [`FakeCluster::fail`].

!*/

mod cloud;
mod kube;
mod store;

use maplit::{btreemap, btreeset};
use pf_lifecycle::clients::{self, Clients};
use pf_lifecycle::runner;
use pf_model::constants::cluster_ownership_tag;
use pf_model::{
    AutoScalingGroup, AutoScalingGroupSizing, Certificate, ClusterInfo, GroupInstance,
    LoadBalancer, NodeGroupConfig, NodePoolLimits, Tag,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

pub const CLUSTER: &str = "production-eks";

/// The calls that change the cluster.
pub const MUTATING_CALLS: &[&str] = &[
    "tag_cluster",
    "untag_cluster",
    "update_node_group",
    "terminate_instances",
    "update_auto_scaling_group",
    "delete_load_balancer",
    "zero_node_pool_limits",
    "remove_node_pool_limits",
    "extend_certificate",
    "delete_pending_pods",
    "scale_deployment",
    "set_deployment_env",
    "save",
    "clear",
];

#[derive(Clone, Debug, Default)]
pub struct State {
    pub cluster: ClusterInfo,
    pub node_groups: BTreeMap<String, NodeGroupConfig>,
    pub instances: BTreeSet<String>,
    pub auto_scaling_groups: Vec<AutoScalingGroup>,
    pub load_balancers: Vec<LoadBalancer>,
    pub crds: BTreeSet<String>,
    pub node_pools: Vec<NodePoolLimits>,
    pub certificates: Vec<Certificate>,
    pub pending_pods: usize,
    pub deployment_replicas: BTreeMap<String, u32>,
    pub deployment_env: BTreeMap<String, Vec<String>>,
    /// Node groups report no ready nodes while this is set.
    pub nodes_never_ready: bool,
    pub calls: Vec<String>,
    pub failures: BTreeSet<String>,
}

pub struct FakeCluster {
    state: Mutex<State>,
}

impl FakeCluster {
    pub fn new(state: State) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// A running cluster with two NAT groups, one EKS node group, Karpenter and cert-manager.
    pub fn production() -> Self {
        let owned = |name: &str, min: u32, max: u32, desired: u32| {
            let mut group = AutoScalingGroup {
                auto_scaling_group_name: name.to_string(),
                tags: vec![tag(&cluster_ownership_tag(CLUSTER), "owned")],
                ..Default::default()
            };
            set_size(
                &mut group,
                &AutoScalingGroupSizing {
                    name: name.to_string(),
                    min_size: min,
                    max_size: max,
                    desired_capacity: desired,
                },
            );
            group
        };
        let mut other = owned("staging-eks-nat-1", 1, 1, 1);
        other.tags = vec![tag(&cluster_ownership_tag("staging-eks"), "owned")];

        Self::new(State {
            cluster: ClusterInfo {
                name: CLUSTER.to_string(),
                arn: format!("arn:aws:eks:us-east-2:123456789012:cluster/{}", CLUSTER),
                status: Some("ACTIVE".to_string()),
                tags: btreemap! { "environment".to_string() => "production".to_string() },
                ..Default::default()
            },
            node_groups: btreemap! {
                "system".to_string() => NodeGroupConfig {
                    name: "system".to_string(),
                    min_size: 1,
                    max_size: 5,
                    desired_size: 2,
                },
            },
            instances: btreeset! {
                "i-0a".to_string(),
                "i-0b".to_string(),
                "i-0c".to_string(),
            },
            auto_scaling_groups: vec![
                owned("production-eks-nat-1", 2, 4, 3),
                owned("production-eks-nat-2", 1, 1, 1),
                owned("production-eks-workers", 1, 3, 2),
                other,
            ],
            load_balancers: vec![
                load_balancer("net/production-eks-ingress/50dc6c495c0c9188"),
                load_balancer("app/staging-eks-ingress/60dc6c495c0c9188"),
            ],
            crds: btreeset! {
                "nodepools.karpenter.sh".to_string(),
                "certificates.cert-manager.io".to_string(),
            },
            node_pools: vec![NodePoolLimits {
                name: "spot".to_string(),
                cpu: Some("1000".to_string()),
                memory: Some("4000Gi".to_string()),
            }],
            certificates: vec![
                Certificate {
                    name: "vault-internal".to_string(),
                    namespace: "vault".to_string(),
                    issuer: "internal".to_string(),
                    duration: Some("24h".to_string()),
                },
                Certificate {
                    name: "ingress".to_string(),
                    namespace: "ingress-nginx".to_string(),
                    issuer: "public".to_string(),
                    duration: None,
                },
            ],
            pending_pods: 4,
            deployment_replicas: btreemap! {
                "kube-system/panfactum-scheduler".to_string() => 0,
            },
            ..Default::default()
        })
    }

    pub fn clients(&self) -> Clients<'_> {
        Clients::new(self, self, self)
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Makes every later call named `op` fail.
    pub fn fail(&self, op: &str) {
        self.state().failures.insert(op.to_string());
    }

    /// Makes every later call named `op` on `resource` fail. Calls on other resources succeed.
    pub fn fail_for(&self, op: &str, resource: &str) {
        self.state()
            .failures
            .insert(format!("{} {}", op, resource));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| MUTATING_CALLS.iter().any(|op| *op == call.as_str()))
            .collect()
    }

    pub fn group(&self, name: &str) -> AutoScalingGroup {
        self.state()
            .auto_scaling_groups
            .iter()
            .find(|group| group.name() == name)
            .cloned()
            .unwrap()
    }

    /// Records the call and returns an error if `op` has been made to fail.
    fn call(&self, op: &str) -> clients::Result<MutexGuard<'_, State>> {
        let mut state = self.state();
        state.calls.push(op.to_string());
        if state.failures.contains(op) {
            return Err(failure(op));
        }
        Ok(state)
    }

    /// Like [`FakeCluster::call`], but also fails if `op` has been made to fail for `resource`.
    fn call_on(&self, op: &str, resource: &str) -> clients::Result<MutexGuard<'_, State>> {
        let state = self.call(op)?;
        let scoped = format!("{} {}", op, resource);
        if state.failures.contains(&scoped) {
            return Err(failure(&scoped));
        }
        Ok(state)
    }
}

fn failure(op: &str) -> clients::Error {
    clients::Error::Command {
        action: op.to_string(),
        source: runner::Error::NonZeroExit {
            command: format!("fake {}", op),
            exit_code: 1,
            stderr: format!("{} failed", op),
        },
    }
}

pub fn tag(key: &str, value: &str) -> Tag {
    Tag {
        key: key.to_string(),
        value: value.to_string(),
    }
}

pub fn load_balancer(name: &str) -> LoadBalancer {
    LoadBalancer {
        arn: format!(
            "arn:aws:elasticloadbalancing:us-east-2:123456789012:loadbalancer/{}",
            name
        ),
        ..Default::default()
    }
}

/// Applies `sizing` to `group` and brings its instances to the desired capacity.
fn set_size(group: &mut AutoScalingGroup, sizing: &AutoScalingGroupSizing) {
    group.min_size = sizing.min_size;
    group.max_size = sizing.max_size;
    group.desired_capacity = sizing.desired_capacity;
    group.instances = (0..sizing.desired_capacity)
        .map(|i| GroupInstance {
            instance_id: format!("i-{}-{}", group.auto_scaling_group_name, i),
            lifecycle_state: "InService".to_string(),
            health_status: "Healthy".to_string(),
        })
        .collect();
}
