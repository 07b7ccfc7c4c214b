/*!

This library provides the data model shared by the `pf` cluster lifecycle commands: the views of
the AWS CLI and `kubectl` JSON output that suspend and resume act on, the kubeconfig lookup used to
find the AWS profile of a context, and the settings read from the environment.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use autoscaling::{
    AutoScalingGroup, AutoScalingGroupSizing, DescribeAutoScalingGroupsOutput, GroupInstance,
    RestorationTags, Tag,
};
pub use cluster::{CallerIdentity, ClusterInfo, DescribeClusterOutput};
pub use error::{Error, Result};
pub use kubeconfig::{default_kubeconfig_path, Kubeconfig};
pub use kubernetes::{
    Certificate, CertificateResource, ItemList, KubeNode, NodePool, NodePoolLimits, NodeResource,
};
pub use network::{DescribeInstancesOutput, DescribeLoadBalancersOutput, LoadBalancer};
pub use nodegroup::{ListNodegroupsOutput, NodeGroupConfig};
pub use parse::parse_json;
pub use settings::Settings;

mod autoscaling;
mod cluster;
pub mod constants;
mod error;
mod kubeconfig;
mod kubernetes;
mod network;
mod nodegroup;
mod parse;
mod settings;
