/*!

`pf-lifecycle` suspends and resumes Panfactum EKS clusters.

A suspend scales every source of compute cost in a cluster to zero: Karpenter node pools, EKS
managed node groups, the cluster's EC2 instances, its NAT gateway Auto Scaling Groups and its load
balancers. The size of each NAT group is recorded in a [`RestorationStore`](clients::RestorationStore)
before the group is zeroed so that a resume can bring it back. Both sequences are fixed lists of
steps, each either required or best-effort, run by [`step::Steps`].

All AWS and Kubernetes access goes through the [`CloudApi`](clients::CloudApi) and
[`KubeApi`](clients::KubeApi) traits. The production implementations drive the `aws` and
`kubectl` command line tools through a [`CommandRunner`](runner::CommandRunner).

!*/

pub mod clients;
mod error;
pub mod readiness;
pub mod resume;
pub mod runner;
pub mod step;
pub mod suspend;

pub use error::{IntoLifecycleError, LifecycleError, LifecycleResult, Residue};
pub use readiness::Polling;
pub use resume::{ResumePhase, ResumeSummary, Resumer};
pub use suspend::{SuspendPhase, SuspendSummary, Suspender};
