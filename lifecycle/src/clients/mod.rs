/*!

The seams between the suspend and resume sequences and the outside world: the AWS control plane
([`CloudApi`]), the Kubernetes API ([`KubeApi`]) and the place where pre-suspend sizing is kept
([`RestorationStore`]). The production implementations shell out to the `aws` and `kubectl` CLIs.

!*/

pub use aws::{AwsCli, CloudApi};
pub use error::{Error, Result};
pub use kubectl::{KubeApi, Kubectl};
pub use store::{AsgTagStore, RestorationStore};

mod aws;
mod error;
mod kubectl;
mod store;

/// The clients a suspend or resume operates through.
#[derive(Clone, Copy)]
pub struct Clients<'a> {
    pub cloud: &'a dyn CloudApi,
    pub kube: &'a dyn KubeApi,
    pub store: &'a dyn RestorationStore,
}

impl<'a> Clients<'a> {
    pub fn new(
        cloud: &'a dyn CloudApi,
        kube: &'a dyn KubeApi,
        store: &'a dyn RestorationStore,
    ) -> Self {
        Self { cloud, kube, store }
    }
}
