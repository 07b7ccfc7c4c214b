use log::{debug, info, warn};
use pf_lifecycle::clients::{AsgTagStore, AwsCli, Clients, Kubectl};
use pf_lifecycle::runner::ProcessRunner;
use pf_lifecycle::Polling;
use pf_model::{default_kubeconfig_path, Kubeconfig, Settings};

/// The `aws` and `kubectl` clients for one cluster, built from the settings.
pub(crate) struct Connection {
    aws: AwsCli<ProcessRunner>,
    kubectl: Kubectl<ProcessRunner>,
    store: AsgTagStore<ProcessRunner>,
    polling: Polling,
}

impl Connection {
    pub(crate) fn new(settings: &Settings, cluster: &str) -> Self {
        let context = settings
            .kube_context
            .clone()
            .unwrap_or_else(|| cluster.to_string());
        let profile = settings
            .aws_profile
            .clone()
            .or_else(|| profile_from_kubeconfig(settings, &context));
        match &profile {
            Some(profile) => info!("Using AWS profile '{}'", profile),
            None => info!("Using the default AWS credentials"),
        }

        let aws = AwsCli::new(ProcessRunner, &settings.aws_bin)
            .profile(profile)
            .region(settings.aws_region.clone());
        let kubectl = Kubectl::new(ProcessRunner, &settings.kubectl_bin, context)
            .kubeconfig(settings.kubeconfig.clone())
            .retries(settings.command_retries, settings.retry_delay());
        Self {
            store: AsgTagStore::new(aws.clone()),
            aws,
            kubectl,
            polling: Polling {
                interval: settings.poll_interval(),
                attempts: settings.poll_attempts,
            },
        }
    }

    pub(crate) fn clients(&self) -> Clients<'_> {
        Clients::new(&self.aws, &self.kubectl, &self.store)
    }

    pub(crate) fn polling(&self) -> Polling {
        self.polling
    }
}

/// Looks up the AWS profile that the kube context authenticates with. A failed lookup is not an
/// error; the AWS CLI falls back to its own configuration.
fn profile_from_kubeconfig(settings: &Settings, context: &str) -> Option<String> {
    let path = settings
        .kubeconfig
        .clone()
        .or_else(default_kubeconfig_path)?;
    debug!("Reading the AWS profile for '{}' from '{}'", context, path.display());
    match Kubeconfig::read_from(&path).and_then(|kubeconfig| kubeconfig.aws_profile(context)) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!("Unable to find the AWS profile for context '{}': {}", context, e);
            None
        }
    }
}
