use crate::error::{self, Result};
use serde::Deserialize;
use snafu::ResultExt;
use std::path::PathBuf;
use std::time::Duration;

/// The prefix of every environment variable read into [`Settings`].
pub const SETTINGS_PREFIX: &str = "PF_";

/// Settings for `pf`, read from `PF_`-prefixed environment variables. Command line arguments take
/// precedence over these.
///
/// # Example
///
/// ```text
/// PF_AWS_PROFILE=production-admin PF_POLL_ATTEMPTS=30 pf k8s cluster resume --cluster production
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct Settings {
    /// The AWS profile to use. When absent it is looked up from the exec configuration of the
    /// kube context.
    pub aws_profile: Option<String>,

    /// The AWS region to use. When absent the AWS CLI resolves it from the profile.
    pub aws_region: Option<String>,

    /// The kube context to target. Defaults to the cluster name.
    pub kube_context: Option<String>,

    /// The kubeconfig file. Defaults to the first path in `KUBECONFIG`, or `~/.kube/config`.
    pub kubeconfig: Option<PathBuf>,

    /// The path or name of the `aws` binary.
    #[serde(default = "aws_bin")]
    pub aws_bin: String,

    /// The path or name of the `kubectl` binary.
    #[serde(default = "kubectl_bin")]
    pub kubectl_bin: String,

    /// Seconds between readiness checks.
    #[serde(default = "poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Readiness checks made before giving up.
    #[serde(default = "poll_attempts")]
    pub poll_attempts: u32,

    /// Additional attempts for commands that are retried, such as deleting pending pods.
    #[serde(default = "command_retries")]
    pub command_retries: u32,

    /// Seconds between command retries.
    #[serde(default = "retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        envy::prefixed(SETTINGS_PREFIX)
            .from_env()
            .context(error::SettingsSnafu)
    }

    pub fn from_iter<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(SETTINGS_PREFIX)
            .from_iter(vars)
            .context(error::SettingsSnafu)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aws_profile: None,
            aws_region: None,
            kube_context: None,
            kubeconfig: None,
            aws_bin: aws_bin(),
            kubectl_bin: kubectl_bin(),
            poll_interval_secs: poll_interval_secs(),
            poll_attempts: poll_attempts(),
            command_retries: command_retries(),
            retry_delay_secs: retry_delay_secs(),
        }
    }
}

// Defaults for serde.

fn aws_bin() -> String {
    String::from("aws")
}

fn kubectl_bin() -> String {
    String::from("kubectl")
}

fn poll_interval_secs() -> u64 {
    10
}

fn poll_attempts() -> u32 {
    10
}

fn command_retries() -> u32 {
    1
}

fn retry_delay_secs() -> u64 {
    5
}
