use crate::error::{self, Result};
use crate::parse::null_as_default;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};

/// The parts of a kubeconfig file needed to find the AWS profile used to authenticate to a
/// context. Clusters, certificates and preferences are ignored.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Kubeconfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<NamedContext>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<NamedUser>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextRef,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContextRef {
    pub cluster: Option<String>,
    pub user: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: AuthInfo,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub exec: Option<ExecConfig>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExecConfig {
    pub command: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<ExecEnvVar>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExecEnvVar {
    pub name: String,
    pub value: String,
}

impl ExecConfig {
    /// `AWS_PROFILE` in the exec environment wins over `--profile <name>`, which wins over
    /// `--profile=<name>`.
    pub fn aws_profile(&self) -> Option<&str> {
        if let Some(var) = self.env.iter().find(|var| var.name == "AWS_PROFILE") {
            return Some(&var.value);
        }
        if let Some(i) = self.args.iter().position(|arg| arg == "--profile") {
            if let Some(value) = self.args.get(i + 1).filter(|value| !value.is_empty()) {
                return Some(value);
            }
        }
        self.args
            .iter()
            .find_map(|arg| arg.strip_prefix("--profile="))
    }
}

impl Kubeconfig {
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).context(error::KubeconfigReadSnafu { path })?;
        Self::from_yaml(path, &data)
    }

    pub(crate) fn from_yaml(path: &Path, data: &str) -> Result<Self> {
        serde_yaml::from_str(data).context(error::KubeconfigParseSnafu { path })
    }

    /// Finds the AWS profile that the exec credential plugin of `context` authenticates with.
    pub fn aws_profile(&self, context: &str) -> Result<String> {
        let named_context = self
            .contexts
            .iter()
            .find(|c| c.name == context)
            .context(error::ContextMissingSnafu { context })?;
        let user = &named_context.context.user;
        let named_user = self
            .users
            .iter()
            .find(|u| &u.name == user)
            .context(error::UserMissingSnafu { user, context })?;
        let exec = named_user
            .user
            .exec
            .as_ref()
            .context(error::ExecMissingSnafu { user, context })?;
        exec.aws_profile()
            .map(str::to_string)
            .context(error::ProfileMissingSnafu { context })
    }
}

/// The first path in `KUBECONFIG`, or `~/.kube/config`.
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    if let Some(paths) = std::env::var_os("KUBECONFIG") {
        if let Some(first) = std::env::split_paths(&paths).find(|p| !p.as_os_str().is_empty()) {
            return Some(first);
        }
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".kube").join("config"))
}
