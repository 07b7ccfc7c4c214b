use snafu::Snafu;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for `pf-model`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Context '{}' not found in kube config", context))]
    ContextMissing { context: String },

    #[snafu(display(
        "No exec configuration found for user '{}' in context '{}'",
        user,
        context
    ))]
    ExecMissing { user: String, context: String },

    #[snafu(display("Unable to read kube config '{}': {}", path.display(), source))]
    KubeconfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to parse kube config '{}': {}", path.display(), source))]
    KubeconfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("Unable to parse {} at '{}': {}", what, path, source))]
    Parse {
        what: String,
        path: String,
        source: serde_json::Error,
    },

    #[snafu(display(
        "No AWS profile found in exec configuration for context '{}'. AWS profile must be set \
         either via the AWS_PROFILE environment variable or the --profile argument",
        context
    ))]
    ProfileMissing { context: String },

    #[snafu(display("Unable to read settings from the environment: {}", source))]
    Settings { source: envy::Error },

    #[snafu(display("User '{}' not found in kube config for context '{}'", user, context))]
    UserMissing { user: String, context: String },
}

impl Error {
    /// The dotted path of the field that failed to parse, if this is a parse error.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Error::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}
