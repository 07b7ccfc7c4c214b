use snafu::Snafu;

/// The error type for the AWS, Kubernetes and restoration store clients.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Unable to {}: {}", action, source))]
    Command {
        action: String,
        source: crate::runner::Error,
    },

    #[snafu(display("{}", source))]
    Parse { source: pf_model::Error },

    #[snafu(display("Unable to serialize {}: {}", what, source))]
    Serialize {
        what: String,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The stderr of the failed command, if this error came from a command that ran and exited
    /// with a non-zero code.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::Command {
                source: crate::runner::Error::NonZeroExit { stderr, .. },
                ..
            } => Some(stderr),
            _ => None,
        }
    }
}
