/*!

Runs the external command line tools (`aws`, `kubectl`) that suspend and resume drive. Every
invocation goes through a [`CommandRunner`] so that tests can substitute the processes.

!*/

use async_trait::async_trait;
use log::{debug, trace, warn};
use snafu::{ResultExt, Snafu};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Unable to start '{}': {}", command, source))]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("Error running '{}', exit code {}\nstderr:\n{}", command, exit_code, stderr))]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A command to run, with the number of times it is retried if it fails.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
    /// Additional attempts after the first failure.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Invocation {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn working_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    /// The command line as it would be typed, for log and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `true` if `args` appear in this invocation as a contiguous sequence.
    #[cfg(test)]
    pub(crate) fn has_args(&self, args: &[&str]) -> bool {
        args.is_empty()
            || self
                .args
                .windows(args.len())
                .any(|window| window.iter().zip(args).all(|(a, b)| a == b))
    }
}

/// The captured output of a finished command. `stdout` and `stderr` are trimmed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `invocation` once and returns its output regardless of the exit code. Only a failure
    /// to start the process is an error.
    async fn run_unchecked(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Runs `invocation` until it exits with zero, at most `1 + invocation.retries` times, and
    /// returns its stdout.
    async fn run(&self, invocation: &Invocation) -> Result<String> {
        let mut attempt = 0;
        loop {
            let output = self.run_unchecked(invocation).await?;
            if output.success() {
                return Ok(output.stdout);
            }
            if attempt >= invocation.retries {
                return NonZeroExitSnafu {
                    command: invocation.command_line(),
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                }
                .fail();
            }
            attempt += 1;
            warn!(
                "'{}' failed with exit code {}, retrying ({}/{}) in {:?}",
                invocation.command_line(),
                output.exit_code,
                attempt,
                invocation.retries,
                invocation.retry_delay
            );
            tokio::time::sleep(invocation.retry_delay).await;
        }
    }
}

/// Runs commands as child processes of `pf`. A child is killed if its future is dropped, for
/// example when the operator presses Ctrl-C.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run_unchecked(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!("Running '{}'", invocation.command_line());
        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }
        let output = command.output().await.context(SpawnSnafu {
            command: invocation.command_line(),
        })?;
        let output = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        };
        trace!(
            "'{}' exited with {}\nstdout:\n{}\nstderr:\n{}",
            invocation.command_line(),
            output.exit_code,
            output.stdout,
            output.stderr
        );
        Ok(output)
    }
}
