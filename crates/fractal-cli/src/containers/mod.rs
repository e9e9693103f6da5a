//! Access to the locally running Synapse container.

use std::io;
use std::process::Command;

use thiserror::Error;

/// Label carried by the local homeserver container.
pub const HOMESERVER_LABEL: &str = "org.homeserver=true";

/// Errors raised while talking to the container engine.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The engine could not be run.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Engine executable.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The engine ran but reported a failure.
    #[error("{program} exited with status {status}: {output}")]
    Engine {
        /// Engine executable.
        program: String,
        /// Exit status, or -1 when killed by a signal.
        status: i32,
        /// Combined output.
        output: String,
    },
    /// No container carries [`HOMESERVER_LABEL`].
    #[error("no container labelled {HOMESERVER_LABEL} is running")]
    NoHomeserver,
}

/// Result of a command run inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit status, or -1 when killed by a signal.
    pub status: i32,
    /// Combined stdout and stderr.
    pub output: String,
}

impl ExecOutput {
    /// Whether the command exited successfully.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }
}

/// Operations on local containers.
pub trait ContainerRuntime {
    /// Identifier of the running homeserver container.
    fn homeserver_container(&self) -> Result<String, ContainerError>;

    /// Runs `command` inside `container`.
    fn exec(&self, container: &str, command: &[String]) -> Result<ExecOutput, ContainerError>;
}

/// Drives the `docker` command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: String::from("docker"),
        }
    }
}

impl DockerCli {
    fn run(&self, args: &[&str], extra: &[String]) -> Result<ExecOutput, ContainerError> {
        let output = Command::new(&self.program)
            .args(args)
            .args(extra)
            .output()
            .map_err(|source| ContainerError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(ExecOutput {
            status: output.status.code().unwrap_or(-1),
            output: text,
        })
    }
}

impl ContainerRuntime for DockerCli {
    fn homeserver_container(&self) -> Result<String, ContainerError> {
        let filter = format!("label={HOMESERVER_LABEL}");
        let listing = self.run(&["ps", "--quiet", "--filter", &filter], &[])?;
        if !listing.success() {
            return Err(ContainerError::Engine {
                program: self.program.clone(),
                status: listing.status,
                output: listing.output,
            });
        }
        listing
            .output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_owned)
            .ok_or(ContainerError::NoHomeserver)
    }

    fn exec(&self, container: &str, command: &[String]) -> Result<ExecOutput, ContainerError> {
        self.run(&["exec", container], command)
    }
}
