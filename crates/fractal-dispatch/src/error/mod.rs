//! Errors raised while registering controllers and routing invocations.
//!
//! Registration problems are reported eagerly so that a malformed method
//! table stops the program before any parsing happens. Routing problems are
//! kept separate from the errors controller methods return: a dispatch yields
//! `Result<CommandResult, DispatchError>`, so a method's own failure is never
//! rewrapped by the dispatcher.

use thiserror::Error;

/// Errors raised while turning a controller's method table into descriptors.
///
/// Method names are fully qualified as `<controller type>::<method>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A CLI-enabled method has no documentation at all.
    #[error("CLI method {method} is missing documentation")]
    MissingDocstring {
        /// Fully qualified method name.
        method: String,
    },

    /// The method takes parameters but its documentation has no `Args`
    /// section.
    #[error("documentation for {method} is missing an 'Args' section")]
    MissingArgsSection {
        /// Fully qualified method name.
        method: String,
    },

    /// The structured part of the documentation is not valid YAML.
    #[error("documentation for {method} is malformed: {message}")]
    MalformedDocumentation {
        /// Fully qualified method name.
        method: String,
        /// Parser diagnostic.
        message: String,
    },

    /// An `Args` entry is not a string description.
    #[error("argument '{argument}' of {method} must have a string description")]
    InvalidArgDescription {
        /// Fully qualified method name.
        method: String,
        /// Offending `Args` key.
        argument: String,
    },

    /// One or more parameters are absent from the `Args` section.
    #[error("documentation for {method} is missing args: {}", .missing.join(", "))]
    UndocumentedArgument {
        /// Fully qualified method name.
        method: String,
        /// Every undocumented parameter, in declaration order.
        missing: Vec<String>,
    },

    /// An alias is already taken by another method or by a controller name.
    #[error("alias '{alias}' is already registered to {owner}")]
    DuplicateAlias {
        /// Conflicting alias.
        alias: String,
        /// Current owner, as `plugin.method` or a controller name.
        owner: String,
    },

    /// The controller declares a blank plugin name.
    #[error("controller {controller} has no plugin name")]
    MissingPluginName {
        /// Type name of the controller.
        controller: String,
    },
}

/// Errors raised by the dispatcher before a controller method runs.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The command line did not parse, or the user asked for help.
    ///
    /// The wrapped `clap` error carries its own rendering and exit code;
    /// help and version requests surface here too.
    #[error("{0}")]
    Usage(#[source] clap::Error),

    /// No controller is registered under the requested plugin name.
    #[error("unknown controller '{plugin}'")]
    UnknownController {
        /// Requested plugin name.
        plugin: String,
    },

    /// The controller has no method with the requested name.
    #[error("controller '{plugin}' has no method '{method}'")]
    UnknownMethod {
        /// Plugin that was resolved.
        plugin: String,
        /// Requested method name.
        method: String,
    },

    /// The method exists but is not exposed on the command line.
    #[error("method {method} is not available from the command line")]
    MethodNotCliEnabled {
        /// Fully qualified method name.
        method: String,
    },
}

impl From<clap::Error> for DispatchError {
    fn from(error: clap::Error) -> Self {
        Self::Usage(error)
    }
}

/// Errors returned by controller methods.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command wants the process to stop with a message and status.
    #[error("{message}")]
    Exit {
        /// Process exit status.
        status: u8,
        /// Message for the user.
        message: String,
    },

    /// The handler expected a different number of arguments than the method
    /// table declares.
    #[error("command expected {expected} arguments but received {actual}")]
    Arity {
        /// Arguments the handler destructures.
        expected: usize,
        /// Arguments the dispatcher projected.
        actual: usize,
    },

    /// Any other failure.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl CommandError {
    /// Builds an [`CommandError::Exit`] with status 1.
    #[must_use]
    pub fn exit(message: impl Into<String>) -> Self {
        Self::Exit {
            status: 1,
            message: message.into(),
        }
    }

    /// Exit status the process should end with.
    #[must_use]
    pub const fn status(&self) -> u8 {
        match self {
            Self::Exit { status, .. } => *status,
            Self::Arity { .. } | Self::Failed(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests;
