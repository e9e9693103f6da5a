//! Routing of one invocation from raw arguments to a controller method.
//!
//! A dispatch runs in four steps: rewrite shortcuts into the canonical
//! form, parse with the synthesised `clap` tree, resolve the controller and
//! method, then construct the controller and call the method. The
//! dispatcher returns `Result<CommandResult, DispatchError>`: the outer
//! error covers parsing and resolution, the inner result is whatever the
//! method returned.

mod rewrite;

use std::ffi::OsString;

use clap::{ArgMatches, Command};
use tracing::debug;

use crate::controller::ControllerClass;
use crate::error::{DispatchError, RegistrationError};
use crate::registry::{ControllerRegistry, DEBUG_ARG};
use crate::value::{CommandResult, Namespace};

/// Method run when no sub-command is given and none is configured.
pub const DEFAULT_METHOD: &str = "run";

/// Controller and method used when the command line names neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultTarget {
    controller: String,
    method: String,
}

impl DefaultTarget {
    /// Targets `method` on `controller`.
    #[must_use]
    pub fn new(controller: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            method: method.into(),
        }
    }

    /// Targets the `run` method on `controller`.
    #[must_use]
    pub fn controller(controller: impl Into<String>) -> Self {
        Self::new(controller, DEFAULT_METHOD)
    }

    /// Plugin name of the default controller.
    #[must_use]
    pub fn controller_name(&self) -> &str {
        &self.controller
    }

    /// Method name invoked on the default controller.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Everything known about an invocation once it has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    raw: Vec<OsString>,
    rewritten: Vec<OsString>,
    namespace: Namespace,
}

impl InvocationContext {
    /// Arguments as received.
    #[must_use]
    pub fn raw(&self) -> &[OsString] {
        &self.raw
    }

    /// Arguments after shortcut expansion.
    #[must_use]
    pub fn rewritten(&self) -> &[OsString] {
        &self.rewritten
    }

    /// Parsed namespace.
    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

/// Owns the registered controllers and routes invocations to them.
#[derive(Debug)]
pub struct Dispatcher {
    program: String,
    about: Option<String>,
    registry: ControllerRegistry,
    default_target: Option<DefaultTarget>,
}

impl Dispatcher {
    /// Creates a dispatcher for the program named `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            about: None,
            registry: ControllerRegistry::new(),
            default_target: None,
        }
    }

    /// Sets the description shown at the top of the help output.
    #[must_use]
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Sets the target used when no controller is named.
    #[must_use]
    pub fn with_default_target(mut self, target: Option<DefaultTarget>) -> Self {
        self.default_target = target;
        self
    }

    /// Registers a controller.
    ///
    /// # Errors
    ///
    /// Propagates the [`RegistrationError`] raised while validating the
    /// controller; the dispatcher is left unchanged in that case.
    pub fn register(&mut self, class: ControllerClass) -> Result<&mut Self, RegistrationError> {
        self.registry.register(class)?;
        Ok(self)
    }

    /// Registers several controllers in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RegistrationError`].
    pub fn register_all<I>(&mut self, classes: I) -> Result<&mut Self, RegistrationError>
    where
        I: IntoIterator<Item = ControllerClass>,
    {
        for class in classes {
            self.registry.register(class)?;
        }
        Ok(self)
    }

    /// Program name used in help and usage output.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Registered controllers and aliases.
    #[must_use]
    pub const fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    /// Configured default target.
    #[must_use]
    pub const fn default_target(&self) -> Option<&DefaultTarget> {
        self.default_target.as_ref()
    }

    /// The complete parser for the registered controllers.
    #[must_use]
    pub fn command(&self) -> Command {
        self.registry.command(&self.program, self.about.as_deref())
    }

    /// Expands alias and default-controller shortcuts in `args`.
    ///
    /// The first element is the program name. An empty list is treated as
    /// a bare invocation.
    #[must_use]
    pub fn rewrite(&self, args: &[OsString]) -> Vec<OsString> {
        rewrite::rewrite(
            &self.program,
            args,
            self.registry.aliases(),
            self.default_target.as_ref(),
        )
    }

    /// Parses `args` (program name first) without invoking anything.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Usage`] for parse failures and help
    /// requests, and resolution errors when the parsed plugin or method is
    /// not dispatchable.
    pub fn parse<I, T>(&self, args: I) -> Result<InvocationContext, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let raw: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let rewritten = self.rewrite(&raw);
        let matches = self.command().try_get_matches_from(&rewritten)?;
        let namespace = self.namespace(&matches)?;
        Ok(InvocationContext {
            raw,
            rewritten,
            namespace,
        })
    }

    /// Parses `args` and runs the selected method.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when parsing or resolution fails. Errors
    /// raised by the method itself are returned inside the `Ok` value.
    pub fn dispatch<I, T>(&self, args: I) -> Result<CommandResult, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let context = self.parse(args)?;
        debug!(
            raw = ?context.raw,
            rewritten = ?context.rewritten,
            plugin = context.namespace.plugin(),
            method = context.namespace.method(),
            debug = context.namespace.debug(),
            "dispatching command"
        );
        self.invoke(&context.namespace)
    }

    /// Runs the method selected by an already parsed namespace.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownController`],
    /// [`DispatchError::UnknownMethod`] or
    /// [`DispatchError::MethodNotCliEnabled`] when the namespace does not
    /// select a dispatchable method.
    pub fn invoke(&self, namespace: &Namespace) -> Result<CommandResult, DispatchError> {
        let (plugin, method) = self
            .registry
            .resolve(namespace.plugin(), namespace.method())?;
        let args = method.invocation_args(namespace);
        plugin.class().invoke(method.name(), namespace, args)
    }

    fn namespace(&self, matches: &ArgMatches) -> Result<Namespace, DispatchError> {
        let debug = matches
            .try_get_one::<bool>(DEBUG_ARG)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false);
        let (plugin_name, plugin_matches) =
            matches
                .subcommand()
                .ok_or_else(|| DispatchError::UnknownController {
                    plugin: String::new(),
                })?;
        let (command, method_matches) =
            plugin_matches
                .subcommand()
                .ok_or_else(|| DispatchError::UnknownMethod {
                    plugin: plugin_name.to_owned(),
                    method: String::new(),
                })?;
        let (_, method) = self.registry.resolve(plugin_name, command)?;
        let values = method.read_matches(method_matches);
        Ok(Namespace::new(plugin_name, method.name())
            .with_debug(debug)
            .with_values(values))
    }
}
