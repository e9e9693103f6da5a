//! Registry of controllers keyed by plugin name.
//!
//! Registering a controller extracts a descriptor for each CLI-enabled
//! method, claims the method aliases and builds the controller's
//! sub-command tree. All validation happens before anything is stored, so
//! a failed registration leaves the registry unchanged. Registering a name
//! that already exists replaces the previous controller and releases its
//! aliases.

use std::collections::{BTreeMap, BTreeSet};

use clap::{Arg, ArgAction, Command};
use tracing::debug;

use crate::alias::AliasRegistry;
use crate::controller::ControllerClass;
use crate::error::{DispatchError, RegistrationError};
use crate::schema::MethodDescriptor;

/// Identifier of the root debug toggle in parsed matches.
pub const DEBUG_ARG: &str = "root-debug";

/// A registered controller.
#[derive(Debug)]
pub struct PluginDescriptor {
    name: String,
    help: Option<String>,
    methods: Vec<MethodDescriptor>,
    command: Command,
    class: ControllerClass,
}

impl PluginDescriptor {
    /// Plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text listed next to the plugin.
    #[must_use]
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Descriptors of the CLI-enabled methods, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Finds the CLI-enabled method addressed by `token`.
    #[must_use]
    pub fn method(&self, token: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|method| method.answers_to(token))
    }

    /// The plugin's sub-command tree.
    #[must_use]
    pub const fn command(&self) -> &Command {
        &self.command
    }

    /// The controller behind the plugin.
    #[must_use]
    pub const fn class(&self) -> &ControllerClass {
        &self.class
    }

    fn declares(&self, token: &str) -> Option<String> {
        self.class
            .methods()
            .iter()
            .find(|spec| spec.name() == token || spec.name().replace('_', "-") == token)
            .map(|spec| spec.qualified_name())
    }
}

/// Controllers by plugin name, plus the aliases they declare.
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    plugins: BTreeMap<String, PluginDescriptor>,
    aliases: AliasRegistry,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class`, replacing any controller with the same name.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] when the controller has no name, a
    /// method's documentation is invalid, or an alias clashes with another
    /// alias or a controller name.
    pub fn register(&mut self, class: ControllerClass) -> Result<(), RegistrationError> {
        let name = class.name().trim();
        if name.is_empty() {
            return Err(RegistrationError::MissingPluginName {
                controller: class.type_name().to_owned(),
            });
        }

        let methods = class
            .methods()
            .iter()
            .filter(|spec| spec.is_cli_enabled())
            .map(|spec| MethodDescriptor::extract(name, spec))
            .collect::<Result<Vec<_>, _>>()?;
        check_sibling_tokens(name, &methods)?;
        let aliases = self.stage_aliases(name, &methods)?;

        let help = class
            .help()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned);
        let command = plugin_command(name, help.as_deref(), &methods);
        debug!(
            plugin = name,
            methods = methods.len(),
            controller = class.type_name(),
            "registered controller"
        );
        let descriptor = PluginDescriptor {
            name: name.to_owned(),
            help,
            methods,
            command,
            class,
        };
        self.aliases = aliases;
        self.plugins.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    fn stage_aliases(
        &self,
        name: &str,
        methods: &[MethodDescriptor],
    ) -> Result<AliasRegistry, RegistrationError> {
        let mut staged = self.aliases.clone();
        staged.release(name);
        if let Some(entry) = staged.resolve(name) {
            return Err(RegistrationError::DuplicateAlias {
                alias: name.to_owned(),
                owner: entry.owner(),
            });
        }
        for method in methods {
            if let Some(alias) = method
                .aliases()
                .iter()
                .find(|alias| *alias == name || self.plugins.contains_key(alias.as_str()))
            {
                return Err(RegistrationError::DuplicateAlias {
                    alias: alias.clone(),
                    owner: alias.clone(),
                });
            }
            staged.register(method)?;
        }
        Ok(staged)
    }

    /// Looks up a registered controller.
    #[must_use]
    pub fn get(&self, plugin: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(plugin)
    }

    /// Resolves `method` on `plugin`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownController`] or
    /// [`DispatchError::UnknownMethod`] when nothing matches, and
    /// [`DispatchError::MethodNotCliEnabled`] when the method exists but is
    /// not exposed on the command line.
    pub fn resolve(
        &self,
        plugin: &str,
        method: &str,
    ) -> Result<(&PluginDescriptor, &MethodDescriptor), DispatchError> {
        let descriptor = self
            .plugins
            .get(plugin)
            .ok_or_else(|| DispatchError::UnknownController {
                plugin: plugin.to_owned(),
            })?;
        if let Some(found) = descriptor.method(method) {
            return Ok((descriptor, found));
        }
        Err(descriptor.declares(method).map_or_else(
            || DispatchError::UnknownMethod {
                plugin: plugin.to_owned(),
                method: method.to_owned(),
            },
            |qualified| DispatchError::MethodNotCliEnabled { method: qualified },
        ))
    }

    /// Registered controllers, sorted by name.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.values()
    }

    /// The alias table.
    #[must_use]
    pub const fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    /// Number of registered controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no controller is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Builds the complete parser: the debug toggle, one sub-command per
    /// controller and one shortcut entry per aliased method.
    ///
    /// The toggle belongs to the root command only, so `-d` must precede the
    /// command and a method may declare its own `debug` flag.
    #[must_use]
    pub fn command(&self, program: &str, about: Option<&str>) -> Command {
        let root = Command::new(program.to_owned())
            .subcommand_required(true)
            .disable_help_subcommand(true)
            .arg(
                Arg::new(DEBUG_ARG)
                    .short('d')
                    .long("debug")
                    .help("Enable debug logging")
                    .action(ArgAction::SetTrue),
            )
            .subcommands(self.plugins.values().map(|plugin| plugin.command.clone()))
            .subcommands(self.aliases.commands().cloned());
        match about {
            Some(text) => root.about(text.to_owned()),
            None => root,
        }
    }
}

fn check_sibling_tokens(
    plugin: &str,
    methods: &[MethodDescriptor],
) -> Result<(), RegistrationError> {
    let mut seen: BTreeMap<&str, &MethodDescriptor> = BTreeMap::new();
    for method in methods {
        let tokens: BTreeSet<&str> = method.command_tokens();
        for token in tokens {
            if let Some(owner) = seen.insert(token, method) {
                return Err(RegistrationError::DuplicateAlias {
                    alias: token.to_owned(),
                    owner: format!("{plugin}.{}", owner.name()),
                });
            }
        }
    }
    Ok(())
}

fn plugin_command(name: &str, help: Option<&str>, methods: &[MethodDescriptor]) -> Command {
    let command = Command::new(name.to_owned())
        .subcommand_required(true)
        .disable_help_subcommand(true)
        .subcommands(methods.iter().map(MethodDescriptor::command));
    match help {
        Some(text) => command.about(text.to_owned()),
        None => command,
    }
}

#[cfg(test)]
mod tests;
