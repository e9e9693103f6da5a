//! Method descriptors and the parsers synthesised from them.
//!
//! [`MethodDescriptor::extract`] validates a method's documentation against
//! its parameter list and classifies every parameter into an [`ArgKind`].
//! The descriptor then builds the method's `clap` sub-command, reads parsed
//! matches back into namespace values, and projects a namespace into the
//! ordered argument list the handler receives.

mod docs;

use std::collections::{BTreeMap, BTreeSet};

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::controller::{MethodSpec, Param};
use crate::error::RegistrationError;
use crate::value::{ArgValue, CallArgs, Namespace};

/// How a parameter surfaces on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    /// `--flag` that flips a boolean default.
    Toggle {
        /// Value when the flag is absent.
        default: bool,
    },
    /// Optional `--flag VALUE`.
    OptionalFlag {
        /// Value when the flag is absent.
        default: ArgValue,
    },
    /// Positional that may be omitted in favour of a framework default.
    OptionalPositional {
        /// Value when the positional is absent.
        fallback: ArgValue,
    },
    /// Positional that must be given.
    RequiredPositional,
    /// `--flag [VALUE]` that must be given; the value itself may be omitted.
    RequiredFlag,
}

/// One parameter together with its help text and command-line shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    name: String,
    kind: ArgKind,
    help: String,
}

impl ArgSpec {
    /// Parameter name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command-line shape.
    #[must_use]
    pub const fn kind(&self) -> &ArgKind {
        &self.kind
    }

    /// Description taken from the `Args` section.
    #[must_use]
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Value used when the argument is absent, if it may be absent.
    #[must_use]
    pub fn absent_value(&self) -> Option<ArgValue> {
        match &self.kind {
            ArgKind::Toggle { default } => Some(ArgValue::Bool(*default)),
            ArgKind::OptionalFlag { default } => Some(default.clone()),
            ArgKind::OptionalPositional { fallback } => Some(fallback.clone()),
            ArgKind::RequiredPositional | ArgKind::RequiredFlag => None,
        }
    }

    fn long(&self) -> String {
        dashed(&self.name)
    }

    fn to_arg(&self) -> Arg {
        let base = Arg::new(self.name.clone()).help(self.help.clone());
        match &self.kind {
            ArgKind::Toggle { default } => self.flag(base).action(if *default {
                ArgAction::SetFalse
            } else {
                ArgAction::SetTrue
            }),
            ArgKind::OptionalFlag { default } => self
                .flag(base)
                .value_name(self.name.to_uppercase())
                .action(ArgAction::Set)
                .default_values(default.as_text().map(str::to_owned)),
            ArgKind::OptionalPositional { .. } => base
                .value_name(self.name.to_uppercase())
                .required(false)
                .action(ArgAction::Set),
            ArgKind::RequiredPositional => base
                .value_name(self.name.to_uppercase())
                .required(true)
                .action(ArgAction::Set),
            ArgKind::RequiredFlag => self
                .flag(base)
                .value_name(self.name.to_uppercase())
                .required(true)
                .num_args(0..=1)
                .action(ArgAction::Set),
        }
    }

    fn flag(&self, arg: Arg) -> Arg {
        let long = self.long();
        if long == self.name {
            arg.long(long)
        } else {
            arg.long(long).alias(self.name.clone())
        }
    }

    fn read(&self, matches: &ArgMatches) -> ArgValue {
        if let ArgKind::Toggle { default } = self.kind {
            return matches
                .try_get_one::<bool>(&self.name)
                .ok()
                .flatten()
                .map_or(ArgValue::Bool(default), |flag| ArgValue::Bool(*flag));
        }
        matches
            .try_get_one::<String>(&self.name)
            .ok()
            .flatten()
            .cloned()
            .map_or_else(|| self.absent_value().unwrap_or_default(), ArgValue::Text)
    }
}

/// Everything the dispatcher knows about one CLI-enabled method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: String,
    plugin: String,
    qualified_name: String,
    command_name: String,
    summary: Option<String>,
    is_static: bool,
    aliases: Vec<String>,
    args: Vec<ArgSpec>,
}

impl MethodDescriptor {
    /// Builds the descriptor of `spec` for the controller named `plugin`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] when the documentation is missing,
    /// malformed, or does not describe every parameter.
    pub fn extract(plugin: &str, spec: &MethodSpec) -> Result<Self, RegistrationError> {
        let qualified_name = spec.qualified_name();
        let names: Vec<&str> = spec.params().iter().map(Param::name).collect();
        let parsed = docs::parse(&qualified_name, spec.doc(), &names)?;

        let args = spec
            .params()
            .iter()
            .map(|param| {
                let kind = classify(param.default_value(), spec.fallbacks(), param.name());
                let help = parsed
                    .args
                    .get(param.name())
                    .cloned()
                    .unwrap_or_default();
                ArgSpec {
                    name: param.name().to_owned(),
                    kind,
                    help,
                }
            })
            .collect();

        Ok(Self {
            name: spec.name().to_owned(),
            plugin: plugin.to_owned(),
            qualified_name,
            command_name: dashed(spec.name()),
            summary: parsed.summary,
            is_static: spec.is_static(),
            aliases: spec.aliases().to_vec(),
            args,
        })
    }

    /// Method name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plugin the method belongs to.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Fully qualified name, `<controller type>::<method>`.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Sub-command name: the method name with underscores turned to dashes.
    #[must_use]
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Help text shown for the sub-command.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Whether the method runs without a controller instance.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Top-level shortcut names.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Parameter names in declaration order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(ArgSpec::name)
    }

    /// Values used for parameters the user may omit.
    #[must_use]
    pub fn parameter_defaults(&self) -> BTreeMap<&str, ArgValue> {
        self.args
            .iter()
            .filter_map(|arg| arg.absent_value().map(|value| (arg.name(), value)))
            .collect()
    }

    /// Help text of one parameter.
    #[must_use]
    pub fn arg_help(&self, name: &str) -> Option<&str> {
        self.arg(name).map(ArgSpec::help)
    }

    /// Parameters with neither a declared nor a framework default.
    #[must_use]
    pub fn required_args(&self) -> BTreeSet<&str> {
        self.args
            .iter()
            .filter(|arg| arg.absent_value().is_none())
            .map(ArgSpec::name)
            .collect()
    }

    /// Whether `token` names this method as a sub-command.
    #[must_use]
    pub fn answers_to(&self, token: &str) -> bool {
        token == self.command_name || token == self.name
    }

    fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|arg| arg.name == name)
    }

    /// Names under which the sub-command is reachable inside its plugin.
    pub(crate) fn command_tokens(&self) -> BTreeSet<&str> {
        let mut tokens = BTreeSet::from([self.command_name.as_str(), self.name.as_str()]);
        tokens.extend(self.aliases.iter().map(String::as_str));
        tokens
    }

    /// The method's sub-command under its plugin.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut command = self.with_args(Command::new(self.command_name.clone()));
        if self.name != self.command_name {
            command = command.alias(self.name.clone());
        }
        let visible: Vec<String> = self
            .aliases
            .iter()
            .filter(|alias| !self.answers_to(alias))
            .cloned()
            .collect();
        command.visible_aliases(visible)
    }

    /// The top-level shortcut entry, when the method declares aliases.
    ///
    /// The first alias names the entry; the rest are listed as its aliases.
    #[must_use]
    pub fn alias_command(&self) -> Option<Command> {
        let (primary, rest) = self.aliases.split_first()?;
        Some(
            self.with_args(Command::new(primary.clone()))
                .visible_aliases(rest.to_vec()),
        )
    }

    fn with_args(&self, command: Command) -> Command {
        let described = match &self.summary {
            Some(summary) => command.about(summary.clone()),
            None => command,
        };
        described.args(self.args.iter().map(ArgSpec::to_arg))
    }

    /// Reads the parsed value of every parameter from the method's matches.
    #[must_use]
    pub fn read_matches(&self, matches: &ArgMatches) -> BTreeMap<String, ArgValue> {
        self.args
            .iter()
            .map(|arg| (arg.name.clone(), arg.read(matches)))
            .collect()
    }

    /// Projects a namespace onto the handler's arguments.
    ///
    /// Parameters missing from the namespace take their default, or
    /// [`ArgValue::Unset`] when they have none.
    #[must_use]
    pub fn invocation_args(&self, namespace: &Namespace) -> CallArgs {
        self.args
            .iter()
            .map(|arg| {
                namespace
                    .value(&arg.name)
                    .cloned()
                    .or_else(|| arg.absent_value())
                    .unwrap_or_default()
            })
            .collect()
    }
}

fn classify(
    default: Option<&ArgValue>,
    fallbacks: Option<&BTreeMap<String, ArgValue>>,
    name: &str,
) -> ArgKind {
    match (default, fallbacks) {
        (Some(ArgValue::Bool(flag)), _) => ArgKind::Toggle { default: *flag },
        (Some(value), _) => ArgKind::OptionalFlag {
            default: value.clone(),
        },
        (None, None) => ArgKind::RequiredPositional,
        (None, Some(table)) => table.get(name).map_or(ArgKind::RequiredFlag, |fallback| {
            ArgKind::OptionalPositional {
                fallback: fallback.clone(),
            }
        }),
    }
}

/// Replaces underscores with dashes.
pub(crate) fn dashed(name: &str) -> String {
    name.replace('_', "-")
}
