//! Configuration loading helpers for the Fractal CLI.
//!
//! Leading configuration flags are peeled off the argument vector and handed
//! to `ortho_config`; everything from the first other token onwards belongs
//! to the dispatcher.

use std::ffi::{OsStr, OsString};

use fractal_config::{CONFIG_CLI_FLAGS, Config};
use ortho_config::OrthoConfig as _;

use crate::AppError;

const DEBUG_TOGGLES: [&str; 2] = ["-d", "--debug"];

pub(crate) trait ConfigLoader {
    /// Loads configuration for the CLI.
    ///
    /// # Flag Ordering
    ///
    /// Configuration flags (listed in `CONFIG_CLI_FLAGS`) must appear before
    /// the command. Later occurrences are treated as command arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

impl OrthoConfigLoader {
    fn process_config_flag(argument: &OsStr) -> FlagAction {
        let argument_text = argument.to_string_lossy();
        if !argument_text.starts_with("--") {
            return FlagAction::Skip;
        }
        let (flag, has_inline_value) = argument_text
            .split_once('=')
            .map_or((argument_text.as_ref(), false), |(flag, _)| (flag, true));
        if CONFIG_CLI_FLAGS.contains(&flag) {
            FlagAction::Include {
                needs_value: !has_inline_value,
            }
        } else {
            FlagAction::Skip
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut command_start = 1_usize;
    let mut awaiting_value = false;
    for argument in rest {
        if awaiting_value {
            awaiting_value = false;
        } else {
            match OrthoConfigLoader::process_config_flag(argument) {
                FlagAction::Include { needs_value } => awaiting_value = needs_value,
                FlagAction::Skip => break,
            }
        }
        config_arguments.push(argument.clone());
        command_start += 1;
    }

    ConfigArgumentSplit {
        config_arguments,
        command_start,
    }
}

/// Returns the program name followed by the command tokens.
pub(crate) fn prepare_cli_arguments(
    args: &[OsString],
    split: &ConfigArgumentSplit,
) -> Vec<OsString> {
    let command = args.get(split.command_start..).unwrap_or_default();
    args.first().into_iter().chain(command).cloned().collect()
}

/// Whether the root toggles in front of the command ask for debug logs.
///
/// The dispatcher accepts `-d/--debug` only in that position.
pub(crate) fn wants_debug(cli_arguments: &[OsString]) -> bool {
    cli_arguments
        .iter()
        .skip(1)
        .map_while(|argument| argument.to_str())
        .take_while(|argument| DEBUG_TOGGLES.contains(argument))
        .next()
        .is_some()
}
