//! Command-line runtime for the `fractal` tool.
//!
//! The runtime loads layered configuration, installs logging, registers the
//! shipped controllers with a [`Dispatcher`] and routes one invocation to
//! them. Results are written to the provided stdout, failures and logs to
//! stderr. Tests drive the same path with substituted configuration
//! loaders, services and IO streams.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::rc::Rc;

use fractal_config::Config;
use fractal_dispatch::{CommandError, DefaultTarget, DispatchError, Dispatcher};
use rand::seq::SliceRandom;
use tracing::debug;

mod config;
pub mod containers;
pub mod controllers;
mod errors;
pub mod matrix;
pub mod output;
pub mod prompt;
pub mod session;
pub mod store;
pub mod telemetry;

use config::{prepare_cli_arguments, split_config_arguments, wants_debug};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use containers::DockerCli;
use controllers::Services;
pub(crate) use errors::AppError;
use matrix::HttpHomeserver;
use output::{Presentation, write_outcome};
use prompt::TerminalPrompt;
use store::UserDataStore;

/// Name the dispatcher uses in help and usage output.
pub const PROGRAM: &str = "fractal";

const TAGLINES: [&str; 4] = [
    "Your data, your future.",
    "The Future of the Web.",
    "Above the Cloud and Beyond the Blockchain.",
    "Edge Computing for the People.",
];

type ServicesFactory<'a> = dyn Fn(&Config) -> Result<Services, AppError> + 'a;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
    stdout_is_terminal: bool,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(
        stdout: &'a mut W,
        stderr: &'a mut E,
        stdout_is_terminal: bool,
    ) -> Self {
        Self {
            stdout,
            stderr,
            stdout_is_terminal,
        }
    }

    pub(crate) const fn stdout_is_terminal(&self) -> bool {
        self.stdout_is_terminal
    }
}

struct CliRunner<'a, 'io, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'io, W, E>,
    loader: &'a L,
    services: &'a ServicesFactory<'a>,
}

impl<'a, 'io, W, E, L> CliRunner<'a, 'io, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(
        io: &'a mut IoStreams<'io, W, E>,
        loader: &'a L,
        services: &'a ServicesFactory<'a>,
    ) -> Self {
        Self {
            io,
            loader,
            services,
        }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        match self.execute(&args) {
            Ok(exit_code) => exit_code,
            Err(error) => {
                drop(writeln!(self.io.stderr, "{error}"));
                ExitCode::FAILURE
            }
        }
    }

    fn execute(&mut self, args: &[OsString]) -> Result<ExitCode, AppError> {
        let split = split_config_arguments(args);
        let cli_arguments = prepare_cli_arguments(args, &split);
        let mut config = self.loader.load(&split.config_arguments)?;
        if wants_debug(&cli_arguments) {
            config.log_filter = String::from("debug");
        }
        telemetry::initialise(&config)?;

        let services = Rc::new((self.services)(&config)?);
        let terminal = self.io.stdout_is_terminal();
        let default_target = config
            .default_target()
            .map(|(controller, method)| DefaultTarget::new(controller, method));
        let mut dispatcher = Dispatcher::new(PROGRAM)
            .with_about(about(terminal))
            .with_default_target(default_target);
        dispatcher.register_all(controllers::builtin(&services))?;
        debug!(
            controllers = dispatcher.registry().len(),
            data_dir = %config.data_dir(),
            "controllers registered"
        );

        match dispatcher.dispatch(cli_arguments) {
            Ok(Ok(outcome)) => {
                let presentation = Presentation {
                    format: config.output().resolve(terminal),
                    colour: terminal,
                };
                write_outcome(self.io.stdout, &outcome, presentation)?;
                Ok(ExitCode::SUCCESS)
            }
            Ok(Err(error)) => self.report_command_error(&error),
            Err(DispatchError::Usage(error)) => self.report_usage(&error),
            Err(error) => Err(error.into()),
        }
    }

    fn report_command_error(&mut self, error: &CommandError) -> Result<ExitCode, AppError> {
        let message = error.to_string();
        if !message.is_empty() {
            writeln!(self.io.stderr, "{message}")?;
        }
        Ok(ExitCode::from(error.status()))
    }

    fn report_usage(&mut self, error: &clap::Error) -> Result<ExitCode, AppError> {
        let rendered = error.render();
        let text = if self.io.stdout_is_terminal() {
            rendered.ansi().to_string()
        } else {
            rendered.to_string()
        };
        if error.use_stderr() {
            write!(self.io.stderr, "{text}")?;
        } else {
            write!(self.io.stdout, "{text}")?;
        }
        Ok(u8::try_from(error.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from))
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    stdout_is_terminal: bool,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr, stdout_is_terminal);
    run_with_loader(args, &mut io, &OrthoConfigLoader, &system_services)
}

/// Runs the CLI with a custom configuration loader and service factory.
#[must_use]
pub(crate) fn run_with_loader<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'_, W, E>,
    loader: &'a L,
    services: &'a ServicesFactory<'a>,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader, services).run(args)
}

fn system_services(config: &Config) -> Result<Services, AppError> {
    Ok(Services {
        store: UserDataStore::new(config.data_dir().to_owned()),
        homeserver: Box::new(HttpHomeserver::new()?),
        prompt: Box::new(TerminalPrompt),
        containers: Box::new(DockerCli::default()),
    })
}

/// Help description: the company name and a tagline picked per run.
fn about(colour: bool) -> String {
    let tagline = TAGLINES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default();
    if colour {
        format!("\u{1b}[31mFractal Networks\u{1b}[0m: \u{1b}[32m{tagline}\u{1b}[0m")
    } else {
        format!("Fractal Networks: {tagline}")
    }
}

#[cfg(test)]
mod tests;
