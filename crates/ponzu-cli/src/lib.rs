//! Command-line runtime for the Ponzu content-server tool.
//!
//! The runtime owns argument parsing, configuration loading and command
//! dispatch. `new` and `generate` work on project sources, `build` composes
//! and compiles the server program, `run` supervises that program as a child
//! process and `serve` bootstraps the services in-process.
//!
//! The composed `ponzu-server` program is this same runtime: its `main`
//! calls [`run_with_content`] with the registration function generated from
//! the project's content plugins. The plain `ponzu` binary calls [`run`],
//! which serves with an empty registry.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use clap::error::ErrorKind;
use ponzu_build::{
    BuildFlags, ProjectTree, TypeSpec, artifact_path, build, compose, generate, scaffold,
};
use ponzu_config::{Config, RunInvocation, ServiceSelection};
use ponzu_content::{ContentRegistry, RegisterFn, RegistryError};

mod cli;
mod config;
mod errors;
mod supervisor;
mod usage;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
pub(crate) use errors::AppError;
pub use supervisor::{ChildExit, SupervisorError, run_artifact, run_artifact_with_env};

const SERVE_USAGE_HINT: &str =
    "To execute 'ponzu serve', you must specify which service to run.\n$ ponzu --help";

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    register: RegisterFn,
    project_root: Option<Utf8PathBuf>,
}

impl<'a, W, E, L> CliRunner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(io: &'a mut IoStreams<'a, W, E>, loader: &'a L, register: RegisterFn) -> Self {
        Self {
            io,
            loader,
            register,
            project_root: None,
        }
    }

    #[cfg(test)]
    fn with_project_root(mut self, root: Utf8PathBuf) -> Self {
        self.project_root = Some(root);
        self
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_arguments(&args);

        let cli = match Cli::try_parse_from(&split.cli_arguments) {
            Ok(cli) => cli,
            Err(error) if error.kind() == ErrorKind::DisplayHelp => {
                let _ = write!(self.io.stdout, "{}", error.render());
                return ExitCode::SUCCESS;
            }
            Err(error) => return self.fail(&AppError::CliUsage(error)),
        };

        if let Some(exit_code) = self.handle_usage(&cli) {
            return exit_code;
        }

        let result = self
            .loader
            .load(&split.config_arguments)
            .and_then(|config| self.execute(&cli, &config));
        match result {
            Ok(exit_code) => exit_code,
            Err(error) => self.fail(&error),
        }
    }

    /// Prints usage for bare, help and unknown invocations.
    fn handle_usage(&mut self, cli: &Cli) -> Option<ExitCode> {
        let written = match (&cli.command, cli.help) {
            (_, true) | (None, false) | (Some(CliCommand::Unknown(_)), _) => {
                usage::write_usage(&mut *self.io.stdout)
            }
            (Some(CliCommand::Help { topic }), _) => {
                usage::write_topic(&mut *self.io.stdout, topic.as_deref())
            }
            (Some(CliCommand::New { dir: None }), _) => {
                usage::write_topic(&mut *self.io.stdout, Some("new"))
            }
            (Some(CliCommand::Generate { args }), _) if args.is_empty() => {
                usage::write_topic(&mut *self.io.stdout, Some("generate"))
            }
            _ => return None,
        };
        Some(match written {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        })
    }

    fn execute(&mut self, cli: &Cli, config: &Config) -> Result<ExitCode, AppError> {
        let Some(command) = &cli.command else {
            return Ok(ExitCode::SUCCESS);
        };
        match command {
            CliCommand::New { dir: Some(dir) } => {
                scaffold(dir)?;
                let _ = writeln!(self.io.stdout, "New ponzu project created at {dir}");
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Generate { args } => {
                let Some((name, fields)) = args.split_first() else {
                    return Ok(ExitCode::SUCCESS);
                };
                let spec = TypeSpec::parse(name, fields)?;
                let path = generate(&self.project_root()?, &spec)?;
                let _ = writeln!(self.io.stdout, "Generated {path}");
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Build => {
                let root = self.project_root()?;
                let flags = BuildFlags {
                    dev: cli.dev,
                    fork: config.fork().map(str::to_owned),
                    dev_source: config.dev_source().map(ToOwned::to_owned),
                };
                let project = ProjectTree::discover(&root)?;
                let tree = compose(&project, &flags)?;
                let artifact = build(&tree, config.toolchain())?;
                let _ = writeln!(self.io.stdout, "Built {}", artifact.path);
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Run { services } => {
                let artifact = artifact_path(&self.project_root()?);
                let invocation = run_invocation(config, cli, services.as_deref());
                let exit =
                    run_artifact_with_env(&artifact, &invocation, config.handoff_environment())?;
                Ok(ExitCode::from(exit.exit_code()))
            }
            CliCommand::Serve { services } => {
                let registry = ContentRegistry::from_register_fn(self.register)?;
                let invocation = run_invocation(config, cli, services.as_deref());
                match ponzu_server::serve(config, &invocation, Arc::new(registry)) {
                    Ok(never) => match never {},
                    Err(error) => Err(error.into()),
                }
            }
            CliCommand::New { dir: None } | CliCommand::Help { .. } | CliCommand::Unknown(_) => {
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    fn project_root(&self) -> Result<Utf8PathBuf, AppError> {
        if let Some(root) = &self.project_root {
            return Ok(root.clone());
        }
        let cwd = std::env::current_dir().map_err(AppError::WorkingDirectory)?;
        Utf8PathBuf::from_path_buf(cwd).map_err(AppError::NonUtf8WorkingDirectory)
    }

    fn fail(&mut self, error: &AppError) -> ExitCode {
        if error.is_serve_usage_error() {
            let _ = writeln!(self.io.stdout, "{SERVE_USAGE_HINT}");
        }
        let _ = writeln!(self.io.stderr, "{error}");
        ExitCode::FAILURE
    }
}

fn run_invocation(config: &Config, cli: &Cli, services: Option<&str>) -> RunInvocation {
    RunInvocation {
        port: config.port(),
        https: cli.https,
        services: services.map(ServiceSelection::new).unwrap_or_default(),
    }
}

fn register_nothing(_: &mut ContentRegistry) -> Result<(), RegistryError> {
    Ok(())
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// `serve` starts with no content types registered.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_content(args, stdout, stderr, register_nothing)
}

/// Runs the CLI with the content types added by `register`.
///
/// This is the entry point of the composed `ponzu-server` program.
#[must_use]
pub fn run_with_content<I, W, E>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    register: RegisterFn,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader, register)
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    register: RegisterFn,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader, register).run(args)
}

#[cfg(test)]
pub(crate) fn run_in_project<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    root: Utf8PathBuf,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader, register_nothing)
        .with_project_root(root)
        .run(args)
}

#[cfg(test)]
mod tests;
