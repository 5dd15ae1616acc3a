//! Argument splitting and configuration loading for the CLI.
//!
//! Flags precede the command. Leading flags that carry a value belong to the
//! `ortho_config` loader; the boolean switches (`--https`, `--dev`) and
//! `--help` stay with the command parser because they accept the
//! `--flag=<bool>` spelling. The first token that is neither ends the flag
//! section.

use std::ffi::{OsStr, OsString};

use ponzu_config::Config;

use crate::AppError;

/// Flags recognised by the configuration loader.
///
/// Keep in sync with the fields of [`ponzu_config::Config`].
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--port",
    "--gocmd",
    "--fork",
    "--dev-source",
    "--store-dir",
    "--tls-dir",
    "--log-filter",
    "--log-format",
    "--config-path",
];

/// Boolean switches parsed by the command parser.
const SWITCH_FLAGS: &[&str] = &["--https", "--dev", "--help", "-h"];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the configuration arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_args(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Config { needs_value: bool },
    Switch,
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with('-') {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        return FlagAction::Config {
            needs_value: !inline_value,
        };
    }
    if SWITCH_FLAGS.contains(&flag) {
        return FlagAction::Switch;
    }
    FlagAction::Stop
}

/// Arguments routed to the configuration loader and to the command parser.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) cli_arguments: Vec<OsString>,
}

/// Splits the leading flag section of `args`.
///
/// Both halves keep the program name as their first element. Everything from
/// the first unrecognised token onwards goes to the command parser verbatim.
pub(crate) fn split_arguments(args: &[OsString]) -> ArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ArgumentSplit::default();
    };
    let mut split = ArgumentSplit {
        config_arguments: vec![program.clone()],
        cli_arguments: vec![program.clone()],
    };

    let mut tokens = rest.iter();
    while let Some(argument) = tokens.next() {
        match classify(argument) {
            FlagAction::Config { needs_value } => {
                split.config_arguments.push(argument.clone());
                if needs_value && let Some(value) = tokens.next() {
                    split.config_arguments.push(value.clone());
                }
            }
            FlagAction::Switch => split.cli_arguments.push(argument.clone()),
            FlagAction::Stop => {
                split.cli_arguments.push(argument.clone());
                split.cli_arguments.extend(tokens.cloned());
                break;
            }
        }
    }
    split
}
