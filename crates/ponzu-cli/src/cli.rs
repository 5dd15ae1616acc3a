//! CLI argument definitions for the Ponzu tool.

use std::ffi::OsString;

use camino::Utf8PathBuf;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};

/// Command-line interface for the Ponzu tool.
///
/// Help output is written by the runtime itself, so clap's built-in help
/// flag and subcommand are disabled.
#[derive(Parser, Debug)]
#[command(
    name = "ponzu",
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Prints usage and exits.
    #[arg(long, short = 'h')]
    pub(crate) help: bool,
    /// Enables transport security on the serving process.
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub(crate) https: bool,
    /// Builds against the local framework working copy.
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub(crate) dev: bool,
    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

/// Subcommands understood by the Ponzu tool.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Creates a new project directory.
    New {
        /// Directory to create.
        dir: Option<Utf8PathBuf>,
    },
    /// Writes a content-type plugin source file.
    #[command(visible_aliases = ["gen", "g"])]
    Generate {
        /// Type name followed by `field:kind[:view]` specifications.
        #[arg(num_args = 0.., allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Composes and compiles the server program.
    Build,
    /// Runs the built server program and waits for it.
    Run {
        /// Comma-separated services to start.
        services: Option<String>,
    },
    /// Serves the selected services in this process.
    #[command(visible_alias = "s")]
    Serve {
        /// Comma-separated services to start.
        services: Option<String>,
    },
    /// Prints usage for a command.
    #[command(visible_alias = "h")]
    Help {
        /// Command to describe.
        topic: Option<String>,
    },
    #[command(external_subcommand)]
    Unknown(Vec<OsString>),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[rstest]
    #[case(&["ponzu", "build"], false)]
    #[case(&["ponzu", "--https", "build"], true)]
    #[case(&["ponzu", "--https=true", "build"], true)]
    #[case(&["ponzu", "--https=false", "build"], false)]
    #[case(&["ponzu", "--https=0", "build"], false)]
    fn https_accepts_go_style_switches(#[case] args: &[&str], #[case] expected: bool) {
        let cli = parse(args);
        assert_eq!(cli.https, expected);
        assert_eq!(cli.command, Some(CliCommand::Build));
    }

    #[rstest]
    #[case(&["ponzu", "g", "Song", "title:string"])]
    #[case(&["ponzu", "gen", "Song", "title:string"])]
    #[case(&["ponzu", "generate", "Song", "title:string"])]
    fn generate_aliases_collect_arguments(#[case] args: &[&str]) {
        assert_eq!(
            parse(args).command,
            Some(CliCommand::Generate {
                args: vec!["Song".to_owned(), "title:string".to_owned()],
            })
        );
    }

    #[test]
    fn serve_alias_takes_an_optional_list() {
        assert_eq!(
            parse(&["ponzu", "s", "api"]).command,
            Some(CliCommand::Serve {
                services: Some("api".to_owned()),
            })
        );
        assert_eq!(
            parse(&["ponzu", "serve"]).command,
            Some(CliCommand::Serve { services: None })
        );
    }

    #[test]
    fn unknown_commands_are_captured() {
        assert!(matches!(
            parse(&["ponzu", "deploy", "now"]).command,
            Some(CliCommand::Unknown(_))
        ));
    }
}
