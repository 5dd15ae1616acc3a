//! Usage text printed by `help`, bare invocations and unknown commands.

use std::io::{self, Write};

const HEADER: &str = "\
Usage: ponzu [flags] <command> [args]

Flags (must precede the command):
  --port <int>           port for the server to bind its listener (default 8080)
  --https[=<bool>]       enable transport security on the serving process
  --dev[=<bool>]         build against the local framework working copy
  --fork <path|url>      build against a framework fork (implies --dev)
  --gocmd <name>         toolchain used to compile the server (default cargo)
  --store-dir <path>     directory holding the config store and analytics log
  --tls-dir <path>       directory holding cert.pem and key.pem
  --dev-source <path>    local framework working copy used by --dev
  --log-filter <expr>    log filter for the serving process (default info)
  --log-format <fmt>     compact or json log output
  --config-path <path>   configuration file to load
  --help                 print this message

Commands:
";

const NEW: &str = "\
  new <directory>
    Creates a project with an empty content/ directory.

";

const GENERATE: &str = "\
  generate, gen, g <Type> [field:kind[:view] ...]
    Writes content/<type>.rs, which registers the content type and its
    declared fields.

";

const BUILD: &str = "\
  build
    Composes the framework with the plugins under content/ and compiles
    ./ponzu-server.

";

const RUN: &str = "\
  run [services]
    Starts ./ponzu-server and waits for it. Services default to admin,api.
    Exits with the server's exit code.

";

const SERVE: &str = "\
  serve, s [services]
    Serves the comma-separated services (admin, api) in this process.
    Normally invoked by `ponzu run`.

";

const HELP: &str = "\
  help, h [command]
    Prints help for a command.
";

/// Subcommands that have their own help section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Topic {
    New,
    Generate,
    Build,
    Run,
    Serve,
}

impl Topic {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "new" => Some(Self::New),
            "generate" | "gen" | "g" => Some(Self::Generate),
            "build" => Some(Self::Build),
            "run" => Some(Self::Run),
            "serve" | "s" => Some(Self::Serve),
            _ => None,
        }
    }

    fn section(self) -> &'static str {
        match self {
            Self::New => NEW,
            Self::Generate => GENERATE,
            Self::Build => BUILD,
            Self::Run => RUN,
            Self::Serve => SERVE,
        }
    }
}

/// Writes the full usage message.
pub(crate) fn write_usage(out: &mut impl Write) -> io::Result<()> {
    out.write_all(HEADER.as_bytes())?;
    for section in [NEW, GENERATE, BUILD, RUN, SERVE, HELP] {
        out.write_all(section.as_bytes())?;
    }
    out.flush()
}

/// Writes the help section for `topic`, or the full usage when unknown.
pub(crate) fn write_topic(out: &mut impl Write, topic: Option<&str>) -> io::Result<()> {
    match topic.and_then(Topic::parse) {
        Some(topic) => {
            out.write_all(topic.section().as_bytes())?;
            out.flush()
        }
        None => write_usage(out),
    }
}
