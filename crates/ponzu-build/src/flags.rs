//! Build flags and framework source selection.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use url::Url;

use crate::error::CompositionError;

const GIT_SCHEMES: &[&str] = &["http", "https", "ssh", "git"];
const REQUIRED_MANIFESTS: &[&str] = &["crates/ponzu-cli/Cargo.toml", "crates/ponzu-content/Cargo.toml"];

/// Developer-mode switches that influence composition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// Build against a local working copy of the framework.
    pub dev: bool,
    /// Build against an alternative framework location; implies `dev`.
    pub fork: Option<String>,
    /// Local working copy used by `dev` when no fork is given.
    pub dev_source: Option<Utf8PathBuf>,
}

/// Where the composed package takes the framework crates from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkSource {
    /// The published crates at an exact version.
    Canonical {
        /// Version the requirement pins to.
        version: String,
    },
    /// A framework workspace on the local filesystem.
    Path(Utf8PathBuf),
    /// A framework repository fetched by the toolchain.
    Git(Url),
}

impl FrameworkSource {
    /// Chooses the framework source for `flags`.
    ///
    /// A fork takes precedence over the plain developer target. Fork values
    /// with a git-capable URL scheme become [`FrameworkSource::Git`]; anything
    /// else is a path resolved against `project_root`.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::UnusableSource`] when a path source does
    /// not exist or does not contain the framework crates.
    pub fn resolve(flags: &BuildFlags, project_root: &Utf8Path) -> Result<Self, CompositionError> {
        if let Some(fork) = flags.fork.as_deref().map(str::trim).filter(|fork| !fork.is_empty()) {
            if let Some(url) = git_url(fork) {
                return Ok(Self::Git(url));
            }
            return checked_path(&project_root.join(fork), fork).map(Self::Path);
        }
        if flags.dev {
            let location = flags.dev_source.clone().unwrap_or_else(default_dev_source);
            let resolved = project_root.join(&location);
            return checked_path(&resolved, location.as_str()).map(Self::Path);
        }
        Ok(Self::Canonical {
            version: env!("CARGO_PKG_VERSION").to_owned(),
        })
    }

    /// Dependency table entry for the framework crate `crate_name`.
    pub(crate) fn dependency(&self, crate_name: &str) -> toml::Table {
        let mut table = toml::Table::new();
        match self {
            Self::Canonical { version } => {
                table.insert("version".to_owned(), format!("={version}").into());
            }
            Self::Path(root) => {
                let path = root.join("crates").join(crate_name);
                table.insert("path".to_owned(), path.into_string().into());
            }
            Self::Git(url) => {
                table.insert("git".to_owned(), url.as_str().into());
            }
        }
        table
    }
}

impl fmt::Display for FrameworkSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical { version } => write!(formatter, "registry ={version}"),
            Self::Path(path) => write!(formatter, "path {path}"),
            Self::Git(url) => write!(formatter, "git {url}"),
        }
    }
}

/// The framework workspace this crate was compiled from.
#[must_use]
pub fn default_dev_source() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn git_url(fork: &str) -> Option<Url> {
    Url::parse(fork)
        .ok()
        .filter(|url| GIT_SCHEMES.contains(&url.scheme()))
}

fn checked_path(path: &Utf8Path, location: &str) -> Result<Utf8PathBuf, CompositionError> {
    let unusable = |reason: String| CompositionError::UnusableSource {
        location: location.to_owned(),
        reason,
    };
    let canonical = path
        .canonicalize_utf8()
        .map_err(|err| unusable(format!("cannot resolve '{path}': {err}")))?;
    for manifest in REQUIRED_MANIFESTS {
        if !canonical.join(manifest).is_file() {
            return Err(unusable(format!("missing '{manifest}'")));
        }
    }
    Ok(canonical)
}
