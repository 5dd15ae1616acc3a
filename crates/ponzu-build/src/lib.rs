//! Project scaffolding, content-type generation, source composition and
//! compilation for Ponzu projects.
//!
//! A Ponzu project is a directory with a `content/` folder of plugin
//! sources. [`compose`] merges those plugins with the framework crates into a
//! self-contained Cargo package under `.ponzu/build`, and [`build`] compiles
//! that package into the `ponzu-server` artifact at the project root.

mod compose;
mod error;
mod executor;
mod flags;
mod generate;
mod identifier;
mod project;
mod scaffold;

pub use compose::{ComposedTree, compose};
pub use error::{BuildError, CompositionError, GenerateError, ScaffoldError};
pub use executor::{BuildArtifact, artifact_path, build};
pub use flags::{BuildFlags, FrameworkSource, default_dev_source};
pub use generate::{TypeSpec, generate};
pub use identifier::to_snake_case;
pub use project::{ContentPlugin, PluginLayout, ProjectTree};
pub use scaffold::scaffold;

/// Directory, relative to the project root, holding generated state.
pub const STATE_DIR: &str = ".ponzu";

/// Directory, relative to the project root, holding content-type plugins.
pub const CONTENT_DIR: &str = "content";

/// File name of the compiled server program.
pub const ARTIFACT_NAME: &str = "ponzu-server";

#[cfg(test)]
mod tests;
