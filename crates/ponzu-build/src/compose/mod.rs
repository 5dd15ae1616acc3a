//! Source composition: merges plugins and framework crates into one package.
//!
//! Composition happens in two phases. The plan phase resolves the framework
//! source, reads every plugin file and renders the generated files in
//! memory; any failure there leaves the output directory untouched. The
//! write phase then replaces `<root>/.ponzu/build/src` wholesale and writes
//! the manifest next to it.

mod render;

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::STATE_DIR;
use crate::error::CompositionError;
use crate::flags::{BuildFlags, FrameworkSource};
use crate::project::{ContentPlugin, PluginLayout, ProjectTree};

/// Directory under the state directory that holds the composed package.
const BUILD_DIR: &str = "build";

/// A composed package ready for the build executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedTree {
    project_root: Utf8PathBuf,
    dir: Utf8PathBuf,
    source: FrameworkSource,
    plugins: Vec<String>,
}

impl ComposedTree {
    /// Root of the project the package was composed from.
    #[must_use]
    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    /// Directory containing the composed package.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Path of the composed `Cargo.toml`.
    #[must_use]
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.dir.join("Cargo.toml")
    }

    /// Framework source the manifest depends on.
    #[must_use]
    pub fn source(&self) -> &FrameworkSource {
        &self.source
    }

    /// Plugin identifiers registered by the composed package, in order.
    #[must_use]
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }
}

struct PlannedFile {
    relative: Utf8PathBuf,
    contents: Vec<u8>,
}

/// Composes the server package for `project` under `<root>/.ponzu/build`.
///
/// The output depends only on the project sources and `flags`, so repeated
/// compositions of an unchanged project produce identical files.
///
/// # Errors
///
/// Returns a [`CompositionError`] when the framework source is unusable or
/// when plugin sources cannot be read or the package cannot be written. No
/// file is written unless every plugin was read successfully.
pub fn compose(project: &ProjectTree, flags: &BuildFlags) -> Result<ComposedTree, CompositionError> {
    let source = FrameworkSource::resolve(flags, project.root())?;
    let plan = plan(project, &source)?;

    let dir = project.root().join(STATE_DIR).join(BUILD_DIR);
    write_plan(&dir, &plan)?;

    info!(
        target: "ponzu_build::compose",
        dir = %dir,
        source = %source,
        plugins = project.plugins().len(),
        "composed server package"
    );
    Ok(ComposedTree {
        project_root: project.root().to_path_buf(),
        dir,
        source,
        plugins: project
            .plugins()
            .iter()
            .map(|plugin| plugin.identifier().to_owned())
            .collect(),
    })
}

fn plan(project: &ProjectTree, source: &FrameworkSource) -> Result<Vec<PlannedFile>, CompositionError> {
    let mut files = vec![
        PlannedFile {
            relative: Utf8PathBuf::from("Cargo.toml"),
            contents: render::manifest(source)?.into_bytes(),
        },
        PlannedFile {
            relative: Utf8PathBuf::from("src/main.rs"),
            contents: render::main_rs().into_bytes(),
        },
        PlannedFile {
            relative: Utf8PathBuf::from("src/content/mod.rs"),
            contents: render::content_mod_rs(project.plugins()).into_bytes(),
        },
    ];
    for plugin in project.plugins() {
        plan_plugin(plugin, &mut files)?;
    }
    Ok(files)
}

fn plan_plugin(plugin: &ContentPlugin, files: &mut Vec<PlannedFile>) -> Result<(), CompositionError> {
    let target = Utf8Path::new("src/content");
    match plugin.layout() {
        PluginLayout::File => {
            let contents = fs::read(plugin.source())
                .map_err(|err| CompositionError::io(plugin.source(), err))?;
            files.push(PlannedFile {
                relative: target.join(format!("{}.rs", plugin.identifier())),
                contents,
            });
        }
        PluginLayout::Directory => {
            let walker = WalkDir::new(plugin.source()).sort_by_file_name();
            for entry in walker {
                let entry = entry.map_err(|err| {
                    let path = err
                        .path()
                        .map_or_else(|| plugin.source().to_path_buf(), |path| {
                            Utf8PathBuf::from(path.to_string_lossy().into_owned())
                        });
                    CompositionError::io(path, err.into())
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = Utf8Path::from_path(entry.path()).ok_or_else(|| {
                    CompositionError::NonUtf8Path {
                        path: entry.path().to_string_lossy().into_owned(),
                    }
                })?;
                let Ok(nested) = path.strip_prefix(plugin.source()) else {
                    continue;
                };
                let contents = fs::read(path).map_err(|err| CompositionError::io(path, err))?;
                files.push(PlannedFile {
                    relative: target.join(plugin.identifier()).join(nested),
                    contents,
                });
            }
        }
    }
    Ok(())
}

fn write_plan(dir: &Utf8Path, plan: &[PlannedFile]) -> Result<(), CompositionError> {
    let src = dir.join("src");
    if src.exists() {
        fs::remove_dir_all(&src).map_err(|err| CompositionError::io(&src, err))?;
    }
    for file in plan {
        let path = dir.join(&file.relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| CompositionError::io(parent, err))?;
        }
        fs::write(&path, &file.contents).map_err(|err| CompositionError::io(&path, err))?;
    }
    Ok(())
}
