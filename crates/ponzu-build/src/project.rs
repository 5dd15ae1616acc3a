//! Discovery of content-type plugins in a project tree.

use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::CONTENT_DIR;
use crate::error::CompositionError;
use crate::identifier::{check_module_name, plugin_identifier};

/// How a plugin is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginLayout {
    /// A single `content/<name>.rs` file.
    File,
    /// A `content/<name>/` directory containing `mod.rs`.
    Directory,
}

/// A content-type plugin found under `content/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPlugin {
    identifier: String,
    source: Utf8PathBuf,
    layout: PluginLayout,
}

impl ContentPlugin {
    /// Module identifier used in the composed package.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// File or directory holding the plugin source.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// On-disk layout of the plugin.
    #[must_use]
    pub fn layout(&self) -> PluginLayout {
        self.layout
    }
}

/// A project root and the plugins discovered beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTree {
    root: Utf8PathBuf,
    plugins: Vec<ContentPlugin>,
}

impl ProjectTree {
    /// Scans `<root>/content` for plugins.
    ///
    /// Every `*.rs` file and every directory with a `mod.rs` is a plugin.
    /// Other entries, and names starting with `.`, are ignored. Plugins are
    /// returned sorted by identifier.
    ///
    /// # Errors
    ///
    /// Fails when `content/` is missing, when a plugin name is not a usable
    /// module identifier, or when two plugins share an identifier.
    pub fn discover(root: impl AsRef<Utf8Path>) -> Result<Self, CompositionError> {
        let root = root.as_ref().to_path_buf();
        let content_dir = root.join(CONTENT_DIR);
        if !content_dir.is_dir() {
            return Err(CompositionError::NotAProject { root });
        }

        let mut found: Vec<ContentPlugin> = Vec::new();
        let entries =
            fs::read_dir(&content_dir).map_err(|err| CompositionError::io(&content_dir, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| CompositionError::io(&content_dir, err))?;
            let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|path| {
                CompositionError::NonUtf8Path {
                    path: path.to_string_lossy().into_owned(),
                }
            })?;
            if let Some(plugin) = classify(path)? {
                found.push(plugin);
            }
        }

        found.sort_by(|left, right| {
            (left.identifier.as_str(), left.source.as_str())
                .cmp(&(right.identifier.as_str(), right.source.as_str()))
        });
        reject_duplicates(&found)?;
        debug!(
            target: "ponzu_build::compose",
            root = %root,
            plugins = found.len(),
            "discovered content plugins"
        );
        Ok(Self {
            root,
            plugins: found,
        })
    }

    /// Project root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Discovered plugins in identifier order.
    #[must_use]
    pub fn plugins(&self) -> &[ContentPlugin] {
        &self.plugins
    }
}

fn classify(path: Utf8PathBuf) -> Result<Option<ContentPlugin>, CompositionError> {
    let Some(name) = path.file_name() else {
        return Ok(None);
    };
    if name.starts_with('.') {
        return Ok(None);
    }

    let (stem, layout) = if path.is_dir() {
        if !path.join("mod.rs").is_file() {
            return Ok(None);
        }
        (name.to_owned(), PluginLayout::Directory)
    } else if path.extension() == Some("rs") {
        let Some(stem) = path.file_stem() else {
            return Ok(None);
        };
        (stem.to_owned(), PluginLayout::File)
    } else {
        return Ok(None);
    };

    let identifier = plugin_identifier(&stem);
    check_module_name(&identifier).map_err(|reason| CompositionError::InvalidPluginName {
        path: path.clone(),
        identifier: identifier.clone(),
        reason,
    })?;
    Ok(Some(ContentPlugin {
        identifier,
        source: path,
        layout,
    }))
}

fn reject_duplicates(sorted: &[ContentPlugin]) -> Result<(), CompositionError> {
    let mut seen: BTreeMap<&str, &Utf8Path> = BTreeMap::new();
    for plugin in sorted {
        if let Some(first) = seen.insert(plugin.identifier(), plugin.source()) {
            return Err(CompositionError::DuplicateContentType {
                identifier: plugin.identifier.clone(),
                first: first.to_path_buf(),
                second: plugin.source.clone(),
            });
        }
    }
    Ok(())
}
