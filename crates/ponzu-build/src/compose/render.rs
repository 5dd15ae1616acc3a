//! Rendering of the generated package files.

use toml::{Table, Value};

use crate::ARTIFACT_NAME;
use crate::error::CompositionError;
use crate::flags::FrameworkSource;
use crate::project::ContentPlugin;

pub(super) const GENERATED_HEADER: &str = "// Generated by `ponzu build`. Do not edit.\n";

/// Package name of the composed server.
pub(super) const PACKAGE_NAME: &str = "ponzu-server-app";

pub(super) fn manifest(source: &FrameworkSource) -> Result<String, CompositionError> {
    let mut package = Table::new();
    package.insert("name".to_owned(), PACKAGE_NAME.into());
    package.insert("version".to_owned(), "0.0.0".into());
    package.insert("edition".to_owned(), "2024".into());
    package.insert("publish".to_owned(), false.into());

    let mut bin = Table::new();
    bin.insert("name".to_owned(), ARTIFACT_NAME.into());
    bin.insert("path".to_owned(), "src/main.rs".into());

    let mut dependencies = Table::new();
    for crate_name in ["ponzu-cli", "ponzu-content"] {
        dependencies.insert(
            crate_name.to_owned(),
            Value::Table(source.dependency(crate_name)),
        );
    }

    let mut document = Table::new();
    document.insert("package".to_owned(), Value::Table(package));
    document.insert("bin".to_owned(), Value::Array(vec![Value::Table(bin)]));
    document.insert("dependencies".to_owned(), Value::Table(dependencies));
    // An empty workspace keeps the package out of any enclosing workspace.
    document.insert("workspace".to_owned(), Value::Table(Table::new()));

    toml::to_string(&document).map_err(CompositionError::Manifest)
}

pub(super) fn main_rs() -> String {
    format!(
        "{GENERATED_HEADER}\
mod content;

fn main() -> std::process::ExitCode {{
    ::ponzu_cli::run_with_content(
        std::env::args_os(),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
        content::register_all,
    )
}}
"
    )
}

pub(super) fn content_mod_rs(plugins: &[ContentPlugin]) -> String {
    let mut source = String::from(GENERATED_HEADER);
    source.push('\n');
    for plugin in plugins {
        source.push_str(&format!("pub mod {};\n", plugin.identifier()));
    }
    if !plugins.is_empty() {
        source.push('\n');
    }
    source.push_str(
        "/// Registers every content type in the project.\n\
pub fn register_all(\n    \
registry: &mut ::ponzu_content::ContentRegistry,\n\
) -> Result<(), ::ponzu_content::RegistryError> {\n",
    );
    for plugin in plugins {
        source.push_str(&format!(
            "    self::{}::register(registry)?;\n",
            plugin.identifier()
        ));
    }
    if plugins.is_empty() {
        source.push_str("    let _ = registry;\n");
    }
    source.push_str("    Ok(())\n}\n");
    source
}
