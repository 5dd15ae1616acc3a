//! Content-type source generation for `ponzu generate`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ponzu_content::{ContentType, FieldSpec};
use tracing::{info, warn};

use crate::CONTENT_DIR;
use crate::error::GenerateError;
use crate::identifier::{check_module_name, check_type_name, to_snake_case};

/// A content type described on the command line.
///
/// The first argument names the type; each following argument declares a
/// field as `name:kind` or `name:kind:view`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    content_type: ContentType,
    module: String,
}

impl TypeSpec {
    /// Parses `generate` arguments.
    ///
    /// # Errors
    ///
    /// Fails when the type name is unusable, a field is malformed or a field
    /// name repeats.
    pub fn parse<S: AsRef<str>>(name: &str, fields: &[S]) -> Result<Self, GenerateError> {
        let invalid_type = |reason| GenerateError::InvalidTypeName {
            name: name.to_owned(),
            reason,
        };
        check_type_name(name).map_err(invalid_type)?;
        let module = to_snake_case(name);
        check_module_name(&module).map_err(invalid_type)?;

        let mut content_type = ContentType::new(name);
        let mut seen: Vec<String> = Vec::new();
        for argument in fields {
            let field = parse_field(argument.as_ref())?;
            if seen.iter().any(|name| name.eq_ignore_ascii_case(field.name())) {
                return Err(GenerateError::DuplicateField {
                    name: field.name().to_owned(),
                });
            }
            seen.push(field.name().to_owned());
            content_type = content_type.with_field(field);
        }
        Ok(Self {
            content_type,
            module,
        })
    }

    /// The described content type.
    #[must_use]
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Module name of the generated plugin file.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Renders the plugin source.
    #[must_use]
    pub fn render(&self) -> String {
        let imports = if self.content_type.fields().is_empty() {
            "ContentRegistry, ContentType, RegistryError"
        } else {
            "ContentRegistry, ContentType, FieldSpec, RegistryError"
        };
        let mut source = format!("use ponzu_content::{{{imports}}};\n\n");
        let name = self.content_type.name();
        source.push_str(&format!("/// Registers the `{name}` content type.\n"));
        source.push_str(
            "pub fn register(registry: &mut ContentRegistry) -> Result<(), RegistryError> {\n",
        );
        source.push_str(&format!("    registry.register(\n        ContentType::new({name:?})"));
        for field in self.content_type.fields() {
            source.push_str(&format!(
                "\n            .with_field(FieldSpec::new({:?}, {:?})",
                field.name(),
                field.kind()
            ));
            if let Some(view) = field.view() {
                source.push_str(&format!(".with_view({view:?})"));
            }
            source.push(')');
        }
        source.push_str(",\n    )\n}\n");
        source
    }
}

fn parse_field(argument: &str) -> Result<FieldSpec, GenerateError> {
    let malformed = |reason| GenerateError::MalformedField {
        argument: argument.to_owned(),
        reason,
    };
    let parts: Vec<&str> = argument.split(':').collect();
    let (name, kind, view) = match parts.as_slice() {
        [name, kind] => (*name, *kind, None),
        [name, kind, view] => (*name, *kind, Some(*view)),
        _ => return Err(malformed("expected name:kind or name:kind:view")),
    };
    check_type_name(name).map_err(malformed)?;
    if !is_token(kind) {
        return Err(malformed("field kind must be a non-empty token"));
    }
    let field = FieldSpec::new(name, kind);
    match view {
        None => Ok(field),
        Some(view) if is_token(view) => Ok(field.with_view(view)),
        Some(_) => Err(malformed("field view must be a non-empty token")),
    }
}

fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| !ch.is_whitespace() && !ch.is_control() && ch != '"' && ch != '\\')
}

/// Writes `content/<module>.rs` for `spec` inside the project at `root`.
///
/// # Errors
///
/// Fails when `root` has no `content/` directory, when the plugin file
/// already exists, or when writing fails.
pub fn generate(root: &Utf8Path, spec: &TypeSpec) -> Result<Utf8PathBuf, GenerateError> {
    let content_dir = root.join(CONTENT_DIR);
    if !content_dir.is_dir() {
        return Err(GenerateError::NotAProject {
            root: root.to_path_buf(),
        });
    }
    let path = content_dir.join(format!("{}.rs", spec.module()));
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(GenerateError::AlreadyExists { path });
        }
        Err(err) => return Err(write_error(path, err)),
    };
    if let Err(err) = file.write_all(spec.render().as_bytes()) {
        drop(file);
        // A half-written plugin would break the next build.
        if let Err(cleanup) = fs::remove_file(&path) {
            warn!(
                target: "ponzu_build::generate",
                path = %path,
                error = %cleanup,
                "failed to remove partial plugin file"
            );
        }
        return Err(write_error(path, err));
    }

    info!(
        target: "ponzu_build::generate",
        content_type = spec.content_type().name(),
        path = %path,
        "generated content type"
    );
    Ok(path)
}

fn write_error(path: Utf8PathBuf, source: io::Error) -> GenerateError {
    GenerateError::Io {
        path,
        source: Arc::new(source),
    }
}
