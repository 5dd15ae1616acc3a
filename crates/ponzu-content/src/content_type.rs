//! Content-type definitions.

use serde::Serialize;

/// A single declared field of a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    view: Option<String>,
}

impl FieldSpec {
    /// Creates a field with the given name and value kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            view: None,
        }
    }

    /// Sets the editor view used by the admin interface.
    #[must_use]
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value kind, for example `string` or `int`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Editor view, if one was declared.
    #[must_use]
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }
}

/// A named content type and its fields.
///
/// ```
/// use ponzu_content::{ContentType, FieldSpec};
///
/// let review = ContentType::new("Review")
///     .with_field(FieldSpec::new("title", "string"))
///     .with_field(FieldSpec::new("body", "string").with_view("richtext"));
/// assert_eq!(review.fields().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentType {
    name: String,
    fields: Vec<FieldSpec>,
}

impl ContentType {
    /// Creates a content type with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field declaration.
    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Type name as declared by the plugin.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}
