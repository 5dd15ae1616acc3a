//! Registry of content types known to the running server.
//!
//! The [`ContentRegistry`] stores types keyed by their lower-cased name and
//! iterates them in name order. Registering a name twice, in any letter
//! case, is rejected.

use std::collections::BTreeMap;

use crate::content_type::ContentType;
use crate::error::RegistryError;

/// Entry point generated for a composed server: registers every plugin.
pub type RegisterFn = fn(&mut ContentRegistry) -> Result<(), RegistryError>;

/// Registry of content types.
///
/// # Example
///
/// ```
/// use ponzu_content::{ContentRegistry, ContentType};
///
/// let mut registry = ContentRegistry::new();
/// registry
///     .register(ContentType::new("Review"))
///     .expect("registration succeeds");
/// assert!(registry.get("review").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    types: BTreeMap<String, ContentType>,
}

impl ContentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry by running a generated registration function.
    ///
    /// # Errors
    ///
    /// Propagates the first registration failure.
    pub fn from_register_fn(register: RegisterFn) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        register(&mut registry)?;
        Ok(registry)
    }

    /// Registers a content type after validating its name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidName`] when the name is not an
    /// identifier and [`RegistryError::Duplicate`] when the name is taken.
    pub fn register(&mut self, content_type: ContentType) -> Result<(), RegistryError> {
        validate_name(content_type.name())?;
        let key = content_type.name().to_ascii_lowercase();
        if self.types.contains_key(&key) {
            return Err(RegistryError::Duplicate {
                name: content_type.name().to_owned(),
            });
        }
        self.types.insert(key, content_type);
        Ok(())
    }

    /// Looks up a type by name, ignoring letter case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ContentType> {
        self.types.get(&name.to_ascii_lowercase())
    }

    /// Declared names of every registered type, in key order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.types.values().map(ContentType::name).collect()
    }

    /// Iterates registered types in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentType> {
        self.types.values()
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` when no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    let invalid = |reason| RegistryError::InvalidName {
        name: name.to_owned(),
        reason,
    };
    let mut chars = name.chars();
    match chars.next() {
        None => Err(invalid("name is empty")),
        Some(first) if !first.is_ascii_alphabetic() => {
            Err(invalid("name must start with an ASCII letter"))
        }
        Some(_) if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') => Err(invalid(
            "name may only contain ASCII letters, digits and underscores",
        )),
        Some(_) => Ok(()),
    }
}
