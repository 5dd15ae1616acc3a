//! Content-type registry for Ponzu.
//!
//! Each plugin under a project's `content/` directory exposes a `register`
//! function that adds its [`ContentType`] to a [`ContentRegistry`]. The
//! composed server calls every plugin's `register` exactly once, in
//! identifier order, through a single [`RegisterFn`] generated at build time.

mod content_type;
mod error;
mod registry;

pub use content_type::{ContentType, FieldSpec};
pub use error::RegistryError;
pub use registry::{ContentRegistry, RegisterFn};
