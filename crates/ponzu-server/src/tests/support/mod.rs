//! Test harness utilities for the bootstrap suites.

mod doubles;
mod reporter;
mod world;

pub use doubles::{FailingAnalyticsOpener, ReadOnlyStoreOpener};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
