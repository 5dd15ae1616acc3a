//! Test suites for the server bootstrap.

mod behaviour;
mod support;
