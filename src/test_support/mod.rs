//! Test utilities and mocks for stevedore unit tests.
//!
//! This module is only available when compiling with `--cfg test` or
//! running tests. It provides stub collaborators for autolinking
//! definitions and project persistence.

pub mod fixtures;

pub use fixtures::{FailingStore, MemoryStore, StubDefinition};
