//! Shared utilities

pub mod paths;
