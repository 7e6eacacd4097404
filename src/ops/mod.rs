//! High-level operations.
//!
//! This module contains the integration pass itself and its companion
//! scrubbing pass.

pub mod errors;
pub mod integrate;
pub mod scrub;

pub use errors::IntegrateError;
pub use integrate::{needs_provider, Integrator, GENERATED_GROUP_NAME};
pub use scrub::scrub_dangling_refs;
