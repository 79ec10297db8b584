//! Shared pieces of the RTO screening workspace: the configuration model,
//! YAML `!include` loading and, behind `test-helpers`, the test utilities.

pub mod config;
pub mod yaml_include;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::{generate_unique_id, write_temp_artifact};
