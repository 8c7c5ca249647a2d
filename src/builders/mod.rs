//! Builders to construct a populated registry from configuration.

pub mod registry_builder;

pub use registry_builder::{build_registry, build_registry_with, populate_registry};
