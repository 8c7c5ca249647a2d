//! Unit tests for individual components

mod audit_test;
mod builders_test;
mod config_test;
mod error_test;
mod property_test;
mod registry_test;
mod util_test;
