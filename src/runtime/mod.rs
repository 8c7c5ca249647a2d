//! Async driver advancing a scheduler on a wall-clock interval.

pub mod tick_driver;

pub use tick_driver::{TickDriver, MIN_TICK};
