//! # Contention
//!
//! Simulation core for a machine whose CPU, memory bus and disk bus are shared
//! by many concurrently running jobs.
//!
//! The crate combines two pieces:
//!
//! - **A reactive registry.** Every quantity in the simulation is an
//!   [`Observable`](core::Observable) cell addressed by an integer
//!   [`Index`](core::Index). Subscribers are replayed the current value on
//!   subscribe and notified synchronously on every change, so derived state
//!   (a job's completion, an objective's completion, a job's unlock gate)
//!   stays consistent without polling.
//! - **A contention scheduler.** Jobs queue in FIFO order, are admitted while
//!   their memory and disk footprints fit, and split the CPU by iterative
//!   max-min fairness across the CPU, memory bus and disk bus.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use contention::config::MachineConfig;
//! use contention::core::{JobDefinition, Registry, ResourceUsageSpec, Scheduler};
//!
//! let mut registry = Registry::new(&MachineConfig::default())?;
//! let job = registry.add_job(JobDefinition::new(
//!     "Run Diagnostic",
//!     ResourceUsageSpec::default_process(),
//! ))?;
//!
//! let mut scheduler = Scheduler::new(Arc::new(registry));
//! scheduler.queue_job(job)?;
//! scheduler.update(7.5);
//! assert!(scheduler.registry().job_complete(job)?);
//! ```
//!
//! Whole scenarios can also be described in JSON and loaded through
//! [`config::SimulationConfig`] and [`builders::build_registry`]. With the
//! `tokio-runtime` feature, [`runtime::TickDriver`] advances a scheduler on a
//! wall-clock interval.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Registry, reactive cells, jobs, objectives and the scheduler.
pub mod core;
/// Configuration models for the machine and the job catalog.
pub mod config;
/// Builders to construct a populated registry from configuration.
pub mod builders;
/// Async tick driver.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
