//! Reactive registry, job graph and multi-resource scheduler.

pub mod allocation;
pub mod audit;
pub mod error;
pub mod index;
pub mod job;
pub mod list;
pub mod objective;
pub mod property;
pub mod registry;
pub mod scheduler;
pub mod usage;

pub use allocation::{allocate, Allocation, Bottleneck, JobDemand, Throughput, NEGLIGIBLE_RATIO};
pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, ListError, RegistryError};
pub use index::{builtin, EntryKind, Index};
pub use job::{FinishCallback, Job, JobDefinition, JobKind, JobState, RepeatPolicy};
pub use list::{ListCallback, ListChange, ListView, ObservableList};
pub use objective::Objective;
pub use property::{Observable, PropertyCallback, PropertyValue, SubscriptionId};
pub use registry::{MachineProperties, Registry, Resource};
pub use scheduler::{RunningJobSnapshot, Scheduler, SchedulerSnapshot, UsageSnapshot};
pub use usage::{RepeatScaling, ResourceUsageSpec};
