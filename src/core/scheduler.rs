//! Multi-resource scheduler with FIFO admission control.
//!
//! The scheduler owns the contents of the registry's queued and running
//! lists. Jobs are admitted strictly from the head of the queue while their
//! memory and disk footprints fit; a head that does not fit blocks everything
//! behind it. Each time the running set changes the CPU is re-divided with
//! [`allocate`] and the result is cached until the next change, so every tick
//! advances all running jobs against the same allocation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::allocation::{allocate, Allocation, JobDemand, Throughput};
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::error::RegistryError;
use crate::core::index::Index;
use crate::core::job::JobState;
use crate::core::registry::Registry;

/// Progress view of one running job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningJobSnapshot {
    /// Job index.
    pub job: Index,
    /// Display name.
    pub name: String,
    /// Progress in `[0, 1]`.
    pub progress: f64,
    /// Cached CPU-consumption ratio.
    pub share: f64,
}

/// Machine utilisation after the latest reallocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Aggregate CPU share.
    pub cpu: f64,
    /// Memory footprint of running jobs.
    pub memory: f64,
    /// Memory bus utilisation.
    pub memory_bus: f64,
    /// Disk footprint of running jobs.
    pub disk: f64,
    /// Disk bus utilisation.
    pub disk_bus: f64,
}

/// Serializable view of the scheduler for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    /// Simulated seconds elapsed.
    pub elapsed: f64,
    /// Number of reallocations so far.
    pub allocation_epoch: u64,
    /// Queued jobs in admission order.
    pub queued: Vec<Index>,
    /// Running jobs in admission order.
    pub running: Vec<RunningJobSnapshot>,
    /// Machine utilisation.
    pub usage: UsageSnapshot,
}

/// Admission control and fair-share CPU allocation over a shared registry.
pub struct Scheduler {
    registry: Arc<Registry>,
    allocation: Allocation,
    allocation_epoch: u64,
    elapsed: f64,
    audit: Option<Box<dyn AuditSink>>,
    audit_sequence: u64,
}

impl Scheduler {
    /// Create a scheduler over `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            allocation: Allocation::default(),
            allocation_epoch: 0,
            elapsed: 0.0,
            audit: None,
            audit_sequence: 0,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Registry this scheduler drives.
    pub const fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Append a job to the queue and try to admit from the head.
    ///
    /// Only idle jobs are queued; for any other state the request is ignored
    /// and the current state is returned.
    pub fn queue_job(&mut self, index: Index) -> Result<JobState, RegistryError> {
        let state = self.job_state(index)?;
        if state != JobState::Idle {
            tracing::warn!("job {} not queued: currently {:?}", index, state);
            self.record(Some(index), AuditAction::Ignored, Some(format!("queue while {state:?}")));
            return Ok(state);
        }

        self.registry.queued_list().append(index);
        self.record(Some(index), AuditAction::Queued, None);
        tracing::info!("job {} queued", index);

        self.admit(false);
        self.job_state(index)
    }

    /// Remove a job from the running set or the queue.
    ///
    /// Halting a running job always reallocates. Halting a queued job only
    /// reallocates if its removal lets another job in. Progress is kept.
    pub fn halt_job(&mut self, index: Index) -> Result<JobState, RegistryError> {
        self.registry.job(index)?;

        if self.registry.running_list().remove_value(&index) {
            self.record(Some(index), AuditAction::Halted, Some("running".into()));
            tracing::info!("job {} halted while running", index);
            self.admit(true);
        } else if self.registry.queued_list().remove_value(&index) {
            self.record(Some(index), AuditAction::Halted, Some("queued".into()));
            tracing::info!("job {} halted while queued", index);
            self.admit(false);
        } else {
            tracing::debug!("job {} was neither queued nor running", index);
            self.record(Some(index), AuditAction::Ignored, Some("halt while inactive".into()));
        }

        self.job_state(index)
    }

    /// Advance every running job by `dt` simulated seconds.
    ///
    /// All jobs advance against the allocation cached before the tick. Jobs
    /// reaching full progress finish and leave the running set, and a single
    /// admission pass with reallocation follows the whole tick.
    pub fn update(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.elapsed += dt;

        let registry = Arc::clone(&self.registry);
        let clock = registry.machine().cpu_speed.get();
        let mut any_finished = false;

        for index in registry.running_list().to_vec() {
            let Ok(job) = registry.job(index) else {
                continue;
            };
            let cycles = job.effective_usage().cycles_required;
            let gained = self.allocation.share(index) * dt * clock / cycles;
            if !job.advance(gained) {
                continue;
            }

            any_finished = true;
            job.finish(&registry);
            registry.running_list().remove_value(&index);
            self.record(Some(index), AuditAction::Finished, None);
            tracing::info!("job {} `{}` finished", index, job.name());

            if job.is_repeatable() {
                let completions = job.completions();
                self.record(
                    Some(index),
                    AuditAction::Reset,
                    Some(format!("completions={completions}")),
                );
                tracing::debug!(
                    "job {} reset after {} completions, next run needs {} cycles",
                    index,
                    completions,
                    job.effective_usage().cycles_required
                );
            }
        }

        tracing::trace!("tick dt={} elapsed={}", dt, self.elapsed);

        if any_finished {
            self.admit(true);
        }
    }

    /// Whether the job is in the running set.
    pub fn is_running(&self, index: Index) -> bool {
        self.registry.running_list().contains(&index)
    }

    /// Whether the job is waiting in the queue.
    pub fn is_queued(&self, index: Index) -> bool {
        self.registry.queued_list().contains(&index)
    }

    /// Lifecycle state of the job at `index`.
    pub fn job_state(&self, index: Index) -> Result<JobState, RegistryError> {
        let job = self.registry.job(index)?;
        let state = if self.is_running(index) {
            JobState::Running
        } else if self.is_queued(index) {
            JobState::Queued
        } else if job.is_complete() {
            JobState::Complete
        } else if !job.is_unlocked() {
            JobState::Locked
        } else {
            JobState::Idle
        };
        Ok(state)
    }

    /// Cached CPU-consumption ratio of `index`; 0 when it is not running.
    pub fn allocation(&self, index: Index) -> f64 {
        self.allocation.share(index)
    }

    /// Full cached allocation for the current running set.
    pub const fn current_allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// Number of reallocations performed so far.
    pub const fn allocation_epoch(&self) -> u64 {
        self.allocation_epoch
    }

    /// Simulated seconds accumulated through `update`.
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Serializable view of the current scheduling state.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let machine = self.registry.machine();
        let running = self
            .registry
            .running_list()
            .to_vec()
            .into_iter()
            .filter_map(|index| {
                let job = self.registry.job(index).ok()?;
                Some(RunningJobSnapshot {
                    job: index,
                    name: job.name().to_string(),
                    progress: job.progress().get(),
                    share: self.allocation.share(index),
                })
            })
            .collect();

        SchedulerSnapshot {
            elapsed: self.elapsed,
            allocation_epoch: self.allocation_epoch,
            queued: self.registry.queued_list().to_vec(),
            running,
            usage: UsageSnapshot {
                cpu: machine.cpu_usage.get(),
                memory: machine.memory_usage.get(),
                memory_bus: machine.memory_bus_usage.get(),
                disk: machine.disk_usage.get(),
                disk_bus: machine.disk_bus_usage.get(),
            },
        }
    }

    /// Admit from the head of the queue while footprints fit, then reallocate
    /// if anything was admitted or `force_reallocate` is set.
    fn admit(&mut self, force_reallocate: bool) {
        let registry = Arc::clone(&self.registry);
        let machine = registry.machine();
        let mut memory = machine.memory_capacity.get();
        let mut disk = machine.disk_capacity.get();

        for index in registry.running_list().to_vec() {
            if let Ok(job) = registry.job(index) {
                let usage = job.effective_usage();
                memory -= f64::from(usage.memory_required);
                disk -= f64::from(usage.disk_required);
            }
        }

        let mut admitted = false;
        while let Some(head) = registry.queued_list().first() {
            let Ok(job) = registry.job(head) else {
                registry.queued_list().remove_value(&head);
                continue;
            };
            let usage = job.effective_usage();
            let memory_needed = f64::from(usage.memory_required);
            let disk_needed = f64::from(usage.disk_required);
            if memory_needed > memory || disk_needed > disk {
                tracing::debug!(
                    "job {} waits at queue head: needs memory={} disk={}, free memory={} disk={}",
                    head,
                    memory_needed,
                    disk_needed,
                    memory,
                    disk
                );
                break;
            }

            memory -= memory_needed;
            disk -= disk_needed;
            registry.queued_list().remove_value(&head);
            registry.running_list().append(head);
            admitted = true;
            self.record(Some(head), AuditAction::Admitted, None);
            tracing::info!("job {} `{}` admitted", head, job.name());
        }

        if admitted || force_reallocate {
            self.reallocate();
        }
    }

    /// Recompute the allocation for the running set and refresh telemetry.
    fn reallocate(&mut self) {
        let registry = Arc::clone(&self.registry);
        let machine = registry.machine();

        let mut demands = Vec::new();
        let mut memory_used = 0.0;
        let mut disk_used = 0.0;
        for index in registry.running_list().to_vec() {
            if let Ok(job) = registry.job(index) {
                let usage = job.effective_usage();
                demands.push(JobDemand {
                    job: index,
                    memory_ratio: usage.memory_ratio,
                    disk_ratio: usage.disk_ratio,
                });
                memory_used += f64::from(usage.memory_required);
                disk_used += f64::from(usage.disk_required);
            }
        }

        let throughput = Throughput {
            cpu: machine.cpu_capacity(),
            memory_bus: machine.memory_speed.get(),
            disk_bus: machine.disk_speed.get(),
        };
        self.allocation = allocate(&demands, &throughput);
        self.allocation_epoch += 1;

        machine.cpu_usage.set(self.allocation.cpu_usage());
        machine.memory_usage.set(memory_used);
        machine.memory_bus_usage.set(self.allocation.memory_bus_usage());
        machine.disk_usage.set(disk_used);
        machine.disk_bus_usage.set(self.allocation.disk_bus_usage());

        let passes = format!("{:?}", self.allocation.passes());
        tracing::debug!(
            "reallocated epoch={} jobs={} passes={}",
            self.allocation_epoch,
            demands.len(),
            passes
        );
        self.record(None, AuditAction::Reallocated, Some(passes));
    }

    fn record(&mut self, job: Option<Index>, action: AuditAction, detail: Option<String>) {
        if let Some(sink) = self.audit.as_mut() {
            self.audit_sequence += 1;
            sink.record(build_audit_event(
                self.audit_sequence,
                self.elapsed,
                job,
                action,
                detail,
            ));
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("allocation", &self.allocation)
            .field("allocation_epoch", &self.allocation_epoch)
            .field("elapsed", &self.elapsed)
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}
