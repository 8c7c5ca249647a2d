//! Jobs: schedulable units of simulated work.
//!
//! A job's `complete` cell is derived from its `progress` cell and its
//! `unlocked` cell is derived from the `complete` cells of the objectives it
//! requires. Both derivations are plain subscriptions, wired once at
//! construction, so they hold after every mutation without any polling.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::index::Index;
use crate::core::property::Observable;
use crate::core::registry::Registry;
use crate::core::usage::{RepeatScaling, ResourceUsageSpec};

/// Callback run when a job's progress reaches 1.0.
pub type FinishCallback = Arc<dyn Fn(&Job, &Registry) + Send + Sync>;

/// Lifecycle position of a job as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Some required objective is incomplete.
    Locked,
    /// Unlocked and neither queued nor running.
    Idle,
    /// Waiting in the admission queue.
    Queued,
    /// Admitted and accruing progress.
    Running,
    /// Finished; terminal for standard jobs.
    Complete,
}

/// Cost growth policy for repeatable jobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepeatPolicy {
    /// Exponent applied to the scaling basis.
    pub exponent: f64,
    /// Which completion count is the basis.
    #[serde(default)]
    pub scaling: RepeatScaling,
}

impl RepeatPolicy {
    /// Policy with the default scaling basis.
    #[must_use]
    pub fn new(exponent: f64) -> Self {
        Self {
            exponent,
            scaling: RepeatScaling::default(),
        }
    }
}

/// Variant data distinguishing standard from repeatable jobs.
#[derive(Debug, Clone)]
pub enum JobKind {
    /// Runs once; complete is terminal.
    Standard,
    /// Resets after each completion, growing more expensive every time.
    Repeatable {
        /// Exponent applied to the scaling basis.
        exponent: f64,
        /// Which completion count is the basis.
        scaling: RepeatScaling,
        /// Finished runs so far.
        completions: Observable<u32>,
    },
}

/// Everything needed to define a job in the registry.
#[derive(Clone)]
pub struct JobDefinition {
    /// Display name.
    pub name: String,
    /// Base resource usage.
    pub usage: ResourceUsageSpec,
    /// Objectives that must all be complete before the job unlocks.
    pub required_objectives: Vec<Index>,
    /// Present for repeatable jobs.
    pub repeat: Option<RepeatPolicy>,
    /// Run each time the job finishes.
    pub on_finish: Option<FinishCallback>,
}

impl JobDefinition {
    /// Standard job with no requirements.
    pub fn new(name: impl Into<String>, usage: ResourceUsageSpec) -> Self {
        Self {
            name: name.into(),
            usage,
            required_objectives: Vec::new(),
            repeat: None,
            on_finish: None,
        }
    }

    /// Require `objective` to be complete before the job unlocks.
    #[must_use]
    pub fn requires(mut self, objective: Index) -> Self {
        self.required_objectives.push(objective);
        self
    }

    /// Require every objective in `objectives`.
    #[must_use]
    pub fn with_required_objectives(mut self, objectives: impl IntoIterator<Item = Index>) -> Self {
        self.required_objectives.extend(objectives);
        self
    }

    /// Make the job repeatable with the default scaling basis.
    #[must_use]
    pub fn with_repeat(self, exponent: f64) -> Self {
        self.with_repeat_policy(RepeatPolicy::new(exponent))
    }

    /// Make the job repeatable.
    #[must_use]
    pub fn with_repeat_policy(mut self, policy: RepeatPolicy) -> Self {
        self.repeat = Some(policy);
        self
    }

    /// Run `callback` every time the job finishes.
    #[must_use]
    pub fn with_on_finish<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Job, &Registry) + Send + Sync + 'static,
    {
        self.on_finish = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("required_objectives", &self.required_objectives)
            .field("repeat", &self.repeat)
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// A schedulable unit of work owned by the registry.
pub struct Job {
    index: Index,
    name: String,
    usage: ResourceUsageSpec,
    kind: JobKind,
    progress: Observable<f64>,
    complete: Observable<bool>,
    unlocked: Observable<bool>,
    on_finish: Option<FinishCallback>,
}

impl Job {
    /// Wire up a job. `required` are the `complete` cells of its required objectives.
    pub(crate) fn new(index: Index, definition: JobDefinition, required: Vec<Observable<bool>>) -> Self {
        let JobDefinition {
            name,
            usage,
            repeat,
            on_finish,
            ..
        } = definition;

        let progress = Observable::named(index, format!("{name} progress"), 0.0_f64);
        let complete = Observable::named(index, format!("{name} complete"), false);
        let unlocked = Observable::named(index, format!("{name} unlocked"), required.is_empty());

        let complete_cell = complete.clone();
        progress.subscribe(move |value: &f64| {
            complete_cell.set(*value >= 1.0);
        });

        let gates = Arc::new(required);
        for gate in gates.iter() {
            let gates = Arc::clone(&gates);
            let unlocked_cell = unlocked.clone();
            gate.subscribe(move |_: &bool| {
                unlocked_cell.set(gates.iter().all(Observable::get));
            });
        }

        let kind = match repeat {
            Some(policy) => JobKind::Repeatable {
                exponent: policy.exponent,
                scaling: policy.scaling,
                completions: Observable::named(index, format!("{name} completions"), 0_u32),
            },
            None => JobKind::Standard,
        };

        Self {
            index,
            name,
            usage,
            kind,
            progress,
            complete,
            unlocked,
            on_finish,
        }
    }

    /// Registry index.
    pub const fn index(&self) -> Index {
        self.index
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Standard or repeatable variant data.
    pub const fn kind(&self) -> &JobKind {
        &self.kind
    }

    /// Whether the job resets after completing.
    pub const fn is_repeatable(&self) -> bool {
        matches!(self.kind, JobKind::Repeatable { .. })
    }

    /// Progress cell, in `[0, 1]`.
    pub const fn progress(&self) -> &Observable<f64> {
        &self.progress
    }

    /// Completion cell, always equal to `progress >= 1.0`.
    pub const fn complete(&self) -> &Observable<bool> {
        &self.complete
    }

    /// Unlock cell, the AND of the required objectives' completion.
    pub const fn unlocked(&self) -> &Observable<bool> {
        &self.unlocked
    }

    /// Current completion.
    pub fn is_complete(&self) -> bool {
        self.complete.get()
    }

    /// Current unlock state.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.get()
    }

    /// Completions cell for repeatable jobs.
    pub const fn completions_cell(&self) -> Option<&Observable<u32>> {
        match &self.kind {
            JobKind::Repeatable { completions, .. } => Some(completions),
            JobKind::Standard => None,
        }
    }

    /// Finished runs so far; always 0 for standard jobs.
    pub fn completions(&self) -> u32 {
        self.completions_cell().map_or(0, Observable::get)
    }

    /// Usage as defined, before any repeat scaling.
    pub const fn base_usage(&self) -> &ResourceUsageSpec {
        &self.usage
    }

    /// Usage for the current run, with repeat scaling applied.
    pub fn effective_usage(&self) -> ResourceUsageSpec {
        match &self.kind {
            JobKind::Standard => self.usage,
            JobKind::Repeatable {
                exponent,
                scaling,
                completions,
            } => self
                .usage
                .scaled_cycles(scaling.factor(completions.get(), *exponent)),
        }
    }

    /// Add `amount` to progress, clamped to 1.0. Returns whether the job is now complete.
    pub(crate) fn advance(&self, amount: f64) -> bool {
        self.progress.update(|current| (current + amount).min(1.0));
        self.is_complete()
    }

    /// Run the finish callback and, for repeatable jobs, start the next epoch.
    pub(crate) fn finish(&self, registry: &Registry) {
        if let Some(callback) = &self.on_finish {
            callback(self, registry);
        }
        if let JobKind::Repeatable { completions, .. } = &self.kind {
            self.progress.set(0.0);
            completions.update(|count| count.saturating_add(1));
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("kind", &self.kind)
            .field("progress", &self.progress.get())
            .field("complete", &self.complete.get())
            .field("unlocked", &self.unlocked.get())
            .finish_non_exhaustive()
    }
}
