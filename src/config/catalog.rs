//! Declarative catalog of usage templates, jobs and objectives.
//!
//! Entries are processed in order. A job may only require objectives that
//! appear earlier in the catalog, and an objective may only wait on jobs
//! that appear earlier, which keeps the job/objective graph acyclic.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::index::{builtin, Index};
use crate::core::job::RepeatPolicy;
use crate::core::usage::ResourceUsageSpec;

/// Where a job's usage profile comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageSource {
    /// Profile given inline.
    Inline(ResourceUsageSpec),
    /// Profile copied from a usage template.
    Template(Index),
}

impl Default for UsageSource {
    fn default() -> Self {
        Self::Template(builtin::DEFAULT_USAGE_TEMPLATE)
    }
}

/// Usage template entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageTemplateEntry {
    /// Explicit index, or `None` for the next user-defined index.
    #[serde(default)]
    pub index: Option<Index>,
    /// Profile.
    pub usage: ResourceUsageSpec,
}

/// Job entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEntry {
    /// Explicit index, or `None` for the next user-defined index.
    #[serde(default)]
    pub index: Option<Index>,
    /// Display name.
    pub name: String,
    /// Usage profile; defaults to the built-in default template.
    #[serde(default)]
    pub usage: UsageSource,
    /// Objectives gating the job.
    #[serde(default)]
    pub required_objectives: Vec<Index>,
    /// Present for repeatable jobs.
    #[serde(default)]
    pub repeat: Option<RepeatPolicy>,
}

/// Objective entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveEntry {
    /// Explicit index, or `None` for the next user-defined index.
    #[serde(default)]
    pub index: Option<Index>,
    /// Display name.
    pub name: String,
    /// Jobs that must all complete.
    pub jobs: Vec<Index>,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogEntry {
    /// Reusable usage profile.
    UsageTemplate(UsageTemplateEntry),
    /// Schedulable job.
    Job(JobEntry),
    /// Completion gate over jobs.
    Objective(ObjectiveEntry),
}

/// Ordered catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Entries in definition order.
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

fn claim(seen: &mut HashSet<Index>, index: Option<Index>, what: &str) -> Result<(), String> {
    let Some(index) = index else {
        return Ok(());
    };
    if !index.is_bound() {
        return Err(format!("{what} uses the unbound index"));
    }
    if !seen.insert(index) {
        return Err(format!("{what} reuses index {index}"));
    }
    Ok(())
}

impl CatalogConfig {
    /// Empty catalog.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    #[must_use]
    pub fn with_entry(mut self, entry: CatalogEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Three default processes gating the `Fully Booted` objective, at their
    /// built-in indices.
    pub fn boot_sequence() -> Self {
        let steps = [
            (builtin::RUN_DIAGNOSTIC, "Run Diagnostic"),
            (builtin::RESET_HARDWARE_DEFAULTS, "Reset Hardware Defaults"),
            (builtin::REPAIR_BOOT_SECTOR, "Repair Boot Sector"),
        ];
        let mut catalog = Self::new();
        for (index, name) in steps {
            catalog = catalog.with_entry(CatalogEntry::Job(JobEntry {
                index: Some(index),
                name: name.into(),
                usage: UsageSource::default(),
                required_objectives: Vec::new(),
                repeat: None,
            }));
        }
        catalog.with_entry(CatalogEntry::Objective(ObjectiveEntry {
            index: Some(builtin::FULLY_BOOTED),
            name: "Fully Booted".into(),
            jobs: steps.iter().map(|(index, _)| *index).collect(),
        }))
    }

    /// Validate entries and their ordering.
    ///
    /// A reference to an entry defined explicitly later in the catalog is
    /// rejected. References to built-in or auto-allocated indices are
    /// resolved when the registry is built.
    pub fn validate(&self) -> Result<(), String> {
        let mut templates = HashSet::new();
        let mut jobs = HashSet::new();
        let mut objectives = HashSet::new();

        for (position, entry) in self.entries.iter().enumerate() {
            match entry {
                CatalogEntry::UsageTemplate(template) => {
                    let what = format!("usage template #{position}");
                    claim(&mut templates, template.index, &what)?;
                    template
                        .usage
                        .validate()
                        .map_err(|e| format!("{what} invalid: {e}"))?;
                }
                CatalogEntry::Job(job) => {
                    if job.name.trim().is_empty() {
                        return Err(format!("job #{position} has an empty name"));
                    }
                    let what = format!("job `{}`", job.name);
                    claim(&mut jobs, job.index, &what)?;
                    if let UsageSource::Inline(usage) = &job.usage {
                        usage.validate().map_err(|e| format!("{what} invalid: {e}"))?;
                    }
                    if let Some(policy) = &job.repeat {
                        if !policy.exponent.is_finite() {
                            return Err(format!("{what} repeat exponent must be finite"));
                        }
                    }
                    if let Some(late) = job.required_objectives.iter().find(|index| {
                        !objectives.contains(*index) && self.defined_after(position, **index, objective_index)
                    }) {
                        return Err(format!("{what} requires objective {late} before it is defined"));
                    }
                }
                CatalogEntry::Objective(objective) => {
                    if objective.name.trim().is_empty() {
                        return Err(format!("objective #{position} has an empty name"));
                    }
                    let what = format!("objective `{}`", objective.name);
                    claim(&mut objectives, objective.index, &what)?;
                    if let Some(late) = objective.jobs.iter().find(|index| {
                        !jobs.contains(*index) && self.defined_after(position, **index, job_index)
                    }) {
                        return Err(format!("{what} waits on job {late} before it is defined"));
                    }
                }
            }
        }
        Ok(())
    }

    fn defined_after(&self, position: usize, index: Index, kind: fn(&CatalogEntry) -> Option<Index>) -> bool {
        self.entries
            .iter()
            .skip(position + 1)
            .any(|entry| kind(entry) == Some(index))
    }
}

fn job_index(entry: &CatalogEntry) -> Option<Index> {
    match entry {
        CatalogEntry::Job(job) => job.index,
        _ => None,
    }
}

fn objective_index(entry: &CatalogEntry) -> Option<Index> {
    match entry {
        CatalogEntry::Objective(objective) => objective.index,
        _ => None,
    }
}
