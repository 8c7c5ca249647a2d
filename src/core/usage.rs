//! Resource usage profiles attached to jobs.

use serde::{Deserialize, Serialize};

use crate::core::error::RegistryError;

/// Declarative resource-cost profile of a job.
///
/// Ratios describe contended draw on a shared bus; the `*_required` fields
/// are exclusive footprints reserved for as long as the job runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsageSpec {
    /// CPU cycles needed to take progress from 0 to 1. Must be > 0.
    pub cycles_required: f64,
    /// Memory bus draw per unit of CPU.
    #[serde(default)]
    pub memory_ratio: f64,
    /// Disk bus draw per unit of CPU.
    #[serde(default)]
    pub disk_ratio: f64,
    /// Memory footprint held while running.
    #[serde(default)]
    pub memory_required: u32,
    /// Disk footprint held while running.
    #[serde(default)]
    pub disk_required: u32,
}

impl ResourceUsageSpec {
    /// Build and validate a spec.
    pub fn new(
        cycles_required: f64,
        memory_ratio: f64,
        disk_ratio: f64,
        memory_required: u32,
        disk_required: u32,
    ) -> Result<Self, RegistryError> {
        let spec = Self {
            cycles_required,
            memory_ratio,
            disk_ratio,
            memory_required,
            disk_required,
        };
        spec.validate().map_err(RegistryError::InvalidUsage)?;
        Ok(spec)
    }

    /// Profile of a small background process.
    #[must_use]
    pub const fn default_process() -> Self {
        Self {
            cycles_required: 60.0,
            memory_ratio: 0.1,
            disk_ratio: 0.0,
            memory_required: 1,
            disk_required: 0,
        }
    }

    /// Profile that only ever contends for CPU.
    #[must_use]
    pub const fn cpu_only(cycles_required: f64) -> Self {
        Self {
            cycles_required,
            memory_ratio: 0.0,
            disk_ratio: 0.0,
            memory_required: 0,
            disk_required: 0,
        }
    }

    /// Validate the profile's contract.
    pub fn validate(&self) -> Result<(), String> {
        if !self.cycles_required.is_finite() || self.cycles_required <= 0.0 {
            return Err(format!(
                "cycles_required must be finite and greater than 0, got {}",
                self.cycles_required
            ));
        }
        if !self.memory_ratio.is_finite() || self.memory_ratio < 0.0 {
            return Err(format!(
                "memory_ratio must be finite and non-negative, got {}",
                self.memory_ratio
            ));
        }
        if !self.disk_ratio.is_finite() || self.disk_ratio < 0.0 {
            return Err(format!(
                "disk_ratio must be finite and non-negative, got {}",
                self.disk_ratio
            ));
        }
        Ok(())
    }

    /// Copy of this profile with `cycles_required` multiplied by `factor`.
    #[must_use]
    pub fn scaled_cycles(&self, factor: f64) -> Self {
        Self {
            cycles_required: self.cycles_required * factor,
            ..*self
        }
    }
}

/// Which completion count drives a repeatable job's cost growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatScaling {
    /// Scale by the completions so far, treating zero as one: the first run
    /// costs the base and, after the n-th completion, runs cost `base × n^exponent`.
    #[default]
    Completed,
    /// Scale by the number of the run about to start (`completions + 1`).
    NextRun,
}

impl RepeatScaling {
    /// Cycle multiplier for a job with `completions` finished runs.
    #[must_use]
    pub fn factor(self, completions: u32, exponent: f64) -> f64 {
        let basis = match self {
            Self::Completed => completions.max(1),
            Self::NextRun => completions.saturating_add(1),
        };
        f64::from(basis).powf(exponent)
    }
}
