//! Configuration models for the machine, the job catalog and the tick driver.

pub mod catalog;
pub mod machine;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;

pub use catalog::{
    CatalogConfig, CatalogEntry, JobEntry, ObjectiveEntry, UsageSource, UsageTemplateEntry,
};
pub use machine::{MachineConfig, ENV_PREFIX};

/// Environment variable naming a JSON simulation file.
pub const CONFIG_PATH_VAR: &str = "CONTENTION_CONFIG_PATH";

/// Wall-clock pacing of the tick driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Interval between ticks in milliseconds.
    pub tick_millis: u64,
    /// Simulated seconds per real second.
    pub time_scale: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_millis: 100,
            time_scale: 1.0,
        }
    }
}

impl DriverConfig {
    /// Validate driver pacing.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_millis == 0 {
            return Err("tick_millis must be greater than 0".into());
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(format!(
                "time_scale must be finite and greater than 0, got {}",
                self.time_scale
            ));
        }
        Ok(())
    }
}

/// Root simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Machine hardware.
    #[serde(default)]
    pub machine: MachineConfig,
    /// Entities to define, in order.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Tick pacing.
    #[serde(default)]
    pub driver: DriverConfig,
}

impl SimulationConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.machine
            .validate()
            .map_err(|e| format!("machine invalid: {e}"))?;
        self.catalog
            .validate()
            .map_err(|e| format!("catalog invalid: {e}"))?;
        self.driver
            .validate()
            .map_err(|e| format!("driver invalid: {e}"))?;
        Ok(())
    }

    /// Parse simulation configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON simulation file.
    pub fn load_from_path(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read simulation config from {}", path.display()))?;
        Self::from_json_str(&contents)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid simulation config {}", path.display()))
    }

    /// Load from `CONTENTION_CONFIG_PATH` when set, otherwise the boot
    /// sequence on a default machine. `CONTENTION_*` machine overrides are
    /// applied on top in both cases.
    pub fn load_from_env() -> AppResult<Self> {
        machine::load_dotenv()?;
        let mut cfg = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                let path = Path::new(path.trim());
                let cfg = Self::load_from_path(path)?;
                tracing::info!("loaded simulation config from {}", path.display());
                cfg
            }
            _ => Self {
                catalog: CatalogConfig::boot_sequence(),
                ..Self::default()
            },
        };
        cfg.machine = cfg.machine.with_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }
}
