//! Machine hardware configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;

/// Prefix of the environment variables read by [`MachineConfig::from_env`].
pub const ENV_PREFIX: &str = "CONTENTION_";

/// Initial values of the built-in machine properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Clock speed in cycles per second per core.
    pub cpu_speed: f64,
    /// Core count.
    pub cpu_cores: u32,
    /// Memory bus speed.
    pub memory_speed: f64,
    /// Memory capacity available to running jobs.
    pub memory_capacity: f64,
    /// Disk bus speed.
    pub disk_speed: f64,
    /// Disk capacity available to running jobs.
    pub disk_capacity: f64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            cpu_speed: 8.0,
            cpu_cores: 1,
            memory_speed: 2.0,
            memory_capacity: 32.0,
            disk_speed: 0.1,
            disk_capacity: 32.0,
        }
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{field} must be finite and non-negative, got {value}"))
    }
}

/// Load `.env` from the working directory; a missing file is not an error.
pub(crate) fn load_dotenv() -> AppResult<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("loaded environment from {}", path.display());
            Ok(())
        }
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("failed to load .env file"),
    }
}

impl MachineConfig {
    /// Set the clock speed.
    #[must_use]
    pub const fn with_cpu_speed(mut self, cpu_speed: f64) -> Self {
        self.cpu_speed = cpu_speed;
        self
    }

    /// Set the core count.
    #[must_use]
    pub const fn with_cpu_cores(mut self, cpu_cores: u32) -> Self {
        self.cpu_cores = cpu_cores;
        self
    }

    /// Set the memory bus speed.
    #[must_use]
    pub const fn with_memory_speed(mut self, memory_speed: f64) -> Self {
        self.memory_speed = memory_speed;
        self
    }

    /// Set the memory capacity.
    #[must_use]
    pub const fn with_memory_capacity(mut self, memory_capacity: f64) -> Self {
        self.memory_capacity = memory_capacity;
        self
    }

    /// Set the disk bus speed.
    #[must_use]
    pub const fn with_disk_speed(mut self, disk_speed: f64) -> Self {
        self.disk_speed = disk_speed;
        self
    }

    /// Set the disk capacity.
    #[must_use]
    pub const fn with_disk_capacity(mut self, disk_capacity: f64) -> Self {
        self.disk_capacity = disk_capacity;
        self
    }

    /// Validate machine configuration values.
    ///
    /// A zero-speed bus is allowed and simply never binds.
    pub fn validate(&self) -> Result<(), String> {
        if !self.cpu_speed.is_finite() || self.cpu_speed <= 0.0 {
            return Err(format!(
                "cpu_speed must be finite and greater than 0, got {}",
                self.cpu_speed
            ));
        }
        if self.cpu_cores == 0 {
            return Err("cpu_cores must be greater than 0".into());
        }
        check_non_negative("memory_speed", self.memory_speed)?;
        check_non_negative("memory_capacity", self.memory_capacity)?;
        check_non_negative("disk_speed", self.disk_speed)?;
        check_non_negative("disk_capacity", self.disk_capacity)?;
        Ok(())
    }

    /// Parse machine configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `CONTENTION_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Recognised variables are `CONTENTION_CPU_SPEED`, `CONTENTION_CPU_CORES`,
    /// `CONTENTION_MEMORY_SPEED`, `CONTENTION_MEMORY_CAPACITY`,
    /// `CONTENTION_DISK_SPEED` and `CONTENTION_DISK_CAPACITY`.
    pub fn from_env() -> AppResult<Self> {
        load_dotenv()?;
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by full variable name.
    ///
    /// Blank values are ignored. The result is validated.
    pub fn with_overrides<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |field: &str| -> Option<(String, String)> {
            let key = format!("{ENV_PREFIX}{}", field.to_ascii_uppercase());
            let raw = lookup(&key)?;
            let raw = raw.trim();
            (!raw.is_empty()).then(|| (key, raw.to_string()))
        };

        for (field, slot) in [
            ("cpu_speed", &mut self.cpu_speed),
            ("memory_speed", &mut self.memory_speed),
            ("memory_capacity", &mut self.memory_capacity),
            ("disk_speed", &mut self.disk_speed),
            ("disk_capacity", &mut self.disk_capacity),
        ] {
            if let Some((key, raw)) = read(field) {
                *slot = raw
                    .parse()
                    .with_context(|| format!("failed to parse {key}={raw}"))?;
            }
        }
        if let Some((key, raw)) = read("cpu_cores") {
            self.cpu_cores = raw
                .parse()
                .with_context(|| format!("failed to parse {key}={raw}"))?;
        }

        self.validate().map_err(anyhow::Error::msg)?;
        Ok(self)
    }
}
