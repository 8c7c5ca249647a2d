//! Registry keys and the built-in index layout.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer key identifying a property, job, objective, usage template or
/// resource inside a [`Registry`](crate::core::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index(pub i32);

impl Index {
    /// Sentinel for cells that are not bound to a registry slot.
    pub const UNBOUND: Self = Self(-1);

    /// Whether this index refers to a real registry slot.
    #[must_use]
    pub const fn is_bound(self) -> bool {
        self.0 != Self::UNBOUND.0
    }

    /// Index `offset` slots after this one.
    #[must_use]
    pub const fn offset(self, offset: i32) -> Self {
        Self(self.0 + offset)
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::UNBOUND
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Index {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Kinds of registry entries, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Observable property.
    Property,
    /// Resource usage template.
    UsageTemplate,
    /// Named resource quantity.
    Resource,
    /// Job.
    Job,
    /// Objective.
    Objective,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Property => "property",
            Self::UsageTemplate => "resource usage template",
            Self::Resource => "resource",
            Self::Job => "job",
            Self::Objective => "objective",
        };
        f.write_str(label)
    }
}

/// Fixed index layout shared by the registry, catalogs and collaborators.
pub mod builtin {
    use super::Index;

    const PROPERTIES: i32 = 1000;
    const USAGE_TEMPLATES: i32 = 2000;
    const RESOURCES: i32 = 3000;
    const JOBS: i32 = 4000;
    const OBJECTIVES: i32 = 5000;
    const RUNTIME: i32 = 6000;
    const USER_DEFINED: i32 = 7000;

    /// CPU clock speed (cycles per second per core), `f64`.
    pub const CPU_SPEED: Index = Index(PROPERTIES);
    /// Number of CPU cores, `u32`.
    pub const CPU_CORES: Index = Index(PROPERTIES + 1);
    /// Disk bus speed, `f64`.
    pub const DISK_SPEED: Index = Index(PROPERTIES + 3);
    /// Disk capacity, `f64`.
    pub const DISK_CAPACITY: Index = Index(PROPERTIES + 4);
    /// Memory bus speed, `f64`.
    pub const MEMORY_SPEED: Index = Index(PROPERTIES + 5);
    /// Memory capacity, `f64`.
    pub const MEMORY_CAPACITY: Index = Index(PROPERTIES + 6);

    /// Usage template slot of [`ResourceUsageSpec::default_process`](crate::core::ResourceUsageSpec::default_process).
    pub const DEFAULT_USAGE_TEMPLATE: Index = Index(USAGE_TEMPLATES);

    /// First slot reserved for resources.
    pub const FIRST_RESOURCE: Index = Index(RESOURCES);

    /// Boot sequence job: run a diagnostic.
    pub const RUN_DIAGNOSTIC: Index = Index(JOBS);
    /// Boot sequence job: reset hardware defaults.
    pub const RESET_HARDWARE_DEFAULTS: Index = Index(JOBS + 1);
    /// Boot sequence job: repair the boot sector.
    pub const REPAIR_BOOT_SECTOR: Index = Index(JOBS + 2);

    /// Boot sequence objective: every boot job has finished.
    pub const FULLY_BOOTED: Index = Index(OBJECTIVES);

    /// Aggregate CPU share in use, `f64`.
    pub const CPU_USAGE: Index = Index(RUNTIME);
    /// Memory footprint of running jobs, `f64`.
    pub const MEMORY_USAGE: Index = Index(RUNTIME + 1);
    /// Memory bus utilisation, `f64`.
    pub const MEMORY_BUS_USAGE: Index = Index(RUNTIME + 2);
    /// Disk footprint of running jobs, `f64`.
    pub const DISK_USAGE: Index = Index(RUNTIME + 3);
    /// Disk bus utilisation, `f64`.
    pub const DISK_BUS_USAGE: Index = Index(RUNTIME + 4);

    /// First index handed out by the registry's auto-allocating `add_*` calls.
    pub const FIRST_USER_DEFINED: Index = Index(USER_DEFINED);
}
