//! Iterative multi-resource max-min fair CPU allocation.
//!
//! Every running job asks for one unit of CPU. Each pass compares how much
//! CPU each still-unresolved job could get from the CPU itself, from the
//! memory bus and from the disk bus. The tightest resource binds: bus-bound
//! jobs are pinned and leave the pass, and once the CPU binds the remaining
//! jobs split what is left equally.
//!
//! Tie-breaks are fixed: the CPU wins a tie with either bus (a bus must be
//! strictly tighter to bind) and the memory bus wins a tie with the disk bus.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::index::Index;

/// Ratios at or below this are treated as zero.
pub const NEGLIGIBLE_RATIO: f64 = 1e-6;

/// Bus draw of one running job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobDemand {
    /// Job index.
    pub job: Index,
    /// Memory bus draw per unit of CPU.
    pub memory_ratio: f64,
    /// Disk bus draw per unit of CPU.
    pub disk_ratio: f64,
}

/// Machine throughput available to the running set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Throughput {
    /// Clock speed times core count.
    pub cpu: f64,
    /// Memory bus speed.
    pub memory_bus: f64,
    /// Disk bus speed.
    pub disk_bus: f64,
}

/// Resource that bound a pass of the allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bottleneck {
    /// Remaining jobs split the remaining CPU.
    Cpu,
    /// Memory-bound jobs were pinned.
    MemoryBus,
    /// Disk-bound jobs were pinned.
    DiskBus,
}

/// Result of one allocation: per-job CPU shares plus derived utilisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    shares: HashMap<Index, f64>,
    passes: Vec<Bottleneck>,
    cpu_usage: f64,
    memory_bus_usage: f64,
    disk_bus_usage: f64,
}

impl Allocation {
    /// CPU-consumption ratio of `job`; 0 for jobs not in the allocation.
    pub fn share(&self, job: Index) -> f64 {
        self.shares.get(&job).copied().unwrap_or(0.0)
    }

    /// All shares keyed by job.
    pub const fn shares(&self) -> &HashMap<Index, f64> {
        &self.shares
    }

    /// Binding resource of each pass, in order.
    pub fn passes(&self) -> &[Bottleneck] {
        &self.passes
    }

    /// Sum of all shares.
    pub const fn cpu_usage(&self) -> f64 {
        self.cpu_usage
    }

    /// Memory bus utilisation in `[0, 1]`.
    pub const fn memory_bus_usage(&self) -> f64 {
        self.memory_bus_usage
    }

    /// Disk bus utilisation in `[0, 1]`.
    pub const fn disk_bus_usage(&self) -> f64 {
        self.disk_bus_usage
    }

    /// Whether no job holds a share.
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

fn bus_fulfillment(speed: f64, demand: f64) -> f64 {
    if speed <= 0.0 || demand <= NEGLIGIBLE_RATIO {
        f64::INFINITY
    } else {
        speed / demand
    }
}

fn binding(cpu: f64, memory: f64, disk: f64) -> Bottleneck {
    if memory < cpu && memory <= disk {
        Bottleneck::MemoryBus
    } else if disk < cpu {
        Bottleneck::DiskBus
    } else {
        Bottleneck::Cpu
    }
}

fn bus_usage(
    shares: &HashMap<Index, f64>,
    demands: &[JobDemand],
    cpu: f64,
    speed: f64,
    ratio: fn(&JobDemand) -> f64,
) -> f64 {
    if speed <= 0.0 {
        return 0.0;
    }
    let drawn: f64 = demands
        .iter()
        .map(|d| shares.get(&d.job).copied().unwrap_or(0.0) * cpu * ratio(d))
        .sum();
    (drawn / speed).clamp(0.0, 1.0)
}

/// Divide the CPU among `demands`.
///
/// An empty demand set yields an empty allocation with zero usage.
#[allow(clippy::cast_precision_loss)]
pub fn allocate(demands: &[JobDemand], throughput: &Throughput) -> Allocation {
    if demands.is_empty() {
        return Allocation::default();
    }

    let total = demands.len() as f64;
    let mut shares = HashMap::with_capacity(demands.len());
    let mut passes = Vec::new();
    let mut available = 1.0_f64;
    let mut unresolved: Vec<&JobDemand> = demands.iter().collect();

    while !unresolved.is_empty() {
        let memory_demand: f64 = unresolved
            .iter()
            .map(|d| d.memory_ratio)
            .filter(|r| *r > NEGLIGIBLE_RATIO)
            .sum();
        let disk_demand: f64 = unresolved
            .iter()
            .map(|d| d.disk_ratio)
            .filter(|r| *r > NEGLIGIBLE_RATIO)
            .sum();

        let cpu_fulfillment = throughput.cpu * available.max(0.0) / unresolved.len() as f64;
        let memory_fulfillment = bus_fulfillment(throughput.memory_bus, memory_demand);
        let disk_fulfillment = bus_fulfillment(throughput.disk_bus, disk_demand);

        let bottleneck = binding(cpu_fulfillment, memory_fulfillment, disk_fulfillment);
        passes.push(bottleneck);

        let ratio: fn(&JobDemand) -> f64 = match bottleneck {
            Bottleneck::MemoryBus => |d| d.memory_ratio,
            Bottleneck::DiskBus => |d| d.disk_ratio,
            Bottleneck::Cpu => {
                let each = available.max(0.0) / unresolved.len() as f64;
                for demand in unresolved.drain(..) {
                    shares.insert(demand.job, each);
                }
                break;
            }
        };

        unresolved.retain(|demand| {
            let r = ratio(*demand);
            if r > NEGLIGIBLE_RATIO {
                let share = (1.0 / r) / total;
                shares.insert(demand.job, share);
                available -= share;
                false
            } else {
                true
            }
        });
    }

    let cpu_usage = shares.values().sum();
    let memory_bus_usage = bus_usage(
        &shares,
        demands,
        throughput.cpu,
        throughput.memory_bus,
        |d| d.memory_ratio,
    );
    let disk_bus_usage = bus_usage(
        &shares,
        demands,
        throughput.cpu,
        throughput.disk_bus,
        |d| d.disk_ratio,
    );

    Allocation {
        shares,
        passes,
        cpu_usage,
        memory_bus_usage,
        disk_bus_usage,
    }
}
