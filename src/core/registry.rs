//! Registry owning every property, job, objective and usage template.
//!
//! The registry is populated at configuration time through `&mut self`
//! definitions and is then shared (typically as `Arc<Registry>`) with the
//! scheduler and any collaborators. Values change afterwards only through the
//! interior mutability of observable cells, so read, write and subscribe all
//! work through `&self`.
//!
//! Definitions fail fast: reusing an index, referencing an undefined job or
//! objective, or supplying an invalid usage profile is reported immediately
//! and leaves the registry unchanged.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::MachineConfig;
use crate::core::error::RegistryError;
use crate::core::index::{builtin, EntryKind, Index};
use crate::core::job::{Job, JobDefinition};
use crate::core::list::{ListView, ObservableList};
use crate::core::objective::Objective;
use crate::core::property::{Observable, PropertyValue, SubscriptionId};
use crate::core::usage::ResourceUsageSpec;

/// Type-erased view of an observable cell stored in the registry.
trait PropertyCell: Send + Sync {
    fn name(&self) -> &str;
    fn value_type(&self) -> &'static str;
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: PropertyValue> PropertyCell for Observable<T> {
    fn name(&self) -> &str {
        Self::name(self)
    }

    fn value_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        Self::unsubscribe(self, id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: PropertyValue> PropertyCell for ObservableList<T> {
    fn name(&self) -> &str {
        Self::name(self)
    }

    fn value_type(&self) -> &'static str {
        type_name::<Self>()
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        Self::unsubscribe(self, id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A named quantity tied to the property that bounds how much of it can be held.
#[derive(Debug, Clone)]
pub struct Resource {
    storage_property: Index,
    amount: Observable<f64>,
}

impl Resource {
    /// Registry index.
    pub fn index(&self) -> Index {
        self.amount.index()
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.amount.name()
    }

    /// Property holding the storage limit for this resource.
    pub const fn storage_property(&self) -> Index {
        self.storage_property
    }

    /// Amount cell.
    pub const fn amount(&self) -> &Observable<f64> {
        &self.amount
    }
}

/// Typed handles to the built-in machine properties.
///
/// The same cells are also reachable by index through the registry.
#[derive(Debug, Clone)]
pub struct MachineProperties {
    /// Clock speed, cycles per second per core.
    pub cpu_speed: Observable<f64>,
    /// Core count.
    pub cpu_cores: Observable<u32>,
    /// Memory bus speed.
    pub memory_speed: Observable<f64>,
    /// Memory capacity.
    pub memory_capacity: Observable<f64>,
    /// Disk bus speed.
    pub disk_speed: Observable<f64>,
    /// Disk capacity.
    pub disk_capacity: Observable<f64>,
    /// Aggregate CPU share in use.
    pub cpu_usage: Observable<f64>,
    /// Memory footprint of running jobs.
    pub memory_usage: Observable<f64>,
    /// Memory bus utilisation.
    pub memory_bus_usage: Observable<f64>,
    /// Disk footprint of running jobs.
    pub disk_usage: Observable<f64>,
    /// Disk bus utilisation.
    pub disk_bus_usage: Observable<f64>,
}

impl MachineProperties {
    /// Total CPU throughput: clock speed times core count.
    pub fn cpu_capacity(&self) -> f64 {
        self.cpu_speed.get() * f64::from(self.cpu_cores.get())
    }
}

fn install<T: PropertyValue>(
    properties: &mut HashMap<Index, Box<dyn PropertyCell>>,
    index: Index,
    name: &str,
    value: T,
) -> Observable<T> {
    let cell = Observable::named(index, name, value);
    properties.insert(index, Box::new(cell.clone()));
    cell
}

/// Owner of all simulation entities, keyed by [`Index`].
pub struct Registry {
    properties: HashMap<Index, Box<dyn PropertyCell>>,
    usage_templates: HashMap<Index, ResourceUsageSpec>,
    resources: HashMap<Index, Resource>,
    jobs: HashMap<Index, Arc<Job>>,
    objectives: HashMap<Index, Arc<Objective>>,
    machine: MachineProperties,
    queued: ObservableList<Index>,
    running: ObservableList<Index>,
    next_index: i32,
}

impl Registry {
    /// Create a registry with the built-in machine properties set from `config`.
    pub fn new(config: &MachineConfig) -> Result<Self, RegistryError> {
        config.validate().map_err(RegistryError::InvalidConfig)?;

        let mut properties = HashMap::new();
        let machine = MachineProperties {
            cpu_speed: install(&mut properties, builtin::CPU_SPEED, "CPU Speed", config.cpu_speed),
            cpu_cores: install(&mut properties, builtin::CPU_CORES, "CPU Cores", config.cpu_cores),
            disk_speed: install(&mut properties, builtin::DISK_SPEED, "Disk Speed", config.disk_speed),
            disk_capacity: install(
                &mut properties,
                builtin::DISK_CAPACITY,
                "Disk Capacity",
                config.disk_capacity,
            ),
            memory_speed: install(
                &mut properties,
                builtin::MEMORY_SPEED,
                "Memory Speed",
                config.memory_speed,
            ),
            memory_capacity: install(
                &mut properties,
                builtin::MEMORY_CAPACITY,
                "Memory Capacity",
                config.memory_capacity,
            ),
            cpu_usage: install(&mut properties, builtin::CPU_USAGE, "CPU Usage", 0.0),
            memory_usage: install(&mut properties, builtin::MEMORY_USAGE, "Memory Usage", 0.0),
            memory_bus_usage: install(
                &mut properties,
                builtin::MEMORY_BUS_USAGE,
                "Memory Bus Usage",
                0.0,
            ),
            disk_usage: install(&mut properties, builtin::DISK_USAGE, "Disk Usage", 0.0),
            disk_bus_usage: install(
                &mut properties,
                builtin::DISK_BUS_USAGE,
                "Disk Bus Usage",
                0.0,
            ),
        };

        let mut usage_templates = HashMap::new();
        usage_templates.insert(
            builtin::DEFAULT_USAGE_TEMPLATE,
            ResourceUsageSpec::default_process(),
        );

        Ok(Self {
            properties,
            usage_templates,
            resources: HashMap::new(),
            jobs: HashMap::new(),
            objectives: HashMap::new(),
            machine,
            queued: ObservableList::named(Index::UNBOUND, "Queued Jobs"),
            running: ObservableList::named(Index::UNBOUND, "Running Jobs"),
            next_index: builtin::FIRST_USER_DEFINED.0,
        })
    }

    /// Typed handles to the built-in machine properties.
    pub const fn machine(&self) -> &MachineProperties {
        &self.machine
    }

    /// Jobs waiting for admission, in FIFO order. Only the scheduler mutates it.
    pub fn queued_jobs(&self) -> ListView<Index> {
        self.queued.view()
    }

    /// Jobs currently admitted. Only the scheduler mutates it.
    pub fn running_jobs(&self) -> ListView<Index> {
        self.running.view()
    }

    pub(crate) const fn queued_list(&self) -> &ObservableList<Index> {
        &self.queued
    }

    pub(crate) const fn running_list(&self) -> &ObservableList<Index> {
        &self.running
    }

    /// Claim the next user-defined index without defining anything at it.
    pub fn reserve_index(&mut self) -> Index {
        let index = Index(self.next_index);
        self.next_index += 1;
        index
    }

    const fn check_bound(index: Index) -> Result<(), RegistryError> {
        if index.is_bound() {
            Ok(())
        } else {
            Err(RegistryError::Unbound)
        }
    }

    // ---------------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------------

    /// Define a property at `index`.
    pub fn define_property<T: PropertyValue>(
        &mut self,
        index: Index,
        name: impl Into<String>,
        default: T,
    ) -> Result<Observable<T>, RegistryError> {
        Self::check_bound(index)?;
        if self.properties.contains_key(&index) {
            return Err(RegistryError::DuplicateIndex {
                kind: EntryKind::Property,
                index,
            });
        }
        let cell = Observable::named(index, name, default);
        self.properties.insert(index, Box::new(cell.clone()));
        Ok(cell)
    }

    /// Define a property at the next user-defined index.
    pub fn add_property<T: PropertyValue>(
        &mut self,
        name: impl Into<String>,
        default: T,
    ) -> Result<Index, RegistryError> {
        let index = self.reserve_index();
        self.define_property(index, name, default)?;
        Ok(index)
    }

    /// Define an empty list property at `index`. Scalar and list properties
    /// share one index space.
    pub fn define_list_property<T: PropertyValue>(
        &mut self,
        index: Index,
        name: impl Into<String>,
    ) -> Result<ObservableList<T>, RegistryError> {
        Self::check_bound(index)?;
        if self.properties.contains_key(&index) {
            return Err(RegistryError::DuplicateIndex {
                kind: EntryKind::Property,
                index,
            });
        }
        let list = ObservableList::named(index, name);
        self.properties.insert(index, Box::new(list.clone()));
        Ok(list)
    }

    /// Define a list property at the next user-defined index.
    pub fn add_list_property<T: PropertyValue>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<Index, RegistryError> {
        let index = self.reserve_index();
        self.define_list_property::<T>(index, name)?;
        Ok(index)
    }

    /// Typed handle to the list property at `index`.
    pub fn list_property<T: PropertyValue>(
        &self,
        index: Index,
    ) -> Result<ObservableList<T>, RegistryError> {
        let cell = self.cell(index)?;
        cell.as_any()
            .downcast_ref::<ObservableList<T>>()
            .cloned()
            .ok_or_else(|| RegistryError::TypeMismatch {
                index,
                expected: type_name::<ObservableList<T>>(),
                actual: cell.value_type(),
            })
    }

    fn cell(&self, index: Index) -> Result<&dyn PropertyCell, RegistryError> {
        self.properties
            .get(&index)
            .map(|cell| &**cell)
            .ok_or(RegistryError::UnknownIndex {
                kind: EntryKind::Property,
                index,
            })
    }

    /// Typed handle to the property at `index`.
    pub fn property<T: PropertyValue>(&self, index: Index) -> Result<Observable<T>, RegistryError> {
        let cell = self.cell(index)?;
        cell.as_any()
            .downcast_ref::<Observable<T>>()
            .cloned()
            .ok_or_else(|| RegistryError::TypeMismatch {
                index,
                expected: type_name::<T>(),
                actual: cell.value_type(),
            })
    }

    /// Current value of the property at `index`.
    pub fn value<T: PropertyValue>(&self, index: Index) -> Result<T, RegistryError> {
        Ok(self.property::<T>(index)?.get())
    }

    /// Write the property at `index`. Returns whether the value changed.
    pub fn set_value<T: PropertyValue>(&self, index: Index, value: T) -> Result<bool, RegistryError> {
        Ok(self.property::<T>(index)?.set(value))
    }

    /// Subscribe to the property at `index`; the callback fires immediately once.
    pub fn subscribe<T, F>(&self, index: Index, callback: F) -> Result<SubscriptionId, RegistryError>
    where
        T: PropertyValue,
        F: Fn(&T) + Send + Sync + 'static,
    {
        Ok(self.property::<T>(index)?.subscribe(callback))
    }

    /// Remove a subscription from the property at `index`.
    pub fn unsubscribe(&self, index: Index, id: SubscriptionId) -> Result<bool, RegistryError> {
        Ok(self.cell(index)?.unsubscribe(id))
    }

    /// Display name of the property at `index`.
    pub fn property_name(&self, index: Index) -> Result<&str, RegistryError> {
        Ok(self.cell(index)?.name())
    }

    /// All property indices, ascending.
    pub fn property_indices(&self) -> Vec<Index> {
        sorted_keys(&self.properties)
    }

    // ---------------------------------------------------------------------
    // Usage templates and resources
    // ---------------------------------------------------------------------

    /// Define a reusable usage profile at `index`.
    pub fn define_usage_template(
        &mut self,
        index: Index,
        spec: ResourceUsageSpec,
    ) -> Result<(), RegistryError> {
        Self::check_bound(index)?;
        if self.usage_templates.contains_key(&index) {
            return Err(RegistryError::DuplicateIndex {
                kind: EntryKind::UsageTemplate,
                index,
            });
        }
        spec.validate().map_err(RegistryError::InvalidUsage)?;
        self.usage_templates.insert(index, spec);
        Ok(())
    }

    /// Define a usage profile at the next user-defined index.
    pub fn add_usage_template(&mut self, spec: ResourceUsageSpec) -> Result<Index, RegistryError> {
        let index = self.reserve_index();
        self.define_usage_template(index, spec)?;
        Ok(index)
    }

    /// Usage profile at `index`.
    pub fn usage_template(&self, index: Index) -> Result<ResourceUsageSpec, RegistryError> {
        self.usage_templates
            .get(&index)
            .copied()
            .ok_or(RegistryError::UnknownIndex {
                kind: EntryKind::UsageTemplate,
                index,
            })
    }

    /// Define a resource at `index` whose limit lives in `storage_property`.
    pub fn define_resource(
        &mut self,
        index: Index,
        storage_property: Index,
        name: impl Into<String>,
        default: f64,
    ) -> Result<Resource, RegistryError> {
        Self::check_bound(index)?;
        if self.resources.contains_key(&index) {
            return Err(RegistryError::DuplicateIndex {
                kind: EntryKind::Resource,
                index,
            });
        }
        let resource = Resource {
            storage_property,
            amount: Observable::named(index, name, default),
        };
        self.resources.insert(index, resource.clone());
        Ok(resource)
    }

    /// Define a resource at the next user-defined index.
    pub fn add_resource(
        &mut self,
        storage_property: Index,
        name: impl Into<String>,
        default: f64,
    ) -> Result<Index, RegistryError> {
        let index = self.reserve_index();
        self.define_resource(index, storage_property, name, default)?;
        Ok(index)
    }

    /// Resource at `index`.
    pub fn resource(&self, index: Index) -> Result<&Resource, RegistryError> {
        self.resources.get(&index).ok_or(RegistryError::UnknownIndex {
            kind: EntryKind::Resource,
            index,
        })
    }

    // ---------------------------------------------------------------------
    // Jobs and objectives
    // ---------------------------------------------------------------------

    /// Define a job at `index`. Every required objective must already exist.
    pub fn define_job(
        &mut self,
        index: Index,
        definition: JobDefinition,
    ) -> Result<Arc<Job>, RegistryError> {
        Self::check_bound(index)?;
        if self.jobs.contains_key(&index) {
            return Err(RegistryError::DuplicateIndex {
                kind: EntryKind::Job,
                index,
            });
        }
        definition
            .usage
            .validate()
            .map_err(|e| RegistryError::InvalidUsage(format!("job `{}`: {e}", definition.name)))?;
        if let Some(policy) = &definition.repeat {
            if !policy.exponent.is_finite() {
                return Err(RegistryError::InvalidUsage(format!(
                    "job `{}`: repeat exponent must be finite",
                    definition.name
                )));
            }
        }

        let required = definition
            .required_objectives
            .iter()
            .map(|objective| self.objective(*objective).map(|o| o.complete().clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let job = Arc::new(Job::new(index, definition, required));
        self.jobs.insert(index, Arc::clone(&job));
        tracing::debug!("defined job {} `{}`", index, job.name());
        Ok(job)
    }

    /// Define a job at the next user-defined index.
    pub fn add_job(&mut self, definition: JobDefinition) -> Result<Index, RegistryError> {
        let index = self.reserve_index();
        self.define_job(index, definition)?;
        Ok(index)
    }

    /// Job at `index`.
    pub fn job(&self, index: Index) -> Result<Arc<Job>, RegistryError> {
        self.jobs
            .get(&index)
            .cloned()
            .ok_or(RegistryError::UnknownIndex {
                kind: EntryKind::Job,
                index,
            })
    }

    /// Whether the job at `index` is complete.
    pub fn job_complete(&self, index: Index) -> Result<bool, RegistryError> {
        Ok(self.job(index)?.is_complete())
    }

    /// All job indices, ascending.
    pub fn job_indices(&self) -> Vec<Index> {
        sorted_keys(&self.jobs)
    }

    /// Define an objective over `dependent_jobs`, all of which must already exist.
    pub fn define_objective(
        &mut self,
        index: Index,
        name: impl Into<String>,
        dependent_jobs: &[Index],
    ) -> Result<Arc<Objective>, RegistryError> {
        Self::check_bound(index)?;
        if self.objectives.contains_key(&index) {
            return Err(RegistryError::DuplicateIndex {
                kind: EntryKind::Objective,
                index,
            });
        }
        let jobs = dependent_jobs
            .iter()
            .map(|job| self.job(*job))
            .collect::<Result<Vec<_>, _>>()?;

        let objective = Arc::new(Objective::new(index, name, &jobs));
        self.objectives.insert(index, Arc::clone(&objective));
        tracing::debug!("defined objective {} `{}`", index, objective.name());
        Ok(objective)
    }

    /// Define an objective at the next user-defined index.
    pub fn add_objective(
        &mut self,
        name: impl Into<String>,
        dependent_jobs: &[Index],
    ) -> Result<Index, RegistryError> {
        let index = self.reserve_index();
        self.define_objective(index, name, dependent_jobs)?;
        Ok(index)
    }

    /// Objective at `index`.
    pub fn objective(&self, index: Index) -> Result<Arc<Objective>, RegistryError> {
        self.objectives
            .get(&index)
            .cloned()
            .ok_or(RegistryError::UnknownIndex {
                kind: EntryKind::Objective,
                index,
            })
    }

    /// Whether the objective at `index` is complete.
    pub fn objective_complete(&self, index: Index) -> Result<bool, RegistryError> {
        Ok(self.objective(index)?.is_complete())
    }

    /// All objective indices, ascending.
    pub fn objective_indices(&self) -> Vec<Index> {
        sorted_keys(&self.objectives)
    }
}

fn sorted_keys<V>(map: &HashMap<Index, V>) -> Vec<Index> {
    let mut keys: Vec<Index> = map.keys().copied().collect();
    keys.sort_unstable();
    keys
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("properties", &self.properties.len())
            .field("usage_templates", &self.usage_templates.len())
            .field("resources", &self.resources.len())
            .field("jobs", &self.jobs.len())
            .field("objectives", &self.objectives.len())
            .field("queued", &self.queued.to_vec())
            .field("running", &self.running.to_vec())
            .finish_non_exhaustive()
    }
}
