//! Builders to construct registries from simulation configuration.

use crate::config::{CatalogConfig, CatalogEntry, JobEntry, SimulationConfig, UsageSource};
use crate::core::{FinishCallback, Index, JobDefinition, Registry, RegistryError};

/// Build a registry holding the machine and every catalog entry.
pub fn build_registry(cfg: &SimulationConfig) -> Result<Registry, RegistryError> {
    build_registry_with(cfg, |_, _| None)
}

/// Build a registry, asking `finish_factory` for each job's finish callback.
pub fn build_registry_with<FF>(
    cfg: &SimulationConfig,
    finish_factory: FF,
) -> Result<Registry, RegistryError>
where
    FF: FnMut(Index, &JobEntry) -> Option<FinishCallback>,
{
    cfg.validate().map_err(RegistryError::InvalidConfig)?;

    let mut registry = Registry::new(&cfg.machine)?;
    let defined = populate_registry(&mut registry, &cfg.catalog, finish_factory)?;
    tracing::info!(
        "registry built with {} catalog entries ({} jobs, {} objectives)",
        defined.len(),
        registry.job_indices().len(),
        registry.objective_indices().len()
    );
    Ok(registry)
}

/// Define every catalog entry in order. Returns the index assigned to each
/// entry, in entry order.
pub fn populate_registry<FF>(
    registry: &mut Registry,
    catalog: &CatalogConfig,
    mut finish_factory: FF,
) -> Result<Vec<Index>, RegistryError>
where
    FF: FnMut(Index, &JobEntry) -> Option<FinishCallback>,
{
    catalog.validate().map_err(RegistryError::InvalidConfig)?;

    let mut defined = Vec::with_capacity(catalog.entries.len());
    for entry in &catalog.entries {
        let index = match entry {
            CatalogEntry::UsageTemplate(template) => match template.index {
                Some(index) => {
                    registry.define_usage_template(index, template.usage)?;
                    index
                }
                None => registry.add_usage_template(template.usage)?,
            },
            CatalogEntry::Job(job) => {
                let usage = match job.usage {
                    UsageSource::Inline(usage) => usage,
                    UsageSource::Template(template) => registry.usage_template(template)?,
                };
                let mut definition = JobDefinition::new(job.name.clone(), usage)
                    .with_required_objectives(job.required_objectives.iter().copied());
                if let Some(policy) = job.repeat {
                    definition = definition.with_repeat_policy(policy);
                }
                let index = job.index.unwrap_or_else(|| registry.reserve_index());
                definition.on_finish = finish_factory(index, job);
                registry.define_job(index, definition)?;
                index
            }
            CatalogEntry::Objective(objective) => match objective.index {
                Some(index) => {
                    registry.define_objective(index, objective.name.clone(), &objective.jobs)?;
                    index
                }
                None => registry.add_objective(objective.name.clone(), &objective.jobs)?,
            },
        };
        defined.push(index);
    }
    Ok(defined)
}
