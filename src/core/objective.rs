//! Objectives: completion gates over a fixed set of jobs.

use std::fmt;
use std::sync::Arc;

use crate::core::index::Index;
use crate::core::job::Job;
use crate::core::property::Observable;

/// A gate that is complete exactly when every dependent job is complete.
pub struct Objective {
    index: Index,
    name: String,
    dependents: Vec<Index>,
    complete: Observable<bool>,
}

impl Objective {
    /// Wire an objective to its dependent jobs. The set never changes afterwards.
    pub(crate) fn new(index: Index, name: impl Into<String>, jobs: &[Arc<Job>]) -> Self {
        let name = name.into();
        let complete = Observable::named(index, format!("{name} complete"), jobs.is_empty());

        let gates: Arc<Vec<Observable<bool>>> =
            Arc::new(jobs.iter().map(|job| job.complete().clone()).collect());
        for gate in gates.iter() {
            let gates = Arc::clone(&gates);
            let complete_cell = complete.clone();
            gate.subscribe(move |_: &bool| {
                complete_cell.set(gates.iter().all(Observable::get));
            });
        }

        Self {
            index,
            name,
            dependents: jobs.iter().map(|job| job.index()).collect(),
            complete,
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

    /// Jobs this objective waits on.
    pub fn dependents(&self) -> &[Index] {
        &self.dependents
    }

    /// Completion cell.
    pub const fn complete(&self) -> &Observable<bool> {
        &self.complete
    }

    /// Current completion.
    pub fn is_complete(&self) -> bool {
        self.complete.get()
    }
}

impl fmt::Debug for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objective")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("dependents", &self.dependents)
            .field("complete", &self.complete.get())
            .finish()
    }
}
