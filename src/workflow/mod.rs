use anyhow::Result;

use crate::engine::BudgetAllocationEngine;
use crate::models::{Project, WorkflowStep};
use crate::store::Store;

/// Per-project documentation tracking: one record per project with its
/// workflow documents and step completion. Touches the allocation ledger in
/// exactly one place: deleting a project releases its allocation through
/// the engine.
pub(crate) struct ProjectWorkflowStore {
    projects: Vec<Project>,
    recovered: bool,
}

impl ProjectWorkflowStore {
    pub(crate) fn load(store: &Store) -> Result<Self> {
        let loaded = store.load_projects()?;
        Ok(Self {
            recovered: loaded.was_recovered(),
            projects: loaded.into_option().unwrap_or_default(),
        })
    }

    pub(crate) fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub(crate) fn recovered_from_corruption(&self) -> bool {
        self.recovered
    }

    /// Register a project. Returns false when the id is already taken.
    pub(crate) fn add_project(&mut self, store: &Store, id: &str, title: &str) -> Result<bool> {
        if self.get(id).is_some() {
            return Ok(false);
        }
        self.projects
            .push(Project::new(id.to_string(), title.to_string()));
        store.save_projects(&self.projects)?;
        Ok(true)
    }

    /// Delete a project and release its budget allocation. Returns false
    /// when no such project exists (the allocation is still released, in
    /// case a ledger entry outlived its project record).
    pub(crate) fn delete_project(
        &mut self,
        store: &Store,
        engine: &mut BudgetAllocationEngine,
        id: &str,
    ) -> Result<bool> {
        engine.remove_allocation(store, id)?;
        let existed = self.get(id).is_some();
        if existed {
            self.projects.retain(|p| p.id != id);
            store.save_projects(&self.projects)?;
        }
        Ok(existed)
    }

    /// Attach or replace the document for one workflow step. Content is
    /// opaque; it is stored verbatim. Returns false for an unknown project.
    pub(crate) fn set_document(
        &mut self,
        store: &Store,
        id: &str,
        step: WorkflowStep,
        content: String,
    ) -> Result<bool> {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        project.set_document(step, content);
        store.save_projects(&self.projects)?;
        Ok(true)
    }

    /// Mark a step complete. Returns false for an unknown project or a step
    /// with no document attached yet.
    pub(crate) fn complete_step(
        &mut self,
        store: &Store,
        id: &str,
        step: WorkflowStep,
    ) -> Result<bool> {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        if !project.complete_step(step) {
            return Ok(false);
        }
        store.save_projects(&self.projects)?;
        Ok(true)
    }
}
