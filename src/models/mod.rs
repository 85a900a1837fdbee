mod allocation;
mod catalog;
mod project;

pub(crate) use allocation::ProjectAllocation;
pub(crate) use catalog::{BudgetCatalog, CategoryLine};
pub(crate) use project::{Project, WorkflowStep};
