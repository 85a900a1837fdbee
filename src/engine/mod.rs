use anyhow::Result;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{BudgetCatalog, ProjectAllocation};
use crate::store::Store;

/// Category usage below this percentage is healthy.
pub(crate) const WARNING_PCT: u32 = 50;
/// Category usage at or above this percentage is critical. Shared by the
/// per-category and the overall status so the two never disagree.
pub(crate) const CRITICAL_PCT: u32 = 80;

/// Expected, recoverable outcomes of proposing an allocation. Returned as
/// values, never panicked; the Display text is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum AllocationError {
    #[error("no budget data loaded; run 'skbudget init <file>' first")]
    NoCatalog,
    #[error("allocation amount must be greater than zero")]
    NonPositiveAmount,
    #[error("'{category}' has {available} available; cannot allocate {requested}")]
    InsufficientCategory {
        category: String,
        available: Decimal,
        requested: Decimal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BudgetStatus {
    Ok,
    Warning,
    Critical,
}

impl BudgetStatus {
    pub(crate) fn from_percentage(pct: Decimal) -> BudgetStatus {
        if pct >= Decimal::from(CRITICAL_PCT) {
            BudgetStatus::Critical
        } else if pct >= Decimal::from(WARNING_PCT) {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Ok
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Ok => "ok",
            BudgetStatus::Warning => "warning",
            BudgetStatus::Critical => "critical",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetSummary {
    pub(crate) total: Decimal,
    pub(crate) allocated: Decimal,
    pub(crate) available: Decimal,
    pub(crate) percentage_used: Decimal,
}

/// One row of the per-category read projection.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryUsage {
    pub(crate) category: String,
    pub(crate) cap: Decimal,
    pub(crate) allocated: Decimal,
    pub(crate) available: Decimal,
    pub(crate) status: BudgetStatus,
}

/// A category whose committed allocations exceed its cap, found after a
/// catalog replacement shrank or dropped categories under existing
/// allocations.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OvercommitReport {
    pub(crate) category: String,
    pub(crate) cap: Decimal,
    pub(crate) allocated: Decimal,
    pub(crate) excess: Decimal,
}

/// The budget allocation engine: the one owner of the allocation ledger.
///
/// Hydrated once per session (catalog first, then ledger) and passed by
/// reference to callers. Mutations re-check availability themselves, write
/// the full ledger to the store, and only then commit in memory, so a
/// failed write leaves no partial state. Single writer assumed throughout;
/// there is no interleaving within a call.
pub(crate) struct BudgetAllocationEngine {
    catalog: Option<BudgetCatalog>,
    ledger: Vec<ProjectAllocation>,
    catalog_recovered: bool,
    ledger_recovered: bool,
}

impl BudgetAllocationEngine {
    pub(crate) fn load(store: &Store) -> Result<Self> {
        let catalog = store.load_catalog()?;
        let ledger = store.load_ledger()?;
        Ok(Self {
            catalog_recovered: catalog.was_recovered(),
            ledger_recovered: ledger.was_recovered(),
            catalog: catalog.into_option(),
            ledger: ledger.into_option().unwrap_or_default(),
        })
    }

    pub(crate) fn catalog(&self) -> Option<&BudgetCatalog> {
        self.catalog.as_ref()
    }

    pub(crate) fn allocations(&self) -> &[ProjectAllocation] {
        &self.ledger
    }

    /// True when either persisted record existed but was unreadable at load.
    /// Distinct from a legitimately empty store.
    pub(crate) fn recovered_from_corruption(&self) -> bool {
        self.catalog_recovered || self.ledger_recovered
    }

    // ── Availability ──────────────────────────────────────────

    /// Cap for a category; 0 for a category the catalog does not have.
    fn catalog_amount(&self, category: &str) -> Decimal {
        self.catalog
            .as_ref()
            .and_then(|c| c.amount_of(category))
            .unwrap_or(Decimal::ZERO)
    }

    fn allocated_in(&self, category: &str, exclude_project: Option<&str>) -> Decimal {
        self.ledger
            .iter()
            .filter(|a| a.category == category)
            .filter(|a| exclude_project != Some(a.project_id.as_str()))
            .map(|a| a.allocated_amount)
            .sum()
    }

    /// Remaining room in a category. Permissive read: an unknown category
    /// has cap 0, and the result may be negative after a catalog re-import
    /// shrank a cap below what is already committed. Enforcement happens in
    /// `validate`/`allocate`, not here.
    pub(crate) fn category_available(&self, category: &str) -> Decimal {
        self.available_excluding(category, None)
    }

    /// Availability as if `exclude_project`'s current allocation, whatever
    /// its category, were first retracted. This is what lets a project raise
    /// its own allocation without being blocked by its own prior commitment.
    fn available_excluding(&self, category: &str, exclude_project: Option<&str>) -> Decimal {
        self.catalog_amount(category) - self.allocated_in(category, exclude_project)
    }

    pub(crate) fn total_allocated(&self) -> Decimal {
        self.ledger.iter().map(|a| a.allocated_amount).sum()
    }

    /// Remaining total budget, clamped at zero for display. The true,
    /// possibly negative figure is `raw_available`.
    pub(crate) fn total_available(&self) -> Decimal {
        self.raw_available().max(Decimal::ZERO)
    }

    /// Unclamped remainder; negative when the ledger overcommits the total
    /// (possible only via catalog replacement or corrupted prior state).
    pub(crate) fn raw_available(&self) -> Decimal {
        let total = self
            .catalog
            .as_ref()
            .map(|c| c.total_budget)
            .unwrap_or(Decimal::ZERO);
        total - self.total_allocated()
    }

    // ── Validation and mutation ───────────────────────────────

    /// Check a proposed allocation without applying it. `exclude_project`
    /// names the project whose existing allocation should be treated as
    /// already released (a project editing its own allocation).
    pub(crate) fn validate(
        &self,
        amount: Decimal,
        category: &str,
        exclude_project: Option<&str>,
    ) -> Result<(), AllocationError> {
        if self.catalog.is_none() {
            return Err(AllocationError::NoCatalog);
        }
        if amount <= Decimal::ZERO {
            return Err(AllocationError::NonPositiveAmount);
        }
        let available = self.available_excluding(category, exclude_project);
        if amount > available {
            return Err(AllocationError::InsufficientCategory {
                category: category.to_string(),
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Commit an allocation. Replaces any existing allocation for the
    /// project rather than adding to it. The availability check runs here
    /// again regardless of any earlier `validate` call; on failure the
    /// ledger is untouched and `false` is returned.
    pub(crate) fn allocate(
        &mut self,
        store: &Store,
        project_id: &str,
        amount: Decimal,
        category: &str,
        description: Option<String>,
    ) -> Result<bool> {
        if self.validate(amount, category, Some(project_id)).is_err() {
            return Ok(false);
        }

        let mut next: Vec<ProjectAllocation> = self
            .ledger
            .iter()
            .filter(|a| a.project_id != project_id)
            .cloned()
            .collect();
        next.push(ProjectAllocation::new(
            project_id.to_string(),
            amount,
            category.to_string(),
            description,
        ));
        store.save_ledger(&next)?;
        self.ledger = next;
        Ok(true)
    }

    pub(crate) fn get_allocation(&self, project_id: &str) -> Option<&ProjectAllocation> {
        self.ledger.iter().find(|a| a.project_id == project_id)
    }

    /// Delete a project's allocation if it has one. Idempotent; removing an
    /// absent allocation is not an error and writes nothing.
    pub(crate) fn remove_allocation(&mut self, store: &Store, project_id: &str) -> Result<()> {
        if self.get_allocation(project_id).is_none() {
            return Ok(());
        }
        let next: Vec<ProjectAllocation> = self
            .ledger
            .iter()
            .filter(|a| a.project_id != project_id)
            .cloned()
            .collect();
        store.save_ledger(&next)?;
        self.ledger = next;
        Ok(())
    }

    /// Replace the whole catalog (re-import). Destructive with respect to
    /// the ledger: existing allocations are kept as-is, and the returned
    /// report lists every category the new catalog leaves overcommitted so
    /// the caller can surface a reconciliation instead of silently
    /// accumulating negative availability.
    pub(crate) fn replace_catalog(
        &mut self,
        store: &Store,
        catalog: BudgetCatalog,
    ) -> Result<Vec<OvercommitReport>> {
        store.save_catalog(&catalog)?;
        self.catalog = Some(catalog);
        self.catalog_recovered = false;
        Ok(self.overcommitted())
    }

    /// Categories whose committed allocations exceed their cap, including
    /// categories the catalog no longer contains (cap 0).
    pub(crate) fn overcommitted(&self) -> Vec<OvercommitReport> {
        let mut categories: Vec<&str> = Vec::new();
        for alloc in &self.ledger {
            if !categories.contains(&alloc.category.as_str()) {
                categories.push(&alloc.category);
            }
        }

        let mut report = Vec::new();
        for category in categories {
            let cap = self.catalog_amount(category);
            let allocated = self.allocated_in(category, None);
            if allocated > cap {
                report.push(OvercommitReport {
                    category: category.to_string(),
                    cap,
                    allocated,
                    excess: allocated - cap,
                });
            }
        }
        report
    }

    // ── Read projections ──────────────────────────────────────

    pub(crate) fn summary(&self) -> BudgetSummary {
        let total = self
            .catalog
            .as_ref()
            .map(|c| c.total_budget)
            .unwrap_or(Decimal::ZERO);
        let allocated = self.total_allocated();
        let available = (total - allocated).max(Decimal::ZERO);
        let percentage_used = if total <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            allocated / total * Decimal::ONE_HUNDRED
        };
        BudgetSummary {
            total,
            allocated,
            available,
            percentage_used,
        }
    }

    pub(crate) fn overall_status(&self) -> BudgetStatus {
        BudgetStatus::from_percentage(self.summary().percentage_used)
    }

    pub(crate) fn category_status(&self, category: &str) -> BudgetStatus {
        let cap = self.catalog_amount(category);
        let allocated = self.allocated_in(category, None);
        if cap <= Decimal::ZERO {
            // Zero-cap or unknown category: anything committed is overcommitment.
            return if allocated > Decimal::ZERO {
                BudgetStatus::Critical
            } else {
                BudgetStatus::Ok
            };
        }
        BudgetStatus::from_percentage(allocated / cap * Decimal::ONE_HUNDRED)
    }

    /// One row per catalog category, in catalog order.
    pub(crate) fn category_breakdown(&self) -> Vec<CategoryUsage> {
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };
        catalog
            .items
            .iter()
            .map(|item| CategoryUsage {
                category: item.category.clone(),
                cap: item.amount,
                allocated: self.allocated_in(&item.category, None),
                available: self.category_available(&item.category),
                status: self.category_status(&item.category),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
