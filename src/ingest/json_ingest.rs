use super::IngestError;
use crate::models::{BudgetCatalog, CategoryLine};

/// Parse a budget catalog from JSON matching the persisted record shape
/// (declared `totalBudget` plus `items`). The declared total is checked
/// against the category sum.
pub(crate) fn catalog_from_json(text: &str) -> Result<BudgetCatalog, IngestError> {
    let catalog: BudgetCatalog = serde_json::from_str(text)?;
    super::check_catalog(&catalog)?;
    Ok(catalog)
}

/// Build a catalog from the record list produced by the external document
/// extraction service. These carry no declared total; the sum of the
/// extracted amounts becomes the total.
pub(crate) fn catalog_from_extracted(
    items: Vec<CategoryLine>,
) -> Result<BudgetCatalog, IngestError> {
    let catalog = BudgetCatalog::from_items(items);
    super::check_catalog(&catalog)?;
    Ok(catalog)
}

#[cfg(test)]
#[path = "json_ingest_tests.rs"]
mod tests;
