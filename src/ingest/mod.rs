mod csv_ingest;
mod detect;
mod json_ingest;

pub(crate) use csv_ingest::catalog_from_csv_reader;
pub(crate) use detect::catalog_from_path;
pub(crate) use json_ingest::{catalog_from_extracted, catalog_from_json};

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::models::BudgetCatalog;

/// Largest accepted gap between the declared total and the category sum.
pub(crate) fn total_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

#[derive(Debug, Error)]
pub(crate) enum IngestError {
    #[error("budget source has no category rows")]
    NoItems,
    #[error("total budget must be greater than zero (got {0})")]
    NonPositiveTotal(Decimal),
    #[error("declared total {declared} does not match category sum {computed}")]
    TotalMismatch {
        declared: Decimal,
        computed: Decimal,
    },
    #[error("duplicate category '{0}' in budget source")]
    DuplicateCategory(String),
    #[error("category '{category}' has a negative amount ({amount})")]
    NegativeAmount { category: String, amount: Decimal },
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: could not parse amount '{value}'")]
    BadAmount { row: usize, value: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Validation shared by every ingestion form: at least one row, positive
/// total, unique categories, no negative caps, and the declared total within
/// tolerance of the category sum.
pub(crate) fn check_catalog(catalog: &BudgetCatalog) -> Result<(), IngestError> {
    if catalog.items.is_empty() {
        return Err(IngestError::NoItems);
    }

    // Per-item checks first, so a negative row is reported as such even
    // when it also drags the computed total to zero or below.
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for item in &catalog.items {
        if item.amount < Decimal::ZERO {
            return Err(IngestError::NegativeAmount {
                category: item.category.clone(),
                amount: item.amount,
            });
        }
        if !seen.insert(item.category.as_str()) {
            return Err(IngestError::DuplicateCategory(item.category.clone()));
        }
    }

    if catalog.total_budget <= Decimal::ZERO {
        return Err(IngestError::NonPositiveTotal(catalog.total_budget));
    }

    let computed: Decimal = catalog.items.iter().map(|i| i.amount).sum();
    if (computed - catalog.total_budget).abs() > total_tolerance() {
        return Err(IngestError::TotalMismatch {
            declared: catalog.total_budget,
            computed,
        });
    }

    Ok(())
}
