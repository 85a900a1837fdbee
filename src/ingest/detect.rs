use std::path::Path;

use super::IngestError;
use crate::models::{BudgetCatalog, CategoryLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceFormat {
    Csv,
    Json,
}

/// Decide whether a budget source file is CSV or JSON. The file extension
/// wins when it is recognizable; otherwise the content is sniffed — JSON
/// documents open with '{' or '['.
pub(crate) fn detect_format(path: &Path, sample: &str) -> SourceFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("json") => return SourceFormat::Json,
        Some("csv") => return SourceFormat::Csv,
        _ => {}
    }

    match sample.trim_start().chars().next() {
        Some('{') | Some('[') => SourceFormat::Json,
        _ => SourceFormat::Csv,
    }
}

/// Load a catalog from a file of either supported format. A JSON document
/// may be the catalog record itself or a bare list of category records (the
/// shape the external document extraction service produces); a list carries
/// no declared total, so the sum of its amounts becomes the total.
pub(crate) fn catalog_from_path(path: &Path) -> Result<BudgetCatalog, IngestError> {
    let text = std::fs::read_to_string(path)?;
    match detect_format(path, &text) {
        SourceFormat::Json if text.trim_start().starts_with('[') => {
            let items: Vec<CategoryLine> = serde_json::from_str(&text)?;
            super::catalog_from_extracted(items)
        }
        SourceFormat::Json => super::catalog_from_json(&text),
        SourceFormat::Csv => super::catalog_from_csv_reader(text.as_bytes()),
    }
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
