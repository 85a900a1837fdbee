use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

use super::IngestError;
use crate::models::{BudgetCatalog, CategoryLine};

/// Read a budget catalog from CSV with a header row. `category` and
/// `amount` columns are required; the committee/ABYIP metadata columns are
/// optional. The total is computed as the sum of the rows.
pub(crate) fn catalog_from_csv_reader<R: Read>(reader: R) -> Result<BudgetCatalog, IngestError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let category_col = find("category").ok_or(IngestError::MissingColumn("category"))?;
    let amount_col = find("amount").ok_or(IngestError::MissingColumn("amount"))?;
    let description_col = find("description");
    let responsible_col = find("committee_responsible");
    let oversight_col = find("committee_oversight");
    let activity_col = find("abyip_ppa_activity");

    let optional = |record: &csv::StringRecord, col: Option<usize>| {
        col.and_then(|c| record.get(c))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let mut items = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let category = record
            .get(category_col)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if category.is_empty() {
            // Blank/padding row
            continue;
        }

        let raw_amount = record.get(amount_col).map(str::trim).unwrap_or_default();
        let amount = parse_amount(raw_amount).ok_or_else(|| IngestError::BadAmount {
            row: i + 2, // 1-based, counting the header
            value: raw_amount.to_string(),
        })?;

        let mut line = CategoryLine::new(category, amount);
        line.description = optional(&record, description_col);
        line.committee_responsible = optional(&record, responsible_col);
        line.committee_oversight = optional(&record, oversight_col);
        line.abyip_ppa_activity = optional(&record, activity_col);
        items.push(line);
    }

    let catalog = BudgetCatalog::from_items(items);
    super::check_catalog(&catalog)?;
    Ok(catalog)
}

/// Parse a currency cell, tolerating peso/dollar signs, thousands commas,
/// accountant parentheses, and stray quotes.
fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned = s
        .replace(['₱', '$', ',', '"'], "")
        .replace('(', "-")
        .replace(')', "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

#[cfg(test)]
#[path = "csv_ingest_tests.rs"]
mod tests;
