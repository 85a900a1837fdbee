use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One PPA (Program/Project/Activity) line of the annual budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CategoryLine {
    pub(crate) category: String,
    pub(crate) amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) committee_responsible: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) committee_oversight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) abyip_ppa_activity: Option<String>,
}

impl CategoryLine {
    pub(crate) fn new(category: String, amount: Decimal) -> Self {
        Self {
            category,
            amount,
            description: None,
            committee_responsible: None,
            committee_oversight: None,
            abyip_ppa_activity: None,
        }
    }
}

/// The full budget for one SK term: a total and its PPA category breakdown.
/// Read-only once loaded; re-import replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BudgetCatalog {
    #[serde(rename = "totalBudget")]
    pub(crate) total_budget: Decimal,
    pub(crate) items: Vec<CategoryLine>,
}

impl BudgetCatalog {
    /// Build a catalog whose total is the sum of the item amounts.
    /// Used for source forms that carry no declared total (CSV, extraction).
    pub(crate) fn from_items(items: Vec<CategoryLine>) -> Self {
        let total_budget = items.iter().map(|i| i.amount).sum();
        Self {
            total_budget,
            items,
        }
    }

    /// Cap for a category, if the catalog has it.
    pub(crate) fn amount_of(&self, category: &str) -> Option<Decimal> {
        self.items
            .iter()
            .find(|i| i.category == category)
            .map(|i| i.amount)
    }

}
