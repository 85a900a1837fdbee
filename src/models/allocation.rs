use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A commitment of part of one category's budget to one project.
/// The ledger holds at most one of these per project; allocating again
/// replaces the old entry rather than adding to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ProjectAllocation {
    #[serde(rename = "projectId")]
    pub(crate) project_id: String,
    #[serde(rename = "allocatedAmount")]
    pub(crate) allocated_amount: Decimal,
    pub(crate) category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) created_at: String,
}

impl ProjectAllocation {
    pub(crate) fn new(
        project_id: String,
        allocated_amount: Decimal,
        category: String,
        description: Option<String>,
    ) -> Self {
        Self {
            project_id,
            allocated_amount,
            category,
            description,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
