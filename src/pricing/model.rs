use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Admin-maintained reference price for a commodity name, independent of
// any specific listing. At most one entry per item_name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub id: i64,
    pub item_name: String,
    pub category: String,
    pub price_per_unit: f64,
    pub unit: String,
    pub last_set_at: DateTime<Utc>,
}

/// One admin-proposed price. Category and unit are optional here; the
/// merged listing view supplies them when the commodity is on the market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedPrice {
    pub item_name: String,
    pub price_per_unit: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Per-entry outcome of a reconciliation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResult {
    pub item_name: String,
    pub status: UpsertStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertStatus {
    Created,
    Updated,
    Failed,
}

/// Batch result. `succeeded`/`failed` let the admin tell a partial failure
/// from a total one and resubmit only the failed subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<UpsertResult>,
}

/// Single-entry admin edit, used by the PUT route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriceCommand {
    pub price_per_unit: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}
