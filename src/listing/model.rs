use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// A single farmer's offer of a quantity of a named commodity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub owner_id: i64,
    pub category: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub is_organic: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for publishing a new listing. The owner comes from the caller
/// identity, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingCommand {
    pub category: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub is_organic: bool,
}
