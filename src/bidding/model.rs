use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// A buyer's monetary offer against a specific listing. Append-only;
// retraction flags the row instead of deleting it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub listing_id: i64,
    pub bidder_id: i64,
    pub amount: f64,
    pub placed_at: DateTime<Utc>,
    pub retracted_at: Option<DateTime<Utc>>,
}

// A bid joined with the metadata of the listing it targets, for the
// buyer-facing "your bids" view.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BidWithListing {
    pub id: i64,
    pub listing_id: i64,
    pub bidder_id: i64,
    pub amount: f64,
    pub placed_at: DateTime<Utc>,
    pub listing_name: String,
    pub listing_category: String,
    pub listing_unit: String,
}

/// Bid placement payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub listing_id: i64,
    pub bidder_id: i64,
    pub amount: f64,
}
