/// Bid ledger write side.
/// 1. Place a bid
/// 2. Retract a bid (bidder only)
/// 3. Read the current winning bid
// region:    --- Imports
use crate::bidding::model::{Bid, PlaceBidCommand};
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::query::queries;
use chrono::Utc;
use sqlx::Row;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::info;
// endregion: --- Imports

// region:    --- Bid Locks

/// One async mutex per listing id. Appends to and winning-bid reads of the
/// same listing serialize on it; different listings proceed in parallel.
#[derive(Default)]
pub struct BidLocks {
    inner: StdMutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl BidLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_listing(&self, listing_id: i64) -> Arc<Mutex<()>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(map.entry(listing_id).or_default())
    }

    /// Drop the lock entry for a listing that no longer exists, so the map
    /// does not grow with every listing id ever bid on. A holder of the old
    /// Arc keeps its guard; new bids fail the listing-existence check anyway.
    pub fn release(&self, listing_id: i64) {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.remove(&listing_id);
    }
}

// endregion: --- Bid Locks

// region:    --- Commands

const INSERT_BID: &str = r#"
    INSERT INTO bids (listing_id, bidder_id, amount, placed_at)
    VALUES (?, ?, ?, ?)
    RETURNING id, listing_id, bidder_id, amount, placed_at, retracted_at
"#;

/// 1. Place a bid. Any finite positive amount is accepted, including one
/// below the current maximum: the ledger is an append-only log of offers,
/// not a strictly ascending auction. Callers wanting ascending-only
/// semantics must enforce it at the edge.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    db: &DatabaseManager,
    locks: &BidLocks,
) -> Result<Bid, AppError> {
    info!("{:<12} --> place bid: {:?}", "Command", cmd);

    if !cmd.amount.is_finite() || cmd.amount <= 0.0 {
        return Err(AppError::Validation(format!(
            "bid amount must be a positive number, got {}",
            cmd.amount
        )));
    }

    let lock = locks.for_listing(cmd.listing_id);
    let _guard = lock.lock().await;

    let now = Utc::now();
    db.transaction(|tx| {
        Box::pin(async move {
            let exists = sqlx::query("SELECT 1 FROM listings WHERE id = ?")
                .bind(cmd.listing_id)
                .fetch_optional(&mut **tx)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!("listing {}", cmd.listing_id)));
            }

            let bid = sqlx::query_as::<_, Bid>(INSERT_BID)
                .bind(cmd.listing_id)
                .bind(cmd.bidder_id)
                .bind(cmd.amount)
                .bind(now)
                .fetch_one(&mut **tx)
                .await?;
            Ok(bid)
        })
    })
    .await
}

/// 2. Retract a bid. Only the bidder who placed it may retract; the row is
/// kept with a retraction timestamp so the ledger stays append-only.
pub async fn handle_retract_bid(
    bid_id: i64,
    requester_id: i64,
    db: &DatabaseManager,
    locks: &BidLocks,
) -> Result<(), AppError> {
    info!(
        "{:<12} --> retract bid id: {} by user: {}",
        "Command", bid_id, requester_id
    );

    // The listing id is needed before the per-listing lock can be taken.
    let row = db
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query("SELECT listing_id, bidder_id, retracted_at FROM bids WHERE id = ?")
                    .bind(bid_id)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("bid {}", bid_id)))?;

    let listing_id: i64 = row.get("listing_id");
    let bidder_id: i64 = row.get("bidder_id");
    if bidder_id != requester_id {
        return Err(AppError::NotOwner(format!(
            "bid {} belongs to another bidder",
            bid_id
        )));
    }

    let lock = locks.for_listing(listing_id);
    let _guard = lock.lock().await;

    let now = Utc::now();
    db.transaction(|tx| {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE bids SET retracted_at = ? WHERE id = ? AND retracted_at IS NULL",
            )
            .bind(now)
            .bind(bid_id)
            .execute(&mut **tx)
            .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("bid {}", bid_id)));
            }
            Ok(())
        })
    })
    .await
}

/// 3. Current winning bid for a listing: highest amount over the
/// non-retracted bids, earliest placement winning exact-amount ties.
/// Serialized against concurrent appends on the same listing.
pub async fn current_max_bid(
    listing_id: i64,
    db: &DatabaseManager,
    locks: &BidLocks,
) -> Result<Option<Bid>, AppError> {
    let lock = locks.for_listing(listing_id);
    let _guard = lock.lock().await;

    db.transaction(|tx| {
        Box::pin(async move {
            let exists = sqlx::query("SELECT 1 FROM listings WHERE id = ?")
                .bind(listing_id)
                .fetch_optional(&mut **tx)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!("listing {}", listing_id)));
            }

            let bid = sqlx::query_as::<_, Bid>(queries::GET_MAX_BID)
                .bind(listing_id)
                .fetch_optional(&mut **tx)
                .await?;
            Ok(bid)
        })
    })
    .await
}

// endregion: --- Commands

// region:    --- Tests


// endregion: --- Tests
