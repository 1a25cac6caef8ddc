// region:    --- Imports
use super::queries;
use crate::bidding::model::{Bid, BidWithListing};
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::listing::model::Listing;
use crate::pricing::model::PriceEntry;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::info;
// endregion: --- Imports

// region:    --- Query Handlers

/// Single listing by id
pub async fn get_listing(db: &DatabaseManager, listing_id: i64) -> Result<Listing, AppError> {
    info!("{:<12} --> get listing id: {}", "Query", listing_id);
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Listing>(queries::GET_LISTING)
                .bind(listing_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("listing {}", listing_id)))
        })
    })
    .await
}

/// All listings, oldest first
pub async fn get_all_listings(db: &DatabaseManager) -> Result<Vec<Listing>, AppError> {
    info!("{:<12} --> get all listings", "Query");
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Listing>(queries::GET_ALL_LISTINGS)
                .fetch_all(&mut **tx)
                .await
                .map_err(AppError::from)
        })
    })
    .await
}

/// Listings owned by one farmer
pub async fn get_listings_by_owner(
    db: &DatabaseManager,
    owner_id: i64,
) -> Result<Vec<Listing>, AppError> {
    info!("{:<12} --> get listings for owner: {}", "Query", owner_id);
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Listing>(queries::GET_LISTINGS_BY_OWNER)
                .bind(owner_id)
                .fetch_all(&mut **tx)
                .await
                .map_err(AppError::from)
        })
    })
    .await
}

/// Live bids against a listing, newest first
pub async fn get_listing_bids(
    db: &DatabaseManager,
    listing_id: i64,
) -> Result<Vec<Bid>, AppError> {
    info!("{:<12} --> get bids for listing: {}", "Query", listing_id);
    db.transaction(|tx| {
        Box::pin(async move {
            let exists = sqlx::query("SELECT 1 FROM listings WHERE id = ?")
                .bind(listing_id)
                .fetch_optional(&mut **tx)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!("listing {}", listing_id)));
            }
            sqlx::query_as::<_, Bid>(queries::GET_LISTING_BIDS)
                .bind(listing_id)
                .fetch_all(&mut **tx)
                .await
                .map_err(AppError::from)
        })
    })
    .await
}

/// One bidder's live bids joined with listing metadata
pub async fn get_bids_for_bidder(
    db: &DatabaseManager,
    bidder_id: i64,
) -> Result<Vec<BidWithListing>, AppError> {
    info!("{:<12} --> get bids for bidder: {}", "Query", bidder_id);
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, BidWithListing>(queries::GET_BIDS_FOR_BIDDER)
                .bind(bidder_id)
                .fetch_all(&mut **tx)
                .await
                .map_err(AppError::from)
        })
    })
    .await
}

/// All price entries
pub async fn get_price_entries(db: &DatabaseManager) -> Result<Vec<PriceEntry>, AppError> {
    info!("{:<12} --> get price entries", "Query");
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, PriceEntry>(queries::GET_PRICE_ENTRIES)
                .fetch_all(&mut **tx)
                .await
                .map_err(AppError::from)
        })
    })
    .await
}

/// Next reset instant, if the scheduler has persisted one yet
pub async fn get_reset_window(db: &DatabaseManager) -> Result<Option<DateTime<Utc>>, AppError> {
    info!("{:<12} --> get reset window", "Query");
    db.transaction(|tx| {
        Box::pin(async move {
            let row = sqlx::query(queries::GET_RESET_WINDOW)
                .fetch_optional(&mut **tx)
                .await?;
            Ok(row.map(|r| r.get("next_reset_at")))
        })
    })
    .await
}

// endregion: --- Query Handlers
