// region:    --- Imports
use crate::aggregate;
use crate::bidding::commands::{
    current_max_bid, handle_place_bid, handle_retract_bid, BidLocks,
};
use crate::bidding::model::PlaceBidCommand;
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::listing::commands::{handle_create_listing, handle_delete_listing};
use crate::listing::model::CreateListingCommand;
use crate::pricing::commands::{handle_reconcile, handle_update_price};
use crate::pricing::model::{ProposedPrice, UpdatePriceCommand};
use crate::query;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
// endregion: --- Imports

// region:    --- App State

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub bid_locks: Arc<BidLocks>,
    pub reconcile_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self {
            db,
            bid_locks: Arc::new(BidLocks::new()),
            reconcile_gate: Arc::new(Mutex::new(())),
        }
    }
}

/// Build the full route tree.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/listings", post(handle_post_listing).get(handle_get_listings))
        .route(
            "/listings/:id",
            get(handle_get_listing).delete(handle_delete_listing_route),
        )
        .route("/listings/:id/bids", get(handle_get_listing_bids))
        .route("/bids", post(handle_post_bid).get(handle_get_bidder_bids))
        .route("/bids/:id", delete(handle_delete_bid))
        .route("/bids/:id/max", get(handle_get_max_bid))
        .route(
            "/price-settings",
            get(handle_get_price_settings).post(handle_post_price_settings),
        )
        .route("/price-settings/:id", put(handle_put_price_setting))
        .route("/market/today", get(handle_get_market_today))
        .with_state(state)
}

/// Caller identity, supplied by the external auth layer as a header.
fn caller_id(headers: &HeaderMap) -> Result<i64, AppError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| AppError::Validation("missing or malformed x-user-id header".to_string()))
}

// endregion: --- App State

// region:    --- Listing Handlers

/// Publish a listing
async fn handle_post_listing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(cmd): Json<CreateListingCommand>,
) -> Result<Response, AppError> {
    info!("{:<12} --> publish listing: {:?}", "Handler", cmd);
    let owner_id = caller_id(&headers)?;
    let listing = handle_create_listing(cmd, owner_id, &state.db).await?;
    Ok((StatusCode::CREATED, Json(listing)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingsFilter {
    owner_id: Option<i64>,
}

/// All listings, or one farmer's
async fn handle_get_listings(
    State(state): State<AppState>,
    Query(filter): Query<ListingsFilter>,
) -> Result<Response, AppError> {
    info!("{:<12} --> list listings: {:?}", "Handler", filter);
    let listings = match filter.owner_id {
        Some(owner_id) => query::handlers::get_listings_by_owner(&state.db, owner_id).await?,
        None => query::handlers::get_all_listings(&state.db).await?,
    };
    Ok(Json(listings).into_response())
}

/// Single listing
async fn handle_get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> Result<Response, AppError> {
    info!("{:<12} --> get listing id: {}", "Handler", listing_id);
    let listing = query::handlers::get_listing(&state.db, listing_id).await?;
    Ok(Json(listing).into_response())
}

/// Live bids against a listing
async fn handle_get_listing_bids(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> Result<Response, AppError> {
    info!("{:<12} --> bids for listing id: {}", "Handler", listing_id);
    let bids = query::handlers::get_listing_bids(&state.db, listing_id).await?;
    Ok(Json(bids).into_response())
}

/// Delete a listing (owner only)
async fn handle_delete_listing_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<i64>,
) -> Result<Response, AppError> {
    info!("{:<12} --> delete listing id: {}", "Handler", listing_id);
    let requester_id = caller_id(&headers)?;
    handle_delete_listing(listing_id, requester_id, &state.db).await?;
    state.bid_locks.release(listing_id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

// endregion: --- Listing Handlers

// region:    --- Bid Handlers

/// Place a bid
async fn handle_post_bid(
    State(state): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<Response, AppError> {
    info!("{:<12} --> place bid: {:?}", "Handler", cmd);
    let bid = handle_place_bid(cmd, &state.db, &state.bid_locks).await?;
    Ok((StatusCode::CREATED, Json(bid)).into_response())
}

/// Current winning bid, or 204 when the listing has no live bids
async fn handle_get_max_bid(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> Result<Response, AppError> {
    info!("{:<12} --> max bid for listing id: {}", "Handler", listing_id);
    match current_max_bid(listing_id, &state.db, &state.bid_locks).await? {
        Some(bid) => Ok(Json(serde_json::json!({
            "amount": bid.amount,
            "bidId": bid.id,
            "bidderId": bid.bidder_id,
            "placedAt": bid.placed_at,
        }))
        .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BidsFilter {
    bidder_id: i64,
}

/// One bidder's bids joined with listing metadata
async fn handle_get_bidder_bids(
    State(state): State<AppState>,
    Query(filter): Query<BidsFilter>,
) -> Result<Response, AppError> {
    info!("{:<12} --> bids for bidder: {}", "Handler", filter.bidder_id);
    let bids = query::handlers::get_bids_for_bidder(&state.db, filter.bidder_id).await?;
    Ok(Json(bids).into_response())
}

/// Retract a bid (bidder only)
async fn handle_delete_bid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(bid_id): Path<i64>,
) -> Result<Response, AppError> {
    info!("{:<12} --> retract bid id: {}", "Handler", bid_id);
    let requester_id = caller_id(&headers)?;
    handle_retract_bid(bid_id, requester_id, &state.db, &state.bid_locks).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

// endregion: --- Bid Handlers

// region:    --- Price Setting Handlers

/// All price entries
async fn handle_get_price_settings(State(state): State<AppState>) -> Result<Response, AppError> {
    info!("{:<12} --> list price settings", "Handler");
    let entries = query::handlers::get_price_entries(&state.db).await?;
    Ok(Json(entries).into_response())
}

/// Reconcile an admin batch against the merged listing view
async fn handle_post_price_settings(
    State(state): State<AppState>,
    Json(proposals): Json<Vec<ProposedPrice>>,
) -> Result<Response, AppError> {
    info!(
        "{:<12} --> reconcile {} price proposals",
        "Handler",
        proposals.len()
    );
    let listings = query::handlers::get_all_listings(&state.db).await?;
    let rows = aggregate::aggregate(&listings);
    let report = handle_reconcile(proposals, &rows, &state.db, &state.reconcile_gate).await?;
    Ok(Json(report).into_response())
}

/// Update a single price entry
async fn handle_put_price_setting(
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
    Json(cmd): Json<UpdatePriceCommand>,
) -> Result<Response, AppError> {
    info!("{:<12} --> update price entry id: {}", "Handler", entry_id);
    let entry = handle_update_price(entry_id, cmd, &state.db, &state.reconcile_gate).await?;
    Ok(Json(entry).into_response())
}

// endregion: --- Price Setting Handlers

// region:    --- Market Handlers

/// Merged commodity view plus the current reset window
async fn handle_get_market_today(State(state): State<AppState>) -> Result<Response, AppError> {
    info!("{:<12} --> today's market", "Handler");
    let listings = query::handlers::get_all_listings(&state.db).await?;
    let rows = aggregate::aggregate(&listings);
    let next_reset_at = query::handlers::get_reset_window(&state.db).await?;
    Ok(Json(serde_json::json!({
        "rows": rows,
        "nextResetAt": next_reset_at,
    }))
    .into_response())
}

// endregion: --- Market Handlers
