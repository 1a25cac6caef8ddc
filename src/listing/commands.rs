/// Listing store write side.
/// 1. Publish a listing
/// 2. Delete a listing (owner only)
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::listing::model::{CreateListingCommand, Listing};
use chrono::Utc;
use sqlx::Row;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands

const INSERT_LISTING: &str = r#"
    INSERT INTO listings (owner_id, category, name, quantity, unit, is_organic, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    RETURNING id, owner_id, category, name, quantity, unit, is_organic, created_at
"#;

/// 1. Publish a listing. Quantity must be a finite positive number and the
/// descriptive fields must be non-empty; anything else is rejected before
/// any state change.
pub async fn handle_create_listing(
    cmd: CreateListingCommand,
    owner_id: i64,
    db: &DatabaseManager,
) -> Result<Listing, AppError> {
    info!("{:<12} --> create listing: {:?}", "Command", cmd);

    if cmd.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if cmd.category.trim().is_empty() {
        return Err(AppError::Validation(
            "category must not be empty".to_string(),
        ));
    }
    if cmd.unit.trim().is_empty() {
        return Err(AppError::Validation("unit must not be empty".to_string()));
    }
    if !cmd.quantity.is_finite() || cmd.quantity <= 0.0 {
        return Err(AppError::Validation(format!(
            "quantity must be a positive number, got {}",
            cmd.quantity
        )));
    }

    let now = Utc::now();
    db.transaction(|tx| {
        Box::pin(async move {
            let listing = sqlx::query_as::<_, Listing>(INSERT_LISTING)
                .bind(owner_id)
                .bind(&cmd.category)
                .bind(&cmd.name)
                .bind(cmd.quantity)
                .bind(&cmd.unit)
                .bind(cmd.is_organic)
                .bind(now)
                .fetch_one(&mut **tx)
                .await?;
            Ok(listing)
        })
    })
    .await
}

/// 2. Delete a listing. Only the owning farmer may delete; anyone else gets
/// an authorization error, not a silent no-op. Bid rows against the listing
/// stay in the ledger (it is append-only) but drop out of every joined view
/// once the listing row is gone, like a renamed commodity orphans its price
/// entry.
pub async fn handle_delete_listing(
    listing_id: i64,
    requester_id: i64,
    db: &DatabaseManager,
) -> Result<(), AppError> {
    info!(
        "{:<12} --> delete listing id: {} by user: {}",
        "Command", listing_id, requester_id
    );

    db.transaction(|tx| {
        Box::pin(async move {
            let row = sqlx::query("SELECT owner_id FROM listings WHERE id = ?")
                .bind(listing_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("listing {}", listing_id)))?;

            let owner_id: i64 = row.get("owner_id");
            if owner_id != requester_id {
                return Err(AppError::NotOwner(format!(
                    "listing {} belongs to another farmer",
                    listing_id
                )));
            }

            sqlx::query("DELETE FROM listings WHERE id = ?")
                .bind(listing_id)
                .execute(&mut **tx)
                .await?;
            Ok(())
        })
    })
    .await
}

// endregion: --- Commands
