/// Price table write side.
/// 1. Reconcile an admin batch against the merged listing view
/// 2. Update a single entry by id
// region:    --- Imports
use crate::aggregate::AggregatedRow;
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::pricing::model::{
    PriceEntry, ProposedPrice, ReconcileReport, UpdatePriceCommand, UpsertResult, UpsertStatus,
};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Reconciliation

const SELECT_ENTRY_BY_NAME: &str = r#"
    SELECT id, item_name, category, price_per_unit, unit, last_set_at
    FROM price_entries
    WHERE item_name = ?
"#;

const INSERT_ENTRY: &str = r#"
    INSERT INTO price_entries (item_name, category, price_per_unit, unit, last_set_at)
    VALUES (?, ?, ?, ?, ?)
"#;

const UPDATE_ENTRY: &str = r#"
    UPDATE price_entries
    SET category = ?, price_per_unit = ?, unit = ?, last_set_at = ?
    WHERE id = ?
"#;

/// Whole-batch validation, performed before any write. Every proposed price
/// must be a finite number strictly greater than zero; one bad price fails
/// the entire batch with the offending commodity name.
pub fn validate_proposals(proposals: &[ProposedPrice]) -> Result<(), AppError> {
    for p in proposals {
        if !p.price_per_unit.is_finite() || p.price_per_unit <= 0.0 {
            return Err(AppError::InvalidPrice {
                name: p.item_name.clone(),
                value: p.price_per_unit,
            });
        }
    }
    Ok(())
}

/// 1. Reconcile. Matching against existing entries is by exact item_name
/// string equality only; there is no foreign key to listings, so a renamed
/// commodity orphans its entry. Once validation passes each upsert runs in
/// its own transaction, and a failure on one entry is reported per-entry
/// without aborting the rest. Concurrent runs are refused.
pub async fn handle_reconcile(
    proposals: Vec<ProposedPrice>,
    aggregated: &[AggregatedRow],
    db: &DatabaseManager,
    gate: &Mutex<()>,
) -> Result<ReconcileReport, AppError> {
    info!(
        "{:<12} --> reconcile batch of {} proposals",
        "Command",
        proposals.len()
    );

    let _writer = gate.try_lock().map_err(|_| {
        AppError::Conflict("a reconciliation run is already in progress".to_string())
    })?;

    validate_proposals(&proposals)?;

    let mut results = Vec::with_capacity(proposals.len());
    let mut succeeded = 0;
    let mut failed = 0;

    for proposal in proposals {
        let row = aggregated.iter().find(|r| r.name == proposal.item_name);
        let item_name = proposal.item_name.clone();
        match upsert_entry(db, proposal, row).await {
            Ok(status) => {
                succeeded += 1;
                results.push(UpsertResult {
                    item_name,
                    status,
                    error: None,
                });
            }
            Err(e) => {
                warn!(
                    "{:<12} --> upsert failed for '{}': {}",
                    "Command", item_name, e
                );
                failed += 1;
                results.push(UpsertResult {
                    item_name,
                    status: UpsertStatus::Failed,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(ReconcileReport {
        succeeded,
        failed,
        results,
    })
}

/// Upsert one entry in its own transaction. Category and unit resolve from
/// the merged listing row first, then the proposal's own fields, then the
/// existing entry.
async fn upsert_entry(
    db: &DatabaseManager,
    proposal: ProposedPrice,
    row: Option<&AggregatedRow>,
) -> Result<UpsertStatus, AppError> {
    let row = row.cloned();
    let now = Utc::now();
    db.transaction(|tx| {
        Box::pin(async move {
            let existing = sqlx::query_as::<_, PriceEntry>(SELECT_ENTRY_BY_NAME)
                .bind(&proposal.item_name)
                .fetch_optional(&mut **tx)
                .await?;

            let category = row
                .as_ref()
                .map(|r| r.category.clone())
                .or(proposal.category)
                .or_else(|| existing.as_ref().map(|e| e.category.clone()))
                .unwrap_or_default();
            let unit = row
                .as_ref()
                .map(|r| r.unit.clone())
                .or(proposal.unit)
                .or_else(|| existing.as_ref().map(|e| e.unit.clone()))
                .unwrap_or_default();

            match existing {
                Some(entry) => {
                    sqlx::query(UPDATE_ENTRY)
                        .bind(&category)
                        .bind(proposal.price_per_unit)
                        .bind(&unit)
                        .bind(now)
                        .bind(entry.id)
                        .execute(&mut **tx)
                        .await?;
                    Ok(UpsertStatus::Updated)
                }
                None => {
                    sqlx::query(INSERT_ENTRY)
                        .bind(&proposal.item_name)
                        .bind(&category)
                        .bind(proposal.price_per_unit)
                        .bind(&unit)
                        .bind(now)
                        .execute(&mut **tx)
                        .await?;
                    Ok(UpsertStatus::Created)
                }
            }
        })
    })
    .await
}

/// 2. Update a single entry by id. Shares the price validation and the
/// single-writer gate with batch reconciliation.
pub async fn handle_update_price(
    entry_id: i64,
    cmd: UpdatePriceCommand,
    db: &DatabaseManager,
    gate: &Mutex<()>,
) -> Result<PriceEntry, AppError> {
    info!(
        "{:<12} --> update price entry id: {} to {}",
        "Command", entry_id, cmd.price_per_unit
    );

    if !cmd.price_per_unit.is_finite() || cmd.price_per_unit <= 0.0 {
        return Err(AppError::Validation(format!(
            "price must be a positive number, got {}",
            cmd.price_per_unit
        )));
    }

    let _writer = gate.lock().await;

    let now = Utc::now();
    db.transaction(|tx| {
        Box::pin(async move {
            let existing = sqlx::query_as::<_, PriceEntry>(
                "SELECT id, item_name, category, price_per_unit, unit, last_set_at
                 FROM price_entries WHERE id = ?",
            )
            .bind(entry_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("price entry {}", entry_id)))?;

            let category = cmd.category.unwrap_or(existing.category);
            let unit = cmd.unit.unwrap_or(existing.unit);

            sqlx::query(UPDATE_ENTRY)
                .bind(&category)
                .bind(cmd.price_per_unit)
                .bind(&unit)
                .bind(now)
                .bind(entry_id)
                .execute(&mut **tx)
                .await?;

            Ok(PriceEntry {
                id: existing.id,
                item_name: existing.item_name,
                category,
                price_per_unit: cmd.price_per_unit,
                unit,
                last_set_at: now,
            })
        })
    })
    .await
}

// endregion: --- Reconciliation

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(name: &str, price: f64) -> ProposedPrice {
        ProposedPrice {
            item_name: name.to_string(),
            price_per_unit: price,
            category: None,
            unit: None,
        }
    }

    #[test]
    fn batch_with_negative_price_is_rejected_with_name() {
        let proposals = vec![proposal("A", 10.0), proposal("B", -5.0)];
        match validate_proposals(&proposals) {
            Err(AppError::InvalidPrice { name, value }) => {
                assert_eq!(name, "B");
                assert_eq!(value, -5.0);
            }
            other => panic!("expected InvalidPrice, got {:?}", other),
        }
    }

    #[test]
    fn zero_and_non_finite_prices_are_rejected() {
        assert!(validate_proposals(&[proposal("A", 0.0)]).is_err());
        assert!(validate_proposals(&[proposal("A", f64::NAN)]).is_err());
        assert!(validate_proposals(&[proposal("A", f64::INFINITY)]).is_err());
    }

    #[test]
    fn all_positive_prices_pass() {
        let proposals = vec![proposal("A", 10.0), proposal("B", 0.01)];
        assert!(validate_proposals(&proposals).is_ok());
    }
}

// endregion: --- Tests
