/// Daily reset scheduler.
/// Once per day, anchored to local midnight, the merged market view must be
/// recomputed from a fresh read of the listing store. The scheduler is the
/// only writer of the reset_window record; everything else reads it. A
/// reset refreshes data only, it never clears price entries.
// region:    --- Imports
use crate::aggregate;
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::query;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};
// endregion: --- Imports

// region:    --- Seams

/// Wall clock, injectable so tests can cross a day boundary without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// The market state the scheduler refreshes and the window record it owns.
#[async_trait]
pub trait MarketView: Send + Sync {
    /// Re-read the listing store and recompute the merged view. Returns the
    /// number of commodity rows for logging.
    async fn refresh(&self) -> Result<usize, AppError>;
    async fn load_next_reset(&self) -> Result<Option<DateTime<Utc>>, AppError>;
    async fn store_next_reset(&self, at: DateTime<Utc>) -> Result<(), AppError>;
}

/// Database-backed market view used in production.
pub struct LiveMarketView {
    db: Arc<DatabaseManager>,
}

impl LiveMarketView {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MarketView for LiveMarketView {
    async fn refresh(&self) -> Result<usize, AppError> {
        let listings = query::handlers::get_all_listings(&self.db).await?;
        let rows = aggregate::aggregate(&listings);
        Ok(rows.len())
    }

    async fn load_next_reset(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        query::handlers::get_reset_window(&self.db).await
    }

    async fn store_next_reset(&self, at: DateTime<Utc>) -> Result<(), AppError> {
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query(
                        "INSERT INTO reset_window (id, next_reset_at) VALUES (1, ?)
                         ON CONFLICT (id) DO UPDATE SET next_reset_at = excluded.next_reset_at",
                    )
                    .bind(at)
                    .execute(&mut **tx)
                    .await?;
                    Ok(())
                })
            })
            .await
    }
}

// endregion: --- Seams

// region:    --- Reset Scheduler

/// How often the deadline is checked.
const TICK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    /// Counting down to the next local midnight.
    Waiting { next_reset_at: DateTime<Utc> },
    /// The deadline passed but the refresh has not succeeded yet; retried
    /// on every tick so a reset is never silently skipped.
    Resetting,
}

pub struct ResetScheduler {
    view: Arc<dyn MarketView>,
    clock: Arc<dyn Clock>,
    state: SchedulerState,
}

impl ResetScheduler {
    pub fn new(view: Arc<dyn MarketView>, clock: Arc<dyn Clock>) -> Self {
        Self {
            view,
            clock,
            state: SchedulerState::Resetting,
        }
    }

    /// Adopt a persisted window that is still in the future, otherwise
    /// compute and persist a fresh one.
    pub async fn initialize(&mut self) -> Result<(), AppError> {
        let now = self.clock.now();
        let next = match self.view.load_next_reset().await? {
            Some(at) if at > now.with_timezone(&Utc) => at,
            _ => {
                let next = next_reset_after(now);
                self.view.store_next_reset(next).await?;
                next
            }
        };
        info!("{:<12} --> next market reset at {}", "Scheduler", next);
        self.state = SchedulerState::Waiting { next_reset_at: next };
        Ok(())
    }

    /// Spawn the periodic check.
    pub fn start(mut self) {
        tokio::spawn(async move {
            let mut interval = interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        });
    }

    /// One deadline check. Transitions Waiting -> Resetting when the window
    /// has elapsed; the window only advances after a successful refresh and
    /// window write, so a transient failure is retried on the next tick.
    async fn tick(&mut self) {
        let now = self.clock.now();
        let due = match self.state {
            SchedulerState::Waiting { next_reset_at } => now.with_timezone(&Utc) >= next_reset_at,
            SchedulerState::Resetting => true,
        };
        if !due {
            debug!("{:<12} --> window still open, nothing to do", "Scheduler");
            return;
        }

        self.state = SchedulerState::Resetting;

        let rows = match self.view.refresh().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(
                    "{:<12} --> market refresh failed, retrying next tick: {}",
                    "Scheduler", e
                );
                return;
            }
        };

        let next = next_reset_after(now);
        if let Err(e) = self.view.store_next_reset(next).await {
            error!(
                "{:<12} --> failed to persist reset window, retrying next tick: {}",
                "Scheduler", e
            );
            return;
        }

        info!(
            "{:<12} --> market refreshed ({} commodities), next reset at {}",
            "Scheduler", rows, next
        );
        self.state = SchedulerState::Waiting { next_reset_at: next };
    }
}

/// The next local-midnight instant strictly after `now`. Falls back to
/// `now + 24h` when that instant does not exist in the local zone.
fn next_reset_after(now: DateTime<Local>) -> DateTime<Utc> {
    let fallback = now + chrono::Duration::hours(24);
    now.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .unwrap_or(fallback)
        .with_timezone(&Utc)
}

// endregion: --- Reset Scheduler

// region:    --- Tests


// endregion: --- Tests
