//! # Bot Polling Sweep
//!
//! Fixed-interval background task scanning all non-terminal bots and
//! reconciling each against the remote API. Bots are processed oldest
//! updated first and strictly sequentially within a tick; the remote API
//! enforces per-account rate limits and sequential polling avoids bursts.

use std::sync::Arc;

use metrics::{counter, gauge, histogram};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::bots::BotLifecycle;
use crate::config::PollingConfig;
use crate::error::CoreError;
use crate::models::ACTIVE_BOT_STATUSES;
use crate::models::recall_bot::{Column as BotColumn, Entity as RecallBot};

/// Background bot-polling service.
pub struct BotPollSweep {
    db: Arc<DatabaseConnection>,
    lifecycle: Arc<BotLifecycle>,
    config: PollingConfig,
}

#[derive(Debug, Default)]
struct TickStats {
    bots_polled: u64,
    transitions: u64,
    poll_errors: u64,
}

impl BotPollSweep {
    pub fn new(
        db: Arc<DatabaseConnection>,
        lifecycle: Arc<BotLifecycle>,
        config: PollingConfig,
    ) -> Self {
        Self {
            db,
            lifecycle,
            config,
        }
    }

    /// Run the polling loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), CoreError> {
        info!("Starting bot polling sweep");
        let tick_interval = TokioDuration::from_secs(self.config.tick_interval_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Bot polling sweep shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.tick().await {
                        error!(error = ?err, "Bot polling tick failed");
                    }
                    let elapsed = tick_started.elapsed();
                    histogram!("bot_poll_tick_duration_ms")
                        .record(elapsed.as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Bot polling sweep stopped");
        Ok(())
    }

    /// Poll one bounded batch of non-terminal bots.
    pub async fn tick(&self) -> Result<(), CoreError> {
        let mut stats = TickStats::default();

        let backlog = RecallBot::find()
            .filter(BotColumn::Status.is_in(ACTIVE_BOT_STATUSES.to_vec()))
            .count(self.db.as_ref())
            .await?;
        gauge!("bot_poll_backlog_gauge").set(backlog as f64);

        let bots = RecallBot::find()
            .filter(BotColumn::Status.is_in(ACTIVE_BOT_STATUSES.to_vec()))
            .order_by_asc(BotColumn::UpdatedAt)
            .limit(self.config.batch_size)
            .all(self.db.as_ref())
            .await?;

        for bot in bots {
            stats.bots_polled += 1;
            match self.lifecycle.poll_bot_status(&bot).await {
                Ok(Some(_)) => stats.transitions += 1,
                Ok(None) => {}
                // Transport failures leave the stored state untouched so the
                // next sweep retries.
                Err(err) => {
                    stats.poll_errors += 1;
                    counter!("bot_poll_errors_total").increment(1);
                    error!(bot_id = %bot.id, error = ?err, "Failed to poll bot");
                }
            }
        }

        debug!(
            polled = stats.bots_polled,
            transitions = stats.transitions,
            errors = stats.poll_errors,
            backlog = backlog,
            "Bot polling tick completed"
        );

        Ok(())
    }
}
