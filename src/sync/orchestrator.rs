//! # Sync Orchestrator
//!
//! Drives per-account calendar sync on three triggers: the scheduled
//! sweep, a manual user request, and the post-OAuth callback. Accounts
//! sync fully in parallel with isolated outcomes; a per-account lock set
//! skips (never blocks) concurrent triggers for the same account, and a
//! whole-sweep single-flight flag collapses overlapping scheduled ticks.

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::bots::BotLifecycle;
use crate::config::SyncConfig;
use crate::crypto::{self, CryptoKey};
use crate::error::CoreError;
use crate::models::connected_account::{
    ActiveModel as AccountActiveModel, Column as AccountColumn, Entity as ConnectedAccount,
    Model as AccountModel,
};
use crate::normalize::normalize_event;
use crate::providers::{CalendarProvider, EventWindow, Registry};
use crate::repositories::PreferenceRepository;
use crate::sync::locks::{AccountLocks, SweepFlag};
use crate::sync::upsert::{EventStore, UpsertOutcome};

/// Outcome summary of a batch sync.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub total: usize,
    pub synced: usize,
    pub skipped: usize,
    pub failed: Vec<AccountFailure>,
}

/// One failed account in a batch sync.
#[derive(Debug)]
pub struct AccountFailure {
    pub account_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOutcome {
    Synced,
    Skipped,
}

/// Per-account sync driver.
pub struct SyncOrchestrator {
    db: Arc<DatabaseConnection>,
    registry: Arc<Registry>,
    store: Arc<EventStore>,
    bots: Arc<BotLifecycle>,
    preferences: PreferenceRepository,
    locks: Arc<AccountLocks>,
    sweep_flag: Arc<SweepFlag>,
    crypto_key: Option<CryptoKey>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<DatabaseConnection>,
        registry: Arc<Registry>,
        store: Arc<EventStore>,
        bots: Arc<BotLifecycle>,
        preferences: PreferenceRepository,
        crypto_key: Option<CryptoKey>,
        config: SyncConfig,
    ) -> Self {
        Self {
            db,
            registry,
            store,
            bots,
            preferences,
            locks: Arc::new(AccountLocks::new()),
            sweep_flag: Arc::new(SweepFlag::new()),
            crypto_key,
            config,
        }
    }

    /// Run the scheduled sweep loop until the shutdown token fires. Each
    /// sleep carries a small jitter so multiple deployments do not tick in
    /// lockstep against the provider APIs.
    #[instrument(skip_all)]
    pub async fn run_sweep(self: Arc<Self>, shutdown: CancellationToken) -> Result<(), CoreError> {
        info!("Starting account sync sweep");

        loop {
            let jitter = sample_jitter_seconds(self.config.tick_interval_seconds);
            let tick_interval =
                TokioDuration::from_secs(self.config.tick_interval_seconds + jitter);

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Account sync sweep shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    match self.sync_due_accounts().await {
                        Ok(summary) => {
                            debug!(
                                total = summary.total,
                                synced = summary.synced,
                                skipped = summary.skipped,
                                failed = summary.failed.len(),
                                "Account sync tick completed"
                            );
                        }
                        Err(err) => error!(error = ?err, "Account sync tick failed"),
                    }
                    let elapsed = tick_started.elapsed();
                    histogram!("account_sync_tick_duration_ms")
                        .record(elapsed.as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Account sync sweep stopped");
        Ok(())
    }

    /// Sync every account that is due (never synced, or last synced more
    /// than one sweep interval ago). Overlapping scheduled ticks collapse
    /// into one via the whole-sweep flag.
    pub async fn sync_due_accounts(&self) -> Result<SyncSummary, CoreError> {
        if !self.sweep_flag.try_begin() {
            debug!("Account sync sweep already in flight; skipping tick");
            return Ok(SyncSummary::default());
        }
        let flag = Arc::clone(&self.sweep_flag);
        let _in_flight = scopeguard::guard((), move |()| flag.end());

        let now = Utc::now();
        let cutoff = now - Duration::seconds(self.config.tick_interval_seconds as i64);
        let accounts = ConnectedAccount::find()
            .filter(
                Condition::any()
                    .add(AccountColumn::LastSyncedAt.is_null())
                    .add(AccountColumn::LastSyncedAt.lte(cutoff)),
            )
            .all(self.db.as_ref())
            .await?;

        Ok(self.sync_accounts(accounts).await)
    }

    /// Sync all of one user's accounts, returning the per-account summary.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn sync_user_accounts(&self, user_id: Uuid) -> Result<SyncSummary, CoreError> {
        let accounts = ConnectedAccount::find()
            .filter(AccountColumn::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await?;

        Ok(self.sync_accounts(accounts).await)
    }

    /// Sync a single account after an OAuth callback. Fire-and-forget:
    /// failures are logged, never returned.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub async fn sync_account_by_id(&self, account_id: Uuid) {
        let account = match ConnectedAccount::find_by_id(account_id)
            .one(self.db.as_ref())
            .await
        {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!("Connected account not found for callback sync");
                return;
            }
            Err(err) => {
                error!(error = ?err, "Failed to load connected account for callback sync");
                return;
            }
        };

        match self.sync_account(account).await {
            Ok(SyncOutcome::Synced) => debug!("Callback sync completed"),
            Ok(SyncOutcome::Skipped) => debug!("Callback sync skipped; account already syncing"),
            Err(err) => error!(error = ?err, "Callback sync failed"),
        }
    }

    /// Toggle the notetaker flag and apply the resulting bot decision.
    /// Remote failures surface to the caller while the local flag keeps
    /// the decision.
    pub async fn toggle_notetaker(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        enabled: bool,
    ) -> Result<UpsertOutcome, CoreError> {
        let outcome = self.store.toggle_notetaker(event_id, user_id, enabled).await?;

        if outcome.should_schedule_bot {
            self.bots.ensure_bot_scheduled(&outcome.event).await?;
        } else if outcome.should_cancel_bot {
            self.bots.cancel_bot_for_event(outcome.event.id).await?;
        }

        Ok(outcome)
    }

    /// Fan the accounts out as independent units of work; one account's
    /// failure never aborts its siblings.
    async fn sync_accounts(&self, accounts: Vec<AccountModel>) -> SyncSummary {
        let mut summary = SyncSummary {
            total: accounts.len(),
            ..Default::default()
        };

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(accounts.len());

        for account in accounts {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let account_id = account.id;

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire().await;
                orchestrator.sync_account(account).await
            });
            handles.push((account_id, handle));
        }

        for (account_id, handle) in handles {
            match handle.await {
                Ok(Ok(SyncOutcome::Synced)) => summary.synced += 1,
                Ok(Ok(SyncOutcome::Skipped)) => summary.skipped += 1,
                Ok(Err(err)) => {
                    error!(account_id = %account_id, error = ?err, "Account sync failed");
                    summary.failed.push(AccountFailure {
                        account_id,
                        error: err.to_string(),
                    });
                }
                Err(err) => {
                    error!(account_id = %account_id, error = ?err, "Account sync task panicked");
                    summary.failed.push(AccountFailure {
                        account_id,
                        error: "sync task panicked".to_string(),
                    });
                }
            }
        }

        counter!("account_sync_synced_total").increment(summary.synced as u64);
        counter!("account_sync_skipped_total").increment(summary.skipped as u64);
        counter!("account_sync_failed_total").increment(summary.failed.len() as u64);

        summary
    }

    /// One account's sync unit: lock, refresh, fetch, normalize, upsert,
    /// apply bot decisions, stamp. The lock guard releases on every exit
    /// path.
    #[instrument(skip_all, fields(account_id = %account.id, provider = %account.provider))]
    async fn sync_account(&self, account: AccountModel) -> Result<SyncOutcome, CoreError> {
        let Some(_lock) = self.locks.try_acquire(account.id) else {
            info!("Account already syncing; skipping");
            return Ok(SyncOutcome::Skipped);
        };

        let now = Utc::now();
        let provider = self
            .registry
            .get(&account.provider)
            .map_err(|err| CoreError::internal(err.to_string()))?;

        let (account, access_token) = self
            .ensure_fresh_token(provider.as_ref(), account, now)
            .await?;

        let window = EventWindow::starting_at(now, self.config.window_days);
        let mut raw_events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = provider
                .list_events(&access_token, &window, page_token.as_deref())
                .await?;
            raw_events.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        let inputs: Vec<_> = raw_events.iter().filter_map(normalize_event).collect();
        debug!(
            fetched = raw_events.len(),
            normalized = inputs.len(),
            "Fetched calendar window"
        );

        let preferences = self.preferences.resolve(account.user_id).await?;
        let outcomes = self
            .store
            .upsert_events(
                account.user_id,
                account.id,
                &inputs,
                preferences.default_notetaker,
            )
            .await?;

        for outcome in &outcomes {
            // Bot-call failures are left for the next sweep to reconcile;
            // the account itself still counts as synced.
            if outcome.should_schedule_bot {
                if let Err(err) = self.bots.ensure_bot_scheduled(&outcome.event).await {
                    warn!(
                        event_id = %outcome.event.id,
                        error = %err,
                        "Failed to schedule bot during sync"
                    );
                }
            } else if outcome.should_cancel_bot {
                if let Err(err) = self.bots.cancel_bot_for_event(outcome.event.id).await {
                    warn!(
                        event_id = %outcome.event.id,
                        error = %err,
                        "Failed to cancel bot during sync"
                    );
                }
            }
        }

        AccountActiveModel {
            id: Set(account.id),
            last_synced_at: Set(Some(now.into())),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .update(self.db.as_ref())
        .await?;

        info!(events = outcomes.len(), "Account sync completed");
        Ok(SyncOutcome::Synced)
    }

    /// Refresh the access token when it is missing or expires within the
    /// configured buffer, persisting the new (encrypted) credentials.
    async fn ensure_fresh_token(
        &self,
        provider: &dyn CalendarProvider,
        account: AccountModel,
        now: DateTime<Utc>,
    ) -> Result<(AccountModel, String), CoreError> {
        let (access_token, refresh_token) = self.decode_tokens(&account)?;

        let expiring = account
            .expires_at
            .map(|expires| {
                expires.with_timezone(&Utc)
                    <= now + Duration::seconds(self.config.token_expiry_buffer_seconds)
            })
            .unwrap_or(false);

        if let Some(token) = access_token
            && !expiring
        {
            return Ok((account, token));
        }

        let refresh_token = refresh_token.ok_or_else(|| {
            CoreError::validation("connected account has no refresh token")
        })?;

        debug!("Refreshing access token");
        let refreshed = provider.refresh_tokens(&refresh_token).await?;

        // Providers that do not rotate the refresh token keep the old one.
        let next_refresh = refreshed
            .refresh_token
            .clone()
            .unwrap_or(refresh_token);

        let (access_ciphertext, refresh_ciphertext) =
            self.encode_tokens(&account, &refreshed.access_token, &next_refresh)?;

        let mut active: AccountActiveModel = account.into();
        active.access_token_ciphertext = Set(access_ciphertext);
        active.refresh_token_ciphertext = Set(refresh_ciphertext);
        active.expires_at = Set(refreshed.expires_at.map(Into::into));
        active.updated_at = Set(now.into());
        let account = active.update(self.db.as_ref()).await?;

        counter!("token_refresh_total").increment(1);
        info!("Access token refreshed");

        Ok((account, refreshed.access_token))
    }

    fn decode_tokens(
        &self,
        account: &AccountModel,
    ) -> Result<(Option<String>, Option<String>), CoreError> {
        match &self.crypto_key {
            Some(key) => crypto::decrypt_account_tokens(key, account)
                .map_err(|err| CoreError::internal(format!("token decryption failed: {err}"))),
            None => {
                let decode = |bytes: &Option<Vec<u8>>| {
                    bytes
                        .as_ref()
                        .map(|b| String::from_utf8(b.clone()))
                        .transpose()
                        .map_err(|err| {
                            CoreError::internal(format!("stored token is not UTF-8: {err}"))
                        })
                };
                Ok((
                    decode(&account.access_token_ciphertext)?,
                    decode(&account.refresh_token_ciphertext)?,
                ))
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn encode_tokens(
        &self,
        account: &AccountModel,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>), CoreError> {
        match &self.crypto_key {
            Some(key) => {
                crypto::encrypt_account_tokens(key, account, Some(access_token), Some(refresh_token))
                    .map_err(|err| CoreError::internal(format!("token encryption failed: {err}")))
            }
            None => Ok((
                Some(access_token.as_bytes().to_vec()),
                Some(refresh_token.as_bytes().to_vec()),
            )),
        }
    }
}

fn sample_jitter_seconds(tick_seconds: u64) -> u64 {
    let mut rng = rand::thread_rng();
    compute_jitter_seconds(tick_seconds, &mut rng)
}

/// Jitter up to 10% of the tick interval.
fn compute_jitter_seconds<R: rand::Rng + ?Sized>(tick_seconds: u64, rng: &mut R) -> u64 {
    let max_jitter = tick_seconds / 10;
    if max_jitter == 0 {
        return 0;
    }
    rng.gen_range(0..=max_jitter)
}

impl Clone for SyncOrchestrator {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            registry: self.registry.clone(),
            store: self.store.clone(),
            bots: self.bots.clone(),
            preferences: self.preferences.clone(),
            locks: self.locks.clone(),
            sweep_flag: self.sweep_flag.clone(),
            crypto_key: self.crypto_key.clone(),
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::recall::{BotDetail, CreatedBot, NewBot, RecallApi, RecallError};
    use crate::content::{ContentQueue, LogContentService};
    use crate::models::calendar_event::Entity as CalendarEvent;
    use crate::models::recall_bot::Entity as RecallBot;
    use crate::notify::{LogNotificationSink, LogRealtimeGateway, Notifier};
    use crate::providers::trait_::{EventPage, ProviderError, ProviderEvent, RefreshedTokens};
    use crate::providers::trait_::EventDateTime;
    use async_trait::async_trait;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, PaginatorTrait};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider serving canned pages and counting API calls.
    struct PagedProvider {
        pages: Vec<EventPage>,
        list_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
        fail_listing: bool,
    }

    impl PagedProvider {
        fn new(pages: Vec<EventPage>) -> Self {
            Self {
                pages,
                list_calls: AtomicUsize::new(0),
                refresh_calls: AtomicUsize::new(0),
                fail_listing: false,
            }
        }
    }

    #[async_trait]
    impl CalendarProvider for PagedProvider {
        async fn refresh_tokens(
            &self,
            _refresh_token: &str,
        ) -> Result<RefreshedTokens, ProviderError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            Ok(RefreshedTokens {
                access_token: "fresh-access".to_string(),
                refresh_token: Some("fresh-refresh".to_string()),
                expires_at: Some(Utc::now() + Duration::hours(1)),
            })
        }

        async fn list_events(
            &self,
            _access_token: &str,
            _window: &EventWindow,
            page_token: Option<&str>,
        ) -> Result<EventPage, ProviderError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_listing {
                return Err(ProviderError::Api {
                    status: 500,
                    message: "listing broke".to_string(),
                });
            }
            let index = page_token
                .map(|t| t.parse::<usize>().unwrap_or(0))
                .unwrap_or(0);
            Ok(self.pages.get(index).cloned().unwrap_or_default())
        }
    }

    struct CountingRecallApi {
        create_calls: AtomicUsize,
    }

    #[async_trait]
    impl RecallApi for CountingRecallApi {
        async fn create_bot(&self, _new_bot: NewBot) -> Result<CreatedBot, RecallError> {
            let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CreatedBot {
                id: format!("bot-{n}"),
            })
        }

        async fn fetch_bot(&self, bot_id: &str) -> Result<BotDetail, RecallError> {
            Ok(BotDetail {
                id: bot_id.to_string(),
                ..Default::default()
            })
        }

        async fn delete_bot(&self, _bot_id: &str) -> Result<(), RecallError> {
            Ok(())
        }
    }

    fn provider_event(id: &str, start_in_hours: i64, url: Option<&str>) -> ProviderEvent {
        let start = Utc::now() + Duration::hours(start_in_hours);
        ProviderEvent {
            id: Some(id.to_string()),
            summary: Some(format!("Event {id}")),
            location: url.map(str::to_string),
            start: Some(EventDateTime {
                date_time: Some(start),
                date: None,
            }),
            end: Some(EventDateTime {
                date_time: Some(start + Duration::hours(1)),
                date: None,
            }),
            ..Default::default()
        }
    }

    struct Harness {
        db: Arc<DatabaseConnection>,
        orchestrator: Arc<SyncOrchestrator>,
        provider: Arc<PagedProvider>,
        recall: Arc<CountingRecallApi>,
    }

    async fn harness_with_provider(provider: PagedProvider) -> Harness {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("create in-memory db");
        Migrator::up(&db, None).await.expect("apply migrations");
        let db = Arc::new(db);

        let provider = Arc::new(provider);
        let mut registry = Registry::new();
        registry.register("google", provider.clone());

        let notifier = Arc::new(Notifier::new(
            Arc::new(LogNotificationSink),
            Arc::new(LogRealtimeGateway),
        ));
        let store = Arc::new(EventStore::new(db.clone(), notifier));
        let preferences = PreferenceRepository::new(db.clone(), 2);
        let recall = Arc::new(CountingRecallApi {
            create_calls: AtomicUsize::new(0),
        });
        let bots = Arc::new(BotLifecycle::new(
            db.clone(),
            recall.clone(),
            preferences.clone(),
            ContentQueue::spawn(Arc::new(LogContentService)),
        ));

        let orchestrator = Arc::new(SyncOrchestrator::new(
            db.clone(),
            Arc::new(registry),
            store,
            bots,
            preferences,
            None,
            SyncConfig::default(),
        ));

        Harness {
            db,
            orchestrator,
            provider,
            recall,
        }
    }

    async fn insert_account(
        db: &DatabaseConnection,
        user_id: Uuid,
        expires_in: Option<Duration>,
    ) -> AccountModel {
        let id = Uuid::new_v4();
        let now = Utc::now();
        AccountActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            provider: Set("google".to_string()),
            provider_account_id: Set(id.to_string()),
            access_token_ciphertext: Set(Some(b"stored-access".to_vec())),
            refresh_token_ciphertext: Set(Some(b"stored-refresh".to_vec())),
            expires_at: Set(expires_in.map(|d| (now + d).into())),
            last_synced_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await
        .expect("insert account")
    }

    #[tokio::test]
    async fn full_sync_persists_events_and_schedules_bots() {
        let h = harness_with_provider(PagedProvider::new(vec![
            EventPage {
                items: vec![
                    provider_event("e1", 2, Some("https://zoom.us/j/1")),
                    provider_event("e2", 3, None),
                ],
                next_page_token: Some("1".to_string()),
            },
            EventPage {
                items: vec![provider_event("e3", 4, Some("https://meet.google.com/abc-defg-hij"))],
                next_page_token: None,
            },
        ]))
        .await;

        let user_id = Uuid::new_v4();
        let account = insert_account(h.db.as_ref(), user_id, Some(Duration::hours(1))).await;

        let summary = h
            .orchestrator
            .sync_user_accounts(user_id)
            .await
            .expect("sync");

        assert_eq!(summary.total, 1);
        assert_eq!(summary.synced, 1);
        assert!(summary.failed.is_empty());

        // Both pages were fetched and accumulated.
        assert_eq!(h.provider.list_calls.load(Ordering::SeqCst), 2);
        let events = CalendarEvent::find().count(h.db.as_ref()).await.expect("count");
        assert_eq!(events, 3);

        // Only the two events with meeting URLs got bots.
        assert_eq!(h.recall.create_calls.load(Ordering::SeqCst), 2);
        let bots = RecallBot::find().count(h.db.as_ref()).await.expect("count");
        assert_eq!(bots, 2);

        // Token was still valid, so no refresh happened.
        assert_eq!(h.provider.refresh_calls.load(Ordering::SeqCst), 0);

        let stamped = ConnectedAccount::find_by_id(account.id)
            .one(h.db.as_ref())
            .await
            .expect("query")
            .expect("row");
        assert!(stamped.last_synced_at.is_some());
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed_and_persisted() {
        let h = harness_with_provider(PagedProvider::new(vec![EventPage::default()])).await;
        let user_id = Uuid::new_v4();
        // Expires inside the 60-second buffer.
        let account = insert_account(h.db.as_ref(), user_id, Some(Duration::seconds(30))).await;

        let summary = h
            .orchestrator
            .sync_user_accounts(user_id)
            .await
            .expect("sync");
        assert_eq!(summary.synced, 1);
        assert_eq!(h.provider.refresh_calls.load(Ordering::SeqCst), 1);

        let stored = ConnectedAccount::find_by_id(account.id)
            .one(h.db.as_ref())
            .await
            .expect("query")
            .expect("row");
        assert_eq!(
            stored.access_token_ciphertext.as_deref(),
            Some(b"fresh-access".as_slice())
        );
        assert_eq!(
            stored.refresh_token_ciphertext.as_deref(),
            Some(b"fresh-refresh".as_slice())
        );
    }

    #[tokio::test]
    async fn missing_access_token_forces_refresh() {
        let h = harness_with_provider(PagedProvider::new(vec![EventPage::default()])).await;
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let id = Uuid::new_v4();
        AccountActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            provider: Set("google".to_string()),
            provider_account_id: Set(id.to_string()),
            access_token_ciphertext: Set(None),
            refresh_token_ciphertext: Set(Some(b"stored-refresh".to_vec())),
            expires_at: Set(None),
            last_synced_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(h.db.as_ref())
        .await
        .expect("insert account");

        let summary = h
            .orchestrator
            .sync_user_accounts(user_id)
            .await
            .expect("sync");
        assert_eq!(summary.synced, 1);
        assert_eq!(h.provider.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn locked_account_is_skipped_with_zero_provider_calls() {
        let h = harness_with_provider(PagedProvider::new(vec![EventPage::default()])).await;
        let user_id = Uuid::new_v4();
        let account = insert_account(h.db.as_ref(), user_id, Some(Duration::hours(1))).await;

        // Simulate a concurrent trigger holding the per-account lock.
        let _held = h
            .orchestrator
            .locks
            .try_acquire(account.id)
            .expect("acquire lock");

        let summary = h
            .orchestrator
            .sync_user_accounts(user_id)
            .await
            .expect("sync");

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.synced, 0);
        assert_eq!(
            h.provider.list_calls.load(Ordering::SeqCst),
            0,
            "skipped trigger performs no provider calls"
        );
    }

    #[tokio::test]
    async fn one_failing_account_does_not_abort_siblings() {
        let h = harness_with_provider(PagedProvider {
            pages: vec![EventPage::default()],
            list_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            fail_listing: true,
        })
        .await;

        let user_id = Uuid::new_v4();
        insert_account(h.db.as_ref(), user_id, Some(Duration::hours(1))).await;

        // Second account with a healthy provider under a different slug is
        // overkill here; instead both accounts share the failing provider
        // and we assert both failures are captured independently.
        insert_account(h.db.as_ref(), user_id, Some(Duration::hours(1))).await;

        let summary = h
            .orchestrator
            .sync_user_accounts(user_id)
            .await
            .expect("sync");
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed.len(), 2);
        for failure in &summary.failed {
            assert!(failure.error.contains("listing broke"), "{}", failure.error);
        }
    }

    #[tokio::test]
    async fn due_account_filter_skips_recently_synced() {
        let h = harness_with_provider(PagedProvider::new(vec![EventPage::default()])).await;
        let user_id = Uuid::new_v4();
        let account = insert_account(h.db.as_ref(), user_id, Some(Duration::hours(1))).await;

        // First sweep syncs the never-synced account.
        let first = h.orchestrator.sync_due_accounts().await.expect("sweep");
        assert_eq!(first.synced, 1);

        // Immediately after, the account is no longer due.
        let second = h.orchestrator.sync_due_accounts().await.expect("sweep");
        assert_eq!(second.total, 0);

        let stored = ConnectedAccount::find_by_id(account.id)
            .one(h.db.as_ref())
            .await
            .expect("query")
            .expect("row");
        assert!(stored.last_synced_at.is_some());
    }

    #[test]
    fn jitter_respects_bounds() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let jitter = compute_jitter_seconds(900, &mut rng);
            assert!(jitter <= 90);
        }
        assert_eq!(compute_jitter_seconds(5, &mut rng), 0);
    }

    #[tokio::test]
    async fn toggle_applies_bot_decision() {
        let h = harness_with_provider(PagedProvider::new(vec![EventPage {
            items: vec![provider_event("e1", 2, Some("https://zoom.us/j/1"))],
            next_page_token: None,
        }]))
        .await;

        let user_id = Uuid::new_v4();
        insert_account(h.db.as_ref(), user_id, Some(Duration::hours(1))).await;
        h.orchestrator
            .sync_user_accounts(user_id)
            .await
            .expect("sync");

        let event = CalendarEvent::find()
            .one(h.db.as_ref())
            .await
            .expect("query")
            .expect("event");
        assert!(event.notetaker_enabled);

        // Toggling off cancels the active bot.
        h.orchestrator
            .toggle_notetaker(event.id, user_id, false)
            .await
            .expect("toggle off");

        let bot = RecallBot::find()
            .one(h.db.as_ref())
            .await
            .expect("query")
            .expect("bot");
        assert_eq!(bot.status, "cancelled");
    }
}
