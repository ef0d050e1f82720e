//! # Service Bootstrap
//!
//! Wires the database, providers, collaborators and the two background
//! loops (account sync sweep and bot polling sweep) together, and runs
//! them until shutdown.

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::bots::{BotLifecycle, BotPollSweep, RecallClient};
use crate::config::AppConfig;
use crate::content::{ContentGenerator, ContentQueue, HttpContentService, LogContentService};
use crate::crypto::CryptoKey;
use crate::db::init_pool;
use crate::notify::{
    HttpNotificationSink, HttpRealtimeGateway, LogNotificationSink, LogRealtimeGateway,
    NotificationSink, Notifier, RealtimeGateway,
};
use crate::providers::Registry;
use crate::repositories::PreferenceRepository;
use crate::sync::{EventStore, SyncOrchestrator};

/// Shared service wiring, also the entry point for the exposed operations
/// other layers call into.
pub struct App {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub store: Arc<EventStore>,
    pub bots: Arc<BotLifecycle>,
    pub sweep: BotPollSweep,
}

impl App {
    /// Build the full service graph from configuration.
    pub async fn build(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(init_pool(config).await?);
        Migrator::up(db.as_ref(), None).await?;

        let crypto_key = match &config.crypto_key {
            Some(bytes) => Some(CryptoKey::new(bytes.clone())?),
            None => None,
        };

        let registry = Arc::new(Registry::from_config(config));

        let sink: Arc<dyn NotificationSink> = match &config.notification_url {
            Some(url) => Arc::new(HttpNotificationSink::new(url.clone())),
            None => Arc::new(LogNotificationSink),
        };
        let gateway: Arc<dyn RealtimeGateway> = match &config.realtime_gateway_url {
            Some(url) => Arc::new(HttpRealtimeGateway::new(url.clone())),
            None => Arc::new(LogRealtimeGateway),
        };
        let notifier = Arc::new(Notifier::new(sink, gateway));

        let generator: Arc<dyn ContentGenerator> = match &config.content_service_url {
            Some(url) => Arc::new(HttpContentService::new(url.clone())),
            None => Arc::new(LogContentService),
        };
        let content = ContentQueue::spawn(generator);

        let preferences =
            PreferenceRepository::new(db.clone(), config.recall.default_lead_minutes);
        let store = Arc::new(EventStore::new(db.clone(), notifier));
        let bots = Arc::new(BotLifecycle::new(
            db.clone(),
            Arc::new(RecallClient::new(
                config.recall.api_base.clone(),
                config.recall.api_key.clone(),
            )),
            preferences.clone(),
            content,
        ));

        let orchestrator = Arc::new(SyncOrchestrator::new(
            db.clone(),
            registry,
            store.clone(),
            bots.clone(),
            preferences,
            crypto_key,
            config.sync.clone(),
        ));

        let sweep = BotPollSweep::new(db, bots.clone(), config.polling.clone());

        Ok(Self {
            orchestrator,
            store,
            bots,
            sweep,
        })
    }

    /// Run both background loops until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let shutdown = CancellationToken::new();

        let sync_handle = tokio::spawn({
            let orchestrator = self.orchestrator.clone();
            let shutdown = shutdown.clone();
            async move {
                if let Err(err) = orchestrator.run_sweep(shutdown).await {
                    error!(error = ?err, "Account sync sweep exited with error");
                }
            }
        });

        let poll_handle = tokio::spawn({
            let shutdown = shutdown.clone();
            let sweep = self.sweep;
            async move {
                if let Err(err) = sweep.run(shutdown).await {
                    error!(error = ?err, "Bot polling sweep exited with error");
                }
            }
        });

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        shutdown.cancel();

        let _ = sync_handle.await;
        let _ = poll_handle.await;

        Ok(())
    }
}
