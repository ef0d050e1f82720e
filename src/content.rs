//! # AI Content Dispatch
//!
//! Fire-and-forget hand-off of completed meetings to the AI-content
//! collaborator. Dispatch goes through an in-process channel with a worker
//! task so a failed send is observable in the logs instead of silently
//! dropped, and generation failures never touch bot or event state.

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors surfaced by the content collaborator.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content service returned status {status}")]
    Http { status: u16 },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Queueing interface owned by the AI-content collaborator.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn queue_meeting_generation(&self, event_id: Uuid) -> Result<(), ContentError>;
}

/// HTTP-backed generator posting to the collaborator service.
pub struct HttpContentService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpContentService {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            endpoint,
        }
    }
}

#[async_trait]
impl ContentGenerator for HttpContentService {
    async fn queue_meeting_generation(&self, event_id: Uuid) -> Result<(), ContentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "event_id": event_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ContentError::Http {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

/// Log-only generator for local profiles with no endpoint configured.
pub struct LogContentService;

#[async_trait]
impl ContentGenerator for LogContentService {
    async fn queue_meeting_generation(&self, event_id: Uuid) -> Result<(), ContentError> {
        debug!(event_id = %event_id, "Meeting generation queued (log service)");
        Ok(())
    }
}

/// Channel-backed dispatcher in front of a [`ContentGenerator`].
#[derive(Clone)]
pub struct ContentQueue {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl ContentQueue {
    /// Spawn the worker task draining the queue into the generator.
    pub fn spawn(generator: Arc<dyn ContentGenerator>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Uuid>();

        tokio::spawn(async move {
            while let Some(event_id) = rx.recv().await {
                match generator.queue_meeting_generation(event_id).await {
                    Ok(()) => {
                        counter!("content_generation_dispatched_total").increment(1);
                        debug!(event_id = %event_id, "Dispatched meeting generation");
                    }
                    Err(err) => {
                        counter!("content_generation_failed_total").increment(1);
                        warn!(
                            event_id = %event_id,
                            error = %err,
                            "Meeting generation dispatch failed"
                        );
                    }
                }
            }
        });

        Self { tx }
    }

    /// Enqueue an event for generation. A closed queue is logged, never
    /// raised — callers treat this as fire-and-forget.
    pub fn dispatch(&self, event_id: Uuid) {
        if self.tx.send(event_id).is_err() {
            warn!(event_id = %event_id, "Content queue closed; generation request dropped");
        }
    }
}
