//! # Sync Engine
//!
//! Per-account calendar sync: locking, token refresh, paginated fetch,
//! normalization, idempotent upsert with diff notifications, and the
//! schedule/cancel hand-off to the bot lifecycle engine.

pub mod locks;
pub mod orchestrator;
pub mod upsert;

pub use locks::{AccountLocks, SweepFlag};
pub use orchestrator::{SyncOrchestrator, SyncSummary};
pub use upsert::{EventStore, UpsertOutcome};
