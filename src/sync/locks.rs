//! In-process sync locking
//!
//! Per-account mutual exclusion and the whole-sweep single-flight flag.
//! Both follow the same contract: a contended acquire skips immediately,
//! it never blocks or queues. The design assumes a single running instance;
//! multi-instance deployments would swap this for an externalized lock with
//! the same contract.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Set of account ids currently syncing.
#[derive(Default)]
pub struct AccountLocks {
    inner: Mutex<HashSet<Uuid>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the per-account lock. Returns `None` when another sync
    /// for the same account is already running; the caller skips the
    /// account outright.
    pub fn try_acquire(self: &Arc<Self>, account_id: Uuid) -> Option<AccountLockGuard> {
        let mut held = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !held.insert(account_id) {
            return None;
        }
        Some(AccountLockGuard {
            locks: Arc::clone(self),
            account_id,
        })
    }

    /// Whether an account currently holds its lock (primarily for tests).
    pub fn is_held(&self, account_id: Uuid) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&account_id)
    }

    fn release(&self, account_id: Uuid) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&account_id);
    }
}

/// Releases the per-account lock on drop, on every exit path.
pub struct AccountLockGuard {
    locks: Arc<AccountLocks>,
    account_id: Uuid,
}

impl Drop for AccountLockGuard {
    fn drop(&mut self) {
        self.locks.release(self.account_id);
    }
}

/// Whole-sweep single-flight flag; overlapping scheduled ticks collapse
/// into one.
#[derive(Default)]
pub struct SweepFlag(AtomicBool);

impl SweepFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the sweep in flight. Returns false when a sweep already runs.
    pub fn try_begin(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear the in-flight mark.
    pub fn end(&self) {
        self.0.store(false, Ordering::Release);
    }
}
