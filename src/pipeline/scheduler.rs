use crate::core::account::AccountId;
use crate::error::EngineError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Cooperative cancellation handle for a forecasting run.
///
/// The pipeline checks the token between stages and between
/// per-category fits; a cancelled run publishes nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that cancels itself once `budget` has elapsed.
    pub fn with_deadline(budget: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + budget),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Error out of the current run if cancelled.
    pub fn check(&self, account: &AccountId) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled {
                account: account.clone(),
            })
        } else {
            Ok(())
        }
    }
}

/// Per-account mutual exclusion for forecasting runs.
///
/// Runs for different accounts operate on disjoint data and proceed in
/// parallel; runs for the same account are serialized by holding its
/// lease. There is deliberately no global lock.
#[derive(Debug, Default)]
pub struct AccountLease {
    held: Mutex<HashSet<AccountId>>,
    released: Condvar,
}

impl AccountLease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the account's lease is free or `timeout` elapses.
    /// Returns `None` on timeout.
    pub fn acquire(&self, account: &AccountId, timeout: Duration) -> Option<LeaseGuard<'_>> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        while held.contains(account) {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, wait) = self
                .released
                .wait_timeout(held, remaining)
                .unwrap_or_else(|e| e.into_inner());
            held = guard;
            if wait.timed_out() && held.contains(account) {
                return None;
            }
        }
        held.insert(account.clone());
        Some(LeaseGuard {
            lease: self,
            account: account.clone(),
        })
    }

    /// Whether a run currently holds the account's lease.
    pub fn is_held(&self, account: &AccountId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(account)
    }
}

/// Holds one account's lease; released on drop.
#[derive(Debug)]
pub struct LeaseGuard<'a> {
    lease: &'a AccountLease,
    account: AccountId,
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .lease
            .held
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        held.remove(&self.account);
        self.lease.released.notify_all();
    }
}
