//! Per-seller mutual exclusion.
//!
//! Every read-validate-mutate-persist cycle on a seller's inventory or orders
//! runs while holding that seller's lock. Sellers never contend with each other.
//! Acquisition is bounded: the registry polls with exponential backoff and gives
//! up once `max_wait` has elapsed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;

use siftledger_core::SellerId;

/// Bounded-wait policy for seller lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Give up after this long.
    pub max_wait: Duration,
    /// First pause between attempts.
    pub initial_backoff: Duration,
    /// Cap on the pause between attempts.
    pub max_backoff: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(2),
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(100),
        }
    }
}

impl LockPolicy {
    /// Pause before attempt `attempt` (1-indexed): initial * 2^(attempt-1), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let pow = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(pow)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("seller {seller_id} is busy (waited {waited_ms} ms)")]
    Timeout { seller_id: SellerId, waited_ms: u64 },
}

/// Held for the duration of one seller-scoped operation.
#[derive(Debug)]
pub struct SellerGuard {
    seller_id: SellerId,
    _guard: OwnedMutexGuard<()>,
}

impl SellerGuard {
    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }
}

/// Registry of one async lock per seller.
#[derive(Debug, Default)]
pub struct SellerLocks {
    policy: LockPolicy,
    locks: Mutex<HashMap<SellerId, Arc<AsyncMutex<()>>>>,
}

impl SellerLocks {
    pub fn new(policy: LockPolicy) -> Self {
        Self {
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, seller_id: SellerId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(seller_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquire the seller's lock, retrying with backoff until `max_wait`.
    pub async fn acquire(&self, seller_id: SellerId) -> Result<SellerGuard, LockError> {
        let lock = self.lock_for(seller_id);
        let started = Instant::now();
        let deadline = started + self.policy.max_wait;
        let mut attempt = 0u32;

        loop {
            if let Ok(guard) = lock.clone().try_lock_owned() {
                return Ok(SellerGuard {
                    seller_id,
                    _guard: guard,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                let waited_ms = now.duration_since(started).as_millis() as u64;
                tracing::warn!(seller_id = %seller_id, waited_ms, "seller lock wait exceeded");
                return Err(LockError::Timeout {
                    seller_id,
                    waited_ms,
                });
            }

            attempt += 1;
            let pause = self.policy.backoff(attempt).min(deadline - now);
            tracing::debug!(seller_id = %seller_id, attempt, pause_ms = pause.as_millis() as u64, "seller lock busy");
            tokio::time::sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_policy() -> LockPolicy {
        LockPolicy {
            max_wait: Duration::from_millis(50),
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = quick_policy();
        assert_eq!(policy.backoff(1), Duration::from_millis(1));
        assert_eq!(policy.backoff(2), Duration::from_millis(2));
        assert_eq!(policy.backoff(4), Duration::from_millis(8));
        assert_eq!(policy.backoff(5), Duration::from_millis(10));
        assert_eq!(policy.backoff(40), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn second_acquire_times_out_while_held() {
        let locks = SellerLocks::new(quick_policy());
        let seller = SellerId::new();

        let _held = locks.acquire(seller).await.unwrap();
        let err = locks.acquire(seller).await.unwrap_err();

        assert!(matches!(err, LockError::Timeout { seller_id, .. } if seller_id == seller));
    }

    #[tokio::test]
    async fn lock_is_released_on_drop() {
        let locks = SellerLocks::new(quick_policy());
        let seller = SellerId::new();

        drop(locks.acquire(seller).await.unwrap());
        let guard = locks.acquire(seller).await.unwrap();
        assert_eq!(guard.seller_id(), seller);
    }

    #[tokio::test]
    async fn different_sellers_do_not_contend() {
        let locks = SellerLocks::new(quick_policy());

        let _a = locks.acquire(SellerId::new()).await.unwrap();
        let _b = locks.acquire(SellerId::new()).await.unwrap();
    }

    #[tokio::test]
    async fn waiter_gets_the_lock_once_released() {
        let locks = Arc::new(SellerLocks::new(LockPolicy {
            max_wait: Duration::from_secs(2),
            ..quick_policy()
        }));
        let seller = SellerId::new();
        let held = locks.acquire(seller).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(seller).await.map(|g| g.seller_id()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        assert_eq!(waiter.await.unwrap(), Ok(seller));
    }
}
