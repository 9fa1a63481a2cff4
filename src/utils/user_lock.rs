use moka::future::Cache;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-user admission locks.
///
/// Event admission is a read-decide-write cycle over the user's history,
/// so two simultaneous check-ins for the same user would otherwise both
/// read "no open session" and both be admitted. Holding this lock across
/// the cycle serializes admissions per user; different users never
/// contend. Entries expire after idling so the map does not grow with the
/// user table.
static USER_LOCKS: Lazy<Cache<u64, Arc<Mutex<()>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_idle(Duration::from_secs(600))
        .build()
});

/// Acquire the admission lock for one user. The guard must be held until
/// the new event row is durably written.
pub async fn acquire(user_id: u64) -> OwnedMutexGuard<()> {
    let lock = USER_LOCKS
        .get_with(user_id, async { Arc::new(Mutex::new(())) })
        .await;
    lock.lock_owned().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_user_serializes() {
        let guard = acquire(1).await;
        // a second acquire for the same user must not succeed while held
        assert!(
            tokio::time::timeout(Duration::from_millis(50), acquire(1))
                .await
                .is_err()
        );
        drop(guard);
        // and must succeed once released
        let _ = acquire(1).await;
    }

    #[tokio::test]
    async fn different_users_do_not_contend() {
        let _a = acquire(10).await;
        let _b = tokio::time::timeout(Duration::from_millis(50), acquire(11))
            .await
            .expect("other user's lock must be free");
    }
}
