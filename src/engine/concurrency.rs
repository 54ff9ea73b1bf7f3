// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounds how many futures run at once when wrapped with [`ConcurrencyLimit::run`].
///
/// Parallel batch nodes build one per invocation. A parallel batch flow owns one
/// for its lifetime, so concurrent runs of the same flow share its permits.
/// Cloning shares the permits too. It is equally usable from caller code, e.g.
/// to throttle calls to a rate-limited API inside a node's execute phase:
///
/// ```
/// use nodeflow::engine::ConcurrencyLimit;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limit = ConcurrencyLimit::new(2);
/// let doubled = futures::future::join_all(
///     (0..5).map(|i| limit.run(async move { i * 2 })),
/// )
/// .await;
/// assert_eq!(doubled, vec![0, 2, 4, 6, 8]);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyLimit {
    semaphore: Option<Arc<Semaphore>>,
    limit: Option<usize>,
}

impl ConcurrencyLimit {
    /// At most `limit` futures at once; `0` is treated as `1`.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Some(Arc::new(Semaphore::new(limit))),
            limit: Some(limit),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Await `future` once a permit is free, holding the permit until it completes.
    pub async fn run<F: Future>(&self, future: F) -> F::Output {
        match &self.semaphore {
            Some(semaphore) => {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = semaphore.acquire().await.ok();
                future.await
            }
            None => future.await,
        }
    }
}

impl From<Option<usize>> for ConcurrencyLimit {
    fn from(limit: Option<usize>) -> Self {
        limit.map(Self::new).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_limit_caps_in_flight_futures() {
        let limit = ConcurrencyLimit::new(3);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (in_flight, peak) = (&in_flight, &peak);

        futures::future::join_all((0..10).map(|_| {
            limit.run(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
        }))
        .await;

        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_limit_means_one() {
        assert_eq!(ConcurrencyLimit::new(0).limit(), Some(1));
        assert_eq!(ConcurrencyLimit::from(None).limit(), None);
    }
}
