//! Time source for polling and output file naming.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Sleeps between polls and tells the time.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);

    /// Returns the current local time. Used for file names only.
    fn now(&self) -> DateTime<Local>;

    /// Returns a monotonic instant. Elapsed time and timeouts are measured
    /// with this, never with [`Clock::now`].
    fn instant(&self) -> Instant;
}

/// The real clock: `tokio::time::sleep` and `chrono::Local::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

#[async_trait]
impl<T: Clock + ?Sized> Clock for &T {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }

    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }

    fn instant(&self) -> Instant {
        (**self).instant()
    }
}
