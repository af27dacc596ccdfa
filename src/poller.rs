//! Cancellable periodic polling
//!
//! A [`Poller`] runs a fetch closure on a fixed interval in a background
//! task and forwards every successful result through a channel until the
//! caller-supplied predicate reports the result as settled. Dropping the
//! [`PollHandle`] cancels the task, including a fetch that is in flight.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Fixed-interval poller
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    period: Duration,
}

impl Poller {
    /// Create a poller ticking every `period`
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Interval between fetches
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start polling
    ///
    /// The first fetch happens one period after the call. Fetch errors are
    /// logged and polling continues. The task ends after forwarding a
    /// settled result, when the handle is dropped or cancelled, or when the
    /// receiving side is gone.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use justice_sync::poller::Poller;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let counter = Arc::new(AtomicU32::new(0));
    /// let mut handle = Poller::new(Duration::from_millis(5)).spawn(
    ///     move || {
    ///         let counter = counter.clone();
    ///         async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
    ///     },
    ///     |n: &u32| *n >= 3,
    /// );
    ///
    /// let mut last = 0;
    /// while let Some(n) = handle.next().await {
    ///     last = n;
    /// }
    /// assert_eq!(last, 3);
    /// # }
    /// ```
    pub fn spawn<T, F, Fut, S>(&self, mut fetch: F, is_settled: S) -> PollHandle<T>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        S: Fn(&T) -> bool + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let cancellation = token.clone();
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = cancellation.cancelled() => break,

                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    biased;

                    _ = cancellation.cancelled() => break,

                    result = fetch() => result,
                };

                match result {
                    Ok(value) => {
                        let settled = is_settled(&value);
                        if tx.send(value).is_err() {
                            break;
                        }
                        if settled {
                            tracing::debug!("Polling settled");
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("Poll failed, retrying next tick: {:#}", e),
                }
            }
        });

        PollHandle {
            rx,
            token,
            task: Some(task),
        }
    }
}

/// Receiving end of a running [`Poller`]
///
/// Cancels the poll task when dropped.
#[derive(Debug)]
pub struct PollHandle<T> {
    rx: mpsc::UnboundedReceiver<T>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T> PollHandle<T> {
    /// Next polled result; `None` once polling has stopped
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stop polling
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`cancel`](Self::cancel) was called or the handle dropped
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the poll task to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Poll task ended abnormally: {}", e);
            }
        }
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
