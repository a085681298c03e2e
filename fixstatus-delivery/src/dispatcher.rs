/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Delivery dispatcher.
//!
//! A bounded `mpsc` queue feeds a single pump task. For every payload the
//! pump calls each ordered sink inline, in list order, and hands each
//! unordered sink to a `JoinSet` capped by a semaphore. The pump ends once
//! every [`DeliveryHandle`] is dropped and the queue is drained, after
//! waiting for outstanding unordered deliveries.

use crate::sink::Sink;
use bytes::Bytes;
use fixstatus_core::error::DeliveryError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, warn};

/// What a producer experiences when the queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Reject the new payload immediately and count it as dropped.
    #[default]
    DropNewest,
    /// Wait for queue space.
    Block,
}

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Queue capacity in payloads.
    pub queue_capacity: usize,
    /// Behaviour when the queue is full.
    pub overflow: OverflowPolicy,
    /// Maximum concurrent deliveries to unordered sinks.
    pub max_in_flight: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            overflow: OverflowPolicy::DropNewest,
            max_in_flight: 16,
        }
    }
}

impl DeliveryConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the queue capacity (at least 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Sets the overflow policy.
    #[must_use]
    pub const fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Sets the unordered concurrency cap (at least 1).
    #[must_use]
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }
}

/// Delivery counters.
///
/// `submitted` and `dropped` count payloads; `delivered` and `failed` count
/// individual sink deliveries.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    submitted: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryStats {
    /// Payloads accepted into the queue.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Payloads rejected because the queue was full or closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Successful sink deliveries.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Failed sink deliveries.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn record(&self, sink: &'static str, result: Result<(), DeliveryError>) {
        match result {
            Ok(()) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(sink, %error, "delivery failed");
            }
        }
    }
}

/// Producer side of the dispatcher. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeliveryHandle {
    tx: mpsc::Sender<Bytes>,
    overflow: OverflowPolicy,
    capacity: usize,
    stats: Arc<DeliveryStats>,
}

impl DeliveryHandle {
    /// Queues a payload according to the overflow policy.
    ///
    /// Under [`OverflowPolicy::DropNewest`] this never waits.
    ///
    /// # Errors
    /// Returns `DeliveryError::QueueFull` or `DeliveryError::Closed`; the
    /// payload has been dropped and counted.
    pub async fn submit(&self, payload: Bytes) -> Result<(), DeliveryError> {
        match self.overflow {
            OverflowPolicy::DropNewest => self.try_submit(payload),
            OverflowPolicy::Block => {
                if self.tx.send(payload).await.is_err() {
                    return Err(self.dropped(DeliveryError::Closed));
                }
                self.stats.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Queues a payload without waiting, regardless of policy.
    ///
    /// # Errors
    /// Returns `DeliveryError::QueueFull` or `DeliveryError::Closed`.
    pub fn try_submit(&self, payload: Bytes) -> Result<(), DeliveryError> {
        match self.tx.try_send(payload) {
            Ok(()) => {
                self.stats.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                Err(self.dropped(DeliveryError::QueueFull {
                    capacity: self.capacity,
                }))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(self.dropped(DeliveryError::Closed)),
        }
    }

    /// Returns the shared counters.
    #[must_use]
    pub fn stats(&self) -> Arc<DeliveryStats> {
        Arc::clone(&self.stats)
    }

    fn dropped(&self, error: DeliveryError) -> DeliveryError {
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(%error, "payload dropped");
        error
    }
}

/// Starts the pump task on the current runtime.
///
/// # Returns
/// The producer handle and the pump's join handle, which completes once all
/// handles are dropped and every accepted payload has been offered to every sink.
pub fn spawn(sinks: Vec<Arc<dyn Sink>>, config: DeliveryConfig) -> (DeliveryHandle, JoinHandle<()>) {
    let capacity = config.queue_capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    let stats = Arc::new(DeliveryStats::default());

    let handle = DeliveryHandle {
        tx,
        overflow: config.overflow,
        capacity,
        stats: Arc::clone(&stats),
    };
    let pump = tokio::spawn(pump(rx, sinks, stats, config.max_in_flight.max(1)));
    (handle, pump)
}

async fn pump(
    mut rx: mpsc::Receiver<Bytes>,
    sinks: Vec<Arc<dyn Sink>>,
    stats: Arc<DeliveryStats>,
    max_in_flight: usize,
) {
    let (ordered, unordered): (Vec<_>, Vec<_>) = sinks.into_iter().partition(|s| s.ordered());
    let permits = Arc::new(Semaphore::new(max_in_flight));
    let mut in_flight = JoinSet::new();

    while let Some(payload) = rx.recv().await {
        for sink in &ordered {
            stats.record(sink.name(), sink.deliver(payload.clone()).await);
        }

        for sink in &unordered {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let sink = Arc::clone(sink);
            let stats = Arc::clone(&stats);
            let payload = payload.clone();
            in_flight.spawn(async move {
                let _permit = permit;
                stats.record(sink.name(), sink.deliver(payload).await);
            });
        }

        while let Some(joined) = in_flight.try_join_next() {
            if let Err(e) = joined {
                error!(error = %e, "delivery task panicked");
            }
        }
    }

    debug!(outstanding = in_flight.len(), "delivery queue closed, draining");
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "delivery task panicked");
        }
    }
}
