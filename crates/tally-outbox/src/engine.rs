//! Delivery engine: enqueue, drain loop, backoff and eviction.

use crate::{EventQueue, EventSender, Transport};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tally_config_and_utils::DEFAULT_INGEST_URL;
use tally_experiments::Experiments;
use tally_storage::PersistedState;
use tally_wire::EventRecord;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delivery tuning.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Ingestion URL events are POSTed to.
    pub endpoint: String,
    /// Consecutive failures after which the head is dropped.
    pub max_failures: u32,
    /// Whole hours after which an undelivered head is dropped.
    pub max_age_hours: i64,
    /// Delay before the first retry.
    pub backoff_base: Duration,
    /// Growth factor between consecutive retries.
    pub backoff_ratio: f64,
    /// Pause between loop iterations.
    pub idle_delay: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_INGEST_URL.to_string(),
            max_failures: 27,
            max_age_hours: 48,
            backoff_base: Duration::from_millis(500),
            backoff_ratio: 1.5,
            idle_delay: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// Delay before the attempt following `failures` consecutive failures.
///
/// `base * ratio^(failures - 1)`, uncapped; zero when nothing has failed.
pub fn compute_backoff(failures: u32, config: &DeliveryConfig) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }

    let exponent = i32::try_from(failures - 1).unwrap_or(i32::MAX);
    let base_ms = config.backoff_base.as_millis() as f64;
    let delay_ms = base_ms * config.backoff_ratio.powi(exponent);
    Duration::from_millis(delay_ms as u64)
}

struct EngineInner {
    config: DeliveryConfig,
    queue: EventQueue,
    sender: EventSender,
    idle: Notify,
}

/// Owns the event queue and its single drain loop.
///
/// Cheap to clone; all clones share one queue.
#[derive(Clone)]
pub struct DeliveryEngine {
    inner: Arc<EngineInner>,
}

impl DeliveryEngine {
    pub fn new(
        config: DeliveryConfig,
        persisted: PersistedState,
        transport: Arc<dyn Transport>,
        experiments: Arc<Experiments>,
    ) -> Self {
        let sender = EventSender::new(
            transport,
            config.endpoint.clone(),
            persisted.clone(),
            experiments,
        );

        Self {
            inner: Arc::new(EngineInner {
                config,
                queue: EventQueue::new(persisted),
                sender,
                idle: Notify::new(),
            }),
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.inner.config
    }

    /// Load the persisted queue. The first enqueue does this itself if needed.
    pub fn restore(&self) -> usize {
        self.inner.queue.restore()
    }

    /// Append a record and make sure a drain loop is running.
    ///
    /// Returns the drain task if this call started one.
    pub fn enqueue(&self, record: EventRecord) -> Option<JoinHandle<()>> {
        self.inner.queue.push(record);
        self.start_drain()
    }

    /// Start the drain loop unless one is running or there is nothing to send.
    pub fn start_drain(&self) -> Option<JoinHandle<()>> {
        if !self.inner.queue.try_begin_drain() {
            return None;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = self.inner.clone();
                Some(handle.spawn(drain(inner)))
            }
            Err(_) => {
                warn!("No async runtime available, delivery deferred");
                self.inner.queue.release();
                None
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn is_draining(&self) -> bool {
        self.inner.queue.is_processing()
    }

    /// Queued records, head first.
    pub fn pending(&self) -> Vec<EventRecord> {
        self.inner.queue.snapshot()
    }

    /// Wait until the queue is empty and no loop is running.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub async fn wait_until_drained(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.queue.is_empty() && !self.inner.queue.is_processing() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return false;
            }
        }
    }
}

async fn drain(inner: Arc<EngineInner>) {
    let config = &inner.config;
    let mut failures: u32 = 0;
    debug!(pending = inner.queue.len(), "Drain loop started");

    while let Some(head) = inner.queue.peek_or_release() {
        if failures > 0 {
            tokio::time::sleep(compute_backoff(failures, config)).await;
        }

        let success = inner.sender.deliver(&head).await;
        let age_hours = head.age_hours(Utc::now());

        if success || failures >= config.max_failures || age_hours > config.max_age_hours {
            if !success {
                warn!(
                    event = %head.event,
                    failures,
                    age_hours,
                    "Dropping undeliverable event"
                );
            }
            inner.queue.complete_head();
            failures = 0;
        } else {
            failures += 1;
            debug!(event = %head.event, failures, "Will retry event");
        }

        tokio::time::sleep(config.idle_delay).await;
    }

    info!("Event queue drained");
    inner.idle.notify_waiters();
}
