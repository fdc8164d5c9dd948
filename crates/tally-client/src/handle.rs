//! Call sites that may run before the client is started.

use crate::{LogEvent, Tally, TallyError, TallyResult};
use std::sync::Arc;
use std::time::Duration;
use tally_experiments::DEFAULT_LETTER;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::error;

/// How long a call issued before start waits for the client.
pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

struct PendingLog {
    event: LogEvent,
    deadline: Instant,
}

/// Shareable handle to a client that may not exist yet.
///
/// Logs issued before the client is ready are held in call order and
/// forwarded once it is; each gives up [`READY_TIMEOUT`] after it was issued.
#[derive(Clone)]
pub struct TallyHandle {
    ready: watch::Receiver<Option<Arc<Tally>>>,
    logs: mpsc::UnboundedSender<PendingLog>,
}

/// Completes a pending [`TallyHandle`].
pub struct TallyStarter {
    ready: watch::Sender<Option<Arc<Tally>>>,
}

impl TallyStarter {
    /// Publish the started client to every handle.
    pub fn complete(self, tally: Tally) -> Arc<Tally> {
        let tally = Arc::new(tally);
        self.ready.send_replace(Some(tally.clone()));
        tally
    }
}

impl TallyHandle {
    /// A handle with no client yet. Must be called inside a Tokio runtime.
    pub fn pending() -> (Self, TallyStarter) {
        let (ready_tx, ready_rx) = watch::channel(None);
        let (logs_tx, logs_rx) = mpsc::unbounded_channel();

        tokio::spawn(forward_logs(ready_rx.clone(), logs_rx));

        (
            Self {
                ready: ready_rx,
                logs: logs_tx,
            },
            TallyStarter { ready: ready_tx },
        )
    }

    /// A handle around an already started client.
    pub fn ready(tally: Arc<Tally>) -> Self {
        let (handle, starter) = Self::pending();
        starter.ready.send_replace(Some(tally));
        handle
    }

    /// The client if it is already started.
    pub fn try_get(&self) -> Option<Arc<Tally>> {
        self.ready.borrow().clone()
    }

    /// The client, waiting up to [`READY_TIMEOUT`] for it to start.
    pub async fn get(&self) -> Option<Arc<Tally>> {
        wait_ready(self.ready.clone(), Instant::now() + READY_TIMEOUT).await
    }

    /// Like [`get`](Self::get), reporting a client that never started as an error.
    pub async fn require(&self) -> TallyResult<Arc<Tally>> {
        self.get().await.ok_or(TallyError::NotReady)
    }

    /// Log without blocking, preserving call order across the start boundary.
    pub fn log(&self, event: LogEvent) {
        let pending = PendingLog {
            event,
            deadline: Instant::now() + READY_TIMEOUT,
        };
        if let Err(e) = self.logs.send(pending) {
            error!(event = %e.0.event.name, "Log forwarder stopped; dropping event");
        }
    }

    /// Variant letter once the client is ready, `"A"` if it never becomes so.
    pub async fn ab_test(&self, experiment: &str) -> String {
        match self.get().await {
            Some(tally) => tally.ab_test(experiment),
            None => DEFAULT_LETTER.to_string(),
        }
    }
}

async fn wait_ready(
    mut ready: watch::Receiver<Option<Arc<Tally>>>,
    deadline: Instant,
) -> Option<Arc<Tally>> {
    let waited = tokio::time::timeout_at(deadline, ready.wait_for(Option::is_some)).await;
    match waited {
        Ok(Ok(tally)) => tally.clone(),
        _ => None,
    }
}

async fn forward_logs(
    ready: watch::Receiver<Option<Arc<Tally>>>,
    mut logs: mpsc::UnboundedReceiver<PendingLog>,
) {
    while let Some(PendingLog { event, deadline }) = logs.recv().await {
        match wait_ready(ready.clone(), deadline).await {
            Some(tally) => tally.log(event),
            None => error!(event = %event.name, "Tally not started in time; dropping event"),
        }
    }
}
