//! The client context: identity, logging and experiment lookups.

use crate::{LogEvent, TallyResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tally_config_and_utils::{short_id, Config};
use tally_experiments::Experiments;
use tally_outbox::{DeliveryConfig, DeliveryEngine, Transport};
use tally_storage::{KeyValueStore, PersistedState};
use tally_wire::{EventRecord, RecordContext, UserData};
use tracing::{error, info, warn};

/// Event logged automatically when delivery becomes active.
pub const LAUNCH_EVENT: &str = "launch";

/// Analytics client context.
///
/// Built once at startup and shared by reference. Logging never blocks on the
/// network and never returns an error to the caller.
pub struct Tally {
    app_id: RwLock<Option<String>>,
    user_id: RwLock<String>,
    user_data: String,
    skip_launch_event: bool,
    active: AtomicBool,
    persisted: PersistedState,
    experiments: Arc<Experiments>,
    engine: DeliveryEngine,
}

impl Tally {
    /// Build the client from configuration and its collaborators.
    ///
    /// Without an app id the client is inert: logging is dropped with an error
    /// until [`Tally::configure_app_id`] is called.
    pub fn start(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
        user_data: &UserData,
    ) -> TallyResult<Self> {
        let delivery = DeliveryConfig {
            endpoint: config.ingest_url()?.to_string(),
            ..DeliveryConfig::default()
        };
        Self::start_with_delivery(config, delivery, store, transport, user_data)
    }

    /// Like [`Tally::start`] with explicit delivery tuning.
    pub fn start_with_delivery(
        config: &Config,
        delivery: DeliveryConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
        user_data: &UserData,
    ) -> TallyResult<Self> {
        let persisted = PersistedState::new(store);

        let user_id = match persisted.user_id()? {
            Some(id) => id,
            None => {
                let id = short_id::generate();
                persisted.set_user_id(&id)?;
                info!(user_id = %id, "Generated user id");
                id
            }
        };

        let experiments = Arc::new(Experiments::new());
        experiments.load(persisted.experiments_json()?.as_deref(), &user_id);

        let engine = DeliveryEngine::new(
            delivery,
            persisted.clone(),
            transport,
            experiments.clone(),
        );

        let tally = Self {
            app_id: RwLock::new(None),
            user_id: RwLock::new(user_id),
            user_data: user_data.encode(),
            skip_launch_event: config.skip_launch_event,
            active: AtomicBool::new(false),
            persisted,
            experiments,
            engine,
        };

        match config.app_id() {
            Some(app_id) => tally.activate(app_id),
            None => error!("App id is not configured; events will be dropped until it is set"),
        }

        Ok(tally)
    }

    /// Set the app id after start. The first non-empty id activates delivery.
    pub fn configure_app_id(&self, app_id: &str) {
        let app_id = app_id.trim();
        if app_id.is_empty() {
            warn!("App id cannot be empty; ignoring");
            return;
        }
        self.activate(short_id::shorten(app_id));
    }

    fn activate(&self, app_id: String) {
        if self.active.swap(true, Ordering::SeqCst) {
            *self.app_id.write() = Some(app_id);
            return;
        }

        // Logging stays disabled until the persisted queue is back in memory.
        self.engine.restore();
        self.engine.start_drain();
        *self.app_id.write() = Some(app_id);
        info!(user_id = %self.user_id(), "Tally started");

        if !self.skip_launch_event {
            self.log(LogEvent::new(LAUNCH_EVENT));
        }
    }

    /// Queue an event for delivery.
    pub fn log(&self, event: LogEvent) {
        let Some(app_id) = self.app_id.read().clone() else {
            error!(event = %event.name, "App id is not configured; dropping event");
            return;
        };

        let context = RecordContext {
            app_id,
            user_id: self.user_id(),
            user_data: self.user_data.clone(),
            ab_letters: self.experiments.letters(),
        };
        let record = EventRecord::build(
            &context,
            &event.name,
            event.revenue,
            &event.arguments,
            event.time,
        );
        self.engine.enqueue(record);
    }

    /// Variant letter for `experiment`, `"A"` when unassigned.
    pub fn ab_test(&self, experiment: &str) -> String {
        self.experiments.lookup(experiment)
    }

    /// Replace the user id. Empty ids are rejected.
    pub fn set_user_id(&self, user_id: &str) {
        if user_id.is_empty() {
            warn!("User id cannot be empty; keeping the current one");
            return;
        }

        *self.user_id.write() = user_id.to_string();
        if let Err(e) = self.persisted.set_user_id(user_id) {
            error!(error = %e, "Failed to persist user id");
        }
        self.experiments.set_user_id(user_id);
    }

    pub fn user_id(&self) -> String {
        self.user_id.read().clone()
    }

    pub fn app_id(&self) -> Option<String> {
        self.app_id.read().clone()
    }

    /// Whether an app id is set and delivery has started.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn experiments(&self) -> &Experiments {
        &self.experiments
    }

    /// Number of events waiting for delivery.
    pub fn pending(&self) -> usize {
        self.engine.pending_count()
    }

    pub fn pending_events(&self) -> Vec<EventRecord> {
        self.engine.pending()
    }

    /// Wait up to `timeout` for the queue to empty.
    pub async fn flush(&self, timeout: Duration) -> bool {
        self.engine.wait_until_drained(timeout).await
    }
}

impl std::fmt::Debug for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tally")
            .field("app_id", &*self.app_id.read())
            .field("user_id", &*self.user_id.read())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
