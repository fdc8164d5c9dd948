use crate::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tally_outbox::OutboxResult;
use tally_storage::StorageKeys;
use tally_wire::{RecordContext, RECORD_SEPARATOR};

struct RecordingTransport {
    bodies: Mutex<Vec<String>>,
    response: Mutex<TransportResponse>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bodies: Mutex::new(Vec::new()),
            response: Mutex::new(TransportResponse::new(200, "")),
        })
    }

    fn respond_with(&self, response: TransportResponse) {
        *self.response.lock() = response;
    }

    fn fields(&self) -> Vec<Vec<String>> {
        self.bodies
            .lock()
            .iter()
            .map(|b| b.split(RECORD_SEPARATOR).map(str::to_string).collect())
            .collect()
    }

    fn events(&self) -> Vec<String> {
        self.fields().into_iter().map(|f| f[2].clone()).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(
        &self,
        _url: &str,
        body: String,
        _headers: &[(&str, String)],
    ) -> OutboxResult<TransportResponse> {
        self.bodies.lock().push(body);
        Ok(self.response.lock().clone())
    }
}

fn config(app_id: Option<&str>, skip_launch_event: bool) -> Config {
    Config {
        app_id: app_id.map(str::to_string),
        skip_launch_event,
        ..Config::default()
    }
}

fn user_data() -> UserData {
    UserData {
        device: "test-device".to_string(),
        ..UserData::default()
    }
}

fn start(
    config: &Config,
    store: Arc<MemoryStore>,
    transport: Arc<RecordingTransport>,
) -> Tally {
    Tally::start(config, store, transport, &user_data()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn generates_and_reuses_user_id() {
    let store = Arc::new(MemoryStore::new());

    let first = start(&config(None, true), store.clone(), RecordingTransport::new());
    let id = first.user_id();
    assert_eq!(id.len(), 22);
    assert_eq!(store.get(StorageKeys::USER_ID).unwrap().as_deref(), Some(id.as_str()));

    let second = start(&config(None, true), store, RecordingTransport::new());
    assert_eq!(second.user_id(), id);
}

#[tokio::test(start_paused = true)]
async fn launch_event_logged_on_start() {
    let transport = RecordingTransport::new();
    let tally = start(
        &config(Some("my-app"), false),
        Arc::new(MemoryStore::new()),
        transport.clone(),
    );

    assert!(tally.flush(Duration::from_secs(60)).await);
    assert_eq!(transport.events(), vec![LAUNCH_EVENT]);
    assert_eq!(transport.fields()[0][0], "my-app");
}

#[tokio::test(start_paused = true)]
async fn launch_event_can_be_skipped() {
    let transport = RecordingTransport::new();
    let tally = start(
        &config(Some("my-app"), true),
        Arc::new(MemoryStore::new()),
        transport.clone(),
    );

    assert!(tally.flush(Duration::from_secs(60)).await);
    assert!(transport.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn uuid_app_id_is_shortened() {
    let transport = RecordingTransport::new();
    let tally = start(
        &config(Some("123e4567-e89b-12d3-a456-426614174000"), false),
        Arc::new(MemoryStore::new()),
        transport.clone(),
    );

    assert_eq!(tally.app_id().as_deref(), Some("Ej5FZ-ibEtOkVkJmFBdAAA"));
    assert!(tally.flush(Duration::from_secs(60)).await);
    assert_eq!(transport.fields()[0][0], "Ej5FZ-ibEtOkVkJmFBdAAA");
}

#[tokio::test(start_paused = true)]
async fn logging_without_app_id_is_dropped() {
    let transport = RecordingTransport::new();
    let tally = start(&config(None, false), Arc::new(MemoryStore::new()), transport.clone());

    tally.log(LogEvent::new("ignored"));

    assert!(!tally.is_active());
    assert_eq!(tally.pending(), 0);
    assert!(tally.flush(Duration::from_secs(1)).await);
    assert!(transport.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn configure_app_id_restores_queue_then_launches() {
    // A previous run left one event behind.
    let left_over = EventRecord::build(
        &RecordContext {
            app_id: "app".to_string(),
            user_id: "u1".to_string(),
            ..RecordContext::default()
        },
        "left-over",
        0.0,
        &EventArguments::none(),
        chrono::Utc::now(),
    );
    let store = Arc::new(MemoryStore::with_entries([(
        StorageKeys::EVENT_QUEUE,
        serde_json::to_string(&[left_over]).unwrap(),
    )]));

    let transport = RecordingTransport::new();
    let tally = start(&config(None, false), store, transport.clone());
    assert!(tally.experiments().letters().is_some());

    tally.configure_app_id("app");
    tally.configure_app_id("app");
    assert!(tally.is_active());

    assert!(tally.flush(Duration::from_secs(60)).await);
    assert_eq!(transport.events(), vec!["left-over", LAUNCH_EVENT]);
}

#[tokio::test(start_paused = true)]
async fn configure_app_id_keeps_restored_events_while_logging_concurrently() {
    let context = RecordContext {
        app_id: "app".to_string(),
        user_id: "u1".to_string(),
        ..RecordContext::default()
    };
    let seeded: Vec<String> = (0..5).map(|i| format!("seeded-{i}")).collect();
    let records: Vec<EventRecord> = seeded
        .iter()
        .map(|name| {
            EventRecord::build(&context, name, 0.0, &EventArguments::none(), chrono::Utc::now())
        })
        .collect();
    let store = Arc::new(MemoryStore::with_entries([(
        StorageKeys::EVENT_QUEUE,
        serde_json::to_string(&records).unwrap(),
    )]));

    let transport = RecordingTransport::new();
    let tally = Arc::new(start(&config(None, true), store, transport.clone()));

    let runtime = tokio::runtime::Handle::current();
    let logger = {
        let tally = tally.clone();
        std::thread::spawn(move || {
            let _guard = runtime.enter();
            for i in 0..200 {
                tally.log(LogEvent::new(format!("live-{i}")));
            }
        })
    };
    tally.configure_app_id("app");
    logger.join().unwrap();

    let pending: Vec<String> = tally.pending_events().into_iter().map(|r| r.event).collect();
    assert!(pending.len() >= seeded.len());
    assert_eq!(pending[..seeded.len()], seeded[..]);

    assert!(tally.flush(Duration::from_secs(600)).await);
    assert_eq!(transport.events()[..seeded.len()], seeded[..]);
}

#[tokio::test(start_paused = true)]
async fn records_carry_identity_and_letters() {
    let store = Arc::new(MemoryStore::with_entries([
        (StorageKeys::USER_ID, "u1"),
        (
            StorageKeys::EXPERIMENTS,
            r#"[{"name":["price.1"],"variants":[50,50]}]"#,
        ),
    ]));
    let transport = RecordingTransport::new();
    let tally = start(&config(Some("app"), true), store, transport.clone());

    assert_eq!(tally.ab_test("Price.1"), "B");
    assert_eq!(tally.ab_test("unknown"), "A");

    tally.log(LogEvent::new("purchase").revenue(12.5).arg("plan", "pro"));
    assert!(tally.flush(Duration::from_secs(60)).await);

    let fields = &transport.fields()[0];
    assert_eq!(fields[2], "purchase");
    assert_eq!(fields[3], "12.50");
    assert_eq!(fields[4], "plan\u{1F}pro");
    assert_eq!(fields[5], "u1");
    assert_eq!(fields[6], user_data().encode().split(RECORD_SEPARATOR).next().unwrap());
    assert_eq!(fields.last().unwrap(), "B");
}

#[tokio::test(start_paused = true)]
async fn set_user_id_recomputes_assignment() {
    let store = Arc::new(MemoryStore::with_entries([
        (StorageKeys::USER_ID, "u1"),
        (
            StorageKeys::EXPERIMENTS,
            r#"[{"name":["price.1"],"variants":[55,45]}]"#,
        ),
    ]));
    let tally = start(&config(Some("app"), true), store.clone(), RecordingTransport::new());
    // bucket("u1.price.1") = 57, bucket("alice.price.1") = 51
    assert_eq!(tally.ab_test("price.1"), "B");

    tally.set_user_id("");
    assert_eq!(tally.user_id(), "u1");

    tally.set_user_id("alice");
    assert_eq!(tally.user_id(), "alice");
    assert_eq!(tally.ab_test("price.1"), "A");
    assert_eq!(store.get(StorageKeys::USER_ID).unwrap().as_deref(), Some("alice"));
}

#[tokio::test(start_paused = true)]
async fn server_definitions_reach_lookups() {
    let transport = RecordingTransport::new();
    transport.respond_with(TransportResponse::new(
        200,
        r#"[{"name":["old.name","checkout.v2"],"variants":[50,50]}]"#,
    ));
    let store = Arc::new(MemoryStore::with_entries([(StorageKeys::USER_ID, "bob")]));
    let tally = start(&config(Some("app"), false), store, transport);

    assert_eq!(tally.ab_test("old.name"), "A");
    assert!(tally.flush(Duration::from_secs(60)).await);

    // bucket("bob.checkout.v2") = 59
    assert_eq!(tally.ab_test("old.name"), "B");
    assert_eq!(tally.ab_test("CHECKOUT.V2"), "B");
    assert_eq!(tally.experiments().letters().as_deref(), Some("B"));
}

#[tokio::test(start_paused = true)]
async fn handle_forwards_early_logs_in_order() {
    let (handle, starter) = TallyHandle::pending();

    handle.log(LogEvent::new("first"));
    handle.log(LogEvent::new("second"));
    assert!(handle.try_get().is_none());

    tokio::time::sleep(Duration::from_secs(2)).await;

    let transport = RecordingTransport::new();
    let tally = starter.complete(start(
        &config(Some("app"), true),
        Arc::new(MemoryStore::new()),
        transport.clone(),
    ));
    handle.log(LogEvent::new("third"));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(tally.flush(Duration::from_secs(60)).await);
    assert_eq!(transport.events(), vec!["first", "second", "third"]);
}

#[tokio::test(start_paused = true)]
async fn handle_drops_logs_after_ready_timeout() {
    let (handle, starter) = TallyHandle::pending();

    handle.log(LogEvent::new("too-early"));
    tokio::time::sleep(READY_TIMEOUT + Duration::from_secs(1)).await;

    let transport = RecordingTransport::new();
    let tally = starter.complete(start(
        &config(Some("app"), true),
        Arc::new(MemoryStore::new()),
        transport.clone(),
    ));
    handle.log(LogEvent::new("on-time"));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(tally.flush(Duration::from_secs(60)).await);
    assert_eq!(transport.events(), vec!["on-time"]);
}

#[tokio::test(start_paused = true)]
async fn handle_ab_test_defaults_when_never_started() {
    let (handle, _starter) = TallyHandle::pending();

    assert_eq!(handle.ab_test("price.1").await, "A");
    assert!(handle.get().await.is_none());
    assert!(matches!(handle.require().await, Err(TallyError::NotReady)));
}

#[tokio::test(start_paused = true)]
async fn ready_handle_answers_immediately() {
    let store = Arc::new(MemoryStore::with_entries([
        (StorageKeys::USER_ID, "u1"),
        (
            StorageKeys::EXPERIMENTS,
            r#"[{"name":["price.1"],"variants":[50,50]}]"#,
        ),
    ]));
    let tally = Arc::new(start(&config(Some("app"), true), store, RecordingTransport::new()));
    let handle = TallyHandle::ready(tally);

    assert!(handle.try_get().is_some());
    assert_eq!(handle.ab_test("price.1").await, "B");
}

#[tokio::test(start_paused = true)]
async fn file_store_keeps_state_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::with_base_dir(dir.path().to_path_buf());
    let open = || Arc::new(tally_storage::create_file_store(&paths).unwrap());

    let transport = RecordingTransport::new();
    transport.respond_with(TransportResponse::new(
        200,
        r#"[{"name":["checkout.v2"],"variants":[50,50]}]"#,
    ));
    let first =
        Tally::start(&config(Some("app"), false), open(), transport, &user_data()).unwrap();
    first.set_user_id("bob");
    assert!(first.flush(Duration::from_secs(60)).await);
    drop(first);

    let second = Tally::start(
        &config(None, true),
        open(),
        RecordingTransport::new(),
        &user_data(),
    )
    .unwrap();
    assert_eq!(second.user_id(), "bob");
    assert_eq!(second.ab_test("checkout.v2"), "B");
}
