//! Single-attempt delivery of one event to the ingestion endpoint.

use crate::{DeliveryConfig, OutboxError, OutboxResult};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tally_experiments::Experiments;
use tally_storage::PersistedState;
use tally_wire::{encode_payload, EventRecord};
use tracing::{debug, warn};

/// Header carrying the server-assigned experiment definition version.
pub const AB_VERSION_HEADER: &str = "X-AB-Version";

/// Response as seen by the delivery loop.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
    /// Header names are stored lowercased.
    pub headers: HashMap<String, String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Outbound POST used for event delivery.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url`. Connection failures and timeouts are errors;
    /// any HTTP status, including failures, is a response.
    async fn post(
        &self,
        url: &str,
        body: String,
        headers: &[(&str, String)],
    ) -> OutboxResult<TransportResponse>;
}

/// `reqwest`-backed transport with bounded connect and overall timeouts.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &DeliveryConfig) -> OutboxResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.connect_timeout + config.read_timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: String,
        headers: &[(&str, String)],
    ) -> OutboxResult<TransportResponse> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            body,
            headers,
        })
    }
}

/// Sends records and applies what a successful response carries.
pub struct EventSender {
    transport: Arc<dyn Transport>,
    endpoint: String,
    persisted: PersistedState,
    experiments: Arc<Experiments>,
}

impl EventSender {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        persisted: PersistedState,
        experiments: Arc<Experiments>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            persisted,
            experiments,
        }
    }

    /// One delivery attempt. Every failure is reported as `false`.
    pub async fn deliver(&self, record: &EventRecord) -> bool {
        match self.try_deliver(record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(event = %record.event, error = %e, "Event delivery failed");
                false
            }
        }
    }

    async fn try_deliver(&self, record: &EventRecord) -> OutboxResult<()> {
        let body = encode_payload(record);

        let mut headers = vec![("Content-Type", "text/plain".to_string())];
        match self.persisted.experiments_version() {
            Ok(Some(version)) => headers.push((AB_VERSION_HEADER, version)),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read experiment version"),
        }

        debug!(url = %self.endpoint, event = %record.event, bytes = body.len(), "Sending event");
        let response = self.transport.post(&self.endpoint, body, &headers).await?;

        if !response.is_success() {
            return Err(OutboxError::Status(response.status));
        }

        self.apply_response(&response);
        Ok(())
    }

    fn apply_response(&self, response: &TransportResponse) {
        if !response.body.is_empty() {
            if let Err(e) = self.persisted.set_experiments_json(&response.body) {
                warn!(error = %e, "Failed to persist experiment definitions");
            }
            self.experiments.replace_definitions(&response.body);
            debug!("Applied experiment definitions from response");
        }

        if let Some(version) = response.header(AB_VERSION_HEADER) {
            if let Err(e) = self.persisted.set_experiments_version(version) {
                warn!(error = %e, "Failed to persist experiment version");
            }
        }
    }
}
