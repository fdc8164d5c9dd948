//! Storage key constants.

/// Storage keys used by the client
pub struct StorageKeys;

impl StorageKeys {
    /// Serialized event queue snapshot (JSON array of records)
    pub const EVENT_QUEUE: &'static str = "tally.event_queue";

    /// Stable per-install user identifier
    pub const USER_ID: &'static str = "tally.user.id";

    /// Last experiment definition JSON received from the server
    pub const EXPERIMENTS: &'static str = "tally.ab";

    /// Last `X-AB-Version` header value received from the server
    pub const EXPERIMENTS_VERSION: &'static str = "tally.ab.version";
}
