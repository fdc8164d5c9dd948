//! Tally analytics client.
//!
//! Delivery runs on the ambient Tokio runtime; a client started outside one
//! keeps events queued until a later log call happens inside a runtime.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tally_client::{Config, HttpTransport, LogEvent, MemoryStore, Tally, UserData};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new();
//!     let transport = Arc::new(HttpTransport::new(&Default::default())?);
//!     let tally = Tally::start(&config, Arc::new(MemoryStore::new()), transport, &UserData::detect())?;
//!
//!     tally.log(LogEvent::new("purchase").revenue(4.99).arg("plan", "pro"));
//!     let letter = tally.ab_test("checkout.v2");
//!     println!("checkout.v2 -> {letter}");
//!
//!     tally.flush(Duration::from_secs(10)).await;
//!     Ok(())
//! }
//! ```

mod error;
mod event;
mod handle;
mod tally;

pub use error::{TallyError, TallyResult};
pub use event::LogEvent;
pub use handle::{TallyHandle, TallyStarter, READY_TIMEOUT};
pub use tally::{Tally, LAUNCH_EVENT};

pub use tally_config_and_utils::{Config, Paths};
pub use tally_outbox::{DeliveryConfig, HttpTransport, Transport, TransportResponse};
pub use tally_storage::{FileStore, KeyValueStore, MemoryStore};
pub use tally_wire::{EventArguments, EventRecord, UserData};

#[cfg(test)]
mod tests;
