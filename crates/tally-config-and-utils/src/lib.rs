//! Core types, configuration, and utilities for the Tally client.

mod config;
mod error;
mod logging;
mod paths;
pub mod short_id;

pub use config::{Config, DEFAULT_INGEST_URL, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_with_config, JsonlWriter, LogConfig};
pub use paths::Paths;
pub use short_id::{shorten, shorten_uuid};
