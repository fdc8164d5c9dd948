//! Event records and their wire encoding.
//!
//! Every text field that reaches the ingestion endpoint is cleaned of the two
//! reserved separators: [`RECORD_SEPARATOR`] between payload fields and
//! [`UNIT_SEPARATOR`] between argument keys and values.

mod arguments;
mod payload;
mod record;
mod sanitize;
mod user_data;

pub use arguments::EventArguments;
pub use payload::encode_payload;
pub use record::{format_revenue, EventRecord, RecordContext, MAX_EVENT_LENGTH};
pub use sanitize::{sanitize, FieldKind, RECORD_SEPARATOR, UNIT_SEPARATOR};
pub use user_data::{debug_flags, UserData};

use thiserror::Error;

/// Errors from building wire values.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("Invalid argument JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Argument JSON must be an object")]
    NotAnObject,
}

pub type WireResult<T> = Result<T, WireError>;
