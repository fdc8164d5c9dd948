//! Durable event delivery for the Tally client.
//!
//! This crate provides:
//! - EventQueue: in-memory FIFO mirrored to the key-value store
//! - DeliveryEngine: single drain loop with backoff and eviction
//! - EventSender: one POST per attempt, applying experiment updates from 2xx responses
//! - Transport / HttpTransport: the network seam and its `reqwest` implementation

mod engine;
mod error;
mod queue;
mod sender;

#[cfg(test)]
mod tests;

pub use engine::{compute_backoff, DeliveryConfig, DeliveryEngine};
pub use error::{OutboxError, OutboxResult};
pub use queue::EventQueue;
pub use sender::{EventSender, HttpTransport, Transport, TransportResponse, AB_VERSION_HEADER};
