//! Deterministic A/B experiment assignment.
//!
//! Users are bucketed by [`stable_hash`] of `"{user_id}.{canonical name}"`;
//! the bucket selects a variant letter per experiment. The hash is a contract
//! with the server and other client SDKs and must not change.

mod assign;
mod definition;
mod hash;
mod state;

pub use assign::{compute_letters, compute_name_to_letter, letter_for_ordinal};
pub use definition::{parse_definitions, ExperimentDefinition};
pub use hash::{stable_hash, BUCKET_COUNT};
pub use state::{Assignment, Experiments, DEFAULT_LETTER};
