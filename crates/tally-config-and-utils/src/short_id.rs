//! Compact URL-safe identifiers.
//!
//! A 128-bit UUID is rendered as its 16 big-endian bytes in unpadded
//! URL-safe base64, which yields a 22 character token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use uuid::Uuid;

/// Shorten a UUID into a 22 character URL-safe token.
pub fn shorten_uuid(uuid: &Uuid) -> String {
    URL_SAFE_NO_PAD.encode(uuid.as_bytes())
}

/// Shorten any identifier: UUID-shaped input is compacted, everything else
/// is returned unchanged.
pub fn shorten(any_id: &str) -> String {
    match Uuid::parse_str(any_id) {
        Ok(uuid) => shorten_uuid(&uuid),
        Err(_) => any_id.to_string(),
    }
}

/// Generate a fresh random identifier in shortened form.
pub fn generate() -> String {
    shorten_uuid(&Uuid::new_v4())
}
