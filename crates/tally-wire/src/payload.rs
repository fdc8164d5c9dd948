//! Wire payload encoding.

use crate::{EventRecord, RECORD_SEPARATOR};

/// Encode a record as the text body POSTed to the ingestion endpoint.
///
/// Fields are joined by the record separator in a fixed order:
/// `appId, unixSeconds, event, revenue, addedArguments, userId, userData`
/// followed by `abLetters` only when the record carries letters.
pub fn encode_payload(record: &EventRecord) -> String {
    let timestamp = record.time.timestamp().to_string();
    let mut fields = vec![
        record.app_id.as_str(),
        timestamp.as_str(),
        record.event.as_str(),
        record.revenue.as_str(),
        record.added_arguments.as_str(),
        record.user_id.as_str(),
        record.user_data.as_str(),
    ];
    if let Some(letters) = record.ab_letters.as_deref() {
        fields.push(letters);
    }

    let mut body = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            body.push(RECORD_SEPARATOR);
        }
        body.push_str(field);
    }
    body
}
