//! The queued event record.

use crate::sanitize::{char_len, sanitize, truncate_chars, FieldKind};
use crate::EventArguments;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum characters for event name plus argument block.
pub const MAX_EVENT_LENGTH: usize = 200;

/// One logged event, ready for delivery.
///
/// Records are immutable once built and serialize to camelCase JSON for the
/// persisted queue snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub app_id: String,
    #[serde(default)]
    pub user_id: String,
    pub user_data: String,
    pub event: String,
    pub revenue: String,
    pub added_arguments: String,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ab_letters: Option<String>,
}

/// Per-install values stamped onto every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordContext {
    pub app_id: String,
    pub user_id: String,
    pub user_data: String,
    pub ab_letters: Option<String>,
}

impl EventRecord {
    /// Build a record, applying sanitizing and length rules.
    ///
    /// An event name longer than [`MAX_EVENT_LENGTH`] is cut and its arguments
    /// dropped; otherwise the argument block is cut to whatever budget the
    /// name leaves.
    pub fn build(
        context: &RecordContext,
        event: &str,
        revenue: f64,
        arguments: &EventArguments,
        time: DateTime<Utc>,
    ) -> Self {
        let (event, added_arguments) = fit_event(event, arguments);

        Self {
            app_id: sanitize(&context.app_id, FieldKind::Plain),
            user_id: sanitize(&context.user_id, FieldKind::Plain),
            user_data: context.user_data.clone(),
            event,
            revenue: format_revenue(revenue),
            added_arguments,
            time,
            ab_letters: context
                .ab_letters
                .as_deref()
                .map(|letters| sanitize(letters, FieldKind::Plain)),
        }
    }

    /// Whole hours elapsed between the event time and `now`.
    pub fn age_hours(&self, now: DateTime<Utc>) -> i64 {
        (now - self.time).num_hours()
    }
}

fn fit_event(event: &str, arguments: &EventArguments) -> (String, String) {
    // Lengths are measured on the raw name; sanitizing happens after cutting.
    let mut event = event;
    if char_len(event) > MAX_EVENT_LENGTH {
        warn!(
            length = char_len(event),
            max = MAX_EVENT_LENGTH,
            "Event name too long, truncating"
        );
        event = truncate_chars(event, MAX_EVENT_LENGTH);
    }

    let mut args = arguments.encode();
    let event_len = char_len(event);
    if event_len + char_len(&args) > MAX_EVENT_LENGTH {
        warn!(
            event_length = event_len,
            args_length = char_len(&args),
            max = MAX_EVENT_LENGTH,
            "Event arguments too long, truncating"
        );
        let budget = MAX_EVENT_LENGTH.saturating_sub(event_len);
        args = truncate_chars(&args, budget).to_string();
    }

    (
        sanitize(event, FieldKind::Plain),
        sanitize(&args, FieldKind::ArgumentBlock),
    )
}

/// Fixed two-decimal revenue string; non-finite amounts become `"0.00"`.
pub fn format_revenue(revenue: f64) -> String {
    if revenue.is_finite() {
        format!("{revenue:.2}")
    } else {
        "0.00".to_string()
    }
}
