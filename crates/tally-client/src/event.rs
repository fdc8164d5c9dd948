//! Log call builder.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tally_wire::EventArguments;

/// An event as the application describes it, before it becomes a record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub name: String,
    pub revenue: f64,
    pub arguments: EventArguments,
    /// When the event happened; defaults to construction time.
    pub time: DateTime<Utc>,
}

impl LogEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revenue: 0.0,
            arguments: EventArguments::none(),
            time: Utc::now(),
        }
    }

    pub fn revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    /// Replace the arguments wholesale.
    pub fn arguments(mut self, arguments: impl Into<EventArguments>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// Add one key/value pair. A raw argument string set earlier is discarded.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut pairs = match self.arguments {
            EventArguments::Pairs(pairs) => pairs,
            EventArguments::Raw(_) => BTreeMap::new(),
        };
        pairs.insert(key.into(), value.into());
        self.arguments = EventArguments::Pairs(pairs);
        self
    }

    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }
}
