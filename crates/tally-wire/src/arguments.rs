//! Custom event arguments.

use crate::sanitize::{sanitize, FieldKind, UNIT_SEPARATOR};
use crate::{WireError, WireResult};
use std::collections::{BTreeMap, HashMap};

/// Arguments attached to a logged event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventArguments {
    /// Pre-serialized argument block, sent as-is after sanitizing.
    Raw(String),
    /// Key/value pairs, serialized in key order.
    Pairs(BTreeMap<String, String>),
}

impl Default for EventArguments {
    fn default() -> Self {
        Self::Pairs(BTreeMap::new())
    }
}

impl EventArguments {
    pub fn none() -> Self {
        Self::default()
    }

    /// Build pairs from a JSON object, keeping only string-valued entries.
    pub fn from_json(json: &str) -> WireResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value.as_object().ok_or(WireError::NotAnObject)?;

        let pairs = object
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect();
        Ok(Self::Pairs(pairs))
    }

    /// Canonical delimited form of these arguments.
    ///
    /// Pairs become `key US value US ...` with the final separator dropped;
    /// keys and values lose any embedded separators first.
    pub fn encode(&self) -> String {
        match self {
            Self::Raw(raw) => sanitize(raw, FieldKind::ArgumentBlock),
            Self::Pairs(pairs) => {
                let mut out = String::new();
                for (key, value) in pairs {
                    out.push_str(&sanitize(key, FieldKind::Plain));
                    out.push(UNIT_SEPARATOR);
                    out.push_str(&sanitize(value, FieldKind::Plain));
                    out.push(UNIT_SEPARATOR);
                }
                out.pop();
                out
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(raw) => raw.is_empty(),
            Self::Pairs(pairs) => pairs.is_empty(),
        }
    }
}

impl From<&str> for EventArguments {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<String> for EventArguments {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<BTreeMap<String, String>> for EventArguments {
    fn from(pairs: BTreeMap<String, String>) -> Self {
        Self::Pairs(pairs)
    }
}

impl From<HashMap<String, String>> for EventArguments {
    fn from(pairs: HashMap<String, String>) -> Self {
        Self::Pairs(pairs.into_iter().collect())
    }
}

impl<K, V> FromIterator<(K, V)> for EventArguments
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Pairs(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
