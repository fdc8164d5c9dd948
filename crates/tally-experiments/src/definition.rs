//! Server-provided experiment definitions.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One experiment as sent by the ingestion server.
///
/// The server spells the fields `name`/`variants`; `names`/`variantWeights`
/// are accepted as well. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentDefinition {
    /// Aliases, oldest first; the last entry is the canonical name.
    #[serde(rename = "name", alias = "names", default)]
    pub names: Vec<String>,

    /// Weight per variant; index 0 is `A`, 1 is `B`, and so on.
    #[serde(rename = "variants", alias = "variantWeights", default)]
    pub variant_weights: Vec<i64>,
}

impl ExperimentDefinition {
    pub fn new<I, S>(names: I, variant_weights: Vec<i64>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            variant_weights,
        }
    }

    /// Name hashed together with the user id. Empty when there are no names.
    pub fn canonical_name(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or_default()
    }
}

/// Parse a definition list, treating anything malformed as "no experiments".
pub fn parse_definitions(json: &str) -> Vec<ExperimentDefinition> {
    if json.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str(json) {
        Ok(definitions) => definitions,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed experiment definitions");
            Vec::new()
        }
    }
}
