use serde::{Deserialize, Serialize};

/// Comparison operator applied by an assertion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
}

/// One assertion rule evaluated by the checker against a probe response.
///
/// Rules are stored serialized on the monitor and deserialized on every
/// payload build, so the stored form and this type must stay in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Assertion {
    Status { compare: Compare, target: i64 },
    Header { compare: Compare, key: String, target: String },
    TextBody { compare: Compare, target: String },
}

/// Deserialize a stored assertion rule set.
pub fn parse_assertions(raw: &str) -> Result<Vec<Assertion>, serde_json::Error> {
    serde_json::from_str(raw)
}
