//! Query options passed to find/update/destroy

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pagination keys copied into the query string of read requests
pub const PAGINATION_KEYS: [&str; 3] = ["skip", "limit", "offset"];

/// Query options: a `where` clause, pagination and free-form extra options
///
/// Extra options whose key matches a connection config key override that
/// config value for the duration of one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Nested query conditions
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,

    /// Everything else (sort, config overrides, API-specific options)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueryOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Options addressing a single record by id
    pub fn by_id(id: impl Into<Value>) -> Self {
        Self::new().filter("id", id)
    }

    /// Add a condition to the `where` clause
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_clause
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the `where` clause
    pub fn with_where(mut self, clause: Map<String, Value>) -> Self {
        self.where_clause = Some(clause);
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add a free-form option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Single-resource id from `where.id`, when it is a string or number
    ///
    /// Operator objects such as `{"in": [1, 2]}` do not address a single resource.
    pub fn single_id(&self) -> Option<&Value> {
        self.where_clause
            .as_ref()
            .and_then(|clause| clause.get("id"))
            .filter(|id| is_scalar_id(id))
    }

    /// Remove and return the single-resource id from the `where` clause
    pub fn take_single_id(&mut self) -> Option<Value> {
        self.single_id()?;
        self.where_clause.as_mut().and_then(|clause| clause.remove("id"))
    }

    /// Pagination values that are set
    pub fn pagination(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in PAGINATION_KEYS.iter().zip([self.skip, self.limit, self.offset]) {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::from(value));
            }
        }
        map
    }
}

/// Returns true for ids usable as a path segment
pub fn is_scalar_id(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

/// Render an id as a URL path segment
pub fn id_segment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
