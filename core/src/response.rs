//! Normalized result of a successful call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object returned to callers, always carrying a `status` once it
/// leaves `classify`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiResponse(Map<String, Value>);

impl ApiResponse {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// `{success: true, text}` wrapper for string and opaque bodies.
    pub fn text_body(text: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(true));
        map.insert("text".to_string(), Value::String(text.into()));
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// The numeric `status` field, if it holds a valid HTTP status.
    pub fn status(&self) -> Option<u16> {
        self.0
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }

    pub fn text(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ApiResponse {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<ApiResponse> for Value {
    fn from(response: ApiResponse) -> Self {
        Value::Object(response.0)
    }
}
