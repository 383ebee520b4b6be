//! Typed accessors over a tool call's parsed arguments.

use serde::de::DeserializeOwned;

use crate::error::{AgentryError, Result};

/// Parsed tool-call arguments with convenience accessors.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Parse a raw arguments string. Malformed JSON surfaces here, at the
    /// point of invocation, never earlier.
    pub fn parse(raw: &str) -> Result<Self> {
        let value = if raw.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(raw)?
        };
        Ok(Self { value })
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.get_str_opt(key)
            .ok_or_else(|| AgentryError::InvalidArgument(format!("missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| AgentryError::InvalidArgument(format!("missing integer argument: {key}")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| AgentryError::InvalidArgument(format!("missing boolean argument: {key}")))
    }

    /// Deserialize the whole argument object into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}
