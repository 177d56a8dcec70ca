//! Engine configuration store.
//!
//! An opaque key-value map. The engine core itself reads only
//! [`CLEAN_OUTPUT_PATH`]; everything else is for modules and embedders.

use serde_json::Value;
use std::collections::HashMap;

/// When true, the output path is cleaned at the start of every run.
pub const CLEAN_OUTPUT_PATH: &str = "CleanOutputPath";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// A boolean setting; absent or non-boolean values read as false.
    pub fn get_bool(&self, key: &str) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
