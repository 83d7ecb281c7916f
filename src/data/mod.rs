//! Upstream data: the static team catalog and the NHL web API client.

pub mod catalog;
pub mod client;

pub use catalog::*;
pub use client::{RawRecord, StatsClient};

use serde_json::Value;

/// Article + JSON type name, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
