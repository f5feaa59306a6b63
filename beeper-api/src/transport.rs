//! Host transport contract
//!
//! Every command the host invokes comes with a destination for its result.
//! A destination may receive any number of `keep_callback` results followed
//! by at most one final result; what the host does with them is its business.

use serde_json::Value;

/// Status of a result delivered to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStatus {
    Ok,
    Error,
    /// Final status with no payload, closes the destination
    NoResult,
}

/// Body of a result
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Text(String),
    Json(Value),
}

impl Payload {
    pub fn text(s: impl Into<String>) -> Self {
        Payload::Text(s.into())
    }

    /// Payload as the wire string the host receives
    pub fn to_wire(&self) -> String {
        match self {
            Payload::Empty => String::new(),
            Payload::Text(s) => s.clone(),
            Payload::Json(v) => v.to_string(),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// One result sent to the host
#[derive(Debug, Clone, PartialEq)]
pub struct PluginResult {
    pub status: ResultStatus,
    pub payload: Payload,
    /// When set the destination stays open for further results
    pub keep_callback: bool,
}

impl PluginResult {
    pub fn ok(payload: Payload) -> Self {
        Self {
            status: ResultStatus::Ok,
            payload,
            keep_callback: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            payload: Payload::Text(message.into()),
            keep_callback: false,
        }
    }

    pub fn no_result() -> Self {
        Self {
            status: ResultStatus::NoResult,
            payload: Payload::Empty,
            keep_callback: false,
        }
    }

    pub fn keep(mut self) -> Self {
        self.keep_callback = true;
        self
    }

    pub fn is_final(&self) -> bool {
        !self.keep_callback
    }
}

/// Destination for results of one host command
pub trait ResultSink: Send + Sync {
    fn send(&self, result: PluginResult);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_constructors() {
        let ok = PluginResult::ok(Payload::text("done"));
        assert_eq!(ok.status, ResultStatus::Ok);
        assert!(ok.is_final());

        let event = PluginResult::ok(json!({"bluetooth": "enabled"}).into()).keep();
        assert!(!event.is_final());
        assert_eq!(event.payload.to_wire(), r#"{"bluetooth":"enabled"}"#);

        let err = PluginResult::error("No permissions");
        assert_eq!(err.status, ResultStatus::Error);
        assert_eq!(err.payload, Payload::Text("No permissions".into()));

        let done = PluginResult::no_result();
        assert_eq!(done.status, ResultStatus::NoResult);
        assert_eq!(done.payload.to_wire(), "");
    }
}
