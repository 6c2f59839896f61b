use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

/// Sentinel for `model`/`status` when the payload omits the field.
pub const UNKNOWN: &str = "unknown";

/// Sentinel for `latency` when the payload omits the field or it is non-numeric.
pub const NO_LATENCY: f64 = -1.0;

/// One successfully parsed log entry.
///
/// A record is either fully populated (with defaults substituted field by
/// field) or not produced at all — partial records never leave the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedRecord {
    pub model: String,
    /// Request latency in seconds; `NO_LATENCY` when the payload had none.
    pub latency: f64,
    pub prompt: String,
    /// Free-form; `"success"` and `"failure"` are the recognized values but
    /// the parser accepts any string.
    pub status: String,
    /// Set only by the anchored contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
    /// Set only by the anchored contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl ParsedRecord {
    /// Build a record from a decoded JSON payload, substituting a default for
    /// each absent or mistyped field independently.
    ///
    /// `prompt` falls back to the alternate payload key `input` when `prompt`
    /// itself is absent; empty string when neither is present.
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let prompt = payload
            .get("prompt")
            .and_then(Value::as_str)
            .or_else(|| payload.get("input").and_then(Value::as_str))
            .unwrap_or_default();

        Self {
            model: payload
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string(),
            latency: payload
                .get("latency")
                .and_then(Value::as_f64)
                .unwrap_or(NO_LATENCY),
            prompt: prompt.to_string(),
            status: payload
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string(),
            timestamp: None,
            level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_payload_yields_all_defaults() {
        let r = ParsedRecord::from_payload(&payload("{}"));
        assert_eq!(r.model, "unknown");
        assert_eq!(r.latency, -1.0);
        assert_eq!(r.prompt, "");
        assert_eq!(r.status, "unknown");
        assert!(r.timestamp.is_none());
        assert!(r.level.is_none());
    }

    #[test]
    fn test_prompt_falls_back_to_input_key() {
        let r = ParsedRecord::from_payload(&payload(r#"{"input":"from input"}"#));
        assert_eq!(r.prompt, "from input");

        // Primary key wins when both are present
        let r = ParsedRecord::from_payload(&payload(r#"{"prompt":"p","input":"i"}"#));
        assert_eq!(r.prompt, "p");
    }

    #[test]
    fn test_non_numeric_latency_gets_sentinel() {
        let r = ParsedRecord::from_payload(&payload(r#"{"latency":"fast"}"#));
        assert_eq!(r.latency, -1.0);

        let r = ParsedRecord::from_payload(&payload(r#"{"latency":2}"#));
        assert_eq!(r.latency, 2.0);
    }

    #[test]
    fn test_export_serialization_skips_absent_prefix_fields() {
        let r = ParsedRecord::from_payload(&payload(r#"{"model":"gpt-4"}"#));
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("timestamp"));
        assert!(!json.contains("level"));
        assert!(json.contains(r#""model":"gpt-4""#));
    }
}
