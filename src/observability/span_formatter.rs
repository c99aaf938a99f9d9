//! Flattens finished spans into one JSON object each.
//!
//! Output shape, one line per span:
//!
//! ```json
//! {
//!   "service": "newsrank",
//!   "traceId": "4bf92f3577b34da6a3ce929d0e0e4736",
//!   "spanId": "00f067aa0ba902b7",
//!   "parentSpanId": null,
//!   "name": "fetch_page",
//!   "start": "2024-06-01T12:00:00.000000Z",
//!   "durationUs": 1830,
//!   "attributes": { "collection": "articles", "offset": 500 },
//!   "events": [{ "name": "page applied", "time": "...", "attributes": {} }],
//!   "status": "unset"
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use opentelemetry::trace::{Event, SpanId, Status};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::SpanData;
use serde_json::{json, Map, Value as JsonValue};
use std::time::SystemTime;

/// Converts [`SpanData`] to the JSON-lines record format above.
#[derive(Debug, Clone)]
pub struct SpanFormatter {
    service: String,
}

impl SpanFormatter {
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    pub fn format_span(&self, span: &SpanData) -> JsonValue {
        let parent = (span.parent_span_id != SpanId::INVALID).then(|| format!("{:016x}", span.parent_span_id));
        let duration_us = span
            .end_time
            .duration_since(span.start_time)
            .map_or(0, |d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX));

        json!({
            "service": self.service,
            "traceId": format!("{:032x}", span.span_context.trace_id()),
            "spanId": format!("{:016x}", span.span_context.span_id()),
            "parentSpanId": parent,
            "name": span.name,
            "start": timestamp(span.start_time),
            "durationUs": duration_us,
            "attributes": attributes(&span.attributes),
            "events": span.events.iter().map(event).collect::<Vec<_>>(),
            "status": status(&span.status),
        })
    }
}

fn timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn event(event: &Event) -> JsonValue {
    json!({
        "name": event.name,
        "time": timestamp(event.timestamp),
        "attributes": attributes(&event.attributes),
    })
}

fn attributes(pairs: &[KeyValue]) -> JsonValue {
    let map: Map<String, JsonValue> = pairs
        .iter()
        .map(|kv| (kv.key.to_string(), attribute_value(&kv.value)))
        .collect();
    JsonValue::Object(map)
}

fn attribute_value(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => json!(b),
        Value::I64(i) => json!(i),
        Value::F64(f) => json!(f),
        Value::String(s) => json!(s.as_str()),
        Value::Array(_) => json!(value.to_string()),
    }
}

fn status(status: &Status) -> String {
    match status {
        Status::Unset => "unset".to_string(),
        Status::Ok => "ok".to_string(),
        Status::Error { description } => format!("error: {description}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_their_json_types() {
        let json = attributes(&[
            KeyValue::new("collection", "keywords"),
            KeyValue::new("offset", 1000_i64),
            KeyValue::new("boost", 0.075),
            KeyValue::new("exhausted", true),
        ]);
        assert_eq!(
            json,
            json!({ "collection": "keywords", "offset": 1000, "boost": 0.075, "exhausted": true })
        );
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(attribute_value(&Value::F64(f64::NAN)), JsonValue::Null);
    }

    #[test]
    fn error_status_carries_description() {
        assert_eq!(status(&Status::error("store offline")), "error: store offline");
        assert_eq!(status(&Status::Unset), "unset");
    }
}
