//! Boundary contracts with the external event store.
//!
//! The engine consumes a lazy stream of raw events, and hands results back
//! through two sinks: per-record labels to the annotation sink and the final
//! report to the finding sink. All three are externally owned; the in-memory
//! implementations here exist for tests and embedding.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bruteforce_core::AnalyzerOutput;

/// A raw event pulled from the indexed event store.
///
/// `source` is the opaque per-record field mapping returned by the store for
/// the requested return fields.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Opaque document ID.
    pub event_id: String,

    /// Event time in microseconds since epoch, as stored.
    pub timestamp_us: i64,

    pub source: BTreeMap<String, serde_json::Value>,
}

impl RawEvent {
    pub fn new(event_id: &str, timestamp_us: i64) -> Self {
        Self {
            event_id: event_id.to_string(),
            timestamp_us,
            source: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: serde_json::Value) -> Self {
        self.source.insert(key.to_string(), value);
        self
    }

    /// Event time in Unix seconds.
    pub fn timestamp_secs(&self) -> i64 {
        self.timestamp_us / 1_000_000
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.source.get(key).and_then(|v| v.as_str())
    }

    /// Field as u64, accepting both numeric and numeric-string encodings.
    pub fn u64_field(&self, key: &str) -> Option<u64> {
        self.source.get(key).and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        })
    }
}

/// Source of raw events. One query is issued per analyzer invocation.
pub trait EventSource {
    /// Stream events matching `query_string`, restricted to `return_fields`.
    fn event_stream(
        &mut self,
        query_string: &str,
        return_fields: &[&str],
    ) -> Box<dyn Iterator<Item = RawEvent> + '_>;
}

/// Label and star applied to annotated events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub label: String,
    pub star: bool,
}

impl Annotation {
    pub fn starred(label: &str) -> Self {
        Self {
            label: label.to_string(),
            star: true,
        }
    }
}

/// Receives the event IDs to label back in the event store.
pub trait AnnotationSink {
    fn annotate(&mut self, event_ids: &[String], annotation: &Annotation) -> Result<(), String>;
}

/// Receives the final analyzer output.
pub trait FindingSink {
    fn send(&mut self, output: &AnalyzerOutput) -> Result<(), String>;
}

/// Cooperative cancellation flag, checked between IPs and between records.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// In-memory event source for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    events: Vec<RawEvent>,
    pub queries: Vec<String>,
}

impl MemoryEventSource {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            queries: Vec::new(),
        }
    }
}

impl EventSource for MemoryEventSource {
    fn event_stream(
        &mut self,
        query_string: &str,
        _return_fields: &[&str],
    ) -> Box<dyn Iterator<Item = RawEvent> + '_> {
        self.queries.push(query_string.to_string());
        Box::new(self.events.iter().cloned())
    }
}

/// In-memory annotation sink for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAnnotationSink {
    pub calls: Vec<(Vec<String>, Annotation)>,
}

impl MemoryAnnotationSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnnotationSink for MemoryAnnotationSink {
    fn annotate(&mut self, event_ids: &[String], annotation: &Annotation) -> Result<(), String> {
        self.calls.push((event_ids.to_vec(), annotation.clone()));
        Ok(())
    }
}

/// In-memory finding sink for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFindingSink {
    pub outputs: Vec<AnalyzerOutput>,
}

impl MemoryFindingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FindingSink for MemoryFindingSink {
    fn send(&mut self, output: &AnalyzerOutput) -> Result<(), String> {
        self.outputs.push(output.clone());
        Ok(())
    }
}

/// Annotation sink that fails every call. Test helper for the sink error
/// path.
#[derive(Debug, Clone, Default)]
pub struct FailingAnnotationSink;

impl AnnotationSink for FailingAnnotationSink {
    fn annotate(&mut self, _event_ids: &[String], _annotation: &Annotation) -> Result<(), String> {
        Err("annotation store unavailable".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_conversion() {
        let event = RawEvent::new("evt_1", 1_700_000_000_123_456);
        assert_eq!(event.timestamp_secs(), 1_700_000_000);
    }

    #[test]
    fn test_u64_field_accepts_string_encoding() {
        let event = RawEvent::new("evt_1", 0)
            .with_field("event_identifier", json!(4624))
            .with_field("port", json!("50224"));
        assert_eq!(event.u64_field("event_identifier"), Some(4624));
        assert_eq!(event.u64_field("port"), Some(50224));
        assert_eq!(event.u64_field("missing"), None);
    }

    #[test]
    fn test_memory_source_records_queries() {
        let mut source = MemoryEventSource::new(vec![RawEvent::new("evt_1", 1_000_000)]);
        let collected: Vec<_> = source.event_stream("reporter:sshd", &["body"]).collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(source.queries, vec!["reporter:sshd".to_string()]);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
