use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// One captured log event
#[derive(Debug, Clone, Serialize)]
pub struct CapturedEvent {
    pub level: String,
    pub target: String,
    pub message: String,
    /// Structured fields, excluding `message`
    pub fields: HashMap<String, serde_json::Value>,
    /// Nanoseconds since the Unix epoch
    pub timestamp: u128,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}

/// Shared storage for captured events
#[derive(Debug, Clone, Default)]
pub struct SharedEventStorage {
    events: Arc<RwLock<Vec<CapturedEvent>>>,
}

impl SharedEventStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: CapturedEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }

    /// All events, oldest first
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events whose message equals `message`
    pub fn find(&self, message: &str) -> Vec<CapturedEvent> {
        self.events
            .read()
            .map(|events| events.iter().filter(|e| e.message == message).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }
}

/// A tracing layer that records events in memory
pub struct InMemoryEventLayer {
    storage: Arc<SharedEventStorage>,
}

impl InMemoryEventLayer {
    pub fn new(storage: Arc<SharedEventStorage>) -> Self {
        Self { storage }
    }
}

impl<S> Layer<S> for InMemoryEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;

        let message = match fields.remove("message") {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let metadata = event.metadata();
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();

        self.storage.push(CapturedEvent {
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message,
            fields,
            timestamp,
        });
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture<F: FnOnce()>(f: F) -> Arc<SharedEventStorage> {
        let storage = Arc::new(SharedEventStorage::new());
        let subscriber =
            tracing_subscriber::registry().with(InMemoryEventLayer::new(storage.clone()));
        tracing::subscriber::with_default(subscriber, f);
        storage
    }

    #[test]
    fn captures_message_level_and_fields() {
        let storage = capture(|| {
            tracing::info!(document = "guide.pdf", chunk_count = 12u64, "document indexed");
            tracing::warn!(page = 3i64, "no extractable text on page");
        });

        assert_eq!(storage.len(), 2);
        let indexed = &storage.find("document indexed")[0];
        assert_eq!(indexed.level, "INFO");
        assert_eq!(indexed.field("document"), Some(&serde_json::json!("guide.pdf")));
        assert_eq!(indexed.field("chunk_count"), Some(&serde_json::json!(12)));
        assert!(indexed.field("message").is_none());

        let warned = &storage.find("no extractable text on page")[0];
        assert_eq!(warned.level, "WARN");
        assert_eq!(warned.field("page"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn display_fields_are_recorded_as_strings() {
        let path = std::path::Path::new("/tmp/notes.txt");
        let storage = capture(|| {
            tracing::error!(path = %path.display(), "failed to load document");
        });

        let event = &storage.events()[0];
        assert_eq!(event.field("path"), Some(&serde_json::json!("/tmp/notes.txt")));
    }

    #[test]
    fn clear_empties_storage() {
        let storage = capture(|| tracing::debug!("empty query, skipping search"));
        assert!(!storage.is_empty());
        storage.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn event_serialization() {
        let event = CapturedEvent {
            level: "INFO".to_string(),
            target: "docqa_rag::session".to_string(),
            message: "activated document".to_string(),
            fields: HashMap::new(),
            timestamp: 1234567890000000000,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"level\":\"INFO\""));
        assert!(json.contains("\"target\":\"docqa_rag::session\""));
        assert!(json.contains("\"timestamp\""));
    }
}
