//! Logging setup for DocQA binaries.
//!
//! Every library crate logs through `tracing`; a binary picks one of the
//! initializers below once at startup. The filter comes from `RUST_LOG` and
//! falls back to `info`.
//!
//! ```rust,ignore
//! docqa_telemetry::init_telemetry("ask-document")?;
//! tracing::info!(document = "guide.pdf", "document indexed");
//! ```

pub mod memory;

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub use memory::{CapturedEvent, InMemoryEventLayer, SharedEventStorage};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Telemetry initialization failed: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Build the `RUST_LOG` filter, or `info` when unset or unparsable.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Human-readable logs on stderr.
pub fn init_telemetry(service_name: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(service.name = service_name, "telemetry initialized");
    Ok(())
}

/// One JSON object per line on stderr, for log shippers.
pub fn init_json_telemetry(service_name: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(service.name = service_name, format = "json", "telemetry initialized");
    Ok(())
}

/// Human-readable logs plus capture of every event into `storage`.
pub fn init_with_storage(service_name: &str, storage: Arc<SharedEventStorage>) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(InMemoryEventLayer::new(storage))
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(service.name = service_name, "telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can be set once per process, so both calls live
    // in one test.
    #[test]
    fn second_initialization_fails() {
        let storage = Arc::new(SharedEventStorage::new());
        init_with_storage("test-service", storage.clone()).unwrap();

        let events = storage.find("telemetry initialized");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].field("service.name"), Some(&serde_json::json!("test-service")));

        let err = init_telemetry("again").unwrap_err();
        assert!(matches!(err, TelemetryError::Init(_)));
        assert!(init_json_telemetry("again").is_err());
    }
}
