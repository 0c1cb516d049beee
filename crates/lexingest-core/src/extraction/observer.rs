//! Structured attempt events and the observer seam that receives them.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::document::StrategyKind;

/// One strategy invocation, as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptEvent {
    pub strategy: StrategyKind,
    pub succeeded: bool,
    pub duration_ms: u64,
    pub text_length: usize,
    pub error_reason: Option<String>,
}

/// Receives one event per strategy invocation.
pub trait ExtractionObserver: Send + Sync {
    fn on_attempt(&self, event: &AttemptEvent);
}

/// Logs attempts through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExtractionObserver for TracingObserver {
    fn on_attempt(&self, event: &AttemptEvent) {
        if event.succeeded {
            info!(
                strategy = event.strategy.name(),
                duration_ms = event.duration_ms,
                text_length = event.text_length,
                "extraction attempt succeeded"
            );
        } else {
            warn!(
                strategy = event.strategy.name(),
                duration_ms = event.duration_ms,
                text_length = event.text_length,
                error_reason = event.error_reason.as_deref().unwrap_or("empty"),
                "extraction attempt produced no text"
            );
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<AttemptEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AttemptEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ExtractionObserver for RecordingObserver {
    fn on_attempt(&self, event: &AttemptEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Forwards to several observers.
pub struct FanOutObserver {
    observers: Vec<std::sync::Arc<dyn ExtractionObserver>>,
}

impl FanOutObserver {
    pub fn new(observers: Vec<std::sync::Arc<dyn ExtractionObserver>>) -> Self {
        Self { observers }
    }
}

impl ExtractionObserver for FanOutObserver {
    fn on_attempt(&self, event: &AttemptEvent) {
        for observer in &self.observers {
            observer.on_attempt(event);
        }
    }
}
