//! # Audit Events
//!
//! Every state transition in the core emits an ordered
//! `{timestamp, event_type, data}` tuple. An external audit/provenance
//! collaborator consumes them verbatim, so the shape is fixed here and
//! components only ever see the [`AuditSink`] trait.

use crate::time::iso8601;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// ISO-8601 UTC, trailing `Z`.
    pub timestamp: String,
    pub event_type: String,
    pub data: Value,
}

impl AuditEvent {
    pub fn new(at: DateTime<Utc>, event_type: impl Into<String>, data: Value) -> Self {
        Self {
            timestamp: iso8601(at),
            event_type: event_type.into(),
            data,
        }
    }
}

/// Destination for audit events.
///
/// Implementations must preserve submission order.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Append-only in-memory log.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.event_type.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.write().push(event);
    }
}

/// Mirrors audit events into the `tracing` pipeline under the `audit`
/// target.
#[derive(Debug, Clone, Copy)]
pub struct TracingAuditSink {
    component: &'static str,
}

impl TracingAuditSink {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            component = self.component,
            event_type = %event.event_type,
            timestamp = %event.timestamp,
            data = %event.data,
            "audit event"
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
