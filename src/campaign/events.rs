//! Progress events.
//!
//! The engine emits one [`ProgressEvent`] after every committed node. Sinks
//! decide what to do with them; the engine never formats anything for display.

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;

use super::graph::NodeId;
use super::state::CampaignState;

/// A node finished and its state was committed.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub node: NodeId,
    pub snapshot: CampaignState,
}

impl ProgressEvent {
    pub fn new(node: NodeId, snapshot: CampaignState) -> Self {
        Self { node, snapshot }
    }
}

/// Receives progress events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

impl EventSink for mpsc::UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // Receiver gone means nobody is watching
        let _ = self.send(event);
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ProgressEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node names in emission order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.events.lock().map(|events| events.iter().map(|e| e.node).collect()).unwrap_or_default()
    }

    /// Take the recorded events.
    pub fn take(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|mut events| std::mem::take(&mut *events)).unwrap_or_default()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
