//! Developer-tools events.
//!
//! A store configured with an [`EventSink`] reports its lifecycle as
//! [`DevToolsEvent`]s. Sinks are called synchronously from the store's write
//! path, so they should hand events off rather than do work inline.

use crate::value::Value;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;

/// What happened to a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Loading,
    Init,
    Override,
    Update {
        /// Custom action name, when the caller supplied one.
        action: Option<String>,
        /// Number of changed leaves relative to the previous value.
        changes: usize,
    },
    Reset,
    HardReset,
    Destroy,
}

/// One event reported to a sink.
#[derive(Clone, Debug, Serialize)]
pub struct DevToolsEvent {
    pub store_name: String,
    pub kind: EventKind,
    /// The store value after the event, if any.
    pub value: Option<Value>,
}

/// Receiver of developer-tools events.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: DevToolsEvent);
}

/// Forwards events into a channel.
pub struct ChannelSink {
    sender: Sender<DevToolsEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<DevToolsEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn on_event(&self, event: DevToolsEvent) {
        let _ = self.sender.send(event);
    }
}

/// Logs events at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: DevToolsEvent) {
        match &event.kind {
            EventKind::Update { action, changes } => tracing::debug!(
                "[{}] update{} ({} changes)",
                event.store_name,
                action.as_deref().map(|a| format!(" \"{}\"", a)).unwrap_or_default(),
                changes
            ),
            kind => tracing::debug!("[{}] {:?}", event.store_name, kind),
        }
    }
}
