//! Deferred work requested by the datastore.
//!
//! Table operations never block. Anything that needs I/O (hostname lookups,
//! regex reloads for a client) is requested by raising an event that a
//! worker outside the datastore picks up.

use crate::entities::ClientId;
use log::debug;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// New clients or upstreams are waiting for reverse lookups
    ResolveNewHostnames,
    /// Group membership of this client must be re-evaluated
    ReloadClientRegex(ClientId),
}

/// Fire-and-forget sink for `StoreEvent`s.
pub trait EventRaiser: Send + Sync {
    fn raise(&self, event: StoreEvent);
}

/// Drops every event.
#[derive(Debug, Default)]
pub struct NullEvents;

impl EventRaiser for NullEvents {
    fn raise(&self, _event: StoreEvent) {}
}

/// Forwards events to a tokio task through an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelEvents {
    tx: UnboundedSender<StoreEvent>,
}

impl ChannelEvents {
    pub fn new() -> (Self, UnboundedReceiver<StoreEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventRaiser for ChannelEvents {
    fn raise(&self, event: StoreEvent) {
        // A closed receiver means nobody is consuming events any more
        if self.tx.send(event).is_err() {
            debug!("Event {:?} dropped, receiver closed", event);
        }
    }
}

/// Keeps raised events in memory until drained.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<StoreEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<StoreEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventRaiser for EventLog {
    fn raise(&self, event: StoreEvent) {
        self.events.lock().push(event);
    }
}
