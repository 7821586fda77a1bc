//! Publish/subscribe registry for chart event kinds.
//!
//! Presentation code subscribes to the kinds it cares about (`START_KIND`,
//! `":z"`, `"flash"`, ...) and is notified when a session fires them.
//! Listeners are either in-thread callbacks or crossbeam channels for
//! consumers living on another thread.

use crate::models::event::MuseEvent;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::HashMap;
use std::fmt;

/// Kind emitted once when a session starts playing.
///
/// Chart records never contain a space, so no chart event can share it.
pub const START_KIND: &str = "session start";

/// Handle returned by `subscribe`, used to detach the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

enum Sink {
    Callback(Box<dyn FnMut(&MuseEvent) + Send>),
    Channel(Sender<MuseEvent>),
}

struct Listener {
    id: ListenerId,
    sink: Sink,
}

/// Ordered listeners per event kind.
#[derive(Default)]
pub struct EventEmitter {
    listeners: HashMap<String, Vec<Listener>>,
    next_id: u64,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `callback` every time `kind` is emitted.
    pub fn subscribe<F>(&mut self, kind: impl Into<String>, callback: F) -> ListenerId
    where
        F: FnMut(&MuseEvent) + Send + 'static,
    {
        self.attach(kind.into(), Sink::Callback(Box::new(callback)))
    }

    /// Forwards every `kind` event into a new channel.
    ///
    /// Dropping the receiver is enough to unsubscribe; the listener is pruned
    /// on the next emit.
    pub fn subscribe_channel(&mut self, kind: impl Into<String>) -> (ListenerId, Receiver<MuseEvent>) {
        let (tx, rx) = unbounded();
        let id = self.attach(kind.into(), Sink::Channel(tx));
        (id, rx)
    }

    fn attach(&mut self, kind: String, sink: Sink) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        log::debug!("EMITTER: listener {:?} on {:?}", id, kind);
        self.listeners.entry(kind).or_default().push(Listener { id, sink });
        id
    }

    /// Detaches a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let mut found = false;
        self.listeners.retain(|_, list| {
            let before = list.len();
            list.retain(|l| l.id != id);
            found |= list.len() != before;
            !list.is_empty()
        });
        found
    }

    /// Notifies the listeners of `kind` in subscription order.
    pub fn emit(&mut self, kind: &str, event: &MuseEvent) {
        let Some(list) = self.listeners.get_mut(kind) else {
            return;
        };

        list.retain_mut(|listener| match &mut listener.sink {
            Sink::Callback(callback) => {
                callback(event);
                true
            }
            Sink::Channel(tx) => tx.send(event.clone()).is_ok(),
        });

        if list.is_empty() {
            self.listeners.remove(kind);
        }
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.listeners.get(kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Detaches every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(kind, list)| (kind.as_str(), list.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}
