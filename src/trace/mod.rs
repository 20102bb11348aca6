//! Trace ingestion.
//!
//! A capture is fed by a [`TraceSource`] that is pulled repeatedly until it
//! reports exhaustion. Each pull delivers zero or more [`TraceEvent`]s to a
//! [`TraceSink`], normally a [`crate::graph::GraphStore`].

mod cc_log;

pub use cc_log::{CcLogSource, DEFAULT_BATCH_LINES};

use crate::types::Address;
use crate::Result;

/// A single observation delivered by a trace source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TraceEvent {
    /// A reference-counted object with its current count.
    RefCountedNode {
        /// Object identity.
        address: Address,
        /// Known owning reference count.
        ref_count: u64,
        /// Runtime description of the object.
        name: String,
    },
    /// A garbage-collected object.
    GcNode {
        /// Object identity.
        address: Address,
        /// Whether the collector had marked the object live.
        marked: bool,
        /// Runtime description of the object.
        name: String,
    },
    /// An owning reference from `from` to `to`.
    Edge {
        /// The object holding the reference.
        from: Address,
        /// The object kept alive by the reference.
        to: Address,
        /// Description of the reference (field name, slot kind).
        label: String,
    },
    /// An object the collector treats as inherently alive.
    Root {
        /// Object identity.
        address: Address,
        /// Number of incoming owning edges the collector could account for.
        known_edges: u64,
    },
    /// A member of an already-identified uncollectable cycle.
    Garbage {
        /// Object identity.
        address: Address,
    },
}

/// Receiver of trace events.
pub trait TraceSink {
    /// Consumes one event. Events may arrive in any order.
    fn observe(&mut self, event: TraceEvent);
}

/// Producer side of the pull protocol.
pub trait TraceSource {
    /// Delivers the next batch of events to `sink`.
    ///
    /// Returns `Ok(true)` while more data remains and `Ok(false)` once the
    /// source is exhausted.
    fn process_next(&mut self, sink: &mut dyn TraceSink) -> Result<bool>;
}

/// Pulls `source` until it reports exhaustion, returning the number of pulls.
pub fn drain(source: &mut dyn TraceSource, sink: &mut dyn TraceSink) -> Result<usize> {
    let mut pulls = 1;
    while source.process_next(sink)? {
        pulls += 1;
    }
    Ok(pulls)
}

/// Replays an in-memory list of events in fixed-size batches.
#[derive(Clone, Debug)]
pub struct EventSource {
    events: std::vec::IntoIter<TraceEvent>,
    batch: usize,
}

impl EventSource {
    /// Default number of events handed out per pull.
    pub const DEFAULT_BATCH: usize = 1024;

    /// Creates a source replaying `events` in arrival order.
    pub fn new(events: Vec<TraceEvent>) -> Self {
        Self::with_batch(events, Self::DEFAULT_BATCH)
    }

    /// Creates a source that hands out at most `batch` events per pull.
    pub fn with_batch(events: Vec<TraceEvent>, batch: usize) -> Self {
        Self {
            events: events.into_iter(),
            batch: batch.max(1),
        }
    }
}

impl TraceSource for EventSource {
    fn process_next(&mut self, sink: &mut dyn TraceSink) -> Result<bool> {
        for event in self.events.by_ref().take(self.batch) {
            sink.observe(event);
        }
        Ok(self.events.len() > 0)
    }
}

impl FromIterator<TraceEvent> for EventSource {
    fn from_iter<I: IntoIterator<Item = TraceEvent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
