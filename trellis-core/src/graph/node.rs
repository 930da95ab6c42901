//! Graph Nodes
//!
//! Identifiers and per-node edge sets for the dependency graph.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;

use crate::reactive::SubscriberId;

/// Unique identifier for a signal in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

impl SignalId {
    /// Generate a new unique signal ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SignalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for SignalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal#{}", self.0)
    }
}

/// Outgoing edges of a signal: the effects that have read it.
#[derive(Debug, Default)]
pub(crate) struct SourceNode {
    pub(crate) observers: IndexSet<SubscriberId>,
}

/// Incoming edges of an effect: the signals it has read.
#[derive(Debug, Default)]
pub(crate) struct SubscriberNode {
    pub(crate) sources: IndexSet<SignalId>,
}
