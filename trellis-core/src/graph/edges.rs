//! Edge Store
//!
//! [`DependencyGraph`] is a plain data structure. The runtime keeps one
//! instance behind a lock and never calls into user code while holding it.

use std::collections::HashMap;

use super::node::{SignalId, SourceNode, SubscriberNode};
use crate::reactive::SubscriberId;

/// Bidirectional signal/subscriber edge store.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    sources: HashMap<SignalId, SourceNode>,
    subscribers: HashMap<SubscriberId, SubscriberNode>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `subscriber` read `signal`.
    ///
    /// Returns `true` if the edge is new.
    pub fn link(&mut self, signal: SignalId, subscriber: SubscriberId) -> bool {
        let added = self
            .sources
            .entry(signal)
            .or_default()
            .observers
            .insert(subscriber);
        if added {
            self.subscribers
                .entry(subscriber)
                .or_default()
                .sources
                .insert(signal);
        }
        added
    }

    /// Snapshot of the observers of `signal`, in subscription order.
    pub fn observers(&self, signal: SignalId) -> Vec<SubscriberId> {
        self.sources
            .get(&signal)
            .map(|node| node.observers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the signals `subscriber` depends on.
    pub fn sources(&self, subscriber: SubscriberId) -> Vec<SignalId> {
        self.subscribers
            .get(&subscriber)
            .map(|node| node.sources.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of observers currently subscribed to `signal`.
    pub fn observer_count(&self, signal: SignalId) -> usize {
        self.sources
            .get(&signal)
            .map_or(0, |node| node.observers.len())
    }

    /// Remove every edge that ends at `subscriber`.
    pub fn unlink_subscriber(&mut self, subscriber: SubscriberId) {
        let Some(node) = self.subscribers.remove(&subscriber) else {
            return;
        };
        for signal in node.sources {
            if let Some(source) = self.sources.get_mut(&signal) {
                // shift_remove keeps the notification order of the others
                source.observers.shift_remove(&subscriber);
                if source.observers.is_empty() {
                    self.sources.remove(&signal);
                }
            }
        }
    }

    /// Remove `signal` and every edge that starts at it.
    pub fn remove_signal(&mut self, signal: SignalId) {
        let Some(node) = self.sources.remove(&signal) else {
            return;
        };
        for subscriber in node.observers {
            if let Some(sub) = self.subscribers.get_mut(&subscriber) {
                sub.sources.shift_remove(&signal);
                if sub.sources.is_empty() {
                    self.subscribers.remove(&subscriber);
                }
            }
        }
    }

    /// Total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.sources.values().map(|node| node.observers.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_is_idempotent() {
        let mut graph = DependencyGraph::new();
        let signal = SignalId::new();
        let sub = SubscriberId::new();

        assert!(graph.link(signal, sub));
        assert!(!graph.link(signal, sub));
        assert_eq!(graph.observer_count(signal), 1);
        assert_eq!(graph.sources(sub), vec![signal]);
    }

    #[test]
    fn unlink_subscriber_removes_both_directions() {
        let mut graph = DependencyGraph::new();
        let a = SignalId::new();
        let b = SignalId::new();
        let first = SubscriberId::new();
        let second = SubscriberId::new();

        graph.link(a, first);
        graph.link(b, first);
        graph.link(a, second);
        assert_eq!(graph.edge_count(), 3);

        graph.unlink_subscriber(first);

        assert_eq!(graph.observers(a), vec![second]);
        assert!(graph.observers(b).is_empty());
        assert!(graph.sources(first).is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn removing_a_signal_keeps_other_edges() {
        let mut graph = DependencyGraph::new();
        let a = SignalId::new();
        let b = SignalId::new();
        let sub = SubscriberId::new();

        graph.link(a, sub);
        graph.link(b, sub);
        graph.remove_signal(a);

        assert_eq!(graph.sources(sub), vec![b]);
        assert_eq!(graph.observer_count(a), 0);
    }

    #[test]
    fn observers_snapshot_preserves_order_after_removal() {
        let mut graph = DependencyGraph::new();
        let signal = SignalId::new();
        let subs: Vec<_> = (0..4).map(|_| SubscriberId::new()).collect();
        for sub in &subs {
            graph.link(signal, *sub);
        }

        graph.unlink_subscriber(subs[1]);

        assert_eq!(graph.observers(signal), vec![subs[0], subs[2], subs[3]]);
    }
}
