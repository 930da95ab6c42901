//! Dependency Graph
//!
//! This module stores the edges between signals and the effects that read
//! them.
//!
//! # Overview
//!
//! The graph is bipartite:
//!
//! - Sources are signals, identified by [`SignalId`]
//! - Subscribers are effects, identified by
//!   [`SubscriberId`](crate::reactive::SubscriberId)
//! - An edge from a signal to a subscriber means the subscriber read the
//!   signal during one of its runs
//!
//! Both directions are indexed. The forward direction (signal to observers)
//! drives notification; the reverse direction (subscriber to sources) lets an
//! effect drop all of its edges in one step when it is disposed or when it
//! re-tracks its dependencies.
//!
//! # Ordering
//!
//! Observer sets are insertion-ordered, so the notification order for a
//! signal is the order in which its observers first read it. Callers always
//! receive a snapshot, never a live view, because notifying an observer may
//! add edges to the very set being iterated.

mod edges;
mod node;

pub use edges::DependencyGraph;
pub use node::SignalId;
