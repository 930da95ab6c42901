//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals and effects.
//! It owns the dependency graph and the registry of live effects, and it
//! propagates signal writes.
//!
//! # How It Works
//!
//! 1. When an effect is created, it registers with the runtime.
//!
//! 2. When a signal is read inside a running effect, the runtime records an
//!    edge from the signal to that effect.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Snapshots the signal's observers
//!    b. Resolves them to live effects
//!    c. Releases every lock
//!    d. Runs each effect once, synchronously, in subscription order
//!
//! Because no lock is held while effects run, effects may freely read and
//! write signals, create new effects, or dispose old ones.
//!
//! # Thread Safety
//!
//! The registry and the graph are process-wide and lock-protected, so handles
//! can move between threads. The "currently running effect" lives in a
//! thread-local stack (see [`ReactiveContext`]).

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::subscriber::SubscriberId;
use crate::graph::{DependencyGraph, SignalId};

/// A computation that can be re-run when its dependencies change.
pub trait Reactive: Send + Sync {
    /// Get the subscriber ID for this computation.
    fn subscriber_id(&self) -> SubscriberId;

    /// Re-run the computation. Failures must be handled internally.
    fn rerun(&self);
}

/// The global reactive runtime.
pub struct Runtime;

static REGISTRY: OnceLock<RwLock<HashMap<SubscriberId, Arc<dyn Reactive>>>> = OnceLock::new();
static GRAPH: OnceLock<RwLock<DependencyGraph>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<SubscriberId, Arc<dyn Reactive>>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn graph() -> &'static RwLock<DependencyGraph> {
    GRAPH.get_or_init(|| RwLock::new(DependencyGraph::new()))
}

impl Runtime {
    /// Register a computation so signal writes can reach it.
    ///
    /// The registry holds a strong reference: an effect stays alive for as
    /// long as it is registered, whether or not its handle is kept.
    pub fn register(reactive: Arc<dyn Reactive>) {
        let id = reactive.subscriber_id();
        registry().write().insert(id, reactive);
    }

    /// Unregister a computation and drop all of its subscriptions.
    pub fn unregister(id: SubscriberId) {
        // Bind the removed entry so it is dropped after both locks are released.
        let removed = registry().write().remove(&id);
        graph().write().unlink_subscriber(id);
        drop(removed);
    }

    /// Check whether a computation is registered.
    pub fn is_registered(id: SubscriberId) -> bool {
        registry().read().contains_key(&id)
    }

    /// Record that the running effect, if any, read `signal_id`.
    ///
    /// Called by signals on every tracked read.
    pub fn track(signal_id: SignalId) {
        if let Some(subscriber_id) = ReactiveContext::current_subscriber() {
            if graph().write().link(signal_id, subscriber_id) {
                tracing::trace!(signal = %signal_id, effect = %subscriber_id, "subscribed");
            }
        }
    }

    /// Remove all dependencies for a subscriber.
    ///
    /// Called before re-running an effect that re-tracks its dependencies.
    pub fn clear_dependencies(subscriber_id: SubscriberId) {
        graph().write().unlink_subscriber(subscriber_id);
    }

    /// Signals a subscriber currently depends on.
    pub fn dependencies(subscriber_id: SubscriberId) -> Vec<SignalId> {
        graph().read().sources(subscriber_id)
    }

    /// Number of observers subscribed to a signal.
    pub fn observer_count(signal_id: SignalId) -> usize {
        graph().read().observer_count(signal_id)
    }

    /// Drop a signal's edges. Called when the last handle to it goes away.
    pub fn forget_signal(signal_id: SignalId) {
        graph().write().remove_signal(signal_id);
    }

    /// Notify all observers that a signal changed.
    ///
    /// This is the core update propagation mechanism.
    pub fn notify_signal_change(signal_id: SignalId) {
        let snapshot = graph().read().observers(signal_id);
        if snapshot.is_empty() {
            return;
        }

        let reactions: Vec<Arc<dyn Reactive>> = {
            let registry = registry().read();
            snapshot
                .iter()
                .filter_map(|id| registry.get(id).cloned())
                .collect()
        };

        tracing::trace!(signal = %signal_id, observers = reactions.len(), "propagating write");

        for reaction in reactions {
            reaction.rerun();
        }
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if we're inside a tracking context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}
