//! Scopes
//!
//! A scope is the lifetime of one component instance. Scopes form a tree:
//! disposing a scope first disposes its children, depth-first and in the
//! order they were created, and then runs its own cleanup actions in the order
//! they were registered.
//!
//! # Ownership
//!
//! Scopes of one tree share an arena ([`ScopeTree`]). A [`Scope`] is a cheap
//! handle: an ID plus a reference to the arena. The parent link is an ID too,
//! used only to register new children, so there are no ownership cycles
//! between parents and children.
//!
//! # Failure Handling
//!
//! Cleanup actions may fail. What happens next is chosen by the tree's
//! [`CleanupPolicy`]:
//!
//! - `Continue` runs everything and reports all failures at the end.
//! - `Abort` stops at the first failure. The scope is still disposed; the
//!   cleanups and child disposals that had not run yet are skipped.

mod context;
mod tree;

pub use context::ScopeContext;
pub use tree::{ScopeId, ScopeTree};

use std::fmt;
use std::sync::Arc;

use tree::{Cleanup, ScopeSlot};

use crate::config::{CleanupPolicy, RuntimeConfig};
use crate::error::{BoxError, ReactiveError, Result};
use crate::host::Host;

/// Handle to one scope in a [`ScopeTree`].
#[derive(Clone)]
pub struct Scope {
    id: ScopeId,
    tree: Arc<ScopeTree>,
}

impl Scope {
    /// Create a scope, optionally as a child of `parent`.
    ///
    /// Without a parent the scope starts a new tree with the default
    /// configuration and no host toolkit.
    pub fn create(parent: Option<&Scope>) -> Result<Scope> {
        match parent {
            Some(parent) => parent.child(),
            None => Self::new_tree(RuntimeConfig::default(), None),
        }
    }

    /// Create the root scope of a tree that builds nodes through `host`.
    pub fn root(host: Arc<dyn Host>, config: RuntimeConfig) -> Result<Scope> {
        Self::new_tree(config, Some(host))
    }

    /// Create the root scope of a new tree.
    pub fn new_tree(config: RuntimeConfig, host: Option<Arc<dyn Host>>) -> Result<Scope> {
        config.validate()?;
        let tree = ScopeTree::new(config, host);
        let id = ScopeId::next();
        tree.slots.lock().insert(id, ScopeSlot::default());
        tracing::debug!(scope = %id, "root scope created");
        Ok(Scope { id, tree })
    }

    /// Create a child scope.
    pub fn child(&self) -> Result<Scope> {
        let mut slots = self.tree.slots.lock();
        let parent = slots
            .get_mut(&self.id)
            .ok_or(ReactiveError::ScopeDisposed(self.id))?;

        let id = ScopeId::next();
        parent.children.push(id);
        slots.insert(
            id,
            ScopeSlot {
                parent: Some(self.id),
                ..ScopeSlot::default()
            },
        );
        Ok(Scope {
            id,
            tree: self.tree.clone(),
        })
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The parent scope, while it is alive.
    pub fn parent(&self) -> Option<Scope> {
        let slots = self.tree.slots.lock();
        let parent = slots.get(&self.id)?.parent?;
        slots.contains_key(&parent).then(|| Scope {
            id: parent,
            tree: self.tree.clone(),
        })
    }

    /// IDs of the live children, in creation order.
    pub fn children(&self) -> Vec<ScopeId> {
        self.tree
            .slots
            .lock()
            .get(&self.id)
            .map(|slot| slot.children.to_vec())
            .unwrap_or_default()
    }

    /// Number of cleanup actions waiting to run.
    pub fn cleanup_count(&self) -> usize {
        self.tree
            .slots
            .lock()
            .get(&self.id)
            .map_or(0, |slot| slot.cleanups.len())
    }

    pub fn is_disposed(&self) -> bool {
        !self.tree.slots.lock().contains_key(&self.id)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.tree.config
    }

    /// The host toolkit of this scope's tree.
    pub fn host(&self) -> Result<Arc<dyn Host>> {
        self.tree.host.clone().ok_or(ReactiveError::NoHost(self.id))
    }

    pub fn tree(&self) -> &Arc<ScopeTree> {
        &self.tree
    }

    /// Run `f` with this scope active.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _active = ScopeContext::enter(self.clone());
        f()
    }

    /// Register an action to run when the scope is disposed.
    pub fn on_cleanup<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push_cleanup(Box::new(move || {
            action();
            Ok(())
        }));
    }

    /// Register a fallible action to run when the scope is disposed.
    pub fn try_on_cleanup<F>(&self, action: F)
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.push_cleanup(Box::new(action));
    }

    fn push_cleanup(&self, cleanup: Cleanup) {
        let rejected = {
            let mut slots = self.tree.slots.lock();
            match slots.get_mut(&self.id) {
                Some(slot) => {
                    slot.cleanups.push(cleanup);
                    None
                }
                None => Some(cleanup),
            }
        };

        // A disposed scope will never run it, so run it now.
        if let Some(cleanup) = rejected {
            tracing::warn!(scope = %self.id, "cleanup registered on a disposed scope; running it now");
            if let Err(error) = cleanup() {
                tracing::error!(scope = %self.id, error = %error, "cleanup failed");
            }
        }
    }

    /// Dispose the scope and, first, all of its descendants.
    ///
    /// Calling this again is a no-op that returns `Ok(())`.
    pub fn dispose(&self) -> Result<()> {
        let slot = {
            let mut slots = self.tree.slots.lock();
            let Some(slot) = slots.remove(&self.id) else {
                return Ok(());
            };
            if let Some(parent) = slot.parent {
                if let Some(parent) = slots.get_mut(&parent) {
                    parent.children.retain(|child| *child != self.id);
                }
            }
            slot
        };

        tracing::debug!(
            scope = %self.id,
            children = slot.children.len(),
            cleanups = slot.cleanups.len(),
            "disposing scope"
        );

        let abort = self.tree.config.cleanup_policy == CleanupPolicy::Abort;
        let mut failures = Vec::new();

        for child in slot.children {
            let child = Scope {
                id: child,
                tree: self.tree.clone(),
            };
            if let Err(error) = child.dispose() {
                match error {
                    ReactiveError::Disposal { failures: nested, .. } => failures.extend(nested),
                    other => failures.push(other.to_string()),
                }
                if abort {
                    return Err(self.disposal_error(failures));
                }
            }
        }

        for cleanup in slot.cleanups {
            if let Err(error) = cleanup() {
                tracing::error!(scope = %self.id, error = %error, "cleanup failed");
                failures.push(error.to_string());
                if abort {
                    return Err(self.disposal_error(failures));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(self.disposal_error(failures))
        }
    }

    fn disposal_error(&self, failures: Vec<String>) -> ReactiveError {
        ReactiveError::Disposal {
            scope: self.id,
            failures,
        }
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Register a cleanup on the active component scope.
pub fn on_cleanup<F>(action: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    let scope = ScopeContext::current().ok_or(ReactiveError::Context {
        operation: "on_cleanup",
    })?;
    scope.on_cleanup(action);
    Ok(())
}
