//! Scope arena.
//!
//! All scopes of one tree live in a single [`ScopeTree`], keyed by
//! [`ScopeId`]. Parent and child links are IDs, never owning pointers. A scope
//! is disposed exactly when its slot is gone from the arena.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::config::RuntimeConfig;
use crate::error::BoxError;
use crate::host::Host;

/// Opaque identifier of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type Cleanup = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

#[derive(Default)]
pub(crate) struct ScopeSlot {
    pub(crate) parent: Option<ScopeId>,
    pub(crate) children: SmallVec<[ScopeId; 4]>,
    pub(crate) cleanups: Vec<Cleanup>,
}

/// Arena holding every live scope of one tree, plus the tree's settings.
pub struct ScopeTree {
    pub(crate) config: RuntimeConfig,
    pub(crate) host: Option<Arc<dyn Host>>,
    pub(crate) slots: Mutex<HashMap<ScopeId, ScopeSlot>>,
}

impl ScopeTree {
    pub(crate) fn new(config: RuntimeConfig, host: Option<Arc<dyn Host>>) -> Arc<Self> {
        Arc::new(Self {
            config,
            host,
            slots: Mutex::new(HashMap::new()),
        })
    }

    /// Number of live scopes in the tree.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ScopeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeTree")
            .field("live_scopes", &self.len())
            .field("has_host", &self.host.is_some())
            .field("config", &self.config)
            .finish()
    }
}
