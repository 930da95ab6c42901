//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any signal it has read is written with a new value, the effect
//!    re-runs synchronously inside that write.
//!
//! 3. Under [`TrackingMode::Cumulative`] the dependency set only grows: a
//!    signal read in any earlier run still triggers the effect. Under
//!    [`TrackingMode::Dynamic`] the effect drops its edges before each run and
//!    re-subscribes to exactly what that run reads.
//!
//! # Failure Isolation
//!
//! An action returning `Err` is caught at the effect boundary, counted, and
//! logged through `tracing`. The write that triggered the run is unaffected,
//! and the other observers notified by the same write still run.
//!
//! Panics are not caught. A panicking action unwinds out of the `set` that
//! triggered it, and observers later in that write's notification order are
//! skipped. The running-effect stack is still restored on the way out.
//! Actions that can fail should return `Err` through [`try_create_effect`] or
//! [`Effect::new`] instead.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::runtime::{Reactive, Runtime};
use super::subscriber::SubscriberId;
use crate::config::TrackingMode;
use crate::error::{BoxError, ReactiveError, Result};
use crate::scope::{Scope, ScopeContext};

type Action = Box<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

struct EffectInner {
    id: SubscriberId,
    action: Action,
    tracking: TrackingMode,
    disposed: AtomicBool,
    run_count: AtomicUsize,
    error_count: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

impl EffectInner {
    fn execute(&self) -> Result<(), BoxError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Ok(());
        }

        if self.tracking == TrackingMode::Dynamic {
            Runtime::clear_dependencies(self.id);
        }

        let _ctx = ReactiveContext::enter(self.id);
        self.run_count.fetch_add(1, Ordering::SeqCst);
        (self.action)()
    }

    fn record_failure(&self, error: &BoxError) {
        self.error_count.fetch_add(1, Ordering::SeqCst);
        *self.last_error.lock() = Some(error.to_string());
        tracing::error!(effect = %self.id, error = %error, "effect failed");
    }
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn rerun(&self) {
        if let Err(error) = self.execute() {
            self.record_failure(&error);
        }
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// Dropping the handle does not stop the effect; it stays registered until
/// [`dispose`](Effect::dispose) is called, either directly or by the scope it
/// was bound to.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{create_effect, Signal};
///
/// let count = Signal::new(0);
/// let seen = count.clone();
/// let effect = create_effect(move || {
///     let _ = seen.get();
/// });
///
/// count.set(5);
/// assert_eq!(effect.run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    fn spawn(action: Action, tracking: TrackingMode) -> (Self, Result<(), BoxError>) {
        let inner = Arc::new(EffectInner {
            id: SubscriberId::new(),
            action,
            tracking,
            disposed: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
            last_error: Mutex::new(None),
        });
        Runtime::register(inner.clone());

        let first_run = inner.execute();
        (Self { inner }, first_run)
    }

    /// Create an effect and run it once. Failures of the first run are
    /// isolated like those of any later run.
    pub fn new<F>(action: F, tracking: TrackingMode) -> Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let (effect, first_run) = Self::spawn(Box::new(action), tracking);
        if let Err(error) = first_run {
            effect.inner.record_failure(&error);
        }
        effect
    }

    /// Create an effect and run it once, returning the first run's failure.
    ///
    /// An effect whose first run fails is disposed before the error is
    /// returned.
    pub fn try_new<F>(action: F, tracking: TrackingMode) -> Result<Self>
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let (effect, first_run) = Self::spawn(Box::new(action), tracking);
        match first_run {
            Ok(()) => Ok(effect),
            Err(source) => {
                effect.dispose();
                Err(ReactiveError::EffectExecution {
                    effect: effect.id().raw(),
                    source,
                })
            }
        }
    }

    /// Get the subscriber ID for this effect.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Tracking mode chosen at creation.
    pub fn tracking(&self) -> TrackingMode {
        self.inner.tracking
    }

    /// Re-run the effect now, as if a dependency had changed.
    pub fn run(&self) {
        self.inner.rerun();
    }

    /// Dispose of the effect.
    ///
    /// After disposal, the effect will not run again and holds no
    /// subscriptions.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            Runtime::unregister(self.inner.id);
            tracing::trace!(effect = %self.inner.id, "effect disposed");
        }
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Number of runs that returned an error.
    pub fn error_count(&self) -> usize {
        self.inner.error_count.load(Ordering::SeqCst)
    }

    /// Message of the most recent failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.lock().clone()
    }

    /// Get the number of signals the effect is subscribed to.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependencies(self.inner.id).len()
    }

    /// Dispose this effect when `scope` is disposed, if the scope's
    /// configuration asks for it.
    pub(crate) fn bind_to(&self, scope: &Scope) {
        if scope.config().dispose_effects_with_scope {
            let effect = self.clone();
            scope.on_cleanup(move || effect.dispose());
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Tracking mode of the active scope's tree, or the default outside a scope.
pub(crate) fn ambient_tracking() -> TrackingMode {
    ScopeContext::current().map_or_else(TrackingMode::default, |scope| scope.config().tracking)
}

/// Create an effect from an infallible action.
pub fn create_effect<F>(action: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(
        move || {
            action();
            Ok(())
        },
        ambient_tracking(),
    )
}

/// Create an effect from a fallible action.
///
/// An error from the first run is returned; errors from later runs are
/// isolated and logged.
pub fn try_create_effect<F>(action: F) -> Result<Effect>
where
    F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
{
    Effect::try_new(action, ambient_tracking())
}

/// Create an effect owned by the active component scope.
///
/// Fails with [`ReactiveError::Context`] when no component scope is active.
pub fn use_effect<F>(action: F) -> Result<Effect>
where
    F: Fn() + Send + Sync + 'static,
{
    let scope = ScopeContext::current().ok_or(ReactiveError::Context {
        operation: "use_effect",
    })?;
    let effect = Effect::new(
        move || {
            action();
            Ok(())
        },
        scope.config().tracking,
    );
    effect.bind_to(&scope);
    Ok(effect)
}
