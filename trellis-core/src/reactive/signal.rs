//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which effects depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while an effect is running, the signal registers
//!    that effect as an observer.
//!
//! 2. When a signal is written with a value different from the current one,
//!    every observer is re-run synchronously before `set` returns.
//!
//! 3. Writing a value equal to the current one does nothing at all. This is
//!    what terminates two-way bindings and effects that write the signal they
//!    read.
//!
//! # Memory Layout
//!
//! Each signal handle is a single `Arc` around:
//! - A unique ID (8 bytes)
//! - The value, behind a `RwLock`
//!
//! The observer set lives in the runtime's dependency graph, keyed by ID, and
//! is removed when the last handle is dropped.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use super::runtime::Runtime;
use crate::error::{ReactiveError, Result};
use crate::graph::SignalId;
use crate::scope::ScopeContext;

struct SignalInner<T> {
    id: SignalId,
    value: RwLock<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        Runtime::forget_signal(self.id);
    }
}

/// A reactive signal holding a value of type T.
///
/// Cloning a signal yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::Signal;
///
/// let count = Signal::new(0);
/// assert_eq!(count.get(), 0);
///
/// assert!(count.set(5));
/// assert!(!count.set(5)); // equal value, nothing happens
/// ```
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                id: SignalId::new(),
                value: RwLock::new(value),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// Get the current value.
    ///
    /// If called while an effect is running, this also subscribes that effect.
    pub fn get(&self) -> T {
        Runtime::track(self.inner.id);
        self.inner.value.read().clone()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value, tracking the read like [`get`](Self::get).
    ///
    /// The value stays locked for the duration of `f`; `f` must not write
    /// this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Runtime::track(self.inner.id);
        f(&self.inner.value.read())
    }

    /// Set a new value and notify observers.
    ///
    /// Returns `false`, without notifying anyone, if the new value equals the
    /// current one.
    pub fn set(&self, value: T) -> bool {
        {
            let mut guard = self.inner.value.write();
            if *guard == value {
                return false;
            }
            *guard = value;
        }

        Runtime::notify_signal_change(self.inner.id);
        true
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&self.inner.value.read());
        self.set(new_value)
    }

    /// Get the number of observers.
    pub fn subscriber_count(&self) -> usize {
        Runtime::observer_count(self.inner.id)
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Create a signal.
pub fn create_signal<T>(initial: T) -> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    Signal::new(initial)
}

/// Create a signal inside a component.
///
/// Fails with [`ReactiveError::Context`] when no component scope is active.
pub fn use_signal<T>(initial: T) -> Result<Signal<T>>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    if ScopeContext::current().is_none() {
        return Err(ReactiveError::Context {
            operation: "use_signal",
        });
    }
    Ok(Signal::new(initial))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        assert!(signal.set(42));
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn equal_write_reports_no_change() {
        let signal = Signal::new(String::from("a"));
        assert!(!signal.set("a".to_string()));
        assert!(signal.set("b".to_string()));
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        assert!(signal.update(|v| v + 5));
        assert_eq!(signal.get(), 15);
        assert!(!signal.update(|v| *v));
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);
        assert_eq!(signal1, signal2);

        signal2.set(100);
        assert_eq!(signal1.get(), 100);
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);
        assert_ne!(s1.id(), s2.id());
        assert_ne!(s1, s2);
    }

    #[test]
    fn with_borrows_without_cloning() {
        let signal = Signal::new(vec![1, 2, 3]);
        assert_eq!(signal.with(|v| v.len()), 3);
    }

    #[test]
    fn use_signal_requires_a_scope() {
        assert!(matches!(
            use_signal(1),
            Err(ReactiveError::Context { operation: "use_signal" })
        ));
    }
}
