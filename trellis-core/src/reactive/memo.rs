//! Memo Implementation
//!
//! A Memo is a derived, read-only value kept up to date by an effect.
//!
//! # How Memos Work
//!
//! 1. On creation, an internal effect evaluates the computation and stores
//!    the result in a private signal.
//!
//! 2. When a dependency changes, the effect re-evaluates and writes the new
//!    result into that signal.
//!
//! 3. Readers subscribe to the private signal, so they re-run only when the
//!    derived value actually changed: an unchanged result is an equal-value
//!    write, which notifies nobody.
//!
//! Memos are eager. Propagation is synchronous everywhere else in the
//! runtime, and an eager memo keeps it that way.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::Mutex;

use super::effect::{ambient_tracking, Effect};
use super::signal::Signal;
use crate::error::{ReactiveError, Result};
use crate::scope::ScopeContext;

/// A cached derived value that recomputes when its dependencies change.
///
/// # Type Parameters
///
/// - `T`: The type of the computed value. The `PartialEq` bound is what lets
///   an unchanged result stop propagation.
pub struct Memo<T> {
    value: Signal<T>,
    effect: Effect,
}

impl<T> Memo<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a memo and compute its initial value.
    pub fn new<F>(compute: F) -> Result<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let slot: Arc<Mutex<Option<Signal<T>>>> = Arc::new(Mutex::new(None));

        let writer = slot.clone();
        let effect = Effect::new(
            move || {
                let next = compute();
                let existing = writer.lock().clone();
                match existing {
                    Some(signal) => {
                        signal.set(next);
                    }
                    None => *writer.lock() = Some(Signal::new(next)),
                }
                Ok(())
            },
            ambient_tracking(),
        );

        let value = slot.lock().clone();
        match value {
            Some(value) => {
                if let Some(scope) = ScopeContext::current() {
                    effect.bind_to(&scope);
                }
                Ok(Self { value, effect })
            }
            None => {
                // The first run failed before producing a value.
                effect.dispose();
                Err(ReactiveError::EffectExecution {
                    effect: effect.id().raw(),
                    source: effect
                        .last_error()
                        .unwrap_or_else(|| "memo produced no value".to_string())
                        .into(),
                })
            }
        }
    }

    /// Get the current value, tracking the read.
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.value.get_untracked()
    }

    /// Number of times the computation has run.
    pub fn compute_count(&self) -> usize {
        self.effect.run_count()
    }

    /// Stop recomputing. The last value stays readable.
    pub fn dispose(&self) {
        self.effect.dispose();
    }

    /// The effect driving this memo.
    pub fn effect(&self) -> &Effect {
        &self.effect
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("value", &self.get_untracked())
            .field("compute_count", &self.compute_count())
            .finish()
    }
}

/// Create a memo.
pub fn create_memo<T, F>(compute: F) -> Result<Memo<T>>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Memo::new(compute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::create_effect;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn memo_follows_its_source() {
        let base = Signal::new(5);
        let b = base.clone();
        let doubled = create_memo(move || b.get() * 2).unwrap();

        assert_eq!(doubled.get(), 10);
        base.set(10);
        assert_eq!(doubled.get(), 20);
        assert_eq!(doubled.compute_count(), 2);
    }

    #[test]
    fn unchanged_result_does_not_notify_readers() {
        let number = Signal::new(2);
        let n = number.clone();
        let parity = create_memo(move || n.get() % 2 == 0).unwrap();

        let reader_runs = Arc::new(AtomicUsize::new(0));
        let (p, runs) = (parity.clone(), reader_runs.clone());
        create_effect(move || {
            let _ = p.get();
            runs.fetch_add(1, Ordering::SeqCst);
        });

        number.set(4);
        assert_eq!(reader_runs.load(Ordering::SeqCst), 1);

        number.set(5);
        assert_eq!(reader_runs.load(Ordering::SeqCst), 2);
        assert!(!parity.get());
    }

    #[test]
    fn memo_in_a_scope_stops_with_it() {
        let scope = crate::scope::Scope::create(None).unwrap();
        let base = Signal::new(1);
        let b = base.clone();
        let tripled = scope.run(|| create_memo(move || b.get() * 3)).unwrap();

        scope.dispose().unwrap();
        base.set(2);

        assert!(tripled.effect().is_disposed());
        assert_eq!(tripled.compute_count(), 1);
        assert_eq!(tripled.get_untracked(), 3);
        assert_eq!(base.subscriber_count(), 0);
    }

    #[test]
    fn memo_chains() {
        let base = Signal::new(1);
        let b = base.clone();
        let plus_one = create_memo(move || b.get() + 1).unwrap();
        let p = plus_one.clone();
        let times_ten = create_memo(move || p.get() * 10).unwrap();

        base.set(4);
        assert_eq!(times_ten.get(), 50);
    }

    #[test]
    fn disposed_memo_keeps_last_value() {
        let base = Signal::new(1);
        let b = base.clone();
        let memo = create_memo(move || b.get()).unwrap();

        memo.dispose();
        base.set(9);
        assert_eq!(memo.get(), 1);
    }
}
