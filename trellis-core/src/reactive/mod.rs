//! Reactive Primitives
//!
//! This module implements the reactive engine: signals, effects, memos and
//! property bindings.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while an effect is running, the signal registers that effect as an
//! observer. When the signal's value changes, every observer re-runs.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs once on creation and
//! again whenever a signal it has read changes. Effects synchronize reactive
//! state with the outside world, most importantly native node properties.
//!
//! ## Memos
//!
//! A Memo is a derived value. It re-evaluates when its inputs change and only
//! notifies its own readers when the result is different.
//!
//! # Implementation Notes
//!
//! Tracking is implicit: a thread-local stack records the running effect, and
//! every signal read consults it. Propagation is synchronous; there is no
//! scheduler and no batching.
//!
//! The `use_*` variants are for component bodies. They fail outside a
//! component scope and tie the created effect to that scope's lifetime.

mod bind;
mod context;
mod effect;
mod memo;
mod runtime;
mod signal;
mod subscriber;

pub use bind::bind;
pub use context::{untrack, ReactiveContext};
pub use effect::{create_effect, try_create_effect, use_effect, Effect};
pub use memo::{create_memo, Memo};
pub use runtime::{Reactive, Runtime};
pub use signal::{create_signal, use_signal, Signal};
pub use subscriber::SubscriberId;
