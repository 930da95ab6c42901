//! Trellis Core
//!
//! This crate provides the core runtime for the Trellis declarative UI
//! library. It implements:
//!
//! - Reactive primitives (signals, effects, memos) with implicit dependency
//!   tracking and synchronous propagation
//! - Hierarchical scopes that tear down subscriptions, listeners and
//!   cleanups deterministically
//! - A declarative element builder that wires signals into native node
//!   properties and events, including two-way bindings
//! - Mounting of a root component into a host UI toolkit
//!
//! The host toolkit itself is outside the crate and is reached only through
//! the [`host::Host`] trait. [`host::MemoryHost`] implements it in memory.
//!
//! # Architecture
//!
//! - `reactive`: signals, effects, memos, `bind`, and the runtime registry
//! - `graph`: the signal/effect dependency graph
//! - `scope`: the scope arena and the active-scope stack
//! - `element`: element descriptors and the builder
//! - `host`: the toolkit interface and the in-memory toolkit
//! - `mount`: root mounting and unmounting
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis_core::prelude::*;
//!
//! fn counter(_props: Props, scope: &Scope) -> Result<NodeId> {
//!     let count = use_signal(0)?;
//!
//!     let shown = count.clone();
//!     let label = scope.build(ElementDescriptor::native("Label").with_props(
//!         Props::new().computed("text", move || format!("Count: {}", shown.get()).into()),
//!     ))?;
//!
//!     let clicked = count.clone();
//!     let button = scope.build(ElementDescriptor::native("Button").with_props(
//!         Props::new().prop("text", "+1").handler("@clicked", move |_| {
//!             clicked.update(|n| n + 1);
//!         }),
//!     ))?;
//!
//!     scope.build(ElementDescriptor::native("Container").children([label, button]))
//! }
//!
//! let host = Arc::new(MemoryHost::new());
//! let window = host.create_node("Window").unwrap();
//! let mut app = mount(counter, Props::new(), host.clone(), window, RuntimeConfig::default()).unwrap();
//!
//! let nodes = host.children(app.root());
//! let (label, button) = (nodes[0], nodes[1]);
//! host.emit(button, "clicked", &[]).unwrap();
//! assert_eq!(host.property(label, "text"), Some(Value::from("Count: 1")));
//!
//! app.dispose().unwrap();
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod graph;
pub mod host;
pub mod mount;
pub mod reactive;
pub mod scope;
pub mod value;

/// The names a component author needs.
pub mod prelude {
    pub use crate::config::{CleanupPolicy, RuntimeConfig, TrackingMode};
    pub use crate::element::{build, ElementDescriptor, PropValue, Props};
    pub use crate::error::{BoxError, HostError, ReactiveError, Result};
    pub use crate::host::{Host, MemoryHost, NodeId};
    pub use crate::mount::{mount, MountHandle};
    pub use crate::reactive::{
        bind, create_effect, create_memo, create_signal, try_create_effect, untrack, use_effect,
        use_signal, Effect, Memo, Signal,
    };
    pub use crate::scope::{on_cleanup, Scope};
    pub use crate::value::Value;
}
