//! Host Toolkit Interface
//!
//! Native nodes are created, mutated and destroyed by a host UI toolkit that
//! lives outside this crate. The [`Host`] trait is the whole contract between
//! the two: the element builder and `bind` only ever talk to the toolkit
//! through it.
//!
//! [`MemoryHost`] is a complete in-memory implementation, used for headless
//! embedding and by the test suite.

mod memory;

pub use memory::{MemoryHost, NodeSchema};

use std::fmt;

use crate::error::HostError;
use crate::value::Value;

/// Identifier of a native node, allocated by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Build an ID from the host's raw representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Identifier of a connected listener, allocated by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What a named member of a native node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// A value-holding property.
    Property { writable: bool },
    /// An event that listeners can connect to.
    Event,
}

/// Listener for a native event. Receives the event's arguments.
pub type EventHandler = std::sync::Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Listener for a property change notification. Receives the new value.
pub type ChangeHandler = std::sync::Arc<dyn Fn(&Value) + Send + Sync>;

/// Capabilities the runtime needs from a UI toolkit.
///
/// Implementations must not hold internal locks while invoking handlers:
/// handlers routinely write signals, which re-enter the host through bound
/// effects.
pub trait Host: Send + Sync {
    /// Construct a native node of the given type.
    fn create_node(&self, type_name: &str) -> Result<NodeId, HostError>;

    /// Describe the member `name` of `node`, or `None` if it has no such member.
    fn member(&self, node: NodeId, name: &str) -> Result<Option<Member>, HostError>;

    fn get_property(&self, node: NodeId, name: &str) -> Result<Value, HostError>;

    /// Assign a property. Hosts notify property watchers only when the value
    /// actually changes.
    fn set_property(&self, node: NodeId, name: &str, value: Value) -> Result<(), HostError>;

    fn connect_event(
        &self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<ListenerId, HostError>;

    /// Subscribe to change notifications for a property.
    fn watch_property(
        &self,
        node: NodeId,
        property: &str,
        handler: ChangeHandler,
    ) -> Result<ListenerId, HostError>;

    /// Remove a listener. Removing one that no longer exists, including one
    /// whose node was destroyed, is not an error.
    fn disconnect(&self, node: NodeId, listener: ListenerId) -> Result<(), HostError>;

    /// Attach `child` as the last structural child of `parent`, detaching it
    /// from any previous parent.
    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    /// Detach and destroy a node together with its descendants.
    fn destroy_node(&self, node: NodeId) -> Result<(), HostError>;
}
