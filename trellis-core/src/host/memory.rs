//! In-memory host toolkit.
//!
//! Node types are described by [`NodeSchema`]s registered up front. A fresh
//! [`MemoryHost`] knows a small widget set:
//!
//! | type        | properties                                     | events      |
//! |-------------|------------------------------------------------|-------------|
//! | `Window`    | `title`                                        | `closed`    |
//! | `Container` | `visible`                                      |             |
//! | `Label`     | `text`, `visible`                              |             |
//! | `Button`    | `text`, `enabled`                              | `clicked`   |
//! | `TextInput` | `text`, `placeholder`, `length` (read-only)    | `submitted` |
//! | `Checkbox`  | `checked`, `text`                              | `toggled`   |

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use super::{ChangeHandler, EventHandler, Host, ListenerId, Member, NodeId};
use crate::error::HostError;
use crate::value::Value;

#[derive(Debug, Clone)]
struct PropertyDef {
    default: Value,
    writable: bool,
}

/// Shape of a node type: its properties and events.
#[derive(Debug, Clone, Default)]
pub struct NodeSchema {
    properties: IndexMap<String, PropertyDef>,
    events: IndexSet<String>,
}

impl NodeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a writable property.
    pub fn property(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.properties.insert(
            name.to_string(),
            PropertyDef {
                default: default.into(),
                writable: true,
            },
        );
        self
    }

    /// Add a property only the toolkit itself may change.
    pub fn read_only(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.properties.insert(
            name.to_string(),
            PropertyDef {
                default: default.into(),
                writable: false,
            },
        );
        self
    }

    pub fn event(mut self, name: &str) -> Self {
        self.events.insert(name.to_string());
        self
    }

    fn member(&self, name: &str) -> Option<Member> {
        if let Some(def) = self.properties.get(name) {
            Some(Member::Property {
                writable: def.writable,
            })
        } else if self.events.contains(name) {
            Some(Member::Event)
        } else {
            None
        }
    }
}

struct MemoryNode {
    type_name: String,
    schema: NodeSchema,
    properties: IndexMap<String, Value>,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    events: Vec<(ListenerId, String, EventHandler)>,
    watchers: Vec<(ListenerId, String, ChangeHandler)>,
}

#[derive(Default)]
struct State {
    next_node: u64,
    next_listener: u64,
    nodes: HashMap<NodeId, MemoryNode>,
}

impl State {
    fn node(&self, id: NodeId) -> Result<&MemoryNode, HostError> {
        self.nodes.get(&id).ok_or(HostError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, HostError> {
        self.nodes.get_mut(&id).ok_or(HostError::UnknownNode(id))
    }

    fn next_listener(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId::from_raw(self.next_listener)
    }

    fn detach(&mut self, child: NodeId) {
        let parent = self.nodes.get_mut(&child).and_then(|node| node.parent.take());
        if let Some(parent) = parent {
            if let Some(parent) = self.nodes.get_mut(&parent) {
                parent.children.retain(|c| *c != child);
            }
        }
    }
}

/// A headless [`Host`] keeping every node in memory.
pub struct MemoryHost {
    schemas: RwLock<HashMap<String, NodeSchema>>,
    state: Mutex<State>,
}

impl MemoryHost {
    /// A host preloaded with the standard widget set.
    pub fn new() -> Self {
        let host = Self::empty();
        host.register_type("Window", NodeSchema::new().property("title", "").event("closed"));
        host.register_type("Container", NodeSchema::new().property("visible", true));
        host.register_type(
            "Label",
            NodeSchema::new().property("text", "").property("visible", true),
        );
        host.register_type(
            "Button",
            NodeSchema::new()
                .property("text", "")
                .property("enabled", true)
                .event("clicked"),
        );
        host.register_type(
            "TextInput",
            NodeSchema::new()
                .property("text", "")
                .property("placeholder", "")
                .read_only("length", 0)
                .event("submitted"),
        );
        host.register_type(
            "Checkbox",
            NodeSchema::new()
                .property("checked", false)
                .property("text", "")
                .event("toggled"),
        );
        host
    }

    /// A host with no node types registered.
    pub fn empty() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            state: Mutex::new(State::default()),
        }
    }

    /// Register or replace a node type.
    pub fn register_type(&self, type_name: &str, schema: NodeSchema) {
        self.schemas.write().insert(type_name.to_string(), schema);
    }

    /// Fire an event as the toolkit would. Returns the number of listeners run.
    pub fn emit(&self, node: NodeId, event: &str, args: &[Value]) -> Result<usize, HostError> {
        let handlers: Vec<EventHandler> = {
            let state = self.state.lock();
            let target = state.node(node)?;
            if target.schema.member(event) != Some(Member::Event) {
                return Err(HostError::WrongMemberKind {
                    node,
                    member: event.to_string(),
                    expected: "an event",
                });
            }
            target
                .events
                .iter()
                .filter(|(_, name, _)| name == event)
                .map(|(_, _, handler)| handler.clone())
                .collect()
        };

        for handler in &handlers {
            handler(args);
        }
        Ok(handlers.len())
    }

    /// Change a property from the toolkit side, e.g. user input. Read-only
    /// properties may change this way too.
    pub fn simulate_change(&self, node: NodeId, property: &str, value: Value) -> Result<(), HostError> {
        self.write_property(node, property, value, true)
    }

    /// Current value of a property, or `None` if the node or property is gone.
    pub fn property(&self, node: NodeId, name: &str) -> Option<Value> {
        let state = self.state.lock();
        state.nodes.get(&node)?.properties.get(name).cloned()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let state = self.state.lock();
        state
            .nodes
            .get(&node)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.lock().nodes.get(&node)?.parent
    }

    pub fn node_type(&self, node: NodeId) -> Option<String> {
        Some(self.state.lock().nodes.get(&node)?.type_name.clone())
    }

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.state.lock().nodes.contains_key(&node)
    }

    /// Number of event listeners and property watchers attached to a node.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.state
            .lock()
            .nodes
            .get(&node)
            .map_or(0, |n| n.events.len() + n.watchers.len())
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.state.lock().nodes.len()
    }

    fn write_property(
        &self,
        node: NodeId,
        name: &str,
        value: Value,
        from_toolkit: bool,
    ) -> Result<(), HostError> {
        let watchers: Vec<ChangeHandler> = {
            let mut state = self.state.lock();
            let target = state.node_mut(node)?;
            match target.schema.member(name) {
                Some(Member::Property { writable }) => {
                    if !writable && !from_toolkit {
                        return Err(HostError::ReadOnly {
                            node,
                            property: name.to_string(),
                        });
                    }
                }
                Some(Member::Event) => {
                    return Err(HostError::WrongMemberKind {
                        node,
                        member: name.to_string(),
                        expected: "a property",
                    })
                }
                None => {
                    return Err(HostError::UnknownMember {
                        node,
                        member: name.to_string(),
                    })
                }
            }

            if target.properties.get(name) == Some(&value) {
                return Ok(());
            }
            target.properties.insert(name.to_string(), value.clone());
            target
                .watchers
                .iter()
                .filter(|(_, property, _)| property == name)
                .map(|(_, _, handler)| handler.clone())
                .collect()
        };

        for watcher in &watchers {
            watcher(&value);
        }
        Ok(())
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MemoryHost {
    fn create_node(&self, type_name: &str) -> Result<NodeId, HostError> {
        let schema = self
            .schemas
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| HostError::UnknownType(type_name.to_string()))?;

        let mut state = self.state.lock();
        state.next_node += 1;
        let id = NodeId::from_raw(state.next_node);
        let properties = schema
            .properties
            .iter()
            .map(|(name, def)| (name.clone(), def.default.clone()))
            .collect();
        state.nodes.insert(
            id,
            MemoryNode {
                type_name: type_name.to_string(),
                schema,
                properties,
                parent: None,
                children: SmallVec::new(),
                events: Vec::new(),
                watchers: Vec::new(),
            },
        );
        tracing::trace!(node = %id, type_name, "node created");
        Ok(id)
    }

    fn member(&self, node: NodeId, name: &str) -> Result<Option<Member>, HostError> {
        Ok(self.state.lock().node(node)?.schema.member(name))
    }

    fn get_property(&self, node: NodeId, name: &str) -> Result<Value, HostError> {
        let state = self.state.lock();
        state
            .node(node)?
            .properties
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::UnknownMember {
                node,
                member: name.to_string(),
            })
    }

    fn set_property(&self, node: NodeId, name: &str, value: Value) -> Result<(), HostError> {
        self.write_property(node, name, value, false)
    }

    fn connect_event(
        &self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<ListenerId, HostError> {
        let mut state = self.state.lock();
        if state.node(node)?.schema.member(event) != Some(Member::Event) {
            return Err(HostError::WrongMemberKind {
                node,
                member: event.to_string(),
                expected: "an event",
            });
        }
        let id = state.next_listener();
        state.node_mut(node)?.events.push((id, event.to_string(), handler));
        Ok(id)
    }

    fn watch_property(
        &self,
        node: NodeId,
        property: &str,
        handler: ChangeHandler,
    ) -> Result<ListenerId, HostError> {
        let mut state = self.state.lock();
        match state.node(node)?.schema.member(property) {
            Some(Member::Property { .. }) => {}
            _ => {
                return Err(HostError::WrongMemberKind {
                    node,
                    member: property.to_string(),
                    expected: "a property",
                })
            }
        }
        let id = state.next_listener();
        state
            .node_mut(node)?
            .watchers
            .push((id, property.to_string(), handler));
        Ok(id)
    }

    fn disconnect(&self, node: NodeId, listener: ListenerId) -> Result<(), HostError> {
        // Handlers are dropped after the lock is released.
        let removed = {
            let mut state = self.state.lock();
            let Some(target) = state.nodes.get_mut(&node) else {
                return Ok(());
            };
            let event_pos = target.events.iter().position(|(id, _, _)| *id == listener);
            let event = event_pos.map(|i| target.events.remove(i));
            let watcher_pos = target.watchers.iter().position(|(id, _, _)| *id == listener);
            let watcher = watcher_pos.map(|i| target.watchers.remove(i));
            (event, watcher)
        };
        drop(removed);
        Ok(())
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state.node(parent)?;
        state.node(child)?;
        state.detach(child);
        state.node_mut(child)?.parent = Some(parent);
        state.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn destroy_node(&self, node: NodeId) -> Result<(), HostError> {
        let removed = {
            let mut state = self.state.lock();
            state.node(node)?;
            state.detach(node);

            let mut removed = Vec::new();
            let mut pending = vec![node];
            while let Some(id) = pending.pop() {
                if let Some(entry) = state.nodes.remove(&id) {
                    pending.extend(entry.children.iter().copied());
                    removed.push(entry);
                }
            }
            removed
        };
        tracing::trace!(node = %node, count = removed.len(), "nodes destroyed");
        drop(removed);
        Ok(())
    }
}
