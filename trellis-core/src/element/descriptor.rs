//! Declarative node descriptions.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::Result;
use crate::host::{EventHandler, NodeId};
use crate::reactive::Signal;
use crate::scope::Scope;
use crate::value::Value;

/// Already-built nodes to attach under a new node, in order.
pub type Children = SmallVec<[NodeId; 4]>;

/// A function component: receives its props and its own scope, returns the
/// native node it built.
pub type Component = Box<dyn FnOnce(Props, &Scope) -> Result<NodeId>>;

/// Producer for a computed prop.
pub type Producer = Arc<dyn Fn() -> Value + Send + Sync>;

/// The value side of a prop.
#[derive(Clone)]
pub enum PropValue {
    /// Assigned once at construction.
    Literal(Value),
    /// Bound to the property. Under an event-prefixed key the binding is
    /// two-way.
    Signal(Signal<Value>),
    /// Re-evaluated whenever a signal it reads changes.
    Computed(Producer),
    /// Listener for an event-prefixed key.
    Handler(EventHandler),
}

impl PropValue {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            PropValue::Literal(_) => "a literal",
            PropValue::Signal(_) => "a signal",
            PropValue::Computed(_) => "a computed value",
            PropValue::Handler(_) => "a handler",
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            PropValue::Signal(signal) => f.debug_tuple("Signal").field(signal).finish(),
            PropValue::Computed(_) => f.write_str("Computed(..)"),
            PropValue::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// Ordered prop map. Props are applied in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Props {
    entries: IndexMap<String, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a literal prop.
    pub fn prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, PropValue::Literal(value.into()));
        self
    }

    /// Add a signal-backed prop.
    pub fn signal(mut self, key: &str, signal: Signal<Value>) -> Self {
        self.insert(key, PropValue::Signal(signal));
        self
    }

    /// Add a computed prop.
    pub fn computed<F>(mut self, key: &str, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.insert(key, PropValue::Computed(Arc::new(producer)));
        self
    }

    /// Add an event handler. `key` must carry the event prefix.
    pub fn handler<F>(mut self, key: &str, handler: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.insert(key, PropValue::Handler(Arc::new(handler)));
        self
    }

    pub fn insert(&mut self, key: &str, value: PropValue) -> Option<PropValue> {
        self.entries.insert(key.to_string(), value)
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key)
    }

    /// The current value behind a literal or signal prop.
    ///
    /// Signal props are read untracked; a component reading its initial props
    /// should not subscribe whatever effect happens to be running.
    pub fn value(&self, key: &str) -> Option<Value> {
        match self.entries.get(key)? {
            PropValue::Literal(value) => Some(value.clone()),
            PropValue::Signal(signal) => Some(signal.get_untracked()),
            PropValue::Computed(producer) => Some(crate::reactive::untrack(|| producer())),
            PropValue::Handler(_) => None,
        }
    }

    pub fn handler_for(&self, key: &str) -> Option<EventHandler> {
        match self.entries.get(key)? {
            PropValue::Handler(handler) => Some(handler.clone()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Props {
    type Item = (String, PropValue);
    type IntoIter = indexmap::map::IntoIter<String, PropValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// What to construct: a native node or a nested component.
pub enum ElementDescriptor {
    Native {
        type_name: String,
        props: Props,
        children: Children,
    },
    Component {
        component: Component,
        props: Props,
        children: Children,
    },
}

impl ElementDescriptor {
    /// Describe a native node of the given toolkit type.
    pub fn native(type_name: &str) -> Self {
        ElementDescriptor::Native {
            type_name: type_name.to_string(),
            props: Props::new(),
            children: Children::new(),
        }
    }

    /// Describe a nested function component.
    pub fn component<F>(component: F) -> Self
    where
        F: FnOnce(Props, &Scope) -> Result<NodeId> + 'static,
    {
        ElementDescriptor::Component {
            component: Box::new(component),
            props: Props::new(),
            children: Children::new(),
        }
    }

    pub fn with_props(mut self, new_props: Props) -> Self {
        match &mut self {
            ElementDescriptor::Native { props, .. } | ElementDescriptor::Component { props, .. } => {
                *props = new_props
            }
        }
        self
    }

    pub fn child(mut self, node: NodeId) -> Self {
        self.children_mut().push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.children_mut().extend(nodes);
        self
    }

    fn children_mut(&mut self) -> &mut Children {
        match self {
            ElementDescriptor::Native { children, .. }
            | ElementDescriptor::Component { children, .. } => children,
        }
    }
}

impl fmt::Debug for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementDescriptor::Native {
                type_name,
                props,
                children,
            } => f
                .debug_struct("Native")
                .field("type_name", type_name)
                .field("props", props)
                .field("children", children)
                .finish(),
            ElementDescriptor::Component {
                props, children, ..
            } => f
                .debug_struct("Component")
                .field("props", props)
                .field("children", children)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn props_keep_insertion_order() {
        let props = Props::new()
            .prop("text", "hi")
            .computed("visible", || Value::Bool(true))
            .handler("@clicked", |_| {});

        let keys: Vec<_> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["text", "visible", "@clicked"]);
        assert_eq!(props.get("@clicked").map(PropValue::kind), Some("a handler"));
    }

    #[test]
    fn value_reads_literals_signals_and_producers() {
        let signal = Signal::new(Value::from(3));
        let props = Props::new()
            .prop("title", "Inbox")
            .signal("count", signal.clone())
            .computed("double", move || Value::from(signal.get().as_int().unwrap_or(0) * 2))
            .handler("@closed", |_| {});

        assert_eq!(props.value("title"), Some(Value::from("Inbox")));
        assert_eq!(props.value("count"), Some(Value::Int(3)));
        assert_eq!(props.value("double"), Some(Value::Int(6)));
        assert_eq!(props.value("@closed"), None);
        assert!(props.handler_for("@closed").is_some());
    }

    #[test]
    fn builder_methods_fill_either_variant() {
        let node = NodeId::from_raw(1);
        let native = ElementDescriptor::native("Label")
            .with_props(Props::new().prop("text", "x"))
            .child(node);
        match native {
            ElementDescriptor::Native { type_name, props, children } => {
                assert_eq!(type_name, "Label");
                assert_eq!(props.len(), 1);
                assert_eq!(children.as_slice(), &[node]);
            }
            other => panic!("unexpected descriptor: {other:?}"),
        }

        let component = ElementDescriptor::component(|_, _| Ok(NodeId::from_raw(9)))
            .children([node, node]);
        assert!(matches!(
            component,
            ElementDescriptor::Component { ref children, .. } if children.len() == 2
        ));
    }
}
