//! Element Builder
//!
//! Turns an [`ElementDescriptor`] into a native node.
//!
//! # Components
//!
//! A component gets a fresh child scope of the active scope. That scope is
//! active while the component runs and is deactivated afterwards on every
//! exit path. If the component returns an error, or its children cannot be
//! attached, its scope is disposed, so a half-built subtree leaves no
//! listeners or effects behind.
//!
//! # Native Nodes
//!
//! Props are applied in order. For a key carrying the event prefix (`@` by
//! default) the member named by the rest of the key decides the wiring:
//!
//! | member              | prop value | wiring                                   |
//! |---------------------|------------|------------------------------------------|
//! | event               | handler    | listener                                 |
//! | writable property   | signal     | two-way: `bind` plus a change watcher     |
//!
//! For a plain key the prop value decides:
//!
//! | prop value          | wiring                     |
//! |---------------------|----------------------------|
//! | literal             | assigned once              |
//! | signal / computed   | one-way `bind`             |
//!
//! Every other combination is a [`ReactiveError::PropertyBinding`].
//!
//! A node whose props or children fail is destroyed again, and the bindings
//! already made for it are disposed.

use std::sync::Arc;

use super::descriptor::{Children, ElementDescriptor, PropValue, Props};
use crate::error::{ReactiveError, Result};
use crate::host::{Host, ListenerId, Member, NodeId};
use crate::reactive::{bind, Effect};
use crate::scope::{Scope, ScopeContext};
use crate::value::Value;

/// Build a node in the active scope.
///
/// Fails with [`ReactiveError::Context`] when no scope is active, i.e. outside
/// `mount` and outside a component body.
pub fn build(descriptor: ElementDescriptor) -> Result<NodeId> {
    let scope = ScopeContext::current().ok_or(ReactiveError::Context { operation: "build" })?;
    scope.build(descriptor)
}

impl Scope {
    /// Build a node owned by this scope.
    pub fn build(&self, descriptor: ElementDescriptor) -> Result<NodeId> {
        match descriptor {
            ElementDescriptor::Component {
                component,
                props,
                children,
            } => {
                let scope = self.child()?;
                let result = {
                    let _active = ScopeContext::enter(scope.clone());
                    component(props, &scope)
                };

                let built = result.and_then(|node| match self.attach(node, &children) {
                    Ok(()) => Ok(node),
                    Err(error) => {
                        self.destroy_orphan(node);
                        Err(error)
                    }
                });
                match built {
                    Ok(node) => {
                        tracing::debug!(scope = %scope.id(), node = %node, "component built");
                        Ok(node)
                    }
                    Err(error) => {
                        if let Err(cleanup) = scope.dispose() {
                            tracing::warn!(scope = %scope.id(), error = %cleanup, "disposing failed component");
                        }
                        Err(error)
                    }
                }
            }
            ElementDescriptor::Native {
                type_name,
                props,
                children,
            } => {
                let host = self.host()?;
                let node = host.create_node(&type_name)?;
                let mut bindings = Vec::new();
                let wired = {
                    let _active = ScopeContext::enter(self.clone());
                    self.apply_props(&host, node, props, &mut bindings)
                        .and_then(|()| self.attach(node, &children))
                };
                if let Err(error) = wired {
                    for effect in &bindings {
                        effect.dispose();
                    }
                    self.destroy_orphan(node);
                    return Err(error);
                }
                Ok(node)
            }
        }
    }

    fn destroy_orphan(&self, node: NodeId) {
        let destroyed = self.host().and_then(|host| Ok(host.destroy_node(node)?));
        if let Err(error) = destroyed {
            tracing::warn!(node = %node, error = %error, "destroying partially built node");
        }
    }

    fn attach(&self, parent: NodeId, children: &Children) -> Result<()> {
        if children.is_empty() {
            return Ok(());
        }
        let host = self.host()?;
        for child in children {
            host.append_child(parent, *child)?;
        }
        Ok(())
    }

    fn apply_props(
        &self,
        host: &Arc<dyn Host>,
        node: NodeId,
        props: Props,
        bindings: &mut Vec<Effect>,
    ) -> Result<()> {
        for (key, value) in props {
            let binding = match self.config().event_name(&key) {
                Some(name) => self.apply_prefixed(host, node, &key, name, value)?,
                None => self.apply_plain(host, node, &key, value)?,
            };
            bindings.extend(binding);
        }
        Ok(())
    }

    fn apply_prefixed(
        &self,
        host: &Arc<dyn Host>,
        node: NodeId,
        key: &str,
        name: &str,
        value: PropValue,
    ) -> Result<Option<Effect>> {
        match (host.member(node, name)?, value) {
            (Some(Member::Event), PropValue::Handler(handler)) => {
                let listener = host.connect_event(node, name, handler)?;
                self.disconnect_on_cleanup(host, node, listener);
                Ok(None)
            }
            (Some(Member::Event), other) => Err(ReactiveError::binding(
                node,
                key,
                format!("event `{name}` needs a handler, got {}", other.kind()),
            )),
            (Some(Member::Property { writable: true }), PropValue::Signal(signal)) => {
                let source = signal.clone();
                let effect = bind(host, node, name, move || source.get())?;

                let watched = host.watch_property(
                    node,
                    name,
                    Arc::new(move |value: &Value| {
                        signal.set(value.clone());
                    }),
                );
                let listener = match watched {
                    Ok(listener) => listener,
                    Err(error) => {
                        effect.dispose();
                        return Err(error.into());
                    }
                };
                self.disconnect_on_cleanup(host, node, listener);
                Ok(Some(effect))
            }
            (Some(Member::Property { writable: true }), other) => Err(ReactiveError::binding(
                node,
                key,
                format!("two-way binding of `{name}` needs a signal, got {}", other.kind()),
            )),
            (Some(Member::Property { writable: false }), _) => {
                Err(ReactiveError::binding(node, key, "property is read-only"))
            }
            (None, _) => Err(ReactiveError::binding(node, key, "no such event or property")),
        }
    }

    fn apply_plain(
        &self,
        host: &Arc<dyn Host>,
        node: NodeId,
        key: &str,
        value: PropValue,
    ) -> Result<Option<Effect>> {
        match value {
            PropValue::Literal(literal) => host
                .set_property(node, key, literal)
                .map(|()| None)
                .map_err(|e| ReactiveError::binding(node, key, e.to_string())),
            PropValue::Signal(signal) => bind(host, node, key, move || signal.get()).map(Some),
            PropValue::Computed(producer) => bind(host, node, key, move || producer()).map(Some),
            PropValue::Handler(_) => Err(ReactiveError::binding(
                node,
                key,
                format!(
                    "handlers need an event key such as `{}{key}`",
                    self.config().event_prefix
                ),
            )),
        }
    }

    fn disconnect_on_cleanup(&self, host: &Arc<dyn Host>, node: NodeId, listener: ListenerId) {
        let host = host.clone();
        self.try_on_cleanup(move || {
            host.disconnect(node, listener)?;
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::host::{MemoryHost, NodeSchema};
    use crate::reactive::Signal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (Arc<MemoryHost>, Scope) {
        let memory = Arc::new(MemoryHost::new());
        let scope = Scope::root(memory.clone(), RuntimeConfig::default()).unwrap();
        (memory, scope)
    }

    #[test]
    fn build_needs_an_active_scope() {
        assert!(matches!(
            build(ElementDescriptor::native("Label")),
            Err(ReactiveError::Context { operation: "build" })
        ));
    }

    #[test]
    fn literal_props_and_children() {
        let (memory, scope) = setup();
        let label = scope
            .build(ElementDescriptor::native("Label").with_props(Props::new().prop("text", "hi")))
            .unwrap();
        let container = scope
            .build(ElementDescriptor::native("Container").child(label))
            .unwrap();

        assert_eq!(memory.property(label, "text"), Some(Value::from("hi")));
        assert_eq!(memory.children(container), vec![label]);
    }

    #[test]
    fn computed_props_follow_their_signals() {
        let (memory, scope) = setup();
        let count = Signal::new(0);
        let c = count.clone();
        let label = scope
            .build(ElementDescriptor::native("Label").with_props(
                Props::new().computed("text", move || format!("{} items", c.get()).into()),
            ))
            .unwrap();

        count.set(3);
        assert_eq!(memory.property(label, "text"), Some(Value::from("3 items")));
    }

    #[test]
    fn handlers_connect_and_disconnect_with_the_scope() {
        let (memory, scope) = setup();
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = clicks.clone();
        let button = scope
            .build(ElementDescriptor::native("Button").with_props(Props::new().handler(
                "@clicked",
                move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                },
            )))
            .unwrap();

        memory.emit(button, "clicked", &[]).unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        scope.dispose().unwrap();
        assert_eq!(memory.listener_count(button), 0);
        memory.emit(button, "clicked", &[]).unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn two_way_binding_syncs_both_directions() {
        let (memory, scope) = setup();
        let text = Signal::new(Value::from("draft"));
        let input = scope
            .build(
                ElementDescriptor::native("TextInput")
                    .with_props(Props::new().signal("@text", text.clone())),
            )
            .unwrap();
        assert_eq!(memory.property(input, "text"), Some(Value::from("draft")));

        text.set("from code".into());
        assert_eq!(memory.property(input, "text"), Some(Value::from("from code")));

        memory.simulate_change(input, "text", "typed".into()).unwrap();
        assert_eq!(text.get(), Value::from("typed"));
        assert_eq!(memory.property(input, "text"), Some(Value::from("typed")));
    }

    #[test]
    fn mismatched_props_fail_synchronously() {
        let (_memory, scope) = setup();

        let cases = [
            Props::new().prop("@clicked", 1),
            Props::new().handler("clicked", |_| {}),
            Props::new().prop("@text", "x"),
            Props::new().signal("@length", Signal::new(Value::Int(0))),
            Props::new().prop("colour", "red"),
            Props::new().prop("length", 4),
        ];
        for props in cases {
            let result = scope.build(ElementDescriptor::native("TextInput").with_props(props));
            assert!(
                matches!(result, Err(ReactiveError::PropertyBinding { .. })),
                "expected a binding error, got {result:?}"
            );
        }
    }

    #[test]
    fn components_get_a_child_scope_and_restore_the_active_one() {
        let (_memory, scope) = setup();
        let parent_id = scope.id();

        let node = scope
            .run(|| {
                build(ElementDescriptor::component(move |_, own: &Scope| {
                    assert_eq!(own.parent().map(|p| p.id()), Some(parent_id));
                    assert_eq!(ScopeContext::current().map(|s| s.id()), Some(own.id()));
                    own.build(ElementDescriptor::native("Label"))
                }))
            })
            .unwrap();

        assert_eq!(scope.children().len(), 1);
        assert!(ScopeContext::current().is_none());
        assert!(node.raw() > 0);
    }

    #[test]
    fn failing_component_restores_scope_and_disposes_its_own() {
        let (_memory, scope) = setup();
        let cleaned = Arc::new(AtomicUsize::new(0));
        let c = cleaned.clone();

        let result = scope.run(|| {
            let depth = ScopeContext::depth();
            let result = build(ElementDescriptor::component(move |_, own: &Scope| {
                let c = c.clone();
                own.on_cleanup(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                });
                Err(ReactiveError::Context { operation: "test" })
            }));
            assert_eq!(ScopeContext::depth(), depth);
            assert_eq!(ScopeContext::current().map(|s| s.id()), Some(scope.id()));
            result
        });

        assert!(result.is_err());
        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
        assert!(scope.children().is_empty());
    }

    #[test]
    fn panicking_component_restores_the_active_scope() {
        let (_memory, scope) = setup();
        let outer = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scope.run(|| {
                let _ = build(ElementDescriptor::component(|_, _| panic!("render failed")));
            })
        }));

        assert!(outer.is_err());
        assert_eq!(ScopeContext::depth(), 0);
    }

    #[test]
    fn two_way_binding_settles_on_nan() {
        let (memory, scope) = setup();
        memory.register_type("Slider", NodeSchema::new().property("value", 0.0));
        let level = Signal::new(Value::Float(0.0));
        let slider = scope
            .build(
                ElementDescriptor::native("Slider")
                    .with_props(Props::new().signal("@value", level.clone())),
            )
            .unwrap();

        memory
            .simulate_change(slider, "value", Value::Float(f64::NAN))
            .unwrap();

        assert!(level.get().as_float().is_some_and(f64::is_nan));
        assert_eq!(memory.property(slider, "value"), Some(Value::Float(f64::NAN)));
    }

    #[test]
    fn failed_native_build_destroys_the_node_and_its_bindings() {
        let (memory, scope) = setup();
        let text = Signal::new(Value::from("draft"));

        let result = scope.build(
            ElementDescriptor::native("TextInput")
                .with_props(Props::new().signal("text", text.clone()).prop("colour", "red")),
        );

        assert!(matches!(result, Err(ReactiveError::PropertyBinding { .. })));
        assert_eq!(memory.node_count(), 0);
        assert_eq!(text.subscriber_count(), 0);
    }

    #[test]
    fn component_is_disposed_when_its_children_cannot_attach() {
        let (memory, scope) = setup();
        let cleaned = Arc::new(AtomicUsize::new(0));
        let c = cleaned.clone();

        let result = scope.build(
            ElementDescriptor::component(move |_, own: &Scope| {
                let c = c.clone();
                own.on_cleanup(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                });
                own.build(ElementDescriptor::native("Container"))
            })
            .child(NodeId::from_raw(u64::MAX)),
        );

        assert!(matches!(result, Err(ReactiveError::Host(_))));
        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
        assert!(scope.children().is_empty());
        assert_eq!(memory.node_count(), 0);
    }
}
