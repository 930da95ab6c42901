//! One-way property binding.
//!
//! `bind` keeps a native property equal to a reactive expression. It is an
//! effect whose body evaluates the expression and assigns the result through
//! the host, so any signal read by the expression re-drives the property.

use std::sync::Arc;

use super::effect::{ambient_tracking, Effect};
use crate::error::{ReactiveError, Result};
use crate::host::{Host, Member, NodeId};
use crate::scope::ScopeContext;
use crate::value::Value;

/// Bind `property` of `node` to `source`.
///
/// The property is checked up front: a missing, read-only, or event member
/// is reported as [`ReactiveError::PropertyBinding`] before any effect is
/// created. If a component scope is active, the binding is disposed with it.
pub fn bind<F>(host: &Arc<dyn Host>, node: NodeId, property: &str, source: F) -> Result<Effect>
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    match host.member(node, property)? {
        Some(Member::Property { writable: true }) => {}
        Some(Member::Property { writable: false }) => {
            return Err(ReactiveError::binding(node, property, "property is read-only"))
        }
        Some(Member::Event) => {
            return Err(ReactiveError::binding(node, property, "member is an event, not a property"))
        }
        None => return Err(ReactiveError::binding(node, property, "no such property")),
    }

    let target = host.clone();
    let name = property.to_string();
    let effect = Effect::try_new(
        move || {
            target.set_property(node, &name, source())?;
            Ok(())
        },
        ambient_tracking(),
    )
    .map_err(|err| match err {
        ReactiveError::EffectExecution { source, .. } => {
            ReactiveError::binding(node, property, source.to_string())
        }
        other => other,
    })?;

    if let Some(scope) = ScopeContext::current() {
        effect.bind_to(&scope);
    }
    tracing::trace!(node = %node, property, effect = %effect.id(), "property bound");
    Ok(effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::reactive::Signal;

    fn host_and_label() -> (Arc<MemoryHost>, Arc<dyn Host>, NodeId) {
        let memory = Arc::new(MemoryHost::new());
        let host: Arc<dyn Host> = memory.clone();
        let label = host.create_node("Label").unwrap();
        (memory, host, label)
    }

    #[test]
    fn bind_tracks_the_source() {
        let (memory, host, label) = host_and_label();
        let name = Signal::new(String::from("Ada"));
        let n = name.clone();

        let effect = bind(&host, label, "text", move || format!("Hello, {}", n.get()).into()).unwrap();
        assert_eq!(memory.property(label, "text"), Some(Value::from("Hello, Ada")));

        name.set("Grace".into());
        assert_eq!(memory.property(label, "text"), Some(Value::from("Hello, Grace")));
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn bind_rejects_missing_and_read_only_properties() {
        let (_memory, host, label) = host_and_label();
        assert!(matches!(
            bind(&host, label, "colour", || Value::Null),
            Err(ReactiveError::PropertyBinding { .. })
        ));

        let input = host.create_node("TextInput").unwrap();
        let err = bind(&host, input, "length", || Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("cannot bind `length` on node {input}: property is read-only")
        );
    }
}
