//! Mounting
//!
//! `mount` is the entry point that turns a root component into a live tree
//! under some existing host node, and [`MountHandle::dispose`] tears the whole
//! tree down again.

use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::element::Props;
use crate::error::Result;
use crate::host::{Host, NodeId};
use crate::scope::Scope;

/// A mounted component tree.
///
/// Dropping the handle disposes the tree if [`dispose`](Self::dispose) was
/// not called; failures are then only logged.
pub struct MountHandle {
    container: NodeId,
    root: NodeId,
    scope: Scope,
    host: Arc<dyn Host>,
    disposed: bool,
}

impl MountHandle {
    /// The container node created under the host parent.
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// The node returned by the root component.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Dispose the root scope, cascading to every component, then destroy
    /// the container. The container is destroyed even if disposal reported
    /// failures. Calling this again does nothing.
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        let disposed = self.scope.dispose();
        let destroyed = self.host.destroy_node(self.container);
        tracing::debug!(container = %self.container, scope = %self.scope.id(), "unmounted");

        disposed?;
        destroyed?;
        Ok(())
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        if let Err(error) = self.dispose() {
            tracing::warn!(container = %self.container, error = %error, "unmount on drop failed");
        }
    }
}

impl std::fmt::Debug for MountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountHandle")
            .field("container", &self.container)
            .field("root", &self.root)
            .field("scope", &self.scope)
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Mount `root_component` under `host_parent`.
///
/// Creates a root scope carrying `host` and `config`, a container node of
/// type `config.container_type` attached under `host_parent`, runs the
/// component with the root scope active, and attaches the node it returns to
/// the container. If the component fails, everything created so far is torn
/// down before the error is returned.
pub fn mount<F>(
    root_component: F,
    props: Props,
    host: Arc<dyn Host>,
    host_parent: NodeId,
    config: RuntimeConfig,
) -> Result<MountHandle>
where
    F: FnOnce(Props, &Scope) -> Result<NodeId>,
{
    let scope = Scope::root(host.clone(), config)?;
    let container = host.create_node(&scope.config().container_type)?;

    let built = host
        .append_child(host_parent, container)
        .map_err(Into::into)
        .and_then(|()| scope.run(|| root_component(props, &scope)))
        .and_then(|root| {
            host.append_child(container, root)?;
            Ok(root)
        });

    let root = match built {
        Ok(root) => root,
        Err(error) => {
            if let Err(cleanup) = scope.dispose() {
                tracing::warn!(error = %cleanup, "disposing after failed mount");
            }
            if let Err(destroy) = host.destroy_node(container) {
                tracing::warn!(error = %destroy, "destroying container after failed mount");
            }
            return Err(error);
        }
    };

    tracing::debug!(container = %container, root = %root, scope = %scope.id(), "mounted");
    Ok(MountHandle {
        container,
        root,
        scope,
        host,
        disposed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementDescriptor;
    use crate::error::ReactiveError;
    use crate::host::MemoryHost;
    use crate::value::Value;

    fn window(memory: &Arc<MemoryHost>) -> NodeId {
        memory.create_node("Window").unwrap()
    }

    #[test]
    fn mount_builds_under_a_container() {
        let memory = Arc::new(MemoryHost::new());
        let parent = window(&memory);

        let mut handle = mount(
            |props, scope| {
                scope.build(
                    ElementDescriptor::native("Label")
                        .with_props(Props::new().prop("text", props.value("greeting").unwrap_or_default())),
                )
            },
            Props::new().prop("greeting", "hello"),
            memory.clone(),
            parent,
            RuntimeConfig::default(),
        )
        .unwrap();

        assert_eq!(memory.children(parent), vec![handle.container()]);
        assert_eq!(memory.children(handle.container()), vec![handle.root()]);
        assert_eq!(memory.property(handle.root(), "text"), Some(Value::from("hello")));
        assert_eq!(memory.node_type(handle.container()).as_deref(), Some("Container"));

        handle.dispose().unwrap();
        assert!(memory.children(parent).is_empty());
        assert!(!memory.is_alive(handle.root()));
        assert!(handle.scope().is_disposed());
        assert!(handle.dispose().is_ok());
    }

    #[test]
    fn failed_mount_leaves_nothing_behind() {
        let memory = Arc::new(MemoryHost::new());
        let parent = window(&memory);

        let result = mount(
            |_, scope| scope.build(ElementDescriptor::native("Slider")),
            Props::new(),
            memory.clone(),
            parent,
            RuntimeConfig::default(),
        );

        assert!(matches!(result, Err(ReactiveError::Host(_))));
        assert!(memory.children(parent).is_empty());
        assert_eq!(memory.node_count(), 1);
    }

    #[test]
    fn dropping_the_handle_unmounts() {
        let memory = Arc::new(MemoryHost::new());
        let parent = window(&memory);

        let handle = mount(
            |_, scope| scope.build(ElementDescriptor::native("Label")),
            Props::new(),
            memory.clone(),
            parent,
            RuntimeConfig::default(),
        )
        .unwrap();
        let container = handle.container();
        drop(handle);

        assert!(!memory.is_alive(container));
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_the_host() {
        let memory = Arc::new(MemoryHost::new());
        let parent = window(&memory);
        let config = RuntimeConfig {
            container_type: String::new(),
            ..RuntimeConfig::default()
        };

        let result = mount(
            |_, scope| scope.build(ElementDescriptor::native("Label")),
            Props::new(),
            memory.clone(),
            parent,
            config,
        );

        assert!(matches!(result, Err(ReactiveError::Config(_))));
        assert_eq!(memory.node_count(), 1);
    }
}
