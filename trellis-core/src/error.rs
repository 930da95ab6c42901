//! Error types.
//!
//! Every fallible operation in the crate returns [`Result`], whose error is
//! [`ReactiveError`]. Failures raised by the host toolkit are wrapped in
//! [`HostError`] so callers can tell toolkit problems apart from misuse of the
//! reactive API.

use thiserror::Error;

use crate::host::NodeId;
use crate::scope::ScopeId;

/// Boxed error returned by fallible effect actions and cleanups.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;

/// Errors produced by the reactive runtime and the element builder.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// A scope-bound operation ran with no active component scope.
    #[error("`{operation}` requires an active component scope")]
    Context { operation: &'static str },

    /// An effect's action failed.
    #[error("effect {effect} failed: {source}")]
    EffectExecution {
        effect: u64,
        #[source]
        source: BoxError,
    },

    /// One or more cleanup actions failed while disposing a scope.
    #[error("disposing scope {scope} failed: {}", failures.join("; "))]
    Disposal { scope: ScopeId, failures: Vec<String> },

    /// A prop could not be applied to a native node.
    #[error("cannot bind `{key}` on node {node}: {reason}")]
    PropertyBinding {
        node: NodeId,
        key: String,
        reason: String,
    },

    /// The scope was already disposed.
    #[error("scope {0} is disposed")]
    ScopeDisposed(ScopeId),

    /// Native construction was requested in a scope tree without a host toolkit.
    #[error("scope {0} has no host toolkit attached")]
    NoHost(ScopeId),

    /// The host toolkit rejected an operation.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The runtime configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReactiveError {
    pub(crate) fn binding(node: NodeId, key: &str, reason: impl Into<String>) -> Self {
        Self::PropertyBinding {
            node,
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors reported by a [`Host`](crate::host::Host) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("unknown node type `{0}`")]
    UnknownType(String),

    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {node} has no member `{member}`")]
    UnknownMember { node: NodeId, member: String },

    #[error("property `{property}` on node {node} is read-only")]
    ReadOnly { node: NodeId, property: String },

    #[error("`{member}` on node {node} is not {expected}")]
    WrongMemberKind {
        node: NodeId,
        member: String,
        expected: &'static str,
    },

    #[error("node {0} has been destroyed")]
    Destroyed(NodeId),
}
