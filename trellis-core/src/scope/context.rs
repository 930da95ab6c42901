//! Active scope stack.
//!
//! Component bodies find their scope through a thread-local stack, the same
//! way signal reads find the running effect. Entering a scope returns a
//! guard; dropping the guard restores the previously active scope, whether
//! the component returned normally, returned an error, or panicked.

use std::cell::RefCell;

use super::Scope;

thread_local! {
    static SCOPE_STACK: RefCell<Vec<Scope>> = const { RefCell::new(Vec::new()) };
}

/// Guard that deactivates a scope when dropped.
pub struct ScopeContext {
    scope: super::ScopeId,
}

impl ScopeContext {
    /// Make `scope` the active scope until the guard is dropped.
    pub fn enter(scope: Scope) -> Self {
        let id = scope.id();
        SCOPE_STACK.with(|stack| stack.borrow_mut().push(scope));
        Self { scope: id }
    }

    /// The active scope, if any.
    pub fn current() -> Option<Scope> {
        SCOPE_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Number of nested active scopes on this thread.
    pub fn depth() -> usize {
        SCOPE_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ScopeContext {
    fn drop(&mut self) {
        // Pop first, drop afterwards: the popped handle may be the last one.
        let popped = SCOPE_STACK.with(|stack| stack.borrow_mut().pop());

        if let Some(scope) = &popped {
            debug_assert_eq!(
                scope.id(),
                self.scope,
                "ScopeContext mismatch: expected {}, got {}",
                self.scope,
                scope.id()
            );
        }
        drop(popped);
    }
}
