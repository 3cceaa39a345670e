//! The delegate's execution context.
//!
//! A delegate typically lives in an environment that can only run one piece of
//! code at a time (a script engine with a global interpreter lock). Every call
//! into a delegate therefore happens inside a [`ContextScope`], obtained from
//! [`DelegateContext::enter`]:
//!
//! - The scope holds the context's re-entrant lock. Other threads block until
//!   it is released; the owning thread may enter again (a delegate calling back
//!   into a menu that queries the delegate once more).
//! - The scope is released when dropped, including during unwinding.
//!
//! ```
//! use dynamenu_core::DelegateContext;
//!
//! let context = DelegateContext::new("script");
//! {
//!     let outer = context.enter();
//!     let inner = context.enter(); // same thread: nests, no deadlock
//!     assert_eq!(inner.depth(), 2);
//!     drop(inner);
//!     assert_eq!(outer.depth(), 1);
//! }
//! assert!(!context.is_locked());
//! ```

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::logging::targets;

/// The process-wide context shared by default bridges.
static GLOBAL_CONTEXT: OnceLock<Arc<DelegateContext>> = OnceLock::new();

#[derive(Debug, Default)]
struct ScopeState {
    /// Number of nested scopes currently open on the owning thread.
    depth: usize,
}

/// Exclusive access to the environment delegates run in.
pub struct DelegateContext {
    name: String,
    lock: ReentrantMutex<RefCell<ScopeState>>,
    entries: AtomicU64,
}

impl DelegateContext {
    /// Create a new context with a name used in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lock: ReentrantMutex::new(RefCell::new(ScopeState::default())),
            entries: AtomicU64::new(0),
        }
    }

    /// The process-wide context.
    pub fn global() -> Arc<DelegateContext> {
        GLOBAL_CONTEXT
            .get_or_init(|| Arc::new(DelegateContext::new("global")))
            .clone()
    }

    /// The context's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enter the context, blocking until no other thread holds it.
    pub fn enter(&self) -> ContextScope<'_> {
        ContextScope::open(self, self.lock.lock())
    }

    /// Enter the context, giving up after `timeout`.
    pub fn try_enter_for(&self, timeout: Duration) -> Option<ContextScope<'_>> {
        let guard = self.lock.try_lock_for(timeout);
        if guard.is_none() {
            tracing::debug!(target: targets::CONTEXT, context = %self.name, ?timeout, "context busy");
        }
        guard.map(|guard| ContextScope::open(self, guard))
    }

    /// Check whether any thread currently holds the context.
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Check whether the current thread is inside a scope of this context.
    pub fn is_entered_by_current_thread(&self) -> bool {
        // A re-entrant try_lock only succeeds for the owner or when unheld.
        self.lock
            .try_lock()
            .is_some_and(|guard| guard.borrow().depth > 0)
    }

    /// Total number of scopes opened since creation.
    pub fn entry_count(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for DelegateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateContext")
            .field("name", &self.name)
            .field("locked", &self.is_locked())
            .field("entries", &self.entry_count())
            .finish()
    }
}

/// An open scope inside a [`DelegateContext`].
///
/// Values produced by the delegate during the scope are owned Rust values and
/// are moved out before the scope closes; nothing borrowed from the delegate's
/// environment outlives it.
pub struct ContextScope<'a> {
    context: &'a DelegateContext,
    guard: ReentrantMutexGuard<'a, RefCell<ScopeState>>,
    depth: usize,
}

impl<'a> ContextScope<'a> {
    fn open(context: &'a DelegateContext, guard: ReentrantMutexGuard<'a, RefCell<ScopeState>>) -> Self {
        let depth = {
            let mut state = guard.borrow_mut();
            state.depth += 1;
            state.depth
        };
        context.entries.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(target: targets::CONTEXT, context = %context.name, depth, "entered context");
        Self {
            context,
            guard,
            depth,
        }
    }

    /// Nesting depth of this scope (1 for the outermost).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this scope was opened inside another scope on the same thread.
    pub fn is_reentrant(&self) -> bool {
        self.depth > 1
    }

    /// The context this scope belongs to.
    pub fn context(&self) -> &'a DelegateContext {
        self.context
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        let mut state = self.guard.borrow_mut();
        state.depth = state.depth.saturating_sub(1);
        tracing::trace!(target: targets::CONTEXT, context = %self.context.name, depth = state.depth, "left context");
    }
}

static_assertions::assert_impl_all!(DelegateContext: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_enter_and_release() {
        let context = DelegateContext::new("test");
        assert!(!context.is_locked());
        {
            let scope = context.enter();
            assert_eq!(scope.depth(), 1);
            assert!(!scope.is_reentrant());
            assert!(context.is_locked());
            assert!(context.is_entered_by_current_thread());
        }
        assert!(!context.is_locked());
        assert!(!context.is_entered_by_current_thread());
        assert_eq!(context.entry_count(), 1);
    }

    #[test]
    fn test_reentrant_enter() {
        let context = DelegateContext::new("test");
        let outer = context.enter();
        let inner = context.enter();
        assert_eq!(inner.depth(), 2);
        assert!(inner.is_reentrant());
        drop(inner);
        assert_eq!(outer.depth(), 1);
        drop(outer);
        assert!(!context.is_locked());
    }

    #[test]
    fn test_released_on_panic() {
        let context = Arc::new(DelegateContext::new("test"));
        let ctx = context.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _scope = ctx.enter();
            panic!("delegate blew up");
        }));
        assert!(result.is_err());
        assert!(!context.is_locked());
    }

    #[test]
    fn test_other_thread_blocks() {
        let context = Arc::new(DelegateContext::new("test"));
        let scope = context.enter();

        let ctx = context.clone();
        let (tx, rx) = mpsc::channel();
        let entered = Arc::new(AtomicBool::new(false));
        let entered_clone = entered.clone();
        let handle = thread::spawn(move || {
            assert!(!ctx.is_entered_by_current_thread());
            tx.send(()).unwrap();
            let _scope = ctx.enter();
            entered_clone.store(true, Ordering::SeqCst);
        });

        rx.recv().unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(!entered.load(Ordering::SeqCst));
        drop(scope);
        handle.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }

    #[test]
    fn test_try_enter_times_out() {
        let context = Arc::new(DelegateContext::new("test"));
        let _scope = context.enter();

        let ctx = context.clone();
        let timed_out = thread::spawn(move || ctx.try_enter_for(Duration::from_millis(10)).is_none())
            .join()
            .unwrap();
        assert!(timed_out);

        // The owner can always re-enter.
        assert!(context.try_enter_for(Duration::from_millis(10)).is_some());
    }

    #[test]
    fn test_global_is_shared() {
        let a = DelegateContext::global();
        let b = DelegateContext::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "global");
    }
}
