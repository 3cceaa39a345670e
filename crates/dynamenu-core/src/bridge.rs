//! The delegate bridge.
//!
//! [`DelegateBridge`] is the only code that calls into a delegate. For every
//! call it:
//!
//! 1. Returns the "unavailable" outcome immediately if there is no delegate.
//! 2. Enters the [`DelegateContext`] (re-entrant, scoped).
//! 3. Invokes the operation, catching panics unless configured otherwise.
//! 4. Leaves the context, then classifies the answer.
//!
//! Failures are never propagated to the caller as errors. They are logged at
//! `warn`, counted, handed to the optional failure handler, and the caller
//! substitutes its default. This holds for execution as well: a failing
//! `executeCommand` is reported, not raised.
//!
//! # Example
//!
//! ```
//! use dynamenu_core::{CommandId, DelegateBridge, DelegateOp, DelegateTable, DelegateValue};
//!
//! let bridge = DelegateBridge::builder().build();
//! let table = DelegateTable::new()
//!     .with(DelegateOp::IsCommandIdEnabled, |_| Ok(false.into()));
//!
//! let enabled = bridge.call_or(
//!     Some(&table),
//!     DelegateOp::IsCommandIdEnabled,
//!     CommandId(7),
//!     DelegateValue::Bool(true),
//! );
//! assert_eq!(enabled, DelegateValue::Bool(false));
//!
//! let visible = bridge.call_or(
//!     Some(&table),
//!     DelegateOp::IsCommandIdVisible,
//!     CommandId(7),
//!     DelegateValue::Bool(true),
//! );
//! assert_eq!(visible, DelegateValue::Bool(true));
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::RwLock;

use crate::context::DelegateContext;
use crate::delegate::{self, DelegateOp, MenuDelegate};
use crate::error::DelegateError;
use crate::logging::targets;
use crate::value::{CommandId, DelegateValue, EventFlags};

/// The bridge shared by menus that were not given one explicitly.
static SHARED_BRIDGE: OnceLock<Arc<DelegateBridge>> = OnceLock::new();

/// Configuration for a [`DelegateBridge`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long to wait for the delegate context before giving up.
    ///
    /// `None` (the default) waits indefinitely. When set, a call that cannot
    /// enter the context in time fails with [`DelegateError::ContextTimeout`]
    /// and the caller's default is used.
    pub lock_timeout: Option<Duration>,
    /// Convert delegate panics into [`DelegateError::Panicked`].
    pub catch_panics: bool,
    /// Log every default substitution at `trace` level.
    pub log_fallbacks: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            lock_timeout: None,
            catch_panics: true,
            log_fallbacks: false,
        }
    }
}

/// Builder for creating bridges with custom configuration.
#[derive(Debug, Default)]
pub struct BridgeBuilder {
    config: BridgeConfig,
    context: Option<Arc<DelegateContext>>,
}

impl BridgeBuilder {
    /// Create a builder with default settings and the global context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific execution context instead of the global one.
    pub fn context(mut self, context: Arc<DelegateContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Give up on entering the context after `timeout`.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = Some(timeout);
        self
    }

    /// Whether delegate panics are caught.
    pub fn catch_panics(mut self, catch: bool) -> Self {
        self.config.catch_panics = catch;
        self
    }

    /// Whether default substitutions are logged.
    pub fn log_fallbacks(mut self, log: bool) -> Self {
        self.config.log_fallbacks = log;
        self
    }

    /// Build the bridge.
    pub fn build(self) -> DelegateBridge {
        let context = self.context.unwrap_or_else(DelegateContext::global);
        DelegateBridge::with_config(context, self.config)
    }
}

/// Why a call produced no answer without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// No delegate is attached.
    NoDelegate,
    /// The delegate does not implement the operation.
    NotImplemented,
}

/// The result of one bridge call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The delegate answered.
    Answered(DelegateValue),
    /// There was nobody to ask.
    Unavailable(Unavailable),
    /// The delegate failed; the failure has been reported.
    Failed(DelegateError),
}

impl CallOutcome {
    /// The answer, or `default` if there is none.
    pub fn value_or(self, default: DelegateValue) -> DelegateValue {
        match self {
            Self::Answered(value) => value,
            Self::Unavailable(_) | Self::Failed(_) => default,
        }
    }

    /// Whether the delegate ran and returned normally.
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    /// The reported failure, if any.
    pub fn error(&self) -> Option<&DelegateError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Call counters of a bridge.
#[derive(Debug, Default)]
struct BridgeStats {
    calls: AtomicU64,
    answered: AtomicU64,
    fallbacks: AtomicU64,
    failures: AtomicU64,
}

/// A point-in-time copy of a bridge's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStatsSnapshot {
    /// Calls made through the bridge.
    pub calls: u64,
    /// Calls the delegate answered.
    pub answered: u64,
    /// Calls with no delegate or no implementation.
    pub fallbacks: u64,
    /// Calls that failed.
    pub failures: u64,
}

type FailureHandler = Arc<dyn Fn(&DelegateError) + Send + Sync>;

/// Forwards operations to delegates inside the delegate context.
pub struct DelegateBridge {
    context: Arc<DelegateContext>,
    config: BridgeConfig,
    stats: BridgeStats,
    failure_handler: RwLock<Option<FailureHandler>>,
}

impl DelegateBridge {
    /// Create a bridge with default configuration.
    pub fn new(context: Arc<DelegateContext>) -> Self {
        Self::with_config(context, BridgeConfig::default())
    }

    /// Create a bridge with a specific configuration.
    pub fn with_config(context: Arc<DelegateContext>, config: BridgeConfig) -> Self {
        Self {
            context,
            config,
            stats: BridgeStats::default(),
            failure_handler: RwLock::new(None),
        }
    }

    /// Start building a bridge.
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// The process-wide bridge, running on the global context.
    pub fn shared() -> Arc<DelegateBridge> {
        SHARED_BRIDGE
            .get_or_init(|| Arc::new(DelegateBridge::new(DelegateContext::global())))
            .clone()
    }

    /// The context this bridge enters.
    pub fn context(&self) -> &Arc<DelegateContext> {
        &self.context
    }

    /// The bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Install a handler that receives every reported failure.
    ///
    /// The handler runs after the context has been left.
    pub fn set_failure_handler<F>(&self, handler: F)
    where
        F: Fn(&DelegateError) + Send + Sync + 'static,
    {
        *self.failure_handler.write() = Some(Arc::new(handler));
    }

    /// Remove the failure handler.
    pub fn clear_failure_handler(&self) {
        *self.failure_handler.write() = None;
    }

    /// Call a query operation.
    pub fn call(
        &self,
        delegate: Option<&dyn MenuDelegate>,
        op: DelegateOp,
        command_id: CommandId,
    ) -> CallOutcome {
        self.dispatch(delegate, op, command_id, EventFlags::NONE)
    }

    /// Call a query operation and substitute `default` when there is no answer.
    pub fn call_or(
        &self,
        delegate: Option<&dyn MenuDelegate>,
        op: DelegateOp,
        command_id: CommandId,
        default: DelegateValue,
    ) -> DelegateValue {
        self.call(delegate, op, command_id).value_or(default)
    }

    /// Execute a command. The delegate's return value is discarded.
    pub fn execute(
        &self,
        delegate: Option<&dyn MenuDelegate>,
        command_id: CommandId,
        event_flags: EventFlags,
    ) -> CallOutcome {
        match self.dispatch(delegate, DelegateOp::ExecuteCommand, command_id, event_flags) {
            CallOutcome::Answered(_) => CallOutcome::Answered(DelegateValue::Undefined),
            other => other,
        }
    }

    /// Tell the delegate its menu is about to be shown.
    pub fn notify_will_show(&self, delegate: Option<&dyn MenuDelegate>) -> CallOutcome {
        self.dispatch(delegate, DelegateOp::MenuWillShow, CommandId::NONE, EventFlags::NONE)
    }

    /// Current counters.
    pub fn stats(&self) -> BridgeStatsSnapshot {
        BridgeStatsSnapshot {
            calls: self.stats.calls.load(Ordering::Relaxed),
            answered: self.stats.answered.load(Ordering::Relaxed),
            fallbacks: self.stats.fallbacks.load(Ordering::Relaxed),
            failures: self.stats.failures.load(Ordering::Relaxed),
        }
    }

    fn dispatch(
        &self,
        delegate: Option<&dyn MenuDelegate>,
        op: DelegateOp,
        command_id: CommandId,
        event_flags: EventFlags,
    ) -> CallOutcome {
        self.stats.calls.fetch_add(1, Ordering::Relaxed);

        let Some(delegate) = delegate else {
            return self.unavailable(op, command_id, Unavailable::NoDelegate);
        };

        let _span = tracing::trace_span!(
            target: "dynamenu::bridge",
            "delegate_call",
            operation = op.name(),
            command_id = command_id.get()
        )
        .entered();

        let scope = match self.config.lock_timeout {
            Some(timeout) => match self.context.try_enter_for(timeout) {
                Some(scope) => scope,
                None => return self.failed(DelegateError::ContextTimeout { operation: op, timeout }),
            },
            None => self.context.enter(),
        };

        let answer = if self.config.catch_panics {
            panic::catch_unwind(AssertUnwindSafe(|| {
                delegate::invoke(delegate, op, command_id, event_flags)
            }))
        } else {
            Ok(delegate::invoke(delegate, op, command_id, event_flags))
        };
        drop(scope);

        match answer {
            Ok(Some(Ok(value))) => {
                self.stats.answered.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(target: targets::BRIDGE, operation = op.name(), %value, "delegate answered");
                CallOutcome::Answered(value)
            }
            Ok(Some(Err(source))) => self.failed(DelegateError::CallFailed {
                operation: op,
                command_id,
                source,
            }),
            Ok(None) => self.unavailable(op, command_id, Unavailable::NotImplemented),
            Err(payload) => self.failed(DelegateError::Panicked {
                operation: op,
                command_id,
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    fn unavailable(&self, op: DelegateOp, command_id: CommandId, reason: Unavailable) -> CallOutcome {
        self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
        if self.config.log_fallbacks {
            tracing::trace!(
                target: targets::BRIDGE,
                operation = op.name(),
                command_id = command_id.get(),
                ?reason,
                "no answer, using default"
            );
        }
        CallOutcome::Unavailable(reason)
    }

    fn failed(&self, error: DelegateError) -> CallOutcome {
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(target: targets::BRIDGE, operation = error.operation().name(), %error, "delegate call failed, using default");
        let handler = self.failure_handler.read().clone();
        if let Some(handler) = handler {
            handler(&error);
        }
        CallOutcome::Failed(error)
    }
}

impl fmt::Debug for DelegateBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateBridge")
            .field("context", &self.context)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

static_assertions::assert_impl_all!(DelegateBridge: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::DelegateTable;
    use crate::error::DelegateException;
    use parking_lot::Mutex;

    fn private_bridge() -> DelegateBridge {
        DelegateBridge::builder()
            .context(Arc::new(DelegateContext::new("test")))
            .build()
    }

    #[test]
    fn test_no_delegate_is_unavailable() {
        let bridge = private_bridge();
        let outcome = bridge.call(None, DelegateOp::IsCommandIdChecked, CommandId(1));
        assert_eq!(outcome, CallOutcome::Unavailable(Unavailable::NoDelegate));
        // No delegate means the context is never entered.
        assert_eq!(bridge.context().entry_count(), 0);
        assert_eq!(bridge.stats().fallbacks, 1);
    }

    #[test]
    fn test_not_implemented_is_unavailable() {
        let bridge = private_bridge();
        let table = DelegateTable::new();
        let outcome = bridge.call(Some(&table), DelegateOp::IsCommandIdVisible, CommandId(1));
        assert_eq!(outcome, CallOutcome::Unavailable(Unavailable::NotImplemented));
        assert_eq!(
            bridge.call_or(Some(&table), DelegateOp::IsCommandIdVisible, CommandId(1), true.into()),
            DelegateValue::Bool(true)
        );
    }

    #[test]
    fn test_answer_passes_through() {
        let bridge = private_bridge();
        let table = DelegateTable::new()
            .with(DelegateOp::GetLabelForCommandId, |id| Ok(format!("Item {id}").into()));
        let outcome = bridge.call(Some(&table), DelegateOp::GetLabelForCommandId, CommandId(4));
        assert_eq!(outcome, CallOutcome::Answered(DelegateValue::from("Item 4")));
        assert_eq!(bridge.stats().answered, 1);
        assert!(!bridge.context().is_locked());
    }

    #[test]
    fn test_exception_is_reported_and_swallowed() {
        let bridge = private_bridge();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        bridge.set_failure_handler(move |err| seen_clone.lock().push(err.operation()));

        let table = DelegateTable::new()
            .with(DelegateOp::IsCommandIdChecked, |_| Err(DelegateException::new("nope")));
        let value = bridge.call_or(Some(&table), DelegateOp::IsCommandIdChecked, CommandId(3), false.into());

        assert_eq!(value, DelegateValue::Bool(false));
        assert_eq!(*seen.lock(), vec![DelegateOp::IsCommandIdChecked]);
        assert_eq!(bridge.stats().failures, 1);
        assert!(!bridge.context().is_locked());
    }

    #[test]
    fn test_panic_is_caught() {
        let bridge = private_bridge();
        let table = DelegateTable::new()
            .with(DelegateOp::ExecuteCommand, |_| panic!("script crashed"));
        let outcome = bridge.execute(Some(&table), CommandId(9), EventFlags::NONE);

        match outcome {
            CallOutcome::Failed(DelegateError::Panicked { message, command_id, .. }) => {
                assert_eq!(message, "script crashed");
                assert_eq!(command_id, CommandId(9));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!bridge.context().is_locked());
    }

    #[test]
    fn test_execute_discards_return_value() {
        let bridge = private_bridge();
        let table = DelegateTable::new().with(DelegateOp::ExecuteCommand, |_| Ok(DelegateValue::Integer(42)));
        let outcome = bridge.execute(Some(&table), CommandId(1), EventFlags::NONE);
        assert_eq!(outcome, CallOutcome::Answered(DelegateValue::Undefined));
    }

    #[test]
    fn test_will_show_passes_no_command() {
        let bridge = private_bridge();
        let table = DelegateTable::new().with(DelegateOp::MenuWillShow, |id| Ok(id.get().into()));
        let outcome = bridge.notify_will_show(Some(&table));
        assert_eq!(outcome, CallOutcome::Answered(DelegateValue::Integer(-1)));
    }

    #[test]
    fn test_lock_timeout_uses_default() {
        let context = Arc::new(DelegateContext::new("busy"));
        let bridge = Arc::new(
            DelegateBridge::builder()
                .context(context.clone())
                .lock_timeout(Duration::from_millis(10))
                .build(),
        );
        let _held = context.enter();

        let bridge_clone = bridge.clone();
        let outcome = std::thread::spawn(move || {
            let table = DelegateTable::new().with(DelegateOp::IsCommandIdEnabled, |_| Ok(false.into()));
            bridge_clone.call(Some(&table), DelegateOp::IsCommandIdEnabled, CommandId(1))
        })
        .join()
        .unwrap();

        assert!(matches!(outcome, CallOutcome::Failed(DelegateError::ContextTimeout { .. })));
    }

    #[test]
    fn test_config_defaults() {
        let config = BridgeConfig::default();
        assert!(config.catch_panics);
        assert!(config.lock_timeout.is_none());
        assert!(!config.log_fallbacks);
    }

    #[test]
    fn test_shared_bridge_uses_global_context() {
        let bridge = DelegateBridge::shared();
        assert!(Arc::ptr_eq(bridge.context(), &DelegateContext::global()));
    }
}
