//! Integration tests for the bridge and its execution context.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dynamenu_core::{
    CallOutcome, CommandId, DelegateAnswer, DelegateBridge, DelegateContext, DelegateError,
    DelegateOp, DelegateTable, DelegateValue, EventFlags, MenuDelegate, Unavailable,
};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dynamenu=trace")
        .with_test_writer()
        .try_init();
}

fn bridge_on(context: &Arc<DelegateContext>) -> Arc<DelegateBridge> {
    Arc::new(DelegateBridge::builder().context(context.clone()).build())
}

/// Asks the bridge again from inside a callback.
struct Nested {
    bridge: Arc<DelegateBridge>,
    inner: DelegateTable,
    saw_reentrant_scope: AtomicBool,
}

impl MenuDelegate for Nested {
    fn is_command_id_checked(&self, command_id: CommandId) -> DelegateAnswer {
        self.saw_reentrant_scope
            .store(self.bridge.context().is_entered_by_current_thread(), Ordering::SeqCst);
        let inner = self
            .bridge
            .call(Some(&self.inner), DelegateOp::IsCommandIdEnabled, command_id);
        Some(Ok(inner.value_or(DelegateValue::Undefined)))
    }
}

#[test]
fn test_nested_calls_on_same_thread() {
    setup();
    let context = Arc::new(DelegateContext::new("nested"));
    let bridge = bridge_on(&context);
    let nested = Nested {
        bridge: bridge.clone(),
        inner: DelegateTable::new().with(DelegateOp::IsCommandIdEnabled, |id| Ok((id.get() > 0).into())),
        saw_reentrant_scope: AtomicBool::new(false),
    };

    let outcome = bridge.call(Some(&nested), DelegateOp::IsCommandIdChecked, CommandId(3));
    assert_eq!(outcome, CallOutcome::Answered(DelegateValue::Bool(true)));
    assert!(nested.saw_reentrant_scope.load(Ordering::SeqCst));
    assert!(!context.is_locked());
    assert_eq!(context.entry_count(), 2);
}

#[test]
fn test_threads_serialize_on_context() {
    setup();
    let context = Arc::new(DelegateContext::new("serial"));
    let bridge = bridge_on(&context);
    let active = Arc::new(AtomicUsize::new(0));
    let overlapped = Arc::new(AtomicBool::new(false));

    let table = {
        let active = active.clone();
        let overlapped = overlapped.clone();
        Arc::new(DelegateTable::new().with(DelegateOp::ExecuteCommand, move |_| {
            if active.fetch_add(1, Ordering::SeqCst) > 0 {
                overlapped.store(true, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_micros(100));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(DelegateValue::Undefined)
        }))
    };

    let workers: Vec<_> = (0..4)
        .map(|n| {
            let bridge = bridge.clone();
            let table = table.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let outcome = bridge.execute(Some(table.as_ref()), CommandId(n * 100 + i), EventFlags::NONE);
                    assert!(outcome.is_answered());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(!overlapped.load(Ordering::SeqCst));
    let stats = bridge.stats();
    assert_eq!(stats.calls, 100);
    assert_eq!(stats.answered, 100);
    assert_eq!(context.entry_count(), 100);
}

#[test]
fn test_timeout_then_recovery() {
    setup();
    let context = Arc::new(DelegateContext::new("timeout"));
    let bridge = Arc::new(
        DelegateBridge::builder()
            .context(context.clone())
            .lock_timeout(Duration::from_millis(10))
            .build(),
    );
    let table = Arc::new(DelegateTable::new().with(DelegateOp::IsCommandIdVisible, |_| Ok(false.into())));

    let held = context.enter();
    let outcome = {
        let bridge = bridge.clone();
        let table = table.clone();
        thread::spawn(move || bridge.call(Some(table.as_ref()), DelegateOp::IsCommandIdVisible, CommandId(1)))
            .join()
            .unwrap()
    };
    match outcome.error() {
        Some(DelegateError::ContextTimeout { operation, timeout }) => {
            assert_eq!(*operation, DelegateOp::IsCommandIdVisible);
            assert_eq!(*timeout, Duration::from_millis(10));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    drop(held);

    let value = bridge.call_or(Some(table.as_ref()), DelegateOp::IsCommandIdVisible, CommandId(1), true.into());
    assert_eq!(value, DelegateValue::Bool(false));
}

#[test]
fn test_uncaught_panics_still_release_context() {
    setup();
    let context = Arc::new(DelegateContext::new("uncaught"));
    let bridge = Arc::new(
        DelegateBridge::builder()
            .context(context.clone())
            .catch_panics(false)
            .build(),
    );

    let result = {
        let bridge = bridge.clone();
        thread::spawn(move || {
            let table = DelegateTable::new().with(DelegateOp::MenuWillShow, |_| panic!("unwinding"));
            bridge.notify_will_show(Some(&table))
        })
        .join()
    };
    assert!(result.is_err());
    assert!(!context.is_locked());
    assert_eq!(
        bridge.call(None, DelegateOp::MenuWillShow, CommandId::NONE),
        CallOutcome::Unavailable(Unavailable::NoDelegate)
    );
}
