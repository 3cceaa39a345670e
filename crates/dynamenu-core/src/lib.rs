//! Core systems for dynamenu.
//!
//! This crate provides the pieces of the menu model that deal with the
//! external delegate:
//!
//! - **Values**: [`DelegateValue`], the loosely typed answers a delegate gives
//! - **Delegate contract**: [`MenuDelegate`] with optional operations, and
//!   [`DelegateTable`] for delegates assembled from closures
//! - **Execution context**: [`DelegateContext`], a re-entrant lock with scoped
//!   entry guarding the environment delegates run in
//! - **Bridge**: [`DelegateBridge`], which enters the context, invokes an
//!   operation, and falls back to defaults when there is no usable answer
//! - **Logging**: tracing targets and tree-format options
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dynamenu_core::{
//!     CallOutcome, CommandId, DelegateBridge, DelegateContext, DelegateOp, DelegateTable,
//! };
//!
//! let bridge = DelegateBridge::builder()
//!     .context(Arc::new(DelegateContext::new("script")))
//!     .build();
//!
//! let delegate = DelegateTable::new()
//!     .with(DelegateOp::IsCommandIdChecked, |id| Ok((id.get() == 1).into()));
//!
//! let outcome = bridge.call(Some(&delegate), DelegateOp::IsCommandIdChecked, CommandId(1));
//! assert!(matches!(outcome, CallOutcome::Answered(v) if v.is_truthy()));
//! ```

pub mod bridge;
pub mod context;
pub mod delegate;
mod error;
pub mod logging;
mod value;

pub use bridge::{
    BridgeBuilder, BridgeConfig, BridgeStatsSnapshot, CallOutcome, DelegateBridge, Unavailable,
};
pub use context::{ContextScope, DelegateContext};
pub use delegate::{DelegateAnswer, DelegateOp, DelegateTable, MenuDelegate, UnknownOperation};
pub use error::{DelegateError, DelegateException, DelegateResult};
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle};
pub use value::{CommandId, DelegateValue, EventFlags};
