//! dynamenu: hierarchical menus whose state is decided at query time.
//!
//! A [`Menu`] stores structure: ordered entries, separators, check and radio
//! items, and nested submenus. Everything that can change (labels, checked,
//! enabled and visible flags, accelerators) is asked of an external
//! [`MenuDelegate`] whenever a renderer reads it.
//!
//! # Architecture
//!
//! - [`accelerator`]: parses shortcut text such as `"Ctrl+Shift+P"`
//! - [`registry`]: arena storage of menus, ownership and lifetimes
//! - [`menu`]: the [`Menu`] handle, structural edits and live accessors
//! - [`dispatcher`]: the [`CommandDispatcher`] query facade and its defaults
//! - [`resolve`]: whole-tree snapshots for renderers
//! - [`surface`]: the single call into a host
//!
//! Delegate calls go through a [`DelegateBridge`] from `dynamenu-core`, which
//! serializes them on the delegate's execution context and turns failures
//! into defaults.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dynamenu::{Menu, MenuDelegate};
//! use dynamenu_core::{DelegateOp, DelegateTable};
//!
//! let edit = Menu::new();
//! edit.add_item(1, "Undo").unwrap();
//! edit.add_item(2, "Redo").unwrap();
//!
//! let delegate: Arc<dyn MenuDelegate> = Arc::new(
//!     DelegateTable::new()
//!         .with(DelegateOp::IsCommandIdEnabled, |id| Ok((id.get() == 1).into()))
//!         .with(DelegateOp::GetAcceleratorForCommandId, |_| Ok("Ctrl+Z".into())),
//! );
//! edit.set_delegate(Some(delegate));
//!
//! let snapshot = edit.resolve().unwrap();
//! assert!(snapshot.items[0].enabled);
//! assert!(!snapshot.items[1].enabled);
//! assert_eq!(snapshot.items[0].accelerator.unwrap().to_string(), "Ctrl+Z");
//! ```

pub mod accelerator;
pub mod debug;
pub mod dispatcher;
mod error;
pub mod menu;
pub mod registry;
pub mod resolve;
pub mod surface;

pub use accelerator::{Accelerator, AcceleratorParseError, Key, Modifiers, Platform};
pub use debug::MenuTreeDebug;
pub use dispatcher::{CommandDispatcher, DelegateDispatcher};
pub use error::{MenuError, MenuErrorKind, MenuResult};
pub use menu::{Menu, WeakMenu};
pub use registry::{global_registry, MenuEntry, MenuId, MenuItemKind, MenuRegistry, SharedMenuRegistry};
pub use resolve::{ResolvedItem, ResolvedMenu};
pub use surface::{MenuSurface, SurfaceError};

pub use dynamenu_core::{
    CommandId, DelegateAnswer, DelegateBridge, DelegateContext, DelegateError, DelegateException,
    DelegateOp, DelegateResult, DelegateTable, DelegateValue, EventFlags, MenuDelegate,
};
