//! The delegate contract.
//!
//! A delegate answers questions about commands ("is 7 enabled?") and executes
//! them. It is external code: it may implement any subset of the operations,
//! it may fail, and it may call back into the menu that is querying it.
//!
//! # Implementing a delegate
//!
//! Every method of [`MenuDelegate`] has a default returning `None`, meaning
//! "this operation is not implemented". The bridge substitutes the
//! operation's default answer in that case.
//!
//! ```
//! use dynamenu_core::{CommandId, DelegateResult, DelegateValue, MenuDelegate};
//!
//! struct ReadOnly;
//!
//! impl MenuDelegate for ReadOnly {
//!     fn is_command_id_enabled(&self, id: CommandId) -> Option<DelegateResult<DelegateValue>> {
//!         Some(Ok((id.get() != 7).into()))
//!     }
//! }
//! ```
//!
//! # Runtime tables
//!
//! [`DelegateTable`] builds a delegate from closures, looked up by operation.
//! This is the shape a script object takes once marshalled:
//!
//! ```
//! use dynamenu_core::{DelegateOp, DelegateTable};
//!
//! let table = DelegateTable::new()
//!     .with(DelegateOp::IsCommandIdChecked, |id| Ok((id.get() == 2).into()))
//!     .with_named("getLabelForCommandId", |_| Ok("Dynamic".into()))
//!     .unwrap();
//! assert!(table.implements(DelegateOp::GetLabelForCommandId));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DelegateResult;
use crate::value::{CommandId, DelegateValue, EventFlags};

/// The named operations a delegate may implement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelegateOp {
    /// Whether a check or radio item is checked.
    IsCommandIdChecked,
    /// Whether a command can be executed.
    IsCommandIdEnabled,
    /// Whether a command is shown.
    IsCommandIdVisible,
    /// Whether the label of a command is computed by the delegate.
    IsItemForCommandIdDynamic,
    /// The dynamic label of a command.
    GetLabelForCommandId,
    /// The dynamic sublabel of a command.
    GetSubLabelForCommandId,
    /// The accelerator text of a command.
    GetAcceleratorForCommandId,
    /// Run a command.
    ExecuteCommand,
    /// The menu is about to be shown.
    MenuWillShow,
}

impl DelegateOp {
    /// Every operation, in declaration order.
    pub const ALL: [DelegateOp; 9] = [
        Self::IsCommandIdChecked,
        Self::IsCommandIdEnabled,
        Self::IsCommandIdVisible,
        Self::IsItemForCommandIdDynamic,
        Self::GetLabelForCommandId,
        Self::GetSubLabelForCommandId,
        Self::GetAcceleratorForCommandId,
        Self::ExecuteCommand,
        Self::MenuWillShow,
    ];

    /// The name a script delegate exposes this operation under.
    pub fn name(self) -> &'static str {
        match self {
            Self::IsCommandIdChecked => "isCommandIdChecked",
            Self::IsCommandIdEnabled => "isCommandIdEnabled",
            Self::IsCommandIdVisible => "isCommandIdVisible",
            Self::IsItemForCommandIdDynamic => "isItemForCommandIdDynamic",
            Self::GetLabelForCommandId => "getLabelForCommandId",
            Self::GetSubLabelForCommandId => "getSubLabelForCommandId",
            Self::GetAcceleratorForCommandId => "getAcceleratorForCommandId",
            Self::ExecuteCommand => "executeCommand",
            Self::MenuWillShow => "menuWillShow",
        }
    }

    /// Look up an operation by its script name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl fmt::Display for DelegateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The answer of one delegate operation.
///
/// `None` means the operation is not implemented.
pub type DelegateAnswer = Option<DelegateResult<DelegateValue>>;

/// An external object that decides the dynamic state of menu commands.
///
/// All methods are optional. Implementations must be `Send + Sync` because a
/// menu may be queried from any thread; the bridge guarantees that calls are
/// serialized through the delegate context.
pub trait MenuDelegate: Send + Sync {
    /// Whether the command is checked.
    fn is_command_id_checked(&self, _command_id: CommandId) -> DelegateAnswer {
        None
    }

    /// Whether the command is enabled.
    fn is_command_id_enabled(&self, _command_id: CommandId) -> DelegateAnswer {
        None
    }

    /// Whether the command is visible.
    fn is_command_id_visible(&self, _command_id: CommandId) -> DelegateAnswer {
        None
    }

    /// Whether the command's label and sublabel come from the delegate.
    fn is_item_for_command_id_dynamic(&self, _command_id: CommandId) -> DelegateAnswer {
        None
    }

    /// The command's dynamic label.
    fn get_label_for_command_id(&self, _command_id: CommandId) -> DelegateAnswer {
        None
    }

    /// The command's dynamic sublabel.
    fn get_sublabel_for_command_id(&self, _command_id: CommandId) -> DelegateAnswer {
        None
    }

    /// The command's accelerator, as shortcut text such as `"Ctrl+S"`.
    fn get_accelerator_for_command_id(&self, _command_id: CommandId) -> DelegateAnswer {
        None
    }

    /// Run the command. The returned value is ignored.
    fn execute_command(&self, _command_id: CommandId, _event_flags: EventFlags) -> DelegateAnswer {
        None
    }

    /// The menu is about to be shown.
    fn menu_will_show(&self) -> DelegateAnswer {
        None
    }
}

/// Forward `op` to the matching method of `delegate`.
pub fn invoke(
    delegate: &dyn MenuDelegate,
    op: DelegateOp,
    command_id: CommandId,
    event_flags: EventFlags,
) -> DelegateAnswer {
    match op {
        DelegateOp::IsCommandIdChecked => delegate.is_command_id_checked(command_id),
        DelegateOp::IsCommandIdEnabled => delegate.is_command_id_enabled(command_id),
        DelegateOp::IsCommandIdVisible => delegate.is_command_id_visible(command_id),
        DelegateOp::IsItemForCommandIdDynamic => {
            delegate.is_item_for_command_id_dynamic(command_id)
        }
        DelegateOp::GetLabelForCommandId => delegate.get_label_for_command_id(command_id),
        DelegateOp::GetSubLabelForCommandId => delegate.get_sublabel_for_command_id(command_id),
        DelegateOp::GetAcceleratorForCommandId => {
            delegate.get_accelerator_for_command_id(command_id)
        }
        DelegateOp::ExecuteCommand => delegate.execute_command(command_id, event_flags),
        DelegateOp::MenuWillShow => delegate.menu_will_show(),
    }
}

type Handler = Arc<dyn Fn(CommandId) -> DelegateResult<DelegateValue> + Send + Sync>;

/// Error returned when a table entry is registered under an unknown name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown delegate operation: {0}")]
pub struct UnknownOperation(pub String);

/// A delegate assembled from closures at runtime.
///
/// Operations without a registered closure are reported as not implemented.
/// Event flags are not passed to the `executeCommand` closure.
#[derive(Clone, Default)]
pub struct DelegateTable {
    handlers: HashMap<DelegateOp, Handler>,
}

impl DelegateTable {
    /// Create an empty table. It implements nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for an operation, replacing any previous one.
    pub fn set<F>(&mut self, op: DelegateOp, handler: F)
    where
        F: Fn(CommandId) -> DelegateResult<DelegateValue> + Send + Sync + 'static,
    {
        self.handlers.insert(op, Arc::new(handler));
    }

    /// Register a closure using builder pattern.
    pub fn with<F>(mut self, op: DelegateOp, handler: F) -> Self
    where
        F: Fn(CommandId) -> DelegateResult<DelegateValue> + Send + Sync + 'static,
    {
        self.set(op, handler);
        self
    }

    /// Register a closure under the operation's script name.
    pub fn with_named<F>(self, name: &str, handler: F) -> Result<Self, UnknownOperation>
    where
        F: Fn(CommandId) -> DelegateResult<DelegateValue> + Send + Sync + 'static,
    {
        let op = DelegateOp::from_name(name).ok_or_else(|| UnknownOperation(name.to_string()))?;
        Ok(self.with(op, handler))
    }

    /// Remove the closure for an operation.
    pub fn remove(&mut self, op: DelegateOp) -> bool {
        self.handlers.remove(&op).is_some()
    }

    /// Check whether an operation has a closure.
    pub fn implements(&self, op: DelegateOp) -> bool {
        self.handlers.contains_key(&op)
    }

    fn call(&self, op: DelegateOp, command_id: CommandId) -> DelegateAnswer {
        // Clone the handler out so the closure may mutate a table it shares.
        let handler = self.handlers.get(&op)?.clone();
        Some(handler(command_id))
    }
}

impl fmt::Debug for DelegateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ops: Vec<&'static str> = self.handlers.keys().map(|op| op.name()).collect();
        ops.sort_unstable();
        f.debug_struct("DelegateTable").field("operations", &ops).finish()
    }
}

impl MenuDelegate for DelegateTable {
    fn is_command_id_checked(&self, command_id: CommandId) -> DelegateAnswer {
        self.call(DelegateOp::IsCommandIdChecked, command_id)
    }

    fn is_command_id_enabled(&self, command_id: CommandId) -> DelegateAnswer {
        self.call(DelegateOp::IsCommandIdEnabled, command_id)
    }

    fn is_command_id_visible(&self, command_id: CommandId) -> DelegateAnswer {
        self.call(DelegateOp::IsCommandIdVisible, command_id)
    }

    fn is_item_for_command_id_dynamic(&self, command_id: CommandId) -> DelegateAnswer {
        self.call(DelegateOp::IsItemForCommandIdDynamic, command_id)
    }

    fn get_label_for_command_id(&self, command_id: CommandId) -> DelegateAnswer {
        self.call(DelegateOp::GetLabelForCommandId, command_id)
    }

    fn get_sublabel_for_command_id(&self, command_id: CommandId) -> DelegateAnswer {
        self.call(DelegateOp::GetSubLabelForCommandId, command_id)
    }

    fn get_accelerator_for_command_id(&self, command_id: CommandId) -> DelegateAnswer {
        self.call(DelegateOp::GetAcceleratorForCommandId, command_id)
    }

    fn execute_command(&self, command_id: CommandId, _event_flags: EventFlags) -> DelegateAnswer {
        self.call(DelegateOp::ExecuteCommand, command_id)
    }

    fn menu_will_show(&self) -> DelegateAnswer {
        self.call(DelegateOp::MenuWillShow, CommandId::NONE)
    }
}

static_assertions::assert_impl_all!(DelegateTable: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DelegateException;

    struct Nothing;
    impl MenuDelegate for Nothing {}

    #[test]
    fn test_op_names_round_trip() {
        for op in DelegateOp::ALL {
            assert_eq!(DelegateOp::from_name(op.name()), Some(op));
        }
        assert_eq!(DelegateOp::from_name("isCommandIdenabled"), None);
        assert_eq!(DelegateOp::GetSubLabelForCommandId.to_string(), "getSubLabelForCommandId");
    }

    #[test]
    fn test_default_methods_unimplemented() {
        for op in DelegateOp::ALL {
            assert!(invoke(&Nothing, op, CommandId(1), EventFlags::NONE).is_none());
        }
    }

    #[test]
    fn test_table_dispatch() {
        let table = DelegateTable::new()
            .with(DelegateOp::IsCommandIdEnabled, |id| Ok((id.get() != 7).into()));

        let answer = invoke(&table, DelegateOp::IsCommandIdEnabled, CommandId(7), EventFlags::NONE);
        assert_eq!(answer, Some(Ok(DelegateValue::Bool(false))));
        assert!(invoke(&table, DelegateOp::IsCommandIdVisible, CommandId(7), EventFlags::NONE).is_none());
    }

    #[test]
    fn test_table_named_registration() {
        let table = DelegateTable::new()
            .with_named("executeCommand", |_| Err(DelegateException::new("boom")))
            .unwrap();
        assert!(table.implements(DelegateOp::ExecuteCommand));

        let err = DelegateTable::new().with_named("launchMissiles", |_| Ok(DelegateValue::Undefined));
        assert_eq!(err.unwrap_err(), UnknownOperation("launchMissiles".to_string()));
    }

    #[test]
    fn test_table_remove() {
        let mut table = DelegateTable::new();
        table.set(DelegateOp::MenuWillShow, |id| Ok(id.get().into()));
        assert_eq!(table.menu_will_show(), Some(Ok(DelegateValue::Integer(-1))));
        assert!(table.remove(DelegateOp::MenuWillShow));
        assert!(!table.remove(DelegateOp::MenuWillShow));
        assert!(table.menu_will_show().is_none());
    }

    #[test]
    fn test_table_debug_lists_operations() {
        let table = DelegateTable::new().with(DelegateOp::IsCommandIdChecked, |_| Ok(true.into()));
        assert!(format!("{table:?}").contains("isCommandIdChecked"));
    }
}
