//! Command state queries and execution.
//!
//! [`CommandDispatcher`] is what a renderer talks to: given a command id it
//! answers the checked, enabled, visible and dynamic flags, the dynamic label
//! and sublabel, the accelerator, and executes the command. Every answer is
//! live; nothing is cached between calls.
//!
//! [`DelegateDispatcher`] implements it on top of a [`DelegateBridge`]:
//!
//! | Query | Default |
//! |---|---|
//! | checked | `false` |
//! | enabled | `true` |
//! | visible | `true` |
//! | dynamic | `false` |
//! | label / sublabel | `""` |
//! | accelerator | `None` |
//!
//! Boolean answers use the truthiness of the delegate's value. Label answers
//! must be text, and accelerator answers must be text that parses; anything
//! else falls back to the default.

use std::fmt;
use std::sync::Arc;

use dynamenu_core::logging::targets;
use dynamenu_core::{CallOutcome, CommandId, DelegateBridge, DelegateOp, DelegateValue, EventFlags, MenuDelegate};

use crate::accelerator::{self, Accelerator, Platform};

/// Answers state queries for command ids and executes commands.
///
/// Ids are never validated: any id may be asked about, and unknown ids get
/// whatever the delegate answers.
pub trait CommandDispatcher {
    /// Whether the command is checked.
    fn is_command_id_checked(&self, command_id: CommandId) -> bool;

    /// Whether the command is enabled.
    fn is_command_id_enabled(&self, command_id: CommandId) -> bool;

    /// Whether the command is visible.
    fn is_command_id_visible(&self, command_id: CommandId) -> bool;

    /// Whether the command's label and sublabel come from the delegate.
    fn is_item_for_command_id_dynamic(&self, command_id: CommandId) -> bool;

    /// The delegate's label for the command.
    fn label_for_command_id(&self, command_id: CommandId) -> String;

    /// The delegate's sublabel for the command.
    fn sublabel_for_command_id(&self, command_id: CommandId) -> String;

    /// The command's accelerator.
    fn accelerator_for_command_id(&self, command_id: CommandId) -> Option<Accelerator>;

    /// Execute the command. Returns whether the delegate ran it.
    fn execute_command(&self, command_id: CommandId, event_flags: EventFlags) -> bool;
}

/// A [`CommandDispatcher`] that forwards to a delegate through a bridge.
#[derive(Clone)]
pub struct DelegateDispatcher {
    bridge: Arc<DelegateBridge>,
    delegate: Option<Arc<dyn MenuDelegate>>,
    platform: Platform,
}

impl DelegateDispatcher {
    /// Create a dispatcher for `delegate`, which may be absent.
    pub fn new(bridge: Arc<DelegateBridge>, delegate: Option<Arc<dyn MenuDelegate>>) -> Self {
        Self {
            bridge,
            delegate,
            platform: Platform::current(),
        }
    }

    /// Parse accelerator answers with the conventions of `platform`.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// The bridge calls go through.
    pub fn bridge(&self) -> &Arc<DelegateBridge> {
        &self.bridge
    }

    /// Whether a delegate is attached.
    pub fn has_delegate(&self) -> bool {
        self.delegate.is_some()
    }

    /// Tell the delegate its menu is about to be shown.
    pub fn menu_will_show(&self) {
        self.bridge.notify_will_show(self.delegate.as_deref());
    }

    fn query(&self, op: DelegateOp, command_id: CommandId) -> CallOutcome {
        self.bridge.call(self.delegate.as_deref(), op, command_id)
    }

    fn query_flag(&self, op: DelegateOp, command_id: CommandId, default: bool) -> bool {
        match self.query(op, command_id) {
            CallOutcome::Answered(value) => value.is_truthy(),
            CallOutcome::Unavailable(_) | CallOutcome::Failed(_) => default,
        }
    }

    fn query_text(&self, op: DelegateOp, command_id: CommandId) -> String {
        match self.query(op, command_id) {
            CallOutcome::Answered(DelegateValue::Text(text)) => text,
            CallOutcome::Answered(other) => {
                tracing::debug!(
                    target: targets::BRIDGE,
                    operation = op.name(),
                    command_id = command_id.get(),
                    answer = other.type_name(),
                    "non-text label answer ignored"
                );
                String::new()
            }
            CallOutcome::Unavailable(_) | CallOutcome::Failed(_) => String::new(),
        }
    }
}

impl CommandDispatcher for DelegateDispatcher {
    fn is_command_id_checked(&self, command_id: CommandId) -> bool {
        self.query_flag(DelegateOp::IsCommandIdChecked, command_id, false)
    }

    fn is_command_id_enabled(&self, command_id: CommandId) -> bool {
        self.query_flag(DelegateOp::IsCommandIdEnabled, command_id, true)
    }

    fn is_command_id_visible(&self, command_id: CommandId) -> bool {
        self.query_flag(DelegateOp::IsCommandIdVisible, command_id, true)
    }

    fn is_item_for_command_id_dynamic(&self, command_id: CommandId) -> bool {
        self.query_flag(DelegateOp::IsItemForCommandIdDynamic, command_id, false)
    }

    fn label_for_command_id(&self, command_id: CommandId) -> String {
        self.query_text(DelegateOp::GetLabelForCommandId, command_id)
    }

    fn sublabel_for_command_id(&self, command_id: CommandId) -> String {
        self.query_text(DelegateOp::GetSubLabelForCommandId, command_id)
    }

    fn accelerator_for_command_id(&self, command_id: CommandId) -> Option<Accelerator> {
        let CallOutcome::Answered(value) = self.query(DelegateOp::GetAcceleratorForCommandId, command_id)
        else {
            return None;
        };
        let text = value.as_text()?;
        match accelerator::parse_for(text, self.platform) {
            Ok(accel) => Some(accel),
            Err(err) => {
                tracing::debug!(
                    target: targets::BRIDGE,
                    command_id = command_id.get(),
                    text,
                    %err,
                    "accelerator answer rejected"
                );
                None
            }
        }
    }

    fn execute_command(&self, command_id: CommandId, event_flags: EventFlags) -> bool {
        self.bridge
            .execute(self.delegate.as_deref(), command_id, event_flags)
            .is_answered()
    }
}

impl fmt::Debug for DelegateDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateDispatcher")
            .field("has_delegate", &self.delegate.is_some())
            .field("platform", &self.platform)
            .finish()
    }
}

static_assertions::assert_impl_all!(DelegateDispatcher: Send, Sync);
