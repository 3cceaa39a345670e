//! Effective entry state and resolved snapshots.
//!
//! The functions here turn a stored [`MenuEntry`] into what a renderer shows,
//! by asking a [`CommandDispatcher`]:
//!
//! - Only check and radio entries have a checked state; everything else is
//!   unchecked without asking.
//! - Separators are enabled and visible without asking, have no accelerator,
//!   and are never dynamic.
//! - A dynamic entry shows the delegate's label and sublabel instead of its
//!   static text.
//!
//! [`ResolvedMenu`] applies these rules to a whole tree at once.

use dynamenu_core::logging::{span_names, targets};
use dynamenu_core::{CommandId, PerfSpan};

use crate::accelerator::Accelerator;
use crate::dispatcher::{CommandDispatcher, DelegateDispatcher};
use crate::error::{MenuError, MenuResult};
use crate::registry::{MenuEntry, MenuId, MenuItemKind, SharedMenuRegistry};

pub(crate) fn checked(dispatcher: &impl CommandDispatcher, entry: &MenuEntry) -> bool {
    entry.kind.is_checkable() && dispatcher.is_command_id_checked(entry.command_id)
}

pub(crate) fn enabled(dispatcher: &impl CommandDispatcher, entry: &MenuEntry) -> bool {
    entry.is_separator() || dispatcher.is_command_id_enabled(entry.command_id)
}

pub(crate) fn visible(dispatcher: &impl CommandDispatcher, entry: &MenuEntry) -> bool {
    entry.is_separator() || dispatcher.is_command_id_visible(entry.command_id)
}

pub(crate) fn dynamic(dispatcher: &impl CommandDispatcher, entry: &MenuEntry) -> bool {
    !entry.is_separator() && dispatcher.is_item_for_command_id_dynamic(entry.command_id)
}

pub(crate) fn label(dispatcher: &impl CommandDispatcher, entry: &MenuEntry) -> String {
    if dynamic(dispatcher, entry) {
        dispatcher.label_for_command_id(entry.command_id)
    } else {
        entry.label.clone()
    }
}

pub(crate) fn sublabel(dispatcher: &impl CommandDispatcher, entry: &MenuEntry) -> String {
    if dynamic(dispatcher, entry) {
        dispatcher.sublabel_for_command_id(entry.command_id)
    } else {
        entry.sublabel.clone()
    }
}

pub(crate) fn accelerator(dispatcher: &impl CommandDispatcher, entry: &MenuEntry) -> Option<Accelerator> {
    if entry.is_separator() {
        return None;
    }
    dispatcher.accelerator_for_command_id(entry.command_id)
}

/// One entry with its state resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedItem {
    /// Position in the owning menu.
    pub index: usize,
    /// The command id.
    pub command_id: CommandId,
    /// The entry kind.
    pub kind: MenuItemKind,
    /// Effective label.
    pub label: String,
    /// Effective sublabel.
    pub sublabel: String,
    /// Radio group, for radio entries.
    pub group_id: Option<i32>,
    /// Checked state.
    pub checked: bool,
    /// Enabled state.
    pub enabled: bool,
    /// Visible state.
    pub visible: bool,
    /// Keyboard accelerator.
    pub accelerator: Option<Accelerator>,
    /// The resolved child menu, for submenu entries whose child still exists.
    pub submenu: Option<ResolvedMenu>,
}

impl ResolvedItem {
    /// Whether this entry is a separator.
    pub fn is_separator(&self) -> bool {
        self.kind == MenuItemKind::Separator
    }
}

/// A menu tree with every entry's state resolved at one point in time.
///
/// The snapshot does not change when the menu or the delegate does; resolve
/// again to see new state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMenu {
    /// The menu this snapshot was taken from.
    pub id: MenuId,
    /// The entries, in menu order.
    pub items: Vec<ResolvedItem>,
}

impl ResolvedMenu {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the menu has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries that are visible.
    pub fn visible_items(&self) -> impl Iterator<Item = &ResolvedItem> {
        self.items.iter().filter(|item| item.visible)
    }

    /// The first non-separator entry with `command_id` in this menu.
    pub fn find(&self, command_id: CommandId) -> Option<&ResolvedItem> {
        self.items
            .iter()
            .find(|item| !item.is_separator() && item.command_id == command_id)
    }

    /// Follow a path of submenu positions from this menu.
    pub fn submenu_at_path(&self, path: &[usize]) -> Option<&ResolvedMenu> {
        path.iter().try_fold(self, |menu, &index| {
            menu.items.get(index).and_then(|item| item.submenu.as_ref())
        })
    }
}

/// Resolve the tree rooted at `id`.
pub(crate) fn resolve_tree(registry: &SharedMenuRegistry, id: MenuId) -> MenuResult<ResolvedMenu> {
    let _perf = PerfSpan::new(span_names::RESOLVE);
    resolve_menu(registry, id)
}

fn resolve_menu(registry: &SharedMenuRegistry, id: MenuId) -> MenuResult<ResolvedMenu> {
    // Work from a copy; the delegate may change the menu while we ask it.
    let entries = registry.read(|r| r.entries(id))?;
    let target = registry.dispatch_target(id)?;
    let dispatcher = DelegateDispatcher::new(target.bridge, target.delegate);

    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let submenu = match entry.submenu {
            Some(child) => match resolve_menu(registry, child) {
                Ok(menu) => Some(menu),
                Err(MenuError::MenuDestroyed) => {
                    tracing::trace!(target: targets::MENU, ?child, "submenu vanished during resolve");
                    None
                }
                Err(err) => return Err(err),
            },
            None => None,
        };

        items.push(ResolvedItem {
            index,
            command_id: entry.command_id,
            kind: entry.kind,
            label: label(&dispatcher, entry),
            sublabel: sublabel(&dispatcher, entry),
            group_id: entry.group_id,
            checked: checked(&dispatcher, entry),
            enabled: enabled(&dispatcher, entry),
            visible: visible(&dispatcher, entry),
            accelerator: accelerator(&dispatcher, entry),
            submenu,
        });
    }

    Ok(ResolvedMenu { id, items })
}
