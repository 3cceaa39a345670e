//! The menu model.
//!
//! A [`Menu`] is an ordered list of entries (items, separators, check and
//! radio items, submenus) whose state is decided by a delegate at query time.
//! The menu itself only stores structure and static text:
//!
//! - Structure: insert at any position, append, clear. Entries are never
//!   removed one by one.
//! - State: `is_checked_at`, `is_enabled_at`, `is_visible_at`, `label_at` and
//!   friends ask the delegate on every call.
//! - Submenus: inserting a menu as a submenu hands it to its new parent. A menu
//!   has at most one parent and can never contain itself.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dynamenu::{Menu, MenuDelegate};
//! use dynamenu_core::{DelegateOp, DelegateTable};
//!
//! let menu = Menu::new();
//! menu.add_item(1, "Open").unwrap();
//! menu.add_separator().unwrap();
//! menu.add_check_item(2, "Word Wrap").unwrap();
//!
//! // Without a delegate everything falls back to defaults.
//! assert!(menu.is_enabled_at(0).unwrap());
//! assert!(!menu.is_checked_at(2).unwrap());
//!
//! let delegate = DelegateTable::new()
//!     .with(DelegateOp::IsCommandIdChecked, |id| Ok((id.get() == 2).into()));
//! menu.set_delegate(Some(Arc::new(delegate) as Arc<dyn MenuDelegate>));
//! assert!(menu.is_checked_at(2).unwrap());
//! ```
//!
//! # Handles
//!
//! `Menu` is a counted handle into the global registry. Cloning it adds a
//! handle; dropping the last handle of a top-level menu destroys it and its
//! unheld submenus. Use [`WeakMenu`] to refer back to a menu from its own
//! delegate without keeping it alive.

use std::fmt;
use std::sync::Arc;

use dynamenu_core::logging::targets;
use dynamenu_core::{CommandId, DelegateBridge, EventFlags, MenuDelegate, TreeFormatOptions};

use crate::accelerator::Accelerator;
use crate::debug::MenuTreeDebug;
use crate::dispatcher::{CommandDispatcher, DelegateDispatcher};
use crate::error::{MenuError, MenuResult};
use crate::registry::{global_registry, MenuEntry, MenuId, MenuItemKind};
use crate::resolve::{self, ResolvedMenu};
use crate::surface::MenuSurface;

// ============================================================================
// Menu
// ============================================================================

/// A handle to a menu model.
pub struct Menu {
    id: MenuId,
}

impl Menu {
    /// Create an empty top-level menu using the shared bridge.
    pub fn new() -> Self {
        Self::with_bridge(DelegateBridge::shared())
    }

    /// Create an empty top-level menu whose delegate calls go through `bridge`.
    pub fn with_bridge(bridge: Arc<DelegateBridge>) -> Self {
        Self {
            id: global_registry().create(bridge),
        }
    }

    /// Get a new handle to a live menu.
    pub fn from_id(id: MenuId) -> Option<Menu> {
        global_registry().retain(id).then(|| Menu { id })
    }

    /// The menu's registry id.
    pub fn id(&self) -> MenuId {
        self.id
    }

    /// A handle that does not keep the menu alive.
    pub fn downgrade(&self) -> WeakMenu {
        WeakMenu { id: self.id }
    }

    /// The menu owning this one as a submenu.
    pub fn parent(&self) -> Option<MenuId> {
        global_registry().read(|r| r.parent(self.id)).ok().flatten()
    }

    /// Whether this menu has no parent.
    pub fn is_top_level(&self) -> bool {
        self.parent().is_none()
    }

    // =========================================================================
    // Delegate
    // =========================================================================

    /// Attach, replace or detach the delegate.
    pub fn set_delegate(&self, delegate: Option<Arc<dyn MenuDelegate>>) {
        if let Err(err) = global_registry().set_delegate(self.id, delegate) {
            tracing::debug!(target: targets::MENU, id = ?self.id, %err, "set_delegate on missing menu");
        }
    }

    /// Whether a delegate is attached.
    pub fn has_delegate(&self) -> bool {
        global_registry()
            .read(|r| r.has_delegate(self.id))
            .unwrap_or(false)
    }

    /// The bridge this menu's delegate calls go through.
    pub fn bridge(&self) -> Arc<DelegateBridge> {
        global_registry()
            .read(|r| r.bridge(self.id))
            .unwrap_or_else(|_| DelegateBridge::shared())
    }

    /// A dispatcher bound to the current delegate.
    ///
    /// Replacing the delegate later does not affect the returned dispatcher.
    pub fn dispatcher(&self) -> DelegateDispatcher {
        match global_registry().dispatch_target(self.id) {
            Ok(target) => DelegateDispatcher::new(target.bridge, target.delegate),
            Err(_) => DelegateDispatcher::new(DelegateBridge::shared(), None),
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Insert a normal item at `index`.
    pub fn insert_item_at(
        &self,
        index: usize,
        command_id: impl Into<CommandId>,
        label: impl Into<String>,
    ) -> MenuResult<()> {
        global_registry().insert_entry(self.id, index, MenuEntry::item(command_id.into(), label))
    }

    /// Insert a separator at `index`.
    pub fn insert_separator_at(&self, index: usize) -> MenuResult<()> {
        global_registry().insert_entry(self.id, index, MenuEntry::separator())
    }

    /// Insert a check item at `index`.
    pub fn insert_check_item_at(
        &self,
        index: usize,
        command_id: impl Into<CommandId>,
        label: impl Into<String>,
    ) -> MenuResult<()> {
        global_registry().insert_entry(self.id, index, MenuEntry::check(command_id.into(), label))
    }

    /// Insert a radio item belonging to `group_id` at `index`.
    pub fn insert_radio_item_at(
        &self,
        index: usize,
        command_id: impl Into<CommandId>,
        label: impl Into<String>,
        group_id: i32,
    ) -> MenuResult<()> {
        global_registry().insert_entry(
            self.id,
            index,
            MenuEntry::radio(command_id.into(), label, group_id),
        )
    }

    /// Insert `submenu` at `index`, making this menu its owner.
    ///
    /// Fails if `submenu` already has a parent, or if it is this menu or one
    /// of its ancestors.
    pub fn insert_sub_menu_at(
        &self,
        index: usize,
        command_id: impl Into<CommandId>,
        label: impl Into<String>,
        submenu: &Menu,
    ) -> MenuResult<()> {
        global_registry().insert_submenu(self.id, index, command_id.into(), label.into(), submenu.id)
    }

    /// Append a normal item, returning its index.
    pub fn add_item(&self, command_id: impl Into<CommandId>, label: impl Into<String>) -> MenuResult<usize> {
        global_registry().append_entry(self.id, MenuEntry::item(command_id.into(), label))
    }

    /// Append a separator, returning its index.
    pub fn add_separator(&self) -> MenuResult<usize> {
        global_registry().append_entry(self.id, MenuEntry::separator())
    }

    /// Append a check item, returning its index.
    pub fn add_check_item(
        &self,
        command_id: impl Into<CommandId>,
        label: impl Into<String>,
    ) -> MenuResult<usize> {
        global_registry().append_entry(self.id, MenuEntry::check(command_id.into(), label))
    }

    /// Append a radio item, returning its index.
    pub fn add_radio_item(
        &self,
        command_id: impl Into<CommandId>,
        label: impl Into<String>,
        group_id: i32,
    ) -> MenuResult<usize> {
        global_registry().append_entry(self.id, MenuEntry::radio(command_id.into(), label, group_id))
    }

    /// Append a submenu, returning its index.
    pub fn add_sub_menu(
        &self,
        command_id: impl Into<CommandId>,
        label: impl Into<String>,
        submenu: &Menu,
    ) -> MenuResult<usize> {
        global_registry().append_submenu(self.id, command_id.into(), label.into(), submenu.id)
    }

    /// Set the static sublabel of the entry at `index`.
    pub fn set_sublabel(&self, index: usize, sublabel: impl Into<String>) -> MenuResult<()> {
        global_registry().set_sublabel(self.id, index, sublabel.into())
    }

    /// Remove every entry.
    ///
    /// Submenus are detached. Those still held by a handle become top-level
    /// menus; the rest are destroyed.
    pub fn clear(&self) -> MenuResult<()> {
        global_registry().clear(self.id)
    }

    // =========================================================================
    // Stored data
    // =========================================================================

    /// Number of entries.
    pub fn item_count(&self) -> usize {
        global_registry()
            .read(|r| r.item_count(self.id))
            .unwrap_or(0)
    }

    /// Whether the menu has no entries.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// A copy of the entry at `index`.
    pub fn entry_at(&self, index: usize) -> MenuResult<MenuEntry> {
        global_registry().read(|r| r.entry(self.id, index))
    }

    /// A copy of every entry.
    pub fn entries(&self) -> Vec<MenuEntry> {
        global_registry()
            .read(|r| r.entries(self.id))
            .unwrap_or_default()
    }

    /// The command id at `index`.
    pub fn command_id_at(&self, index: usize) -> MenuResult<CommandId> {
        self.entry_at(index).map(|e| e.command_id)
    }

    /// The entry kind at `index`.
    pub fn kind_at(&self, index: usize) -> MenuResult<MenuItemKind> {
        self.entry_at(index).map(|e| e.kind)
    }

    /// The radio group at `index`, for radio entries.
    pub fn group_id_at(&self, index: usize) -> MenuResult<Option<i32>> {
        self.entry_at(index).map(|e| e.group_id)
    }

    /// A handle to the submenu at `index`, for submenu entries.
    pub fn submenu_at(&self, index: usize) -> MenuResult<Option<Menu>> {
        Ok(self.entry_at(index)?.submenu.and_then(Menu::from_id))
    }

    /// Position of `command_id`. Separators never match.
    pub fn index_of_command_id(&self, command_id: impl Into<CommandId>) -> Option<usize> {
        let command_id = command_id.into();
        global_registry()
            .read(|r| r.index_of_command_id(self.id, command_id))
            .ok()
            .flatten()
    }

    // =========================================================================
    // Live state
    // =========================================================================

    /// Whether the entry at `index` is checked. Only check and radio entries
    /// can be.
    pub fn is_checked_at(&self, index: usize) -> MenuResult<bool> {
        let entry = self.entry_at(index)?;
        Ok(resolve::checked(&self.dispatcher(), &entry))
    }

    /// Whether the entry at `index` is enabled.
    pub fn is_enabled_at(&self, index: usize) -> MenuResult<bool> {
        let entry = self.entry_at(index)?;
        Ok(resolve::enabled(&self.dispatcher(), &entry))
    }

    /// Whether the entry at `index` is visible.
    pub fn is_visible_at(&self, index: usize) -> MenuResult<bool> {
        let entry = self.entry_at(index)?;
        Ok(resolve::visible(&self.dispatcher(), &entry))
    }

    /// Whether the entry at `index` takes its text from the delegate.
    pub fn is_item_dynamic_at(&self, index: usize) -> MenuResult<bool> {
        let entry = self.entry_at(index)?;
        Ok(resolve::dynamic(&self.dispatcher(), &entry))
    }

    /// The effective label at `index`.
    pub fn label_at(&self, index: usize) -> MenuResult<String> {
        let entry = self.entry_at(index)?;
        Ok(resolve::label(&self.dispatcher(), &entry))
    }

    /// The effective sublabel at `index`.
    pub fn sublabel_at(&self, index: usize) -> MenuResult<String> {
        let entry = self.entry_at(index)?;
        Ok(resolve::sublabel(&self.dispatcher(), &entry))
    }

    /// The accelerator at `index`.
    pub fn accelerator_at(&self, index: usize) -> MenuResult<Option<Accelerator>> {
        let entry = self.entry_at(index)?;
        Ok(resolve::accelerator(&self.dispatcher(), &entry))
    }

    // =========================================================================
    // Execution and presentation
    // =========================================================================

    /// Execute the command at `index`. Returns whether the delegate ran it.
    pub fn activate_at(&self, index: usize, event_flags: EventFlags) -> MenuResult<bool> {
        let entry = self.entry_at(index)?;
        if matches!(entry.kind, MenuItemKind::Separator | MenuItemKind::Submenu) {
            return Err(MenuError::NotActivatable { index });
        }
        tracing::debug!(target: targets::MENU, id = ?self.id, index, command_id = entry.command_id.get(), "activating item");
        Ok(self.dispatcher().execute_command(entry.command_id, event_flags))
    }

    /// Notify the delegate that the menu is about to be shown.
    pub fn menu_will_show(&self) {
        self.dispatcher().menu_will_show();
    }

    /// Resolve the whole tree into a snapshot.
    pub fn resolve(&self) -> MenuResult<ResolvedMenu> {
        resolve::resolve_tree(global_registry(), self.id)
    }

    /// Hand this menu to a host surface.
    ///
    /// Only top-level menus can be attached.
    pub fn attach_to_surface(&self, surface: &mut dyn MenuSurface) -> MenuResult<()> {
        if !self.is_top_level() {
            return Err(MenuError::NotTopLevel);
        }
        let resolved = self.resolve()?;
        surface.attach(&resolved)?;
        tracing::debug!(target: targets::MENU, id = ?self.id, items = resolved.len(), "attached to surface");
        Ok(())
    }

    /// Render the tree for diagnostics.
    pub fn dump_tree(&self, options: TreeFormatOptions) -> MenuResult<String> {
        MenuTreeDebug::with_options(options).format(self)
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Menu {
    fn clone(&self) -> Self {
        global_registry().retain(self.id);
        Self { id: self.id }
    }
}

impl Drop for Menu {
    fn drop(&mut self) {
        global_registry().release(self.id);
    }
}

impl PartialEq for Menu {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Menu {}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Menu")
            .field("id", &self.id)
            .field("item_count", &self.item_count())
            .finish()
    }
}

impl CommandDispatcher for Menu {
    fn is_command_id_checked(&self, command_id: CommandId) -> bool {
        self.dispatcher().is_command_id_checked(command_id)
    }

    fn is_command_id_enabled(&self, command_id: CommandId) -> bool {
        self.dispatcher().is_command_id_enabled(command_id)
    }

    fn is_command_id_visible(&self, command_id: CommandId) -> bool {
        self.dispatcher().is_command_id_visible(command_id)
    }

    fn is_item_for_command_id_dynamic(&self, command_id: CommandId) -> bool {
        self.dispatcher().is_item_for_command_id_dynamic(command_id)
    }

    fn label_for_command_id(&self, command_id: CommandId) -> String {
        self.dispatcher().label_for_command_id(command_id)
    }

    fn sublabel_for_command_id(&self, command_id: CommandId) -> String {
        self.dispatcher().sublabel_for_command_id(command_id)
    }

    fn accelerator_for_command_id(&self, command_id: CommandId) -> Option<Accelerator> {
        self.dispatcher().accelerator_for_command_id(command_id)
    }

    fn execute_command(&self, command_id: CommandId, event_flags: EventFlags) -> bool {
        self.dispatcher().execute_command(command_id, event_flags)
    }
}

// ============================================================================
// WeakMenu
// ============================================================================

/// A non-owning reference to a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeakMenu {
    id: MenuId,
}

impl WeakMenu {
    /// A handle to the menu, if it still exists.
    pub fn upgrade(&self) -> Option<Menu> {
        Menu::from_id(self.id)
    }

    /// The id of the referenced menu.
    pub fn id(&self) -> MenuId {
        self.id
    }
}

static_assertions::assert_impl_all!(Menu: Send, Sync);
static_assertions::assert_impl_all!(WeakMenu: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use dynamenu_core::{DelegateContext, DelegateOp, DelegateTable, DelegateValue};

    fn private_menu() -> Menu {
        Menu::with_bridge(Arc::new(DelegateBridge::new(Arc::new(DelegateContext::new("test")))))
    }

    fn table(table: DelegateTable) -> Option<Arc<dyn MenuDelegate>> {
        Some(Arc::new(table))
    }

    // =========================================================================
    // Structure
    // =========================================================================

    #[test]
    fn test_menu_new() {
        let menu = Menu::new();
        assert_eq!(menu.item_count(), 0);
        assert!(menu.is_empty());
        assert!(menu.is_top_level());
        assert!(!menu.has_delegate());
    }

    #[test]
    fn test_menu_add_items() {
        let menu = private_menu();
        assert_eq!(menu.add_item(1, "Open").unwrap(), 0);
        assert_eq!(menu.add_separator().unwrap(), 1);
        assert_eq!(menu.add_check_item(2, "Wrap").unwrap(), 2);
        assert_eq!(menu.add_radio_item(3, "Small", 7).unwrap(), 3);

        assert_eq!(menu.item_count(), 4);
        assert_eq!(menu.kind_at(1).unwrap(), MenuItemKind::Separator);
        assert_eq!(menu.command_id_at(1).unwrap(), CommandId::SEPARATOR);
        assert_eq!(menu.group_id_at(3).unwrap(), Some(7));
        assert_eq!(menu.group_id_at(2).unwrap(), None);
    }

    #[test]
    fn test_menu_insert_shifts() {
        let menu = private_menu();
        menu.add_item(1, "A").unwrap();
        menu.add_item(2, "B").unwrap();
        menu.insert_item_at(1, 3, "C").unwrap();
        menu.insert_separator_at(0).unwrap();

        let labels: Vec<_> = menu.entries().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["", "A", "C", "B"]);
        assert_eq!(menu.index_of_command_id(2), Some(3));
    }

    #[test]
    fn test_menu_insert_out_of_bounds() {
        let menu = private_menu();
        let err = menu.insert_check_item_at(1, 1, "X").unwrap_err();
        assert!(matches!(err, MenuError::InvalidInsertIndex { index: 1, count: 0 }));
        assert_eq!(menu.item_count(), 0);
    }

    #[test]
    fn test_menu_index_out_of_range() {
        let menu = private_menu();
        menu.add_item(1, "A").unwrap();
        for result in [
            menu.is_checked_at(1).map(|_| ()),
            menu.is_enabled_at(1).map(|_| ()),
            menu.label_at(1).map(|_| ()),
            menu.command_id_at(1).map(|_| ()),
        ] {
            assert!(matches!(result, Err(MenuError::IndexOutOfRange { index: 1, count: 1 })));
        }
    }

    #[test]
    fn test_menu_submenu() {
        let menu = private_menu();
        let sub = private_menu();
        sub.add_item(10, "Inner").unwrap();
        menu.add_sub_menu(5, "More", &sub).unwrap();

        assert_eq!(sub.parent(), Some(menu.id()));
        let handle = menu.submenu_at(0).unwrap().unwrap();
        assert_eq!(handle, sub);
        assert_eq!(handle.label_at(0).unwrap(), "Inner");
        assert!(menu.submenu_at(0).is_ok());
    }

    #[test]
    fn test_menu_clear() {
        let menu = private_menu();
        let sub = private_menu();
        menu.add_item(1, "A").unwrap();
        menu.add_sub_menu(2, "Sub", &sub).unwrap();

        menu.clear().unwrap();
        assert_eq!(menu.item_count(), 0);
        assert!(sub.is_top_level());
    }

    #[test]
    fn test_weak_menu() {
        let menu = private_menu();
        let weak = menu.downgrade();
        assert_eq!(weak.upgrade().as_ref(), Some(&menu));
        drop(menu);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_clone_shares_model() {
        let menu = private_menu();
        let other = menu.clone();
        other.add_item(1, "Shared").unwrap();
        drop(other);
        assert_eq!(menu.label_at(0).unwrap(), "Shared");
    }

    // =========================================================================
    // Live state
    // =========================================================================

    #[test]
    fn test_sublabel_static_and_separator() {
        let menu = private_menu();
        menu.add_item(1, "Open").unwrap();
        menu.add_separator().unwrap();
        menu.set_sublabel(0, "Recent files").unwrap();
        assert_eq!(menu.sublabel_at(0).unwrap(), "Recent files");
        assert!(matches!(
            menu.set_sublabel(1, "x"),
            Err(MenuError::SeparatorHasNoText { index: 1 })
        ));
    }

    #[test]
    fn test_checked_state_is_live() {
        let menu = private_menu();
        menu.add_check_item(1, "Wrap").unwrap();
        menu.add_item(2, "Plain").unwrap();
        menu.set_delegate(table(
            DelegateTable::new().with(DelegateOp::IsCommandIdChecked, |_| Ok(true.into())),
        ));
        assert!(menu.is_checked_at(0).unwrap());
        assert!(!menu.is_checked_at(1).unwrap());

        menu.set_delegate(table(
            DelegateTable::new().with(DelegateOp::IsCommandIdChecked, |_| Ok(false.into())),
        ));
        assert!(!menu.is_checked_at(0).unwrap());

        menu.set_delegate(None);
        assert!(!menu.is_checked_at(0).unwrap());
    }

    #[test]
    fn test_dynamic_label() {
        let menu = private_menu();
        menu.add_item(1, "Undo").unwrap();
        menu.add_item(2, "Static").unwrap();
        menu.set_delegate(table(
            DelegateTable::new()
                .with(DelegateOp::IsItemForCommandIdDynamic, |id| Ok((id.get() == 1).into()))
                .with(DelegateOp::GetLabelForCommandId, |_| Ok("Undo Typing".into()))
                .with(DelegateOp::GetSubLabelForCommandId, |_| Ok(DelegateValue::Null)),
        ));
        assert!(menu.is_item_dynamic_at(0).unwrap());
        assert_eq!(menu.label_at(0).unwrap(), "Undo Typing");
        assert_eq!(menu.sublabel_at(0).unwrap(), "");
        assert_eq!(menu.label_at(1).unwrap(), "Static");
    }

    #[test]
    fn test_activate() {
        let menu = private_menu();
        menu.add_item(1, "Run").unwrap();
        menu.add_separator().unwrap();
        let sub = private_menu();
        menu.add_sub_menu(2, "Sub", &sub).unwrap();

        // No delegate: nothing runs.
        assert!(!menu.activate_at(0, EventFlags::NONE).unwrap());

        menu.set_delegate(table(
            DelegateTable::new().with(DelegateOp::ExecuteCommand, |_| Ok(DelegateValue::Undefined)),
        ));
        assert!(menu.activate_at(0, EventFlags(4)).unwrap());
        assert!(matches!(
            menu.activate_at(1, EventFlags::NONE),
            Err(MenuError::NotActivatable { index: 1 })
        ));
        assert!(matches!(
            menu.activate_at(2, EventFlags::NONE),
            Err(MenuError::NotActivatable { index: 2 })
        ));
    }

    #[test]
    fn test_menu_as_dispatcher() {
        let menu = private_menu();
        menu.set_delegate(table(
            DelegateTable::new().with(DelegateOp::GetAcceleratorForCommandId, |_| Ok("Shift+F5".into())),
        ));
        // Ids are not validated against the entries.
        let accel = menu.accelerator_for_command_id(CommandId(99)).unwrap();
        assert_eq!(accel.to_string(), "Shift+F5");
        assert!(menu.is_command_id_enabled(CommandId(99)));
    }
}
