//! Arena storage for menu models.
//!
//! Every menu lives in a [`MenuRegistry`] keyed by [`MenuId`]. The registry
//! owns the structure of the menu tree: the entries of each menu, the
//! parent back-reference of each submenu, and the number of [`Menu`] handles
//! keeping a menu alive.
//!
//! # Ownership
//!
//! A menu stays in the registry while it has a parent or at least one handle.
//! When neither holds, it is destroyed together with every submenu that is not
//! itself held by a handle. Held submenus are detached instead and become
//! top-level menus.
//!
//! # Locking
//!
//! [`SharedMenuRegistry`] wraps the registry in a `RwLock`. The lock is held
//! for single structural operations only, never across a delegate call.
//! Operations that remove menus return the removed nodes so that their
//! delegates are dropped after the lock has been released; a delegate's
//! destructor may then drop menu handles of its own.
//!
//! [`Menu`]: crate::Menu

use std::fmt;
use std::sync::{Arc, OnceLock};

use dynamenu_core::logging::targets;
use dynamenu_core::{CommandId, DelegateBridge, MenuDelegate};
use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::error::{MenuError, MenuResult};

new_key_type! {
    /// A unique identifier for a menu in the registry.
    ///
    /// Ids are never reused while the registry lives: a stale id simply no
    /// longer resolves.
    pub struct MenuId;
}

/// The kind of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItemKind {
    /// A plain command.
    Normal,
    /// A visual divider. Has no command and no text.
    Separator,
    /// A command with an independent checked state.
    Check,
    /// A command that is part of a radio group.
    Radio,
    /// An entry opening a nested menu.
    Submenu,
}

impl MenuItemKind {
    /// Lowercase name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Separator => "separator",
            Self::Check => "check",
            Self::Radio => "radio",
            Self::Submenu => "submenu",
        }
    }

    /// Whether the delegate decides the checked state of this kind.
    pub fn is_checkable(self) -> bool {
        matches!(self, Self::Check | Self::Radio)
    }
}

impl fmt::Display for MenuItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of a menu, as stored.
///
/// Labels are the static seed text; dynamic entries are relabelled by the
/// delegate at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// The command id. [`CommandId::SEPARATOR`] for separators.
    pub command_id: CommandId,
    /// The entry kind.
    pub kind: MenuItemKind,
    /// Static label.
    pub label: String,
    /// Static sublabel.
    pub sublabel: String,
    /// Radio group, for radio entries only.
    pub group_id: Option<i32>,
    /// The owned child menu, for submenu entries only.
    pub submenu: Option<MenuId>,
}

impl MenuEntry {
    /// A normal command entry.
    pub fn item(command_id: CommandId, label: impl Into<String>) -> Self {
        Self::with_kind(command_id, MenuItemKind::Normal, label.into())
    }

    /// A separator entry.
    pub fn separator() -> Self {
        Self::with_kind(CommandId::SEPARATOR, MenuItemKind::Separator, String::new())
    }

    /// A checkable entry.
    pub fn check(command_id: CommandId, label: impl Into<String>) -> Self {
        Self::with_kind(command_id, MenuItemKind::Check, label.into())
    }

    /// A radio entry in `group_id`.
    pub fn radio(command_id: CommandId, label: impl Into<String>, group_id: i32) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::with_kind(command_id, MenuItemKind::Radio, label.into())
        }
    }

    fn with_kind(command_id: CommandId, kind: MenuItemKind, label: String) -> Self {
        Self {
            command_id,
            kind,
            label,
            sublabel: String::new(),
            group_id: None,
            submenu: None,
        }
    }

    /// Whether this entry is a separator.
    pub fn is_separator(&self) -> bool {
        self.kind == MenuItemKind::Separator
    }
}

/// The stored state of one menu.
pub(crate) struct MenuNode {
    entries: Vec<MenuEntry>,
    parent: Option<MenuId>,
    handles: usize,
    delegate: Option<Arc<dyn MenuDelegate>>,
    bridge: Arc<DelegateBridge>,
}

impl MenuNode {
    fn new(bridge: Arc<DelegateBridge>) -> Self {
        Self {
            entries: Vec::new(),
            parent: None,
            handles: 1,
            delegate: None,
            bridge,
        }
    }
}

impl fmt::Debug for MenuNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuNode")
            .field("entries", &self.entries.len())
            .field("parent", &self.parent)
            .field("handles", &self.handles)
            .field("has_delegate", &self.delegate.is_some())
            .finish()
    }
}

/// Nodes removed from the registry, to be dropped once the lock is released.
pub(crate) type Garbage = Vec<MenuNode>;

/// The bridge and delegate a menu's queries go through.
#[derive(Clone)]
pub(crate) struct DispatchTarget {
    pub(crate) bridge: Arc<DelegateBridge>,
    pub(crate) delegate: Option<Arc<dyn MenuDelegate>>,
}

/// The central registry of menus.
///
/// Most code goes through [`global_registry`]; a standalone registry is
/// mainly useful in tests.
pub struct MenuRegistry {
    menus: SlotMap<MenuId, MenuNode>,
}

impl MenuRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            menus: SlotMap::with_key(),
        }
    }

    /// Create a top-level menu held by one handle.
    pub(crate) fn create(&mut self, bridge: Arc<DelegateBridge>) -> MenuId {
        let id = self.menus.insert(MenuNode::new(bridge));
        tracing::trace!(target: targets::REGISTRY, ?id, "created menu");
        id
    }

    fn node(&self, id: MenuId) -> MenuResult<&MenuNode> {
        self.menus.get(id).ok_or(MenuError::MenuDestroyed)
    }

    fn node_mut(&mut self, id: MenuId) -> MenuResult<&mut MenuNode> {
        self.menus.get_mut(id).ok_or(MenuError::MenuDestroyed)
    }

    /// Add a handle to a live menu. Returns `false` if it no longer exists.
    pub(crate) fn retain(&mut self, id: MenuId) -> bool {
        match self.menus.get_mut(id) {
            Some(node) => {
                node.handles += 1;
                true
            }
            None => false,
        }
    }

    /// Drop a handle, destroying the menu if nothing keeps it alive.
    pub(crate) fn release(&mut self, id: MenuId) -> Garbage {
        let Some(node) = self.menus.get_mut(id) else {
            return Vec::new();
        };
        node.handles = node.handles.saturating_sub(1);
        if node.handles == 0 && node.parent.is_none() {
            self.destroy(id)
        } else {
            Vec::new()
        }
    }

    /// Remove a menu and every unheld submenu below it.
    ///
    /// Submenus that still have handles are detached and become top-level.
    fn destroy(&mut self, id: MenuId) -> Garbage {
        let mut garbage = Vec::new();
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            let Some(node) = self.menus.remove(current) else {
                continue;
            };
            if let Some(parent) = node.parent {
                if let Some(parent_node) = self.menus.get_mut(parent) {
                    for entry in &mut parent_node.entries {
                        if entry.submenu == Some(current) {
                            entry.submenu = None;
                        }
                    }
                }
            }
            for child in node.entries.iter().filter_map(|e| e.submenu) {
                if let Some(child_node) = self.menus.get_mut(child) {
                    child_node.parent = None;
                    if child_node.handles == 0 {
                        pending.push(child);
                    } else {
                        tracing::trace!(target: targets::REGISTRY, ?child, "detached held submenu");
                    }
                }
            }
            garbage.push(node);
        }

        tracing::trace!(target: targets::REGISTRY, ?id, removed = garbage.len(), "destroyed menu tree");
        garbage
    }

    /// Check if a menu exists.
    pub fn contains(&self, id: MenuId) -> bool {
        self.menus.contains_key(id)
    }

    /// Number of live menus.
    pub fn menu_count(&self) -> usize {
        self.menus.len()
    }

    /// Number of handles keeping a menu alive.
    pub fn handle_count(&self, id: MenuId) -> MenuResult<usize> {
        self.node(id).map(|node| node.handles)
    }

    /// The menu owning `id` as a submenu, if any.
    pub fn parent(&self, id: MenuId) -> MenuResult<Option<MenuId>> {
        self.node(id).map(|node| node.parent)
    }

    /// Check if `potential_ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_of(&self, potential_ancestor: MenuId, id: MenuId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.menus.get(current_id).and_then(|node| node.parent);
        }
        false
    }

    /// Number of entries in a menu.
    pub fn item_count(&self, id: MenuId) -> MenuResult<usize> {
        self.node(id).map(|node| node.entries.len())
    }

    /// A copy of the entry at `index`.
    pub fn entry(&self, id: MenuId, index: usize) -> MenuResult<MenuEntry> {
        let node = self.node(id)?;
        node.entries
            .get(index)
            .cloned()
            .ok_or(MenuError::IndexOutOfRange {
                index,
                count: node.entries.len(),
            })
    }

    /// A copy of all entries.
    pub fn entries(&self, id: MenuId) -> MenuResult<Vec<MenuEntry>> {
        self.node(id).map(|node| node.entries.clone())
    }

    /// Position of the first non-separator entry with `command_id`.
    pub fn index_of_command_id(&self, id: MenuId, command_id: CommandId) -> MenuResult<Option<usize>> {
        let node = self.node(id)?;
        Ok(node
            .entries
            .iter()
            .position(|e| !e.is_separator() && e.command_id == command_id))
    }

    /// Insert a non-submenu entry at `index`.
    pub(crate) fn insert_entry(&mut self, id: MenuId, index: usize, entry: MenuEntry) -> MenuResult<()> {
        let node = self.node_mut(id)?;
        let count = node.entries.len();
        if index > count {
            return Err(MenuError::InvalidInsertIndex { index, count });
        }
        tracing::trace!(
            target: targets::MENU,
            ?id,
            index,
            command_id = entry.command_id.get(),
            kind = entry.kind.name(),
            "inserted item"
        );
        node.entries.insert(index, entry);
        Ok(())
    }

    /// Insert a submenu entry at `index`, transferring ownership of `child`.
    pub(crate) fn insert_submenu(
        &mut self,
        id: MenuId,
        index: usize,
        command_id: CommandId,
        label: String,
        child: MenuId,
    ) -> MenuResult<()> {
        if !self.contains(id) {
            return Err(MenuError::MenuDestroyed);
        }
        let child_parent = self.parent(child)?;
        if self.is_ancestor_of(child, id) {
            return Err(MenuError::CyclicSubmenu);
        }
        if child_parent.is_some() {
            return Err(MenuError::SubmenuAlreadyOwned);
        }

        let entry = MenuEntry {
            submenu: Some(child),
            ..MenuEntry::with_kind(command_id, MenuItemKind::Submenu, label)
        };
        self.insert_entry(id, index, entry)?;
        self.node_mut(child)?.parent = Some(id);
        Ok(())
    }

    /// Set the static sublabel of the entry at `index`.
    pub(crate) fn set_sublabel(&mut self, id: MenuId, index: usize, sublabel: String) -> MenuResult<()> {
        let node = self.node_mut(id)?;
        let count = node.entries.len();
        let entry = node
            .entries
            .get_mut(index)
            .ok_or(MenuError::IndexOutOfRange { index, count })?;
        if entry.is_separator() {
            return Err(MenuError::SeparatorHasNoText { index });
        }
        entry.sublabel = sublabel;
        Ok(())
    }

    /// Remove every entry. Unheld submenus are destroyed.
    pub(crate) fn clear(&mut self, id: MenuId) -> MenuResult<Garbage> {
        let entries = std::mem::take(&mut self.node_mut(id)?.entries);
        tracing::trace!(target: targets::MENU, ?id, removed = entries.len(), "cleared menu");

        let mut garbage = Vec::new();
        for child in entries.iter().filter_map(|e| e.submenu) {
            let Some(child_node) = self.menus.get_mut(child) else {
                continue;
            };
            child_node.parent = None;
            if child_node.handles == 0 {
                garbage.extend(self.destroy(child));
            }
        }
        Ok(garbage)
    }

    /// Replace the delegate, returning the previous one.
    pub(crate) fn set_delegate(
        &mut self,
        id: MenuId,
        delegate: Option<Arc<dyn MenuDelegate>>,
    ) -> MenuResult<Option<Arc<dyn MenuDelegate>>> {
        let node = self.node_mut(id)?;
        tracing::trace!(target: targets::MENU, ?id, attached = delegate.is_some(), "set delegate");
        Ok(std::mem::replace(&mut node.delegate, delegate))
    }

    /// Whether a delegate is attached.
    pub fn has_delegate(&self, id: MenuId) -> MenuResult<bool> {
        self.node(id).map(|node| node.delegate.is_some())
    }

    /// The bridge a menu uses.
    pub fn bridge(&self, id: MenuId) -> MenuResult<Arc<DelegateBridge>> {
        self.node(id).map(|node| node.bridge.clone())
    }

    /// The bridge and current delegate of a menu.
    pub(crate) fn dispatch_target(&self, id: MenuId) -> MenuResult<DispatchTarget> {
        let node = self.node(id)?;
        Ok(DispatchTarget {
            bridge: node.bridge.clone(),
            delegate: node.delegate.clone(),
        })
    }

    /// Ids of menus without a parent.
    pub fn top_level_menus(&self) -> impl Iterator<Item = MenuId> + '_ {
        self.menus
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }
}

impl Default for MenuRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MenuRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuRegistry")
            .field("menus", &self.menus.len())
            .finish()
    }
}

/// A thread-safe wrapper around [`MenuRegistry`].
///
/// Provides concurrent read access with exclusive write access via `RwLock`.
/// Removed nodes are always dropped after the write guard.
pub struct SharedMenuRegistry {
    inner: RwLock<MenuRegistry>,
}

impl SharedMenuRegistry {
    /// Create a new shared registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MenuRegistry::new()),
        }
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&MenuRegistry) -> R) -> R {
        f(&self.inner.read())
    }

    pub(crate) fn create(&self, bridge: Arc<DelegateBridge>) -> MenuId {
        self.inner.write().create(bridge)
    }

    pub(crate) fn retain(&self, id: MenuId) -> bool {
        self.inner.write().retain(id)
    }

    pub(crate) fn release(&self, id: MenuId) {
        let garbage = self.inner.write().release(id);
        drop(garbage);
    }

    pub(crate) fn insert_entry(&self, id: MenuId, index: usize, entry: MenuEntry) -> MenuResult<()> {
        self.inner.write().insert_entry(id, index, entry)
    }

    /// Append an entry in one write, returning its index.
    pub(crate) fn append_entry(&self, id: MenuId, entry: MenuEntry) -> MenuResult<usize> {
        let mut registry = self.inner.write();
        let index = registry.item_count(id)?;
        registry.insert_entry(id, index, entry)?;
        Ok(index)
    }

    pub(crate) fn insert_submenu(
        &self,
        id: MenuId,
        index: usize,
        command_id: CommandId,
        label: String,
        child: MenuId,
    ) -> MenuResult<()> {
        self.inner
            .write()
            .insert_submenu(id, index, command_id, label, child)
    }

    /// Append a submenu entry in one write, returning its index.
    pub(crate) fn append_submenu(
        &self,
        id: MenuId,
        command_id: CommandId,
        label: String,
        child: MenuId,
    ) -> MenuResult<usize> {
        let mut registry = self.inner.write();
        let index = registry.item_count(id)?;
        registry.insert_submenu(id, index, command_id, label, child)?;
        Ok(index)
    }

    pub(crate) fn set_sublabel(&self, id: MenuId, index: usize, sublabel: String) -> MenuResult<()> {
        self.inner.write().set_sublabel(id, index, sublabel)
    }

    pub(crate) fn clear(&self, id: MenuId) -> MenuResult<()> {
        let garbage = self.inner.write().clear(id)?;
        drop(garbage);
        Ok(())
    }

    pub(crate) fn set_delegate(&self, id: MenuId, delegate: Option<Arc<dyn MenuDelegate>>) -> MenuResult<()> {
        let previous = self.inner.write().set_delegate(id, delegate)?;
        drop(previous);
        Ok(())
    }

    pub(crate) fn dispatch_target(&self, id: MenuId) -> MenuResult<DispatchTarget> {
        self.inner.read().dispatch_target(id)
    }
}

impl Default for SharedMenuRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedMenuRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner.read(), f)
    }
}

static GLOBAL_REGISTRY: OnceLock<SharedMenuRegistry> = OnceLock::new();

/// The process-wide menu registry.
///
/// Created on first use.
pub fn global_registry() -> &'static SharedMenuRegistry {
    GLOBAL_REGISTRY.get_or_init(SharedMenuRegistry::new)
}

static_assertions::assert_impl_all!(SharedMenuRegistry: Send, Sync);
