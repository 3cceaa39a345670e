//! Editor context menu driven by a delegate.
//!
//! Builds an Edit menu with a nested View submenu, attaches a delegate that
//! tracks editor state, prints the resolved tree, then runs a few commands and
//! prints it again.
//!
//! Run with: cargo run -p dynamenu --example context_menu

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use dynamenu::{
    CommandId, DelegateValue, EventFlags, Menu, MenuDelegate, MenuSurface, ResolvedMenu,
    SurfaceError, WeakMenu,
};
use dynamenu_core::{DelegateAnswer, TreeFormatOptions, TreeStyle};

const UNDO: i32 = 1;
const CUT: i32 = 2;
const PASTE: i32 = 3;
const WORD_WRAP: i32 = 10;
const ZOOM_SMALL: i32 = 20;
const ZOOM_LARGE: i32 = 21;
const ADD_BOOKMARK: i32 = 30;
const ZOOM_GROUP: i32 = 1;

struct Editor {
    menu: WeakMenu,
    has_selection: AtomicBool,
    word_wrap: AtomicBool,
    zoom: AtomicI32,
    bookmarks: AtomicI32,
}

impl MenuDelegate for Editor {
    fn is_command_id_checked(&self, command_id: CommandId) -> DelegateAnswer {
        let checked = match command_id.get() {
            WORD_WRAP => self.word_wrap.load(Ordering::Relaxed),
            id @ (ZOOM_SMALL | ZOOM_LARGE) => self.zoom.load(Ordering::Relaxed) == id,
            _ => false,
        };
        Some(Ok(checked.into()))
    }

    fn is_command_id_enabled(&self, command_id: CommandId) -> DelegateAnswer {
        let enabled = match command_id.get() {
            CUT => self.has_selection.load(Ordering::Relaxed),
            _ => true,
        };
        Some(Ok(enabled.into()))
    }

    fn is_item_for_command_id_dynamic(&self, command_id: CommandId) -> DelegateAnswer {
        Some(Ok((command_id.get() == UNDO).into()))
    }

    fn get_label_for_command_id(&self, _command_id: CommandId) -> DelegateAnswer {
        Some(Ok("Undo Typing".into()))
    }

    fn get_accelerator_for_command_id(&self, command_id: CommandId) -> DelegateAnswer {
        let text = match command_id.get() {
            UNDO => "CmdOrCtrl+Z",
            CUT => "CmdOrCtrl+X",
            PASTE => "CmdOrCtrl+V",
            ADD_BOOKMARK => "CmdOrCtrl+Shift+B",
            _ => return None,
        };
        Some(Ok(text.into()))
    }

    fn execute_command(&self, command_id: CommandId, _event_flags: EventFlags) -> DelegateAnswer {
        match command_id.get() {
            WORD_WRAP => {
                self.word_wrap.fetch_xor(true, Ordering::Relaxed);
            }
            id @ (ZOOM_SMALL | ZOOM_LARGE) => self.zoom.store(id, Ordering::Relaxed),
            ADD_BOOKMARK => {
                // Commands may edit the menu that is running them.
                let count = self.bookmarks.fetch_add(1, Ordering::Relaxed) + 1;
                let menu = self.menu.upgrade()?;
                menu.add_item(100 + count, format!("Bookmark {count}")).ok()?;
            }
            _ => {}
        }
        Some(Ok(DelegateValue::Undefined))
    }

    fn menu_will_show(&self) -> DelegateAnswer {
        self.has_selection.store(true, Ordering::Relaxed);
        Some(Ok(DelegateValue::Undefined))
    }
}

/// Prints whatever it is given.
struct ConsoleSurface;

impl MenuSurface for ConsoleSurface {
    fn attach(&mut self, menu: &ResolvedMenu) -> Result<(), SurfaceError> {
        let visible = menu.visible_items().count();
        println!("surface received {} items ({visible} visible)", menu.len());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("dynamenu=debug")
        .init();

    let view = Menu::new();
    view.add_check_item(WORD_WRAP, "Word Wrap")?;
    view.add_separator()?;
    view.add_radio_item(ZOOM_SMALL, "Small", ZOOM_GROUP)?;
    view.add_radio_item(ZOOM_LARGE, "Large", ZOOM_GROUP)?;

    let edit = Menu::new();
    edit.add_item(UNDO, "Undo")?;
    edit.add_separator()?;
    edit.add_item(CUT, "Cut")?;
    edit.add_item(PASTE, "Paste")?;
    edit.add_sub_menu(4, "View", &view)?;
    edit.add_item(ADD_BOOKMARK, "Add Bookmark")?;
    edit.set_sublabel(5, "Remembers the cursor")?;

    let editor = Arc::new(Editor {
        menu: edit.downgrade(),
        has_selection: AtomicBool::new(false),
        word_wrap: AtomicBool::new(false),
        zoom: AtomicI32::new(ZOOM_SMALL),
        bookmarks: AtomicI32::new(0),
    });
    edit.set_delegate(Some(editor.clone()));
    view.set_delegate(Some(editor));

    let options = TreeFormatOptions {
        style: TreeStyle::Unicode,
        ..TreeFormatOptions::detailed()
    };
    println!("{}", edit.dump_tree(options.clone())?);

    edit.menu_will_show();
    let wrap = view.index_of_command_id(WORD_WRAP).unwrap_or_default();
    view.activate_at(wrap, EventFlags::NONE)?;
    let large = view.index_of_command_id(ZOOM_LARGE).unwrap_or_default();
    view.activate_at(large, EventFlags::NONE)?;
    let bookmark = edit.index_of_command_id(ADD_BOOKMARK).unwrap_or_default();
    edit.activate_at(bookmark, EventFlags::NONE)?;

    println!("{}", edit.dump_tree(options)?);
    edit.attach_to_surface(&mut ConsoleSurface)?;

    Ok(())
}
