//! Debug output for menu trees.

use std::fmt::Write;

use dynamenu_core::{TreeFormatOptions, TreeStyle};

use crate::error::MenuResult;
use crate::menu::Menu;
use crate::registry::{MenuEntry, MenuItemKind};
use crate::resolve::{ResolvedItem, ResolvedMenu};

/// Debug utility for visualizing menu trees.
///
/// With [`TreeFormatOptions::show_state`] the tree is resolved first, which
/// queries the delegate; otherwise only stored data is printed.
#[derive(Debug, Clone, Default)]
pub struct MenuTreeDebug {
    options: TreeFormatOptions,
}

/// The parts of an entry a line is built from.
struct Line<'a> {
    kind: MenuItemKind,
    command_id: i32,
    label: &'a str,
    state: Option<String>,
}

impl MenuTreeDebug {
    /// Create a visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the tree rooted at `menu`.
    pub fn format(&self, menu: &Menu) -> MenuResult<String> {
        let mut output = String::new();
        let _ = writeln!(output, "Menu ({} items)", menu.item_count());
        if self.options.show_state {
            let resolved = menu.resolve()?;
            self.format_resolved(&resolved, 1, &mut output);
        } else {
            self.format_stored(menu, 1, &mut output)?;
        }
        Ok(output)
    }

    fn format_stored(&self, menu: &Menu, depth: usize, output: &mut String) -> MenuResult<()> {
        if self.too_deep(depth) {
            return Ok(());
        }
        let entries = menu.entries();
        let count = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            self.push_line(output, depth, index + 1 == count, &stored_line(entry));
            if let Some(child) = entry.submenu.and_then(Menu::from_id) {
                self.format_stored(&child, depth + 1, output)?;
            }
        }
        Ok(())
    }

    fn format_resolved(&self, menu: &ResolvedMenu, depth: usize, output: &mut String) {
        if self.too_deep(depth) {
            return;
        }
        let count = menu.items.len();
        for item in &menu.items {
            self.push_line(output, depth, item.index + 1 == count, &resolved_line(item));
            if let Some(child) = &item.submenu {
                self.format_resolved(child, depth + 1, output);
            }
        }
    }

    fn too_deep(&self, depth: usize) -> bool {
        self.options.max_depth.is_some_and(|max| depth > max)
    }

    fn push_line(&self, output: &mut String, depth: usize, is_last: bool, line: &Line<'_>) {
        output.push_str(&self.options.prefix(depth, is_last));

        if line.kind == MenuItemKind::Separator {
            output.push_str(match self.options.style {
                TreeStyle::Unicode => "\u{2500}\u{2500}\u{2500}\u{2500}",
                TreeStyle::Ascii | TreeStyle::Compact => "----",
            });
        } else if line.label.is_empty() {
            output.push_str("(no label)");
        } else {
            output.push_str(line.label);
        }

        if self.options.show_ids && line.kind != MenuItemKind::Separator {
            let _ = write!(output, " [{}]", line.command_id);
        }
        if self.options.show_kinds {
            let _ = write!(output, " ({})", line.kind);
        }
        if let Some(state) = &line.state {
            let _ = write!(output, " {state}");
        }
        output.push('\n');
    }
}

fn stored_line(entry: &MenuEntry) -> Line<'_> {
    Line {
        kind: entry.kind,
        command_id: entry.command_id.get(),
        label: &entry.label,
        state: None,
    }
}

fn resolved_line(item: &ResolvedItem) -> Line<'_> {
    let mut flags = Vec::new();
    if item.checked {
        flags.push("checked".to_string());
    }
    if !item.enabled {
        flags.push("disabled".to_string());
    }
    if !item.visible {
        flags.push("hidden".to_string());
    }
    if let Some(accel) = &item.accelerator {
        flags.push(accel.to_string());
    }
    Line {
        kind: item.kind,
        command_id: item.command_id.get(),
        label: &item.label,
        state: (!flags.is_empty()).then(|| format!("{{{}}}", flags.join(", "))),
    }
}
