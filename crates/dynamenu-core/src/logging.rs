//! Logging and debugging facilities for dynamenu.
//!
//! This module provides:
//! - Target names for filtering the `tracing` output of each subsystem
//! - Options shared by the menu tree visualisers
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! dynamenu uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("dynamenu::bridge=warn,dynamenu::menu=trace")
//!         .init();
//! }
//! ```
//!
//! Delegate failures are logged at `warn` under [`targets::BRIDGE`]. Structural
//! changes to menus are logged at `trace` under [`targets::MENU`] and
//! [`targets::REGISTRY`].

/// Span names used throughout dynamenu for tracing.
pub mod span_names {
    /// Resolving a menu tree into a snapshot.
    pub const RESOLVE: &str = "dynamenu::resolve";
    /// A single delegate call.
    pub const DELEGATE_CALL: &str = "dynamenu::delegate_call";
}

/// Target names for log filtering.
pub mod targets {
    /// Delegate bridge target.
    pub const BRIDGE: &str = "dynamenu::bridge";
    /// Execution context target.
    pub const CONTEXT: &str = "dynamenu::context";
    /// Menu model target.
    pub const MENU: &str = "dynamenu::menu";
    /// Menu registry target.
    pub const REGISTRY: &str = "dynamenu::registry";
    /// Performance spans.
    pub const PERF: &str = "dynamenu::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact representation.
    Compact,
}

impl TreeStyle {
    /// The (branch, tee, corner) strings drawn in front of a node.
    pub fn glyphs(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Ascii => ("|", "+-- ", "`-- "),
            Self::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            Self::Compact => ("", "- ", "- "),
        }
    }
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show command ids.
    pub show_ids: bool,
    /// Whether to show entry kinds.
    pub show_kinds: bool,
    /// Whether to resolve and show live state (queries the delegate).
    pub show_state: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            show_state: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options for detailed output, including live state.
    pub fn detailed() -> Self {
        Self {
            show_state: true,
            ..Default::default()
        }
    }

    /// Options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            show_state: false,
            ..Default::default()
        }
    }

    /// Build the prefix for a node at `depth`.
    pub fn prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }
        let (branch, tee, corner) = self.style.glyphs();
        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.extend(std::iter::repeat_n(' ', self.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to measure the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "dynamenu::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_root_is_empty() {
        let options = TreeFormatOptions::default();
        assert_eq!(options.prefix(0, true), "");
    }

    #[test]
    fn test_prefix_ascii() {
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..Default::default()
        };
        assert_eq!(options.prefix(1, false), "+-- ");
        assert_eq!(options.prefix(1, true), "`-- ");
        assert_eq!(options.prefix(2, true), "|  `-- ");
    }

    #[test]
    fn test_minimal_options() {
        let options = TreeFormatOptions::minimal();
        assert!(!options.show_ids);
        assert!(!options.show_kinds);
        assert!(TreeFormatOptions::detailed().show_state);
    }

    #[test]
    fn test_perf_span() {
        // Just ensure it doesn't panic without a subscriber.
        let _span = PerfSpan::new("test_operation");
    }
}
