//! Error types for the menu model.

use crate::surface::SurfaceError;

/// Broad classification of failures.
///
/// Delegate trouble never surfaces as a [`MenuError`]; it is recovered by the
/// bridge and only appears as [`MenuErrorKind::DelegateUnavailable`] or
/// [`MenuErrorKind::DelegateCallFailed`] in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuErrorKind {
    /// A structural precondition was violated.
    InvalidArgument,
    /// A position outside `[0, item_count)` was queried.
    IndexOutOfRange,
    /// No delegate, or the operation is not implemented.
    DelegateUnavailable,
    /// The delegate raised, panicked, or could not be reached in time.
    DelegateCallFailed,
}

/// Menu-model errors.
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    /// An insertion index outside `[0, count]`.
    #[error("insert index {index} is out of bounds for a menu of {count} items")]
    InvalidInsertIndex { index: usize, count: usize },

    /// The submenu already belongs to another menu.
    #[error("submenu is already owned by another menu")]
    SubmenuAlreadyOwned,

    /// The submenu is the target menu or one of its ancestors.
    #[error("a menu cannot contain itself or one of its ancestors")]
    CyclicSubmenu,

    /// Separators carry no text.
    #[error("item {index} is a separator and has no text")]
    SeparatorHasNoText { index: usize },

    /// Separators and submenu entries cannot be executed.
    #[error("item {index} cannot be activated")]
    NotActivatable { index: usize },

    /// The operation requires a menu without a parent.
    #[error("operation requires a top-level menu")]
    NotTopLevel,

    /// A position outside `[0, count)`.
    #[error("index {index} is out of range for a menu of {count} items")]
    IndexOutOfRange { index: usize, count: usize },

    /// The handle refers to a menu that no longer exists.
    #[error("menu has been destroyed")]
    MenuDestroyed,

    /// The host surface rejected the menu.
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

impl MenuError {
    /// Classify this error.
    pub fn kind(&self) -> MenuErrorKind {
        match self {
            Self::IndexOutOfRange { .. } => MenuErrorKind::IndexOutOfRange,
            Self::InvalidInsertIndex { .. }
            | Self::SubmenuAlreadyOwned
            | Self::CyclicSubmenu
            | Self::SeparatorHasNoText { .. }
            | Self::NotActivatable { .. }
            | Self::NotTopLevel
            | Self::MenuDestroyed
            | Self::Surface(_) => MenuErrorKind::InvalidArgument,
        }
    }
}

/// Result type for menu operations.
pub type MenuResult<T> = Result<T, MenuError>;
