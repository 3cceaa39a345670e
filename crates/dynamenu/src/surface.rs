//! Host integration.
//!
//! A [`MenuSurface`] is whatever presents a menu to the user: a native menu
//! bar, a context-menu popup, a test recorder. The model hands it a
//! [`ResolvedMenu`] and only learns whether the attachment succeeded.

use crate::resolve::ResolvedMenu;

/// Error reported by a surface that could not take a menu.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SurfaceError {
    message: String,
}

impl SurfaceError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Something a top-level menu can be attached to.
pub trait MenuSurface {
    /// Present `menu`, replacing whatever the surface showed before.
    fn attach(&mut self, menu: &ResolvedMenu) -> Result<(), SurfaceError>;
}
