//! Values exchanged with a menu delegate.
//!
//! A delegate usually lives in a scripting environment whose values are
//! loosely typed. [`DelegateValue`] is the small subset of that representation
//! the bridge needs: the answer to every query is one of these, and the
//! dispatcher converts it into the typed result it wants.

use std::fmt;

/// Identifies a command entry within one menu.
///
/// Command ids are opaque to the menu model. They are only unique within the
/// menu that holds them; two submenus may reuse the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub i32);

impl CommandId {
    /// The id carried by separators. It is never forwarded to a delegate.
    pub const SEPARATOR: Self = Self(-1);

    /// The id passed along with menu-wide notifications such as `menuWillShow`.
    pub const NONE: Self = Self(-1);

    /// Get the raw integer value.
    #[inline]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for CommandId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host event flags that accompany an execution request.
///
/// The model passes these through untouched; only the delegate may care.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventFlags(pub u32);

impl EventFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
}

/// A loosely typed value as produced by a delegate.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DelegateValue {
    /// The delegate returned nothing.
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Integer(i64),
    /// A floating point number.
    Number(f64),
    /// A string.
    Text(String),
}

impl DelegateValue {
    /// Script-style truthiness.
    ///
    /// `Undefined`, `Null`, `false`, zero, NaN and the empty string are falsy;
    /// everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Borrow the value as text, if it is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into text, if it is a string.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check for `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) | Self::Number(_) => "number",
            Self::Text(_) => "string",
        }
    }
}

impl From<bool> for DelegateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for DelegateValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for DelegateValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for DelegateValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for DelegateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DelegateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<DelegateValue>> From<Option<T>> for DelegateValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for DelegateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}
