//! Keyboard accelerators.
//!
//! This module turns human-readable shortcut text such as `"Ctrl+Shift+P"`
//! into an [`Accelerator`]: one key plus a set of modifiers.
//!
//! - [`parse`] / [`parse_for`]: total parsing, every input is either accepted
//!   or rejected with an [`AcceleratorParseError`]
//! - [`Accelerator`]'s `Display` gives the canonical form, which parses back
//!   to the same value
//!
//! # Format
//!
//! Tokens are separated by `+`, matched case-insensitively, and surrounding
//! whitespace is ignored. Exactly one token must be a key.
//!
//! - Modifiers: `Ctrl`/`Control`, `Alt`/`Option`, `Shift`,
//!   `Meta`/`Super`/`Cmd`/`Command`/`Win`
//! - Platform aliases: `CmdOrCtrl`/`CommandOrControl` mean `Meta` on macOS
//!   and `Ctrl` elsewhere
//! - Keys: letters, digits, `F1`-`F24`, navigation and editing keys, `Plus`,
//!   and punctuation characters
//!
//! ```
//! use dynamenu::accelerator::{self, Key, Platform};
//!
//! let accel = accelerator::parse_for("cmdorctrl+shift+p", Platform::Other).unwrap();
//! assert_eq!(accel.key, Key::P);
//! assert_eq!(accel.to_string(), "Ctrl+Shift+P");
//!
//! assert!(accelerator::parse("Ctrl+").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

// =============================================================================
// Key
// =============================================================================

/// A key that can appear in an accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Numbers (main keyboard)
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    F13, F14, F15, F16, F17, F18, F19, F20, F21, F22, F23, F24,

    // Navigation
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Home, End, PageUp, PageDown,

    // Editing
    Backspace, Delete, Insert,
    Enter, Tab, Space, Escape,

    // Punctuation
    Plus, Minus, Equal,
    BracketLeft, BracketRight, Backslash,
    Semicolon, Quote, Comma, Period, Slash, Grave,
}

const LETTERS: [Key; 26] = [
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
    Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
    Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
];

const DIGITS: [Key; 10] = [
    Key::Digit0, Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4,
    Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8, Key::Digit9,
];

const FUNCTION_KEYS: [Key; 24] = [
    Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6,
    Key::F7, Key::F8, Key::F9, Key::F10, Key::F11, Key::F12,
    Key::F13, Key::F14, Key::F15, Key::F16, Key::F17, Key::F18,
    Key::F19, Key::F20, Key::F21, Key::F22, Key::F23, Key::F24,
];

impl Key {
    /// The canonical name of the key, as written in accelerator text.
    pub fn name(self) -> &'static str {
        match self {
            Key::A => "A",
            Key::B => "B",
            Key::C => "C",
            Key::D => "D",
            Key::E => "E",
            Key::F => "F",
            Key::G => "G",
            Key::H => "H",
            Key::I => "I",
            Key::J => "J",
            Key::K => "K",
            Key::L => "L",
            Key::M => "M",
            Key::N => "N",
            Key::O => "O",
            Key::P => "P",
            Key::Q => "Q",
            Key::R => "R",
            Key::S => "S",
            Key::T => "T",
            Key::U => "U",
            Key::V => "V",
            Key::W => "W",
            Key::X => "X",
            Key::Y => "Y",
            Key::Z => "Z",
            Key::Digit0 => "0",
            Key::Digit1 => "1",
            Key::Digit2 => "2",
            Key::Digit3 => "3",
            Key::Digit4 => "4",
            Key::Digit5 => "5",
            Key::Digit6 => "6",
            Key::Digit7 => "7",
            Key::Digit8 => "8",
            Key::Digit9 => "9",
            Key::F1 => "F1",
            Key::F2 => "F2",
            Key::F3 => "F3",
            Key::F4 => "F4",
            Key::F5 => "F5",
            Key::F6 => "F6",
            Key::F7 => "F7",
            Key::F8 => "F8",
            Key::F9 => "F9",
            Key::F10 => "F10",
            Key::F11 => "F11",
            Key::F12 => "F12",
            Key::F13 => "F13",
            Key::F14 => "F14",
            Key::F15 => "F15",
            Key::F16 => "F16",
            Key::F17 => "F17",
            Key::F18 => "F18",
            Key::F19 => "F19",
            Key::F20 => "F20",
            Key::F21 => "F21",
            Key::F22 => "F22",
            Key::F23 => "F23",
            Key::F24 => "F24",
            Key::ArrowUp => "Up",
            Key::ArrowDown => "Down",
            Key::ArrowLeft => "Left",
            Key::ArrowRight => "Right",
            Key::Home => "Home",
            Key::End => "End",
            Key::PageUp => "PageUp",
            Key::PageDown => "PageDown",
            Key::Backspace => "Backspace",
            Key::Delete => "Delete",
            Key::Insert => "Insert",
            Key::Enter => "Enter",
            Key::Tab => "Tab",
            Key::Space => "Space",
            Key::Escape => "Escape",
            Key::Plus => "Plus",
            Key::Minus => "-",
            Key::Equal => "=",
            Key::BracketLeft => "[",
            Key::BracketRight => "]",
            Key::Backslash => "\\",
            Key::Semicolon => ";",
            Key::Quote => "'",
            Key::Comma => ",",
            Key::Period => ".",
            Key::Slash => "/",
            Key::Grave => "`",
        }
    }

    /// Look up a key by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Key> {
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return key_from_char(ch);
        }

        let lower = name.to_ascii_lowercase();
        if let Some(number) = lower.strip_prefix('f') {
            if let Ok(n) = number.parse::<usize>() {
                return n.checked_sub(1).and_then(|i| FUNCTION_KEYS.get(i)).copied();
            }
        }

        let key = match lower.as_str() {
            // Navigation
            "up" | "arrowup" => Key::ArrowUp,
            "down" | "arrowdown" => Key::ArrowDown,
            "left" | "arrowleft" => Key::ArrowLeft,
            "right" | "arrowright" => Key::ArrowRight,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "pgup" => Key::PageUp,
            "pagedown" | "pgdn" => Key::PageDown,

            // Editing
            "backspace" | "back" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "insert" | "ins" => Key::Insert,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "space" | "spacebar" => Key::Space,
            "escape" | "esc" => Key::Escape,

            // Punctuation by name
            "plus" => Key::Plus,
            "minus" => Key::Minus,
            "equal" | "equals" => Key::Equal,
            "bracketleft" => Key::BracketLeft,
            "bracketright" => Key::BracketRight,
            "backslash" => Key::Backslash,
            "semicolon" => Key::Semicolon,
            "quote" => Key::Quote,
            "comma" => Key::Comma,
            "period" => Key::Period,
            "slash" => Key::Slash,
            "grave" => Key::Grave,

            _ => return None,
        };
        Some(key)
    }
}

fn key_from_char(ch: char) -> Option<Key> {
    if ch.is_ascii_alphabetic() {
        let index = (ch.to_ascii_uppercase() as u8 - b'A') as usize;
        return LETTERS.get(index).copied();
    }
    if let Some(digit) = ch.to_digit(10) {
        return DIGITS.get(digit as usize).copied();
    }
    let key = match ch {
        '-' => Key::Minus,
        '=' => Key::Equal,
        '[' => Key::BracketLeft,
        ']' => Key::BracketRight,
        '\\' => Key::Backslash,
        ';' => Key::Semicolon,
        '\'' => Key::Quote,
        ',' => Key::Comma,
        '.' => Key::Period,
        '/' => Key::Slash,
        '`' => Key::Grave,
        _ => return None,
    };
    Some(key)
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Modifiers
// =============================================================================

/// Modifier keys held together with the accelerator's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// The Control key.
    pub control: bool,
    /// The Alt key (Option on macOS).
    pub alt: bool,
    /// The Shift key.
    pub shift: bool,
    /// The Meta key (Cmd on macOS, Windows/Super elsewhere).
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        control: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Control only.
    pub const CTRL: Self = Self {
        control: true,
        ..Self::NONE
    };

    /// Alt only.
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Meta only.
    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Check whether no modifier is set.
    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

/// The platform whose modifier conventions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// macOS: `CmdOrCtrl` means Cmd (Meta).
    MacOs,
    /// Everything else: `CmdOrCtrl` means Ctrl.
    Other,
}

impl Platform {
    /// The platform this crate was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

// =============================================================================
// Accelerator
// =============================================================================

/// A keyboard accelerator: one key plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Accelerator {
    /// The primary key.
    pub key: Key,
    /// The modifier keys that must be held.
    pub modifiers: Modifiers,
}

impl Accelerator {
    /// Create an accelerator from a key and modifiers.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// An accelerator with no modifiers.
    pub fn key_only(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// A Ctrl+key accelerator.
    pub fn ctrl(key: Key) -> Self {
        Self::new(key, Modifiers::CTRL)
    }

    /// Check whether the given key press triggers this accelerator.
    pub fn matches(&self, key: Key, modifiers: Modifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(5);

        if self.modifiers.control {
            parts.push("Ctrl");
        }
        if self.modifiers.alt {
            parts.push("Alt");
        }
        if self.modifiers.shift {
            parts.push("Shift");
        }
        if self.modifiers.meta {
            parts.push("Meta");
        }

        parts.push(self.key.name());

        write!(f, "{}", parts.join("+"))
    }
}

impl FromStr for Accelerator {
    type Err = AcceleratorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Error type for parsing accelerators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcceleratorParseError {
    /// The text is empty.
    #[error("empty accelerator")]
    Empty,
    /// Only modifiers were given.
    #[error("no key specified (only modifiers)")]
    NoKey,
    /// A token is neither a modifier nor a known key.
    #[error("unknown key: {0:?}")]
    UnknownKey(String),
    /// More than one key was given.
    #[error("more than one key: {first} and {second}")]
    MultipleKeys { first: Key, second: Key },
}

/// Parse accelerator text using the conventions of the current platform.
pub fn parse(text: &str) -> Result<Accelerator, AcceleratorParseError> {
    parse_for(text, Platform::current())
}

/// Parse accelerator text using the conventions of `platform`.
pub fn parse_for(text: &str, platform: Platform) -> Result<Accelerator, AcceleratorParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AcceleratorParseError::Empty);
    }

    let mut modifiers = Modifiers::NONE;
    let mut key: Option<Key> = None;

    for token in text.split('+') {
        let token = token.trim();

        match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.control = true,
            "alt" | "option" => modifiers.alt = true,
            "shift" => modifiers.shift = true,
            "meta" | "super" | "cmd" | "command" | "win" | "windows" => modifiers.meta = true,
            "cmdorctrl" | "commandorcontrol" => match platform {
                Platform::MacOs => modifiers.meta = true,
                Platform::Other => modifiers.control = true,
            },
            _ => {
                let parsed = Key::from_name(token)
                    .ok_or_else(|| AcceleratorParseError::UnknownKey(token.to_string()))?;
                if let Some(first) = key {
                    return Err(AcceleratorParseError::MultipleKeys {
                        first,
                        second: parsed,
                    });
                }
                key = Some(parsed);
            }
        }
    }

    key.map(|key| Accelerator::new(key, modifiers))
        .ok_or(AcceleratorParseError::NoKey)
}
