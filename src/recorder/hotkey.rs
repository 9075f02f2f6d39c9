use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyParseError {
    #[error("hotkey is empty")]
    Empty,
    #[error("unknown modifier \"{0}\"")]
    UnknownModifier(String),
    #[error("hotkey key must be a single letter or digit, got \"{0}\"")]
    InvalidKey(String),
    #[error("hotkey needs at least one modifier")]
    NoModifier,
}

/// Modifier keys held at the moment of a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether every modifier set in `self` is also set in `held`.
    pub fn satisfied_by(&self, held: Modifiers) -> bool {
        (!self.ctrl || held.ctrl)
            && (!self.alt || held.alt)
            && (!self.shift || held.shift)
            && (!self.meta || held.meta)
    }

    fn is_empty(&self) -> bool {
        !(self.ctrl || self.alt || self.shift || self.meta)
    }
}

/// A global key combination such as `ctrl+alt+s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hotkey {
    pub modifiers: Modifiers,
    /// Lowercase ASCII letter or digit.
    pub key: char,
}

impl Hotkey {
    pub fn stop_default() -> Self {
        Self {
            modifiers: Modifiers {
                ctrl: true,
                alt: true,
                ..Modifiers::default()
            },
            key: 's',
        }
    }

    pub fn matches(&self, held: Modifiers, key: char) -> bool {
        self.key == key.to_ascii_lowercase() && self.modifiers.satisfied_by(held)
    }
}

impl Default for Hotkey {
    fn default() -> Self {
        Self::stop_default()
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<String> = s
            .split('+')
            .map(|part| part.trim().to_ascii_lowercase())
            .filter(|part| !part.is_empty())
            .collect();
        let Some((key, modifier_names)) = parts.split_last() else {
            return Err(HotkeyParseError::Empty);
        };

        let mut modifiers = Modifiers::default();
        for name in modifier_names {
            match name.trim_start_matches('<').trim_end_matches('>') {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "super" | "win" => modifiers.meta = true,
                other => return Err(HotkeyParseError::UnknownModifier(other.to_string())),
            }
        }
        if modifiers.is_empty() {
            return Err(HotkeyParseError::NoModifier);
        }

        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Ok(Self { modifiers, key: c }),
            _ => Err(HotkeyParseError::InvalidKey(key.clone())),
        }
    }
}

impl TryFrom<String> for Hotkey {
    type Error = HotkeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hotkey> for String {
    fn from(hotkey: Hotkey) -> Self {
        hotkey.to_string()
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [
            (m.ctrl, "ctrl"),
            (m.alt, "alt"),
            (m.shift, "shift"),
            (m.meta, "meta"),
        ] {
            if held {
                write!(formatter, "{name}+")?;
            }
        }
        write!(formatter, "{}", self.key)
    }
}
